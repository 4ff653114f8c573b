use std::time::Duration;

use anyhow::Context;
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::domain::Credentials;
use crate::domain::Subscriber;
use crate::domain::SubscriptionOptions;
use crate::error::SubscribeError;
use crate::request::ApiVariant;
use crate::request::RequestBuilder;
use crate::response::RawResponse;
use crate::retry::RetryPolicy;

/// Subscribes addresses to a mailing list, retrying on failure.
///
/// Cheap to clone; clones share the underlying connection pool. Nothing is
/// mutated after construction, so concurrent calls need no coordination.
// establishing a HTTP connection is expensive, so the `Client` is built once
// here and reused for every attempt of every call
#[derive(Clone, Debug)]
pub struct ListClient {
    http_client: Client,
    requests: RequestBuilder,
    retry_policy: RetryPolicy,
}

impl ListClient {
    /// `timeout` bounds each individual attempt (a timed out attempt is
    /// retried like any other transport failure). See `RetryPolicy` for the
    /// bound on the whole call.
    pub fn new(
        api: ApiVariant,
        credentials: Credentials,
        base_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        let requests = RequestBuilder::new(api, credentials, base_url)?;
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http_client,
            requests,
            retry_policy: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(
        mut self,
        retry_policy: RetryPolicy,
    ) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy { &self.retry_policy }

    pub fn api(&self) -> ApiVariant { self.requests.api() }

    /// Subscribe with retries. Only fails once every attempt has failed (or on
    /// the first non-retryable error), returning the last error seen.
    pub async fn subscribe(
        &self,
        subscriber: &Subscriber,
        options: &SubscriptionOptions,
    ) -> Result<(), SubscribeError> {
        self.subscribe_with_cancellation(subscriber, options, &CancellationToken::new())
            .await
    }

    /// As `subscribe`, but gives up with `SubscribeError::Cancelled` as soon
    /// as `cancel` is cancelled, whether mid-request or mid-backoff.
    #[tracing::instrument(
        name = "Subscribing address to list",
        skip(self, subscriber, options, cancel),
        fields(
            list_id = %subscriber.list_id,
            subscriber_email = %subscriber.email_address,
        )
    )]
    pub async fn subscribe_with_cancellation(
        &self,
        subscriber: &Subscriber,
        options: &SubscriptionOptions,
        cancel: &CancellationToken,
    ) -> Result<(), SubscribeError> {
        self.retry_policy
            .run(cancel, |_| self.subscribe_once(subscriber, options))
            .await
    }

    /// A single attempt, without retries. A fresh request is built every
    /// time, so this is also what each retry runs.
    pub async fn subscribe_once(
        &self,
        subscriber: &Subscriber,
        options: &SubscriptionOptions,
    ) -> Result<(), SubscribeError> {
        let request = self.requests.build(subscriber, options)?;
        tracing::debug!(?request, "sending subscribe request");

        let resp = request.into_reqwest(&self.http_client).send().await?;
        let resp = RawResponse::read(resp).await?;
        self.api().classify(&resp)?;

        tracing::info!("subscribed {}", subscriber.email_address);
        Ok(())
    }
}
