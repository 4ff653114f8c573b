use claims::assert_matches;
use claims::assert_none;
use claims::assert_ok;
use list_subscribe::domain::ListId;
use list_subscribe::domain::Subscriber;
use list_subscribe::domain::SubscriptionOptions;
use list_subscribe::ApiVariant;
use list_subscribe::SubscribeError;
use serde_json::json;
use wiremock::matchers::basic_auth;
use wiremock::matchers::body_json;
use wiremock::matchers::header;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::john;
use crate::helpers::spawn_api;
use crate::helpers::API_KEY;

const JSON_API: ApiVariant = ApiVariant::StructuredBody { basic_auth: true };

#[tokio::test]
async fn subscribe_ok() {
    let api = spawn_api(JSON_API).await;

    Mock::given(method("POST"))
        .and(path("/3.0/lists/abc123/members"))
        .and(header("content-type", "application/json"))
        .and(basic_auth("anystring", API_KEY))
        .and(body_json(json!({
            "email_address": "john@foo.com",
            "email_type": "html",
            "status": "subscribed",
            "merge_fields": {"FNAME": "John", "LNAME": "Doe"},
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "8a25ff1d"})))
        .expect(1)
        .mount(&api.server)
        .await;

    let opts = SubscriptionOptions {
        email_type: "html".to_string(),
        ..Default::default()
    };
    assert_ok!(api.client.subscribe(&john(), &opts).await);
}

#[tokio::test]
async fn empty_merge_fields_sent_as_empty_object() {
    let api = spawn_api(JSON_API).await;

    Mock::given(method("POST"))
        .and(body_json(json!({
            "email_address": "jane@foo.com",
            "email_type": "text",
            "status": "subscribed",
            "merge_fields": {},
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&api.server)
        .await;

    let jane = Subscriber::new("jane@foo.com", ListId::new("abc123"));
    assert_ok!(api.client.subscribe(&jane, &SubscriptionOptions::default()).await);
}

#[tokio::test]
async fn no_authorization_header_without_basic_auth() {
    let api = spawn_api(ApiVariant::StructuredBody { basic_auth: false }).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&api.server)
        .await;

    assert_ok!(api.client.subscribe(&john(), &SubscriptionOptions::default()).await);

    let requests = api.server.received_requests().await.unwrap();
    assert_none!(requests[0].headers.get("authorization"));
}

#[tokio::test]
async fn non_200_is_retried_and_dumped() {
    let api = spawn_api(JSON_API).await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"title": "Member Exists", "status": 400})),
        )
        .expect(5)
        .mount(&api.server)
        .await;

    let err = api
        .client
        .subscribe(&john(), &SubscriptionOptions::default())
        .await
        .unwrap_err();

    assert_matches!(&err, SubscribeError::RemoteError { .. });
    let dump = err.raw_response().unwrap();
    assert!(dump.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(dump.contains("Member Exists"));
}

#[tokio::test]
async fn created_is_not_success() {
    // only an exact 200 counts
    let api = spawn_api(JSON_API).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(5)
        .mount(&api.server)
        .await;

    assert_matches!(
        api.client.subscribe(&john(), &SubscriptionOptions::default()).await,
        Err(SubscribeError::RemoteError { .. })
    );
}

#[tokio::test]
async fn invalid_email_type_makes_no_request() {
    let api = spawn_api(JSON_API).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&api.server)
        .await;

    let opts = SubscriptionOptions {
        email_type: "mobile".to_string(),
        ..Default::default()
    };
    assert_matches!(
        api.client.subscribe(&john(), &opts).await,
        Err(SubscribeError::InvalidOption(_))
    );
}
