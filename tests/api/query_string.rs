use std::collections::HashMap;

use claims::assert_matches;
use claims::assert_ok;
use list_subscribe::domain::ListId;
use list_subscribe::domain::Subscriber;
use list_subscribe::domain::SubscriptionOptions;
use list_subscribe::ApiVariant;
use list_subscribe::SubscribeError;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::john;
use crate::helpers::spawn_api;
use crate::helpers::API_KEY;

fn all_flags() -> SubscriptionOptions {
    SubscriptionOptions {
        email_type: "html".to_string(),
        double_optin: true,
        update_existing: true,
        replace_interests: false,
        send_welcome: true,
    }
}

#[tokio::test]
async fn true_is_success() {
    let api = spawn_api(ApiVariant::QueryString).await;

    Mock::given(method("GET"))
        .and(path("/1.3/"))
        .and(query_param("output", "json"))
        .and(query_param("method", "listSubscribe"))
        .and(query_param("id", "abc123"))
        .and(query_param("apikey", API_KEY))
        .and(query_param("email_type", "html"))
        .and(query_param("email_address", "john@foo.com"))
        .and(query_param("double_optin", "true"))
        .and(query_param("update_existing", "true"))
        .and(query_param("replace_interests", "false"))
        .and(query_param("send_welcome", "true"))
        .and(query_param("merge_vars[FNAME]", "John"))
        .and(query_param("merge_vars[LNAME]", "Doe"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&api.server)
        .await;

    assert_ok!(api.client.subscribe(&john(), &all_flags()).await);

    // nothing beyond the documented parameters
    let requests = api.server.received_requests().await.unwrap();
    let pairs: HashMap<String, String> = requests[0].url.query_pairs().into_owned().collect();
    assert_eq!(pairs.len(), 12);
}

#[tokio::test]
async fn no_merge_vars_without_merge_fields() {
    let api = spawn_api(ApiVariant::QueryString).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(1)
        .mount(&api.server)
        .await;

    let jane = Subscriber::new("jane@foo.com", ListId::new("abc123"));
    assert_ok!(api.client.subscribe(&jane, &SubscriptionOptions::default()).await);

    let requests = api.server.received_requests().await.unwrap();
    let pairs: HashMap<String, String> = requests[0].url.query_pairs().into_owned().collect();
    assert_eq!(pairs.len(), 10);
    assert!(!pairs.keys().any(|k| k.starts_with("merge_vars")));
}

#[tokio::test]
async fn false_is_retried() {
    let api = spawn_api(ApiVariant::QueryString).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("false"))
        .expect(5)
        .mount(&api.server)
        .await;

    let err = api
        .client
        .subscribe(&john(), &SubscriptionOptions::default())
        .await
        .unwrap_err();
    assert_matches!(&err, SubscribeError::RemoteError { .. });
    assert!(err.to_string().starts_with("Subscribe returned error - HTTP/1.1 200 OK"));
}

#[tokio::test]
async fn error_object_is_retried() {
    let api = spawn_api(ApiVariant::QueryString).await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"error":"Invalid MailChimp API Key","code":104}"#),
        )
        .expect(5)
        .mount(&api.server)
        .await;

    let err = api
        .client
        .subscribe(&john(), &SubscriptionOptions::default())
        .await
        .unwrap_err();
    assert!(err.raw_response().unwrap().contains("Invalid MailChimp API Key"));
}

#[tokio::test]
async fn non_json_is_malformed_and_retried() {
    let api = spawn_api(ApiVariant::QueryString).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(5)
        .mount(&api.server)
        .await;

    let err = api
        .client
        .subscribe(&john(), &SubscriptionOptions::default())
        .await
        .unwrap_err();
    assert_matches!(&err, SubscribeError::MalformedResponse { .. });
    assert!(err.raw_response().unwrap().contains("maintenance"));
}

#[tokio::test]
async fn non_200_is_retried() {
    let api = spawn_api(ApiVariant::QueryString).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("true"))
        .expect(5)
        .mount(&api.server)
        .await;

    let err = api
        .client
        .subscribe(&john(), &SubscriptionOptions::default())
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("Non-200 response - HTTP/1.1 502 Bad Gateway"));
}

#[tokio::test]
async fn invalid_email_type_makes_no_request() {
    let api = spawn_api(ApiVariant::QueryString).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(0)
        .mount(&api.server)
        .await;

    let opts = SubscriptionOptions {
        email_type: "rich".to_string(),
        ..Default::default()
    };
    assert_matches!(
        api.client.subscribe(&john(), &opts).await,
        Err(SubscribeError::InvalidOption(_))
    );
}
