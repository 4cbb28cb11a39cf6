use std::time::Duration;

use chrono::NaiveDate;
use serde_json::json;
use traffic_manager::connectors::{
    AdsConnector, InsightWindow, MetaAdsClient, MetaApiError, MetaClientConfig,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn client_for(server: &MockServer, app_secret: Option<&str>) -> MetaAdsClient {
    MetaAdsClient::new(MetaClientConfig {
        graph_base: server.uri(),
        api_version: "v19.0".to_string(),
        app_id: Some("app-123".to_string()),
        app_secret: app_secret.map(str::to_string),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn fetches_campaigns_for_prefixed_account() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v19.0/act_123/campaigns"))
        .and(query_param("access_token", "tok-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {
                    "id": "238",
                    "name": "Leads Janeiro",
                    "status": "ACTIVE",
                    "objective": "OUTCOME_LEADS",
                    "insights": {"data": [{"spend": "45.10", "clicks": "12"}]}
                },
                {"id": "239", "name": "Sem entrega", "status": "PAUSED"}
            ],
            "paging": {"cursors": {"before": "a", "after": "b"}}
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server, None);

    let campaigns = client.fetch_campaigns("act_123", "tok-abc").await.unwrap();
    assert_eq!(campaigns.len(), 2);
    assert_eq!(campaigns[0].name.as_deref(), Some("Leads Janeiro"));
    let nested = campaigns[0].insights.as_ref().unwrap();
    assert_eq!(nested.data[0].spend, Some(json!("45.10")));
    assert!(campaigns[1].insights.is_none());

    // bare numeric ids get the act_ prefix
    let again = client.fetch_campaigns("123", "tok-abc").await.unwrap();
    assert_eq!(again.len(), 2);
}

#[tokio::test]
async fn requests_daily_insights_for_the_window() {
    let server = MockServer::start().await;
    let window = InsightWindow {
        since: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        until: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
    };

    Mock::given(method("GET"))
        .and(path("/v19.0/cmp-9/insights"))
        .and(query_param("time_increment", "1"))
        .and(query_param(
            "time_range",
            r#"{"since":"2024-01-01","until":"2024-01-31"}"#,
        ))
        .and(query_param("access_token", "tok-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {
                    "date_start": "2024-01-01",
                    "date_stop": "2024-01-01",
                    "spend": "12.5",
                    "impressions": "1000",
                    "clicks": "20"
                },
                {
                    "date_start": "2024-01-02",
                    "date_stop": "2024-01-02",
                    "spend": "8",
                    "impressions": "700",
                    "clicks": "10"
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let insights = client_for(&server, None)
        .fetch_daily_insights("cmp-9", "tok-abc", window)
        .await
        .unwrap();

    assert_eq!(insights.len(), 2);
    assert_eq!(insights[1].date_start.as_deref(), Some("2024-01-02"));
    assert_eq!(insights[1].clicks, Some(json!("10")));
}

#[tokio::test]
async fn appsecret_proof_is_sent_when_secret_is_configured() {
    let server = MockServer::start().await;

    // hex(HMAC-SHA256("app-secret", "tok-abc"))
    let expected_proof = {
        use hmac::{Hmac, Mac};
        let mut mac = Hmac::<sha2::Sha256>::new_from_slice(b"app-secret").unwrap();
        mac.update(b"tok-abc");
        hex::encode(mac.finalize().into_bytes())
    };

    Mock::given(method("GET"))
        .and(path("/v19.0/act_555/campaigns"))
        .and(query_param("appsecret_proof", expected_proof.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let campaigns = client_for(&server, Some("app-secret"))
        .fetch_campaigns("555", "tok-abc")
        .await
        .unwrap();
    assert!(campaigns.is_empty());
}

#[tokio::test]
async fn error_envelope_surfaces_provider_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v19.0/act_123/campaigns"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "message": "Error validating access token: Session has expired",
                "type": "OAuthException",
                "code": 190,
                "fbtrace_id": "AbC"
            }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server, None)
        .fetch_campaigns("123", "expired")
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Error validating access token: Session has expired"
    );
    assert_eq!(err.provider_code(), Some(190));
    match err {
        MetaApiError::Provider { error_type, .. } => {
            assert_eq!(error_type.as_deref(), Some("OAuthException"))
        }
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn error_envelope_wins_even_on_success_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v19.0/cmp-1/insights"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"message": "Unsupported get request", "code": 100}
        })))
        .mount(&server)
        .await;

    let err = client_for(&server, None)
        .fetch_daily_insights(
            "cmp-1",
            "tok",
            InsightWindow::ending(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, MetaApiError::Provider { code: Some(100), .. }));
}

#[tokio::test]
async fn server_error_without_envelope_is_http_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v19.0/act_123/campaigns"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let err = client_for(&server, None)
        .fetch_campaigns("123", "tok")
        .await
        .unwrap_err();

    match err {
        MetaApiError::Http { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("upstream unavailable"));
        }
        other => panic!("expected http error, got {other:?}"),
    }
}

#[tokio::test]
async fn exchanges_short_lived_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v19.0/oauth/access_token"))
        .and(query_param("grant_type", "fb_exchange_token"))
        .and(query_param("client_id", "app-123"))
        .and(query_param("client_secret", "app-secret"))
        .and(query_param("fb_exchange_token", "short-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "long-token",
            "token_type": "bearer",
            "expires_in": 5183944
        })))
        .expect(1)
        .mount(&server)
        .await;

    let exchanged = client_for(&server, Some("app-secret"))
        .exchange_long_lived_token("short-token")
        .await
        .unwrap();

    assert_eq!(exchanged.access_token, "long-token");
    assert_eq!(exchanged.expires_in, Some(5_183_944));
}
