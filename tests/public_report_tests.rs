//! Public report lifecycle: management by the owner and token-addressed reads.

mod test_utils;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use uuid::Uuid;

use test_utils::*;
use traffic_manager::repositories::{
    NewPublicReport, PublicReportChanges, PublicReportRepository,
};
use traffic_manager::server::AppState;

async fn create_report_via_api(state: &AppState, gestor_id: Uuid, cliente_id: Uuid) -> Value {
    let (status, body) = send(
        state,
        Method::POST,
        "/api/reports",
        Some(&session_token(gestor_id)),
        Some(json!({
            "cliente_id": cliente_id,
            "titulo": "Resultados de Janeiro",
            "descricao": "Campanhas de captação"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn report_management_requires_session() {
    let state = test_state(FakeConnector::new()).await;

    let (status, _) = send(&state, Method::GET, "/api/reports", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &state,
        Method::GET,
        "/api/reports",
        Some("not-a-jwt"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &state,
        Method::DELETE,
        &format!("/api/reports/{}", Uuid::new_v4()),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn created_report_has_opaque_token_and_is_listed() {
    let state = test_state(FakeConnector::new()).await;
    let gestor_id = Uuid::new_v4();
    let cliente = create_client(&state, gestor_id, "Padaria Central").await;

    let created = create_report_via_api(&state, gestor_id, cliente.id).await;
    let token = created["token"].as_str().unwrap();
    assert_eq!(token.len(), 43);
    assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    assert_eq!(created["ativo"], true);
    assert_eq!(created["visualizacoes"], 0);

    let other = create_report_via_api(&state, gestor_id, cliente.id).await;
    assert_ne!(other["token"], created["token"]);

    let (status, body) = send(
        &state,
        Method::GET,
        "/api/reports",
        Some(&session_token(gestor_id)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 2);

    let (_, body) = send(
        &state,
        Method::GET,
        "/api/reports",
        Some(&session_token(Uuid::new_v4())),
        None,
    )
    .await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn creating_a_report_for_someone_elses_client_is_not_found() {
    let state = test_state(FakeConnector::new()).await;
    let cliente = create_client(&state, Uuid::new_v4(), "Loja").await;

    let (status, body) = send(
        &state,
        Method::POST,
        "/api/reports",
        Some(&session_token(Uuid::new_v4())),
        Some(json!({"cliente_id": cliente.id, "titulo": "Intruso"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn public_fetch_counts_every_view() {
    let state = test_state(FakeConnector::new()).await;
    let gestor_id = Uuid::new_v4();
    let cliente = create_client(&state, gestor_id, "Academia Forte").await;
    let created = create_report_via_api(&state, gestor_id, cliente.id).await;
    let uri = format!("/api/public/reports/{}", created["token"].as_str().unwrap());

    for expected in 1..=3 {
        let (status, body) = send(&state, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["relatorio"]["visualizacoes"], expected);
        assert_eq!(body["cliente"]["nome"], "Academia Forte");
        assert_eq!(body["leads_estimados"], true);
    }

    let stored = PublicReportRepository::new(state.db.clone())
        .find_by_token(created["token"].as_str().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.visualizacoes, 3);
    assert!(stored.ultima_visualizacao.is_some());
}

#[tokio::test]
async fn public_payload_includes_campaigns_metrics_and_summary() {
    let connector = FakeConnector::new();
    let state = test_state(connector.clone()).await;
    let gestor_id = Uuid::new_v4();
    let cliente = create_client(&state, gestor_id, "Clínica Sorriso").await;
    let account = connect_account(&state, gestor_id, "8001", Some(cliente.id)).await;

    let today = Utc::now().date_naive();
    let yesterday = (today - Duration::days(1)).format("%Y-%m-%d").to_string();
    let two_days_ago = (today - Duration::days(2)).format("%Y-%m-%d").to_string();
    let long_ago = (today - Duration::days(90)).format("%Y-%m-%d").to_string();

    connector.with_campaigns("8001", vec![raw_campaign("cmp-1", "Implantes")]);
    connector.with_insights(
        "cmp-1",
        vec![
            raw_insight(&yesterday, "10", "1000", "20"),
            raw_insight(&two_days_ago, "5", "1000", "30"),
            raw_insight(&long_ago, "99", "9999", "999"),
        ],
    );
    state.executor.sync_account(&account).await.unwrap();

    let created = create_report_via_api(&state, gestor_id, cliente.id).await;
    let uri = format!("/api/public/reports/{}", created["token"].as_str().unwrap());
    let (status, body) = send(&state, Method::GET, &uri, None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["campanhas"].as_array().unwrap().len(), 1);
    assert_eq!(body["campanhas"][0]["nome"], "Implantes");
    assert_eq!(body["metricas"].as_array().unwrap().len(), 2);
    assert_eq!(body["resumo"]["gasto_total"], 15.0);
    assert_eq!(body["resumo"]["impressoes"], 2000);
    assert_eq!(body["resumo"]["cliques"], 50);
    assert_eq!(body["resumo"]["leads"], 2);
    assert_eq!(body["resumo"]["ctr"], 2.5);
}

#[tokio::test]
async fn inactive_report_is_not_found_even_when_unexpired() {
    let state = test_state(FakeConnector::new()).await;
    let gestor_id = Uuid::new_v4();
    let cliente = create_client(&state, gestor_id, "Pet Shop").await;
    let repo = PublicReportRepository::new(state.db.clone());

    let report = repo
        .create(
            gestor_id,
            NewPublicReport {
                cliente_id: cliente.id,
                titulo: "Pausado".to_string(),
                descricao: None,
                data_expiracao: Some((Utc::now() - Duration::days(1)).fixed_offset()),
            },
        )
        .await
        .unwrap();
    let report = repo
        .update(
            report,
            PublicReportChanges {
                ativo: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let (status, body) = send(
        &state,
        Method::GET,
        &format!("/api/public/reports/{}", report.token),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let unchanged = repo.find_by_id(report.id).await.unwrap().unwrap();
    assert_eq!(unchanged.visualizacoes, 0);
}

#[tokio::test]
async fn expired_report_is_gone_not_missing() {
    let state = test_state(FakeConnector::new()).await;
    let gestor_id = Uuid::new_v4();
    let cliente = create_client(&state, gestor_id, "Imobiliária").await;

    let report = PublicReportRepository::new(state.db.clone())
        .create(
            gestor_id,
            NewPublicReport {
                cliente_id: cliente.id,
                titulo: "Antigo".to_string(),
                descricao: None,
                data_expiracao: Some((Utc::now() - Duration::hours(1)).fixed_offset()),
            },
        )
        .await
        .unwrap();

    let (status, body) = send(
        &state,
        Method::GET,
        &format!("/api/public/reports/{}", report.token),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["code"], "EXPIRED");

    let (status, _) = send(
        &state,
        Method::GET,
        "/api/public/reports/does-not-exist",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_the_owner_can_update_or_delete() {
    let state = test_state(FakeConnector::new()).await;
    let owner = Uuid::new_v4();
    let cliente = create_client(&state, owner, "Restaurante").await;
    let created = create_report_via_api(&state, owner, cliente.id).await;
    let uri = format!("/api/reports/{}", created["id"].as_str().unwrap());
    let intruder = session_token(Uuid::new_v4());

    let (status, body) = send(
        &state,
        Method::PUT,
        &uri,
        Some(&intruder),
        Some(json!({"titulo": "Sequestrado", "ativo": false})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = send(&state, Method::DELETE, &uri, Some(&intruder), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let report_id = Uuid::parse_str(created["id"].as_str().unwrap()).unwrap();
    let untouched = PublicReportRepository::new(state.db.clone())
        .find_by_id(report_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.titulo, "Resultados de Janeiro");
    assert!(untouched.ativo);

    let owner_token = session_token(owner);
    let (status, body) = send(
        &state,
        Method::PUT,
        &uri,
        Some(&owner_token),
        Some(json!({"titulo": "Resultados de Fevereiro", "descricao": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["titulo"], "Resultados de Fevereiro");
    assert_eq!(body["descricao"], Value::Null);

    let (status, _) = send(&state, Method::DELETE, &uri, Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&state, Method::DELETE, &uri, Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
