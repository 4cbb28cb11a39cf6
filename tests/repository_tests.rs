//! Repository behaviour against in-memory SQLite: upsert identity, token
//! sealing and sync settings bookkeeping.

mod test_utils;

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Timelike, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, Set};
use uuid::Uuid;

use test_utils::*;
use traffic_manager::crypto::is_encrypted_payload;
use traffic_manager::error::RepositoryError;
use traffic_manager::models::ad_account;
use traffic_manager::normalization::{NormalizedCampaign, NormalizedDailyMetric};
use traffic_manager::repositories::{
    AdAccountRepository, CampaignRepository, ConnectAccount, DailyMetricRepository,
    SyncConfigRepository, SyncSettingsUpdate,
};

fn campaign(id: &str, nome: &str, gasto: f64) -> NormalizedCampaign {
    NormalizedCampaign {
        id_externo: id.to_string(),
        nome: nome.to_string(),
        status: "ACTIVE".to_string(),
        objetivo: None,
        gasto_total: gasto,
        alcance: 0,
        impressoes: 0,
        cliques: 0,
        ctr: 0.0,
    }
}

fn daily(date: NaiveDate, gasto: f64, cliques: i64) -> NormalizedDailyMetric {
    NormalizedDailyMetric {
        data: date,
        gasto_dia: gasto,
        impressoes_dia: 100,
        cliques_dia: cliques,
        leads_dia: 0,
        ctr_dia: 0.0,
        cpc_dia: 0.0,
        cpm_dia: 0.0,
    }
}

#[tokio::test]
async fn reconnecting_an_account_replaces_token_in_place() {
    let db = Arc::new(setup_test_db().await.unwrap());
    let repo = AdAccountRepository::new(db.clone(), crypto_key());
    let gestor_id = Uuid::new_v4();

    let request = |token: &str| ConnectAccount {
        gestor_id,
        id_conta_externa: "act_9090".to_string(),
        nome: Some("Conta Principal".to_string()),
        cliente_id: None,
        access_token: token.to_string(),
        token_expira_em: None,
    };

    let first = repo.connect(request("first-token")).await.unwrap();
    assert_eq!(first.id_conta_externa, "9090");
    let stored = first.token_acesso_cifrado.clone().unwrap();
    assert!(is_encrypted_payload(&stored));
    assert!(!stored.windows(11).any(|w| w == b"first-token"));

    let mut deactivated = first.clone().into_active_model();
    deactivated.ativo = Set(false);
    deactivated.update(&*db).await.unwrap();

    let second = repo.connect(request("second-token")).await.unwrap();
    assert_eq!(second.id, first.id);
    assert!(second.ativo);
    assert_eq!(repo.access_token(&second).unwrap().as_deref(), Some("second-token"));
    assert_eq!(repo.list_for_manager(gestor_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn connect_rejects_malformed_input() {
    let db = Arc::new(setup_test_db().await.unwrap());
    let repo = AdAccountRepository::new(db, crypto_key());

    let err = repo
        .connect(ConnectAccount {
            gestor_id: Uuid::new_v4(),
            id_conta_externa: "act_abc".to_string(),
            nome: None,
            cliente_id: None,
            access_token: "tok".to_string(),
            token_expira_em: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Validation(_)));

    let err = repo
        .connect(ConnectAccount {
            gestor_id: Uuid::new_v4(),
            id_conta_externa: "123".to_string(),
            nome: None,
            cliente_id: None,
            access_token: "   ".to_string(),
            token_expira_em: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Validation(_)));
}

#[tokio::test]
async fn plaintext_tokens_are_sealed_once() {
    let db = Arc::new(setup_test_db().await.unwrap());
    let repo = AdAccountRepository::new(db.clone(), crypto_key());
    let gestor_id = Uuid::new_v4();

    let sealed = repo
        .connect(ConnectAccount {
            gestor_id,
            id_conta_externa: "111".to_string(),
            nome: None,
            cliente_id: None,
            access_token: "already-sealed".to_string(),
            token_expira_em: None,
        })
        .await
        .unwrap();

    let legacy = repo
        .connect(ConnectAccount {
            gestor_id,
            id_conta_externa: "222".to_string(),
            nome: None,
            cliente_id: None,
            access_token: "placeholder".to_string(),
            token_expira_em: None,
        })
        .await
        .unwrap();
    let mut active = legacy.clone().into_active_model();
    active.token_acesso_cifrado = Set(Some(b"legacy-plaintext".to_vec()));
    active.update(&*db).await.unwrap();

    let legacy = ad_account::Entity::find_by_id(legacy.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(repo.access_token(&legacy).unwrap().as_deref(), Some("legacy-plaintext"));

    assert_eq!(repo.reencrypt_plaintext_tokens().await.unwrap(), 1);
    assert_eq!(repo.reencrypt_plaintext_tokens().await.unwrap(), 0);

    let resealed = repo.find_by_id(legacy.id).await.unwrap().unwrap();
    assert!(is_encrypted_payload(resealed.token_acesso_cifrado.as_deref().unwrap()));
    assert_eq!(repo.access_token(&resealed).unwrap().as_deref(), Some("legacy-plaintext"));

    let untouched = repo.find_by_id(sealed.id).await.unwrap().unwrap();
    assert_eq!(untouched.token_acesso_cifrado, sealed.token_acesso_cifrado);
}

#[tokio::test]
async fn campaign_upsert_updates_existing_rows() {
    let state = test_state(FakeConnector::new()).await;
    let account = connect_account(&state, Uuid::new_v4(), "3030", None).await;
    let repo = CampaignRepository::new(state.db.clone());

    repo.upsert_for_account(
        account.id,
        &[campaign("c-1", "Antigo", 10.0), campaign("c-2", "Outro", 1.0)],
    )
    .await
    .unwrap();
    let before = repo.list_for_account(account.id).await.unwrap();

    let written = repo
        .upsert_for_account(account.id, &[campaign("c-1", "Renomeado", 25.0)])
        .await
        .unwrap();
    assert_eq!(written, 1);

    let after = repo.list_for_account(account.id).await.unwrap();
    assert_eq!(after.len(), 2);
    let renamed = after.iter().find(|c| c.id_externo == "c-1").unwrap();
    let original = before.iter().find(|c| c.id_externo == "c-1").unwrap();
    assert_eq!(renamed.id, original.id);
    assert_eq!(renamed.nome, "Renomeado");
    assert_eq!(renamed.gasto_total, 25.0);
}

#[tokio::test]
async fn daily_metrics_are_unique_per_campaign_and_day() {
    let state = test_state(FakeConnector::new()).await;
    let account = connect_account(&state, Uuid::new_v4(), "4040", None).await;
    let campaigns = CampaignRepository::new(state.db.clone());
    campaigns
        .upsert_for_account(account.id, &[campaign("c-1", "A", 0.0), campaign("c-2", "B", 0.0)])
        .await
        .unwrap();
    let listed = campaigns.list_for_account(account.id).await.unwrap();
    let (a, b) = (listed[0].id, listed[1].id);

    let repo = DailyMetricRepository::new(state.db.clone());
    let jan_1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let jan_2 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

    assert!(repo.last_written_at(a).await.unwrap().is_none());

    repo.upsert_for_campaign(a, &[daily(jan_1, 5.0, 10), daily(jan_2, 7.0, 20)])
        .await
        .unwrap();
    repo.upsert_for_campaign(a, &[daily(jan_2, 9.0, 30)])
        .await
        .unwrap();
    repo.upsert_for_campaign(b, &[daily(jan_2, 1.0, 1)])
        .await
        .unwrap();

    let rows = repo.list_for_campaign(a).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].data, jan_2);
    assert_eq!(rows[1].gasto_dia, 9.0);
    assert_eq!(rows[1].cliques_dia, 30);
    assert!(repo.last_written_at(a).await.unwrap().is_some());

    let recent = repo.list_for_campaigns_since(&[a, b], jan_2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert!(recent.iter().all(|m| m.data == jan_2));
    assert!(repo.list_for_campaigns_since(&[], jan_1).await.unwrap().is_empty());
}

#[tokio::test]
async fn sync_settings_default_then_schedule_next_run() {
    let db = Arc::new(setup_test_db().await.unwrap());
    let repo = SyncConfigRepository::new(db);
    let gestor_id = Uuid::new_v4();

    let created = repo
        .save_for_manager(
            gestor_id,
            SyncSettingsUpdate {
                sync_automatico: Some(true),
                intervalo_horas: None,
            },
            6,
        )
        .await
        .unwrap();
    assert!(created.sync_automatico);
    assert_eq!(created.intervalo_horas, 6);
    assert!(created.is_due(Utc::now().fixed_offset()));

    let updated = repo
        .save_for_manager(
            gestor_id,
            SyncSettingsUpdate {
                sync_automatico: None,
                intervalo_horas: Some(12),
            },
            6,
        )
        .await
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert!(updated.sync_automatico);
    assert_eq!(updated.intervalo_horas, 12);

    let ran_at = Utc::now().fixed_offset().with_nanosecond(0).unwrap();
    let recorded = repo.record_run(updated, ran_at).await.unwrap();
    assert_eq!(recorded.ultima_execucao, Some(ran_at));
    assert_eq!(recorded.proxima_execucao, Some(ran_at + Duration::hours(12)));
    assert!(!recorded.is_due(ran_at + Duration::hours(11)));
    assert!(recorded.is_due(ran_at + Duration::hours(12)));

    assert_eq!(repo.list_enabled().await.unwrap().len(), 1);

    let err = repo
        .save_for_manager(
            gestor_id,
            SyncSettingsUpdate {
                sync_automatico: None,
                intervalo_horas: Some(0),
            },
            6,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Validation(_)));
}
