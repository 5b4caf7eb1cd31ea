use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::warn;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{
    adapters::{http::app_state::AppState, persistence::PostgresPersistence},
    application::ports::{NotificationDispatcher, ReferralBonusEngine, SubscriptionActivator},
    infra::{
        config::{AppConfig, PlategaConfig},
        platega_client::PlategaClient,
    },
    use_cases::{reconciliation::ReconciliationEngine, webhook_auth::WebhookAuthenticator},
};

/// Host-provided implementations of the settlement collaborators.
pub struct Collaborators {
    pub subscription: Arc<dyn SubscriptionActivator>,
    pub referral: Arc<dyn ReferralBonusEngine>,
    pub notifier: Arc<dyn NotificationDispatcher>,
}

pub async fn init_app_state(
    config: AppConfig,
    collaborators: Collaborators,
) -> anyhow::Result<AppState> {
    if !config.platega.is_configured() {
        warn!("platega credentials missing or integration disabled, callbacks will be rejected");
    }

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let ledger = Arc::new(PostgresPersistence::new(pool));

    let engine = ReconciliationEngine::new(
        authenticator_from_config(&config.platega),
        ledger,
        collaborators.subscription,
        collaborators.referral,
        collaborators.notifier,
    );

    let gateway = PlategaClient::new(config.platega.clone());

    Ok(AppState {
        config: Arc::new(config),
        engine: Arc::new(engine),
        gateway: Arc::new(gateway),
    })
}

pub fn authenticator_from_config(config: &PlategaConfig) -> Option<WebhookAuthenticator> {
    if !config.is_configured() {
        return None;
    }
    let (Some(merchant_id), Some(secret_key)) = (&config.merchant_id, &config.secret_key) else {
        return None;
    };
    Some(WebhookAuthenticator::new(
        merchant_id.clone(),
        secret_key.clone(),
    ))
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "platega_gateway=debug,tower_http=debug".into());

    let console_layer = fmt::layer().with_target(false).with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init()
        .ok();
}
