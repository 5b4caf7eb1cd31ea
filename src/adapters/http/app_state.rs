use std::sync::Arc;

use crate::{
    infra::{config::AppConfig, platega_client::PlategaClient},
    use_cases::reconciliation::ReconciliationEngine,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: Arc<ReconciliationEngine>,
    pub gateway: Arc<PlategaClient>,
}
