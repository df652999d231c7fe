use std::sync::Arc;

use crate::config::AppConfig;
use crate::service::BillService;

#[derive(Clone)]
pub struct AppState {
    pub bills: Arc<BillService>,
    pub config: AppConfig,
}
