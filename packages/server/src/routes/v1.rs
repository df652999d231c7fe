use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/bills", bill_routes(config))
}

fn bill_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::bill::list_bills,
            handlers::bill::upload_bill
        ))
        .routes(routes!(handlers::bill::get_bill))
        .routes(routes!(handlers::bill::download_bill))
        .layer(handlers::bill::bill_upload_body_limit(
            config.storage.max_upload_size,
        ))
}
