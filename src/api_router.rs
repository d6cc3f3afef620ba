//! Combines the API routes from all feature modules into a unified router.

use axum::Router;
use std::sync::Arc;

use crate::shared::state::AppState;

pub fn configure_api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(crate::clients::configure_clients_routes())
        .merge(crate::catalog::configure_catalog_routes())
        .merge(crate::quotations::configure_quotations_routes())
        .merge(crate::projects::configure_projects_routes())
        .merge(crate::dashboard::configure_dashboard_routes())
}
