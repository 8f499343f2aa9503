//! Route definitions for the Ops Portal

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Room for multipart boundaries and text fields on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .route("/auth/login", post(handlers::login))
        // Protected routes - spreadsheet imports
        .nest("/imports", import_routes(state.clone()))
        // Protected routes - inventory and cost records
        .nest("/inventory", inventory_routes(state.clone()))
        .nest("/cost-records", cost_record_routes(state.clone()))
        // Protected routes - fixed costs and payroll
        .nest("/fixed-costs", fixed_cost_routes(state.clone()))
        .nest("/payroll", payroll_routes(state.clone()))
        // Protected routes - reports
        .nest("/reports", report_routes(state.clone()))
        // Protected routes - notifications
        .nest("/notifications", notification_routes(state))
}

/// Spreadsheet import routes (protected)
fn import_routes(state: AppState) -> Router<AppState> {
    let body_limit = state.config.import.max_upload_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/inventory/preview", post(handlers::preview_inventory))
        .route("/inventory/commit", post(handlers::commit_inventory))
        .route("/inventory/export", post(handlers::export_inventory))
        .route("/cost-sheet/preview", post(handlers::preview_cost_sheet))
        .route("/cost-sheet/commit", post(handlers::commit_cost_sheet))
        .layer(DefaultBodyLimit::max(body_limit))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Inventory routes (protected)
fn inventory_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_inventory))
        .route("/:sku/history", get(handlers::get_inventory_history))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Cost record routes (protected)
fn cost_record_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_cost_records))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Fixed cost routes (protected)
fn fixed_cost_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_fixed_costs).post(handlers::create_fixed_cost))
        .route("/:id", put(handlers::update_fixed_cost))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Payroll routes (protected)
fn payroll_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_payroll).post(handlers::create_payroll))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Report routes (protected)
fn report_routes(state: AppState) -> Router<AppState> {
    let body_limit = state.config.import.max_upload_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/profit", post(handlers::analyze_profit))
        .layer(DefaultBodyLimit::max(body_limit))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Notification routes (protected)
fn notification_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/unread-count", get(handlers::get_unread_count))
        .route("/mark-checked", post(handlers::mark_checked))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
