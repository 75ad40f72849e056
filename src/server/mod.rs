pub mod console_routes;
pub mod middleware;
pub mod page;
pub mod routes;

use axum::Router;
use std::sync::Arc;

use crate::console::Console;

#[derive(Clone)]
pub struct AppState {
    pub console: Arc<Console>,
}

pub fn create_app(state: AppState) -> Router {
    routes::build_router(state)
}
