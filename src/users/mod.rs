mod dto;
pub mod handlers;
mod services;
pub mod tree;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::user_routes())
}
