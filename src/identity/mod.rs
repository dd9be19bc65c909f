pub mod dto;
pub mod extractors;
pub mod handlers;
mod repo;
pub mod repo_types;
pub mod verifier;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::user_routes())
        .merge(handlers::avatar_routes())
        .merge(handlers::role_routes())
}
