use crate::state::AppState;
use axum::Router;

pub mod avatars;
mod dto;
pub mod handle;
pub mod handlers;
pub mod memory;
pub mod pg;
pub mod repo;
pub mod repo_types;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::me_routes())
        .merge(handlers::profile_routes())
}
