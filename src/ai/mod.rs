//! Record summaries and question answering over a hosted chat model.

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod parser;
pub mod repo_types;
pub mod services;
pub mod session;
pub mod summarize;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::ai_routes()
}
