pub mod dto;
pub mod handlers;
pub mod model;
pub mod repo;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use model::TodoItem;
pub use repo::{PgTodoStore, TodoStore};

pub fn router() -> Router<AppState> {
    handlers::todo_item_routes()
}
