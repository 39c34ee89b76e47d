use crate::state::AppState;
use axum::Router;

mod claims;
pub mod credentials;
mod dto;
pub mod handlers;
pub mod jwt;
pub mod repo;

pub use claims::{Claims, TokenKind};
pub use jwt::{AuthUser, JwtKeys};
pub use repo::{PgUserStore, User, UserStore};

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}
