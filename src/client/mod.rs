//! Client-side view-model for the todo item API.
//!
//! [`TodoClient`] keeps an ordered local copy of the user's items and talks
//! to the server through a [`TodoApi`]; [`HttpTodoApi`] is the reqwest-backed
//! implementation. Local state only changes after a request succeeds.

pub mod api;
pub mod error;
pub mod reconcile;
pub mod view_model;

pub use api::{HttpTodoApi, TodoApi};
pub use error::ClientError;
pub use view_model::{ClientConfig, TodoClient};
