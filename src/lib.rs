// Library crate for the outreach management server
// This file exposes the public API for integration tests

pub mod auth;
pub mod note;
pub mod retreat;
pub mod routes;
pub mod servantee;
pub mod shared;
pub mod user;

// Re-export commonly used types for easier access in tests
pub use auth::{token::TokenConfig, AccessClaims};
pub use note::NoteModel;
pub use retreat::RetreatModel;
pub use routes::router;
pub use servantee::ServanteeModel;
pub use shared::{AppError, AppState};
pub use user::{Role, UserModel};
