// Public API - what other modules can use
pub use handlers::{create_user, delete_user, get_user, list_users, update_user};
pub use models::{Role, UserModel};
pub use types::{CreateUserRequest, UserResponse};

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
