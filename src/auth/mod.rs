// Public API - what other modules can use
pub use handlers::{login, logout, profile, refresh, register};
pub use middleware::{authorize, jwt_auth, require_admin};
pub use types::AccessClaims;

// Internal modules
mod handlers;
mod middleware;
pub mod password;
pub mod service;
pub mod token;
pub mod types;
