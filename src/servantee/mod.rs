// Public API - what other modules can use
pub use handlers::{
    create_servantee, delete_servantee, get_servantee, list_servantees, update_servantee,
};
pub use models::ServanteeModel;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
