// Public API - what other modules can use
pub use handlers::{
    create_retreat, delete_retreat, get_retreat, get_retreats_for_servantee, list_retreats,
    update_retreat,
};
pub use models::RetreatModel;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
