// Public API - what other modules can use
pub use handlers::{
    create_note, delete_note, get_note, get_notes_for_retreat, get_notes_for_servantee, update_note,
};
pub use models::NoteModel;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;
