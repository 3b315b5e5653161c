pub mod handlers;
pub mod models;
pub mod reorder;
pub mod service;

// Re-export handlers for use in main.rs
pub use handlers::{
    create_category, get_category, list_categories, reorder_categories, update_category,
};
