// Presentation layer - HTTP handlers and JSON views
pub mod app_state;
pub mod handlers;
pub mod views;
