//! HTTP API handlers

pub mod ai;
pub mod auth;
pub mod content;
pub mod health;
pub mod paths;
pub mod trails;
pub mod users;

pub use ai::ai_routes;
pub use auth::AuthUser;
pub use content::content_routes;
pub use paths::path_routes;
pub use trails::trail_routes;
pub use users::user_routes;
