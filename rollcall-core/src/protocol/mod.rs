pub mod http;

// Re-export comodi
pub use http::{ListUsersResponse, HEALTH_PATH, USERS_PATH};
