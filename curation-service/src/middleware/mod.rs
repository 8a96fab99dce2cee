pub mod auth;

pub use auth::{AdminUser, AuthUser, auth_middleware, optional_auth_middleware};
