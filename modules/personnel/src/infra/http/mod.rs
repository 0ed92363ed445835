//! HTTP adapters for the auth service and the personnel API.

pub mod auth_client;
pub mod personnel_client;
mod response;

pub use auth_client::HttpAuthClient;
pub use personnel_client::HttpPersonnelClient;
