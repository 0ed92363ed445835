pub mod cache;
pub mod colors;
pub mod dashboard;
pub mod guard;
pub mod permissions;
pub mod ports;
pub mod session;
pub mod workspace;
