// === PUBLIC CONTRACT ===
// Models, port traits and errors shared with the binary and with adapters
pub mod contract;

pub use contract::{client, error, model};

// === WIRING ===
pub mod module;
pub use domain::workspace::Workspace;
pub use module::{build_workspace, Endpoints};

// === INTERNAL MODULES ===
// WARNING: exposed for integration tests and for wiring in the binary.
// Only `contract`, `module` and `Workspace` are meant as stable API.
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
