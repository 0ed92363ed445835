//! # apikit
//!
//! HTTP plumbing shared by the remote-service adapters: a traced
//! `reqwest` wrapper that opens one span per outgoing request, stamps a W3C
//! `traceparent` header, and optionally signs requests with a bearer token.

pub mod client;
pub mod trace;

pub use client::TracedClient;
