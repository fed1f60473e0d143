//! HTTP API: server, routing, and request/response mapping.

pub mod access_layer;
pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
