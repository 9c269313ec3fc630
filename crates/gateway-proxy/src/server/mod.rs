//! HTTP surface of the proxy: routing, handlers, and shared state.

pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
