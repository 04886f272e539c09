//! HTTP gateway surface.

pub mod handlers;
mod server;

pub use server::{router, AppState, HttpServer};
