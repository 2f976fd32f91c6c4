mod error;
mod handlers;
mod server;
pub mod wire;

pub use error::ApiError;
pub use server::{AppState, router, serve};
