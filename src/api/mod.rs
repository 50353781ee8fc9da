pub mod client;
pub mod models;

pub use client::{ApiError, HttpClient, RemoteBody, Result};
pub use models::ClientConfig;
