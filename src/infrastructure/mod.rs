//! Infrastructure layer providing external service integrations.
//!
//! This module contains the backend HTTP client, token and settings
//! storage, logging setup, file export and clipboard access.

pub mod api_client;
pub mod clipboard;
pub mod config;
pub mod logging;
pub mod mock;
pub mod persistence;
pub mod token_store;

pub use api_client::*;
pub use config::*;
pub use persistence::*;
pub use token_store::*;
