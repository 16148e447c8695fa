//! Application layer managing state and backend workflows.
//!
//! This module coordinates between the domain layer and presentation layer:
//! the client-side store, the requests the consoles make and the background
//! dispatcher that runs them.

pub mod requests;
pub mod state;
pub mod store;

pub use requests::*;
pub use state::*;
pub use store::*;
