//! Domain layer: backend records, the review workflow and derived values.

pub mod errors;
pub mod models;
pub mod review;
pub mod sections;
pub mod sla;

pub use errors::*;
pub use models::*;
pub use review::*;
pub use sections::*;
pub use sla::*;
