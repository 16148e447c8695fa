//! reviewdesk - terminal consoles for AI ticket analyses
//!
//! An admin console for system health, configuration, manual triggers,
//! monitoring, audit logs and alerts, and a review console where analysts
//! approve, edit or reject AI-generated ticket analyses.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::*;
pub use domain::*;
