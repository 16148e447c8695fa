//! Presentation layer handling terminal UI and user input.
//!
//! This module manages the terminal user interface using ratatui, maps key
//! presses to application actions and lays out the tables of each screen.

pub mod columns;
pub mod input;
pub mod ui;

pub use input::*;
pub use ui::*;
