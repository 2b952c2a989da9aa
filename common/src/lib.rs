//! Common utilities for the Decant project.
//!
//! This crate holds the error taxonomy shared by the planning,
//! materialization, and output-adaptation layers.

pub mod error;

pub use error::{CommonError, Diagnose, ErrorStage, Result};
