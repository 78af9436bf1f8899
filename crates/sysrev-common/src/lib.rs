//! Shared error taxonomy and text utilities for the sysrev workspace.

pub mod error;
pub mod text;

pub use error::{Result, SysrevError};
