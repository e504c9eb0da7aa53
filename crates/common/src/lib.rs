//! Common crate
//!
//! Shared error handling for Igloo.
//!
//! # Example
//! ```rust
//! use igloo_common::Error;
//! let err = Error::Parse("not a number: x".to_string());
//! assert!(!err.is_store());
//! ```

pub mod error;

pub use error::{Error, Result};
