//! # DocWell Testkit
//!
//! Test utilities for DocWell.
//!
//! This crate provides:
//! - Database fixtures and pre-populated scenarios
//! - Property-based generators for values, documents and write sequences
//! - Stress runners for concurrent writers
//!
//! ## Usage
//!
//! ```
//! use docwell_testkit::prelude::*;
//!
//! with_temp_db(|db| {
//!     let people = db.collection("people").unwrap();
//!     assert_eq!(people.size(), 0);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
