//! # DocWell Codec
//!
//! Value model and serde mapping for DocWell documents.
//!
//! This crate provides:
//! - [`Value`], the dynamic field value stored in documents
//! - [`to_value`] / [`from_value`], a serde bridge for mapping Rust types
//!
//! ## Value Rules
//!
//! - Map keys are text and kept in key order
//! - Integers are `i64`
//! - No floats (every value is totally ordered)
//!
//! ## Usage
//!
//! ```
//! use docwell_codec::{from_value, to_value, Value};
//!
//! let value = to_value(&vec!["a", "b"]).unwrap();
//! assert_eq!(value, Value::Array(vec!["a".into(), "b".into()]));
//!
//! let back: Vec<String> = from_value(&value).unwrap();
//! assert_eq!(back, vec!["a", "b"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod serde_bridge;
mod value;

pub use error::{CodecError, CodecResult};
pub use serde_bridge::{from_value, to_value};
pub use value::Value;
