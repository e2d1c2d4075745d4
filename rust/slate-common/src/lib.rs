//! Core definitions (error types and verification helpers), relied upon by all slate-* crates.

pub mod error;
pub mod macros;
pub mod result;

pub use error::{Error, ErrorClass, ErrorKind};
pub use result::Result;
