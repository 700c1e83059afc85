//! Shared source-location and error types for the ECMAScript toolkit.
//!
//! Every stage of the pipeline (lexer, parser, unparser) reports positions
//! and failures through the types defined here.
//!
//! # Overview
//!
//! - [`SourcePosition`] - 1-based line/column plus character offset
//! - [`JsError`] - A positioned lexical or syntax error
//! - [`ErrorKind`] - Category of a [`JsError`]
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, JsError, SourcePosition};
//!
//! let error = JsError::new(
//!     ErrorKind::Lexical,
//!     "Illegal character '`'",
//!     Some(SourcePosition::new(1, 1, 0)),
//! );
//! assert_eq!(error.to_string(), "Illegal character '`' at 1:1");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod source;

pub use error::{ErrorKind, JsError, JsResult};
pub use source::SourcePosition;
