//! Integration test suite for the ECMAScript toolkit
//!
//! Exercises the parser and unparser together across crate boundaries.

/// Re-export components for test convenience
pub mod components {
    pub use core_types;
    pub use parser;
    pub use unparser;
}
