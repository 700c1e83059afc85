//! ECMAScript Unparser Component
//!
//! Turns parser trees back into source text. Output is driven by rule
//! definitions (one element sequence per node type) and rule sets whose
//! handlers decide what each layout element becomes.
//!
//! # Overview
//!
//! - [`Definitions`] - Per-node-type rules, see [`definitions::es5`]
//! - [`Dispatcher`] - Definitions merged with rule set handlers
//! - [`Walk`] - Lazy stream of output [`Chunk`]s
//! - [`rules`] - Spacing, indentation, minification and mangling rules
//! - [`pretty_print`] / [`minify_print`] - Ready-made unparsers
//!
//! # Example
//!
//! ```
//! use parser::parse;
//! use unparser::{minify_print, pretty_print, MinifyOptions};
//!
//! let program = parse("function f(a){return a*2}").unwrap();
//! assert_eq!(
//!     pretty_print(&program, "    ").unwrap(),
//!     "function f(a) {\n    return a * 2;\n}\n"
//! );
//! assert_eq!(
//!     minify_print(&program, &MinifyOptions::default()).unwrap(),
//!     "function f(a){return a*2}"
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod definitions;
pub mod dispatcher;
pub mod error;
pub mod layout;
pub mod obfuscate;
pub mod rules;
pub mod ruletypes;
pub mod unparsers;

pub use definitions::Definitions;
pub use dispatcher::{Chunk, Dispatcher, Walk};
pub use error::{RuleError, UnparseError, UnparseResult};
pub use layout::{needs_space, Indentator};
pub use obfuscate::{NameGenerator, ObfuscateOptions, Obfuscator};
pub use rules::{Rule, RuleSet};
pub use ruletypes::{Declare, Deferrable, Elements, Layout, Resolve, Resolved, RuleElement, Token};
pub use unparsers::{minify_print, pretty_print, MinifyOptions, Unparser};
