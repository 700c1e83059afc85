//! Unparser error types

use thiserror::Error;

/// Errors raised while building rules or rule definitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// The name is not an attribute of any node type
    #[error("unknown attribute '{0}'")]
    UnknownAttribute(String),

    /// A rule references an attribute its node type does not have
    #[error("rule for '{node_type}' references attribute '{field}' missing from its schema")]
    MissingAttribute {
        /// Node type name
        node_type: String,
        /// Attribute name
        field: String,
    },
}

/// Errors raised while walking a tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnparseError {
    /// No rule is defined for the node type
    #[error("no rule defined for node type '{0}'")]
    RuleLookup(String),

    /// A deferred element asked for an attribute the node does not have
    #[error("node type '{node_type}' has no attribute '{field}'")]
    Attribute {
        /// Node type name
        node_type: String,
        /// Attribute name
        field: String,
    },

    /// A deferrable without an implementation was invoked
    #[error("deferrable '{0}' is not implemented")]
    NotImplemented(String),

    /// Invalid rule configuration
    #[error(transparent)]
    Rule(#[from] RuleError),
}

/// Result type for unparse operations
pub type UnparseResult<T> = Result<T, UnparseError>;
