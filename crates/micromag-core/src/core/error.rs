use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid value for {kind}.{attribute}: {reason}")]
    InvalidValue {
        kind: &'static str,
        attribute: &'static str,
        reason: String,
    },

    #[error(
        "There is already a {kind} term named '{name}' in {container}; \
         provide a different name for the new term"
    )]
    DuplicateTerm {
        kind: &'static str,
        name: String,
        container: &'static str,
    },

    #[error("Term '{name}' not in {container}")]
    TermNotFound {
        name: String,
        container: &'static str,
    },

    #[error("{container} has no term named '{name}'")]
    NoSuchTerm {
        name: String,
        container: &'static str,
    },

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("{kind}::{operation} is left to an external calculator")]
    Unimplemented {
        kind: &'static str,
        operation: &'static str,
    },
}
