//! Error taxonomy.
//!
//! Hard failures abort before the scene is touched. Recoverable anomalies
//! (missing optional fields, dangling bonds, unknown step types) never reach
//! these types: they are defaulted where they are found and logged.

use thiserror::Error;

use crate::api::provider::ProviderError;
use crate::api::types::ErrorKind;

/// Structural problems that reject a reaction plan as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("reaction plan is not an object")]
    NotAnObject,
    #[error("reaction plan is missing '{0}'")]
    MissingField(&'static str),
    #[error("'{0}' must be an array")]
    NotAnArray(&'static str),
    #[error("reaction plan has neither reactants nor products")]
    NoSubstances,
    #[error("substance '{molecule}' is missing its required 'bonds' array")]
    MissingBonds { molecule: String },
    #[error("substance '{molecule}' is invalid: {reason}")]
    InvalidSubstance { molecule: String, reason: &'static str },
}

/// The provider's text could not be turned into a JSON document.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("no JSON object found in response")]
    NoObject,
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Top-level error for generation and loading.
#[derive(Debug, Error)]
pub enum ReactionError {
    #[error("enter the reactants to generate a reaction")]
    EmptyPrompt,
    #[error("a reaction is already being generated")]
    Busy,
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("the response could not be read as a reaction plan: {0}")]
    Format(#[from] FormatError),
    #[error("the reaction plan is incomplete: {0}")]
    Structure(#[from] ValidationError),
}

impl ReactionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReactionError::EmptyPrompt | ReactionError::Busy => ErrorKind::Input,
            ReactionError::Provider(_) => ErrorKind::Provider,
            ReactionError::Format(_) => ErrorKind::Format,
            ReactionError::Structure(_) => ErrorKind::Structure,
        }
    }
}
