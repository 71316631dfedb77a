use thiserror::Error;

/// Failure reported by a plan provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The backend could not be reached or was never configured.
    #[error("the AI engine is not available: {0}")]
    Unavailable(String),
    /// The backend answered with an error.
    #[error("the AI engine failed: {0}")]
    Backend(String),
}

/// External collaborator that turns a user prompt into raw document text.
///
/// The engine treats the returned text as opaque: it may wrap the JSON
/// document in commentary. Hosts with an asynchronous backend skip this
/// trait and use `Visualizer::begin_generation` / `finish_generation`.
pub trait ReactionPlanProvider {
    fn generate(&mut self, prompt: &str) -> Result<String, ProviderError>;
}

impl<F> ReactionPlanProvider for F
where
    F: FnMut(&str) -> Result<String, ProviderError>,
{
    fn generate(&mut self, prompt: &str) -> Result<String, ProviderError> {
        self(prompt)
    }
}
