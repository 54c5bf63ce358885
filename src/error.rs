use thiserror::Error;

/// A failed compilation, carrying the driver's accumulated diagnostic text.
///
/// Returned by the convenience entry points
/// [`RuleSet::from_seclang()`](crate::RuleSet::from_seclang) and
/// [`RuleSet::from_file()`](crate::RuleSet::from_file). The text concatenates
/// every diagnostic recorded during the attempt; see
/// [`Driver::diagnostics()`](crate::Driver::diagnostics) for the format.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct PolicyError {
    message: String,
}

impl PolicyError {
    pub(crate) fn new(diagnostics: String) -> Self {
        PolicyError {
            message: diagnostics.trim_end().to_owned(),
        }
    }

    /// The full diagnostic text.
    pub fn message(&self) -> &str {
        &self.message
    }
}
