use thiserror::Error;

/// Errors raised while reading a process graph document.
///
/// Layout itself never fails; malformed references inside a well-formed
/// document are dropped by the forest builder instead.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("graph document is empty")]
    Empty,

    #[error("invalid graph document: {0}")]
    Syntax(String),

    #[error("graph document has no `steps` array")]
    MissingSteps,
}

impl From<serde_json::Error> for ParseError {
    fn from(error: serde_json::Error) -> Self {
        ParseError::Syntax(error.to_string())
    }
}

impl From<json5::Error> for ParseError {
    fn from(error: json5::Error) -> Self {
        ParseError::Syntax(error.to_string())
    }
}
