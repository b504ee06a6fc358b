use thiserror::Error;

/// error types for formula parsing, mass lookup and mass library loading
#[derive(Debug, Error)]
pub enum StoichError {
    #[error("Unknown element: '{0}' is not present in the atomic mass table")]
    UnknownElement(String),
    #[error("Formula is empty or contains no element symbols")]
    EmptyFormula,
    #[error("Unbalanced parentheses in formula '{0}'")]
    UnbalancedParentheses(String),
    #[error("Unexpected character '{character}' at position {position} in formula '{formula}'")]
    UnexpectedCharacter {
        formula: String,
        character: char,
        position: usize,
    },
    #[error("Malformed hydrate suffix '{0}', expected something like '5H2O'")]
    MalformedHydrate(String),
    #[error("Invalid atomic mass {mass} for element '{symbol}'")]
    InvalidMass { symbol: String, mass: f64 },
    #[error("File '{0}' does not exist")]
    FileNotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
