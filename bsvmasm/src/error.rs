use std::error::Error as StdError;
use std::fmt;

/// An assembler error, bound to the 1-based line of the preprocessed source
/// it was raised for (line 0 for errors without a position, such as a
/// missing input file or a convergence failure).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsmError {
    pub line: usize,
    pub message: String,
}

impl AsmError {
    pub fn new(line: usize, message: impl Into<String>) -> AsmError {
        AsmError {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl StdError for AsmError {}

pub type Result<T> = std::result::Result<T, AsmError>;
