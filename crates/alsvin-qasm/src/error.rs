//! Error types for QASM parsing and emission.

use thiserror::Error;

/// Errors produced while lexing or parsing QASM source.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QasmError {
    /// The lexer could not tokenize the input.
    #[error("Invalid token at byte {position}")]
    Lex { position: usize },

    /// The parser saw something unexpected.
    #[error("Expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    /// Input ended mid-statement.
    #[error("Unexpected end of input")]
    UnexpectedEof,

    /// Only OPENQASM 2.0 sources are accepted.
    #[error("Unsupported QASM version: {0}")]
    UnsupportedVersion(String),

    /// A gate name the parser does not know.
    #[error("Unknown gate: {0}")]
    UnknownGate(String),

    /// A register name that was never declared.
    #[error("Unknown register: {0}")]
    UnknownRegister(String),

    /// Register index past the declared size.
    #[error("Index {index} out of range for register {register}[{size}]")]
    IndexOutOfRange {
        register: String,
        index: usize,
        size: usize,
    },

    /// The parsed program violated a circuit invariant.
    #[error(transparent)]
    Ir(#[from] alsvin_ir::IrError),
}

/// Result type for QASM operations.
pub type QasmResult<T> = Result<T, QasmError>;
