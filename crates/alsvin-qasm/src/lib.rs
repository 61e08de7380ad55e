//! `OpenQASM` 2.0 support for Alsvin.
//!
//! Provides the textual wire format used by QASM-speaking providers:
//! [`emit`] serializes a circuit to QASM 2.0 source, [`parse`] reads it
//! back. The round trip preserves gate names, qubit order, and parameters.
//!
//! # Example
//!
//! ```
//! use alsvin_ir::Circuit;
//!
//! let circuit = Circuit::bell().unwrap();
//! let qasm = alsvin_qasm::emit(&circuit);
//! let parsed = alsvin_qasm::parse(&qasm).unwrap();
//!
//! assert_eq!(parsed.gate_count(), circuit.gate_count());
//! ```

pub mod emitter;
pub mod error;
pub mod lexer;
pub mod parser;

pub use emitter::emit;
pub use error::{QasmError, QasmResult};
pub use parser::parse;
