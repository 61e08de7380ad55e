//! Recursive-descent parser for `OpenQASM` 2.0.
//!
//! Parses the subset the provider adapters speak: register declarations,
//! `qelib1.inc` standard gates with numeric parameter expressions, and
//! measurements. `barrier` and `reset` statements are accepted and dropped
//! (the circuit model has no counterpart for them).

use std::f64::consts::PI;

use alsvin_ir::{Circuit, Gate};
use rustc_hash::FxHashMap;

use crate::error::{QasmError, QasmResult};
use crate::lexer::{Token, tokenize};

/// Parse QASM 2.0 source into a circuit.
pub fn parse(source: &str) -> QasmResult<Circuit> {
    let tokens = tokenize(source).map_err(|position| QasmError::Lex { position })?;
    Parser::new(tokens).parse_program()
}

/// A declared register: flat offset into the circuit index space plus size.
#[derive(Debug, Clone, Copy)]
struct Register {
    offset: usize,
    size: usize,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    qregs: FxHashMap<String, Register>,
    cregs: FxHashMap<String, Register>,
    num_qubits: usize,
    num_clbits: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            qregs: FxHashMap::default(),
            cregs: FxHashMap::default(),
            num_qubits: 0,
            num_clbits: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> QasmResult<Token> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(QasmError::UnexpectedEof)?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, expected: &Token, what: &str) -> QasmResult<()> {
        let token = self.next()?;
        if &token == expected {
            Ok(())
        } else {
            Err(QasmError::UnexpectedToken {
                expected: what.to_string(),
                found: format!("{token:?}"),
            })
        }
    }

    fn parse_program(mut self) -> QasmResult<Circuit> {
        self.parse_header()?;

        // First pass: collect statements while declaring registers, so the
        // circuit can be created with its final qubit count up front.
        let mut statements: Vec<Statement> = vec![];
        while self.peek().is_some() {
            if let Some(statement) = self.parse_statement()? {
                statements.push(statement);
            }
        }

        let mut circuit = Circuit::new("qasm", self.num_qubits);
        for statement in statements {
            match statement {
                Statement::Gate { gate, qubits } => {
                    circuit.push(gate, qubits)?;
                }
                Statement::Measure { qubit, clbit } => {
                    circuit.measure(qubit, clbit)?;
                }
            }
        }
        Ok(circuit)
    }

    fn parse_header(&mut self) -> QasmResult<()> {
        self.expect(&Token::OpenQasm, "OPENQASM")?;
        match self.next()? {
            Token::FloatLiteral(v) if (v - 2.0).abs() < f64::EPSILON => {}
            other => {
                return Err(QasmError::UnsupportedVersion(format!("{other:?}")));
            }
        }
        self.expect(&Token::Semicolon, ";")?;

        // Optional includes.
        while self.peek() == Some(&Token::Include) {
            self.next()?;
            match self.next()? {
                Token::StringLiteral(_) => {}
                other => {
                    return Err(QasmError::UnexpectedToken {
                        expected: "include path".to_string(),
                        found: format!("{other:?}"),
                    });
                }
            }
            self.expect(&Token::Semicolon, ";")?;
        }
        Ok(())
    }

    fn parse_statement(&mut self) -> QasmResult<Option<Statement>> {
        match self.next()? {
            Token::Qreg => {
                let (name, size) = self.parse_reg_decl()?;
                self.qregs.insert(
                    name,
                    Register {
                        offset: self.num_qubits,
                        size,
                    },
                );
                self.num_qubits += size;
                Ok(None)
            }
            Token::Creg => {
                let (name, size) = self.parse_reg_decl()?;
                self.cregs.insert(
                    name,
                    Register {
                        offset: self.num_clbits,
                        size,
                    },
                );
                self.num_clbits += size;
                Ok(None)
            }
            Token::Barrier | Token::Reset => {
                // Accepted for compatibility, not represented in the model.
                self.skip_to_semicolon()?;
                Ok(None)
            }
            Token::Measure => {
                let (qreg, qindex) = self.parse_operand()?;
                self.expect(&Token::Arrow, "->")?;
                let (creg, cindex) = self.parse_operand()?;
                self.expect(&Token::Semicolon, ";")?;

                let q = self.resolve(&self.qregs, &qreg, qindex)?;
                let c = self.resolve(&self.cregs, &creg, cindex)?;
                Ok(Some(Statement::Measure { qubit: q, clbit: c }))
            }
            Token::Identifier(name) => {
                let statement = self.parse_gate_statement(&name)?;
                Ok(Some(statement))
            }
            other => Err(QasmError::UnexpectedToken {
                expected: "statement".to_string(),
                found: format!("{other:?}"),
            }),
        }
    }

    fn parse_reg_decl(&mut self) -> QasmResult<(String, usize)> {
        let name = match self.next()? {
            Token::Identifier(name) => name,
            other => {
                return Err(QasmError::UnexpectedToken {
                    expected: "register name".to_string(),
                    found: format!("{other:?}"),
                });
            }
        };
        self.expect(&Token::LBracket, "[")?;
        let size = match self.next()? {
            Token::IntLiteral(n) => n as usize,
            other => {
                return Err(QasmError::UnexpectedToken {
                    expected: "register size".to_string(),
                    found: format!("{other:?}"),
                });
            }
        };
        self.expect(&Token::RBracket, "]")?;
        self.expect(&Token::Semicolon, ";")?;
        Ok((name, size))
    }

    fn parse_gate_statement(&mut self, name: &str) -> QasmResult<Statement> {
        // Optional parameter list.
        let mut params = vec![];
        if self.peek() == Some(&Token::LParen) {
            self.next()?;
            if self.peek() != Some(&Token::RParen) {
                loop {
                    params.push(self.parse_expr()?);
                    if self.peek() == Some(&Token::Comma) {
                        self.next()?;
                    } else {
                        break;
                    }
                }
            }
            self.expect(&Token::RParen, ")")?;
        }

        // Operand list.
        let mut qubits = vec![];
        loop {
            let (reg, index) = self.parse_operand()?;
            qubits.push(self.resolve(&self.qregs, &reg, index)?);
            if self.peek() == Some(&Token::Comma) {
                self.next()?;
            } else {
                break;
            }
        }
        self.expect(&Token::Semicolon, ";")?;

        let gate = lookup_gate(name, &params)
            .ok_or_else(|| QasmError::UnknownGate(name.to_string()))?;
        Ok(Statement::Gate { gate, qubits })
    }

    /// Parse `name[index]`. Whole-register operands are not supported.
    fn parse_operand(&mut self) -> QasmResult<(String, usize)> {
        let name = match self.next()? {
            Token::Identifier(name) => name,
            other => {
                return Err(QasmError::UnexpectedToken {
                    expected: "operand".to_string(),
                    found: format!("{other:?}"),
                });
            }
        };
        self.expect(&Token::LBracket, "[")?;
        let index = match self.next()? {
            Token::IntLiteral(n) => n as usize,
            other => {
                return Err(QasmError::UnexpectedToken {
                    expected: "index".to_string(),
                    found: format!("{other:?}"),
                });
            }
        };
        self.expect(&Token::RBracket, "]")?;
        Ok((name, index))
    }

    fn resolve(
        &self,
        registers: &FxHashMap<String, Register>,
        name: &str,
        index: usize,
    ) -> QasmResult<usize> {
        let register = registers
            .get(name)
            .ok_or_else(|| QasmError::UnknownRegister(name.to_string()))?;
        if index >= register.size {
            return Err(QasmError::IndexOutOfRange {
                register: name.to_string(),
                index,
                size: register.size,
            });
        }
        Ok(register.offset + index)
    }

    fn skip_to_semicolon(&mut self) -> QasmResult<()> {
        loop {
            if self.next()? == Token::Semicolon {
                return Ok(());
            }
        }
    }

    // Expression grammar: term (('+'|'-') term)*, term: factor (('*'|'/') factor)*,
    // factor: ('-')* atom, atom: number | pi | '(' expr ')'.
    fn parse_expr(&mut self) -> QasmResult<f64> {
        let mut value = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.next()?;
                    value += self.parse_term()?;
                }
                Some(Token::Minus) => {
                    self.next()?;
                    value -= self.parse_term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn parse_term(&mut self) -> QasmResult<f64> {
        let mut value = self.parse_factor()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.next()?;
                    value *= self.parse_factor()?;
                }
                Some(Token::Slash) => {
                    self.next()?;
                    value /= self.parse_factor()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn parse_factor(&mut self) -> QasmResult<f64> {
        match self.next()? {
            Token::Minus => Ok(-self.parse_factor()?),
            Token::IntLiteral(n) => Ok(n as f64),
            Token::FloatLiteral(v) => Ok(v),
            Token::Pi => Ok(PI),
            Token::LParen => {
                let value = self.parse_expr()?;
                self.expect(&Token::RParen, ")")?;
                Ok(value)
            }
            other => Err(QasmError::UnexpectedToken {
                expected: "expression".to_string(),
                found: format!("{other:?}"),
            }),
        }
    }
}

enum Statement {
    Gate { gate: Gate, qubits: Vec<usize> },
    Measure { qubit: usize, clbit: usize },
}

/// Map a QASM gate name plus evaluated parameters to a gate, including the
/// `u1`/`u2`/`u3`/`cnot` aliases from qelib1.
fn lookup_gate(name: &str, params: &[f64]) -> Option<Gate> {
    match (name, params) {
        ("u1", [lambda]) => Some(Gate::P(*lambda)),
        ("u2", [phi, lambda]) => Some(Gate::U(PI / 2.0, *phi, *lambda)),
        ("u3", [theta, phi, lambda]) => Some(Gate::U(*theta, *phi, *lambda)),
        _ => Gate::from_name(name, params),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BELL: &str = r#"
OPENQASM 2.0;
include "qelib1.inc";
qreg q[2];
creg c[2];
h q[0];
cx q[0],q[1];
measure q[0] -> c[0];
measure q[1] -> c[1];
"#;

    #[test]
    fn test_parse_bell() {
        let circuit = parse(BELL).unwrap();
        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.gate_count(), 2);
        assert_eq!(circuit.gates()[0].gate, Gate::H);
        assert_eq!(circuit.gates()[1].gate, Gate::CX);
        assert_eq!(circuit.gates()[1].qubits, vec![0, 1]);
        assert_eq!(circuit.measurements().len(), 2);
    }

    #[test]
    fn test_parse_parameter_expressions() {
        let source = "OPENQASM 2.0;\nqreg q[1];\nrx(pi/2) q[0];\nrz(-pi/4) q[0];\nu3(0.1, 2*pi, -0.5) q[0];\n";
        let circuit = parse(source).unwrap();
        assert_eq!(circuit.gate_count(), 3);
        assert_eq!(circuit.gates()[0].gate, Gate::Rx(PI / 2.0));
        assert_eq!(circuit.gates()[1].gate, Gate::Rz(-PI / 4.0));
        assert_eq!(circuit.gates()[2].gate, Gate::U(0.1, 2.0 * PI, -0.5));
    }

    #[test]
    fn test_parse_multiple_qregs() {
        let source = "OPENQASM 2.0;\nqreg a[2];\nqreg b[2];\ncx a[1],b[0];\n";
        let circuit = parse(source).unwrap();
        assert_eq!(circuit.num_qubits(), 4);
        assert_eq!(circuit.gates()[0].qubits, vec![1, 2]);
    }

    #[test]
    fn test_parse_barrier_ignored() {
        let source = "OPENQASM 2.0;\nqreg q[2];\nh q[0];\nbarrier q[0], q[1];\nx q[1];\n";
        let circuit = parse(source).unwrap();
        assert_eq!(circuit.gate_count(), 2);
    }

    #[test]
    fn test_parse_qelib_aliases() {
        let source = "OPENQASM 2.0;\nqreg q[2];\nu1(0.5) q[0];\ncnot q[0],q[1];\n";
        let circuit = parse(source).unwrap();
        assert_eq!(circuit.gates()[0].gate, Gate::P(0.5));
        assert_eq!(circuit.gates()[1].gate, Gate::CX);
    }

    #[test]
    fn test_wrong_version_rejected() {
        assert!(matches!(
            parse("OPENQASM 3.0;\nqreg q[1];\n"),
            Err(QasmError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_unknown_gate() {
        assert!(matches!(
            parse("OPENQASM 2.0;\nqreg q[1];\nfrobnicate q[0];\n"),
            Err(QasmError::UnknownGate(_))
        ));
    }

    #[test]
    fn test_unknown_register() {
        assert!(matches!(
            parse("OPENQASM 2.0;\nqreg q[1];\nh r[0];\n"),
            Err(QasmError::UnknownRegister(_))
        ));
    }

    #[test]
    fn test_index_out_of_range() {
        assert!(matches!(
            parse("OPENQASM 2.0;\nqreg q[1];\nh q[3];\n"),
            Err(QasmError::IndexOutOfRange { .. })
        ));
    }
}
