//! Quantum gate types and their algebra.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::matrix::{TOLERANCE, Unitary};

/// The rotation axis of a single-qubit rotation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationAxis {
    X,
    Y,
    Z,
}

/// Standard gates with known semantics.
///
/// Every variant knows its name, arity, parameters, unitary matrix, and
/// inverse. Parameters are concrete angles; symbolic circuits are out of
/// scope for this system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    // Single-qubit Pauli gates
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,

    // Single-qubit Clifford gates
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// sqrt(X)-dagger gate.
    SXdg,

    // Single-qubit rotation gates
    /// Rotation around X axis.
    Rx(f64),
    /// Rotation around Y axis.
    Ry(f64),
    /// Rotation around Z axis.
    Rz(f64),
    /// Phase gate.
    P(f64),
    /// Universal single-qubit gate U(θ, φ, λ).
    U(f64, f64, f64),

    // Two-qubit gates
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Y gate.
    CY,
    /// Controlled-Z gate.
    CZ,
    /// Controlled-Hadamard gate.
    CH,
    /// SWAP gate.
    Swap,
    /// Controlled rotation around X.
    CRx(f64),
    /// Controlled rotation around Y.
    CRy(f64),
    /// Controlled rotation around Z.
    CRz(f64),
    /// Controlled phase gate.
    CP(f64),
    /// XX rotation gate.
    Rxx(f64),
    /// YY rotation gate.
    Ryy(f64),
    /// ZZ rotation gate.
    Rzz(f64),

    // Three-qubit gates
    /// Toffoli gate (CCX).
    CCX,
    /// Fredkin gate (CSWAP).
    CSwap,
}

impl Gate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Gate::I => "id",
            Gate::X => "x",
            Gate::Y => "y",
            Gate::Z => "z",
            Gate::H => "h",
            Gate::S => "s",
            Gate::Sdg => "sdg",
            Gate::T => "t",
            Gate::Tdg => "tdg",
            Gate::SX => "sx",
            Gate::SXdg => "sxdg",
            Gate::Rx(_) => "rx",
            Gate::Ry(_) => "ry",
            Gate::Rz(_) => "rz",
            Gate::P(_) => "p",
            Gate::U(_, _, _) => "u",
            Gate::CX => "cx",
            Gate::CY => "cy",
            Gate::CZ => "cz",
            Gate::CH => "ch",
            Gate::Swap => "swap",
            Gate::CRx(_) => "crx",
            Gate::CRy(_) => "cry",
            Gate::CRz(_) => "crz",
            Gate::CP(_) => "cp",
            Gate::Rxx(_) => "rxx",
            Gate::Ryy(_) => "ryy",
            Gate::Rzz(_) => "rzz",
            Gate::CCX => "ccx",
            Gate::CSwap => "cswap",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        match self {
            Gate::I
            | Gate::X
            | Gate::Y
            | Gate::Z
            | Gate::H
            | Gate::S
            | Gate::Sdg
            | Gate::T
            | Gate::Tdg
            | Gate::SX
            | Gate::SXdg
            | Gate::Rx(_)
            | Gate::Ry(_)
            | Gate::Rz(_)
            | Gate::P(_)
            | Gate::U(_, _, _) => 1,

            Gate::CX
            | Gate::CY
            | Gate::CZ
            | Gate::CH
            | Gate::Swap
            | Gate::CRx(_)
            | Gate::CRy(_)
            | Gate::CRz(_)
            | Gate::CP(_)
            | Gate::Rxx(_)
            | Gate::Ryy(_)
            | Gate::Rzz(_) => 2,

            Gate::CCX | Gate::CSwap => 3,
        }
    }

    /// Get the parameters of this gate.
    pub fn params(&self) -> Vec<f64> {
        match self {
            Gate::Rx(t)
            | Gate::Ry(t)
            | Gate::Rz(t)
            | Gate::P(t)
            | Gate::CRx(t)
            | Gate::CRy(t)
            | Gate::CRz(t)
            | Gate::CP(t)
            | Gate::Rxx(t)
            | Gate::Ryy(t)
            | Gate::Rzz(t) => vec![*t],

            Gate::U(theta, phi, lambda) => vec![*theta, *phi, *lambda],

            _ => vec![],
        }
    }

    /// If this is a single-qubit rotation, the axis and angle.
    pub fn rotation(&self) -> Option<(RotationAxis, f64)> {
        match self {
            Gate::Rx(t) => Some((RotationAxis::X, *t)),
            Gate::Ry(t) => Some((RotationAxis::Y, *t)),
            Gate::Rz(t) => Some((RotationAxis::Z, *t)),
            _ => None,
        }
    }

    /// Construct a rotation gate from an axis and angle.
    pub fn from_rotation(axis: RotationAxis, angle: f64) -> Gate {
        match axis {
            RotationAxis::X => Gate::Rx(angle),
            RotationAxis::Y => Gate::Ry(angle),
            RotationAxis::Z => Gate::Rz(angle),
        }
    }

    /// Look up a gate by its lowercase name plus parameters.
    ///
    /// Used by the wire-format parsers. Returns `None` for unknown names or
    /// a parameter count that does not fit the gate.
    pub fn from_name(name: &str, params: &[f64]) -> Option<Gate> {
        let gate = match (name, params) {
            ("id", []) => Gate::I,
            ("x", []) => Gate::X,
            ("y", []) => Gate::Y,
            ("z", []) => Gate::Z,
            ("h", []) => Gate::H,
            ("s", []) => Gate::S,
            ("sdg", []) => Gate::Sdg,
            ("t", []) => Gate::T,
            ("tdg", []) => Gate::Tdg,
            ("sx", []) => Gate::SX,
            ("sxdg", []) => Gate::SXdg,
            ("rx", [t]) => Gate::Rx(*t),
            ("ry", [t]) => Gate::Ry(*t),
            ("rz", [t]) => Gate::Rz(*t),
            ("p", [t]) => Gate::P(*t),
            ("u", [t, p, l]) => Gate::U(*t, *p, *l),
            ("cx", []) | ("cnot", []) => Gate::CX,
            ("cy", []) => Gate::CY,
            ("cz", []) => Gate::CZ,
            ("ch", []) => Gate::CH,
            ("swap", []) => Gate::Swap,
            ("crx", [t]) => Gate::CRx(*t),
            ("cry", [t]) => Gate::CRy(*t),
            ("crz", [t]) => Gate::CRz(*t),
            ("cp", [t]) => Gate::CP(*t),
            ("rxx", [t]) => Gate::Rxx(*t),
            ("ryy", [t]) => Gate::Ryy(*t),
            ("rzz", [t]) => Gate::Rzz(*t),
            ("ccx", []) => Gate::CCX,
            ("cswap", []) => Gate::CSwap,
            _ => return None,
        };
        Some(gate)
    }

    /// The inverse gate: conjugate-transposed matrix, parameters negated.
    pub fn inverse(&self) -> Gate {
        match self {
            // Self-inverse gates
            Gate::I => Gate::I,
            Gate::X => Gate::X,
            Gate::Y => Gate::Y,
            Gate::Z => Gate::Z,
            Gate::H => Gate::H,
            Gate::CX => Gate::CX,
            Gate::CY => Gate::CY,
            Gate::CZ => Gate::CZ,
            Gate::CH => Gate::CH,
            Gate::Swap => Gate::Swap,
            Gate::CCX => Gate::CCX,
            Gate::CSwap => Gate::CSwap,

            // Dagger pairs
            Gate::S => Gate::Sdg,
            Gate::Sdg => Gate::S,
            Gate::T => Gate::Tdg,
            Gate::Tdg => Gate::T,
            Gate::SX => Gate::SXdg,
            Gate::SXdg => Gate::SX,

            // Parameterized gates: negate the angle
            Gate::Rx(t) => Gate::Rx(-t),
            Gate::Ry(t) => Gate::Ry(-t),
            Gate::Rz(t) => Gate::Rz(-t),
            Gate::P(t) => Gate::P(-t),
            Gate::CRx(t) => Gate::CRx(-t),
            Gate::CRy(t) => Gate::CRy(-t),
            Gate::CRz(t) => Gate::CRz(-t),
            Gate::CP(t) => Gate::CP(-t),
            Gate::Rxx(t) => Gate::Rxx(-t),
            Gate::Ryy(t) => Gate::Ryy(-t),
            Gate::Rzz(t) => Gate::Rzz(-t),

            // U(θ, φ, λ)† = U(−θ, −λ, −φ)
            Gate::U(theta, phi, lambda) => Gate::U(-theta, -lambda, -phi),
        }
    }

    /// Whether `self` followed by `other` on the same operand tuple is the
    /// identity: same gate name, same qubit order, parameters summing to
    /// zero componentwise (or a parameter-free self-inverse pair).
    pub fn cancels_with(&self, other: &Gate) -> bool {
        if self.name() != other.name() {
            return false;
        }
        let (a, b) = (self.params(), other.params());
        if a.is_empty() {
            return *self == self.inverse();
        }
        // U inverts with swapped phi/lambda, which componentwise negation
        // does not express; only exact inverses cancel.
        if let Gate::U(..) = self {
            return other == &self.inverse();
        }
        a.len() == b.len()
            && a.iter().zip(&b).all(|(x, y)| (x + y).abs() < TOLERANCE)
    }

    /// The unitary matrix of this gate.
    ///
    /// Multi-qubit matrices are big-endian over the operand tuple: the first
    /// operand is the most significant index bit (control before target).
    pub fn matrix(&self) -> Unitary {
        let zero = Complex64::new(0.0, 0.0);
        let one = Complex64::new(1.0, 0.0);
        let i = Complex64::new(0.0, 1.0);

        match self {
            Gate::I => Unitary::identity(2),
            Gate::X => Unitary::from_rows(2, vec![zero, one, one, zero]),
            Gate::Y => Unitary::from_rows(2, vec![zero, -i, i, zero]),
            Gate::Z => Unitary::from_rows(2, vec![one, zero, zero, -one]),
            Gate::H => {
                let s = Complex64::new(FRAC_1_SQRT_2, 0.0);
                Unitary::from_rows(2, vec![s, s, s, -s])
            }
            Gate::S => Unitary::from_rows(2, vec![one, zero, zero, i]),
            Gate::Sdg => Unitary::from_rows(2, vec![one, zero, zero, -i]),
            Gate::T => Unitary::from_rows(
                2,
                vec![one, zero, zero, Complex64::from_polar(1.0, PI / 4.0)],
            ),
            Gate::Tdg => Unitary::from_rows(
                2,
                vec![one, zero, zero, Complex64::from_polar(1.0, -PI / 4.0)],
            ),
            Gate::SX => {
                let a = Complex64::new(0.5, 0.5);
                let b = Complex64::new(0.5, -0.5);
                Unitary::from_rows(2, vec![a, b, b, a])
            }
            Gate::SXdg => {
                let a = Complex64::new(0.5, -0.5);
                let b = Complex64::new(0.5, 0.5);
                Unitary::from_rows(2, vec![a, b, b, a])
            }
            Gate::Rx(t) => {
                let c = Complex64::new((t / 2.0).cos(), 0.0);
                let s = Complex64::new(0.0, -(t / 2.0).sin());
                Unitary::from_rows(2, vec![c, s, s, c])
            }
            Gate::Ry(t) => {
                let c = Complex64::new((t / 2.0).cos(), 0.0);
                let s = Complex64::new((t / 2.0).sin(), 0.0);
                Unitary::from_rows(2, vec![c, -s, s, c])
            }
            Gate::Rz(t) => Unitary::from_rows(
                2,
                vec![
                    Complex64::from_polar(1.0, -t / 2.0),
                    zero,
                    zero,
                    Complex64::from_polar(1.0, t / 2.0),
                ],
            ),
            Gate::P(t) => Unitary::from_rows(
                2,
                vec![one, zero, zero, Complex64::from_polar(1.0, *t)],
            ),
            Gate::U(theta, phi, lambda) => {
                let c = (theta / 2.0).cos();
                let s = (theta / 2.0).sin();
                Unitary::from_rows(
                    2,
                    vec![
                        Complex64::new(c, 0.0),
                        -Complex64::from_polar(s, *lambda),
                        Complex64::from_polar(s, *phi),
                        Complex64::from_polar(c, phi + lambda),
                    ],
                )
            }

            Gate::CX => controlled(&Gate::X.matrix()),
            Gate::CY => controlled(&Gate::Y.matrix()),
            Gate::CZ => controlled(&Gate::Z.matrix()),
            Gate::CH => controlled(&Gate::H.matrix()),
            Gate::CRx(t) => controlled(&Gate::Rx(*t).matrix()),
            Gate::CRy(t) => controlled(&Gate::Ry(*t).matrix()),
            Gate::CRz(t) => controlled(&Gate::Rz(*t).matrix()),
            Gate::CP(t) => controlled(&Gate::P(*t).matrix()),
            Gate::Swap => {
                let mut m = Unitary::identity(4);
                m.set(1, 1, zero);
                m.set(2, 2, zero);
                m.set(1, 2, one);
                m.set(2, 1, one);
                m
            }
            Gate::Rxx(t) => two_qubit_rotation(&Gate::X.matrix(), *t),
            Gate::Ryy(t) => two_qubit_rotation(&Gate::Y.matrix(), *t),
            Gate::Rzz(t) => two_qubit_rotation(&Gate::Z.matrix(), *t),

            Gate::CCX => {
                // Flip the target (last operand) when both controls are set:
                // swap basis states |110> and |111>.
                let mut m = Unitary::identity(8);
                m.set(6, 6, zero);
                m.set(7, 7, zero);
                m.set(6, 7, one);
                m.set(7, 6, one);
                m
            }
            Gate::CSwap => {
                // Swap the targets when the control is set:
                // swap basis states |101> and |110>.
                let mut m = Unitary::identity(8);
                m.set(5, 5, zero);
                m.set(6, 6, zero);
                m.set(5, 6, one);
                m.set(6, 5, one);
                m
            }
        }
    }
}

/// Block-diagonal controlled version of a single-qubit matrix, control first.
fn controlled(target: &Unitary) -> Unitary {
    let mut m = Unitary::identity(4);
    for r in 0..2 {
        for c in 0..2 {
            m.set(2 + r, 2 + c, target.get(r, c));
        }
    }
    m
}

/// `exp(-i t/2 · P⊗P)` for a Pauli matrix `P` (RXX/RYY/RZZ family).
fn two_qubit_rotation(pauli: &Unitary, theta: f64) -> Unitary {
    let pp = pauli.kron(pauli);
    let cos = Complex64::new((theta / 2.0).cos(), 0.0);
    let isin = Complex64::new(0.0, -(theta / 2.0).sin());
    let mut m = Unitary::identity(4);
    for r in 0..4 {
        for c in 0..4 {
            let id = if r == c {
                Complex64::new(1.0, 0.0)
            } else {
                Complex64::new(0.0, 0.0)
            };
            m.set(r, c, cos * id + isin * pp.get(r, c));
        }
    }
    m
}

/// Check whether two placed gates commute.
///
/// Gates on disjoint qubit sets always commute. Gates on identical qubit
/// sets commute iff their embedded matrices satisfy `AB = BA` within the
/// tolerance. Partially overlapping gates are treated as non-commuting.
pub fn commutes(a: &Gate, qubits_a: &[usize], b: &Gate, qubits_b: &[usize]) -> bool {
    let disjoint = qubits_a.iter().all(|q| !qubits_b.contains(q));
    if disjoint {
        return true;
    }

    let same_set = qubits_a.len() == qubits_b.len()
        && qubits_a.iter().all(|q| qubits_b.contains(q));
    if !same_set {
        return false;
    }

    // Embed both matrices over a canonical ordering of the shared qubits so
    // that differing operand orders (e.g. CX(0,1) vs CX(1,0)) compare in the
    // same basis.
    let mut canonical: Vec<usize> = qubits_a.to_vec();
    canonical.sort_unstable();
    let remap = |qubits: &[usize]| -> Vec<usize> {
        qubits
            .iter()
            .map(|q| canonical.iter().position(|c| c == q).unwrap())
            .collect()
    };

    let n = canonical.len();
    let ma = a.matrix().embed(&remap(qubits_a), n);
    let mb = b.matrix().embed(&remap(qubits_b), n);
    ma.commutes_with(&mb, TOLERANCE)
}
