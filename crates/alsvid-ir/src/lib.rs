//! Alsvid Circuit Intermediate Representation
//!
//! This crate provides the circuit types consumed by the Alsvid qubit
//! mapper: qubit identifiers, standard gates, instructions, and an ordered
//! [`Circuit`] with a builder API.
//!
//! Circuits are validated on construction: every operand must lie inside
//! the declared qubit/clbit range, and gate arity must match. A circuit
//! that parses is therefore safe to feed into the mapping engine.
//!
//! # Example
//!
//! ```rust
//! use alsvid_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("ghz", 3, 0);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.cx(QubitId(1), QubitId(2)).unwrap();
//!
//! assert_eq!(circuit.depth(), 3);
//! assert_eq!(circuit.num_two_qubit_gates(), 2);
//! ```

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::StandardGate;
pub use instruction::{Instruction, InstructionKind};
pub use qubit::{ClbitId, QubitId};
