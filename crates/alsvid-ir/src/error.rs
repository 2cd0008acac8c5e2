//! Error types for the IR crate.

use crate::qubit::{ClbitId, QubitId};
use thiserror::Error;

/// Errors that can occur in IR operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Gate references a qubit outside the declared range.
    #[error("Qubit {qubit} out of range: circuit declares {declared} qubits")]
    QubitOutOfRange {
        /// The out-of-range qubit.
        qubit: QubitId,
        /// Number of declared qubits.
        declared: u32,
    },

    /// Measurement references a classical bit outside the declared range.
    #[error("Classical bit {clbit} out of range: circuit declares {declared} bits")]
    ClbitOutOfRange {
        /// The out-of-range classical bit.
        clbit: ClbitId,
        /// Number of declared classical bits.
        declared: u32,
    },

    /// Gate requires a different number of qubits.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: &'static str,
        /// Expected number of qubits.
        expected: u32,
        /// Actual number of qubits provided.
        got: u32,
    },

    /// Two-qubit gate with identical operands.
    #[error("Gate '{gate_name}' applied to duplicate qubit {qubit}")]
    DuplicateOperand {
        /// Name of the gate.
        gate_name: &'static str,
        /// The repeated operand.
        qubit: QubitId,
    },
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
