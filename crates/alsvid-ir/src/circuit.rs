//! High-level circuit builder API.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{ClbitId, QubitId};

/// A quantum circuit as an ordered instruction sequence.
///
/// This provides a high-level API for building circuits, with convenient
/// methods for common gates. The mapper consumes the instruction sequence
/// in order; there is no DAG reordering at this level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Number of logical qubits.
    num_qubits: u32,
    /// Number of classical bits.
    num_clbits: u32,
    /// Ordered instruction sequence.
    instructions: Vec<Instruction>,
}

impl Circuit {
    /// Create a circuit with a given number of qubits and classical bits.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            num_clbits,
            instructions: vec![],
        }
    }

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of logical qubits.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Number of classical bits.
    pub fn num_clbits(&self) -> u32 {
        self.num_clbits
    }

    /// The ordered instruction sequence.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of instructions.
    pub fn num_ops(&self) -> usize {
        self.instructions.len()
    }

    /// Number of two-qubit gates.
    pub fn num_two_qubit_gates(&self) -> usize {
        self.instructions
            .iter()
            .filter(|i| i.is_two_qubit_gate())
            .count()
    }

    /// Append a validated instruction.
    ///
    /// Checks operand ranges, gate arity, and duplicate operands. All
    /// builder methods funnel through here, so an assembled circuit is
    /// valid by construction.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        for &q in &instruction.qubits {
            if q.0 >= self.num_qubits {
                return Err(IrError::QubitOutOfRange {
                    qubit: q,
                    declared: self.num_qubits,
                });
            }
        }
        for &c in &instruction.clbits {
            if c.0 >= self.num_clbits {
                return Err(IrError::ClbitOutOfRange {
                    clbit: c,
                    declared: self.num_clbits,
                });
            }
        }
        if let InstructionKind::Gate(gate) = &instruction.kind {
            let expected = gate.num_qubits();
            let got = u32::try_from(instruction.qubits.len()).unwrap_or(u32::MAX);
            if expected != got {
                return Err(IrError::QubitCountMismatch {
                    gate_name: gate.name(),
                    expected,
                    got,
                });
            }
            if expected == 2 && instruction.qubits[0] == instruction.qubits[1] {
                return Err(IrError::DuplicateOperand {
                    gate_name: gate.name(),
                    qubit: instruction.qubits[0],
                });
            }
        }
        self.instructions.push(instruction);
        Ok(self)
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply identity gate.
    pub fn i(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::I, qubit))
    }

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::H, qubit))
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::X, qubit))
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Y, qubit))
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Z, qubit))
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::S, qubit))
    }

    /// Apply S-dagger gate.
    pub fn sdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Sdg, qubit))
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::T, qubit))
    }

    /// Apply T-dagger gate.
    pub fn tdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Tdg, qubit))
    }

    /// Apply sqrt(X) gate.
    pub fn sx(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::SX, qubit))
    }

    /// Apply rotation around X axis.
    pub fn rx(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(
            StandardGate::Rx(theta),
            qubit,
        ))
    }

    /// Apply rotation around Y axis.
    pub fn ry(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(
            StandardGate::Ry(theta),
            qubit,
        ))
    }

    /// Apply rotation around Z axis.
    pub fn rz(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(
            StandardGate::Rz(theta),
            qubit,
        ))
    }

    /// Apply phase gate.
    pub fn p(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::P(theta), qubit))
    }

    /// Apply universal single-qubit gate U(θ, φ, λ).
    pub fn u(&mut self, theta: f64, phi: f64, lambda: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(
            StandardGate::U(theta, phi, lambda),
            qubit,
        ))
    }

    // =========================================================================
    // Two-qubit gates
    // =========================================================================

    /// Apply CNOT gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::CX, control, target))
    }

    /// Apply controlled-Y gate.
    pub fn cy(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::CY, control, target))
    }

    /// Apply controlled-Z gate.
    pub fn cz(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::CZ, q1, q2))
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::Swap, q1, q2))
    }

    /// Apply iSWAP gate.
    pub fn iswap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::ISwap, q1, q2))
    }

    /// Apply controlled phase gate.
    pub fn cp(&mut self, theta: f64, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(
            StandardGate::CP(theta),
            control,
            target,
        ))
    }

    /// Apply ZZ rotation gate.
    pub fn rzz(&mut self, theta: f64, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::RZZ(theta), q1, q2))
    }

    // =========================================================================
    // Non-gate operations
    // =========================================================================

    /// Measure a qubit into a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.apply(Instruction::measure(qubit, clbit))
    }

    /// Insert a barrier across the given qubits.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<&mut Self> {
        self.apply(Instruction::barrier(qubits))
    }

    /// Re-validate every instruction against the declared ranges.
    ///
    /// Circuits built through [`apply`](Self::apply) are valid by
    /// construction; this covers circuits that arrived through
    /// deserialization.
    pub fn validate(&self) -> IrResult<()> {
        let mut scratch = Self::with_size(self.name.as_str(), self.num_qubits, self.num_clbits);
        for inst in &self.instructions {
            scratch.apply(inst.clone())?;
        }
        Ok(())
    }

    /// Circuit depth: length of the longest qubit-line critical path.
    ///
    /// Barriers synchronize all qubits they span.
    pub fn depth(&self) -> usize {
        let mut line_depth = vec![0usize; self.num_qubits as usize];
        for inst in &self.instructions {
            let level = inst
                .qubits
                .iter()
                .map(|q| line_depth[q.0 as usize])
                .max()
                .unwrap_or(0)
                + 1;
            for q in &inst.qubits {
                line_depth[q.0 as usize] = level;
            }
        }
        line_depth.into_iter().max().unwrap_or(0)
    }

    /// Build a Bell-pair circuit, useful in tests.
    pub fn bell() -> IrResult<Self> {
        let mut c = Self::with_size("bell", 2, 2);
        c.h(QubitId(0))?;
        c.cx(QubitId(0), QubitId(1))?;
        c.measure(QubitId(0), ClbitId(0))?;
        c.measure(QubitId(1), ClbitId(1))?;
        Ok(c)
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "// circuit: {} ({} qubits)", self.name, self.num_qubits)?;
        for inst in &self.instructions {
            writeln!(f, "{inst}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let mut c = Circuit::with_size("test", 3, 0);
        c.h(QubitId(0)).unwrap();
        c.cx(QubitId(0), QubitId(1)).unwrap();
        c.cz(QubitId(1), QubitId(2)).unwrap();

        assert_eq!(c.num_ops(), 3);
        assert_eq!(c.num_two_qubit_gates(), 2);
    }

    #[test]
    fn test_every_gate_has_a_builder() {
        let mut c = Circuit::with_size("all", 3, 0);
        c.i(QubitId(0)).unwrap();
        c.x(QubitId(0)).unwrap();
        c.y(QubitId(0)).unwrap();
        c.z(QubitId(0)).unwrap();
        c.h(QubitId(0)).unwrap();
        c.s(QubitId(0)).unwrap();
        c.sdg(QubitId(0)).unwrap();
        c.t(QubitId(0)).unwrap();
        c.tdg(QubitId(0)).unwrap();
        c.sx(QubitId(0)).unwrap();
        c.rx(0.1, QubitId(0)).unwrap();
        c.ry(0.2, QubitId(0)).unwrap();
        c.rz(0.3, QubitId(0)).unwrap();
        c.p(0.4, QubitId(0)).unwrap();
        c.u(0.1, 0.2, 0.3, QubitId(0)).unwrap();
        c.cx(QubitId(0), QubitId(1)).unwrap();
        c.cy(QubitId(0), QubitId(1)).unwrap();
        c.cz(QubitId(0), QubitId(1)).unwrap();
        c.swap(QubitId(0), QubitId(1)).unwrap();
        c.iswap(QubitId(0), QubitId(1)).unwrap();
        c.cp(0.5, QubitId(0), QubitId(1)).unwrap();
        c.rzz(0.6, QubitId(1), QubitId(2)).unwrap();

        assert_eq!(c.num_ops(), 22);
        assert_eq!(c.num_two_qubit_gates(), 7);
        c.validate().unwrap();
    }

    #[test]
    fn test_qubit_out_of_range() {
        let mut c = Circuit::with_size("test", 2, 0);
        let err = c.cx(QubitId(0), QubitId(5)).unwrap_err();
        assert!(matches!(err, IrError::QubitOutOfRange { .. }));
    }

    #[test]
    fn test_duplicate_operand() {
        let mut c = Circuit::with_size("test", 2, 0);
        let err = c.cx(QubitId(1), QubitId(1)).unwrap_err();
        assert!(matches!(err, IrError::DuplicateOperand { .. }));
    }

    #[test]
    fn test_depth() {
        let mut c = Circuit::with_size("test", 3, 0);
        c.h(QubitId(0)).unwrap();
        c.h(QubitId(1)).unwrap();
        c.cx(QubitId(0), QubitId(1)).unwrap();
        c.h(QubitId(2)).unwrap();

        // h(0) and h(1) are parallel; cx stacks on both; h(2) is parallel.
        assert_eq!(c.depth(), 2);
    }

    #[test]
    fn test_bell_display() {
        let c = Circuit::bell().unwrap();
        let text = format!("{c}");
        assert!(text.contains("h q0"));
        assert!(text.contains("cx q0, q1"));
    }
}
