//! Error-correcting-code encoding: rewrite a circuit onto redundant
//! physical-candidate qubits before mapping.
//!
//! The encoded circuit starts with the code's encoding network, applies
//! each logical gate to the code's representative qubits, and ends with
//! the decoding network (majority vote via Toffoli). Only single-qubit
//! Clifford+T gates can be carried through transversally; anything else
//! is rejected with [`MapError::UnencodableGate`].

use alsvid_ir::{Circuit, Instruction, InstructionKind, QubitId, StandardGate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MapError, MapResult};

/// Supported error-correcting codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EccScheme {
    /// Shor's 3-qubit bit-flip code.
    Q3Shor,
    /// Shor's 9-qubit code.
    Q9Shor,
}

impl EccScheme {
    /// Scheme name for logs and circuit naming.
    pub fn name(&self) -> &'static str {
        match self {
            EccScheme::Q3Shor => "q3shor",
            EccScheme::Q9Shor => "q9shor",
        }
    }

    /// Physical qubits per logical qubit.
    pub fn replication(&self) -> u32 {
        match self {
            EccScheme::Q3Shor => 3,
            EccScheme::Q9Shor => 9,
        }
    }

    /// The qubits a transversal single-qubit gate acts on. For Q3 these
    /// are the three replicas; for Q9 the three block leaders, matching
    /// the positions the encoding network hits with Hadamards.
    fn carriers(&self, q: QubitId, n: u32) -> [QubitId; 3] {
        match self {
            EccScheme::Q3Shor => [q, QubitId(q.0 + n), QubitId(q.0 + 2 * n)],
            EccScheme::Q9Shor => [q, QubitId(q.0 + 3 * n), QubitId(q.0 + 6 * n)],
        }
    }
}

/// Encode a circuit with the given code.
///
/// The result acts on `replication × num_qubits` qubits and can be fed
/// straight into [`map_circuit`](crate::map_circuit). Identity gates are
/// dropped; measurements, barriers, and gates outside the transversal
/// set fail with [`MapError::UnencodableGate`].
pub fn encode_circuit(circuit: &Circuit, scheme: EccScheme) -> MapResult<Circuit> {
    let n = circuit.num_qubits();
    let mut out = Circuit::with_size(
        format!("{}_{}", circuit.name(), scheme.name()),
        n * scheme.replication(),
        circuit.num_clbits(),
    );

    match scheme {
        EccScheme::Q3Shor => q3_encode(&mut out, n)?,
        EccScheme::Q9Shor => q9_encode(&mut out, n)?,
    }

    for inst in circuit.instructions() {
        let gate = match &inst.kind {
            InstructionKind::Gate(gate) => gate,
            InstructionKind::Measure | InstructionKind::Barrier => {
                return Err(MapError::UnencodableGate {
                    gate: inst.name(),
                    scheme: scheme.name(),
                });
            }
        };
        match gate {
            StandardGate::I => {}
            StandardGate::X
            | StandardGate::Y
            | StandardGate::Z
            | StandardGate::H
            | StandardGate::S
            | StandardGate::Sdg
            | StandardGate::T
            | StandardGate::Tdg => {
                for carrier in scheme.carriers(inst.qubits[0], n) {
                    out.apply(Instruction::single_qubit_gate(gate.clone(), carrier))?;
                }
            }
            _ => {
                return Err(MapError::UnencodableGate {
                    gate: gate.name(),
                    scheme: scheme.name(),
                });
            }
        }
    }

    match scheme {
        EccScheme::Q3Shor => q3_decode(&mut out, n)?,
        EccScheme::Q9Shor => q9_decode(&mut out, n)?,
    }

    debug!(
        scheme = scheme.name(),
        logical = n,
        encoded = out.num_qubits(),
        ops = out.num_ops(),
        "circuit encoded"
    );
    Ok(out)
}

fn q3_encode(out: &mut Circuit, n: u32) -> MapResult<()> {
    for i in 0..n {
        out.cx(QubitId(i), QubitId(i + n))?;
        out.cx(QubitId(i), QubitId(i + 2 * n))?;
    }
    Ok(())
}

fn q3_decode(out: &mut Circuit, n: u32) -> MapResult<()> {
    for i in 0..n {
        out.cx(QubitId(i), QubitId(i + n))?;
        out.cx(QubitId(i), QubitId(i + 2 * n))?;
        toffoli(out, QubitId(i + n), QubitId(i + 2 * n), QubitId(i))?;
    }
    Ok(())
}

fn q9_encode(out: &mut Circuit, n: u32) -> MapResult<()> {
    for i in 0..n {
        out.cx(QubitId(i), QubitId(i + 3 * n))?;
        out.cx(QubitId(i), QubitId(i + 6 * n))?;
        out.h(QubitId(i))?;
        out.h(QubitId(i + 3 * n))?;
        out.h(QubitId(i + 6 * n))?;
        for block in 0..3 {
            let leader = i + 3 * block * n;
            out.cx(QubitId(leader), QubitId(leader + n))?;
            out.cx(QubitId(leader), QubitId(leader + 2 * n))?;
        }
    }
    Ok(())
}

fn q9_decode(out: &mut Circuit, n: u32) -> MapResult<()> {
    for i in 0..n {
        // Majority vote within each block, then across the blocks.
        for block in 0..3 {
            let leader = i + 3 * block * n;
            out.cx(QubitId(leader), QubitId(leader + n))?;
            out.cx(QubitId(leader), QubitId(leader + 2 * n))?;
            toffoli(
                out,
                QubitId(leader + n),
                QubitId(leader + 2 * n),
                QubitId(leader),
            )?;
        }
        out.h(QubitId(i))?;
        out.h(QubitId(i + 3 * n))?;
        out.h(QubitId(i + 6 * n))?;
        out.cx(QubitId(i), QubitId(i + 3 * n))?;
        out.cx(QubitId(i), QubitId(i + 6 * n))?;
        toffoli(out, QubitId(i + 3 * n), QubitId(i + 6 * n), QubitId(i))?;
    }
    Ok(())
}

/// Toffoli over the available gate set (H, T, T†, S, CNOT).
fn toffoli(out: &mut Circuit, c1: QubitId, c2: QubitId, target: QubitId) -> MapResult<()> {
    out.h(target)?;
    out.cx(c2, target)?;
    out.tdg(target)?;
    out.cx(c1, target)?;
    out.t(target)?;
    out.cx(c2, target)?;
    out.tdg(target)?;
    out.cx(c1, target)?;
    out.t(target)?;
    out.h(target)?;
    out.tdg(c2)?;
    out.cx(c1, c2)?;
    out.tdg(c2)?;
    out.cx(c1, c2)?;
    out.s(c2)?;
    out.t(c1)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::architecture::Architecture;
    use crate::config::MapperConfig;
    use crate::mapper::map_circuit;

    #[test]
    fn test_q3_structure() {
        let mut c = Circuit::with_size("one", 1, 0);
        c.x(QubitId(0)).unwrap();

        let encoded = encode_circuit(&c, EccScheme::Q3Shor).unwrap();
        assert_eq!(encoded.name(), "one_q3shor");
        assert_eq!(encoded.num_qubits(), 3);
        // 2 encoding CNOTs, the X on all three replicas, 2 decoding CNOTs
        // plus the 16-op Toffoli.
        assert_eq!(encoded.num_ops(), 2 + 3 + 2 + 16);
        encoded.validate().unwrap();

        // The transversal X hits every replica.
        let x_targets: Vec<_> = encoded
            .instructions()
            .iter()
            .filter(|inst| inst.name() == "x")
            .map(|inst| inst.qubits[0])
            .collect();
        assert_eq!(x_targets, vec![QubitId(0), QubitId(1), QubitId(2)]);
    }

    #[test]
    fn test_q9_structure() {
        let mut c = Circuit::with_size("one", 1, 0);
        c.z(QubitId(0)).unwrap();

        let encoded = encode_circuit(&c, EccScheme::Q9Shor).unwrap();
        assert_eq!(encoded.num_qubits(), 9);
        // Encoding: 2 + 3 H + 6 = 11. Gate: 3. Decoding: 3 blocks of
        // (2 + 16), 3 H, 2 CNOTs, one closing Toffoli.
        assert_eq!(encoded.num_ops(), 11 + 3 + 3 * 18 + 3 + 2 + 16);
        encoded.validate().unwrap();

        // The transversal Z hits the three block leaders.
        let z_targets: Vec<_> = encoded
            .instructions()
            .iter()
            .filter(|inst| inst.name() == "z")
            .map(|inst| inst.qubits[0])
            .collect();
        assert_eq!(z_targets, vec![QubitId(0), QubitId(3), QubitId(6)]);
    }

    #[test]
    fn test_identity_is_dropped() {
        let mut c = Circuit::with_size("idle", 1, 0);
        c.i(QubitId(0)).unwrap();
        let encoded = encode_circuit(&c, EccScheme::Q3Shor).unwrap();
        assert!(encoded.instructions().iter().all(|inst| inst.name() != "id"));
    }

    #[test]
    fn test_rotation_is_rejected() {
        let mut c = Circuit::with_size("rot", 1, 0);
        c.rx(0.5, QubitId(0)).unwrap();
        let err = encode_circuit(&c, EccScheme::Q3Shor).unwrap_err();
        assert!(matches!(
            err,
            MapError::UnencodableGate { gate: "rx", scheme: "q3shor" }
        ));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_measurement_is_rejected() {
        let mut c = Circuit::with_size("meas", 1, 1);
        c.h(QubitId(0)).unwrap();
        c.measure(QubitId(0), alsvid_ir::ClbitId(0)).unwrap();
        let err = encode_circuit(&c, EccScheme::Q3Shor).unwrap_err();
        assert!(matches!(
            err,
            MapError::UnencodableGate { gate: "measure", .. }
        ));
    }

    #[test]
    fn test_two_qubit_gate_is_rejected() {
        let mut c = Circuit::with_size("ent", 2, 0);
        c.cx(QubitId(0), QubitId(1)).unwrap();
        let err = encode_circuit(&c, EccScheme::Q3Shor).unwrap_err();
        assert!(matches!(err, MapError::UnencodableGate { gate: "cx", .. }));
    }

    #[test]
    fn test_encoded_circuit_maps() {
        let mut c = Circuit::with_size("work", 2, 0);
        c.h(QubitId(0)).unwrap();
        c.x(QubitId(1)).unwrap();
        c.t(QubitId(0)).unwrap();

        let encoded = encode_circuit(&c, EccScheme::Q3Shor).unwrap();
        let arch = Architecture::grid(2, 3);
        let result = map_circuit(&encoded, &arch, &MapperConfig::default()).unwrap();
        assert!(result.is_success(), "error: {:?}", result.error);
    }
}
