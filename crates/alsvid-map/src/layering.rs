//! Circuit layering: partitioning the gate sequence for the mapper.
//!
//! A layer groups gates the mapper considers jointly. Finer layerings
//! (one gate per layer) mean many cheap searches; coarser layerings mean
//! fewer, harder searches over more simultaneous coupling requirements.
//! Layering is a pure function of the gate sequence: no randomness, and
//! re-layering a flattened layering reproduces the same partition.

use alsvid_ir::{Circuit, Instruction, QubitId};
use rustc_hash::FxHashSet;

use crate::config::LayeringStrategy;

/// A group of gates considered jointly by the mapper.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Gates in this layer, in original circuit order.
    pub gates: Vec<Instruction>,
}

impl Layer {
    fn new() -> Self {
        Self { gates: vec![] }
    }

    /// Logical qubit pairs of the two-qubit gates in this layer.
    pub fn two_qubit_pairs(&self) -> impl Iterator<Item = (QubitId, QubitId)> + '_ {
        self.gates
            .iter()
            .filter(|g| g.is_two_qubit_gate())
            .map(|g| (g.qubits[0], g.qubits[1]))
    }

    /// Whether the layer contains any two-qubit gate.
    pub fn has_two_qubit_gate(&self) -> bool {
        self.gates.iter().any(Instruction::is_two_qubit_gate)
    }

    /// All distinct logical qubits touched by this layer.
    pub fn qubits(&self) -> FxHashSet<QubitId> {
        self.gates
            .iter()
            .flat_map(|g| g.qubits.iter().copied())
            .collect()
    }
}

/// Partition a circuit's instruction sequence into layers.
pub fn build_layers(circuit: &Circuit, strategy: LayeringStrategy) -> Vec<Layer> {
    match strategy {
        LayeringStrategy::IndividualGates => individual_gates(circuit),
        LayeringStrategy::DisjointQubits => disjoint_qubits(circuit),
        LayeringStrategy::OddQubits => odd_qubits(circuit),
        LayeringStrategy::QubitTriangle => qubit_triangle(circuit),
    }
}

/// Each instruction forms its own layer.
fn individual_gates(circuit: &Circuit) -> Vec<Layer> {
    circuit
        .instructions()
        .iter()
        .map(|inst| Layer {
            gates: vec![inst.clone()],
        })
        .collect()
}

/// Greedy disjoint-qubit accumulation via per-line next-free-layer
/// tracking: each instruction lands in the earliest layer after all
/// earlier instructions on its qubit lines. No two gates in a layer share
/// a qubit. Barriers synchronize every line they span.
fn disjoint_qubits(circuit: &Circuit) -> Vec<Layer> {
    let mut layers: Vec<Layer> = vec![];
    let mut next_free = vec![0usize; circuit.num_qubits() as usize];

    for inst in circuit.instructions() {
        let at = inst
            .qubits
            .iter()
            .map(|q| next_free[q.0 as usize])
            .max()
            .unwrap_or(0);
        if at == layers.len() {
            layers.push(Layer::new());
        }
        layers[at].gates.push(inst.clone());
        // Barriers need no special casing here: serializing their operand
        // lines is exactly the synchronization they demand.
        for q in &inst.qubits {
            next_free[q.0 as usize] = at + 1;
        }
    }

    layers
}

/// Two two-qubit gates per layer; single-qubit gates and measurements
/// ride along with the layer that is open when they appear.
fn odd_qubits(circuit: &Circuit) -> Vec<Layer> {
    accumulate(circuit, |layer, inst| {
        if !inst.is_two_qubit_gate() {
            return true;
        }
        layer
            .gates
            .iter()
            .filter(|g| g.is_two_qubit_gate())
            .count()
            < 2
    })
}

/// Admit gates while the layer touches at most three distinct qubit lines.
fn qubit_triangle(circuit: &Circuit) -> Vec<Layer> {
    accumulate(circuit, |layer, inst| {
        let mut qubits = layer.qubits();
        qubits.extend(inst.qubits.iter().copied());
        qubits.len() <= 3
    })
}

/// Greedy accumulation skeleton: push each instruction into the current
/// layer while the admission predicate holds, otherwise start a new layer.
fn accumulate(circuit: &Circuit, admit: impl Fn(&Layer, &Instruction) -> bool) -> Vec<Layer> {
    let mut layers: Vec<Layer> = vec![];
    let mut current = Layer::new();

    for inst in circuit.instructions() {
        if !current.gates.is_empty() && !admit(&current, inst) {
            layers.push(std::mem::replace(&mut current, Layer::new()));
        }
        current.gates.push(inst.clone());
    }
    if !current.gates.is_empty() {
        layers.push(current);
    }

    layers
}

/// Flatten layers back into an instruction sequence, in layer order.
pub fn flatten(layers: &[Layer]) -> Vec<Instruction> {
    layers.iter().flat_map(|l| l.gates.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayeringStrategy;
    use alsvid_ir::QubitId;

    fn sample_circuit() -> Circuit {
        let mut c = Circuit::with_size("sample", 4, 0);
        c.h(QubitId(0)).unwrap();
        c.cx(QubitId(0), QubitId(1)).unwrap();
        c.cx(QubitId(2), QubitId(3)).unwrap();
        c.cx(QubitId(1), QubitId(2)).unwrap();
        c.h(QubitId(3)).unwrap();
        c
    }

    #[test]
    fn test_individual_gates() {
        let c = sample_circuit();
        let layers = build_layers(&c, LayeringStrategy::IndividualGates);
        assert_eq!(layers.len(), 5);
        assert!(layers.iter().all(|l| l.gates.len() == 1));
    }

    #[test]
    fn test_disjoint_qubits() {
        let c = sample_circuit();
        let layers = build_layers(&c, LayeringStrategy::DisjointQubits);
        // h(0), cx(0,1) serialize on line 0; cx(2,3) joins layer with h(0);
        // cx(1,2) must wait for both cx(0,1) and cx(2,3); h(3) rises to
        // layer 1 after cx(2,3).
        assert_eq!(layers.len(), 3);
        let pairs: Vec<_> = layers[1].two_qubit_pairs().collect();
        assert_eq!(pairs, vec![(QubitId(0), QubitId(1))]);

        // No two gates in any layer share a qubit.
        for layer in &layers {
            let total: usize = layer.gates.iter().map(|g| g.qubits.len()).sum();
            assert_eq!(total, layer.qubits().len());
        }
    }

    #[test]
    fn test_odd_qubits_pairs_two_qubit_gates() {
        let mut c = Circuit::with_size("odd", 4, 0);
        for _ in 0..3 {
            c.cx(QubitId(0), QubitId(1)).unwrap();
            c.cx(QubitId(2), QubitId(3)).unwrap();
        }
        let layers = build_layers(&c, LayeringStrategy::OddQubits);
        assert_eq!(layers.len(), 3);
        assert!(layers
            .iter()
            .all(|l| l.two_qubit_pairs().count() == 2));
    }

    #[test]
    fn test_qubit_triangle_bound() {
        let c = sample_circuit();
        let layers = build_layers(&c, LayeringStrategy::QubitTriangle);
        for layer in &layers {
            assert!(layer.qubits().len() <= 3);
        }
    }

    #[test]
    fn test_barrier_splits_disjoint_layers() {
        let mut c = Circuit::with_size("b", 2, 0);
        c.h(QubitId(0)).unwrap();
        c.barrier([QubitId(0), QubitId(1)]).unwrap();
        c.h(QubitId(1)).unwrap();
        let layers = build_layers(&c, LayeringStrategy::DisjointQubits);
        // h(1) may not join the pre-barrier layer.
        assert_eq!(layers.len(), 3);
    }

    #[test]
    fn test_relayering_is_idempotent() {
        for strategy in [
            LayeringStrategy::IndividualGates,
            LayeringStrategy::DisjointQubits,
            LayeringStrategy::OddQubits,
            LayeringStrategy::QubitTriangle,
        ] {
            let c = sample_circuit();
            let layers = build_layers(&c, strategy);

            let mut flat = Circuit::with_size("flat", c.num_qubits(), c.num_clbits());
            for inst in flatten(&layers) {
                flat.apply(inst).unwrap();
            }
            let relayered = build_layers(&flat, strategy);
            assert_eq!(layers, relayered, "{strategy:?}");
        }
    }
}
