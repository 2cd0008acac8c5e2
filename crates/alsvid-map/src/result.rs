//! Mapping results and statistics.

use alsvid_ir::{ClbitId, InstructionKind};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::layout::Layout;

/// One operation of the mapped sequence, referencing physical qubits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MappedOp {
    /// A circuit instruction rewritten onto physical qubits.
    Instruction {
        /// The original instruction kind.
        kind: InstructionKind,
        /// Physical operand qubits.
        qubits: Vec<u32>,
        /// Classical operands (measurements).
        clbits: Vec<ClbitId>,
    },
    /// An inserted SWAP on two coupled physical qubits.
    Swap {
        /// First physical qubit.
        p1: u32,
        /// Second physical qubit.
        p2: u32,
    },
    /// An inserted teleportation relocating a logical qubit onto an
    /// ancilla.
    Teleport {
        /// Source physical qubit.
        from: u32,
        /// Ancilla target physical qubit.
        to: u32,
    },
}

impl MappedOp {
    /// Physical qubits this operation touches.
    pub fn qubits(&self) -> Vec<u32> {
        match self {
            MappedOp::Instruction { qubits, .. } => qubits.clone(),
            MappedOp::Swap { p1, p2 } => vec![*p1, *p2],
            MappedOp::Teleport { from, to } => vec![*from, *to],
        }
    }
}

impl fmt::Display for MappedOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappedOp::Instruction { kind, qubits, clbits } => {
                let name = match kind {
                    InstructionKind::Gate(g) => g.name(),
                    InstructionKind::Measure => "measure",
                    InstructionKind::Barrier => "barrier",
                };
                write!(f, "{name}")?;
                for (i, q) in qubits.iter().enumerate() {
                    if i == 0 {
                        write!(f, " Q{q}")?;
                    } else {
                        write!(f, ", Q{q}")?;
                    }
                }
                for c in clbits {
                    write!(f, " -> {c}")?;
                }
                Ok(())
            }
            MappedOp::Swap { p1, p2 } => write!(f, "swap Q{p1}, Q{p2}"),
            MappedOp::Teleport { from, to } => write!(f, "teleport Q{from} -> Q{to}"),
        }
    }
}

/// Per-layer search cost record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerStats {
    /// Search states expanded for this layer.
    pub nodes_expanded: usize,
    /// Exchanges (swaps + teleportations) committed for this layer.
    pub exchanges: usize,
    /// Wall-clock time spent on this layer, microseconds.
    pub time_us: u64,
}

/// Statistics record for one mapping run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingStats {
    /// Circuit name.
    pub name: String,
    /// Number of logical qubits.
    pub qubits: u32,
    /// Instruction count of the input circuit.
    pub gates_in: usize,
    /// Depth of the input circuit.
    pub depth_in: usize,
    /// Operation count of the mapped sequence.
    pub gates_out: usize,
    /// Depth of the mapped sequence.
    pub depth_out: usize,
    /// Number of layers processed.
    pub layers: usize,
    /// Inserted SWAP count.
    pub swaps: usize,
    /// Inserted teleportation count.
    pub teleportations: usize,
    /// Added gate count: swaps x 3 + teleportations x 7.
    pub added_gates: usize,
    /// Accumulated exchange cost (calibration-weighted when present).
    pub cost: f64,
    /// Total elapsed time, milliseconds.
    pub time_ms: f64,
    /// Whether a search cutoff (node or time budget) was hit.
    pub timeout: bool,
    /// Per-layer search costs.
    pub layer_stats: Vec<LayerStats>,
}

impl MappingStats {
    /// Single-line CSV summary for batch pipelines.
    ///
    /// Columns: name;qubits;gates_in;depth_in;gates_out;depth_out;swaps;
    /// teleportations;added_gates;time_ms;timeout
    pub fn csv_line(&self) -> String {
        format!(
            "{};{};{};{};{};{};{};{};{};{:.3};{}",
            self.name,
            self.qubits,
            self.gates_in,
            self.depth_in,
            self.gates_out,
            self.depth_out,
            self.swaps,
            self.teleportations,
            self.added_gates,
            self.time_ms,
            self.timeout
        )
    }
}

/// The complete, immutable outcome of a mapping run.
///
/// On success `mapped` (if requested) and `final_layout` are present and
/// `error` is `None`. When the search reported infeasibility the error is
/// recorded here and the mapped sequence is omitted; fatal input errors
/// never produce a result record at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingResult {
    /// Mapped gate sequence, including inserted exchanges. `None` when
    /// not requested or on error.
    pub mapped: Option<Vec<MappedOp>>,
    /// Final logical-to-physical layout. `None` on error.
    pub final_layout: Option<Layout>,
    /// Statistics record.
    pub statistics: MappingStats,
    /// Error message when the mapping was infeasible.
    pub error: Option<String>,
    /// Single-line CSV summary, when requested.
    pub csv: Option<String>,
}

impl MappingResult {
    /// Whether the run produced a valid mapping.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Render the mapped sequence as a textual gate list.
    pub fn mapped_listing(&self) -> Option<String> {
        self.mapped.as_ref().map(|ops| {
            let mut out = String::new();
            for op in ops {
                out.push_str(&op.to_string());
                out.push('\n');
            }
            out
        })
    }

    /// Serialize the whole record to JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Depth of a mapped sequence over physical qubit lines.
pub fn mapped_depth(ops: &[MappedOp]) -> usize {
    let mut line_depth: rustc_hash::FxHashMap<u32, usize> = rustc_hash::FxHashMap::default();
    let mut depth = 0;
    for op in ops {
        let level = op
            .qubits()
            .iter()
            .map(|q| line_depth.get(q).copied().unwrap_or(0))
            .max()
            .unwrap_or(0)
            + 1;
        for q in op.qubits() {
            line_depth.insert(q, level);
        }
        depth = depth.max(level);
    }
    depth
}
