//! Primitives shared by the heuristic and exact layer searches.

use alsvid_ir::QubitId;
use rustc_hash::FxHashSet;

use crate::architecture::Architecture;
use crate::error::{MapError, MapResult};
use crate::layering::Layer;
use crate::layout::Layout;

/// Outcome of routing one layer: the committed exchange sequence, the
/// layout it produces, and how much search it took.
#[derive(Debug, Clone)]
pub struct LayerRoute {
    /// Exchanges to insert before the layer's gates.
    pub exchanges: Vec<Exchange>,
    /// Layout after applying the exchanges.
    pub layout: Layout,
    /// Search states expanded to find this route.
    pub nodes_expanded: usize,
}

/// One layout transformation step found by a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Exchange {
    /// Exchange the occupants of two coupled physical qubits.
    Swap(u32, u32),
    /// Relocate the occupant of `from` onto the coupled ancilla `to`.
    Teleport {
        /// Occupied source position.
        from: u32,
        /// Reserved ancilla target.
        to: u32,
    },
}

impl Exchange {
    /// Cost contribution of this exchange.
    pub fn cost(&self, arch: &Architecture) -> f64 {
        match *self {
            Exchange::Swap(a, b) => arch.swap_cost(a, b),
            Exchange::Teleport { from, to } => arch.teleport_cost(from, to),
        }
    }

    /// Apply this exchange to a layout.
    pub fn apply(&self, layout: &mut Layout) -> MapResult<()> {
        match *self {
            Exchange::Swap(a, b) => {
                layout.swap(a, b);
                Ok(())
            }
            Exchange::Teleport { from, to } => layout.teleport(from, to),
        }
    }
}

/// The logical qubit pairs a layer's two-qubit gates require to become
/// adjacent.
pub fn required_pairs(layer: &Layer) -> Vec<(QubitId, QubitId)> {
    layer.two_qubit_pairs().collect()
}

/// Check whether every required pair is coupled under the given layout.
pub fn all_coupled(
    pairs: &[(QubitId, QubitId)],
    layout: &Layout,
    arch: &Architecture,
) -> MapResult<bool> {
    for &(a, b) in pairs {
        let (pa, pb) = positions(a, b, layout)?;
        if !arch.is_coupled(pa, pb) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Physical positions of a logical pair; missing assignments are engine
/// bugs at this stage.
pub fn positions(a: QubitId, b: QubitId, layout: &Layout) -> MapResult<(u32, u32)> {
    let pa = layout
        .physical_of(a)
        .ok_or_else(|| MapError::InternalSearchError(format!("logical qubit {a} unplaced")))?;
    let pb = layout
        .physical_of(b)
        .ok_or_else(|| MapError::InternalSearchError(format!("logical qubit {b} unplaced")))?;
    Ok((pa, pb))
}

/// Physical positions currently holding a logical qubit of the given set.
pub fn active_positions(qubits: &FxHashSet<QubitId>, layout: &Layout) -> FxHashSet<u32> {
    qubits
        .iter()
        .filter_map(|&q| layout.physical_of(q))
        .collect()
}

/// Swap candidates for one expansion step: coupling edges touching a
/// position that holds one of the search-relevant logical qubits, with
/// reserved ancillas excluded. Edge order follows the architecture's
/// sorted edge list, which keeps expansion deterministic.
pub fn swap_candidates(
    arch: &Architecture,
    layout: &Layout,
    active: &FxHashSet<u32>,
) -> Vec<Exchange> {
    arch.edges()
        .iter()
        .copied()
        .filter(|&(a, b)| {
            !layout.is_ancilla(a)
                && !layout.is_ancilla(b)
                && (active.contains(&a) || active.contains(&b))
        })
        .map(|(a, b)| Exchange::Swap(a, b))
        .collect()
}

/// Teleport candidates: each reserved ancilla can absorb a coupled,
/// search-relevant neighbor. Sorted ancilla and neighbor order keeps
/// expansion deterministic.
pub fn teleport_candidates(
    arch: &Architecture,
    layout: &Layout,
    active: &FxHashSet<u32>,
) -> Vec<Exchange> {
    let mut candidates = vec![];
    for &ancilla in layout.ancillas() {
        for &neighbor in arch.neighbors(ancilla) {
            if active.contains(&neighbor) {
                candidates.push(Exchange::Teleport {
                    from: neighbor,
                    to: ancilla,
                });
            }
        }
    }
    candidates
}
