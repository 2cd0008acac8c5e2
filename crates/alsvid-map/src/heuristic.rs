//! Heuristic per-layer mapper: bounded-lookahead A* over swap sequences.

use std::collections::BinaryHeap;

use alsvid_ir::QubitId;
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::architecture::Architecture;
use crate::config::MapperConfig;
use crate::error::{MapError, MapResult};
use crate::layering::Layer;
use crate::layout::Layout;
use crate::search::{
    active_positions, all_coupled, positions, required_pairs, swap_candidates,
    teleport_candidates, Exchange, LayerRoute,
};

/// Default bound on expanded search states per layer.
const NODE_BUDGET: usize = 1 << 20;

/// Number of subsequent layers the lookahead term inspects.
const LOOKAHEAD_LAYERS: usize = 15;

/// Discount for the first lookahead layer.
const LOOKAHEAD_FIRST_FACTOR: f64 = 0.75;

/// Geometric decay per further lookahead layer.
const LOOKAHEAD_FACTOR: f64 = 0.5;

/// A*-style layer router.
///
/// For each layer, searches for the cheapest swap/teleportation sequence
/// transforming the current layout into one where every two-qubit gate of
/// the layer acts on coupled physical qubits. States are candidate layouts
/// one exchange away from their parent; the priority is accumulated cost
/// plus an admissible remaining-distance bound, with a bounded lookahead
/// over subsequent layers to steer away from locally cheap but globally
/// costly moves. Ties are broken by insertion order, so the search is
/// deterministic regardless of how the frontier is stored.
pub struct HeuristicMapper<'a> {
    arch: &'a Architecture,
    /// Expand teleport moves (false when disabled or faked).
    teleport: bool,
    node_budget: usize,
}

/// A frontier entry. Ordering is reversed so the max-heap pops the lowest
/// `f`, with the earliest-inserted state winning ties.
struct SearchNode {
    f: f64,
    g: f64,
    seq: u64,
    exchanges: Vec<Exchange>,
    layout: Layout,
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for SearchNode {}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<'a> HeuristicMapper<'a> {
    /// Create a router for one mapping run.
    pub fn new(arch: &'a Architecture, config: &MapperConfig) -> Self {
        Self {
            arch,
            teleport: config.use_teleportation && !config.teleportation_fake,
            node_budget: NODE_BUDGET,
        }
    }

    /// Route one layer: find an exchange sequence making every required
    /// pair adjacent, and the layout it leads to.
    pub fn route_layer(
        &self,
        layers: &[Layer],
        index: usize,
        layout: &Layout,
    ) -> MapResult<LayerRoute> {
        let pairs = required_pairs(&layers[index]);
        if all_coupled(&pairs, layout, self.arch)? {
            return Ok(LayerRoute {
                exchanges: vec![],
                layout: layout.clone(),
                nodes_expanded: 0,
            });
        }

        let active_logicals: FxHashSet<QubitId> =
            pairs.iter().flat_map(|&(a, b)| [a, b]).collect();

        let mut frontier = BinaryHeap::new();
        let mut visited = FxHashSet::default();
        let mut seq = 0u64;
        let mut nodes_expanded = 0usize;

        let h0 = self.bound(&pairs, layers, index, layout)?;
        frontier.push(SearchNode {
            f: h0,
            g: 0.0,
            seq,
            exchanges: vec![],
            layout: layout.clone(),
        });

        while let Some(node) = frontier.pop() {
            if !visited.insert(node.layout.fingerprint()) {
                continue;
            }
            if all_coupled(&pairs, &node.layout, self.arch)? {
                debug!(
                    layer = index,
                    exchanges = node.exchanges.len(),
                    nodes = nodes_expanded,
                    "layer routed"
                );
                return Ok(LayerRoute {
                    exchanges: node.exchanges,
                    layout: node.layout,
                    nodes_expanded,
                });
            }

            nodes_expanded += 1;
            if nodes_expanded > self.node_budget {
                return Err(MapError::cutoff(format!(
                    "heuristic search exceeded the node budget ({}) on layer {index}",
                    self.node_budget
                )));
            }

            let active = active_positions(&active_logicals, &node.layout);
            let mut candidates = swap_candidates(self.arch, &node.layout, &active);
            if self.teleport {
                candidates.extend(teleport_candidates(self.arch, &node.layout, &active));
            }

            for exchange in candidates {
                let mut next_layout = node.layout.clone();
                exchange.apply(&mut next_layout)?;
                if visited.contains(&next_layout.fingerprint()) {
                    continue;
                }
                let g = node.g + exchange.cost(self.arch);
                let h = self.bound(&pairs, layers, index, &next_layout)?;
                let mut exchanges = node.exchanges.clone();
                exchanges.push(exchange);
                seq += 1;
                frontier.push(SearchNode {
                    f: g + h,
                    g,
                    seq,
                    exchanges,
                    layout: next_layout,
                });
            }
        }

        // The frontier only empties once every reachable layout is ruled
        // out: some pair is disconnected, or the layer demands a coupling
        // pattern (e.g. a mutually coupled triple) the architecture lacks.
        Err(MapError::infeasible(format!(
            "no reachable layout satisfies the coupling requirements of layer {index}"
        )))
    }

    /// Lower bound on the remaining cost: summed hop distances of the
    /// unsatisfied pairs (each swap can shorten two pairs by one, hence
    /// the halving), plus a discounted lookahead over subsequent layers.
    fn bound(
        &self,
        pairs: &[(QubitId, QubitId)],
        layers: &[Layer],
        index: usize,
        layout: &Layout,
    ) -> MapResult<f64> {
        let min_swap = self.arch.min_swap_cost();

        let mut remaining = 0.0;
        for &(a, b) in pairs {
            let (pa, pb) = positions(a, b, layout)?;
            let hops = self.arch.hops(pa, pb);
            if hops == u32::MAX {
                return Err(MapError::infeasible(format!(
                    "no path between physical qubits {pa} and {pb}"
                )));
            }
            remaining += (f64::from(hops) - 1.0).max(0.0);
        }
        let mut h = remaining * min_swap / 2.0;

        let mut factor = LOOKAHEAD_FIRST_FACTOR;
        for lookahead in layers.iter().skip(index + 1).take(LOOKAHEAD_LAYERS) {
            for (a, b) in lookahead.two_qubit_pairs() {
                // Future layers may touch qubits the current layout has
                // not seen; they cannot be unplaced, but stay defensive
                // about unreachable positions here and let the later layer
                // report them.
                let (Some(pa), Some(pb)) = (layout.physical_of(a), layout.physical_of(b)) else {
                    continue;
                };
                let hops = self.arch.hops(pa, pb);
                if hops != u32::MAX {
                    h += factor * (f64::from(hops) - 1.0).max(0.0) * min_swap;
                }
            }
            factor *= LOOKAHEAD_FACTOR;
        }

        Ok(h)
    }
}
