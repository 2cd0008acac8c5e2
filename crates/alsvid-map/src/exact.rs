//! Exact per-layer mapper: provably minimal-cost swap sequences.

use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use alsvid_ir::QubitId;
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::architecture::Architecture;
use crate::error::{MapError, MapResult};
use crate::layering::Layer;
use crate::layout::Layout;
use crate::search::{
    active_positions, all_coupled, required_pairs, swap_candidates, Exchange, LayerRoute,
};

/// Default bound on expanded states per layer.
const NODE_BUDGET: usize = 1 << 22;

/// Default wall-clock budget per layer.
const TIME_BUDGET: Duration = Duration::from_secs(60);

/// A permutation-selection problem: transform `layout` by swaps so every
/// logical pair in `pairs` sits on coupled physical qubits.
pub struct PermutationProblem<'a> {
    /// Target architecture.
    pub arch: &'a Architecture,
    /// Layout before the layer.
    pub layout: &'a Layout,
    /// Logical pairs that must become adjacent.
    pub pairs: Vec<(QubitId, QubitId)>,
    /// Abort after expanding this many states.
    pub node_budget: usize,
    /// Abort after this much wall-clock time.
    pub time_budget: Duration,
}

/// A minimal-cost solution to a [`PermutationProblem`].
pub struct PermutationSolution {
    /// The swap sequence, in commit order.
    pub swaps: Vec<(u32, u32)>,
    /// Layout after applying the swaps.
    pub layout: Layout,
    /// Total cost of the sequence.
    pub cost: f64,
    /// States expanded while solving.
    pub nodes_expanded: usize,
}

/// Pluggable optimal-search capability.
///
/// The default is the built-in branch-and-bound below; an external
/// constraint/SAT solver can stand in behind this trait without touching
/// the mapper loop. Implementations must be exhaustive within the given
/// budgets: a returned solution has cost less than or equal to every
/// feasible alternative, and exceeding a budget reports
/// [`MapError::cutoff`] rather than a suboptimal answer.
pub trait PermutationSolver: Send + Sync {
    /// Name for logs and statistics.
    fn name(&self) -> &'static str;

    /// Solve one permutation-selection problem.
    fn solve(&self, problem: &PermutationProblem<'_>) -> MapResult<PermutationSolution>;
}

/// Uniform-cost search over layouts reached by swap sequences.
///
/// Every expansion carries positive cost, so the first goal state popped
/// is globally minimal for the layer. Among equal-cost frontier states
/// the lexicographically smallest swap sequence is expanded first, which
/// pins down a deterministic optimum independent of container order.
pub struct BranchAndBoundSolver;

struct BnbNode {
    g: f64,
    swaps: Vec<(u32, u32)>,
    layout: Layout,
}

impl PartialEq for BnbNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for BnbNode {}

impl PartialOrd for BnbNode {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BnbNode {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .g
            .total_cmp(&self.g)
            .then_with(|| other.swaps.cmp(&self.swaps))
    }
}

impl PermutationSolver for BranchAndBoundSolver {
    fn name(&self) -> &'static str {
        "branch-and-bound"
    }

    fn solve(&self, problem: &PermutationProblem<'_>) -> MapResult<PermutationSolution> {
        let arch = problem.arch;
        let active_logicals: FxHashSet<QubitId> =
            problem.pairs.iter().flat_map(|&(a, b)| [a, b]).collect();

        let started = Instant::now();
        let mut frontier = BinaryHeap::new();
        let mut visited = FxHashSet::default();
        let mut nodes_expanded = 0usize;

        frontier.push(BnbNode {
            g: 0.0,
            swaps: vec![],
            layout: problem.layout.clone(),
        });

        while let Some(node) = frontier.pop() {
            if !visited.insert(node.layout.fingerprint()) {
                continue;
            }
            if all_coupled(&problem.pairs, &node.layout, arch)? {
                return Ok(PermutationSolution {
                    cost: node.g,
                    swaps: node.swaps,
                    layout: node.layout,
                    nodes_expanded,
                });
            }

            nodes_expanded += 1;
            if nodes_expanded > problem.node_budget {
                return Err(MapError::cutoff(format!(
                    "exact search exceeded the node budget ({})",
                    problem.node_budget
                )));
            }
            if started.elapsed() > problem.time_budget {
                return Err(MapError::cutoff(format!(
                    "exact search exceeded the time budget ({:?})",
                    problem.time_budget
                )));
            }

            let active = active_positions(&active_logicals, &node.layout);
            for exchange in swap_candidates(arch, &node.layout, &active) {
                let Exchange::Swap(a, b) = exchange else {
                    continue;
                };
                let mut next_layout = node.layout.clone();
                next_layout.swap(a, b);
                if visited.contains(&next_layout.fingerprint()) {
                    continue;
                }
                let mut swaps = node.swaps.clone();
                swaps.push((a, b));
                frontier.push(BnbNode {
                    g: node.g + arch.swap_cost(a, b),
                    swaps,
                    layout: next_layout,
                });
            }
        }

        Err(MapError::infeasible(
            "no reachable layout satisfies the layer's coupling requirements".to_string(),
        ))
    }
}

/// Exact layer router.
///
/// Teleportation is not part of the exact search space; the optimality
/// guarantee covers swap sequences.
pub struct ExactMapper<'a> {
    arch: &'a Architecture,
    solver: Box<dyn PermutationSolver>,
    node_budget: usize,
    time_budget: Duration,
}

impl<'a> ExactMapper<'a> {
    /// Create an exact router with the built-in branch-and-bound solver.
    pub fn new(arch: &'a Architecture) -> Self {
        Self {
            arch,
            solver: Box::new(BranchAndBoundSolver),
            node_budget: NODE_BUDGET,
            time_budget: TIME_BUDGET,
        }
    }

    /// Replace the permutation solver.
    #[must_use]
    pub fn with_solver(mut self, solver: Box<dyn PermutationSolver>) -> Self {
        self.solver = solver;
        self
    }

    /// Route one layer optimally.
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

        let problem = PermutationProblem {
            arch: self.arch,
            layout,
            pairs,
            node_budget: self.node_budget,
            time_budget: self.time_budget,
        };
        let solution = self.solver.solve(&problem)?;
        debug!(
            layer = index,
            solver = self.solver.name(),
            swaps = solution.swaps.len(),
            cost = solution.cost,
            nodes = solution.nodes_expanded,
            "layer routed optimally"
        );
        Ok(LayerRoute {
            exchanges: solution
                .swaps
                .into_iter()
                .map(|(a, b)| Exchange::Swap(a, b))
                .collect(),
            layout: solution.layout,
            nodes_expanded: solution.nodes_expanded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayeringStrategy;
    use crate::layering::build_layers;
    use alsvid_ir::Circuit;

    fn identity_layout(n: u32, phys: u32) -> Layout {
        let mut layout = Layout::new(n, phys);
        for i in 0..n {
            layout.assign(QubitId(i), i).unwrap();
        }
        layout
    }

    #[test]
    fn test_single_swap_lexicographic_tie_break() {
        // Both swap(0,1) and swap(1,2) are optimal for cx(0,2) on a
        // 3-qubit chain; the lexicographically smaller sequence wins.
        let arch = Architecture::linear(3);
        let mut c = Circuit::with_size("t", 3, 0);
        c.cx(QubitId(0), QubitId(2)).unwrap();
        let layers = build_layers(&c, LayeringStrategy::IndividualGates);
        let layout = identity_layout(3, 3);

        let route = ExactMapper::new(&arch)
            .route_layer(&layers, 0, &layout)
            .unwrap();
        assert_eq!(route.exchanges, vec![Exchange::Swap(0, 1)]);
    }

    #[test]
    fn test_two_pairs_solved_jointly() {
        // Layer with cx(0,2) and cx(1,3) on a 4-chain under identity:
        // one middle swap (1,2) satisfies both pairs at once.
        let arch = Architecture::linear(4);
        let mut c = Circuit::with_size("t", 4, 0);
        c.cx(QubitId(0), QubitId(2)).unwrap();
        c.cx(QubitId(1), QubitId(3)).unwrap();
        let layers = build_layers(&c, LayeringStrategy::DisjointQubits);
        assert_eq!(layers.len(), 1);
        let layout = identity_layout(4, 4);

        let route = ExactMapper::new(&arch)
            .route_layer(&layers, 0, &layout)
            .unwrap();
        assert_eq!(route.exchanges, vec![Exchange::Swap(1, 2)]);
    }

    #[test]
    fn test_node_budget_reports_cutoff() {
        let arch = Architecture::grid(3, 3);
        let mut c = Circuit::with_size("t", 9, 0);
        c.cx(QubitId(0), QubitId(8)).unwrap();
        let layers = build_layers(&c, LayeringStrategy::IndividualGates);
        let layout = identity_layout(9, 9);

        let mut mapper = ExactMapper::new(&arch);
        mapper.node_budget = 1;
        let err = mapper.route_layer(&layers, 0, &layout).unwrap_err();
        assert!(err.is_cutoff());
        assert!(!err.is_fatal());
    }
}
