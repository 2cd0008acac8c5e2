//! Logical-to-physical layout and initial placement strategies.

use alsvid_ir::QubitId;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::architecture::Architecture;
use crate::config::InitialLayoutStrategy;
use crate::error::{MapError, MapResult};
use crate::layering::Layer;

/// Number of physical qubits reserved as teleportation ancillas (the
/// Bell-pair channel).
pub const TELEPORT_ANCILLAS: usize = 2;

/// Sentinel for an unassigned logical qubit during layout construction.
const UNASSIGNED: u32 = u32::MAX;

/// A bijection between logical and physical qubits.
///
/// At any point exactly one physical qubit holds each assigned logical
/// qubit. Physical qubits reserved as teleportation ancillas are excluded
/// from circuit-qubit placement; teleportation relocates a logical qubit
/// onto an ancilla, freeing its old position as the new ancilla.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    /// Physical position of each logical qubit (`UNASSIGNED` while the
    /// builder is still placing).
    logical_to_physical: Vec<u32>,
    /// Logical occupant of each physical qubit.
    physical_to_logical: Vec<Option<QubitId>>,
    /// Reserved ancilla positions, sorted.
    ancillas: Vec<u32>,
}

/// Hashable identity of a layout, used to deduplicate search states.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayoutFingerprint {
    positions: Vec<u32>,
    ancillas: Vec<u32>,
}

impl Layout {
    /// Create an empty layout for `num_logical` circuit qubits over
    /// `num_physical` architecture qubits.
    pub fn new(num_logical: u32, num_physical: u32) -> Self {
        Self {
            logical_to_physical: vec![UNASSIGNED; num_logical as usize],
            physical_to_logical: vec![None; num_physical as usize],
            ancillas: vec![],
        }
    }

    /// Number of logical qubits.
    pub fn num_logical(&self) -> u32 {
        self.logical_to_physical.len() as u32
    }

    /// Number of physical qubits.
    pub fn num_physical(&self) -> u32 {
        self.physical_to_logical.len() as u32
    }

    /// Assign a logical qubit to a free physical qubit.
    ///
    /// A duplicate assignment on either side is an engine bug and reported
    /// as [`MapError::InternalSearchError`].
    pub fn assign(&mut self, logical: QubitId, physical: u32) -> MapResult<()> {
        if self.logical_to_physical[logical.0 as usize] != UNASSIGNED {
            return Err(MapError::InternalSearchError(format!(
                "duplicate assignment of logical qubit {logical}"
            )));
        }
        if self.physical_to_logical[physical as usize].is_some() {
            return Err(MapError::InternalSearchError(format!(
                "physical qubit {physical} assigned twice"
            )));
        }
        if self.is_ancilla(physical) {
            return Err(MapError::InternalSearchError(format!(
                "physical qubit {physical} is reserved as ancilla"
            )));
        }
        self.logical_to_physical[logical.0 as usize] = physical;
        self.physical_to_logical[physical as usize] = Some(logical);
        Ok(())
    }

    /// Physical position of a logical qubit.
    pub fn physical_of(&self, logical: QubitId) -> Option<u32> {
        match self.logical_to_physical[logical.0 as usize] {
            UNASSIGNED => None,
            p => Some(p),
        }
    }

    /// Logical occupant of a physical qubit.
    pub fn logical_of(&self, physical: u32) -> Option<QubitId> {
        self.physical_to_logical[physical as usize]
    }

    /// Whether every logical qubit has a physical position.
    pub fn is_complete(&self) -> bool {
        self.logical_to_physical.iter().all(|&p| p != UNASSIGNED)
    }

    /// Whether a physical qubit is free (unoccupied and not reserved).
    pub fn is_free(&self, physical: u32) -> bool {
        self.physical_to_logical[physical as usize].is_none() && !self.is_ancilla(physical)
    }

    /// Whether a physical qubit is reserved as a teleportation ancilla.
    pub fn is_ancilla(&self, physical: u32) -> bool {
        self.ancillas.binary_search(&physical).is_ok()
    }

    /// The reserved ancilla positions, sorted.
    pub fn ancillas(&self) -> &[u32] {
        &self.ancillas
    }

    /// Reserve a physical qubit as a teleportation ancilla.
    fn reserve(&mut self, physical: u32) -> MapResult<()> {
        if self.physical_to_logical[physical as usize].is_some() {
            return Err(MapError::InternalSearchError(format!(
                "cannot reserve occupied physical qubit {physical}"
            )));
        }
        if let Err(at) = self.ancillas.binary_search(&physical) {
            self.ancillas.insert(at, physical);
        }
        Ok(())
    }

    /// Exchange the logical occupants of two physical qubits.
    pub fn swap(&mut self, p1: u32, p2: u32) {
        let l1 = self.physical_to_logical[p1 as usize];
        let l2 = self.physical_to_logical[p2 as usize];
        self.physical_to_logical[p1 as usize] = l2;
        self.physical_to_logical[p2 as usize] = l1;
        if let Some(l1) = l1 {
            self.logical_to_physical[l1.0 as usize] = p2;
        }
        if let Some(l2) = l2 {
            self.logical_to_physical[l2.0 as usize] = p1;
        }
    }

    /// Teleport the logical qubit at `from` onto the reserved ancilla `to`;
    /// `from` becomes the new ancilla.
    pub fn teleport(&mut self, from: u32, to: u32) -> MapResult<()> {
        if !self.is_ancilla(to) {
            return Err(MapError::InternalSearchError(format!(
                "teleport target {to} is not a reserved ancilla"
            )));
        }
        let Some(logical) = self.physical_to_logical[from as usize] else {
            return Err(MapError::InternalSearchError(format!(
                "teleport source {from} holds no logical qubit"
            )));
        };
        let at = self
            .ancillas
            .binary_search(&to)
            .map_err(|_| MapError::InternalSearchError("ancilla set corrupted".into()))?;
        self.ancillas.remove(at);
        self.physical_to_logical[from as usize] = None;
        self.physical_to_logical[to as usize] = Some(logical);
        self.logical_to_physical[logical.0 as usize] = to;
        if let Err(at) = self.ancillas.binary_search(&from) {
            self.ancillas.insert(at, from);
        }
        Ok(())
    }

    /// Hashable identity for visited-state deduplication.
    pub fn fingerprint(&self) -> LayoutFingerprint {
        LayoutFingerprint {
            positions: self.logical_to_physical.clone(),
            ancillas: self.ancillas.clone(),
        }
    }

    /// Iterate over `(logical, physical)` pairs in logical-id order.
    pub fn iter(&self) -> impl Iterator<Item = (QubitId, u32)> + '_ {
        self.logical_to_physical
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p != UNASSIGNED)
            .map(|(l, &p)| (QubitId(l as u32), p))
    }
}

/// Build the starting layout for a mapping run.
///
/// Placement never touches reserved ancillas; reservation happens after
/// placement via [`reserve_ancillas`].
pub fn build_initial_layout(
    layers: &[Layer],
    num_logical: u32,
    arch: &Architecture,
    strategy: InitialLayoutStrategy,
) -> MapResult<Layout> {
    let mut layout = Layout::new(num_logical, arch.num_qubits());
    match strategy {
        InitialLayoutStrategy::Identity => {
            for l in 0..num_logical {
                layout.assign(QubitId(l), l)?;
            }
        }
        InitialLayoutStrategy::Static => place_static(&mut layout, layers, arch)?,
        InitialLayoutStrategy::Dynamic => place_dynamic(&mut layout, layers, arch)?,
    }
    debug!(strategy = ?strategy, "initial layout built");
    Ok(layout)
}

/// Static placement: logical qubits ordered by two-qubit-gate involvement
/// are assigned to physical qubits ordered by coupling degree.
fn place_static(layout: &mut Layout, layers: &[Layer], arch: &Architecture) -> MapResult<()> {
    let num_logical = layout.num_logical();

    let mut involvement = vec![0usize; num_logical as usize];
    for layer in layers {
        for (a, b) in layer.two_qubit_pairs() {
            involvement[a.0 as usize] += 1;
            involvement[b.0 as usize] += 1;
        }
    }
    let mut logical_order: Vec<u32> = (0..num_logical).collect();
    logical_order.sort_by_key(|&l| (std::cmp::Reverse(involvement[l as usize]), l));

    let mut physical_order: Vec<u32> = (0..arch.num_qubits()).collect();
    physical_order.sort_by_key(|&p| (std::cmp::Reverse(arch.neighbors(p).len()), p));

    for (&l, &p) in logical_order.iter().zip(physical_order.iter()) {
        layout.assign(QubitId(l), p)?;
    }
    Ok(())
}

/// Dynamic placement: most-frequently-interacting logical pairs are placed
/// onto the most-closely-coupled free physical pairs first; leftover
/// logical qubits settle at the free position closest to their already
/// placed interaction partners.
fn place_dynamic(layout: &mut Layout, layers: &[Layer], arch: &Architecture) -> MapResult<()> {
    // Pair frequency with first-occurrence index as the deterministic
    // secondary key.
    let mut pair_stats: FxHashMap<(QubitId, QubitId), (usize, usize)> = FxHashMap::default();
    let mut partners: FxHashMap<QubitId, Vec<QubitId>> = FxHashMap::default();
    let mut seq = 0usize;
    for layer in layers {
        for (a, b) in layer.two_qubit_pairs() {
            let key = if a <= b { (a, b) } else { (b, a) };
            let entry = pair_stats.entry(key).or_insert((0, seq));
            entry.0 += 1;
            partners.entry(a).or_default().push(b);
            partners.entry(b).or_default().push(a);
            seq += 1;
        }
    }

    let mut pairs: Vec<_> = pair_stats.into_iter().collect();
    pairs.sort_by_key(|&((a, b), (count, first))| (std::cmp::Reverse(count), first, a, b));

    for ((a, b), _) in pairs {
        match (layout.physical_of(a), layout.physical_of(b)) {
            (None, None) => {
                if let Some((pa, pb)) = best_free_edge(layout, arch) {
                    layout.assign(a, pa)?;
                    layout.assign(b, pb)?;
                }
            }
            (Some(pa), None) => {
                if let Some(p) = closest_free(layout, arch, &[pa]) {
                    layout.assign(b, p)?;
                }
            }
            (None, Some(pb)) => {
                if let Some(p) = closest_free(layout, arch, &[pb]) {
                    layout.assign(a, p)?;
                }
            }
            (Some(_), Some(_)) => {}
        }
    }

    // Logical qubits with no two-qubit interactions (or crowded out when
    // no free coupled pair remained) settle by best available distance.
    for l in 0..layout.num_logical() {
        let logical = QubitId(l);
        if layout.physical_of(logical).is_some() {
            continue;
        }
        let anchor_positions: Vec<u32> = partners
            .get(&logical)
            .into_iter()
            .flatten()
            .filter_map(|&partner| layout.physical_of(partner))
            .collect();
        let p = closest_free(layout, arch, &anchor_positions)
            .ok_or_else(|| MapError::InternalSearchError("no free physical qubit left".into()))?;
        layout.assign(logical, p)?;
    }
    Ok(())
}

/// Cheapest free coupled pair, ties broken lexicographically.
fn best_free_edge(layout: &Layout, arch: &Architecture) -> Option<(u32, u32)> {
    arch.edges()
        .iter()
        .copied()
        .filter(|&(a, b)| layout.is_free(a) && layout.is_free(b))
        .min_by(|&(a1, b1), &(a2, b2)| {
            arch.swap_cost(a1, b1)
                .total_cmp(&arch.swap_cost(a2, b2))
                .then((a1, b1).cmp(&(a2, b2)))
        })
}

/// Free physical qubit minimizing summed distance to the anchors, ties
/// broken by smallest index. With no anchors this is the smallest free
/// index.
fn closest_free(layout: &Layout, arch: &Architecture, anchors: &[u32]) -> Option<u32> {
    (0..arch.num_qubits())
        .filter(|&p| layout.is_free(p))
        .min_by(|&p1, &p2| {
            let d1: f64 = anchors.iter().map(|&a| arch.distance(a, p1)).sum();
            let d2: f64 = anchors.iter().map(|&a| arch.distance(a, p2)).sum();
            d1.total_cmp(&d2).then(p1.cmp(&p2))
        })
}

/// Reserve teleportation ancillas among the free physical qubits.
///
/// With `seed != 0` the selection is reproducible; with `seed == 0` the
/// RNG is seeded from OS entropy and the run is not byte-for-byte
/// reproducible (still valid). Reserves fewer than requested if the
/// architecture has no spare qubits.
pub fn reserve_ancillas(layout: &mut Layout, seed: u64, count: usize) -> MapResult<usize> {
    let free: Vec<u32> = (0..layout.num_physical())
        .filter(|&p| layout.is_free(p))
        .collect();

    let mut rng = if seed == 0 {
        StdRng::from_entropy()
    } else {
        StdRng::seed_from_u64(seed)
    };

    let chosen: Vec<u32> = free
        .choose_multiple(&mut rng, count.min(free.len()))
        .copied()
        .collect();
    for p in &chosen {
        layout.reserve(*p)?;
    }
    debug!(ancillas = ?layout.ancillas(), "ancillas reserved");
    Ok(chosen.len())
}
