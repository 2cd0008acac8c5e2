//! The mapping run: validation, dispatch, layer-by-layer commit.

use std::time::Instant;

use alsvid_ir::Circuit;
use tracing::{debug, info, instrument};

use crate::architecture::Architecture;
use crate::config::{InitialLayoutStrategy, MapperConfig, Method};
use crate::error::{MapError, MapResult};
use crate::exact::ExactMapper;
use crate::heuristic::HeuristicMapper;
use crate::layering::{build_layers, Layer};
use crate::layout::{build_initial_layout, reserve_ancillas, Layout, TELEPORT_ANCILLAS};
use crate::result::{mapped_depth, LayerStats, MappedOp, MappingResult, MappingStats};
use crate::search::{Exchange, LayerRoute};

/// Map a circuit onto an architecture.
///
/// Input validation failures (`InvalidArchitecture`, `InvalidCircuit`,
/// `CircuitTooLarge`) and engine bugs return `Err` before or during the
/// run. Search-time infeasibility — including node/time-budget cutoffs —
/// is captured in the result's `error` field instead, with the mapped
/// sequence omitted.
///
/// Layers are committed strictly in order: the layout after layer N is
/// the precondition for layer N+1's search.
#[instrument(skip_all, fields(circuit = %circuit.name(), method = ?config.method))]
pub fn map_circuit(
    circuit: &Circuit,
    arch: &Architecture,
    config: &MapperConfig,
) -> MapResult<MappingResult> {
    let started = Instant::now();

    circuit.validate()?;
    arch.validate_for_circuit(circuit.num_qubits())?;

    let layers = build_layers(circuit, config.layering);

    // Connectivity shortfall is a search-level infeasibility, not a
    // malformed input: it goes into the result record.
    if arch.largest_component_size() < circuit.num_qubits()
        && layers.iter().any(Layer::has_two_qubit_gate)
    {
        let err = MapError::infeasible(format!(
            "architecture connectivity insufficient: largest component holds {} of {} circuit qubits",
            arch.largest_component_size(),
            circuit.num_qubits()
        ));
        info!(error = %err, "mapping infeasible");
        let stats = MappingStats {
            name: circuit.name().to_string(),
            qubits: circuit.num_qubits(),
            gates_in: circuit.num_ops(),
            depth_in: circuit.depth(),
            layers: layers.len(),
            ..MappingStats::default()
        };
        return Ok(infeasible_result(stats, &err, config, started));
    }
    let mut layout = initial_layout(&layers, circuit, arch, config)?;
    if config.use_teleportation {
        let reserved = reserve_ancillas(&mut layout, config.teleportation_seed, TELEPORT_ANCILLAS)?;
        debug!(reserved, fake = config.teleportation_fake, "teleportation ancillas");
    }

    info!(
        qubits = circuit.num_qubits(),
        gates = circuit.num_ops(),
        layers = layers.len(),
        "mapping run started"
    );

    let heuristic = HeuristicMapper::new(arch, config);
    let exact = ExactMapper::new(arch);

    let mut stats = MappingStats {
        name: circuit.name().to_string(),
        qubits: circuit.num_qubits(),
        gates_in: circuit.num_ops(),
        depth_in: circuit.depth(),
        layers: layers.len(),
        ..MappingStats::default()
    };
    let mut mapped: Vec<MappedOp> = vec![];

    for (index, layer) in layers.iter().enumerate() {
        let layer_started = Instant::now();
        let mut nodes_expanded = 0usize;
        let mut exchanges = 0usize;

        match dispatch(config.method, &heuristic, &exact, &layers, index, &layout) {
            Ok(route) => {
                commit_layer(layer, &route, arch, &mut mapped, &mut stats)?;
                layout = route.layout;
                nodes_expanded = route.nodes_expanded;
                exchanges = route.exchanges.len();
            }
            // A coarse layer can demand a coupling pattern the device
            // lacks (three mutually coupled qubits on a path, say) even
            // though every gate in it is individually routable. Degrade
            // to per-gate routing instead of reporting infeasibility.
            Err(err) if layer.gates.len() > 1 && !err.is_fatal() && !err.is_cutoff() => {
                debug!(layer = index, error = %err, "splitting unsatisfiable layer");
                let split: Vec<Layer> = layer
                    .gates
                    .iter()
                    .map(|gate| Layer {
                        gates: vec![gate.clone()],
                    })
                    .collect();
                for (sub_index, sub_layer) in split.iter().enumerate() {
                    let route =
                        match dispatch(config.method, &heuristic, &exact, &split, sub_index, &layout)
                        {
                            Ok(route) => route,
                            Err(err) if !err.is_fatal() => {
                                info!(layer = index, error = %err, "mapping infeasible");
                                return Ok(infeasible_result(stats, &err, config, started));
                            }
                            Err(err) => return Err(err),
                        };
                    commit_layer(sub_layer, &route, arch, &mut mapped, &mut stats)?;
                    layout = route.layout;
                    nodes_expanded += route.nodes_expanded;
                    exchanges += route.exchanges.len();
                }
            }
            Err(err) if !err.is_fatal() => {
                info!(layer = index, error = %err, "mapping infeasible");
                return Ok(infeasible_result(stats, &err, config, started));
            }
            Err(err) => return Err(err),
        }

        let layer_stat = LayerStats {
            nodes_expanded,
            exchanges,
            time_us: layer_started.elapsed().as_micros() as u64,
        };
        if config.verbose {
            info!(
                layer = index,
                exchanges = layer_stat.exchanges,
                nodes = layer_stat.nodes_expanded,
                "layer committed"
            );
        }
        stats.layer_stats.push(layer_stat);
    }

    stats.gates_out = mapped.len();
    stats.depth_out = mapped_depth(&mapped);
    stats.time_ms = started.elapsed().as_secs_f64() * 1e3;

    if config.statistics {
        info!(
            swaps = stats.swaps,
            teleportations = stats.teleportations,
            added_gates = stats.added_gates,
            depth_in = stats.depth_in,
            depth_out = stats.depth_out,
            time_ms = stats.time_ms,
            "mapping statistics"
        );
    }

    Ok(MappingResult {
        mapped: config.save_mapped_circuit.then_some(mapped),
        final_layout: Some(layout),
        csv: config.csv.then(|| stats.csv_line()),
        statistics: stats,
        error: None,
    })
}

/// Route one layer with the configured method.
fn dispatch(
    method: Method,
    heuristic: &HeuristicMapper<'_>,
    exact: &ExactMapper<'_>,
    layers: &[Layer],
    index: usize,
    layout: &Layout,
) -> MapResult<LayerRoute> {
    match method {
        Method::Heuristic => heuristic.route_layer(layers, index, layout),
        Method::Exact => exact.route_layer(layers, index, layout),
    }
}

/// Result record for a run that ended in a non-fatal infeasibility.
fn infeasible_result(
    mut stats: MappingStats,
    err: &MapError,
    config: &MapperConfig,
    started: Instant,
) -> MappingResult {
    stats.timeout = err.is_cutoff();
    stats.time_ms = started.elapsed().as_secs_f64() * 1e3;
    MappingResult {
        mapped: None,
        final_layout: None,
        csv: config.csv.then(|| stats.csv_line()),
        statistics: stats,
        error: Some(err.to_string()),
    }
}

/// Starting layout for the run. The layout strategy only applies to the
/// heuristic method; the exact mapper always starts from identity, its
/// per-layer optimum does not depend on a placement heuristic.
fn initial_layout(
    layers: &[Layer],
    circuit: &Circuit,
    arch: &Architecture,
    config: &MapperConfig,
) -> MapResult<Layout> {
    let strategy = match config.method {
        Method::Heuristic => config.initial_layout,
        Method::Exact => InitialLayoutStrategy::Identity,
    };
    build_initial_layout(layers, circuit.num_qubits(), arch, strategy)
}

/// Append a routed layer to the mapped sequence: exchanges first, then
/// the layer's gates rewritten onto their (post-exchange) physical
/// positions.
fn commit_layer(
    layer: &Layer,
    route: &LayerRoute,
    arch: &Architecture,
    mapped: &mut Vec<MappedOp>,
    stats: &mut MappingStats,
) -> MapResult<()> {
    for exchange in &route.exchanges {
        stats.cost += exchange.cost(arch);
        match *exchange {
            Exchange::Swap(p1, p2) => {
                stats.swaps += 1;
                stats.added_gates += 3;
                mapped.push(MappedOp::Swap { p1, p2 });
            }
            Exchange::Teleport { from, to } => {
                stats.teleportations += 1;
                stats.added_gates += 7;
                mapped.push(MappedOp::Teleport { from, to });
            }
        }
    }

    for gate in &layer.gates {
        let qubits = gate
            .qubits
            .iter()
            .map(|&q| {
                route.layout.physical_of(q).ok_or_else(|| {
                    MapError::InternalSearchError(format!("logical qubit {q} unplaced at commit"))
                })
            })
            .collect::<MapResult<Vec<u32>>>()?;
        mapped.push(MappedOp::Instruction {
            kind: gate.kind.clone(),
            qubits,
            clbits: gate.clbits.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvid_ir::QubitId;

    #[test]
    fn test_map_bell_on_linear() {
        let circuit = Circuit::bell().unwrap();
        let arch = Architecture::linear(3);
        let result = map_circuit(&circuit, &arch, &MapperConfig::default()).unwrap();

        assert!(result.is_success());
        assert_eq!(result.statistics.swaps, 0);
        let mapped = result.mapped.unwrap();
        assert_eq!(mapped.len(), circuit.num_ops());
    }

    #[test]
    fn test_circuit_too_large_is_fatal() {
        let circuit = Circuit::with_size("big", 5, 0);
        let arch = Architecture::linear(3);
        let err = map_circuit(&circuit, &arch, &MapperConfig::default()).unwrap_err();
        assert!(matches!(err, MapError::CircuitTooLarge { .. }));
    }

    #[test]
    fn test_save_mapped_circuit_false_omits_sequence() {
        let circuit = Circuit::bell().unwrap();
        let arch = Architecture::linear(2);
        let config = MapperConfig {
            save_mapped_circuit: false,
            ..MapperConfig::default()
        };
        let result = map_circuit(&circuit, &arch, &config).unwrap();
        assert!(result.is_success());
        assert!(result.mapped.is_none());
        assert!(result.final_layout.is_some());
    }

    #[test]
    fn test_csv_requested() {
        let circuit = Circuit::bell().unwrap();
        let arch = Architecture::linear(2);
        let config = MapperConfig {
            csv: true,
            ..MapperConfig::default()
        };
        let result = map_circuit(&circuit, &arch, &config).unwrap();
        let csv = result.csv.unwrap();
        assert!(csv.starts_with("bell;2;"));
    }

    #[test]
    fn test_unsatisfiable_layer_splits_instead_of_failing() {
        // Triangle layering packs cx(0,1), cx(1,2), cx(0,2) into one layer
        // whose pairs can never be simultaneously coupled on a path. The
        // circuit is still mappable gate by gate.
        let arch = Architecture::linear(3);
        let mut circuit = Circuit::with_size("triangle", 3, 0);
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.cx(QubitId(1), QubitId(2)).unwrap();
        circuit.cx(QubitId(0), QubitId(2)).unwrap();

        let config = MapperConfig::default()
            .with_layering(crate::config::LayeringStrategy::QubitTriangle)
            .with_initial_layout(InitialLayoutStrategy::Identity);
        let result = map_circuit(&circuit, &arch, &config).unwrap();

        assert!(result.is_success(), "error: {:?}", result.error);
        let mapped = result.mapped.unwrap();
        for op in &mapped {
            let qubits = op.qubits();
            if qubits.len() == 2 {
                assert!(arch.is_coupled(qubits[0], qubits[1]));
            }
        }
        // All three gates survive, plus at least one swap for the closing
        // long-range pair.
        assert_eq!(mapped.len(), 3 + result.statistics.swaps);
        assert!(result.statistics.swaps >= 1);
    }

    #[test]
    fn test_single_qubit_gates_follow_their_qubit() {
        // After the swap needed for cx(0,2), a later x on q2 must land on
        // q2's new physical home.
        let arch = Architecture::linear(3);
        let mut circuit = Circuit::with_size("follow", 3, 0);
        circuit.cx(QubitId(0), QubitId(2)).unwrap();
        circuit.x(QubitId(2)).unwrap();

        let config = MapperConfig::default().with_initial_layout(InitialLayoutStrategy::Identity);
        let result = map_circuit(&circuit, &arch, &config).unwrap();
        let layout = result.final_layout.unwrap();
        let home = layout.physical_of(QubitId(2)).unwrap();

        let mapped = result.mapped.unwrap();
        let x_op = mapped
            .iter()
            .find(|op| matches!(op, MappedOp::Instruction { kind, .. }
                if matches!(kind, alsvid_ir::InstructionKind::Gate(g) if g.name() == "x")))
            .unwrap();
        assert_eq!(x_op.qubits(), vec![home]);
    }
}
