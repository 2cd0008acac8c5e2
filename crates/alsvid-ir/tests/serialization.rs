//! Circuit serialization round-trips and validation of deserialized
//! circuits.

use alsvid_ir::{Circuit, ClbitId, IrError, QubitId};
use proptest::prelude::*;

#[test]
fn circuit_round_trips_through_json() {
    let mut circuit = Circuit::with_size("roundtrip", 3, 1);
    circuit.h(QubitId(0)).unwrap();
    circuit.rz(0.25, QubitId(1)).unwrap();
    circuit.cx(QubitId(0), QubitId(2)).unwrap();
    circuit.measure(QubitId(2), ClbitId(0)).unwrap();

    let json = serde_json::to_string(&circuit).unwrap();
    let back: Circuit = serde_json::from_str(&json).unwrap();
    assert_eq!(circuit, back);
    back.validate().unwrap();
}

#[test]
fn deserialized_out_of_range_circuit_fails_validation() {
    // Built for 3 qubits, shrunk to 2 in transit.
    let mut circuit = Circuit::with_size("shrunk", 3, 0);
    circuit.cx(QubitId(0), QubitId(2)).unwrap();
    let json = serde_json::to_string(&circuit)
        .unwrap()
        .replace("\"num_qubits\":3", "\"num_qubits\":2");

    let tampered: Circuit = serde_json::from_str(&json).unwrap();
    let err = tampered.validate().unwrap_err();
    assert!(matches!(err, IrError::QubitOutOfRange { .. }));
}

proptest! {
    #[test]
    fn random_circuits_round_trip(
        n in 1u32..8,
        ops in prop::collection::vec((any::<u32>(), any::<u32>(), 0.0..10.0f64), 0..30),
    ) {
        let mut circuit = Circuit::with_size("random", n, 0);
        for (a, b, theta) in ops {
            let a = a % n;
            let b = b % n;
            if a == b {
                circuit.rx(theta, QubitId(a)).unwrap();
            } else {
                circuit.cx(QubitId(a), QubitId(b)).unwrap();
            }
        }

        let json = serde_json::to_string(&circuit).unwrap();
        let back: Circuit = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(&circuit, &back);
        prop_assert!(back.validate().is_ok());
        prop_assert_eq!(circuit.depth(), back.depth());
    }
}
