//! Commutation predicate used by the scheduler.

use rustc_hash::FxHashSet;

use tweezer_ir::{Operation, Resource};

use crate::config::CommutationRule;

/// Whether two operations may share a layer.
///
/// Disjoint operations always commute. Under [`CommutationRule::Diagonal`]
/// two gates that are both diagonal in the computational basis also
/// commute when they share qubits. Measurements, barriers and loops only
/// ever commute with operations they do not overlap.
pub fn commutes(a: &Operation, b: &Operation, rule: CommutationRule) -> bool {
    if a.is_loop() || b.is_loop() {
        return false;
    }
    if disjoint(a, b) {
        return true;
    }
    match rule {
        CommutationRule::Disjoint => false,
        CommutationRule::Diagonal => match (a, b) {
            (Operation::Gate(ga), Operation::Gate(gb)) => {
                ga.kind.is_diagonal() && gb.kind.is_diagonal()
            }
            _ => false,
        },
    }
}

/// Whether the two operations touch no common qubit or bit.
pub fn disjoint(a: &Operation, b: &Operation) -> bool {
    let ra: FxHashSet<Resource> = a.resources().collect();
    b.resources().all(|r| !ra.contains(&r))
}
