//! Schedule verification.

use rustc_hash::FxHashMap;
use tracing::debug;

use tweezer_ir::{Circuit, Operation, Resource, Schedule};

use crate::config::CommutationRule;
use crate::error::{CompileError, CompileResult};

use super::commutation::commutes;

/// Check a schedule against the circuit it was computed from.
///
/// - every resource sees the same operations in the same order
/// - operations sharing a layer commute under `rule`
/// - nothing crosses a barrier on the barrier's qubits
pub fn verify_schedule(
    schedule: &Schedule,
    circuit: &Circuit,
    rule: CommutationRule,
) -> CompileResult<()> {
    let original = by_resource(circuit.iter().map(|op| (0, op)));
    let scheduled = by_resource(
        schedule
            .layers()
            .iter()
            .enumerate()
            .flat_map(|(i, layer)| layer.operations().iter().map(move |op| (i, op))),
    );

    check_order(&original, &scheduled)?;
    check_layers(schedule, rule)?;
    check_barriers(circuit, &scheduled)?;

    debug!("Schedule '{}' verified", schedule.name());
    Ok(())
}

type Timeline<'a> = FxHashMap<Resource, Vec<(usize, &'a Operation)>>;

fn by_resource<'a>(ops: impl Iterator<Item = (usize, &'a Operation)>) -> Timeline<'a> {
    let mut timeline: Timeline<'a> = FxHashMap::default();
    for (layer, op) in ops.filter(|(_, op)| !op.is_barrier()) {
        for r in op.resources() {
            timeline.entry(r).or_default().push((layer, op));
        }
    }
    timeline
}

fn check_order(original: &Timeline<'_>, scheduled: &Timeline<'_>) -> CompileResult<()> {
    if original.len() != scheduled.len() {
        return Err(violation(format!(
            "{} resources in circuit, {} in schedule",
            original.len(),
            scheduled.len()
        )));
    }
    for (resource, expected) in original {
        let Some(found) = scheduled.get(resource) else {
            return Err(violation(format!("{resource} missing from schedule")));
        };
        if expected.len() != found.len() {
            return Err(violation(format!(
                "{resource} has {} operations, schedule has {}",
                expected.len(),
                found.len()
            )));
        }
        if let Some((i, ((_, a), (_, b)))) = expected
            .iter()
            .zip(found)
            .enumerate()
            .find(|(_, ((_, a), (_, b)))| a != b)
        {
            return Err(violation(format!(
                "{resource} operation {i} reordered: expected '{a}', found '{b}'"
            )));
        }
    }
    Ok(())
}

fn check_layers(schedule: &Schedule, rule: CommutationRule) -> CompileResult<()> {
    for (i, layer) in schedule.layers().iter().enumerate() {
        let ops = layer.operations();
        for (j, a) in ops.iter().enumerate() {
            if let Some(b) = ops[j + 1..].iter().find(|b| !commutes(a, b, rule)) {
                return Err(violation(format!(
                    "layer {i} holds non-commuting '{a}' and '{b}'"
                )));
            }
        }
    }
    Ok(())
}

fn check_barriers(circuit: &Circuit, scheduled: &Timeline<'_>) -> CompileResult<()> {
    let mut seen: FxHashMap<Resource, usize> = FxHashMap::default();
    for op in circuit.iter() {
        let Operation::Barrier { qubits } = op else {
            for r in op.resources() {
                *seen.entry(r).or_default() += 1;
            }
            continue;
        };

        let mut last_before = None;
        let mut first_after = None;
        for q in qubits {
            let r = Resource::Qubit(q.clone());
            let count = seen.get(&r).copied().unwrap_or(0);
            let Some(line) = scheduled.get(&r) else {
                continue;
            };
            if count > 0 {
                let layer = line[count - 1].0;
                last_before = Some(last_before.map_or(layer, |l: usize| l.max(layer)));
            }
            if let Some((layer, _)) = line.get(count) {
                first_after = Some(first_after.map_or(*layer, |l: usize| l.min(*layer)));
            }
        }

        if let (Some(before), Some(after)) = (last_before, first_after) {
            if before >= after {
                return Err(violation(format!(
                    "'{op}' crossed: layer {after} follows layer {before}"
                )));
            }
        }
    }
    Ok(())
}

fn violation(message: String) -> CompileError {
    CompileError::ScheduleViolation(message)
}
