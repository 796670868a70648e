//! Operation test harness for validating edits.
//!
//! Captures pre-operation state, runs the operation, validates the result,
//! and computes deltas (volume change, face count change, etc.). Failed
//! edits are checked for a clean rollback instead.

use super::PolyhedronValidator;
use super::config::ValidationConfig;
use super::types::*;
use crate::operations::snapshot::PolyhedronSnapshot;
use crate::topology::brep::Polyhedron;

/// Snapshot of a polyhedron's state before an operation.
#[derive(Debug, Clone)]
pub struct PreOperationSnapshot {
    pub volume: f64,
    pub entity_counts: EntityCounts,
    pub validation_report: ValidationReport,
}

/// Result of running an operation through the validation harness.
#[derive(Debug)]
pub struct HarnessResult<T> {
    pub pre_snapshot: PreOperationSnapshot,
    pub operation_result: T,
    pub post_report: ValidationReport,
    pub volume_change: f64,
    pub volume_ratio: f64,
    pub face_count_change: i64,
    pub vertex_count_change: i64,
}

/// Run an edit through the validation harness.
///
/// 1. Captures a pre-operation snapshot (validation + volume).
/// 2. Runs the operation.
/// 3. Validates the result.
/// 4. Computes deltas.
///
/// An error from the operation is passed through untouched.
pub fn validate_operation_ok<T, E: std::fmt::Debug>(
    poly: &mut Polyhedron,
    config: &ValidationConfig,
    op: impl FnOnce(&mut Polyhedron) -> Result<T, E>,
) -> Result<HarnessResult<T>, E> {
    let validator = PolyhedronValidator::new(*config);

    let pre_report = validator.validate(poly);
    let pre_volume = poly.volume();
    let pre_counts = pre_report.metrics.entity_counts;

    let pre_snapshot = PreOperationSnapshot {
        volume: pre_volume,
        entity_counts: pre_counts,
        validation_report: pre_report,
    };

    let operation_result = op(poly)?;

    let post_report = validator.validate(poly);
    let post_volume = poly.volume();
    let post_counts = post_report.metrics.entity_counts;

    let volume_ratio = if pre_volume > 1e-15 {
        post_volume / pre_volume
    } else {
        f64::INFINITY
    };

    Ok(HarnessResult {
        pre_snapshot,
        operation_result,
        post_report,
        volume_change: post_volume - pre_volume,
        volume_ratio,
        face_count_change: post_counts.faces as i64 - pre_counts.faces as i64,
        vertex_count_change: post_counts.vertices as i64 - pre_counts.vertices as i64,
    })
}

/// A failed edit and whether it left the polyhedron as it found it.
#[derive(Debug)]
pub struct RollbackResult<E> {
    pub error: E,
    pub before: PolyhedronSnapshot,
    pub after: PolyhedronSnapshot,
}

impl<E> RollbackResult<E> {
    pub fn unchanged(&self) -> bool {
        self.before == self.after
    }
}

/// Run an edit that is expected to fail. A success is handed back as
/// `Err` with the operation's value.
pub fn validate_operation_err<T, E>(
    poly: &mut Polyhedron,
    op: impl FnOnce(&mut Polyhedron) -> Result<T, E>,
) -> Result<RollbackResult<E>, T> {
    let before = poly.snapshot();
    match op(poly) {
        Ok(value) => Err(value),
        Err(error) => Ok(RollbackResult { error, before, after: poly.snapshot() }),
    }
}

/// Assert that an edit run through the harness produced a valid result.
#[macro_export]
macro_rules! assert_operation_valid {
    ($harness_result:expr) => {
        assert!(
            $harness_result.post_report.valid,
            "Operation produced invalid polyhedron:\n{}",
            $harness_result.post_report
        );
    };
    ($harness_result:expr, $msg:expr) => {
        assert!(
            $harness_result.post_report.valid,
            "{}: Operation produced invalid polyhedron:\n{}",
            $msg,
            $harness_result.post_report
        );
    };
}

/// Assert that a failed edit left the polyhedron untouched.
#[macro_export]
macro_rules! assert_operation_rolled_back {
    ($rollback:expr) => {
        assert!(
            $rollback.unchanged(),
            "failed edit ({:?}) modified the polyhedron",
            $rollback.error
        );
    };
}
