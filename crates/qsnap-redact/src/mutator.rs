//! Transactional application of redaction plans

use qsnap_core::NodeError;
use thiserror::Error;
use tracing::{debug, warn};

use crate::plan::{RedactionPlan, RedactionStep};

/// Outcome of restoring an applied plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: usize,
    pub failed: usize,
}

impl RestoreReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Restores the steps of an applied plan.
///
/// Restoration runs in strict reverse order of application. A failing
/// restoration is logged and the remaining ones still run. Dropping an
/// `Undo` without calling [`Undo::run`] restores as well.
#[derive(Debug, Default)]
pub struct Undo {
    applied: Vec<RedactionStep>,
}

impl Undo {
    /// Number of steps that would be restored.
    pub fn len(&self) -> usize {
        self.applied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }

    pub fn run(mut self) -> RestoreReport {
        self.restore()
    }

    fn restore(&mut self) -> RestoreReport {
        let mut report = RestoreReport::default();
        for step in std::mem::take(&mut self.applied).into_iter().rev() {
            match step.target.set_property(step.property, step.prior.clone()) {
                Ok(()) => report.restored += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        node = %step.target.id(),
                        property = ?step.property,
                        prior = %step.prior,
                        "Failed to restore redacted property: {}",
                        e
                    );
                }
            }
        }
        report
    }
}

impl Drop for Undo {
    fn drop(&mut self) {
        if !self.applied.is_empty() {
            debug!(steps = self.applied.len(), "Undo dropped before run, restoring");
            self.restore();
        }
    }
}

/// A plan that stopped at a failing step.
///
/// `undo` covers exactly the steps applied before the failure.
#[derive(Error, Debug)]
#[error("Redaction step {index} failed: {source}")]
pub struct PartialApply {
    pub undo: Undo,
    pub index: usize,
    #[source]
    pub source: NodeError,
}

/// Apply every step of `plan` in order.
///
/// Stops at the first failing step without rolling back; the caller decides
/// when to run the returned [`Undo`].
pub fn apply(plan: RedactionPlan) -> Result<Undo, PartialApply> {
    let mut undo = Undo::default();
    for (index, step) in plan.into_steps().into_iter().enumerate() {
        if let Err(source) = step.target.set_property(step.property, step.redacted.clone()) {
            return Err(PartialApply {
                undo,
                index,
                source,
            });
        }
        undo.applied.push(step);
    }
    debug!(steps = undo.len(), "Redaction plan applied");
    Ok(undo)
}
