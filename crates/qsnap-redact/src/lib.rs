//! Reversible redaction of content nodes before capture
//!
//! [`Redactor`] inspects a node and builds a [`RedactionPlan`] without
//! touching it. [`apply`] executes a plan and hands back an [`Undo`] that
//! restores every applied step in reverse order.

pub mod mutator;
pub mod plan;
pub mod rules;

pub use mutator::{apply, PartialApply, RestoreReport, Undo};
pub use plan::{RedactionInfo, RedactionKind, RedactionPlan, RedactionStep, Redactor};
pub use rules::RedactionRules;
