//! Redaction plan builder
//!
//! Plans are built from the live node and record the exact prior value of
//! every property they will touch. Building never mutates the node.

use std::fmt;

use qsnap_core::{CaptureOptions, ContentNode, NodeRef, Property, PropertyValue, HIDDEN_DISPLAY};
use serde::{Deserialize, Serialize};

use crate::rules::RedactionRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedactionKind {
    AnswerSlot,
    Selection,
    CheckedState,
    Attribution,
    TrailingSection,
}

/// One reversible mutation
#[derive(Clone)]
pub struct RedactionStep {
    pub target: NodeRef,
    pub kind: RedactionKind,
    pub property: Property,
    /// Value read from the live node when the plan was built
    pub prior: PropertyValue,
    pub redacted: PropertyValue,
}

impl RedactionStep {
    fn new(target: NodeRef, kind: RedactionKind, property: Property, redacted: PropertyValue) -> Self {
        let prior = target.property(property);
        Self {
            target,
            kind,
            property,
            prior,
            redacted,
        }
    }
}

impl fmt::Debug for RedactionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedactionStep")
            .field("target", &self.target.id())
            .field("kind", &self.kind)
            .field("property", &self.property)
            .field("prior", &self.prior)
            .field("redacted", &self.redacted)
            .finish()
    }
}

/// Summary of how many steps of a kind a plan holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionInfo {
    pub kind: RedactionKind,
    pub count: usize,
}

/// Ordered steps; insertion order is application order
#[derive(Debug, Clone, Default)]
pub struct RedactionPlan {
    steps: Vec<RedactionStep>,
}

impl RedactionPlan {
    pub fn steps(&self) -> &[RedactionStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn count(&self, kind: RedactionKind) -> usize {
        self.steps.iter().filter(|s| s.kind == kind).count()
    }

    /// Per-kind counts in first-seen order.
    pub fn summary(&self) -> Vec<RedactionInfo> {
        let mut out: Vec<RedactionInfo> = Vec::new();
        for step in &self.steps {
            match out.iter_mut().find(|info| info.kind == step.kind) {
                Some(info) => info.count += 1,
                None => out.push(RedactionInfo {
                    kind: step.kind,
                    count: 1,
                }),
            }
        }
        out
    }

    pub(crate) fn into_steps(self) -> Vec<RedactionStep> {
        self.steps
    }

    fn push(&mut self, step: RedactionStep) {
        self.steps.push(step);
    }
}

/// Builds redaction plans for question nodes
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    rules: RedactionRules,
}

impl Redactor {
    pub fn new(rules: RedactionRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RedactionRules {
        &self.rules
    }

    /// Build the plan for `node`.
    ///
    /// Step order: answer slots, selections, checked states, attribution
    /// notices, then trailing direct children when `options` asks for it.
    pub fn plan(&self, node: &dyn ContentNode, options: &CaptureOptions) -> RedactionPlan {
        let mut plan = RedactionPlan::default();
        let descendants = node.descendants();

        if !self.rules.answer_slot_class.is_empty() {
            let masked = PropertyValue::text(self.rules.masked_literal.as_str());
            for slot in descendants
                .iter()
                .filter(|n| n.has_class(&self.rules.answer_slot_class))
            {
                // Already masked slots would only add no-op undo steps
                if slot.property(Property::Markup) == masked {
                    continue;
                }
                plan.push(RedactionStep::new(
                    slot.clone(),
                    RedactionKind::AnswerSlot,
                    Property::Markup,
                    masked.clone(),
                ));
            }
        }

        for (kind, property) in [
            (RedactionKind::Selection, Property::Selected),
            (RedactionKind::CheckedState, Property::Checked),
        ] {
            for target in descendants
                .iter()
                .filter(|n| n.property(property) == PropertyValue::Flag(true))
            {
                plan.push(RedactionStep::new(
                    target.clone(),
                    kind,
                    property,
                    PropertyValue::Flag(false),
                ));
            }
        }

        if !self.rules.attribution_text.is_empty() {
            for target in descendants
                .iter()
                .filter(|n| n.text_content().contains(&self.rules.attribution_text))
            {
                plan.push(hide(target.clone(), RedactionKind::Attribution));
            }
        }

        if let Some(from) = options.hide_children_from {
            for child in node.children().into_iter().skip(from) {
                plan.push(hide(child, RedactionKind::TrailingSection));
            }
        }

        plan
    }
}

fn hide(target: NodeRef, kind: RedactionKind) -> RedactionStep {
    RedactionStep::new(
        target,
        kind,
        Property::Display,
        PropertyValue::text(HIDDEN_DISPLAY),
    )
}
