//! Failure messages
//!
//! The positive form explains, in order: an empty capture, an upsert
//! protocol failure, undeclared documents caught by closed-world mode, every
//! declared document that failed its verdict, and finally a dump of what was
//! actually sent. The negated form lists every touched document with its
//! repeat count.
//!
//! Ids and attribute maps render as compact JSON.

use crate::expectation::ExpectationSet;
use crate::reconcile::{ReconciliationResult, Verdict};
use crate::upsert::UpsertViolation;
use indexcheck_core::{attributes_match, Attributes, Category, DocId, ObservedOperation};
use serde_json::Value;

/// Render a list of ids as `["1", "2"]`
pub fn render_ids(ids: &[DocId]) -> String {
    let items: Vec<String> = ids.iter().map(|id| format!("{:?}", id.as_str())).collect();
    format!("[{}]", items.join(", "))
}

/// Render an attribute map as compact JSON
pub fn render_attributes(attributes: &Attributes) -> String {
    Value::Object(attributes.clone()).to_string()
}

fn render_keys(attributes: &Attributes) -> String {
    let items: Vec<String> = attributes.keys().map(|key| format!("{:?}", key)).collect();
    format!("[{}]", items.join(", "))
}

/// Keep the first occurrence of every id
fn unique<'a>(ids: impl IntoIterator<Item = &'a DocId>) -> Vec<DocId> {
    let mut seen: Vec<DocId> = Vec::new();
    for id in ids {
        if !seen.contains(id) {
            seen.push(id.clone());
        }
    }
    seen
}

/// Everything the renderer needs to explain one evaluation
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticRenderer<'a> {
    /// Watched index name
    pub index: &'a str,
    /// Frozen declarations
    pub expectations: &'a ExpectationSet,
    /// Reconciliation verdicts
    pub reconciliation: &'a ReconciliationResult,
    /// Upsert protocol outcome
    pub upsert: &'a Result<(), UpsertViolation>,
    /// Captured operations
    pub observed: &'a [ObservedOperation],
}

impl DiagnosticRenderer<'_> {
    /// Message for a failed positive assertion
    pub fn failure_message(&self) -> String {
        let mut out = String::new();

        if self.observed.is_empty() {
            let suffix = if self.expectations.no_refresh_required() {
                " with no refresh"
            } else {
                ""
            };
            out.push_str(&format!(
                "Expected index `{}` to be updated{}, but it was not\n",
                self.index, suffix
            ));
        } else {
            if let Err(violation) = self.upsert {
                out.push_str(&format!("{}\n", violation));
            }
            if self.reconciliation.has_missed() {
                self.render_missed(&mut out);
            }
        }

        for verdict in self.reconciliation.failures() {
            render_verdict(&mut out, verdict);
        }

        self.render_observed(&mut out);
        out
    }

    /// Message for a failed negated assertion; `None` when nothing was touched
    pub fn negated_message(&self) -> Option<String> {
        if self.observed.is_empty() {
            return None;
        }

        let mut counts: Vec<(&DocId, usize)> = Vec::new();
        for operation in self.observed {
            let id = operation.id();
            match counts.iter_mut().find(|(seen, _)| *seen == id) {
                Some((_, count)) => *count += 1,
                None => counts.push((id, 1)),
            }
        }

        let mut out = format!("Expected index `{}` not to be updated, but it was with", self.index);
        for (id, count) in counts {
            out.push_str(&format!("\n  document id `{}` ({} times)", id, count));
        }
        out.push('\n');
        Some(out)
    }

    fn render_missed(&self, out: &mut String) {
        let expectations = self.expectations;
        let expected_updated = unique(
            expectations
                .category(Category::Reindex)
                .keys()
                .chain(expectations.category(Category::Update).keys()),
        );
        let expected_deleted: Vec<DocId> = expectations.category(Category::Delete).keys().cloned().collect();

        let mut expected_parts = Vec::new();
        if !expected_updated.is_empty() {
            expected_parts.push(format!("to update documents {}", render_ids(&expected_updated)));
        }
        if !expected_deleted.is_empty() {
            expected_parts.push(format!("to delete documents {}", render_ids(&expected_deleted)));
        }

        let reconciliation = self.reconciliation;
        let missed_updated = unique(
            reconciliation
                .missed(Category::Reindex)
                .iter()
                .chain(reconciliation.missed(Category::Update)),
        );
        let missed_deleted = unique(reconciliation.missed(Category::Delete));

        let mut missed_parts = Vec::new();
        if !missed_updated.is_empty() {
            missed_parts.push(format!("{} was updated", render_ids(&missed_updated)));
        }
        if !missed_deleted.is_empty() {
            missed_parts.push(format!("{} was deleted", render_ids(&missed_deleted)));
        }

        out.push_str(&format!(
            "Expected index `{}` {} only, but {} also.\n",
            self.index,
            expected_parts.join(" and "),
            missed_parts.join(" and ")
        ));
    }

    fn render_observed(&self, out: &mut String) {
        let mut reindexed = Vec::new();
        let mut updated = Vec::new();
        let mut deleted = Vec::new();
        for operation in self.observed {
            match operation {
                ObservedOperation::Index { id, data } => reindexed.push(format!(
                    "  document id `{}` and attributes {}\n",
                    id,
                    render_attributes(data)
                )),
                ObservedOperation::Update { id, payload, .. } => updated.push(format!(
                    "  document id `{}` and attributes {}\n",
                    id, payload
                )),
                ObservedOperation::Delete { id } => deleted.push(format!("  document id `{}`\n", id)),
            }
        }

        for (title, lines) in [
            ("Actually reindexed documents:\n", reindexed),
            ("Actually updated documents:\n", updated),
            ("Actually deleted documents:\n", deleted),
        ] {
            if !lines.is_empty() {
                out.push_str(title);
                for line in lines {
                    out.push_str(&line);
                }
            }
        }
    }
}

fn render_verdict(out: &mut String, verdict: &Verdict) {
    let past = verdict.category.past_tense();
    let expectation = &verdict.expectation;
    let observation = &verdict.observation;

    out.push_str(&format!("Expected document with id `{}` to be {}", verdict.id, past));

    if observation.real_count == 0 {
        out.push_str(", but it was not\n");
        return;
    }

    if verdict.category == Category::Delete {
        match expectation.expected_count {
            Some(expected) => out.push_str(&format!(
                "\n   {} times, but was deleted {} times",
                expected, observation.real_count
            )),
            None => out.push_str(", but it was not"),
        }
        out.push('\n');
        return;
    }

    if let Some(expected) = expectation.expected_count {
        if !verdict.match_count {
            out.push_str(&format!(
                "\n   {} times, but was {} {} times",
                expected, past, observation.real_count
            ));
        }
    }

    if !expectation.expected_attributes.is_empty()
        && !attributes_match(&expectation.expected_attributes, &observation.real_attributes)
    {
        out.push_str(&format!(
            "\n   with {}, but it was {} with {}",
            render_attributes(&expectation.expected_attributes),
            past,
            render_attributes(&observation.real_attributes)
        ));
    }

    if verdict.only_keys_ok == Some(false) {
        out.push_str(&format!(
            "\n   only fields {} should be updated, but got {}",
            render_keys(&expectation.expected_only_attributes),
            render_keys(&observation.real_attributes)
        ));
    }
    if verdict.only_values_ok == Some(false) {
        out.push_str(&format!(
            "\n   with_only {}, but it was updated with {}",
            render_attributes(&expectation.expected_only_attributes),
            render_attributes(&observation.real_attributes)
        ));
    }

    out.push('\n');
}
