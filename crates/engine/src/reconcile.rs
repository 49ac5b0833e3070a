//! Reconciliation of captured operations against expectations
//!
//! The captured log is scanned once. Every operation is booked against the
//! expectation of its category, or reported as missed when closed-world mode
//! is on and nothing was declared for it. Verdicts are computed only after
//! the whole log has been booked.
//!
//! Updates whose payload carries the upsert marker are booked as reindexes
//! using their partial document; they never take part in update or
//! `with_only` checks.

use crate::expectation::{Expectation, ExpectationSet};
use indexcheck_core::{attributes_match, Attributes, Category, DocId, ObservedOperation};
use std::collections::BTreeMap;
use tracing::debug;

/// What was observed for one declared document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observation {
    /// Number of matching operations
    pub real_count: usize,
    /// Attributes merged across matching operations, later keys win
    pub real_attributes: Attributes,
}

/// Outcome for one declared document in one category
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// Document identity
    pub id: DocId,
    /// Category the document was declared in
    pub category: Category,
    /// What was declared
    pub expectation: Expectation,
    /// What was observed
    pub observation: Observation,
    /// Count constraint holds
    pub match_count: bool,
    /// Attribute constraints hold (always true for deletes)
    pub match_attributes: bool,
    /// No key outside `with_only` was touched; `None` without `with_only`
    pub only_keys_ok: Option<bool>,
    /// `with_only` values match; `None` without `with_only`
    pub only_values_ok: Option<bool>,
}

impl Verdict {
    /// Whether this document satisfied every constraint
    pub fn passed(&self) -> bool {
        self.match_count && self.match_attributes
    }

    fn compute(id: DocId, category: Category, expectation: Expectation, observation: Observation) -> Self {
        let match_count = match expectation.expected_count {
            None => observation.real_count > 0,
            Some(expected) => observation.real_count == expected,
        };

        let mut only_keys_ok = None;
        let mut only_values_ok = None;
        let match_attributes = match category {
            Category::Delete => true,
            Category::Reindex | Category::Update => {
                let matches_with = expectation.expected_attributes.is_empty()
                    || attributes_match(&expectation.expected_attributes, &observation.real_attributes);

                if category == Category::Update && !expectation.expected_only_attributes.is_empty() {
                    let allowed = &expectation.expected_only_attributes;
                    let keys_ok = observation
                        .real_attributes
                        .keys()
                        .all(|key| allowed.contains_key(key));
                    let values_ok = attributes_match(allowed, &observation.real_attributes);
                    only_keys_ok = Some(keys_ok);
                    only_values_ok = Some(values_ok);
                    matches_with && keys_ok && values_ok
                } else {
                    matches_with
                }
            }
        };

        Verdict {
            id,
            category,
            expectation,
            observation,
            match_count,
            match_attributes,
            only_keys_ok,
            only_values_ok,
        }
    }
}

/// Result of reconciling one captured log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciliationResult {
    reindex: Vec<Verdict>,
    update: Vec<Verdict>,
    delete: Vec<Verdict>,
    missed_reindex: Vec<DocId>,
    missed_update: Vec<DocId>,
    missed_delete: Vec<DocId>,
}

impl ReconciliationResult {
    /// Verdicts of one category, ordered by id
    pub fn verdicts(&self, category: Category) -> &[Verdict] {
        match category {
            Category::Reindex => &self.reindex,
            Category::Update => &self.update,
            Category::Delete => &self.delete,
        }
    }

    /// Undeclared ids touched in one category under closed-world mode,
    /// once per offending operation
    pub fn missed(&self, category: Category) -> &[DocId] {
        match category {
            Category::Reindex => &self.missed_reindex,
            Category::Update => &self.missed_update,
            Category::Delete => &self.missed_delete,
        }
    }

    /// Whether closed-world mode caught any undeclared operation
    pub fn has_missed(&self) -> bool {
        !(self.missed_reindex.is_empty() && self.missed_update.is_empty() && self.missed_delete.is_empty())
    }

    /// Whether every declared document passed and nothing was missed
    pub fn all_matched(&self) -> bool {
        !self.has_missed()
            && self
                .reindex
                .iter()
                .chain(&self.update)
                .chain(&self.delete)
                .all(Verdict::passed)
    }

    /// Verdicts that failed, in reindex, update, delete order
    pub fn failures(&self) -> impl Iterator<Item = &Verdict> {
        self.reindex
            .iter()
            .chain(&self.update)
            .chain(&self.delete)
            .filter(|verdict| !verdict.passed())
    }
}

/// Matches captured operations against an [`ExpectationSet`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconciliationEngine;

impl ReconciliationEngine {
    /// Book every operation of `log` and compute per-document verdicts
    pub fn reconcile(log: &[ObservedOperation], expectations: &ExpectationSet) -> ReconciliationResult {
        let mut ledger = Ledger::new(expectations);

        for operation in log {
            match operation {
                ObservedOperation::Index { id, data } => ledger.book(Category::Reindex, id, Some(data)),
                ObservedOperation::Update {
                    id,
                    doc,
                    upsert: true,
                    ..
                } => {
                    debug!(
                        target: "indexcheck::engine",
                        id = %id,
                        "Booking upsert-flagged update as reindex"
                    );
                    ledger.book(Category::Reindex, id, Some(doc))
                }
                ObservedOperation::Update { id, doc, .. } => ledger.book(Category::Update, id, Some(doc)),
                ObservedOperation::Delete { id } => ledger.book(Category::Delete, id, None),
            }
        }

        ledger.finish(expectations)
    }
}

struct Ledger {
    only_mode: bool,
    observations: [BTreeMap<DocId, Observation>; 3],
    missed: [Vec<DocId>; 3],
}

impl Ledger {
    fn new(expectations: &ExpectationSet) -> Self {
        let seed = |category: Category| {
            expectations
                .category(category)
                .keys()
                .map(|id| (id.clone(), Observation::default()))
                .collect::<BTreeMap<_, _>>()
        };
        Ledger {
            only_mode: expectations.only_mode(),
            observations: [
                seed(Category::Reindex),
                seed(Category::Update),
                seed(Category::Delete),
            ],
            missed: [Vec::new(), Vec::new(), Vec::new()],
        }
    }

    fn slot(category: Category) -> usize {
        match category {
            Category::Reindex => 0,
            Category::Update => 1,
            Category::Delete => 2,
        }
    }

    fn book(&mut self, category: Category, id: &DocId, attributes: Option<&Attributes>) {
        let slot = Self::slot(category);
        match self.observations[slot].get_mut(id) {
            Some(observation) => {
                observation.real_count += 1;
                if let Some(attributes) = attributes {
                    for (key, value) in attributes {
                        observation.real_attributes.insert(key.clone(), value.clone());
                    }
                }
            }
            None if self.only_mode => {
                debug!(
                    target: "indexcheck::engine",
                    id = %id,
                    category = %category,
                    "Undeclared document touched in closed-world mode"
                );
                self.missed[slot].push(id.clone());
            }
            None => {}
        }
    }

    fn finish(self, expectations: &ExpectationSet) -> ReconciliationResult {
        let [reindex_obs, update_obs, delete_obs] = self.observations;
        let [missed_reindex, missed_update, missed_delete] = self.missed;

        let verdicts = |category: Category, mut observed: BTreeMap<DocId, Observation>| {
            expectations
                .category(category)
                .iter()
                .map(|(id, expectation)| {
                    let observation = observed.remove(id).unwrap_or_default();
                    Verdict::compute(id.clone(), category, expectation.clone(), observation)
                })
                .collect::<Vec<_>>()
        };

        ReconciliationResult {
            reindex: verdicts(Category::Reindex, reindex_obs),
            update: verdicts(Category::Update, update_obs),
            delete: verdicts(Category::Delete, delete_obs),
            missed_reindex,
            missed_update,
            missed_delete,
        }
    }
}
