//! Declared expectations
//!
//! Declarations accumulate in an [`ExpectationSetBuilder`] and are frozen
//! into an [`ExpectationSet`] when evaluation starts. Reindex, update and
//! delete expectations live in independent maps keyed by [`DocId`], kept in
//! declaration order.

use indexcheck_core::{Attributes, Category, DocId, Error, Identify, Result};
use serde_json::Value;
use indexmap::IndexMap;

/// Options accepted by `and_reindex`, `and_update` and `and_delete`
///
/// `with_only` is only understood by updates; passing it elsewhere is a
/// usage error. Deletes carry no attributes, so `with` is ignored there.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocOptions {
    times: Option<usize>,
    with: Option<Value>,
    with_only: Option<Value>,
}

impl DocOptions {
    /// No count or attribute constraint
    pub fn new() -> Self {
        Self::default()
    }

    /// Require exactly `count` matching operations
    pub fn times(mut self, count: usize) -> Self {
        self.times = Some(count);
        self
    }

    /// Require the resulting document to contain these attributes
    pub fn with(mut self, attributes: Value) -> Self {
        self.with = Some(attributes);
        self
    }

    /// Require the update to touch exactly these attributes with these values
    pub fn with_only(mut self, attributes: Value) -> Self {
        self.with_only = Some(attributes);
        self
    }
}

/// What is expected of one document in one category
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expectation {
    /// Exact number of operations; `None` means at least one
    pub expected_count: Option<usize>,
    /// Attributes the resulting document must contain
    pub expected_attributes: Attributes,
    /// Exact attribute set an update must touch (updates only)
    pub expected_only_attributes: Attributes,
}

/// Frozen expectations for one evaluation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpectationSet {
    reindex: IndexMap<DocId, Expectation>,
    update: IndexMap<DocId, Expectation>,
    delete: IndexMap<DocId, Expectation>,
    only_mode: bool,
    no_refresh_required: bool,
    upsert_required: bool,
}

impl ExpectationSet {
    /// Expectations of one category, in declaration order
    pub fn category(&self, category: Category) -> &IndexMap<DocId, Expectation> {
        match category {
            Category::Reindex => &self.reindex,
            Category::Update => &self.update,
            Category::Delete => &self.delete,
        }
    }

    /// Whether closed-world mode is active
    pub fn only_mode(&self) -> bool {
        self.only_mode
    }

    /// Whether batches must be sent with `refresh = false`
    pub fn no_refresh_required(&self) -> bool {
        self.no_refresh_required
    }

    /// Whether every partial update must carry the upsert marker
    pub fn upsert_required(&self) -> bool {
        self.upsert_required
    }

    /// Whether no document was declared in any category
    pub fn has_no_declarations(&self) -> bool {
        self.reindex.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }
}

/// Mutable accumulator behind the assertion chain
#[derive(Debug, Clone, Default)]
pub struct ExpectationSetBuilder {
    set: ExpectationSet,
}

impl ExpectationSetBuilder {
    /// Empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare documents in a category
    ///
    /// Re-declaring a document replaces its whole expectation, so options
    /// the new declaration leaves out fall back to their defaults. A
    /// replaced document keeps its original position. `with` is ignored on
    /// deletes. The builder is left untouched when the options are rejected.
    ///
    /// # Errors
    ///
    /// Returns a usage error if `with_only` is passed outside updates or an
    /// attribute option is not a JSON object.
    pub fn declare<I>(&mut self, category: Category, ids: I, options: DocOptions) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Identify,
    {
        let with = match options.with {
            Some(_) if category == Category::Delete => Attributes::new(),
            Some(value) => into_attributes("with", value)?,
            None => Attributes::new(),
        };
        let with_only = match options.with_only {
            Some(_) if category != Category::Update => {
                return Err(Error::UnsupportedOption {
                    option: "with_only",
                    category,
                })
            }
            Some(value) => into_attributes("with_only", value)?,
            None => Attributes::new(),
        };

        let expectation = Expectation {
            expected_count: options.times,
            expected_attributes: with,
            expected_only_attributes: with_only,
        };
        let target = self.category_mut(category);
        for id in ids {
            target.insert(id.doc_id(), expectation.clone());
        }
        Ok(())
    }

    /// Turn on closed-world mode
    ///
    /// # Errors
    ///
    /// Returns [`Error::OnlyWithoutDeclarations`] if nothing was declared yet.
    pub fn only(&mut self) -> Result<()> {
        if self.set.has_no_declarations() {
            return Err(Error::OnlyWithoutDeclarations);
        }
        self.set.only_mode = true;
        Ok(())
    }

    /// Require batches to be sent with `refresh = false`
    pub fn no_refresh(&mut self) {
        self.set.no_refresh_required = true;
    }

    /// Require partial updates to carry the upsert marker
    pub fn doc_as_upsert(&mut self) {
        self.set.upsert_required = true;
    }

    /// Freeze the declarations
    pub fn build(self) -> ExpectationSet {
        self.set
    }

    fn category_mut(&mut self, category: Category) -> &mut IndexMap<DocId, Expectation> {
        match category {
            Category::Reindex => &mut self.set.reindex,
            Category::Update => &mut self.set.update,
            Category::Delete => &mut self.set.delete,
        }
    }
}

fn into_attributes(option: &'static str, value: Value) -> Result<Attributes> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::AttributesNotAMap {
            option,
            found: other.to_string(),
        }),
    }
}
