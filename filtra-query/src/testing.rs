//! In-memory model fixture for unit tests.

use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{FilterModel, RelatedModel};
use crate::relation::RelationJoin;

pub(crate) struct TestModel {
    name: String,
    fields: Vec<String>,
    operators: HashMap<String, Vec<String>>,
    relations: HashMap<String, RelatedModel>,
}

impl TestModel {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
            operators: HashMap::new(),
            relations: HashMap::new(),
        }
    }

    pub(crate) fn fields<const N: usize>(mut self, fields: [&str; N]) -> Self {
        self.fields.extend(fields.iter().map(|f| f.to_string()));
        self
    }

    pub(crate) fn restrict<const N: usize>(mut self, field: &str, operators: [&str; N]) -> Self {
        self.operators.insert(
            field.to_string(),
            operators.iter().map(|op| op.to_string()).collect(),
        );
        self
    }

    pub(crate) fn relation(
        mut self,
        name: &str,
        model: Arc<dyn FilterModel>,
        join: RelationJoin,
    ) -> Self {
        self.relations
            .insert(name.to_string(), RelatedModel::new(model, join));
        self
    }

    pub(crate) fn build(self) -> Arc<dyn FilterModel> {
        Arc::new(self)
    }
}

impl FilterModel for TestModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn available_fields(&self) -> &[String] {
        &self.fields
    }

    fn available_filters_for(&self, field: &str) -> Option<&[String]> {
        self.operators.get(field).map(Vec::as_slice)
    }

    fn relation(&self, name: &str) -> Option<RelatedModel> {
        self.relations.get(name).cloned()
    }
}
