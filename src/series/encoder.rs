//! Disease name <-> dense integer id mapping.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::IncidenceRecord;

/// Label encoder over disease names.
///
/// Ids are positions in the sorted list of unique names, so the same set of
/// names always produces the same ids regardless of row order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseEncoder {
    classes: Vec<String>,
}

impl DiseaseEncoder {
    pub fn fit<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let unique: BTreeSet<&str> = names.into_iter().collect();
        Self {
            classes: unique.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn from_records(records: &[IncidenceRecord]) -> Self {
        Self::fit(records.iter().map(|r| r.disease.as_str()))
    }

    pub fn encode(&self, name: &str) -> Option<usize> {
        self.classes.binary_search_by(|c| c.as_str().cmp(name)).ok()
    }

    pub fn decode(&self, id: usize) -> Option<&str> {
        self.classes.get(id).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
