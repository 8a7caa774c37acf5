use serde_json::{Map, Value};

/// One rendered row: a fixed source field and the name the user wants it
/// renamed to. An empty target keeps the original name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MappingEntry {
    source: String,
    target: String,
}

impl MappingEntry {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

/// The rows currently rendered in the mapping area.
///
/// Sources always mirror the last applied field list, in order; only
/// targets change between renders.
#[derive(Clone, Debug, Default)]
pub struct MappingList {
    rows: Vec<MappingEntry>,
}

impl MappingList {
    /// Drops every existing row and builds one empty-target row per field.
    pub fn render(&mut self, fields: &[String]) {
        self.rows.clear();
        self.rows.extend(fields.iter().map(|f| MappingEntry {
            source: f.clone(),
            target: String::new(),
        }));
    }

    pub fn rows(&self) -> &[MappingEntry] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn set_target(&mut self, index: usize, target: impl Into<String>) -> bool {
        match self.rows.get_mut(index) {
            Some(row) => {
                row.target = target.into();
                true
            }
            None => false,
        }
    }

    /// Index of the first row rendered for `source`.
    pub fn position(&self, source: &str) -> Option<usize> {
        self.rows.iter().position(|r| r.source == source)
    }

    /// Source -> target for every row with a non-empty target, in row order.
    pub fn collect(&self) -> Map<String, Value> {
        self.rows
            .iter()
            .filter(|r| !r.target.is_empty())
            .map(|r| (r.source.clone(), Value::String(r.target.clone())))
            .collect()
    }

    pub fn to_json(&self) -> String {
        Value::Object(self.collect()).to_string()
    }
}
