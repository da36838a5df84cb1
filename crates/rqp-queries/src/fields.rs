//! Field selection
//!
//! Columns requested through the reserved `fields` key (`fields=id,email`).
//! An empty selection renders `SELECT *`.

/// Ordered set of selected columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelection {
    fields: Vec<String>,
}

impl FieldSelection {
    pub fn new() -> Self {
        Self { fields: vec![] }
    }

    /// Add a column; duplicates are ignored
    pub fn add(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        if !self.contains(&name) {
            self.fields.push(name);
        }
        self
    }

    /// Add a column (builder pattern)
    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.add(name);
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(String::as_str).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn remove(&mut self, name: &str) {
        self.fields.retain(|f| f != name);
    }

    pub fn rename(&mut self, from: &str, to: &str) {
        for field in &mut self.fields {
            if field == from {
                *field = to.to_string();
            }
        }
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// `SELECT a, b`, or `SELECT *` when nothing was selected
    pub fn select(&self) -> String {
        if self.fields.is_empty() {
            "SELECT *".to_string()
        } else {
            format!("SELECT {}", self.fields.join(", "))
        }
    }
}
