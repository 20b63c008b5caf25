use glam::Vec3;
use serde::{Deserialize, Serialize};

/// What a named value holds.
///
/// Serialized adjacently tagged: `{"kind": "vector3", "value": [1, 2, 3]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum NamedValueKind {
    Vector3(Vec3),
    Float(f32),
    /// Formula text, parsed lazily whenever a compile references it.
    SubFormula(String),
}

impl NamedValueKind {
    /// Kind for a value first seen by name: `f...` is a float, `s...` a sub-formula, anything
    /// else a vector. Case-insensitive; new values start at zero or empty.
    pub fn infer(name: &str) -> Self {
        match name.chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('f') => Self::Float(0.0),
            Some('s') => Self::SubFormula(String::new()),
            _ => Self::Vector3(Vec3::ZERO),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
    #[serde(flatten)]
    pub kind: NamedValueKind,
}

impl NamedValue {
    pub fn new(name: impl Into<String>, kind: NamedValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Named values keyed by exact name, kept sorted for binary search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<NamedValue>", into = "Vec<NamedValue>")]
pub struct NamedValues {
    entries: Vec<NamedValue>,
}

impl NamedValues {
    pub fn new() -> Self {
        Self::default()
    }

    fn search(&self, name: &str) -> Result<usize, usize> {
        self.entries
            .binary_search_by(|e| e.name.as_str().cmp(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&NamedValue> {
        self.search(name).ok().map(|i| &self.entries[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut NamedValue> {
        self.search(name).ok().map(|i| &mut self.entries[i])
    }

    /// Insert or replace; returns the previous kind when `name` existed.
    pub fn insert(&mut self, name: impl Into<String>, kind: NamedValueKind) -> Option<NamedValueKind> {
        let name = name.into();
        match self.search(&name) {
            Ok(i) => Some(std::mem::replace(&mut self.entries[i].kind, kind)),
            Err(i) => {
                self.entries.insert(i, NamedValue { name, kind });
                None
            }
        }
    }

    pub fn set_vector(&mut self, name: impl Into<String>, v: Vec3) -> Option<NamedValueKind> {
        self.insert(name, NamedValueKind::Vector3(v))
    }

    pub fn set_float(&mut self, name: impl Into<String>, x: f32) -> Option<NamedValueKind> {
        self.insert(name, NamedValueKind::Float(x))
    }

    pub fn set_sub_formula(
        &mut self,
        name: impl Into<String>,
        text: impl Into<String>,
    ) -> Option<NamedValueKind> {
        self.insert(name, NamedValueKind::SubFormula(text.into()))
    }

    /// Existing entry for `name`, or a new one whose kind is inferred from the name.
    pub fn get_or_insert_inferred(&mut self, name: &str) -> &NamedValue {
        let i = match self.search(name) {
            Ok(i) => i,
            Err(i) => {
                tracing::debug!(name, "creating named value on first reference");
                self.entries
                    .insert(i, NamedValue::new(name, NamedValueKind::infer(name)));
                i
            }
        };
        &self.entries[i]
    }

    pub fn remove(&mut self, name: &str) -> Option<NamedValue> {
        self.search(name).ok().map(|i| self.entries.remove(i))
    }

    pub fn retain(&mut self, f: impl FnMut(&NamedValue) -> bool) {
        self.entries.retain(f);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NamedValue> {
        self.entries.iter()
    }
}

impl From<Vec<NamedValue>> for NamedValues {
    /// Sorts by name; on duplicates the last entry wins.
    fn from(mut entries: Vec<NamedValue>) -> Self {
        entries.reverse();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries.dedup_by(|later, first| later.name == first.name);
        Self { entries }
    }
}

impl From<NamedValues> for Vec<NamedValue> {
    fn from(values: NamedValues) -> Self {
        values.entries
    }
}

impl FromIterator<NamedValue> for NamedValues {
    fn from_iter<T: IntoIterator<Item = NamedValue>>(iter: T) -> Self {
        iter.into_iter().collect::<Vec<_>>().into()
    }
}

impl<'a> IntoIterator for &'a NamedValues {
    type Item = &'a NamedValue;
    type IntoIter = std::slice::Iter<'a, NamedValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/named.rs"]
mod tests;
