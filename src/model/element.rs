use super::{ExpressId, Value};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Named attributes of a record, in schema order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    entries: Vec<(String, Value)>,
}

impl Attributes {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.entries.push((name.into(), value));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Attribute by schema position, regardless of its name.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Value> {
        self.entries.get(index).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// One entity line of an IFC file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementRecord {
    pub id: ExpressId,
    pub type_tag: String,
    pub attributes: Attributes,
}

impl ElementRecord {
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.attributes.get("Name").and_then(Value::as_text)
    }

    #[must_use]
    pub fn global_id(&self) -> Option<&str> {
        self.attributes.get("GlobalId").and_then(Value::as_text)
    }
}
