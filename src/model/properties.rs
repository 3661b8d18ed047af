use super::{Attributes, ElementRef, ExpressId, Value};
use serde::Serialize;
use std::collections::BTreeMap;

/// Short description of a record reached through a relationship.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedObject {
    pub id: ExpressId,
    pub type_tag: String,
    pub name: Option<String>,
}

/// A property set (`IFCPROPERTYSET`) or quantity set (`IFCELEMENTQUANTITY`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyGroup {
    pub id: ExpressId,
    pub name: String,
    pub properties: BTreeMap<String, Value>,
}

/// Everything the inspector knows about one element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementProperties {
    pub element: ElementRef,
    #[serde(rename = "type")]
    pub type_tag: String,
    pub attributes: Attributes,
    pub property_sets: Vec<PropertyGroup>,
    pub type_object: Option<RelatedObject>,
    pub container: Option<RelatedObject>,
    pub materials: Vec<RelatedObject>,
}

impl ElementProperties {
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.attributes.get("Name").and_then(Value::as_text)
    }

    /// Looks a property up by name across all property sets.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.property_sets
            .iter()
            .find_map(|group| group.properties.get(name))
    }
}
