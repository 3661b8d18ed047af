use super::ExpressId;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;

/// One attribute value of an IFC record.
///
/// Typed wrappers such as `IFCLABEL('x')` are unwrapped to their inner
/// value when parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Real(f64),
    Integer(i64),
    Boolean(bool),
    Enum(String),
    Reference(ExpressId),
    List(Vec<Value>),
    Null,
    Derived,
}

impl Value {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_reference(&self) -> Option<ExpressId> {
        match self {
            Value::Reference(id) => Some(*id),
            _ => None,
        }
    }

    /// Numeric value, accepting integers where a real is expected.
    #[must_use]
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            #[allow(clippy::cast_precision_loss)]
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// References held directly by a list value, in order.
    #[must_use]
    pub fn references(&self) -> Vec<ExpressId> {
        self.as_list()
            .map(|items| items.iter().filter_map(Value::as_reference).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null | Value::Derived)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) | Value::Enum(s) => f.write_str(s),
            Value::Real(r) => write!(f, "{r:.2}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Boolean(b) => f.write_str(if *b { "Yes" } else { "No" }),
            Value::Reference(id) => write!(f, "{id}"),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Null => f.write_str("-"),
            Value::Derived => f.write_str("*"),
        }
    }
}

// References serialize as `{"ref": 42}` so they stay distinguishable from
// plain integers in the inspector output.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Text(s) | Value::Enum(s) => serializer.serialize_str(s),
            Value::Real(r) => serializer.serialize_f64(*r),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Reference(id) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("ref", id)?;
                map.end()
            }
            Value::List(items) => items.serialize(serializer),
            Value::Null | Value::Derived => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn references_serialize_as_objects() {
        let value = Value::List(vec![
            Value::Reference(ExpressId(12)),
            Value::Integer(12),
            Value::Null,
        ]);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"[{"ref":12},12,null]"#);
    }

    #[test]
    fn list_references_skip_other_values() {
        let value = Value::List(vec![
            Value::Reference(ExpressId(3)),
            Value::Text("x".into()),
            Value::Reference(ExpressId(9)),
        ]);
        assert_eq!(value.references(), vec![ExpressId(3), ExpressId(9)]);
        assert!(Value::Text("x".into()).references().is_empty());
    }

    #[test]
    fn display_joins_lists() {
        let value = Value::List(vec![Value::Real(2.5), Value::Boolean(true)]);
        assert_eq!(value.to_string(), "2.50, Yes");
    }
}
