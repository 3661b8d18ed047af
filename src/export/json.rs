use crate::error::ExportError;
use crate::export::ModelSummary;
use crate::model::ElementProperties;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub fn export_types_json<P: AsRef<Path>>(
    summaries: &[ModelSummary],
    path: P,
) -> Result<(), ExportError> {
    let path_ref = path.as_ref();
    let json = serde_json::to_string_pretty(summaries)?;

    let mut file = File::create(path_ref).map_err(|source| ExportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;

    file.write_all(json.as_bytes())
        .map_err(|e| ExportError::WriteError {
            message: e.to_string(),
        })?;

    Ok(())
}

/// Inspector output, pretty-printed with two-space indentation.
pub fn properties_json(properties: &ElementProperties) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(properties)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attributes, ElementRef, ExpressId, ModelHandle, Value};
    use pretty_assertions::assert_eq;

    #[test]
    fn properties_render_references_and_nulls() {
        let mut attributes = Attributes::default();
        attributes.push("Name", Value::Text("Door".into()));
        attributes.push("ObjectPlacement", Value::Reference(ExpressId(12)));
        attributes.push("Tag", Value::Null);

        let props = ElementProperties {
            element: ElementRef::new(ModelHandle(1), ExpressId(7)),
            type_tag: "IFCDOOR".into(),
            attributes,
            property_sets: Vec::new(),
            type_object: None,
            container: None,
            materials: Vec::new(),
        };

        let value: serde_json::Value = serde_json::from_str(&properties_json(&props).unwrap()).unwrap();
        assert_eq!(value["type"], "IFCDOOR");
        assert_eq!(value["element"]["id"], 7);
        assert_eq!(value["element"]["model"], 1);
        assert_eq!(value["attributes"]["Name"], "Door");
        assert_eq!(value["attributes"]["ObjectPlacement"]["ref"], 12);
        assert!(value["attributes"]["Tag"].is_null());
    }
}
