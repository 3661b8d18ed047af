//! Attribute names for the IFC entities the viewer reads.
//!
//! Only the entities that show up in element inspection are listed. Records
//! of any other type get positional names (`Attribute0`, `Attribute1`, ...).

const ROOT: &[&str] = &["GlobalId", "OwnerHistory", "Name", "Description"];

const PRODUCT: &[&str] = &[
    "GlobalId",
    "OwnerHistory",
    "Name",
    "Description",
    "ObjectType",
    "ObjectPlacement",
    "Representation",
];

const ELEMENT: &[&str] = &[
    "GlobalId",
    "OwnerHistory",
    "Name",
    "Description",
    "ObjectType",
    "ObjectPlacement",
    "Representation",
    "Tag",
    "PredefinedType",
];

const DOOR_OR_WINDOW: &[&str] = &[
    "GlobalId",
    "OwnerHistory",
    "Name",
    "Description",
    "ObjectType",
    "ObjectPlacement",
    "Representation",
    "Tag",
    "OverallHeight",
    "OverallWidth",
    "PredefinedType",
    "OperationType",
    "UserDefinedOperationType",
];

const SPATIAL: &[&str] = &[
    "GlobalId",
    "OwnerHistory",
    "Name",
    "Description",
    "ObjectType",
    "ObjectPlacement",
    "Representation",
    "LongName",
    "CompositionType",
];

const STOREY: &[&str] = &[
    "GlobalId",
    "OwnerHistory",
    "Name",
    "Description",
    "ObjectType",
    "ObjectPlacement",
    "Representation",
    "LongName",
    "CompositionType",
    "Elevation",
];

const PROJECT: &[&str] = &[
    "GlobalId",
    "OwnerHistory",
    "Name",
    "Description",
    "ObjectType",
    "LongName",
    "Phase",
    "RepresentationContexts",
    "UnitsInContext",
];

const ELEMENT_TYPE: &[&str] = &[
    "GlobalId",
    "OwnerHistory",
    "Name",
    "Description",
    "ApplicableOccurrence",
    "HasPropertySets",
    "RepresentationMaps",
    "Tag",
    "ElementType",
    "PredefinedType",
];

const PROPERTY_SET: &[&str] = &["GlobalId", "OwnerHistory", "Name", "Description", "HasProperties"];

const ELEMENT_QUANTITY: &[&str] = &[
    "GlobalId",
    "OwnerHistory",
    "Name",
    "Description",
    "MethodOfMeasurement",
    "Quantities",
];

const SINGLE_VALUE: &[&str] = &["Name", "Description", "NominalValue", "Unit"];

const QUANTITY: &[&str] = &["Name", "Description", "Unit", "Value", "Formula"];

const REL_BY_PROPERTIES: &[&str] = &[
    "GlobalId",
    "OwnerHistory",
    "Name",
    "Description",
    "RelatedObjects",
    "RelatingPropertyDefinition",
];

const REL_BY_TYPE: &[&str] = &[
    "GlobalId",
    "OwnerHistory",
    "Name",
    "Description",
    "RelatedObjects",
    "RelatingType",
];

const REL_CONTAINED: &[&str] = &[
    "GlobalId",
    "OwnerHistory",
    "Name",
    "Description",
    "RelatedElements",
    "RelatingStructure",
];

const REL_MATERIAL: &[&str] = &[
    "GlobalId",
    "OwnerHistory",
    "Name",
    "Description",
    "RelatedObjects",
    "RelatingMaterial",
];

const MATERIAL: &[&str] = &["Name", "Description", "Category"];

const MATERIAL_LAYER: &[&str] = &[
    "Material",
    "LayerThickness",
    "IsVentilated",
    "Name",
    "Description",
    "Category",
    "Priority",
];

const MATERIAL_LAYER_SET: &[&str] = &["MaterialLayers", "LayerSetName", "Description"];

const MATERIAL_LAYER_SET_USAGE: &[&str] = &[
    "ForLayerSet",
    "LayerSetDirection",
    "DirectionSense",
    "OffsetFromReferenceLine",
    "ReferenceExtent",
];

const MATERIAL_LIST: &[&str] = &["Materials"];

/// Schema-ordered attribute names for `type_tag`, if the entity is known.
#[must_use]
pub fn attribute_names(type_tag: &str) -> Option<&'static [&'static str]> {
    let names = match type_tag {
        "IFCDOOR" | "IFCWINDOW" => DOOR_OR_WINDOW,
        "IFCWALL" | "IFCWALLSTANDARDCASE" | "IFCSLAB" | "IFCCOLUMN" | "IFCBEAM" | "IFCROOF"
        | "IFCSTAIR" | "IFCSTAIRFLIGHT" | "IFCRAILING" | "IFCCOVERING" | "IFCCURTAINWALL"
        | "IFCPLATE" | "IFCMEMBER" | "IFCFURNISHINGELEMENT" | "IFCBUILDINGELEMENTPROXY"
        | "IFCFOOTING" | "IFCRAMP" | "IFCSANITARYTERMINAL" | "IFCFLOWTERMINAL"
        | "IFCOPENINGELEMENT" => ELEMENT,
        "IFCBUILDINGSTOREY" => STOREY,
        "IFCSITE" | "IFCBUILDING" | "IFCSPACE" => SPATIAL,
        "IFCPROJECT" => PROJECT,
        "IFCWALLTYPE" | "IFCSLABTYPE" | "IFCDOORTYPE" | "IFCWINDOWTYPE" | "IFCCOLUMNTYPE"
        | "IFCBEAMTYPE" | "IFCFURNITURETYPE" | "IFCCOVERINGTYPE" | "IFCRAILINGTYPE" => ELEMENT_TYPE,
        "IFCPROPERTYSET" => PROPERTY_SET,
        "IFCELEMENTQUANTITY" => ELEMENT_QUANTITY,
        "IFCPROPERTYSINGLEVALUE" => SINGLE_VALUE,
        "IFCQUANTITYLENGTH" | "IFCQUANTITYAREA" | "IFCQUANTITYVOLUME" | "IFCQUANTITYCOUNT"
        | "IFCQUANTITYWEIGHT" | "IFCQUANTITYTIME" => QUANTITY,
        "IFCRELDEFINESBYPROPERTIES" => REL_BY_PROPERTIES,
        "IFCRELDEFINESBYTYPE" => REL_BY_TYPE,
        "IFCRELCONTAINEDINSPATIALSTRUCTURE" => REL_CONTAINED,
        "IFCRELASSOCIATESMATERIAL" => REL_MATERIAL,
        "IFCMATERIAL" => MATERIAL,
        "IFCMATERIALLAYER" => MATERIAL_LAYER,
        "IFCMATERIALLAYERSET" => MATERIAL_LAYER_SET,
        "IFCMATERIALLAYERSETUSAGE" => MATERIAL_LAYER_SET_USAGE,
        "IFCMATERIALLIST" => MATERIAL_LIST,
        "IFCOPENINGSTANDARDCASE" | "IFCANNOTATION" | "IFCGRID" => PRODUCT,
        "IFCOWNERHISTORY" => return None,
        _ if type_tag.starts_with("IFCREL") => ROOT,
        _ => return None,
    };
    Some(names)
}

/// Name of the attribute at `index` for a record of `type_tag`.
#[must_use]
pub fn attribute_name(type_tag: &str, index: usize) -> String {
    attribute_names(type_tag)
        .and_then(|names| names.get(index))
        .map_or_else(|| format!("Attribute{index}"), |name| (*name).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_names_follow_schema_order() {
        assert_eq!(attribute_name("IFCWALL", 2), "Name");
        assert_eq!(attribute_name("IFCWALL", 7), "Tag");
        assert_eq!(attribute_name("IFCDOOR", 8), "OverallHeight");
        assert_eq!(attribute_name("IFCBUILDINGSTOREY", 9), "Elevation");
    }

    #[test]
    fn unknown_entities_get_positional_names() {
        assert_eq!(attribute_name("IFCCARTESIANPOINT", 0), "Attribute0");
        assert_eq!(attribute_name("IFCWALL", 20), "Attribute20");
    }

    #[test]
    fn relationships_share_the_root_prefix() {
        assert_eq!(attribute_name("IFCRELAGGREGATES", 0), "GlobalId");
        assert_eq!(attribute_name("IFCRELAGGREGATES", 4), "Attribute4");
    }
}
