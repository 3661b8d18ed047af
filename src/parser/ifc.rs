use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::engine::ParsingEngine;
use crate::error::{ParseError, ViewerError};
use crate::model::{
    Attributes, ElementProperties, ElementRecord, ElementRef, ExpressId, ModelHandle,
    PropertyGroup, RelatedObject, Value,
};
use crate::parser::geometry::tessellate;
use crate::parser::schema::attribute_name;
use crate::parser::step::{StepEntity, StepFile};
use crate::scene::GeometryFragment;

/// Handles are unique for the whole process, not per engine.
static NEXT_HANDLE: AtomicU32 = AtomicU32::new(0);

/// Relationship lookups built once when a model is opened.
#[derive(Debug, Default)]
struct Relations {
    /// element -> spatial structure (storey, space, ...)
    container: HashMap<ExpressId, ExpressId>,
    /// element -> type object
    type_object: HashMap<ExpressId, ExpressId>,
    /// element -> property / quantity set definitions
    definitions: HashMap<ExpressId, Vec<ExpressId>>,
    /// element -> material selects
    materials: HashMap<ExpressId, Vec<ExpressId>>,
}

impl Relations {
    fn build(step: &StepFile) -> Self {
        let mut relations = Relations::default();

        // All four relationships list related objects at index 4 and the
        // relating side at index 5.
        for rel in step.entities() {
            let (Some(related), Some(relating)) = (
                rel.values.get(4).map(Value::references),
                rel.values.get(5).and_then(Value::as_reference),
            ) else {
                continue;
            };

            match rel.entity_type.as_str() {
                "IFCRELCONTAINEDINSPATIALSTRUCTURE" => {
                    for id in related {
                        relations.container.insert(id, relating);
                    }
                }
                "IFCRELDEFINESBYTYPE" => {
                    for id in related {
                        relations.type_object.insert(id, relating);
                    }
                }
                "IFCRELDEFINESBYPROPERTIES" => {
                    for id in related {
                        relations.definitions.entry(id).or_default().push(relating);
                    }
                }
                "IFCRELASSOCIATESMATERIAL" => {
                    for id in related {
                        relations.materials.entry(id).or_default().push(relating);
                    }
                }
                _ => {}
            }
        }

        relations
    }
}

#[derive(Debug)]
struct OpenedModel {
    step: StepFile,
    relations: Relations,
}

/// In-process parsing engine backed by the STEP reader.
#[derive(Debug, Default)]
pub struct StepEngine {
    models: RwLock<HashMap<ModelHandle, Arc<OpenedModel>>>,
}

impl StepEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads and opens an IFC file from disk.
    pub fn open_file<P: AsRef<Path>>(&self, path: P) -> Result<ModelHandle, ParseError> {
        let bytes = std::fs::read(&path).map_err(|source| ParseError::FileRead {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        self.open(&bytes)
    }

    /// Number of models currently open.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn model(&self, handle: ModelHandle) -> Result<Arc<OpenedModel>, ViewerError> {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&handle)
            .cloned()
            .ok_or(ViewerError::ModelNotOpen { handle })
    }
}

impl ParsingEngine for StepEngine {
    fn open(&self, bytes: &[u8]) -> Result<ModelHandle, ParseError> {
        let content = String::from_utf8_lossy(bytes);
        let step = StepFile::parse(&content)?;
        let relations = Relations::build(&step);

        let handle = ModelHandle(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed));
        info!(%handle, schema = %step.schema, lines = step.len(), "opened model");

        self.models
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, Arc::new(OpenedModel { step, relations }));
        Ok(handle)
    }

    fn is_open(&self, handle: ModelHandle) -> bool {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&handle)
    }

    fn close(&self, handle: ModelHandle) {
        let removed = self
            .models
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle);
        if removed.is_some() {
            info!(%handle, "closed model");
        }
    }

    fn enumerate_lines(&self, handle: ModelHandle) -> Result<Vec<ExpressId>, ViewerError> {
        let model = self.model(handle)?;
        Ok(model.step.entities().map(|e| e.id).collect())
    }

    fn get_line(&self, handle: ModelHandle, id: ExpressId) -> Result<ElementRecord, ViewerError> {
        let model = self.model(handle)?;
        let entity = model
            .step
            .get_entity(id)
            .ok_or(ViewerError::ElementNotFound {
                element: ElementRef::new(handle, id),
            })?;
        Ok(to_record(entity))
    }

    fn get_element_type(&self, handle: ModelHandle, id: ExpressId) -> Result<String, ViewerError> {
        let model = self.model(handle)?;
        model
            .step
            .get_entity(id)
            .map(|e| e.entity_type.clone())
            .ok_or(ViewerError::ElementNotFound {
                element: ElementRef::new(handle, id),
            })
    }

    async fn get_properties(&self, element: ElementRef) -> Result<ElementProperties, ViewerError> {
        let model = self.model(element.model)?;
        let entity = model
            .step
            .get_entity(element.id)
            .ok_or(ViewerError::ElementNotFound { element })?;
        Ok(collect_properties(&model, element, entity))
    }

    fn geometry(&self, handle: ModelHandle) -> Result<Vec<GeometryFragment>, ViewerError> {
        let model = self.model(handle)?;
        let fragments = tessellate(&model.step, handle);
        debug!(%handle, fragments = fragments.len(), "tessellated model");
        Ok(fragments)
    }
}

pub(crate) fn to_record(entity: &StepEntity) -> ElementRecord {
    let mut attributes = Attributes::with_capacity(entity.values.len());
    for (index, value) in entity.values.iter().enumerate() {
        attributes.push(attribute_name(&entity.entity_type, index), value.clone());
    }
    ElementRecord {
        id: entity.id,
        type_tag: entity.entity_type.clone(),
        attributes,
    }
}

fn related(step: &StepFile, id: ExpressId) -> Option<RelatedObject> {
    let entity = step.get_entity(id)?;
    let record = to_record(entity);
    Some(RelatedObject {
        id,
        name: record
            .name()
            .or_else(|| record.attributes.get("LayerSetName").and_then(Value::as_text))
            .map(str::to_string),
        type_tag: record.type_tag,
    })
}

fn collect_properties(
    model: &OpenedModel,
    element: ElementRef,
    entity: &StepEntity,
) -> ElementProperties {
    let step = &model.step;
    let relations = &model.relations;
    let id = element.id;

    let mut definitions = relations.definitions.get(&id).cloned().unwrap_or_default();

    let type_object = relations.type_object.get(&id).copied();
    if let Some(type_id) = type_object {
        // Type objects carry their own sets in HasPropertySets (index 5)
        if let Some(type_entity) = step.get_entity(type_id) {
            if let Some(sets) = type_entity.values.get(5) {
                definitions.extend(sets.references());
            }
        }
    }

    let property_sets = definitions
        .iter()
        .filter_map(|def| property_group(step, *def))
        .collect();

    let mut materials = Vec::new();
    for select in relations.materials.get(&id).into_iter().flatten() {
        collect_materials(step, *select, &mut materials, 0);
    }

    ElementProperties {
        element,
        type_tag: entity.entity_type.clone(),
        attributes: to_record(entity).attributes,
        property_sets,
        type_object: type_object.and_then(|t| related(step, t)),
        container: relations
            .container
            .get(&id)
            .and_then(|c| related(step, *c)),
        materials,
    }
}

fn property_group(step: &StepFile, id: ExpressId) -> Option<PropertyGroup> {
    let set = step.get_entity(id)?;
    // (list index, value index within each member)
    let (members_at, value_at) = match set.entity_type.as_str() {
        "IFCPROPERTYSET" => (4, 2),
        "IFCELEMENTQUANTITY" => (5, 3),
        _ => return None,
    };

    let name = set
        .values
        .get(2)
        .and_then(Value::as_text)
        .map_or_else(|| format!("Set {id}"), str::to_string);

    let mut properties = BTreeMap::new();
    for member_id in set.values.get(members_at).map(Value::references).unwrap_or_default() {
        let Some(member) = step.get_entity(member_id) else {
            continue;
        };
        let Some(member_name) = member.values.first().and_then(Value::as_text) else {
            continue;
        };
        let value = member.values.get(value_at).cloned().unwrap_or(Value::Null);
        properties.insert(member_name.to_string(), value);
    }

    Some(PropertyGroup {
        id,
        name,
        properties,
    })
}

/// Flattens a material select down to its `IFCMATERIAL` records.
fn collect_materials(step: &StepFile, id: ExpressId, out: &mut Vec<RelatedObject>, depth: usize) {
    const MAX_DEPTH: usize = 8;
    if depth > MAX_DEPTH || out.iter().any(|m| m.id == id) {
        return;
    }
    let Some(entity) = step.get_entity(id) else {
        return;
    };

    let next: Vec<ExpressId> = match entity.entity_type.as_str() {
        "IFCMATERIAL" => {
            if let Some(material) = related(step, id) {
                out.push(material);
            }
            return;
        }
        "IFCMATERIALLAYERSETUSAGE" | "IFCMATERIALLAYER" | "IFCMATERIALPROFILESETUSAGE" => entity
            .values
            .first()
            .and_then(Value::as_reference)
            .into_iter()
            .collect(),
        "IFCMATERIALLAYERSET" | "IFCMATERIALLIST" => {
            entity.values.first().map(Value::references).unwrap_or_default()
        }
        "IFCMATERIALCONSTITUENTSET" => {
            entity.values.get(2).map(Value::references).unwrap_or_default()
        }
        "IFCMATERIALCONSTITUENT" => entity
            .values
            .get(2)
            .and_then(Value::as_reference)
            .into_iter()
            .collect(),
        _ => Vec::new(),
    };

    for child in next {
        collect_materials(step, child, out, depth + 1);
    }
}
