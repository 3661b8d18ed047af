//! Tessellation of the common IFC body representations.
//!
//! Supported items: extruded area solids (rectangle, circle and polyline
//! profiles), triangulated and polygonal face sets, faceted breps and
//! surface models, mapped items, and the first operand of boolean results.
//! Polygons are fan-triangulated, which is exact for convex outlines and
//! close enough for picking otherwise.
//!
//! Output is in metres with Y up, one fragment per product. Every vertex
//! carries the express id of the product it belongs to.

use glam::{Mat4, Vec2, Vec3, Vec4};
use tracing::trace;

use crate::model::{ExpressId, ModelHandle, Value};
use crate::parser::step::{StepEntity, StepFile};
use crate::scene::GeometryFragment;

const MAX_DEPTH: usize = 32;
const CIRCLE_SEGMENTS: usize = 16;

/// IFC is Z up; the scene is Y up: (x, y, z) -> (x, z, -y).
const Z_UP_TO_Y_UP: Mat4 = Mat4::from_cols(Vec4::X, Vec4::NEG_Z, Vec4::Y, Vec4::W);

/// Products that are never displayed.
const SKIPPED: &[&str] = &["IFCOPENINGELEMENT", "IFCOPENINGSTANDARDCASE", "IFCSPACE"];

/// Representation identifiers that do not describe the body.
const NON_BODY: &[&str] = &["Axis", "FootPrint", "Box", "Annotation", "Clearance"];

#[derive(Debug, Default)]
struct MeshBuilder {
    positions: Vec<Vec3>,
    faces: Vec<[u32; 3]>,
    ids: Vec<ExpressId>,
}

impl MeshBuilder {
    fn push_vertex(&mut self, point: Vec3, id: ExpressId) -> u32 {
        self.positions.push(point);
        self.ids.push(id);
        (self.positions.len() - 1) as u32
    }

    /// Fan-triangulates a planar polygon.
    fn add_polygon(&mut self, points: &[Vec3], transform: Mat4, id: ExpressId) {
        if points.len() < 3 {
            return;
        }
        let first = self.push_vertex(transform.transform_point3(points[0]), id);
        let mut prev = self.push_vertex(transform.transform_point3(points[1]), id);
        for point in &points[2..] {
            let next = self.push_vertex(transform.transform_point3(*point), id);
            self.faces.push([first, prev, next]);
            prev = next;
        }
    }

    fn finish(self, handle: ModelHandle) -> Option<GeometryFragment> {
        if self.faces.is_empty() {
            return None;
        }
        Some(GeometryFragment::for_model(
            handle,
            self.positions,
            self.faces,
            self.ids,
        ))
    }
}

/// Builds one fragment per product with body geometry, so each product
/// gets its own bounding box for ray culling.
#[must_use]
pub fn tessellate(step: &StepFile, handle: ModelHandle) -> Vec<GeometryFragment> {
    let scale = length_unit_scale(step);
    let to_scene = Z_UP_TO_Y_UP * Mat4::from_scale(Vec3::splat(scale));
    let mut fragments = Vec::new();

    for product in step.entities() {
        if SKIPPED.contains(&product.entity_type.as_str()) {
            continue;
        }
        let Some(shape) = reference_to(step, product.values.get(6), "IFCPRODUCTDEFINITIONSHAPE")
        else {
            continue;
        };
        let placement = product
            .values
            .get(5)
            .and_then(Value::as_reference)
            .map_or(Mat4::IDENTITY, |p| local_placement(step, p, 0));
        let transform = to_scene * placement;

        let mut mesh = MeshBuilder::default();
        for rep in list_refs(shape.values.get(2)) {
            let Some(rep) = step.get_entity(rep) else {
                continue;
            };
            let identifier = rep.values.get(1).and_then(Value::as_text).unwrap_or("");
            if NON_BODY.contains(&identifier) {
                continue;
            }
            for item in list_refs(rep.values.get(3)) {
                add_item(step, item, transform, product.id, &mut mesh, 0);
            }
        }
        match mesh.finish(handle) {
            Some(fragment) => fragments.push(fragment),
            None => {
                trace!(id = %product.id, ty = %product.entity_type, "no supported body geometry");
            }
        }
    }

    fragments
}

fn list_refs(value: Option<&Value>) -> Vec<ExpressId> {
    value.map(Value::references).unwrap_or_default()
}

fn reference_to<'a>(
    step: &'a StepFile,
    value: Option<&Value>,
    entity_type: &str,
) -> Option<&'a StepEntity> {
    let entity = step.get_entity(value?.as_reference()?)?;
    (entity.entity_type == entity_type).then_some(entity)
}

fn reals(value: Option<&Value>) -> Vec<f32> {
    value
        .and_then(Value::as_list)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_real)
                .map(|f| f as f32)
                .collect()
        })
        .unwrap_or_default()
}

fn vec3_from(coords: &[f32]) -> Option<Vec3> {
    match coords {
        [x, y] => Some(Vec3::new(*x, *y, 0.0)),
        [x, y, z, ..] => Some(Vec3::new(*x, *y, *z)),
        _ => None,
    }
}

/// `IFCCARTESIANPOINT` or `IFCDIRECTION` coordinates.
fn point(step: &StepFile, id: Option<ExpressId>) -> Option<Vec3> {
    let entity = step.get_entity(id?)?;
    vec3_from(&reals(entity.values.first()))
}

fn basis(z: Vec3, x_hint: Vec3, origin: Vec3) -> Mat4 {
    let z = z.try_normalize().unwrap_or(Vec3::Z);
    let x = (x_hint - z * x_hint.dot(z))
        .try_normalize()
        .unwrap_or_else(|| z.any_orthonormal_vector());
    let y = z.cross(x);
    Mat4::from_cols(x.extend(0.0), y.extend(0.0), z.extend(0.0), origin.extend(1.0))
}

/// `IFCAXIS2PLACEMENT3D` or `IFCAXIS2PLACEMENT2D` as a matrix.
fn axis_placement(step: &StepFile, id: Option<ExpressId>) -> Mat4 {
    let Some(entity) = id.and_then(|id| step.get_entity(id)) else {
        return Mat4::IDENTITY;
    };
    let at = |i: usize| entity.values.get(i).and_then(Value::as_reference);
    let origin = point(step, at(0)).unwrap_or(Vec3::ZERO);

    match entity.entity_type.as_str() {
        "IFCAXIS2PLACEMENT3D" => basis(
            point(step, at(1)).unwrap_or(Vec3::Z),
            point(step, at(2)).unwrap_or(Vec3::X),
            origin,
        ),
        "IFCAXIS2PLACEMENT2D" => basis(Vec3::Z, point(step, at(1)).unwrap_or(Vec3::X), origin),
        _ => Mat4::IDENTITY,
    }
}

/// World matrix of an `IFCLOCALPLACEMENT`, following `PlacementRelTo`.
fn local_placement(step: &StepFile, id: ExpressId, depth: usize) -> Mat4 {
    if depth > MAX_DEPTH {
        return Mat4::IDENTITY;
    }
    let Some(entity) = step.get_entity(id) else {
        return Mat4::IDENTITY;
    };
    if entity.entity_type != "IFCLOCALPLACEMENT" {
        return Mat4::IDENTITY;
    }
    let parent = entity
        .values
        .first()
        .and_then(Value::as_reference)
        .map_or(Mat4::IDENTITY, |p| local_placement(step, p, depth + 1));
    let relative = axis_placement(step, entity.values.get(1).and_then(Value::as_reference));
    parent * relative
}

fn add_item(
    step: &StepFile,
    id: ExpressId,
    transform: Mat4,
    owner: ExpressId,
    mesh: &mut MeshBuilder,
    depth: usize,
) {
    if depth > MAX_DEPTH {
        return;
    }
    let Some(item) = step.get_entity(id) else {
        return;
    };

    match item.entity_type.as_str() {
        "IFCEXTRUDEDAREASOLID" => add_extrusion(step, item, transform, owner, mesh),
        "IFCTRIANGULATEDFACESET" => {
            let coords = coordinate_list(step, item.values.first());
            let pn = item.values.get(4).map(integer_list).unwrap_or_default();
            for triangle in item.values.get(3).and_then(Value::as_list).unwrap_or_default() {
                let polygon = indexed_points(&coords, &integer_list(triangle), &pn);
                mesh.add_polygon(&polygon, transform, owner);
            }
        }
        "IFCPOLYGONALFACESET" => {
            let coords = coordinate_list(step, item.values.first());
            let pn = item.values.get(3).map(integer_list).unwrap_or_default();
            for face in list_refs(item.values.get(2)) {
                let Some(face) = step.get_entity(face) else {
                    continue;
                };
                let indices = face.values.first().map(integer_list).unwrap_or_default();
                mesh.add_polygon(&indexed_points(&coords, &indices, &pn), transform, owner);
            }
        }
        "IFCFACETEDBREP" => {
            if let Some(shell) = item.values.first().and_then(Value::as_reference) {
                add_shell(step, shell, transform, owner, mesh);
            }
        }
        "IFCFACEBASEDSURFACEMODEL" | "IFCSHELLBASEDSURFACEMODEL" => {
            for shell in list_refs(item.values.first()) {
                add_shell(step, shell, transform, owner, mesh);
            }
        }
        "IFCMAPPEDITEM" => add_mapped_item(step, item, transform, owner, mesh, depth),
        "IFCBOOLEANRESULT" | "IFCBOOLEANCLIPPINGRESULT" => {
            // Voids and clippings are ignored; the first operand is shown whole.
            if let Some(first) = item.values.get(1).and_then(Value::as_reference) {
                add_item(step, first, transform, owner, mesh, depth + 1);
            }
        }
        other => trace!(id = %id, ty = other, "unsupported representation item"),
    }
}

fn integer_list(value: &Value) -> Vec<usize> {
    value
        .as_list()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| match v {
                    Value::Integer(i) => usize::try_from(*i).ok(),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Points of an `IFCCARTESIANPOINTLIST3D` / `2D`.
fn coordinate_list(step: &StepFile, value: Option<&Value>) -> Vec<Vec3> {
    let Some(list) = value
        .and_then(Value::as_reference)
        .and_then(|id| step.get_entity(id))
    else {
        return Vec::new();
    };
    list.values
        .first()
        .and_then(Value::as_list)
        .unwrap_or_default()
        .iter()
        .filter_map(|p| vec3_from(&reals(Some(p))))
        .collect()
}

/// Resolves 1-based indices, through `pn` when it is present.
fn indexed_points(coords: &[Vec3], indices: &[usize], pn: &[usize]) -> Vec<Vec3> {
    indices
        .iter()
        .filter_map(|&i| {
            let i = if pn.is_empty() {
                i
            } else {
                *pn.get(i.checked_sub(1)?)?
            };
            coords.get(i.checked_sub(1)?).copied()
        })
        .collect()
}

fn add_shell(
    step: &StepFile,
    shell: ExpressId,
    transform: Mat4,
    owner: ExpressId,
    mesh: &mut MeshBuilder,
) {
    let Some(shell) = step.get_entity(shell) else {
        return;
    };
    for face in list_refs(shell.values.first()) {
        let Some(face) = step.get_entity(face) else {
            continue;
        };
        let bounds: Vec<&StepEntity> = list_refs(face.values.first())
            .into_iter()
            .filter_map(|b| step.get_entity(b))
            .collect();
        let Some(bound) = bounds
            .iter()
            .find(|b| b.entity_type == "IFCFACEOUTERBOUND")
            .or_else(|| bounds.first())
        else {
            continue;
        };
        let Some(loop_entity) = bound
            .values
            .first()
            .and_then(Value::as_reference)
            .and_then(|l| step.get_entity(l))
        else {
            continue;
        };
        let polygon: Vec<Vec3> = list_refs(loop_entity.values.first())
            .into_iter()
            .filter_map(|p| point(step, Some(p)))
            .collect();
        mesh.add_polygon(&polygon, transform, owner);
    }
}

fn add_mapped_item(
    step: &StepFile,
    item: &StepEntity,
    transform: Mat4,
    owner: ExpressId,
    mesh: &mut MeshBuilder,
    depth: usize,
) {
    let Some(source) = reference_to(step, item.values.first(), "IFCREPRESENTATIONMAP") else {
        return;
    };
    let origin = axis_placement(step, source.values.first().and_then(Value::as_reference));
    let target = item
        .values
        .get(1)
        .and_then(Value::as_reference)
        .and_then(|t| step.get_entity(t))
        .map_or(Mat4::IDENTITY, |t| transformation_operator(step, t));
    let transform = transform * target * origin;

    let Some(rep) = source
        .values
        .get(1)
        .and_then(Value::as_reference)
        .and_then(|r| step.get_entity(r))
    else {
        return;
    };
    for child in list_refs(rep.values.get(3)) {
        add_item(step, child, transform, owner, mesh, depth + 1);
    }
}

/// `IFCCARTESIANTRANSFORMATIONOPERATOR3D[NONUNIFORM]`:
/// (Axis1, Axis2, LocalOrigin, Scale, Axis3[, Scale2, Scale3]).
fn transformation_operator(step: &StepFile, entity: &StepEntity) -> Mat4 {
    let at = |i: usize| entity.values.get(i).and_then(Value::as_reference);
    let scale_at = |i: usize, default: f32| {
        entity
            .values
            .get(i)
            .and_then(Value::as_real)
            .map_or(default, |s| s as f32)
    };

    let x = point(step, at(0)).unwrap_or(Vec3::X).normalize_or_zero();
    let y = point(step, at(1)).unwrap_or(Vec3::Y).normalize_or_zero();
    let z = point(step, at(4)).unwrap_or(Vec3::Z).normalize_or_zero();
    let origin = point(step, at(2)).unwrap_or(Vec3::ZERO);
    let s1 = scale_at(3, 1.0);

    Mat4::from_cols(
        (x * s1).extend(0.0),
        (y * scale_at(5, s1)).extend(0.0),
        (z * scale_at(6, s1)).extend(0.0),
        origin.extend(1.0),
    )
}

/// IFCEXTRUDEDAREASOLID: (SweptArea, Position, ExtrudedDirection, Depth).
fn add_extrusion(
    step: &StepFile,
    solid: &StepEntity,
    transform: Mat4,
    owner: ExpressId,
    mesh: &mut MeshBuilder,
) {
    let Some(outline) = solid
        .values
        .first()
        .and_then(Value::as_reference)
        .and_then(|p| profile_outline(step, p))
    else {
        trace!(id = %solid.id, "unsupported profile");
        return;
    };
    let Some(depth) = solid.values.get(3).and_then(Value::as_real) else {
        return;
    };
    let position = axis_placement(step, solid.values.get(1).and_then(Value::as_reference));
    let direction = point(step, solid.values.get(2).and_then(Value::as_reference))
        .unwrap_or(Vec3::Z)
        .normalize_or_zero();
    let offset = direction * depth as f32;
    let transform = transform * position;

    let bottom: Vec<Vec3> = outline.iter().map(|p| p.extend(0.0)).collect();
    let top: Vec<Vec3> = bottom.iter().map(|p| *p + offset).collect();

    let mut reversed = bottom.clone();
    reversed.reverse();
    mesh.add_polygon(&reversed, transform, owner);
    mesh.add_polygon(&top, transform, owner);

    for i in 0..bottom.len() {
        let j = (i + 1) % bottom.len();
        mesh.add_polygon(&[bottom[i], bottom[j], top[j], top[i]], transform, owner);
    }
}

/// Closed 2D outline of a profile definition, in profile coordinates.
fn profile_outline(step: &StepFile, id: ExpressId) -> Option<Vec<Vec2>> {
    let profile = step.get_entity(id)?;
    let real_at = |i: usize| profile.values.get(i).and_then(Value::as_real).map(|f| f as f32);

    let (local, position) = match profile.entity_type.as_str() {
        // (ProfileType, ProfileName, Position, XDim, YDim)
        "IFCRECTANGLEPROFILEDEF" => {
            let (hx, hy) = (real_at(3)? / 2.0, real_at(4)? / 2.0);
            let corners = vec![
                Vec2::new(-hx, -hy),
                Vec2::new(hx, -hy),
                Vec2::new(hx, hy),
                Vec2::new(-hx, hy),
            ];
            (corners, profile.values.get(2))
        }
        // (ProfileType, ProfileName, Position, Radius)
        "IFCCIRCLEPROFILEDEF" => {
            let radius = real_at(3)?;
            let circle = (0..CIRCLE_SEGMENTS)
                .map(|i| {
                    let angle = std::f32::consts::TAU * i as f32 / CIRCLE_SEGMENTS as f32;
                    Vec2::new(angle.cos(), angle.sin()) * radius
                })
                .collect();
            (circle, profile.values.get(2))
        }
        // (ProfileType, ProfileName, OuterCurve)
        "IFCARBITRARYCLOSEDPROFILEDEF" | "IFCARBITRARYPROFILEDEFWITHVOIDS" => {
            let curve = step.get_entity(profile.values.get(2)?.as_reference()?)?;
            (curve_points(step, curve)?, None)
        }
        _ => return None,
    };

    let placement = axis_placement(step, position.and_then(Value::as_reference));
    let outline: Vec<Vec2> = local
        .into_iter()
        .map(|p| placement.transform_point3(p.extend(0.0)).truncate())
        .collect();
    (outline.len() >= 3).then_some(outline)
}

fn curve_points(step: &StepFile, curve: &StepEntity) -> Option<Vec<Vec2>> {
    let mut points: Vec<Vec2> = match curve.entity_type.as_str() {
        "IFCPOLYLINE" => list_refs(curve.values.first())
            .into_iter()
            .filter_map(|p| point(step, Some(p)))
            .map(|p| p.truncate())
            .collect(),
        "IFCINDEXEDPOLYCURVE" => coordinate_list(step, curve.values.first())
            .into_iter()
            .map(|p| p.truncate())
            .collect(),
        _ => return None,
    };
    // Closed polylines repeat their first point
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    Some(points)
}

/// Metres per model length unit, from the project's unit assignment.
fn length_unit_scale(step: &StepFile) -> f32 {
    let assigned: Vec<ExpressId> = step
        .get_entities_by_type("IFCUNITASSIGNMENT")
        .first()
        .map(|ua| list_refs(ua.values.first()))
        .unwrap_or_default();

    let candidates: Vec<&StepEntity> = if assigned.is_empty() {
        step.entities().collect()
    } else {
        assigned.iter().filter_map(|id| step.get_entity(*id)).collect()
    };

    candidates
        .into_iter()
        .find_map(|unit| length_unit_factor(step, unit))
        .unwrap_or(1.0)
}

fn length_unit_factor(step: &StepFile, unit: &StepEntity) -> Option<f32> {
    let is_length = matches!(unit.values.get(1), Some(Value::Enum(t)) if t == "LENGTHUNIT");
    if !is_length {
        return None;
    }

    match unit.entity_type.as_str() {
        // (Dimensions, UnitType, Prefix, Name)
        "IFCSIUNIT" => Some(match unit.values.get(2) {
            Some(Value::Enum(prefix)) => match prefix.as_str() {
                "MILLI" => 0.001,
                "CENTI" => 0.01,
                "DECI" => 0.1,
                "KILO" => 1000.0,
                _ => 1.0,
            },
            _ => 1.0,
        }),
        // (Dimensions, UnitType, Name, ConversionFactor)
        "IFCCONVERSIONBASEDUNIT" => {
            let name = unit
                .values
                .get(2)
                .and_then(Value::as_text)
                .unwrap_or("")
                .to_ascii_uppercase();
            if name.contains("FOOT") {
                Some(0.3048)
            } else if name.contains("INCH") {
                Some(0.0254)
            } else {
                let measure = step.get_entity(unit.values.get(3)?.as_reference()?)?;
                measure.values.first()?.as_real().map(|f| f as f32)
            }
        }
        _ => None,
    }
}
