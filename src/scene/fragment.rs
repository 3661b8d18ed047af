use glam::Vec3;

use super::raycast::{ray_triangle, Aabb, Ray};
use crate::model::{ExpressId, ModelHandle};

/// Indexed triangle surface.
///
/// Model fragments carry one express id per vertex; the id of a face is the
/// id of its first vertex. Helper geometry (grids, axes) has no ids and no
/// owning model.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryFragment {
    pub model: Option<ModelHandle>,
    pub positions: Vec<Vec3>,
    pub faces: Vec<[u32; 3]>,
    pub vertex_ids: Option<Vec<ExpressId>>,
    bounds: Option<Aabb>,
}

impl GeometryFragment {
    /// Fragment of a loaded model. `vertex_ids` must be parallel to `positions`.
    #[must_use]
    pub fn for_model(
        model: ModelHandle,
        positions: Vec<Vec3>,
        faces: Vec<[u32; 3]>,
        vertex_ids: Vec<ExpressId>,
    ) -> Self {
        debug_assert_eq!(positions.len(), vertex_ids.len());
        let bounds = Aabb::from_points(&positions);
        Self {
            model: Some(model),
            positions,
            faces,
            vertex_ids: Some(vertex_ids),
            bounds,
        }
    }

    /// Scene decoration without element ids.
    #[must_use]
    pub fn helper(positions: Vec<Vec3>, faces: Vec<[u32; 3]>) -> Self {
        let bounds = Aabb::from_points(&positions);
        Self {
            model: None,
            positions,
            faces,
            vertex_ids: None,
            bounds,
        }
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    fn triangle(&self, face: [u32; 3]) -> Option<[Vec3; 3]> {
        let [a, b, c] = face.map(|i| self.positions.get(i as usize).copied());
        Some([a?, b?, c?])
    }

    /// Element id embedded at `face`, if the fragment carries ids.
    #[must_use]
    pub fn face_id(&self, face: usize) -> Option<ExpressId> {
        let ids = self.vertex_ids.as_ref()?;
        let first = self.faces.get(face)?[0];
        ids.get(first as usize).copied()
    }

    /// Nearest face hit by `ray` as `(face, distance)`.
    #[must_use]
    pub fn raycast(&self, ray: &Ray) -> Option<(usize, f32)> {
        self.bounds?.intersect(ray)?;

        let mut nearest: Option<(usize, f32)> = None;
        for (index, face) in self.faces.iter().enumerate() {
            let Some([v0, v1, v2]) = self.triangle(*face) else {
                continue;
            };
            if let Some(t) = ray_triangle(ray, v0, v1, v2) {
                if nearest.is_none_or(|(_, best)| t < best) {
                    nearest = Some((index, t));
                }
            }
        }
        nearest
    }

    /// Copy of the faces whose id is in `ids`, or `None` if none match.
    #[must_use]
    pub fn extract(&self, ids: &[ExpressId]) -> Option<GeometryFragment> {
        let vertex_ids = self.vertex_ids.as_ref()?;
        let mut remap = vec![u32::MAX; self.positions.len()];
        let mut positions = Vec::new();
        let mut new_ids = Vec::new();
        let mut faces = Vec::new();

        for (index, face) in self.faces.iter().enumerate() {
            if !self.face_id(index).is_some_and(|id| ids.contains(&id)) {
                continue;
            }
            // Faces pointing past the vertex buffers are skipped
            let Some(corners) = self.triangle(*face) else {
                continue;
            };
            let [a, b, c] = face.map(|v| vertex_ids.get(v as usize).copied());
            let (Some(a), Some(b), Some(c)) = (a, b, c) else {
                continue;
            };

            let mut mapped = [0u32; 3];
            for ((slot, &vertex), (point, owner)) in mapped
                .iter_mut()
                .zip(face)
                .zip(corners.into_iter().zip([a, b, c]))
            {
                let Some(entry) = remap.get_mut(vertex as usize) else {
                    continue;
                };
                if *entry == u32::MAX {
                    *entry = positions.len() as u32;
                    positions.push(point);
                    new_ids.push(owner);
                }
                *slot = *entry;
            }
            faces.push(mapped);
        }

        if faces.is_empty() {
            return None;
        }
        let model = self.model?;
        Some(GeometryFragment::for_model(model, positions, faces, new_ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Two unit quads side by side at z = 0: faces 0-1 are #1, faces 2-3 are #2.
    fn two_quads() -> GeometryFragment {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(3.0, 1.0, 0.0),
            Vec3::new(2.0, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [0, 2, 3], [4, 5, 6], [4, 6, 7]];
        let ids = [1, 1, 1, 1, 2, 2, 2, 2].map(ExpressId).to_vec();
        GeometryFragment::for_model(ModelHandle(0), positions, faces, ids)
    }

    #[test]
    fn face_ids_come_from_first_vertex() {
        let fragment = two_quads();
        assert_eq!(fragment.face_id(1), Some(ExpressId(1)));
        assert_eq!(fragment.face_id(2), Some(ExpressId(2)));
        assert_eq!(fragment.face_id(9), None);
    }

    #[test]
    fn raycast_finds_face_under_ray() {
        let fragment = two_quads();
        let ray = Ray::new(Vec3::new(2.2, 0.5, 4.0), Vec3::NEG_Z);
        let (face, _) = fragment.raycast(&ray).unwrap();
        assert_eq!(fragment.face_id(face), Some(ExpressId(2)));

        let gap = Ray::new(Vec3::new(1.5, 0.5, 4.0), Vec3::NEG_Z);
        assert!(fragment.raycast(&gap).is_none());
    }

    #[test]
    fn extract_copies_only_matching_faces() {
        let subset = two_quads().extract(&[ExpressId(2)]).unwrap();
        assert_eq!(subset.face_count(), 2);
        assert_eq!(subset.positions.len(), 4);
        assert!(subset
            .vertex_ids
            .as_ref()
            .unwrap()
            .iter()
            .all(|id| *id == ExpressId(2)));
        assert!(two_quads().extract(&[ExpressId(5)]).is_none());
    }

    #[test]
    fn extract_skips_faces_past_the_vertex_buffer() {
        let mut fragment = two_quads();
        fragment.faces.push([4, 5, 40]);
        fragment.vertex_ids.as_mut().unwrap().truncate(7);
        fragment.faces.push([4, 6, 7]);

        let subset = fragment.extract(&[ExpressId(2)]).unwrap();
        // Vertex 7 lost its id and vertex 40 does not exist
        assert_eq!(subset.face_count(), 1);
        assert_eq!(subset.positions.len(), 3);
    }

    #[test]
    fn helpers_have_no_ids() {
        let helper = GeometryFragment::helper(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![[0, 1, 2]]);
        assert_eq!(helper.face_id(0), None);
        assert!(helper.extract(&[ExpressId(1)]).is_none());
    }
}
