//! Scene contents the picking pipeline works against.
//!
//! Model fragments are the only pickable geometry. Helpers are kept in the
//! same list for display but never take part in hit tests.

pub mod camera;
pub mod fragment;
pub mod raycast;

pub use camera::PerspectiveCamera;
pub use fragment::GeometryFragment;
pub use raycast::{Aabb, Ray};

use glam::Vec3;
use std::collections::HashMap;
use tracing::debug;

use crate::highlight::{Channel, Material, SubsetHost, SubsetId};
use crate::model::{ExpressId, ModelHandle};

/// One intersection of a ray with a scene fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneHit {
    /// Index into [`Scene::fragments`].
    pub fragment: usize,
    pub face: usize,
    pub distance: f32,
    pub point: Vec3,
}

/// Styled copy of one element's faces, owned by a highlight channel.
#[derive(Debug, Clone)]
pub struct HighlightSubset {
    pub id: SubsetId,
    pub channel: Channel,
    pub material: Material,
    pub model: ModelHandle,
    pub ids: Vec<ExpressId>,
    pub fragments: Vec<GeometryFragment>,
}

impl HighlightSubset {
    /// Nearest distance at which `ray` crosses the subset.
    #[must_use]
    pub fn raycast(&self, ray: &Ray) -> Option<f32> {
        self.fragments
            .iter()
            .filter_map(|f| f.raycast(ray).map(|(_, t)| t))
            .min_by(f32::total_cmp)
    }
}

#[derive(Debug, Default)]
pub struct Scene {
    fragments: Vec<GeometryFragment>,
    subsets: HashMap<Channel, HighlightSubset>,
    next_subset: u64,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a fragment and returns its index.
    pub fn add_fragment(&mut self, fragment: GeometryFragment) -> usize {
        self.fragments.push(fragment);
        self.fragments.len() - 1
    }

    /// Adds a square helper grid on the ground plane, `divisions` cells per
    /// side.
    pub fn add_grid(&mut self, size: f32, divisions: u32) -> usize {
        let cells = divisions.max(1);
        let step = size / cells as f32;
        let h = size / 2.0;
        let row = cells + 1;

        let mut positions = Vec::with_capacity((row * row) as usize);
        for k in 0..row {
            for i in 0..row {
                positions.push(Vec3::new(-h + i as f32 * step, 0.0, -h + k as f32 * step));
            }
        }
        let mut faces = Vec::with_capacity((cells * cells * 2) as usize);
        for k in 0..cells {
            for i in 0..cells {
                let a = k * row + i;
                let (b, c, d) = (a + 1, a + row + 1, a + row);
                faces.push([a, b, c]);
                faces.push([a, c, d]);
            }
        }
        self.add_fragment(GeometryFragment::helper(positions, faces))
    }

    /// Drops every fragment and subset belonging to `model`.
    pub fn remove_model(&mut self, model: ModelHandle) {
        self.fragments.retain(|f| f.model != Some(model));
        self.subsets.retain(|_, s| s.model != model);
    }

    #[must_use]
    pub fn fragments(&self) -> &[GeometryFragment] {
        &self.fragments
    }

    #[must_use]
    pub fn fragment(&self, index: usize) -> Option<&GeometryFragment> {
        self.fragments.get(index)
    }

    /// All intersections with fragments accepted by `filter`, nearest first.
    pub fn intersect(
        &self,
        ray: &Ray,
        filter: impl Fn(&GeometryFragment) -> bool,
    ) -> Vec<SceneHit> {
        let mut hits: Vec<SceneHit> = self
            .fragments
            .iter()
            .enumerate()
            .filter(|(_, f)| filter(f))
            .filter_map(|(index, f)| {
                f.raycast(ray).map(|(face, distance)| SceneHit {
                    fragment: index,
                    face,
                    distance,
                    point: ray.at(distance),
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    /// Nearest hit on model geometry only.
    #[must_use]
    pub fn first_model_hit(&self, ray: &Ray) -> Option<SceneHit> {
        self.intersect(ray, |f| f.model.is_some()).into_iter().next()
    }

    /// Nearest hit on helper geometry only.
    #[must_use]
    pub fn first_helper_hit(&self, ray: &Ray) -> Option<SceneHit> {
        self.intersect(ray, |f| f.model.is_none()).into_iter().next()
    }

    #[must_use]
    pub fn subset(&self, channel: Channel) -> Option<&HighlightSubset> {
        self.subsets.get(&channel)
    }

    pub fn subsets(&self) -> impl Iterator<Item = &HighlightSubset> {
        self.subsets.values()
    }
}

impl SubsetHost for Scene {
    fn create_subset(
        &mut self,
        model: ModelHandle,
        ids: &[ExpressId],
        material: Material,
        channel: Channel,
    ) -> Option<SubsetId> {
        let fragments: Vec<GeometryFragment> = self
            .fragments
            .iter()
            .filter(|f| f.model == Some(model))
            .filter_map(|f| f.extract(ids))
            .collect();
        if fragments.is_empty() {
            return None;
        }

        self.next_subset += 1;
        let id = SubsetId(self.next_subset);
        debug!(?channel, %model, subset = id.0, faces = fragments.iter().map(GeometryFragment::face_count).sum::<usize>(), "created subset");
        // Replacing an entry here would hide a missing remove in the caller.
        debug_assert!(!self.subsets.contains_key(&channel));
        self.subsets.insert(
            channel,
            HighlightSubset {
                id,
                channel,
                material,
                model,
                ids: ids.to_vec(),
                fragments,
            },
        );
        Some(id)
    }

    fn remove_subset(&mut self, channel: Channel) -> bool {
        self.subsets.remove(&channel).is_some()
    }
}
