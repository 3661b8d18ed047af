//! Pointer position to element.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::ViewerError;
use crate::model::ElementRef;
use crate::scene::{PerspectiveCamera, Scene, SceneHit};

/// Screen rectangle the scene is drawn into, in pointer units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[must_use]
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Viewport anchored at the origin.
    #[must_use]
    pub fn sized(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    #[must_use]
    pub fn aspect(&self) -> f32 {
        if self.is_degenerate() {
            1.0
        } else {
            self.width / self.height
        }
    }

    /// Normalized device coordinates of a pointer position: the top-left
    /// corner is (-1, 1) and the bottom-right corner is (1, -1).
    #[must_use]
    pub fn to_ndc(&self, pointer: Vec2) -> Option<Vec2> {
        if self.is_degenerate() {
            return None;
        }
        let x = (pointer.x - self.left) / self.width;
        let y = (pointer.y - self.top) / self.height;
        Some(Vec2::new(x * 2.0 - 1.0, -y * 2.0 + 1.0))
    }
}

/// Nearest model surface under the pointer.
///
/// Helpers are never hit; only the closest intersection is reported.
#[must_use]
pub fn resolve(
    pointer: Vec2,
    viewport: &Viewport,
    camera: &PerspectiveCamera,
    scene: &Scene,
) -> Option<SceneHit> {
    let ndc = viewport.to_ndc(pointer)?;
    let ray = camera.ray_through(ndc);
    let hit = scene.first_model_hit(&ray);
    trace!(?pointer, ?ndc, ?hit, "resolved pointer");
    hit
}

/// Element that owns the hit face.
pub fn map_to_element(hit: &SceneHit, scene: &Scene) -> Result<ElementRef, ViewerError> {
    let unmapped = ViewerError::UnmappedFace {
        fragment: hit.fragment,
        face: hit.face,
    };
    let Some(fragment) = scene.fragment(hit.fragment) else {
        return Err(unmapped);
    };
    match (fragment.model, fragment.face_id(hit.face)) {
        (Some(model), Some(id)) => Ok(ElementRef::new(model, id)),
        _ => Err(unmapped),
    }
}

/// Resolve then map, folding both misses into `None`.
#[must_use]
pub fn pick(
    pointer: Vec2,
    viewport: &Viewport,
    camera: &PerspectiveCamera,
    scene: &Scene,
) -> Option<ElementRef> {
    let hit = resolve(pointer, viewport, camera, scene)?;
    map_to_element(&hit, scene)
        .inspect_err(|e| trace!("{e}"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExpressId, ModelHandle};
    use crate::scene::GeometryFragment;
    use approx::assert_relative_eq;
    use glam::Vec3;
    use pretty_assertions::assert_eq;

    fn quad(model: ModelHandle, id: u32, z: f32) -> GeometryFragment {
        let positions = vec![
            Vec3::new(-1.0, -1.0, z),
            Vec3::new(1.0, -1.0, z),
            Vec3::new(1.0, 1.0, z),
            Vec3::new(-1.0, 1.0, z),
        ];
        GeometryFragment::for_model(
            model,
            positions,
            vec![[0, 1, 2], [0, 2, 3]],
            vec![ExpressId(id); 4],
        )
    }

    fn front_camera() -> PerspectiveCamera {
        PerspectiveCamera::looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO)
    }

    #[test]
    fn ndc_corners_and_center() {
        let viewport = Viewport::new(100.0, 50.0, 800.0, 600.0);

        let center = viewport.to_ndc(Vec2::new(500.0, 350.0)).unwrap();
        assert_relative_eq!(center.x, 0.0);
        assert_relative_eq!(center.y, 0.0);

        let top_left = viewport.to_ndc(Vec2::new(100.0, 50.0)).unwrap();
        assert_eq!(top_left, Vec2::new(-1.0, 1.0));

        let bottom_right = viewport.to_ndc(Vec2::new(900.0, 650.0)).unwrap();
        assert_eq!(bottom_right, Vec2::new(1.0, -1.0));
    }

    #[test]
    fn degenerate_viewport_resolves_nothing() {
        let mut scene = Scene::new();
        scene.add_fragment(quad(ModelHandle(0), 1, 0.0));
        let viewport = Viewport::sized(0.0, 600.0);
        assert_eq!(viewport.to_ndc(Vec2::ZERO), None);
        assert_eq!(
            resolve(Vec2::ZERO, &viewport, &front_camera(), &scene),
            None
        );
    }

    #[test]
    fn nearest_surface_wins() {
        let mut scene = Scene::new();
        scene.add_fragment(quad(ModelHandle(0), 1, -2.0));
        scene.add_fragment(quad(ModelHandle(0), 2, 1.0));
        let viewport = Viewport::sized(100.0, 100.0);

        let element = pick(Vec2::new(55.0, 45.0), &viewport, &front_camera(), &scene);
        assert_eq!(element, Some(ElementRef::new(ModelHandle(0), ExpressId(2))));
    }

    #[test]
    fn helpers_are_never_hit() {
        let mut scene = Scene::new();
        scene.add_fragment(GeometryFragment::helper(
            vec![
                Vec3::new(-5.0, -5.0, 5.0),
                Vec3::new(5.0, -5.0, 5.0),
                Vec3::new(0.0, 5.0, 5.0),
            ],
            vec![[0, 1, 2]],
        ));
        scene.add_fragment(quad(ModelHandle(3), 9, 0.0));
        let viewport = Viewport::sized(100.0, 100.0);

        let hit = resolve(Vec2::new(55.0, 45.0), &viewport, &front_camera(), &scene).unwrap();
        assert_eq!(hit.fragment, 1);
        assert_eq!(
            map_to_element(&hit, &scene).unwrap(),
            ElementRef::new(ModelHandle(3), ExpressId(9))
        );
    }

    #[test]
    fn resolve_is_idempotent() {
        let mut scene = Scene::new();
        scene.add_fragment(quad(ModelHandle(0), 1, 0.0));
        let viewport = Viewport::sized(640.0, 480.0);
        let camera = front_camera();

        for pointer in [Vec2::new(320.0, 240.0), Vec2::new(10.0, 10.0)] {
            let first = resolve(pointer, &viewport, &camera, &scene);
            let second = resolve(pointer, &viewport, &camera, &scene);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn helper_faces_are_unmapped() {
        let mut scene = Scene::new();
        scene.add_grid(10.0, 1);
        let hit = SceneHit {
            fragment: 0,
            face: 1,
            distance: 1.0,
            point: Vec3::ZERO,
        };
        assert!(matches!(
            map_to_element(&hit, &scene),
            Err(ViewerError::UnmappedFace { fragment: 0, face: 1 })
        ));
    }

    #[test]
    fn face_out_of_range_is_unmapped() {
        let mut scene = Scene::new();
        scene.add_fragment(quad(ModelHandle(0), 1, 0.0));
        let hit = SceneHit {
            fragment: 0,
            face: 7,
            distance: 1.0,
            point: Vec3::ZERO,
        };
        assert!(map_to_element(&hit, &scene).is_err());
    }
}
