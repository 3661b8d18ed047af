//! End-to-end picking against the STEP engine and a small fixture model.

use glam::{Vec2, Vec3};
use pretty_assertions::assert_eq;
use std::sync::Arc;

use ifc_picker::config::ViewerConfig;
use ifc_picker::engine::ParsingEngine;
use ifc_picker::error::ViewerError;
use ifc_picker::highlight::Channel;
use ifc_picker::index::index_bytes;
use ifc_picker::model::{ElementRef, ExpressId, Value};
use ifc_picker::parser::StepEngine;
use ifc_picker::pick::{map_to_element, resolve, Viewport};
use ifc_picker::scene::PerspectiveCamera;
use ifc_picker::session::Session;

const FIXTURE: &str = include_str!("fixtures/wall_and_door.ifc");

const WALL: ExpressId = ExpressId(42);
const DOOR: ExpressId = ExpressId(7);

fn session_looking_from(eye: Vec3, target: Vec3) -> Session<StepEngine> {
    let config = ViewerConfig {
        camera: PerspectiveCamera::looking_at(eye, target),
        ..ViewerConfig::default()
    };
    let mut session = Session::with_config(Arc::new(StepEngine::new()), &config);
    session.set_viewport(Viewport::new(20.0, 10.0, 800.0, 600.0));
    session
}

fn front_session() -> Session<StepEngine> {
    session_looking_from(Vec3::new(3.0, 1.5, 10.0), Vec3::new(3.0, 1.5, 0.0))
}

/// Pointer position at which `world` appears on screen.
fn pointer_at<E: ParsingEngine>(session: &Session<E>, world: Vec3) -> Vec2 {
    let ndc = session.camera().view_projection().project_point3(world);
    let vp = session.viewport();
    Vec2::new(
        vp.left + (ndc.x + 1.0) / 2.0 * vp.width,
        vp.top + (1.0 - ndc.y) / 2.0 * vp.height,
    )
}

const EMPTY_SKY: Vec2 = Vec2::new(420.0, 15.0);

#[test]
fn index_types_match_the_engine() {
    let engine = StepEngine::new();
    let handle = engine.open(FIXTURE.as_bytes()).unwrap();
    let index = ifc_picker::index::build_index(&engine, handle).unwrap();

    let lines = engine.enumerate_lines(handle).unwrap();
    assert_eq!(index.len(), lines.len());
    for id in lines {
        let entry = index.get(id).unwrap();
        assert_eq!(entry.type_tag, engine.get_element_type(handle, id).unwrap());
    }
    assert_eq!(index.ids_of_type("IFCWALL"), vec![WALL]);
}

#[test]
fn index_bytes_leaves_nothing_open() {
    let engine = StepEngine::new();
    let index = index_bytes(&engine, FIXTURE.as_bytes()).unwrap();
    assert!(index.contains(DOOR));
    assert_eq!(engine.open_count(), 0);

    assert!(index_bytes(&engine, b"not a step file").is_err());
    assert_eq!(engine.open_count(), 0);
}

#[tokio::test]
async fn wall_and_door_resolve_to_their_ids() {
    let mut session = front_session();
    let handle = session.load_model(FIXTURE.as_bytes(), "wall_and_door.ifc").unwrap();

    let wall_pointer = pointer_at(&session, Vec3::new(2.0, 1.0, 0.1));
    let hit = resolve(
        wall_pointer,
        session.viewport(),
        session.camera(),
        session.scene(),
    )
    .unwrap();
    let wall = map_to_element(&hit, session.scene()).unwrap();
    assert_eq!(wall, ElementRef::new(handle, WALL));

    let door_pointer = pointer_at(&session, Vec3::new(6.0, 0.5, 0.0));
    assert_eq!(
        session.element_at(door_pointer),
        Some(ElementRef::new(handle, DOOR))
    );

    let props = session.inspect(wall).await.unwrap();
    assert_eq!(props.type_tag, "IFCWALL");
    assert_eq!(props.name(), Some("Basic Wall:Interior 200"));
    assert_eq!(props.property("FireRating"), Some(&Value::Text("EI30".into())));
    assert_eq!(
        props.container.as_ref().and_then(|c| c.name.as_deref()),
        Some("Ground floor")
    );
    assert_eq!(props.materials[0].name.as_deref(), Some("Concrete"));

    let door = session.inspect(ElementRef::new(handle, DOOR)).await.unwrap();
    assert_eq!(door.type_tag, "IFCDOOR");
    assert_eq!(door.property("Width"), Some(&Value::Real(1.0)));
}

#[test]
fn empty_space_clears_the_hover() {
    let mut session = front_session();
    let handle = session.load_model(FIXTURE.as_bytes(), "m.ifc").unwrap();

    let wall_pointer = pointer_at(&session, Vec3::new(2.0, 1.0, 0.1));
    assert_eq!(
        session.pointer_moved(wall_pointer),
        Some(ElementRef::new(handle, WALL))
    );
    assert!(session.scene().subset(Channel::Hover).is_some());

    assert_eq!(
        resolve(EMPTY_SKY, session.viewport(), session.camera(), session.scene()),
        None
    );
    assert_eq!(session.pointer_moved(EMPTY_SKY), None);
    assert_eq!(session.hovered(), None);
    assert!(session.scene().subset(Channel::Hover).is_none());
}

#[tokio::test]
async fn click_then_hover_then_leave() {
    let mut session = front_session();
    let handle = session.load_model(FIXTURE.as_bytes(), "m.ifc").unwrap();
    let wall = ElementRef::new(handle, WALL);
    let door = ElementRef::new(handle, DOOR);

    let request = session
        .clicked(pointer_at(&session, Vec3::new(1.0, 2.0, 0.1)))
        .unwrap();
    assert_eq!(request.element, wall);

    session.pointer_moved(pointer_at(&session, Vec3::new(6.2, 0.5, 0.0)));
    assert_eq!(session.hovered(), Some(door));

    session.pointer_moved(EMPTY_SKY);
    assert_eq!(session.selected(), Some(wall));
    assert_eq!(session.hovered(), None);

    let select = session.scene().subset(Channel::Select).unwrap();
    assert_eq!((select.model, select.ids.clone()), (handle, vec![WALL]));
    assert!(session.scene().subset(Channel::Hover).is_none());

    let outcome = request.run().await;
    assert!(session.complete_inspect(outcome));
    let inspection = session.inspection().unwrap();
    assert_eq!(inspection.element, wall);
    assert_eq!(inspection.result.as_ref().unwrap().type_tag, "IFCWALL");
}

#[test]
fn highlight_subsets_track_the_channels() {
    let mut session = front_session();
    session.load_model(FIXTURE.as_bytes(), "m.ifc").unwrap();

    let targets = [
        pointer_at(&session, Vec3::new(2.0, 1.0, 0.1)),
        pointer_at(&session, Vec3::new(6.0, 0.5, 0.0)),
        EMPTY_SKY,
        pointer_at(&session, Vec3::new(0.5, 0.5, 0.1)),
    ];
    for (step, pointer) in targets.iter().cycle().take(24).enumerate() {
        if step % 3 == 0 {
            let _ = session.clicked(*pointer);
        } else {
            session.pointer_moved(*pointer);
        }

        for (channel, active) in [
            (Channel::Hover, session.hovered()),
            (Channel::Select, session.selected()),
        ] {
            let subset = session
                .scene()
                .subset(channel)
                .map(|s| ElementRef::new(s.model, s.ids[0]));
            assert_eq!(subset, active, "{channel:?} after step {step}");
        }
        assert!(session.scene().subsets().count() <= 2);
    }
}

#[test]
fn overlapping_ids_stay_apart_across_models() {
    let mut session = session_looking_from(Vec3::new(8.0, 1.5, 25.0), Vec3::new(8.0, 1.5, 0.0));
    let shifted = FIXTURE.replace(
        "#110=IFCCARTESIANPOINT((0.,0.,0.));",
        "#110=IFCCARTESIANPOINT((10.,0.,0.));",
    );
    let first = session.load_model(FIXTURE.as_bytes(), "a.ifc").unwrap();
    let second = session.load_model(shifted.as_bytes(), "b.ifc").unwrap();
    assert_ne!(first, second);

    let left = session.element_at(pointer_at(&session, Vec3::new(2.0, 1.0, 0.1)));
    let right = session.element_at(pointer_at(&session, Vec3::new(12.0, 1.0, 0.1)));
    assert_eq!(left, Some(ElementRef::new(first, WALL)));
    assert_eq!(right, Some(ElementRef::new(second, WALL)));

    // Highlighting one model's #42 must not touch the other's faces
    session.pointer_moved(pointer_at(&session, Vec3::new(12.0, 1.0, 0.1)));
    let subset = session.scene().subset(Channel::Hover).unwrap();
    assert_eq!(subset.model, second);
    let bounds = subset.fragments[0].bounds().unwrap();
    assert!(bounds.min.x >= 10.0 - 1e-4);

    assert!(session.close_model(first));
    assert_eq!(session.element_at(pointer_at(&session, Vec3::new(2.0, 1.0, 0.1))), None);
    assert_eq!(session.hovered(), Some(ElementRef::new(second, WALL)));
}

#[tokio::test]
async fn inspecting_an_unknown_element_fails() {
    let mut session = front_session();
    let handle = session.load_model(FIXTURE.as_bytes(), "m.ifc").unwrap();
    let missing = ElementRef::new(handle, ExpressId(9999));
    assert!(matches!(
        session.inspect(missing).await,
        Err(ViewerError::ElementNotFound { element }) if element == missing
    ));
}

#[test]
fn dropping_the_session_closes_every_model() {
    let engine = Arc::new(StepEngine::new());
    let mut session = Session::new(Arc::clone(&engine));
    session.load_model(FIXTURE.as_bytes(), "a.ifc").unwrap();
    session.load_model(FIXTURE.as_bytes(), "b.ifc").unwrap();
    assert!(session.load_model(b"garbage", "c.ifc").is_err());
    assert_eq!(engine.open_count(), 2);

    drop(session);
    assert_eq!(engine.open_count(), 0);
}
