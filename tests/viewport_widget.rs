use glam::Vec3;
use kestrel_viewport::actor_class::{ActorClassRegistry, ClassResolver, SoftClassRef};
use kestrel_viewport::config::ViewportConfig;
use kestrel_viewport::events::WorldEvent;
use kestrel_viewport::math::{mat4_is_finite, Transform};
use kestrel_viewport::renderer::RecorderLog;
use kestrel_viewport::stereo::{SideBySideStereo, StereoPass};
use kestrel_viewport::{RenderServices, ViewportEntry, ViewportWidget, ViewportWidgetArgs};
use std::cell::RefCell;
use std::rc::Rc;
use winit::dpi::PhysicalSize;

fn resolver() -> Rc<dyn ClassResolver> {
    Rc::new(ActorClassRegistry::with_builtin_classes())
}

fn recording_widget() -> (ViewportWidget, Rc<RefCell<RecorderLog>>) {
    let (services, log) = RenderServices::recording();
    let widget = ViewportWidget::new(ViewportWidgetArgs::default(), services, resolver(), &ViewportConfig::default());
    (widget, log)
}

fn entry(class: &str, translation: Vec3) -> ViewportEntry {
    ViewportEntry::new(SoftClassRef::new(class), Transform::from_translation(translation))
}

fn count_spawns(events: &[WorldEvent]) -> usize {
    events.iter().filter(|event| matches!(event, WorldEvent::ActorSpawned { .. })).count()
}

#[test]
fn cube_entry_spawns_and_clearing_entries_removes_its_components() {
    let (mut widget, log) = recording_widget();
    widget.set_entries(&[ViewportEntry::new(SoftClassRef::new("Cube"), Transform::IDENTITY)]);
    widget.tick(1.0 / 60.0);

    let actor = widget.spawned_actor(0).expect("cube spawned");
    let components = widget.preview_world().actor_components(actor);
    assert!(!components.is_empty());
    assert!(components.iter().all(|component| widget.preview_world().contains_component(*component)));

    widget.set_entries(&[]);
    widget.tick(1.0 / 60.0);
    assert!(widget.spawned_actor(0).is_none());
    assert!(!widget.preview_world().is_actor_alive(actor));
    for component in components {
        assert!(!widget.preview_world().contains_component(component));
    }
    assert_eq!(log.borrow().frames.len(), 2);
}

#[test]
fn identical_entry_lists_reconcile_once() {
    let (mut widget, _log) = recording_widget();
    let entries = [entry("Cube", Vec3::ZERO), entry("Sphere", Vec3::X)];
    widget.preview_world_mut().drain_events();

    let first = widget.set_entries(&entries).expect("first pass rebuilds");
    assert_eq!(first.spawned, 2);
    assert!(widget.set_entries(&entries).is_none());
    assert_eq!(count_spawns(&widget.preview_world_mut().drain_events()), 2);
}

#[test]
fn positional_change_rebuilds_every_actor() {
    let (mut widget, _log) = recording_widget();
    let t1 = Vec3::new(10.0, 0.0, 0.0);
    widget.set_entries(&[entry("Cube", t1), entry("Sphere", Vec3::new(0.0, 20.0, 0.0))]);
    let old_first = widget.spawned_actor(0).expect("first actor");
    let old_second = widget.spawned_actor(1).expect("second actor");
    widget.preview_world_mut().drain_events();

    let report = widget
        .set_entries(&[entry("Cube", t1), entry("Turntable", Vec3::new(0.0, 0.0, 30.0))])
        .expect("lists differ");
    assert_eq!(report.destroyed, 2);
    assert_eq!(report.spawned, 2);

    let events = widget.preview_world_mut().drain_events();
    let destroyed: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            WorldEvent::ActorDestroyed { actor } => Some(*actor),
            _ => None,
        })
        .collect();
    assert_eq!(destroyed, [old_first, old_second]);
    assert_eq!(count_spawns(&events), 2);
    assert!(widget.preview_world().is_actor_alive(widget.spawned_actor(0).expect("respawned")));
}

#[test]
fn unresolved_entries_render_nothing_for_their_slot() {
    let (mut widget, _log) = recording_widget();
    let report = widget
        .set_entries(&[
            ViewportEntry::new(SoftClassRef::null(), Transform::IDENTITY),
            entry("DoesNotExist", Vec3::ZERO),
            entry("Cube", Vec3::ZERO),
        ])
        .expect("list changed");
    assert_eq!(report.unresolved, 2);
    assert!(widget.spawned_actor(0).is_none());
    assert!(widget.spawned_actor(1).is_none());
    assert!(widget.spawned_actor(2).is_some());
}

#[test]
fn zero_sized_viewport_still_submits_a_finite_view() {
    let (mut widget, log) = recording_widget();
    widget.resize(PhysicalSize::new(0, 0));
    widget.tick(1.0 / 60.0);

    let log = log.borrow();
    let frame = log.frames.last().expect("frame submitted");
    let view = &frame.views[0];
    assert!(view.view_rect.width() >= 1 && view.view_rect.height() >= 1);
    assert!(mat4_is_finite(&view.view_matrix));
    assert!(mat4_is_finite(&view.projection));
    assert!(mat4_is_finite(&view.view_projection));
}

#[test]
fn stereo_widget_submits_one_view_per_eye() {
    let (services, log) = RenderServices::recording();
    let services = services.with_stereo(SideBySideStereo::default());
    let mut widget = ViewportWidget::new(ViewportWidgetArgs::default(), services, resolver(), &ViewportConfig::default());
    widget.tick(1.0 / 60.0);

    let log = log.borrow();
    let views = &log.frames[0].views;
    assert_eq!(views.len(), 2);
    assert_eq!(views[0].stereo_pass, StereoPass::Primary);
    assert_eq!(views[1].stereo_pass, StereoPass::Secondary);
    assert_eq!(views[0].view_rect.width() + views[1].view_rect.width(), 1280);
    assert_eq!(widget.client().allocated_stereo_view_states(), 2);
}

#[test]
fn dropping_the_widget_stops_audio_before_unregistering_components() {
    let mut config = ViewportConfig::default();
    config.preview_world.allow_audio_playback = true;
    let (services, _log) = RenderServices::recording();
    let mut widget = ViewportWidget::new(ViewportWidgetArgs::default(), services, resolver(), &config);
    widget.set_entries(&[entry("AmbientSound", Vec3::ZERO), entry("Cube", Vec3::ZERO)]);
    let attached = widget.preview_world().components().to_vec();

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    widget.preview_world_mut().set_event_observer(move |event| sink.borrow_mut().push(event.clone()));
    drop(widget);

    let events = events.borrow();
    assert!(matches!(events.first(), Some(WorldEvent::AudioFlushed { stopped: 1 })));
    let unregistered: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            WorldEvent::ComponentUnregistered { component, .. } => Some(*component),
            _ => None,
        })
        .collect();
    assert_eq!(unregistered, attached);
    assert!(matches!(events.last(), Some(WorldEvent::WorldCleanedUp { .. })));
}
