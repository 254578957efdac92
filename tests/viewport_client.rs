use glam::{Mat4, Vec3};
use kestrel_viewport::actor_class::{ActorClassRegistry, ClassResolver, SoftClassRef};
use kestrel_viewport::camera::{ViewportType, ORTHO_ROTATION_ORDER};
use kestrel_viewport::config::ViewportConfig;
use kestrel_viewport::math::Transform;
use kestrel_viewport::renderer::RecorderLog;
use kestrel_viewport::screen_percentage::{MAX_RESOLUTION_FRACTION, MIN_RESOLUTION_FRACTION};
use kestrel_viewport::show_flags::{ShowFlags, ViewMode};
use kestrel_viewport::{RenderServices, ViewportEntry, ViewportWidget, ViewportWidgetArgs};
use std::cell::RefCell;
use std::rc::Rc;

fn recording_widget() -> (ViewportWidget, Rc<RefCell<RecorderLog>>) {
    let (services, log) = RenderServices::recording();
    let resolver: Rc<dyn ClassResolver> = Rc::new(ActorClassRegistry::with_builtin_classes());
    let widget = ViewportWidget::new(ViewportWidgetArgs::default(), services, resolver, &ViewportConfig::default());
    (widget, log)
}

fn approx_vec(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < 1.0e-5
}

#[test]
fn ortho_views_map_their_axis_onto_view_forward() {
    for view in ORTHO_ROTATION_ORDER {
        let rotation = view.view_rotation();
        let forward = rotation.transform_vector3(view.view_direction());
        assert!(approx_vec(forward, Vec3::Z), "{view:?} maps its axis to {forward:?}");
        assert!((rotation * rotation.inverse()).abs_diff_eq(Mat4::IDENTITY, 1.0e-6), "{view:?}");
    }
}

#[test]
fn drawn_ortho_views_look_along_their_axis() {
    let (mut widget, log) = recording_widget();
    for view in ORTHO_ROTATION_ORDER {
        widget.client_mut().set_viewport_type(ViewportType::Ortho(view));
        widget.tick(1.0 / 60.0);
        let frame = log.borrow().frames.last().cloned().expect("frame");
        let forward = frame.views[0].view_matrix.transform_vector3(view.view_direction());
        assert!(approx_vec(forward, Vec3::Z), "{view:?} drew forward {forward:?}");
    }
    assert_eq!(log.borrow().frames.len(), ORTHO_ROTATION_ORDER.len());
}

#[test]
fn preview_screen_percentage_stays_in_range() {
    let (mut widget, _log) = recording_widget();
    let min = (MIN_RESOLUTION_FRACTION * 100.0).round() as i32;
    let max = (MAX_RESOLUTION_FRACTION * 100.0).round() as i32;
    for requested in [-50, 0, 10, 24, 25, 50, 99, 150, 200, 201, 1000] {
        widget.client_mut().set_preview_screen_percentage(requested);
        let effective = widget.client().preview_screen_percentage();
        assert!((min..=max).contains(&effective), "{requested} gave {effective}");
    }
}

#[test]
fn setting_the_automatic_percentage_clears_the_override() {
    let (mut widget, _log) = recording_widget();
    let auto = widget.client().preview_screen_percentage();
    widget.client_mut().set_preview_screen_percentage(if auto == 70 { 60 } else { 70 });
    assert!(widget.client().preview_resolution_fraction().is_some());
    widget.client_mut().set_preview_screen_percentage(auto);
    assert!(widget.client().preview_resolution_fraction().is_none());
    assert_eq!(widget.client().preview_screen_percentage(), auto);
}

#[test]
fn only_one_visualization_family_is_selected() {
    let (mut widget, log) = recording_widget();
    let client = widget.client_mut();
    client.change_buffer_visualization_mode("BaseColor");
    client.change_nanite_visualization_mode("Foo");
    assert!(client.is_nanite_visualization_mode_selected("Foo"));
    assert!(!client.is_buffer_visualization_mode_selected("Foo"));
    assert!(!client.is_buffer_visualization_mode_selected("BaseColor"));
    assert!(!client.is_lumen_visualization_mode_selected(""));
    assert_eq!(client.view_mode(), ViewMode::VisualizeNanite);
    assert!(client.show_flags().contains(ShowFlags::VISUALIZE_NANITE));
    assert!(!client.show_flags().contains(ShowFlags::VISUALIZE_BUFFER));

    widget.tick(1.0 / 60.0);
    assert_eq!(log.borrow().frames[0].view_mode, ViewMode::VisualizeNanite);
}

#[test]
#[should_panic(expected = "visualization queried")]
fn inactive_visualization_display_name_is_a_contract_violation() {
    let (mut widget, _log) = recording_widget();
    widget.client_mut().change_lumen_visualization_mode("Overview");
    let _ = widget.client().current_groom_visualization_mode_display_name();
}

#[test]
fn forced_unlit_only_switches_lighting_back_on() {
    let (mut widget, log) = recording_widget();
    let world = widget.preview_world().id();
    widget.client_mut().set_main_world(Some(world));
    widget.client_mut().set_force_unlit_for_new_map(true);
    let lit = |log: &Rc<RefCell<RecorderLog>>| {
        log.borrow().frames.last().map(|frame| frame.show_flags.contains(ShowFlags::LIGHTING))
    };

    widget.tick(1.0 / 60.0);
    assert_eq!(lit(&log), Some(false));
    assert!(widget.client().is_forcing_unlit_for_new_map());

    widget.set_entries(&[ViewportEntry::new(SoftClassRef::new("PointLight"), Transform::IDENTITY)]);
    widget.tick(1.0 / 60.0);
    assert_eq!(lit(&log), Some(true));
    assert!(!widget.client().is_forcing_unlit_for_new_map());

    widget.set_entries(&[]);
    widget.tick(1.0 / 60.0);
    assert_eq!(lit(&log), Some(true));
    assert!(!widget.client().is_forcing_unlit_for_new_map());
}
