//! Property-holding UI element that owns a [`ViewportWidget`] while the
//! element is live and replays its properties into it.

use crate::actor_class::ClassResolver;
use crate::client::RenderServices;
use crate::config::ViewportConfig;
use crate::entries::{ReconcileReport, ViewportEntry};
use crate::math::Transform;
use crate::widget::{ViewportWidget, ViewportWidgetArgs};
use bevy_ecs::prelude::Entity;
use std::rc::Rc;

pub struct ViewportHost {
    config: ViewportConfig,
    resolver: Rc<dyn ClassResolver>,
    view_transform: Transform,
    entries: Vec<ViewportEntry>,
    widget: Option<ViewportWidget>,
}

impl ViewportHost {
    pub fn new(config: ViewportConfig, resolver: Rc<dyn ClassResolver>) -> Self {
        Self { config, resolver, view_transform: Transform::IDENTITY, entries: Vec::new(), widget: None }
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn view_transform(&self) -> Transform {
        self.view_transform
    }

    pub fn entries(&self) -> &[ViewportEntry] {
        &self.entries
    }

    pub fn widget(&self) -> Option<&ViewportWidget> {
        self.widget.as_ref()
    }

    pub fn widget_mut(&mut self) -> Option<&mut ViewportWidget> {
        self.widget.as_mut()
    }

    /// Replaces any existing widget with a fresh one built from the current
    /// properties.
    pub fn rebuild_widget(&mut self, services: RenderServices) -> &mut ViewportWidget {
        self.release_resources();
        let args = ViewportWidgetArgs { view_transform: self.view_transform, entries: self.entries.clone() };
        let widget = ViewportWidget::new(args, services, Rc::clone(&self.resolver), &self.config);
        log::debug!("[host] widget rebuilt with {} entries", self.entries.len());
        self.widget.insert(widget)
    }

    /// Pushes the stored properties into the live widget, if any.
    pub fn synchronize_properties(&mut self) {
        if let Some(widget) = self.widget.as_mut() {
            widget.set_view_transform(self.view_transform);
            widget.set_entries(&self.entries);
        }
    }

    pub fn release_resources(&mut self) {
        if self.widget.take().is_some() {
            log::debug!("[host] widget released");
        }
    }

    pub fn set_view_transform(&mut self, transform: Transform) {
        self.view_transform = transform;
        if let Some(widget) = self.widget.as_mut() {
            widget.set_view_transform(transform);
        }
    }

    /// Stores the list and reconciles the live widget against it.
    pub fn set_entries(&mut self, entries: Vec<ViewportEntry>) -> Option<ReconcileReport> {
        self.entries = entries;
        self.widget.as_mut()?.set_entries(&self.entries)
    }

    pub fn spawned_actor(&self, index: usize) -> Option<Entity> {
        self.widget.as_ref()?.spawned_actor(index)
    }

    pub fn tick(&mut self, delta_seconds: f32) {
        if let Some(widget) = self.widget.as_mut() {
            widget.tick(delta_seconds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_class::{ActorClassRegistry, SoftClassRef};
    use glam::Vec3;

    fn host() -> ViewportHost {
        ViewportHost::new(ViewportConfig::default(), Rc::new(ActorClassRegistry::with_builtin_classes()))
    }

    fn cube() -> ViewportEntry {
        ViewportEntry::new(SoftClassRef::new("Cube"), Transform::IDENTITY)
    }

    #[test]
    fn properties_are_kept_without_a_widget() {
        let mut host = host();
        assert!(host.set_entries(vec![cube()]).is_none());
        host.set_view_transform(Transform::from_translation(Vec3::X));
        assert!(host.spawned_actor(0).is_none());
        assert_eq!(host.entries().len(), 1);

        let (services, _log) = RenderServices::recording();
        let widget = host.rebuild_widget(services);
        assert!(widget.spawned_actor(0).is_some());
        assert_eq!(widget.client().view_location(), Vec3::X);
    }

    #[test]
    fn setters_forward_to_a_live_widget() {
        let mut host = host();
        let (services, _log) = RenderServices::recording();
        host.rebuild_widget(services);
        let report = host.set_entries(vec![cube(), cube()]).expect("list changed");
        assert_eq!(report.spawned, 2);
        assert!(host.set_entries(vec![cube(), cube()]).is_none());
        host.tick(0.016);
        assert!(host.spawned_actor(1).is_some());
    }

    #[test]
    fn release_drops_the_widget() {
        let mut host = host();
        let (services, _log) = RenderServices::recording();
        host.rebuild_widget(services);
        host.set_entries(vec![cube()]);
        host.release_resources();
        assert!(host.widget().is_none());
        assert!(host.spawned_actor(0).is_none());
        host.synchronize_properties();
        host.tick(0.016);
    }
}
