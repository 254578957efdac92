//! Isolated scene owned by a viewport widget.
//!
//! Teardown runs in a fixed order: audio is flushed, then every attached
//! component is un-pinned and unregistered in attachment order, then the
//! sandbox world is cleaned up.

use crate::actor_class::ActorClass;
use crate::ecs::{
    CachedViewInfo, ComponentKind, SandboxWorld, SpawnParameters, WorldId, WorldInit, WorldTime,
};
use crate::events::WorldEvent;
use crate::math::Transform;
use crate::view::PostProcessSettings;
use bevy_ecs::prelude::Entity;
use glam::{Vec3, Vec4};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewWorldOptions {
    #[serde(default = "PreviewWorldOptions::default_true")]
    pub default_lighting: bool,
    #[serde(default)]
    pub allow_audio_playback: bool,
    #[serde(default)]
    pub force_mips_resident: bool,
    #[serde(default = "PreviewWorldOptions::default_true")]
    pub transactional: bool,
    #[serde(default = "PreviewWorldOptions::default_world_to_meters")]
    pub world_to_meters: f32,
}

impl PreviewWorldOptions {
    const fn default_true() -> bool {
        true
    }

    const fn default_world_to_meters() -> f32 {
        100.0
    }
}

impl Default for PreviewWorldOptions {
    fn default() -> Self {
        Self {
            default_lighting: Self::default_true(),
            allow_audio_playback: false,
            force_mips_resident: false,
            transactional: Self::default_true(),
            world_to_meters: Self::default_world_to_meters(),
        }
    }
}

pub struct PreviewWorld {
    sandbox: SandboxWorld,
    components: Vec<Entity>,
    line_batcher: Option<Entity>,
    force_mips_resident: bool,
    transactional: bool,
}

impl PreviewWorld {
    pub fn new(options: &PreviewWorldOptions) -> Self {
        let sandbox = SandboxWorld::new(WorldInit {
            name: String::from("PreviewWorld"),
            allow_audio_playback: options.allow_audio_playback,
            world_to_meters: options.world_to_meters,
        });
        let mut preview = Self {
            sandbox,
            components: Vec::new(),
            line_batcher: None,
            force_mips_resident: options.force_mips_resident,
            transactional: options.transactional,
        };
        if options.default_lighting {
            let batcher = preview.sandbox.create_component(ComponentKind::LineBatch, None);
            preview.attach_component(batcher, Transform::IDENTITY);
            preview.line_batcher = Some(batcher);
        }
        log::info!(
            "[preview] world {} ready (lighting={}, audio={}, pinned mips={})",
            preview.sandbox.id(),
            options.default_lighting,
            options.allow_audio_playback,
            options.force_mips_resident
        );
        preview
    }

    pub fn id(&self) -> WorldId {
        self.sandbox.id()
    }

    pub fn sandbox(&self) -> &SandboxWorld {
        &self.sandbox
    }

    pub fn sandbox_mut(&mut self) -> &mut SandboxWorld {
        &mut self.sandbox
    }

    pub fn is_transactional(&self) -> bool {
        self.transactional
    }

    pub fn force_mips_resident(&self) -> bool {
        self.force_mips_resident
    }

    /// Attached components in attachment order.
    pub fn components(&self) -> &[Entity] {
        &self.components
    }

    pub fn contains_component(&self, component: Entity) -> bool {
        self.components.contains(&component)
    }

    /// Registers `component` with the scene at `local`. Attaching the same
    /// component twice keeps a single entry.
    pub fn attach_component(&mut self, component: Entity, local: Transform) {
        if !self.components.contains(&component) {
            self.components.push(component);
        }
        self.sandbox.set_relative_transform(component, local);
        self.sandbox.register_component(component);
        if self.force_mips_resident && self.sandbox.component_kind(component).is_some_and(ComponentKind::is_mesh) {
            self.sandbox.set_force_mips_resident(component, true);
        }
        self.sandbox.update_wind(0.0);
    }

    pub fn detach_component(&mut self, component: Entity) {
        self.components.retain(|attached| *attached != component);
        if self.force_mips_resident && self.sandbox.component_kind(component).is_some_and(ComponentKind::is_mesh) {
            self.sandbox.set_force_mips_resident(component, false);
        }
        self.sandbox.unregister_component(component);
    }

    /// Spawns an actor and attaches its components to this scene.
    pub fn spawn_actor(
        &mut self,
        class: &dyn ActorClass,
        transform: Transform,
        params: &SpawnParameters,
    ) -> Option<Entity> {
        let actor = self.sandbox.spawn_actor(class, transform, params)?;
        for component in self.sandbox.actor_components(actor) {
            let relative = self.sandbox.relative_transform(component).unwrap_or_default();
            self.attach_component(component, relative);
        }
        Some(actor)
    }

    pub fn destroy_actor(&mut self, actor: Entity) -> bool {
        if !self.sandbox.is_actor_alive(actor) {
            return false;
        }
        for component in self.sandbox.actor_components(actor) {
            self.detach_component(component);
        }
        self.sandbox.destroy_actor(actor)
    }

    pub fn is_actor_alive(&self, actor: Entity) -> bool {
        self.sandbox.is_actor_alive(actor)
    }

    pub fn actor_components(&self, actor: Entity) -> Vec<Entity> {
        self.sandbox.actor_components(actor)
    }

    /// Refreshes sky and reflection captures. Expensive; call at most once
    /// per frame from the tick.
    pub fn update_captures(&mut self) {
        self.sandbox.update_sky_captures();
        self.sandbox.update_reflection_captures();
        self.sandbox.notify_captures_updated();
    }

    /// Queues a single-frame debug line on this scene's line batcher.
    pub fn draw_debug_line(&mut self, start: Vec3, end: Vec3, color: Vec4) -> bool {
        let Some(batcher) = self.line_batcher else {
            return false;
        };
        match self.sandbox.line_batch_mut(batcher) {
            Some(mut batch) => {
                batch.draw_line(start, end, color);
                true
            }
            None => false,
        }
    }

    pub fn pending_debug_draws(&self) -> usize {
        self.line_batcher.and_then(|batcher| self.sandbox.line_batch(batcher)).map_or(0, |batch| batch.len())
    }

    /// Drops every queued debug line, point and mesh of this scene.
    pub fn clear_line_batcher(&mut self) {
        if let Some(batcher) = self.line_batcher {
            if let Some(mut batch) = self.sandbox.line_batch_mut(batcher) {
                batch.flush();
            }
        }
    }

    pub fn world_line_batchers_pending(&self) -> bool {
        !self.sandbox.world_line_batchers().is_empty()
    }

    pub fn flush_world_line_batchers(&mut self) {
        self.sandbox.world_line_batchers_mut().flush();
    }

    pub fn tick(&mut self, delta_seconds: f32) {
        self.sandbox.tick(delta_seconds);
    }

    pub fn time(&self) -> WorldTime {
        self.sandbox.time()
    }

    pub fn has_any_lights(&self) -> bool {
        self.sandbox.has_any_lights()
    }

    pub fn world_to_meters(&self) -> f32 {
        self.sandbox.settings().world_to_meters
    }

    pub fn post_process_settings(&self) -> &PostProcessSettings {
        &self.sandbox.settings().post_process
    }

    pub fn set_post_process_settings(&mut self, settings: PostProcessSettings) {
        self.sandbox.settings_mut().post_process = settings;
    }

    pub fn record_rendered_views(&mut self, views: Vec<CachedViewInfo>, now: f64) {
        self.sandbox.record_rendered_views(views, now);
    }

    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        self.sandbox.drain_events()
    }

    pub fn set_event_observer(&mut self, observer: impl FnMut(&WorldEvent) + 'static) {
        self.sandbox.set_event_observer(observer);
    }
}

impl Drop for PreviewWorld {
    fn drop(&mut self) {
        self.sandbox.flush_audio();
        for component in std::mem::take(&mut self.components) {
            if self.force_mips_resident {
                self.sandbox.set_force_mips_resident(component, false);
            }
            self.sandbox.unregister_component(component);
        }
        self.sandbox.cleanup();
        log::debug!("[preview] world {} destroyed", self.sandbox.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_class::{ActorClassRegistry, ClassResolver, SoftClassRef};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn pinned() -> PreviewWorldOptions {
        PreviewWorldOptions { force_mips_resident: true, allow_audio_playback: true, ..Default::default() }
    }

    #[test]
    fn default_lighting_attaches_a_line_batcher() {
        let world = PreviewWorld::new(&PreviewWorldOptions::default());
        assert_eq!(world.components().len(), 1);
        let bare = PreviewWorld::new(&PreviewWorldOptions { default_lighting: false, ..Default::default() });
        assert!(bare.components().is_empty());
    }

    #[test]
    fn attach_is_unique_and_pins_meshes() {
        let mut world = PreviewWorld::new(&pinned());
        let mesh = world.sandbox_mut().create_component(ComponentKind::StaticMesh, None);
        world.attach_component(mesh, Transform::IDENTITY);
        world.attach_component(mesh, Transform::IDENTITY);
        assert_eq!(world.components().iter().filter(|c| **c == mesh).count(), 1);
        assert!(world.sandbox().is_mips_resident_forced(mesh));
        assert_eq!(world.sandbox().wind_state().update_count, 3);

        world.detach_component(mesh);
        assert!(!world.sandbox().is_mips_resident_forced(mesh));
        assert!(!world.sandbox().is_registered(mesh));
        assert!(!world.contains_component(mesh));
    }

    #[test]
    fn debug_lines_are_cleared_on_request() {
        let mut world = PreviewWorld::new(&PreviewWorldOptions::default());
        assert!(world.draw_debug_line(Vec3::ZERO, Vec3::X, Vec4::ONE));
        assert_eq!(world.pending_debug_draws(), 1);
        world.tick(0.1);
        assert_eq!(world.pending_debug_draws(), 1);
        world.clear_line_batcher();
        assert_eq!(world.pending_debug_draws(), 0);
    }

    #[test]
    fn captures_only_refresh_what_the_scene_contains() {
        let registry = ActorClassRegistry::with_builtin_classes();
        let mut world = PreviewWorld::new(&PreviewWorldOptions::default());
        world.update_captures();
        assert_eq!(world.sandbox().capture_state().sky_revision, 0);
        let sky = registry.load_synchronous(&SoftClassRef::new("SkyLight")).expect("sky");
        world.spawn_actor(sky.as_ref(), Transform::IDENTITY, &SpawnParameters::default());
        world.update_captures();
        assert_eq!(world.sandbox().capture_state().sky_revision, 1);
        assert_eq!(world.sandbox().capture_state().reflection_revision, 0);
    }

    #[test]
    fn teardown_stops_audio_then_unregisters_in_order() {
        let registry = ActorClassRegistry::with_builtin_classes();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut world = PreviewWorld::new(&pinned());
        let sink = Rc::clone(&log);
        world.set_event_observer(move |event| sink.borrow_mut().push(event.clone()));

        let sound = registry.load_synchronous(&SoftClassRef::new("AmbientSound")).expect("sound");
        let cube = registry.load_synchronous(&SoftClassRef::new("Cube")).expect("cube");
        world.spawn_actor(sound.as_ref(), Transform::IDENTITY, &SpawnParameters::default());
        world.spawn_actor(cube.as_ref(), Transform::IDENTITY, &SpawnParameters::default());
        let attached = world.components().to_vec();
        log.borrow_mut().clear();
        drop(world);

        let events = log.borrow();
        assert_eq!(events.first(), Some(&WorldEvent::AudioFlushed { stopped: 1 }));
        let unregistered: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                WorldEvent::ComponentUnregistered { component, .. } => Some(*component),
                _ => None,
            })
            .collect();
        assert_eq!(unregistered, attached);
        let unpin = events.iter().position(|e| matches!(e, WorldEvent::MipResidencyChanged { forced: false, .. }));
        let first_mesh_unregister = events.iter().position(
            |e| matches!(e, WorldEvent::ComponentUnregistered { kind: ComponentKind::StaticMesh, .. }),
        );
        assert!(unpin.is_some());
        assert!(unpin < first_mesh_unregister);
        assert!(matches!(events.last(), Some(WorldEvent::WorldCleanedUp { .. })));
    }
}
