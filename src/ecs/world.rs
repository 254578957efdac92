use super::systems::{
    sys_advance_world_time, sys_apply_spin, sys_expire_line_batches, sys_propagate_component_transforms, TimeDelta,
};
use super::types::*;
use crate::actor_class::{ActorBuilder, ActorClass};
use crate::audio::PreviewAudioDevice;
use crate::events::{EventBus, WorldEvent};
use crate::math::{Transform, KINDA_SMALL_NUMBER};
use crate::view::PostProcessSettings;
use bevy_ecs::prelude::{Entity, Mut, Schedule, World};
use bevy_ecs::schedule::IntoSystemConfigs;

const AUDIO_VOICE_LIMIT: usize = 32;

#[derive(Debug, Clone)]
pub struct WorldInit {
    pub name: String,
    pub allow_audio_playback: bool,
    pub world_to_meters: f32,
}

impl Default for WorldInit {
    fn default() -> Self {
        Self { name: String::from("PreviewWorld"), allow_audio_playback: false, world_to_meters: 100.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpawnCollisionHandling {
    #[default]
    AlwaysSpawn,
    DontSpawnIfColliding,
}

#[derive(Debug, Clone, Default)]
pub struct SpawnParameters {
    pub collision_handling: SpawnCollisionHandling,
    /// Spawn even when the collision check would reject the placement.
    pub no_fail: bool,
    pub flags: ObjectFlags,
    pub label: Option<String>,
}

/// Minimal scene graph with no physics, navigation or AI.
pub struct SandboxWorld {
    pub world: World,
    id: WorldId,
    name: String,
    schedule: Schedule,
    audio: Option<PreviewAudioDevice>,
    observer: Option<Box<dyn FnMut(&WorldEvent)>>,
    cleaned_up: bool,
}

impl SandboxWorld {
    pub fn new(init: WorldInit) -> Self {
        let mut world = World::new();
        world.insert_resource(TimeDelta(0.0));
        world.insert_resource(WorldTime::default());
        world.insert_resource(WorldLineBatchers::default());
        world.insert_resource(WorldSettings {
            world_to_meters: init.world_to_meters,
            post_process: PostProcessSettings::default(),
        });
        world.insert_resource(CaptureState::default());
        world.insert_resource(WindState::default());
        world.insert_resource(RenderedViews::default());
        world.insert_resource(EventBus::default());

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (sys_advance_world_time, sys_apply_spin, sys_propagate_component_transforms, sys_expire_line_batches)
                .chain(),
        );

        let audio = init.allow_audio_playback.then(|| PreviewAudioDevice::new(AUDIO_VOICE_LIMIT));
        let id = WorldId::new();
        log::debug!("[preview] created world '{}' ({id})", init.name);
        Self { world, id, name: init.name, schedule, audio, observer: None, cleaned_up: false }
    }

    pub fn id(&self) -> WorldId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Receives every event as it is emitted, in addition to the event bus.
    pub fn set_event_observer(&mut self, observer: impl FnMut(&WorldEvent) + 'static) {
        self.observer = Some(Box::new(observer));
    }

    fn emit(&mut self, event: WorldEvent) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&event);
        }
        self.world.resource_mut::<EventBus>().push(event);
    }

    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        self.world.resource_mut::<EventBus>().drain()
    }

    pub fn create_component(&mut self, kind: ComponentKind, owner: Option<Entity>) -> Entity {
        let mut entity = self.world.spawn((
            SceneComponent { kind, owner },
            RelativeTransform::default(),
            WorldTransform3D::default(),
        ));
        match kind {
            ComponentKind::StaticMesh => {
                entity.insert(MipResidency::default());
            }
            ComponentKind::LineBatch => {
                entity.insert(LineBatch::default());
            }
            _ => {}
        }
        entity.id()
    }

    pub fn component_kind(&self, component: Entity) -> Option<ComponentKind> {
        self.world.get::<SceneComponent>(component).map(|c| c.kind)
    }

    pub fn component_owner(&self, component: Entity) -> Option<Entity> {
        self.world.get::<SceneComponent>(component).and_then(|c| c.owner)
    }

    pub fn relative_transform(&self, component: Entity) -> Option<Transform> {
        self.world.get::<RelativeTransform>(component).map(|t| t.0)
    }

    pub fn set_relative_transform(&mut self, component: Entity, transform: Transform) -> bool {
        match self.world.get_mut::<RelativeTransform>(component) {
            Some(mut relative) => relative.0 = transform,
            None => return false,
        }
        let owner = self.component_owner(component).and_then(|o| self.world.get::<ActorTransform>(o).copied());
        let world_matrix = match owner {
            Some(owner) => owner.0.to_matrix() * transform.to_matrix(),
            None => transform.to_matrix(),
        };
        if let Some(mut world) = self.world.get_mut::<WorldTransform3D>(component) {
            world.0 = world_matrix;
        }
        true
    }

    pub fn is_registered(&self, component: Entity) -> bool {
        self.world.get::<Registered>(component).is_some()
    }

    pub fn register_component(&mut self, component: Entity) -> bool {
        let Some(kind) = self.component_kind(component) else {
            return false;
        };
        if self.is_registered(component) {
            return true;
        }
        self.world.entity_mut(component).insert(Registered);
        if kind == ComponentKind::AmbientSound {
            let clip = self.world.get::<SoundSource>(component).map(|s| s.clip.clone());
            if let (Some(audio), Some(clip)) = (self.audio.as_mut(), clip) {
                audio.play(component, &clip);
            }
        }
        self.emit(WorldEvent::ComponentRegistered { component, kind });
        true
    }

    pub fn unregister_component(&mut self, component: Entity) -> bool {
        let Some(kind) = self.component_kind(component) else {
            return false;
        };
        if !self.is_registered(component) {
            return false;
        }
        self.world.entity_mut(component).remove::<Registered>();
        if let Some(audio) = self.audio.as_mut() {
            audio.stop(component);
        }
        self.emit(WorldEvent::ComponentUnregistered { component, kind });
        true
    }

    /// Pins or releases every mip of a mesh component's textures. Returns
    /// false for components that have no textures to stream.
    pub fn set_force_mips_resident(&mut self, component: Entity, forced: bool) -> bool {
        let Some(mut residency) = self.world.get_mut::<MipResidency>(component) else {
            return false;
        };
        if residency.force_all_resident == forced {
            return true;
        }
        residency.force_all_resident = forced;
        self.emit(WorldEvent::MipResidencyChanged { component, forced });
        true
    }

    pub fn is_mips_resident_forced(&self, component: Entity) -> bool {
        self.world.get::<MipResidency>(component).is_some_and(|r| r.force_all_resident)
    }

    /// Creates an actor and its components. Components are left unregistered
    /// so the caller decides how they join the scene.
    pub fn spawn_actor(
        &mut self,
        class: &dyn ActorClass,
        transform: Transform,
        params: &SpawnParameters,
    ) -> Option<Entity> {
        if params.collision_handling == SpawnCollisionHandling::DontSpawnIfColliding
            && !params.no_fail
            && self.actor_overlaps(transform.translation)
        {
            log::debug!("[preview] '{}' not spawned: placement collides", class.name());
            return None;
        }

        let mut builder = ActorBuilder::default();
        class.construct(&mut builder);

        let label = params.label.clone().unwrap_or_else(|| class.name().to_string());
        let actor = self
            .world
            .spawn((
                Actor { class_name: class.name().to_string(), label, flags: params.flags },
                ActorTransform(transform),
            ))
            .id();
        if let Some(spin) = builder.spin() {
            self.world.entity_mut(actor).insert(Spin { degrees_per_second: spin });
        }

        let mut components = Vec::with_capacity(builder.components().len());
        for spec in builder.components() {
            let component = self.create_component(spec.kind, Some(actor));
            if let Some(clip) = &spec.sound_clip {
                self.world.entity_mut(component).insert(SoundSource { clip: clip.clone() });
            }
            self.world.entity_mut(component).insert(RelativeTransform(spec.relative));
            components.push(component);
        }
        self.world.entity_mut(actor).insert(ActorComponents(components));
        self.emit(WorldEvent::ActorSpawned { actor, class: class.name().to_string() });
        Some(actor)
    }

    fn actor_overlaps(&self, location: glam::Vec3) -> bool {
        self.world.iter_entities().any(|entity| {
            entity.contains::<Actor>()
                && entity
                    .get::<ActorTransform>()
                    .is_some_and(|t| t.0.translation.distance(location) <= KINDA_SMALL_NUMBER)
        })
    }

    pub fn is_actor_alive(&self, actor: Entity) -> bool {
        self.world.get::<Actor>(actor).is_some()
    }

    pub fn actor(&self, actor: Entity) -> Option<&Actor> {
        self.world.get::<Actor>(actor)
    }

    pub fn actor_transform(&self, actor: Entity) -> Option<Transform> {
        self.world.get::<ActorTransform>(actor).map(|t| t.0)
    }

    pub fn actor_components(&self, actor: Entity) -> Vec<Entity> {
        self.world.get::<ActorComponents>(actor).map(|c| c.0.clone()).unwrap_or_default()
    }

    pub fn actor_count(&self) -> usize {
        self.world.iter_entities().filter(|entity| entity.contains::<Actor>()).count()
    }

    /// Unregisters and despawns an actor together with its components.
    pub fn destroy_actor(&mut self, actor: Entity) -> bool {
        if !self.is_actor_alive(actor) {
            return false;
        }
        for component in self.actor_components(actor) {
            self.unregister_component(component);
            self.world.despawn(component);
        }
        self.world.despawn(actor);
        self.emit(WorldEvent::ActorDestroyed { actor });
        true
    }

    pub fn has_any_lights(&self) -> bool {
        self.world.iter_entities().any(|entity| {
            entity.contains::<Registered>() && entity.get::<SceneComponent>().is_some_and(|c| c.kind.is_light())
        })
    }

    pub fn registered_components(&self) -> Vec<Entity> {
        self.world.iter_entities().filter(|entity| entity.contains::<Registered>()).map(|entity| entity.id()).collect()
    }

    fn has_registered(&self, kind: ComponentKind) -> bool {
        self.world.iter_entities().any(|entity| {
            entity.contains::<Registered>() && entity.get::<SceneComponent>().is_some_and(|c| c.kind == kind)
        })
    }

    /// Recaptures sky lighting when a sky light is present.
    pub fn update_sky_captures(&mut self) {
        if self.has_registered(ComponentKind::SkyLight) {
            self.world.resource_mut::<CaptureState>().sky_revision += 1;
        }
    }

    /// Recaptures reflection probes when any are present.
    pub fn update_reflection_captures(&mut self) {
        if self.has_registered(ComponentKind::ReflectionCapture) {
            self.world.resource_mut::<CaptureState>().reflection_revision += 1;
        }
    }

    pub fn capture_state(&self) -> CaptureState {
        *self.world.resource::<CaptureState>()
    }

    pub(crate) fn notify_captures_updated(&mut self) {
        let state = self.capture_state();
        self.emit(WorldEvent::CapturesUpdated {
            sky_revision: state.sky_revision,
            reflection_revision: state.reflection_revision,
        });
    }

    pub fn update_wind(&mut self, time: f32) {
        let mut wind = self.world.resource_mut::<WindState>();
        wind.last_update_time = time;
        wind.update_count += 1;
    }

    pub fn wind_state(&self) -> WindState {
        *self.world.resource::<WindState>()
    }

    pub fn line_batch_mut(&mut self, component: Entity) -> Option<Mut<'_, LineBatch>> {
        self.world.get_mut::<LineBatch>(component)
    }

    pub fn line_batch(&self, component: Entity) -> Option<&LineBatch> {
        self.world.get::<LineBatch>(component)
    }

    pub fn world_line_batchers(&self) -> &WorldLineBatchers {
        self.world.resource::<WorldLineBatchers>()
    }

    pub fn world_line_batchers_mut(&mut self) -> Mut<'_, WorldLineBatchers> {
        self.world.resource_mut::<WorldLineBatchers>()
    }

    pub fn tick(&mut self, delta_seconds: f32) {
        self.world.resource_mut::<TimeDelta>().0 = delta_seconds.max(0.0);
        self.schedule.run(&mut self.world);
    }

    pub fn time(&self) -> WorldTime {
        *self.world.resource::<WorldTime>()
    }

    pub fn settings(&self) -> &WorldSettings {
        self.world.resource::<WorldSettings>()
    }

    pub fn settings_mut(&mut self) -> Mut<'_, WorldSettings> {
        self.world.resource_mut::<WorldSettings>()
    }

    pub fn record_rendered_views(&mut self, views: Vec<CachedViewInfo>, now: f64) {
        let mut rendered = self.world.resource_mut::<RenderedViews>();
        rendered.views = views;
        rendered.last_render_time = now;
    }

    pub fn rendered_views(&self) -> &RenderedViews {
        self.world.resource::<RenderedViews>()
    }

    pub fn audio_device(&self) -> Option<&PreviewAudioDevice> {
        self.audio.as_ref()
    }

    pub fn audio_device_mut(&mut self) -> Option<&mut PreviewAudioDevice> {
        self.audio.as_mut()
    }

    /// Stops every sound this world started.
    pub fn flush_audio(&mut self) -> usize {
        let stopped = self.audio.as_mut().map_or(0, PreviewAudioDevice::flush);
        self.emit(WorldEvent::AudioFlushed { stopped });
        stopped
    }

    pub fn is_cleaned_up(&self) -> bool {
        self.cleaned_up
    }

    /// Releases every entity. Components should already be unregistered.
    pub fn cleanup(&mut self) {
        if self.cleaned_up {
            return;
        }
        let leftover = self.registered_components().len();
        if leftover > 0 {
            log::warn!("[preview] world '{}' torn down with {leftover} registered components", self.name);
        }
        self.world.clear_entities();
        self.cleaned_up = true;
        let world = self.id;
        self.emit(WorldEvent::WorldCleanedUp { world });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_class::ComponentListClass;
    use glam::Vec3;

    fn lamp() -> ComponentListClass {
        ComponentListClass::new("Lamp")
            .with_component(ComponentKind::StaticMesh, Transform::IDENTITY)
            .with_component(ComponentKind::PointLight, Transform::from_translation(Vec3::Z * 10.0))
    }

    #[test]
    fn destroyed_actor_ids_stop_resolving() {
        let mut world = SandboxWorld::new(WorldInit::default());
        let actor = world.spawn_actor(&lamp(), Transform::IDENTITY, &SpawnParameters::default()).expect("spawn");
        let components = world.actor_components(actor);
        assert_eq!(components.len(), 2);
        assert!(world.destroy_actor(actor));
        assert!(!world.is_actor_alive(actor));
        assert!(world.actor_components(actor).is_empty());
        assert!(world.component_kind(components[0]).is_none());
        assert!(!world.destroy_actor(actor));
    }

    #[test]
    fn lights_count_only_once_registered() {
        let mut world = SandboxWorld::new(WorldInit::default());
        let actor = world.spawn_actor(&lamp(), Transform::IDENTITY, &SpawnParameters::default()).expect("spawn");
        assert!(!world.has_any_lights());
        for component in world.actor_components(actor) {
            world.register_component(component);
        }
        assert!(world.has_any_lights());
    }

    #[test]
    fn colliding_spawn_respects_no_fail() {
        let mut world = SandboxWorld::new(WorldInit::default());
        let strict = SpawnParameters {
            collision_handling: SpawnCollisionHandling::DontSpawnIfColliding,
            ..Default::default()
        };
        assert!(world.spawn_actor(&lamp(), Transform::IDENTITY, &strict).is_some());
        assert!(world.spawn_actor(&lamp(), Transform::IDENTITY, &strict).is_none());
        let forced = SpawnParameters { no_fail: true, ..strict };
        assert!(world.spawn_actor(&lamp(), Transform::IDENTITY, &forced).is_some());
    }

    #[test]
    fn tick_propagates_owner_transform_to_components() {
        let mut world = SandboxWorld::new(WorldInit::default());
        let at = Transform::from_translation(Vec3::new(100.0, 0.0, 0.0));
        let actor = world.spawn_actor(&lamp(), at, &SpawnParameters::default()).expect("spawn");
        world.tick(0.016);
        let light = world.actor_components(actor)[1];
        let matrix = world.world.get::<WorldTransform3D>(light).expect("world transform").0;
        let position = matrix.w_axis.truncate();
        assert!((position - Vec3::new(100.0, 0.0, 10.0)).length() < 1e-4, "{position:?}");
        assert_eq!(world.time().frame_number, 1);
    }

    #[test]
    fn mip_pinning_only_applies_to_meshes() {
        let mut world = SandboxWorld::new(WorldInit::default());
        let mesh = world.create_component(ComponentKind::StaticMesh, None);
        let light = world.create_component(ComponentKind::PointLight, None);
        assert!(world.set_force_mips_resident(mesh, true));
        assert!(world.is_mips_resident_forced(mesh));
        assert!(!world.set_force_mips_resident(light, true));
    }
}
