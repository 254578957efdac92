use crate::math::Transform;
use crate::view::PostProcessSettings;
use bevy_ecs::prelude::*;
use bitflags::bitflags;
use glam::{Mat4, Quat, Vec3, Vec4};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorldId(Uuid);

impl WorldId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WorldId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ObjectFlags: u32 {
        /// Never saved with the owning asset.
        const TRANSIENT = 1 << 0;
        /// Participates in undo/redo.
        const TRANSACTIONAL = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Scene,
    StaticMesh,
    PointLight,
    DirectionalLight,
    SkyLight,
    ReflectionCapture,
    AmbientSound,
    LineBatch,
}

impl ComponentKind {
    pub fn is_mesh(self) -> bool {
        matches!(self, ComponentKind::StaticMesh)
    }

    pub fn is_light(self) -> bool {
        matches!(self, ComponentKind::PointLight | ComponentKind::DirectionalLight | ComponentKind::SkyLight)
    }
}

#[derive(Component, Debug, Clone)]
pub struct Actor {
    pub class_name: String,
    pub label: String,
    pub flags: ObjectFlags,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct ActorTransform(pub Transform);

#[derive(Component, Debug, Default, Clone)]
pub struct ActorComponents(pub Vec<Entity>);

/// Continuous yaw rotation applied to an actor every tick.
#[derive(Component, Debug, Clone, Copy)]
pub struct Spin {
    pub degrees_per_second: f32,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct SceneComponent {
    pub kind: ComponentKind,
    pub owner: Option<Entity>,
}

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct RelativeTransform(pub Transform);

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct WorldTransform3D(pub Mat4);

/// Present while the component is registered with the scene.
#[derive(Component, Debug, Clone, Copy)]
pub struct Registered;

/// Mesh texture streaming state.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct MipResidency {
    pub force_all_resident: bool,
}

#[derive(Component, Debug, Clone)]
pub struct SoundSource {
    pub clip: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchedLine {
    pub start: Vec3,
    pub end: Vec3,
    pub color: Vec4,
    pub thickness: f32,
    /// `None` draws for a single frame.
    pub remaining_life: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchedPoint {
    pub position: Vec3,
    pub color: Vec4,
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchedMesh {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub color: Vec4,
}

/// Accumulated debug draw requests.
#[derive(Component, Debug, Clone, Default)]
pub struct LineBatch {
    pub lines: Vec<BatchedLine>,
    pub points: Vec<BatchedPoint>,
    pub meshes: Vec<BatchedMesh>,
}

impl LineBatch {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.points.is_empty() && self.meshes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len() + self.points.len() + self.meshes.len()
    }

    pub fn flush(&mut self) {
        self.lines.clear();
        self.points.clear();
        self.meshes.clear();
    }

    pub fn draw_line(&mut self, start: Vec3, end: Vec3, color: Vec4) {
        self.lines.push(BatchedLine { start, end, color, thickness: 0.0, remaining_life: None });
    }

    pub fn draw_point(&mut self, position: Vec3, color: Vec4, size: f32) {
        self.points.push(BatchedPoint { position, color, size });
    }

    /// Ages timed lines and drops the ones that ran out. Single-frame
    /// entries stay until the batch is flushed.
    pub fn expire(&mut self, delta_seconds: f32) {
        self.lines.retain_mut(|line| match line.remaining_life.as_mut() {
            Some(life) => {
                *life -= delta_seconds;
                *life > 0.0
            }
            None => true,
        });
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct WorldLineBatchers {
    pub persistent: LineBatch,
    pub foreground: LineBatch,
}

impl WorldLineBatchers {
    pub fn is_empty(&self) -> bool {
        self.persistent.is_empty() && self.foreground.is_empty()
    }

    pub fn flush(&mut self) {
        self.persistent.flush();
        self.foreground.flush();
    }
}

#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct WorldTime {
    pub delta_seconds: f32,
    pub time_seconds: f64,
    pub real_time_seconds: f64,
    pub frame_number: u64,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct WorldSettings {
    pub world_to_meters: f32,
    pub post_process: PostProcessSettings,
}

#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct CaptureState {
    pub sky_revision: u64,
    pub reflection_revision: u64,
}

#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct WindState {
    pub last_update_time: f32,
    pub update_count: u64,
}

/// What a viewport rendered last frame, kept for streaming and LOD decisions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedViewInfo {
    pub location: Vec3,
    pub rotation: Quat,
    pub fov_degrees: f32,
    pub view_projection: Mat4,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct RenderedViews {
    pub views: Vec<CachedViewInfo>,
    pub last_render_time: f64,
}
