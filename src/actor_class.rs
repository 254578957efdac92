//! Spawnable actor types and the soft references that name them.

use crate::ecs::ComponentKind;
use crate::math::Transform;
use glam::Vec3;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Lazily resolved reference to an actor class by path. An empty reference
/// never resolves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SoftClassRef(Option<String>);

impl SoftClassRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self(Some(path.into()))
    }

    pub fn null() -> Self {
        Self(None)
    }

    pub fn path(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }
}

impl fmt::Display for SoftClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path().unwrap_or("None"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSpec {
    pub kind: ComponentKind,
    pub relative: Transform,
    pub sound_clip: Option<String>,
}

/// Collects the components an actor class wants on a new instance.
#[derive(Debug, Default)]
pub struct ActorBuilder {
    components: Vec<ComponentSpec>,
    spin_degrees_per_second: Option<f32>,
}

impl ActorBuilder {
    pub fn add_component(&mut self, kind: ComponentKind, relative: Transform) -> &mut Self {
        self.components.push(ComponentSpec { kind, relative, sound_clip: None });
        self
    }

    pub fn add_sound(&mut self, clip: &str, relative: Transform) -> &mut Self {
        self.components.push(ComponentSpec {
            kind: ComponentKind::AmbientSound,
            relative,
            sound_clip: Some(clip.to_string()),
        });
        self
    }

    pub fn set_spin(&mut self, degrees_per_second: f32) -> &mut Self {
        self.spin_degrees_per_second = Some(degrees_per_second);
        self
    }

    pub fn components(&self) -> &[ComponentSpec] {
        &self.components
    }

    pub fn spin(&self) -> Option<f32> {
        self.spin_degrees_per_second
    }
}

pub trait ActorClass: Send + Sync {
    fn name(&self) -> &str;

    fn construct(&self, builder: &mut ActorBuilder);
}

/// Resolves soft references to loaded classes. Resolution blocks until the
/// class is available or known missing.
pub trait ClassResolver {
    fn load_synchronous(&self, reference: &SoftClassRef) -> Option<Arc<dyn ActorClass>>;
}

/// Class described purely by its component list.
#[derive(Debug, Clone)]
pub struct ComponentListClass {
    name: String,
    components: Vec<ComponentSpec>,
    spin: Option<f32>,
}

impl ComponentListClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), components: Vec::new(), spin: None }
    }

    pub fn with_component(mut self, kind: ComponentKind, relative: Transform) -> Self {
        self.components.push(ComponentSpec { kind, relative, sound_clip: None });
        self
    }

    pub fn with_sound(mut self, clip: &str) -> Self {
        self.components.push(ComponentSpec {
            kind: ComponentKind::AmbientSound,
            relative: Transform::IDENTITY,
            sound_clip: Some(clip.to_string()),
        });
        self
    }

    pub fn with_spin(mut self, degrees_per_second: f32) -> Self {
        self.spin = Some(degrees_per_second);
        self
    }
}

impl ActorClass for ComponentListClass {
    fn name(&self) -> &str {
        &self.name
    }

    fn construct(&self, builder: &mut ActorBuilder) {
        for spec in &self.components {
            match &spec.sound_clip {
                Some(clip) => builder.add_sound(clip, spec.relative),
                None => builder.add_component(spec.kind, spec.relative),
            };
        }
        if let Some(spin) = self.spin {
            builder.set_spin(spin);
        }
    }
}

/// Path-keyed class table.
#[derive(Default, Clone)]
pub struct ActorClassRegistry {
    classes: HashMap<String, Arc<dyn ActorClass>>,
}

impl ActorClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the basic shapes, lights and helpers.
    pub fn with_builtin_classes() -> Self {
        let mut registry = Self::new();
        let mesh = |name: &str| {
            ComponentListClass::new(name)
                .with_component(ComponentKind::Scene, Transform::IDENTITY)
                .with_component(ComponentKind::StaticMesh, Transform::IDENTITY)
        };
        registry.register("Cube", Arc::new(mesh("Cube")));
        registry.register("Sphere", Arc::new(mesh("Sphere")));
        registry.register(
            "PointLight",
            Arc::new(ComponentListClass::new("PointLight").with_component(ComponentKind::PointLight, Transform::IDENTITY)),
        );
        registry.register(
            "DirectionalLight",
            Arc::new(
                ComponentListClass::new("DirectionalLight")
                    .with_component(ComponentKind::DirectionalLight, Transform::IDENTITY),
            ),
        );
        registry.register(
            "SkyLight",
            Arc::new(ComponentListClass::new("SkyLight").with_component(ComponentKind::SkyLight, Transform::IDENTITY)),
        );
        registry.register(
            "ReflectionCapture",
            Arc::new(
                ComponentListClass::new("ReflectionCapture")
                    .with_component(ComponentKind::ReflectionCapture, Transform::IDENTITY),
            ),
        );
        registry.register("AmbientSound", Arc::new(ComponentListClass::new("AmbientSound").with_sound("ambient")));
        registry.register(
            "Turntable",
            Arc::new(
                mesh("Turntable")
                    .with_component(ComponentKind::StaticMesh, Transform::from_translation(Vec3::new(0.0, 0.0, 50.0)))
                    .with_spin(45.0),
            ),
        );
        registry
    }

    pub fn register(&mut self, path: &str, class: Arc<dyn ActorClass>) {
        if self.classes.insert(path.to_string(), class).is_some() {
            log::warn!("[entries] actor class '{path}' registered twice; keeping the latest");
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.classes.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ClassResolver for ActorClassRegistry {
    fn load_synchronous(&self, reference: &SoftClassRef) -> Option<Arc<dyn ActorClass>> {
        let path = reference.path()?;
        self.classes.get(path).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_reference_never_resolves() {
        let registry = ActorClassRegistry::with_builtin_classes();
        assert!(registry.load_synchronous(&SoftClassRef::null()).is_none());
        assert!(registry.load_synchronous(&SoftClassRef::new("Missing")).is_none());
        assert!(registry.load_synchronous(&SoftClassRef::new("Cube")).is_some());
    }

    #[test]
    fn component_list_class_replays_into_builder() {
        let class = ComponentListClass::new("Lamp")
            .with_component(ComponentKind::StaticMesh, Transform::IDENTITY)
            .with_component(ComponentKind::PointLight, Transform::from_translation(Vec3::Z * 20.0))
            .with_spin(10.0);
        let mut builder = ActorBuilder::default();
        class.construct(&mut builder);
        assert_eq!(builder.components().len(), 2);
        assert_eq!(builder.components()[1].kind, ComponentKind::PointLight);
        assert_eq!(builder.spin(), Some(10.0));
    }
}
