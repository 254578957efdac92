use crate::ecs::{ComponentKind, WorldId};
use bevy_ecs::prelude::{Entity, Resource};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    ComponentRegistered { component: Entity, kind: ComponentKind },
    ComponentUnregistered { component: Entity, kind: ComponentKind },
    MipResidencyChanged { component: Entity, forced: bool },
    ActorSpawned { actor: Entity, class: String },
    ActorDestroyed { actor: Entity },
    AudioFlushed { stopped: usize },
    CapturesUpdated { sky_revision: u64, reflection_revision: u64 },
    WorldCleanedUp { world: WorldId },
}

impl fmt::Display for WorldEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldEvent::ComponentRegistered { component, kind } => {
                write!(f, "ComponentRegistered component={} kind={kind:?}", component.index())
            }
            WorldEvent::ComponentUnregistered { component, kind } => {
                write!(f, "ComponentUnregistered component={} kind={kind:?}", component.index())
            }
            WorldEvent::MipResidencyChanged { component, forced } => {
                write!(f, "MipResidencyChanged component={} forced={forced}", component.index())
            }
            WorldEvent::ActorSpawned { actor, class } => {
                write!(f, "ActorSpawned actor={} class={class}", actor.index())
            }
            WorldEvent::ActorDestroyed { actor } => write!(f, "ActorDestroyed actor={}", actor.index()),
            WorldEvent::AudioFlushed { stopped } => write!(f, "AudioFlushed stopped={stopped}"),
            WorldEvent::CapturesUpdated { sky_revision, reflection_revision } => {
                write!(f, "CapturesUpdated sky={sky_revision} reflections={reflection_revision}")
            }
            WorldEvent::WorldCleanedUp { world } => write!(f, "WorldCleanedUp world={world}"),
        }
    }
}

#[derive(Default, Resource)]
pub struct EventBus {
    events: Vec<WorldEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: WorldEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<WorldEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
