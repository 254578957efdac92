use bevy_ecs::prelude::Entity;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSound {
    pub source: Entity,
    pub clip: String,
}

/// Per-world audio device used when a preview world allows playback.
/// Tracks which sounds each component started so the world can silence
/// everything it owns before teardown.
pub struct PreviewAudioDevice {
    enabled: bool,
    capacity: usize,
    active: VecDeque<ActiveSound>,
    triggers: VecDeque<String>,
}

impl PreviewAudioDevice {
    pub fn new(capacity: usize) -> Self {
        Self { enabled: true, capacity: capacity.max(1), active: VecDeque::new(), triggers: VecDeque::new() }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn play(&mut self, source: Entity, clip: &str) {
        if !self.enabled {
            return;
        }
        if self.active.len() == self.capacity {
            self.active.pop_front();
        }
        self.active.push_back(ActiveSound { source, clip: clip.to_string() });
        self.push_trigger(format!("play:{clip}"));
    }

    pub fn stop(&mut self, source: Entity) -> bool {
        let before = self.active.len();
        self.active.retain(|sound| sound.source != source);
        let stopped = before != self.active.len();
        if stopped {
            self.push_trigger(String::from("stop"));
        }
        stopped
    }

    /// Stops every active sound and returns how many were playing.
    pub fn flush(&mut self) -> usize {
        let stopped = self.active.len();
        self.active.clear();
        if stopped > 0 {
            self.push_trigger(format!("flush:{stopped}"));
        }
        stopped
    }

    pub fn active_sounds(&self) -> impl ExactSizeIterator<Item = &ActiveSound> {
        self.active.iter()
    }

    pub fn recent_triggers(&self) -> impl ExactSizeIterator<Item = &String> {
        self.triggers.iter()
    }

    fn push_trigger(&mut self, trigger: String) {
        if self.triggers.len() == self.capacity {
            self.triggers.pop_front();
        }
        self.triggers.push_back(trigger);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::world::World;

    #[test]
    fn flush_stops_everything() {
        let mut world = World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        let mut device = PreviewAudioDevice::new(8);
        device.play(a, "wind");
        device.play(b, "birds");
        assert_eq!(device.flush(), 2);
        assert_eq!(device.active_sounds().len(), 0);
    }

    #[test]
    fn disabled_device_ignores_playback() {
        let mut world = World::new();
        let source = world.spawn_empty().id();
        let mut device = PreviewAudioDevice::new(4);
        device.set_enabled(false);
        device.play(source, "hum");
        assert_eq!(device.active_sounds().len(), 0);
        assert!(!device.stop(source));
    }
}
