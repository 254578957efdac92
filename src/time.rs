use std::time::{Duration, Instant};

/// Wall clock shared by every viewport in the process.
#[derive(Debug, Clone, Copy)]
pub struct AppClock {
    start: Instant,
}

impl Default for AppClock {
    fn default() -> Self {
        Self::new()
    }
}

impl AppClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.start)
    }
}

/// Time stamp handed to the renderer with a view family.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GameTime {
    pub real_seconds: f64,
    pub world_seconds: f64,
    pub delta_seconds: f32,
}

impl GameTime {
    pub fn from_app(seconds: f64, delta_seconds: f32) -> Self {
        Self { real_seconds: seconds, world_seconds: seconds, delta_seconds }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_time_mirrors_into_world_seconds() {
        let time = GameTime::from_app(2.5, 0.016);
        assert_eq!(time.real_seconds, time.world_seconds);
    }

    #[test]
    fn elapsed_never_goes_negative() {
        let clock = AppClock::new();
        let earlier = Instant::now() - Duration::from_secs(1);
        assert_eq!(clock.elapsed_at(earlier), Duration::ZERO);
    }
}
