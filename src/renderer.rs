//! Render submission: what a viewport hands off once its views are built.

#[cfg(feature = "gpu")]
mod gpu_sink;

#[cfg(feature = "gpu")]
pub use gpu_sink::GpuFrameSink;

use crate::ecs::WorldId;
use crate::math::IntRect;
use crate::show_flags::{ShowFlags, ViewMode};
use crate::stereo::StereoPass;
use crate::time::GameTime;
use crate::view::{FinalPostProcessSettings, SceneViewFamily};
use crate::visualization::VisualizationModes;
use anyhow::{Context, Result};
use glam::{Mat4, Vec3, Vec4};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};
use uuid::Uuid;
use winit::dpi::PhysicalSize;

/// Surface a view family renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTarget {
    pub id: Uuid,
    pub size: PhysicalSize<u32>,
}

impl RenderTarget {
    pub fn new(size: PhysicalSize<u32>) -> Self {
        Self { id: Uuid::new_v4(), size }
    }

    pub fn rect(&self) -> IntRect {
        IntRect::from_size(glam::IVec2::new(self.size.width as i32, self.size.height as i32))
    }
}

/// Consumer of assembled view families.
pub trait RenderSubmitter {
    /// Queues the family for rendering; may return before the work is done.
    fn begin_rendering_view_family(&mut self, family: &SceneViewFamily);

    /// Blocks until every queued family has been processed.
    fn flush_rendering_commands(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub view_rect: IntRect,
    pub view_origin: Vec3,
    pub view_matrix: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
    pub fov_degrees: f32,
    pub near_clip_plane: f32,
    pub stereo_pass: StereoPass,
    pub view_state_index: usize,
    pub background_color: Vec4,
    pub diffuse_override: Vec4,
    pub specular_override: Vec4,
    pub visualization: VisualizationModes,
    pub post_process: FinalPostProcessSettings,
}

/// Owned copy of a view family that can cross to the render thread.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub target: RenderTarget,
    pub world: Option<WorldId>,
    pub show_flags: ShowFlags,
    pub view_mode: ViewMode,
    pub realtime: bool,
    pub resolution_fraction: f32,
    pub time: GameTime,
    pub extensions: Vec<String>,
    pub views: Vec<ViewSnapshot>,
}

impl FrameSnapshot {
    pub fn capture(family: &SceneViewFamily) -> Self {
        let views = family
            .views
            .iter()
            .map(|view| ViewSnapshot {
                view_rect: view.view_rect,
                view_origin: view.view_origin,
                view_matrix: view.matrices.view,
                projection: view.matrices.projection,
                view_projection: view.matrices.view_projection,
                fov_degrees: view.fov_degrees,
                near_clip_plane: view.near_clip_plane,
                stereo_pass: view.stereo_pass,
                view_state_index: view.view_state_index,
                background_color: view.background_color,
                diffuse_override: view.diffuse_override,
                specular_override: view.specular_override,
                visualization: view.visualization.clone(),
                post_process: view.post_process.clone(),
            })
            .collect();
        Self {
            target: family.render_target,
            world: family.world,
            show_flags: family.show_flags,
            view_mode: family.view_mode,
            realtime: family.realtime_update,
            resolution_fraction: family.resolution_fraction(),
            time: family.time,
            extensions: family.view_extensions.iter().map(|extension| extension.name().to_string()).collect(),
            views,
        }
    }
}

#[derive(Debug, Default)]
pub struct RecorderLog {
    pub frames: Vec<FrameSnapshot>,
    pub flushes: usize,
}

/// In-process submitter that keeps every frame it is given.
#[derive(Debug, Clone, Default)]
pub struct FrameRecorder {
    log: Rc<RefCell<RecorderLog>>,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared view of the recorded frames; stays valid after the recorder
    /// is boxed into a viewport.
    pub fn log(&self) -> Rc<RefCell<RecorderLog>> {
        Rc::clone(&self.log)
    }
}

impl RenderSubmitter for FrameRecorder {
    fn begin_rendering_view_family(&mut self, family: &SceneViewFamily) {
        self.log.borrow_mut().frames.push(FrameSnapshot::capture(family));
    }

    fn flush_rendering_commands(&mut self) {
        self.log.borrow_mut().flushes += 1;
    }
}

/// Backend executed on the render thread.
pub trait FrameSink: Send {
    fn render(&mut self, frame: &FrameSnapshot) -> Result<()>;
}

/// Sink that only counts frames; used when no GPU is wanted.
#[derive(Debug, Default)]
pub struct NullFrameSink;

impl FrameSink for NullFrameSink {
    fn render(&mut self, _frame: &FrameSnapshot) -> Result<()> {
        Ok(())
    }
}

/// Sink that forwards frames into a shared list.
#[derive(Debug, Clone, Default)]
pub struct CollectingFrameSink {
    frames: Arc<Mutex<Vec<FrameSnapshot>>>,
}

impl CollectingFrameSink {
    pub fn frames(&self) -> Arc<Mutex<Vec<FrameSnapshot>>> {
        Arc::clone(&self.frames)
    }
}

impl FrameSink for CollectingFrameSink {
    fn render(&mut self, frame: &FrameSnapshot) -> Result<()> {
        match self.frames.lock() {
            Ok(mut frames) => frames.push(frame.clone()),
            Err(poisoned) => poisoned.into_inner().push(frame.clone()),
        }
        Ok(())
    }
}

enum RenderCommand {
    Frame(Box<FrameSnapshot>),
    Fence(mpsc::Sender<()>),
}

#[derive(Debug, Default)]
pub struct RenderStats {
    pub frames_rendered: AtomicU64,
    pub frames_failed: AtomicU64,
}

/// Worker thread that renders submitted frames in order. Flushing waits for
/// a fence to come back, so it blocks for as long as the sink takes.
pub struct RenderThread {
    tx: Option<mpsc::Sender<RenderCommand>>,
    handle: Option<JoinHandle<()>>,
    stats: Arc<RenderStats>,
    submitted: u64,
}

impl RenderThread {
    pub fn spawn<S: FrameSink + 'static>(mut sink: S) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<RenderCommand>();
        let stats = Arc::new(RenderStats::default());
        let thread_stats = Arc::clone(&stats);
        let handle = thread::Builder::new()
            .name("viewport-render".to_string())
            .spawn(move || {
                while let Ok(command) = rx.recv() {
                    match command {
                        RenderCommand::Frame(frame) => match sink.render(&frame) {
                            Ok(()) => {
                                thread_stats.frames_rendered.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(err) => {
                                thread_stats.frames_failed.fetch_add(1, Ordering::Relaxed);
                                log::warn!("[render] frame failed: {err:?}");
                            }
                        },
                        RenderCommand::Fence(done) => {
                            let _ = done.send(());
                        }
                    }
                }
            })
            .context("Failed to spawn render thread")?;
        Ok(Self { tx: Some(tx), handle: Some(handle), stats, submitted: 0 })
    }

    pub fn stats(&self) -> Arc<RenderStats> {
        Arc::clone(&self.stats)
    }

    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    fn send(&self, command: RenderCommand) -> bool {
        self.tx.as_ref().is_some_and(|tx| tx.send(command).is_ok())
    }
}

impl RenderSubmitter for RenderThread {
    fn begin_rendering_view_family(&mut self, family: &SceneViewFamily) {
        if self.send(RenderCommand::Frame(Box::new(FrameSnapshot::capture(family)))) {
            self.submitted += 1;
        } else {
            log::warn!("[render] render thread is gone; dropping frame");
        }
    }

    fn flush_rendering_commands(&mut self) {
        let (done_tx, done_rx) = mpsc::channel();
        if self.send(RenderCommand::Fence(done_tx)) {
            let _ = done_rx.recv();
        }
    }
}

impl Drop for RenderThread {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("[render] render thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::GameTime;

    fn family() -> SceneViewFamily {
        let target = RenderTarget::new(PhysicalSize::new(64, 32));
        SceneViewFamily::new(target, None, ShowFlags::empty(), GameTime::default())
    }

    #[test]
    fn recorder_log_outlives_the_boxed_submitter() {
        let recorder = FrameRecorder::new();
        let log = recorder.log();
        let mut submitter: Box<dyn RenderSubmitter> = Box::new(recorder);
        submitter.begin_rendering_view_family(&family());
        submitter.flush_rendering_commands();
        assert_eq!(log.borrow().frames.len(), 1);
        assert_eq!(log.borrow().flushes, 1);
    }

    #[test]
    fn flush_waits_for_every_queued_frame() {
        let sink = CollectingFrameSink::default();
        let frames = sink.frames();
        let mut thread = RenderThread::spawn(sink).expect("spawn");
        for _ in 0..3 {
            thread.begin_rendering_view_family(&family());
        }
        thread.flush_rendering_commands();
        assert_eq!(frames.lock().expect("lock").len(), 3);
        assert_eq!(thread.stats().frames_rendered.load(Ordering::Relaxed), 3);
        assert_eq!(thread.submitted(), 3);
    }
}
