use anyhow::Result;
use kestrel_viewport::actor_class::{ActorClassRegistry, ClassResolver};
use kestrel_viewport::cli::{CliOptions, RenderBackend};
use kestrel_viewport::client::RenderServices;
use kestrel_viewport::config::ViewportConfig;
use kestrel_viewport::entries::load_entries;
use kestrel_viewport::renderer::{FrameSnapshot, NullFrameSink, RenderSubmitter, RenderThread};
use kestrel_viewport::widget::{ViewportWidget, ViewportWidgetArgs};
use std::process;
use std::rc::Rc;
use std::sync::atomic::Ordering;

const DEFAULT_FRAMES: u32 = 3;
const FRAME_DELTA: f32 = 1.0 / 60.0;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("error: {err:?}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse_from_env()?;
    let mut config = match &options.config {
        Some(path) => ViewportConfig::load(path)?,
        None => ViewportConfig::default(),
    };
    let overrides = options.config_overrides();
    if !overrides.is_empty() {
        println!("[probe] overrides applied: {}", overrides.applied_fields().join(", "));
        config.apply_overrides(&overrides);
    }
    let entries = match &options.entries {
        Some(path) => load_entries(path)?,
        None => Vec::new(),
    };
    let frames = options.frames.unwrap_or(DEFAULT_FRAMES);
    let resolver: Rc<dyn ClassResolver> = Rc::new(ActorClassRegistry::with_builtin_classes());
    let args = ViewportWidgetArgs { entries, ..Default::default() };

    match options.backend {
        RenderBackend::Record => {
            let (services, log) = RenderServices::recording();
            let mut widget = ViewportWidget::new(args, services, resolver, &config);
            report_entries(&widget);
            tick_frames(&mut widget, frames);
            let log = log.borrow();
            for (index, frame) in log.frames.iter().enumerate() {
                print_frame(index, frame);
            }
            println!("[probe] {} frames recorded, {} flushes", log.frames.len(), log.flushes);
        }
        RenderBackend::Thread => {
            let thread = RenderThread::spawn(NullFrameSink)?;
            run_threaded(thread, args, resolver, &config, frames);
        }
        RenderBackend::Gpu => {
            #[cfg(feature = "gpu")]
            {
                let sink = kestrel_viewport::renderer::GpuFrameSink::new()?;
                let thread = RenderThread::spawn(sink)?;
                run_threaded(thread, args, resolver, &config, frames);
            }
            #[cfg(not(feature = "gpu"))]
            anyhow::bail!("the gpu backend requires building with the 'gpu' feature");
        }
    }
    Ok(())
}

fn run_threaded(
    thread: RenderThread,
    args: ViewportWidgetArgs,
    resolver: Rc<dyn ClassResolver>,
    config: &ViewportConfig,
    frames: u32,
) {
    let stats = thread.stats();
    let mut widget = ViewportWidget::new(args, RenderServices::new(thread), resolver, config);
    report_entries(&widget);
    tick_frames(&mut widget, frames);
    widget.services_mut().submitter.flush_rendering_commands();
    println!(
        "[probe] rendered={} failed={}",
        stats.frames_rendered.load(Ordering::Relaxed),
        stats.frames_failed.load(Ordering::Relaxed)
    );
}

fn tick_frames(widget: &mut ViewportWidget, frames: u32) {
    for _ in 0..frames {
        widget.tick(FRAME_DELTA);
    }
}

fn report_entries(widget: &ViewportWidget) {
    for (index, entry) in widget.entries().iter().enumerate() {
        match widget.spawned_actor(index) {
            Some(actor) => println!("[probe] entry {index}: {} -> {actor:?}", entry.class),
            None => println!("[probe] entry {index}: {} -> (nothing spawned)", entry.class),
        }
    }
}

fn print_frame(index: usize, frame: &FrameSnapshot) {
    println!(
        "frame {index}: target={}x{} mode={:?} fraction={:.3} t={:.3}s views={}",
        frame.target.size.width,
        frame.target.size.height,
        frame.view_mode,
        frame.resolution_fraction,
        frame.time.world_seconds,
        frame.views.len()
    );
    for view in &frame.views {
        println!(
            "  view {:?} rect=({}, {})-({}, {}) origin=({:.1}, {:.1}, {:.1}) fov={:.1}",
            view.stereo_pass,
            view.view_rect.min.x,
            view.view_rect.min.y,
            view.view_rect.max.x,
            view.view_rect.max.y,
            view.view_origin.x,
            view.view_origin.y,
            view.view_origin.z,
            view.fov_degrees
        );
    }
}
