//! Widget tying a preview world, its entries and a viewport client into a
//! single per-frame tick.

use crate::actor_class::ClassResolver;
use crate::client::{RenderServices, ViewportClient};
use crate::config::ViewportConfig;
use crate::entries::{reconcile, ReconcileReport, ViewportEntry};
use crate::math::Transform;
use crate::preview_world::PreviewWorld;
use crate::viewport::SceneViewport;
use bevy_ecs::prelude::Entity;
use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};
use winit::dpi::PhysicalSize;

/// Initial properties handed over by the owning UI element.
#[derive(Debug, Clone, Default)]
pub struct ViewportWidgetArgs {
    pub view_transform: Transform,
    pub entries: Vec<ViewportEntry>,
}

type SpawnHook = Box<dyn FnMut(usize, Entity, &mut PreviewWorld)>;

pub struct ViewportWidget {
    client: ViewportClient,
    scene_viewport: Rc<RefCell<SceneViewport>>,
    preview_world: PreviewWorld,
    services: RenderServices,
    resolver: Rc<dyn ClassResolver>,
    last_tick: Rc<Cell<Option<Instant>>>,
    visibility_threshold: Duration,
    view_transform_hash: Option<u64>,
    entries: Option<Vec<ViewportEntry>>,
    on_actor_spawned: Option<SpawnHook>,
    last_reconcile: Option<ReconcileReport>,
}

impl ViewportWidget {
    pub fn new(
        args: ViewportWidgetArgs,
        services: RenderServices,
        resolver: Rc<dyn ClassResolver>,
        config: &ViewportConfig,
    ) -> Self {
        let mut client = ViewportClient::new(config.client_settings());
        client.set_realtime(config.rendering.realtime);

        let last_tick = Rc::new(Cell::new(None));
        let visibility_threshold = config.widget.visibility_threshold();
        let tick_clock = Rc::clone(&last_tick);
        client.set_visibility_delegate(move || ticked_recently(tick_clock.get(), Instant::now(), visibility_threshold));

        let size = PhysicalSize::new(config.widget.width, config.widget.height);
        let scene_viewport = Rc::new(RefCell::new(SceneViewport::new(size, config.widget.dpi_scale)));
        client.set_viewport(Some(Rc::clone(&scene_viewport)));

        let preview_world = PreviewWorld::new(&config.preview_world);
        log::info!("[viewport] widget created: {}x{} world={}", size.width, size.height, preview_world.id());

        let mut widget = Self {
            client,
            scene_viewport,
            preview_world,
            services,
            resolver,
            last_tick,
            visibility_threshold,
            view_transform_hash: None,
            entries: None,
            on_actor_spawned: None,
            last_reconcile: None,
        };
        widget.set_view_transform(args.view_transform);
        widget.set_entries(&args.entries);
        widget
    }

    pub fn client(&self) -> &ViewportClient {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut ViewportClient {
        &mut self.client
    }

    pub fn preview_world(&self) -> &PreviewWorld {
        &self.preview_world
    }

    pub fn preview_world_mut(&mut self) -> &mut PreviewWorld {
        &mut self.preview_world
    }

    pub fn scene_viewport(&self) -> Ref<'_, SceneViewport> {
        self.scene_viewport.borrow()
    }

    pub fn services_mut(&mut self) -> &mut RenderServices {
        &mut self.services
    }

    /// Called after each entry actor spawns, with the entry index.
    pub fn set_on_actor_spawned(&mut self, hook: impl FnMut(usize, Entity, &mut PreviewWorld) + 'static) {
        self.on_actor_spawned = Some(Box::new(hook));
    }

    /// Moves the active camera. Returns `false` when the transform matches
    /// the last one applied.
    pub fn set_view_transform(&mut self, transform: Transform) -> bool {
        let hash = transform.value_hash();
        if self.view_transform_hash == Some(hash) {
            return false;
        }
        self.view_transform_hash = Some(hash);
        self.client.set_view_location(transform.translation);
        self.client.set_view_rotation(transform.rotator());
        true
    }

    /// Mirrors `entries` into the preview world. Any positional difference
    /// rebuilds every actor; an identical list is a no-op returning `None`.
    pub fn set_entries(&mut self, entries: &[ViewportEntry]) -> Option<ReconcileReport> {
        let current = self.entries.get_or_insert_with(Vec::new);
        let hook = &mut self.on_actor_spawned;
        let report = reconcile(current, entries, &mut self.preview_world, self.resolver.as_ref(), |index, actor, world| {
            if let Some(hook) = hook.as_mut() {
                hook(index, actor, world);
            }
        });
        if report.is_some() {
            self.last_reconcile = report;
        }
        report
    }

    pub fn entries(&self) -> &[ViewportEntry] {
        self.entries.as_deref().unwrap_or_default()
    }

    pub fn last_reconcile(&self) -> Option<ReconcileReport> {
        self.last_reconcile
    }

    pub fn spawned_actor(&self, index: usize) -> Option<Entity> {
        self.entries.as_ref()?.get(index)?.spawned.get(&self.preview_world)
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.scene_viewport.borrow_mut().resize(size);
    }

    /// Advances the scene and draws it when the client reports visible.
    pub fn tick(&mut self, delta_seconds: f32) {
        self.last_tick.set(Some(Instant::now()));
        self.preview_world.update_captures();
        self.preview_world.clear_line_batcher();
        self.preview_world.tick(delta_seconds);
        self.client.tick(delta_seconds);
        if self.client.is_visible() {
            self.client.draw(Some(&mut self.preview_world), &mut self.services);
        } else {
            self.scene_viewport.borrow_mut().skip_draw();
        }
    }

    pub fn is_visible(&self) -> bool {
        self.is_visible_at(Instant::now())
    }

    /// A widget that has never ticked counts as visible.
    pub fn is_visible_at(&self, now: Instant) -> bool {
        ticked_recently(self.last_tick.get(), now, self.visibility_threshold)
    }
}

impl Drop for ViewportWidget {
    fn drop(&mut self) {
        self.client.set_viewport(None);
        if Rc::strong_count(&self.scene_viewport) != 1 && !std::thread::panicking() {
            panic!("scene viewport is still shared when its widget is destroyed");
        }
    }
}

fn ticked_recently(last_tick: Option<Instant>, now: Instant, threshold: Duration) -> bool {
    last_tick.map_or(true, |last| now.saturating_duration_since(last) <= threshold)
}
