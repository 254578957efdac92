//! Declarative actor list mirrored into a preview world.

use crate::actor_class::{ClassResolver, SoftClassRef};
use crate::ecs::{ObjectFlags, SpawnCollisionHandling, SpawnParameters};
use crate::math::{Transform, TransformData};
use crate::preview_world::PreviewWorld;
use anyhow::{Context, Result};
use bevy_ecs::prelude::Entity;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Non-owning handle to an actor spawned for an entry. Resolves to `None`
/// once the actor is destroyed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActorRef(Option<Entity>);

impl ActorRef {
    pub fn new(actor: Entity) -> Self {
        Self(Some(actor))
    }

    pub fn empty() -> Self {
        Self(None)
    }

    pub fn get(&self, world: &PreviewWorld) -> Option<Entity> {
        self.0.filter(|actor| world.is_actor_alive(*actor))
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    pub fn reset(&mut self) {
        self.0 = None;
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewportEntry {
    pub class: SoftClassRef,
    pub transform: Transform,
    pub spawned: ActorRef,
}

impl ViewportEntry {
    pub fn new(class: SoftClassRef, transform: Transform) -> Self {
        Self { class, transform, spawned: ActorRef::empty() }
    }

    /// Identity used for reconciliation: class reference plus transform hash.
    pub fn same_identity(&self, other: &ViewportEntry) -> bool {
        self.class == other.class && self.transform.value_hash() == other.transform.value_hash()
    }
}

/// Positional comparison; any length or per-index identity change counts.
pub fn entries_differ(current: &[ViewportEntry], incoming: &[ViewportEntry]) -> bool {
    current.len() != incoming.len() || current.iter().zip(incoming).any(|(a, b)| !a.same_identity(b))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub destroyed: usize,
    pub spawned: usize,
    pub unresolved: usize,
}

pub fn entry_spawn_parameters() -> SpawnParameters {
    SpawnParameters {
        collision_handling: SpawnCollisionHandling::AlwaysSpawn,
        no_fail: true,
        flags: ObjectFlags::TRANSIENT | ObjectFlags::TRANSACTIONAL,
        label: None,
    }
}

/// Destroys every actor spawned for `current`.
pub fn clean_entries(current: &mut [ViewportEntry], world: &mut PreviewWorld) -> usize {
    let mut destroyed = 0;
    for entry in current.iter_mut() {
        if let Some(actor) = entry.spawned.get(world) {
            if world.destroy_actor(actor) {
                destroyed += 1;
            }
        }
        entry.spawned.reset();
    }
    destroyed
}

/// Spawns an actor for each entry whose class resolves. Unresolvable
/// entries are skipped and keep an empty handle.
pub fn add_entries(
    entries: &mut [ViewportEntry],
    world: &mut PreviewWorld,
    resolver: &dyn ClassResolver,
    mut on_spawned: impl FnMut(usize, Entity, &mut PreviewWorld),
) -> ReconcileReport {
    let params = entry_spawn_parameters();
    let mut report = ReconcileReport::default();
    for (index, entry) in entries.iter_mut().enumerate() {
        let Some(class) = resolver.load_synchronous(&entry.class) else {
            log::debug!("[entries] entry {index}: class '{}' did not resolve; skipping", entry.class);
            report.unresolved += 1;
            continue;
        };
        if let Some(actor) = world.spawn_actor(class.as_ref(), entry.transform, &params) {
            entry.spawned = ActorRef::new(actor);
            report.spawned += 1;
            on_spawned(index, actor, world);
        }
    }
    report
}

/// Replaces `current` with `incoming` when the lists differ, tearing down
/// and rebuilding every actor. Returns `None` when nothing changed.
pub fn reconcile(
    current: &mut Vec<ViewportEntry>,
    incoming: &[ViewportEntry],
    world: &mut PreviewWorld,
    resolver: &dyn ClassResolver,
    on_spawned: impl FnMut(usize, Entity, &mut PreviewWorld),
) -> Option<ReconcileReport> {
    if !entries_differ(current, incoming) {
        return None;
    }
    let destroyed = clean_entries(current, world);
    *current = incoming.iter().map(|entry| ViewportEntry::new(entry.class.clone(), entry.transform)).collect();
    let mut report = add_entries(current, world, resolver, on_spawned);
    report.destroyed = destroyed;
    log::debug!(
        "[entries] rebuilt {} entries: destroyed={} spawned={} unresolved={}",
        current.len(),
        report.destroyed,
        report.spawned,
        report.unresolved
    );
    Some(report)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewportEntryData {
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub transform: TransformData,
}

impl From<ViewportEntryData> for ViewportEntry {
    fn from(data: ViewportEntryData) -> Self {
        let class = data.class.map_or_else(SoftClassRef::null, SoftClassRef::new);
        ViewportEntry::new(class, data.transform.into())
    }
}

pub fn parse_entries(json: &str) -> Result<Vec<ViewportEntry>> {
    let data: Vec<ViewportEntryData> = serde_json::from_str(json).context("Failed to parse viewport entries")?;
    Ok(data.into_iter().map(ViewportEntry::from).collect())
}

pub fn load_entries(path: impl AsRef<Path>) -> Result<Vec<ViewportEntry>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read entries file {}", path.display()))?;
    parse_entries(&text).with_context(|| format!("Invalid entries file {}", path.display()))
}
