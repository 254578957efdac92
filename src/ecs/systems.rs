use super::types::*;
use bevy_ecs::prelude::*;
use glam::Quat;

#[derive(Resource, Clone, Copy)]
pub struct TimeDelta(pub f32);

pub fn sys_advance_world_time(mut time: ResMut<WorldTime>, dt: Res<TimeDelta>) {
    time.delta_seconds = dt.0;
    time.time_seconds += f64::from(dt.0);
    time.real_time_seconds += f64::from(dt.0);
    time.frame_number += 1;
}

pub fn sys_apply_spin(mut q: Query<(&mut ActorTransform, &Spin)>, dt: Res<TimeDelta>) {
    for (mut transform, spin) in &mut q {
        let step = Quat::from_rotation_z((spin.degrees_per_second * dt.0).to_radians());
        transform.0.rotation = (step * transform.0.rotation).normalize();
    }
}

pub fn sys_propagate_component_transforms(
    actors: Query<&ActorTransform>,
    mut components: Query<(&SceneComponent, &RelativeTransform, &mut WorldTransform3D)>,
) {
    for (component, relative, mut world) in &mut components {
        let local = relative.0.to_matrix();
        world.0 = match component.owner.and_then(|owner| actors.get(owner).ok()) {
            Some(owner) => owner.0.to_matrix() * local,
            None => local,
        };
    }
}

pub fn sys_expire_line_batches(
    mut batchers: ResMut<WorldLineBatchers>,
    mut batches: Query<&mut LineBatch>,
    dt: Res<TimeDelta>,
) {
    batchers.persistent.expire(dt.0);
    batchers.foreground.expire(dt.0);
    for mut batch in &mut batches {
        if !batch.is_empty() {
            batch.expire(dt.0);
        }
    }
}
