use bevy::prelude::*;

use crate::{
    components::{Lifetime, Slowed},
    game::{AppState, SimSet, ARENA_HALF_HEIGHT, ARENA_HALF_WIDTH},
    player::{Glowling, PLAYER_RADIUS},
};

const HAZARD_Z: f32 = 0.45;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HazardGroupId(pub u64);

/// Monotonic id source so each boss phase can tag its hazards.
#[derive(Resource, Default)]
pub struct HazardGroups {
    next: u64,
}

impl HazardGroups {
    pub fn allocate(&mut self) -> HazardGroupId {
        self.next += 1;
        HazardGroupId(self.next)
    }
}

/// Boss-spawned area threat: a moving/rotating/expanding shape that damages
/// and optionally slows the player while it overlaps them.
#[derive(Component)]
pub struct Hazard {
    pub radius: f32,
    pub expand_rate: f32,
    pub move_dir: Vec2,
    pub move_speed: f32,
    pub bounce_walls: bool,
    pub rot_vel: f32,
    pub slow_factor: Option<f32>,
    pub dps: f32,
    pub group: Option<HazardGroupId>,
    carry: f32,
}

pub struct HazardSpec {
    pub position: Vec2,
    pub radius: f32,
    pub expand_rate: f32,
    pub move_dir: Vec2,
    pub move_speed: f32,
    pub bounce_walls: bool,
    pub rot_vel: f32,
    pub slow_factor: Option<f32>,
    pub dps: f32,
    pub life_secs: f32,
    pub group: Option<HazardGroupId>,
    pub color: Color,
}

pub fn spawn_hazard(commands: &mut Commands, spec: HazardSpec) -> Entity {
    commands
        .spawn((
            SpriteBundle {
                sprite: Sprite {
                    custom_size: Some(Vec2::splat(spec.radius * 2.0)),
                    color: spec.color,
                    ..default()
                },
                transform: Transform::from_translation(spec.position.extend(HAZARD_Z)),
                ..default()
            },
            Hazard {
                radius: spec.radius,
                expand_rate: spec.expand_rate,
                move_dir: spec.move_dir,
                move_speed: spec.move_speed,
                bounce_walls: spec.bounce_walls,
                rot_vel: spec.rot_vel,
                slow_factor: spec.slow_factor,
                dps: spec.dps,
                group: spec.group,
                carry: 0.0,
            },
            Lifetime { timer: Timer::from_seconds(spec.life_secs, TimerMode::Once) },
            Name::new("BossHazard"),
        ))
        .id()
}

pub struct HazardsPlugin;

impl Plugin for HazardsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HazardGroups>()
            .add_systems(
                Update,
                hazard_update_system
                    .in_set(SimSet::ProjectileMove)
                    .run_if(in_state(AppState::InGame)),
            )
            .add_systems(
                Update,
                hazard_player_overlap_system
                    .in_set(SimSet::Combat)
                    .run_if(in_state(AppState::InGame)),
            );
    }
}

fn hazard_update_system(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut Transform, &mut Hazard, &mut Sprite, &mut Lifetime)>,
) {
    let dt = time.delta_seconds().min(0.066);
    for (entity, mut transform, mut hazard, mut sprite, mut lifetime) in query.iter_mut() {
        lifetime.timer.tick(time.delta());
        if lifetime.timer.finished() {
            commands.entity(entity).despawn_recursive();
            continue;
        }
        if hazard.move_speed != 0.0 {
            let delta = hazard.move_dir * hazard.move_speed * dt;
            transform.translation.x += delta.x;
            transform.translation.y += delta.y;
            if hazard.bounce_walls {
                let pos = transform.translation;
                if pos.x.abs() > ARENA_HALF_WIDTH - hazard.radius {
                    hazard.move_dir.x = -hazard.move_dir.x;
                    transform.translation.x = pos.x.clamp(-ARENA_HALF_WIDTH + hazard.radius, ARENA_HALF_WIDTH - hazard.radius);
                }
                if pos.y.abs() > ARENA_HALF_HEIGHT - hazard.radius {
                    hazard.move_dir.y = -hazard.move_dir.y;
                    transform.translation.y = pos.y.clamp(-ARENA_HALF_HEIGHT + hazard.radius, ARENA_HALF_HEIGHT - hazard.radius);
                }
            }
        }
        if hazard.rot_vel != 0.0 {
            transform.rotate_z(hazard.rot_vel * dt);
        }
        if hazard.expand_rate != 0.0 {
            hazard.radius += hazard.expand_rate * dt;
            sprite.custom_size = Some(Vec2::splat(hazard.radius * 2.0));
        }
    }
}

/// Hazard contact: slow applies immediately; damage accumulates through a
/// fractional carry and is handed to the combat resolver as whole points so
/// invulnerability windows are honored in one place. Continuous contact
/// damage skips flat armor (see `PlayerDamageEvent::bypass_armor`).
fn hazard_player_overlap_system(
    mut commands: Commands,
    time: Res<Time>,
    mut hazard_query: Query<(&Transform, &mut Hazard)>,
    player_query: Query<(Entity, &Transform), With<Glowling>>,
    mut damage_events: EventWriter<crate::combat::PlayerDamageEvent>,
) {
    let dt = time.delta_seconds().min(0.066);
    let Ok((player_entity, player_transform)) = player_query.get_single() else { return };
    let player_pos = player_transform.translation.truncate();

    for (transform, mut hazard) in hazard_query.iter_mut() {
        let distance = transform.translation.truncate().distance(player_pos);
        if distance > hazard.radius + PLAYER_RADIUS {
            continue;
        }
        if let Some(factor) = hazard.slow_factor {
            commands.entity(player_entity).insert(Slowed { factor, remaining_secs: 0.25 });
        }
        hazard.carry += hazard.dps * dt;
        let whole = hazard.carry.floor() as i32;
        if whole > 0 {
            hazard.carry -= whole as f32;
            damage_events.send(crate::combat::PlayerDamageEvent {
                damage: whole,
                bypass_armor: true,
            });
        }
    }
}
