use bevy::prelude::*;

use crate::{
    components::{Lifetime, Velocity},
    game::{AppState, SimSet, ARENA_HALF_HEIGHT, ARENA_HALF_WIDTH},
};

const PROJECTILE_Z: f32 = 0.7;
const PLAYER_PROJECTILE_LIFETIME_SECS: f32 = 1.4;
const ENEMY_PROJECTILE_LIFETIME_SECS: f32 = 3.5;
const SNIPER_PROJECTILE_LIFETIME_SECS: f32 = 1.2;
const OUT_OF_ARENA_MARGIN: f32 = 120.0;

pub const PLAYER_PROJECTILE_RADIUS: f32 = 6.0;
pub const ENEMY_PROJECTILE_RADIUS: f32 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Faction {
    Player,
    Enemy,
}

#[derive(Debug, Clone, Copy)]
pub struct BurnPayload {
    pub dps: f32,
    pub duration_secs: f32,
}

#[derive(Component)]
pub struct Projectile {
    pub faction: Faction,
    pub damage: i32,
    pub pierce_left: u32,
    pub already_hit: Vec<Entity>,
    pub burn: Option<BurnPayload>,
    pub is_sniper: bool,
    /// Spawning entity, skipped in collision checks and credited on kills.
    pub owner: Option<Entity>,
    /// Boss-phase membership: the phase's idle transition is gated on every
    /// projectile/hazard in the group being gone.
    pub group: Option<crate::hazards::HazardGroupId>,
}

/// Boss pattern bullet. Carries the phase group id and never pierces.
pub fn spawn_boss_projectile(
    commands: &mut Commands,
    owner: Entity,
    position: Vec2,
    velocity: Vec2,
    damage: i32,
    lifetime_secs: f32,
    group: Option<crate::hazards::HazardGroupId>,
) {
    commands.spawn((
        SpriteBundle {
            sprite: Sprite {
                custom_size: Some(Vec2::splat(ENEMY_PROJECTILE_RADIUS * 2.2)),
                color: Color::rgb(1.0, 0.3, 0.65),
                ..default()
            },
            transform: Transform::from_translation(position.extend(PROJECTILE_Z))
                .with_rotation(Quat::from_rotation_z(velocity.y.atan2(velocity.x))),
            ..default()
        },
        Projectile {
            faction: Faction::Enemy,
            damage,
            pierce_left: 0,
            already_hit: Vec::new(),
            burn: None,
            is_sniper: false,
            owner: Some(owner),
            group,
        },
        Velocity(velocity),
        Lifetime { timer: Timer::from_seconds(lifetime_secs, TimerMode::Once) },
        Name::new("BossBullet"),
    ));
}

pub fn spawn_player_projectile(
    commands: &mut Commands,
    owner: Entity,
    position: Vec2,
    velocity: Vec2,
    damage: i32,
    pierce: u32,
    burn: Option<BurnPayload>,
) {
    let color = if burn.is_some() { Color::rgb(1.0, 0.55, 0.2) } else { Color::rgb(0.75, 0.95, 1.0) };
    commands.spawn((
        SpriteBundle {
            sprite: Sprite {
                custom_size: Some(Vec2::splat(PLAYER_PROJECTILE_RADIUS * 2.0)),
                color,
                ..default()
            },
            transform: Transform::from_translation(position.extend(PROJECTILE_Z))
                .with_rotation(Quat::from_rotation_z(velocity.y.atan2(velocity.x))),
            ..default()
        },
        Projectile {
            faction: Faction::Player,
            damage,
            pierce_left: pierce,
            already_hit: Vec::new(),
            burn,
            is_sniper: false,
            owner: Some(owner),
            group: None,
        },
        Velocity(velocity),
        Lifetime { timer: Timer::from_seconds(PLAYER_PROJECTILE_LIFETIME_SECS, TimerMode::Once) },
        Name::new("GlowBolt"),
    ));
}

pub fn spawn_enemy_projectile(
    commands: &mut Commands,
    position: Vec2,
    velocity: Vec2,
    damage: i32,
    is_sniper: bool,
) {
    let (color, lifetime) = if is_sniper {
        (Color::rgb(0.5, 1.0, 0.7), SNIPER_PROJECTILE_LIFETIME_SECS)
    } else {
        (Color::rgb(0.9, 0.4, 0.5), ENEMY_PROJECTILE_LIFETIME_SECS)
    };
    commands.spawn((
        SpriteBundle {
            sprite: Sprite {
                custom_size: Some(Vec2::splat(ENEMY_PROJECTILE_RADIUS * 2.0)),
                color,
                ..default()
            },
            transform: Transform::from_translation(position.extend(PROJECTILE_Z))
                .with_rotation(Quat::from_rotation_z(velocity.y.atan2(velocity.x))),
            ..default()
        },
        Projectile {
            faction: Faction::Enemy,
            damage,
            pierce_left: 0,
            already_hit: Vec::new(),
            burn: None,
            is_sniper,
            owner: None,
            group: None,
        },
        Velocity(velocity),
        Lifetime { timer: Timer::from_seconds(lifetime, TimerMode::Once) },
        Name::new(if is_sniper { "SniperShot" } else { "EnemyShot" }),
    ));
}

pub struct ProjectilesPlugin;

impl Plugin for ProjectilesPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            projectile_movement_system
                .in_set(SimSet::ProjectileMove)
                .run_if(in_state(AppState::InGame)),
        )
        .add_systems(
            Update,
            projectile_cleanup_system
                .in_set(SimSet::Cleanup)
                .run_if(in_state(AppState::InGame)),
        );
    }
}

fn projectile_movement_system(
    time: Res<Time>,
    mut query: Query<(&mut Transform, &Velocity), With<Projectile>>,
) {
    let dt = time.delta_seconds().min(0.066);
    for (mut transform, velocity) in query.iter_mut() {
        transform.translation.x += velocity.0.x * dt;
        transform.translation.y += velocity.0.y * dt;
    }
}

fn projectile_cleanup_system(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &Transform, &Velocity, &mut Lifetime), With<Projectile>>,
) {
    for (entity, transform, velocity, mut lifetime) in query.iter_mut() {
        lifetime.timer.tick(time.delta());
        let pos = transform.translation;
        // Starfall bullets start above the arena, so only cull bullets that
        // are outside the margin and still heading further out.
        let leaving_x = pos.x.abs() > ARENA_HALF_WIDTH + OUT_OF_ARENA_MARGIN
            && pos.x * velocity.0.x >= 0.0;
        let leaving_y = pos.y.abs() > ARENA_HALF_HEIGHT + OUT_OF_ARENA_MARGIN
            && pos.y * velocity.0.y >= 0.0;
        if lifetime.timer.finished() || leaving_x || leaving_y {
            commands.entity(entity).despawn_recursive();
        }
    }
}
