use bevy::{prelude::*, window::PrimaryWindow};
use rand::Rng;

use crate::{
    components::{Health, Knockback, MaxHealth, Slowed, Velocity},
    enemy::Enemy,
    game::{AppState, SimSet, ARENA_HALF_HEIGHT, ARENA_HALF_WIDTH},
    loadout::PlayerLoadout,
    projectiles::{spawn_player_projectile, BurnPayload},
    audio::{PlaySoundEvent, SoundEffect},
};

pub const PLAYER_RADIUS: f32 = 22.0;
pub const INITIAL_PLAYER_MAX_HEALTH: i32 = 100;
pub const INITIAL_LIVES: u32 = 2;
const BASE_PLAYER_SPEED: f32 = 260.0;
const PLAYER_Z: f32 = 1.0;

const SPAWN_PROTECTION_SECS: f32 = 1.5;
pub const REVIVE_NO_LETHAL_SECS: f32 = 4.0;
const DODGE_IFRAMES_SECS: f32 = 0.30;
const DODGE_SPEED_MULT: f32 = 2.6;
const DODGE_DURATION_SECS: f32 = 0.22;
const DODGE_COOLDOWN_SECS: f32 = 2.2;
const AIR_DODGE_COOLDOWN_SECS: f32 = 1.4;
const WATER_NOVA_RADIUS: f32 = 220.0;
const WATER_NOVA_SLOW: f32 = 0.45;
const WATER_NOVA_SLOW_SECS: f32 = 1.6;
const FIRE_BURN_DPS: f32 = 4.0;
const FIRE_BURN_SECS: f32 = 2.0;
/// Slow growth over a run, purely a hitbox/presence change.
const SIZE_GROWTH_PER_SEC: f32 = 0.08;
const SIZE_GROWTH_MAX: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Element {
    #[default]
    Fire,
    Water,
    Air,
}

#[derive(Resource, Default)]
pub struct ChosenElement(pub Element);

#[derive(Component)]
pub struct Glowling {
    pub element: Element,
    pub aim_direction: Vec2,
    pub lives: u32,
    pub size_bonus: f32,
    /// Invulnerability windows, countdown-by-delta so pausing the simulation
    /// pauses them too.
    pub spawn_protection_secs: f32,
    pub dodge_iframes_secs: f32,
    pub no_lethal_secs: f32,
    pub dodge_active_secs: f32,
    pub dodge_cooldown: Timer,
    pub fire_timer: Timer,
}

impl Glowling {
    pub fn new(element: Element) -> Self {
        let dodge_cooldown_secs = match element {
            Element::Air => AIR_DODGE_COOLDOWN_SECS,
            _ => DODGE_COOLDOWN_SECS,
        };
        let mut dodge_cooldown = Timer::from_seconds(dodge_cooldown_secs, TimerMode::Once);
        dodge_cooldown.tick(dodge_cooldown.duration());
        Self {
            element,
            aim_direction: Vec2::X,
            lives: INITIAL_LIVES,
            size_bonus: 0.0,
            spawn_protection_secs: SPAWN_PROTECTION_SECS,
            dodge_iframes_secs: 0.0,
            no_lethal_secs: 0.0,
            dodge_active_secs: 0.0,
            dodge_cooldown,
            fire_timer: Timer::from_seconds(crate::loadout::BASE_FIRE_INTERVAL_SECS, TimerMode::Repeating),
        }
    }

    pub fn radius(&self) -> f32 {
        PLAYER_RADIUS + self.size_bonus
    }

    /// Damage is suppressed while any window is open; projectiles keep
    /// moving and expiring regardless.
    pub fn is_invulnerable(&self) -> bool {
        self.spawn_protection_secs > 0.0 || self.dodge_iframes_secs > 0.0
    }

    pub fn tick_windows(&mut self, dt: f32) {
        self.spawn_protection_secs = (self.spawn_protection_secs - dt).max(0.0);
        self.dodge_iframes_secs = (self.dodge_iframes_secs - dt).max(0.0);
        self.no_lethal_secs = (self.no_lethal_secs - dt).max(0.0);
        self.dodge_active_secs = (self.dodge_active_secs - dt).max(0.0);
    }
}

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ChosenElement>()
            .add_systems(OnEnter(AppState::InGame), spawn_player.run_if(no_player_exists))
            .add_systems(
                Update,
                (
                    player_movement_system,
                    player_aiming_system,
                    player_dodge_system,
                    player_regen_system,
                    player_growth_system,
                )
                    .chain()
                    .in_set(SimSet::Abilities)
                    .run_if(in_state(AppState::InGame)),
            )
            .add_systems(
                Update,
                player_auto_attack_system
                    .in_set(SimSet::PlayerAttack)
                    .run_if(in_state(AppState::InGame)),
            );
    }
}

fn no_player_exists(query: Query<(), With<Glowling>>) -> bool {
    query.is_empty()
}

fn spawn_player(mut commands: Commands, element: Res<ChosenElement>) {
    commands.spawn((
        SpriteBundle {
            sprite: Sprite {
                custom_size: Some(Vec2::splat(PLAYER_RADIUS * 2.0)),
                color: match element.0 {
                    Element::Fire => Color::rgb(1.0, 0.6, 0.25),
                    Element::Water => Color::rgb(0.35, 0.65, 1.0),
                    Element::Air => Color::rgb(0.8, 1.0, 0.85),
                },
                ..default()
            },
            transform: Transform::from_xyz(0.0, 0.0, PLAYER_Z),
            ..default()
        },
        Glowling::new(element.0),
        Health(INITIAL_PLAYER_MAX_HEALTH),
        MaxHealth(INITIAL_PLAYER_MAX_HEALTH),
        Velocity(Vec2::ZERO),
        Knockback::default(),
        Name::new("Glowling"),
    ));
}

fn player_movement_system(
    keyboard_input: Res<ButtonInput<KeyCode>>,
    loadout: Res<PlayerLoadout>,
    time: Res<Time>,
    mut query: Query<(&mut Glowling, &mut Transform, &mut Velocity, &mut Knockback, Option<&Slowed>)>,
) {
    let dt = time.delta_seconds().min(0.066);
    for (mut glowling, mut transform, mut velocity, mut knockback, slowed) in query.iter_mut() {
        glowling.tick_windows(dt);

        let mut direction = Vec2::ZERO;
        if keyboard_input.pressed(KeyCode::KeyA) || keyboard_input.pressed(KeyCode::ArrowLeft) {
            direction.x -= 1.0;
        }
        if keyboard_input.pressed(KeyCode::KeyD) || keyboard_input.pressed(KeyCode::ArrowRight) {
            direction.x += 1.0;
        }
        if keyboard_input.pressed(KeyCode::KeyW) || keyboard_input.pressed(KeyCode::ArrowUp) {
            direction.y += 1.0;
        }
        if keyboard_input.pressed(KeyCode::KeyS) || keyboard_input.pressed(KeyCode::ArrowDown) {
            direction.y -= 1.0;
        }

        let mut speed = BASE_PLAYER_SPEED * loadout.speed_boost;
        if glowling.element == Element::Air {
            speed *= loadout.maneuver_boost.max(1.05);
        }
        if glowling.dodge_active_secs > 0.0 {
            speed *= DODGE_SPEED_MULT;
        }
        if let Some(s) = slowed {
            speed *= s.factor;
        }

        velocity.0 = if direction != Vec2::ZERO { direction.normalize() * speed } else { Vec2::ZERO };
        velocity.0 += knockback.0;
        knockback.0 *= (1.0 - 6.0 * dt).max(0.0);
        transform.translation.x =
            (transform.translation.x + velocity.0.x * dt).clamp(-ARENA_HALF_WIDTH, ARENA_HALF_WIDTH);
        transform.translation.y =
            (transform.translation.y + velocity.0.y * dt).clamp(-ARENA_HALF_HEIGHT, ARENA_HALF_HEIGHT);
    }
}

/// Mouse aim with a nearest-enemy fallback when no cursor position exists.
fn player_aiming_system(
    mut player_query: Query<(&mut Glowling, &Transform)>,
    enemy_query: Query<&Transform, (With<Enemy>, Without<Glowling>)>,
    window_query: Query<&Window, With<PrimaryWindow>>,
    camera_query: Query<(&Camera, &GlobalTransform)>,
) {
    let Ok((mut glowling, player_transform)) = player_query.get_single_mut() else { return };
    let player_pos = player_transform.translation.truncate();

    let cursor_world = window_query
        .get_single()
        .ok()
        .and_then(|w| w.cursor_position())
        .and_then(|cursor| {
            camera_query
                .get_single()
                .ok()
                .and_then(|(camera, camera_transform)| camera.viewport_to_world_2d(camera_transform, cursor))
        });

    if let Some(world_pos) = cursor_world {
        let dir = (world_pos - player_pos).normalize_or_zero();
        if dir != Vec2::ZERO {
            glowling.aim_direction = dir;
            return;
        }
    }
    // Fallback: nearest live enemy.
    let nearest = enemy_query
        .iter()
        .map(|t| t.translation.truncate())
        .min_by(|a, b| {
            a.distance_squared(player_pos)
                .partial_cmp(&b.distance_squared(player_pos))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    if let Some(target) = nearest {
        let dir = (target - player_pos).normalize_or_zero();
        if dir != Vec2::ZERO {
            glowling.aim_direction = dir;
        }
    }
}

fn player_dodge_system(
    mut commands: Commands,
    keyboard_input: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut player_query: Query<(&mut Glowling, &Transform)>,
    enemy_query: Query<(Entity, &Transform), With<Enemy>>,
    mut sound_events: EventWriter<PlaySoundEvent>,
) {
    let Ok((mut glowling, transform)) = player_query.get_single_mut() else { return };
    glowling.dodge_cooldown.tick(time.delta());
    let pressed = keyboard_input.just_pressed(KeyCode::Space)
        || keyboard_input.just_pressed(KeyCode::ShiftLeft);
    if !pressed || !glowling.dodge_cooldown.finished() {
        return;
    }
    glowling.dodge_active_secs = DODGE_DURATION_SECS;
    glowling.dodge_iframes_secs = DODGE_IFRAMES_SECS;
    glowling.dodge_cooldown.reset();
    sound_events.send(PlaySoundEvent(SoundEffect::Dodge));

    // Water glowlings shed a slowing nova on dodge.
    if glowling.element == Element::Water {
        let center = transform.translation.truncate();
        for (enemy_entity, enemy_transform) in enemy_query.iter() {
            if enemy_transform.translation.truncate().distance(center) <= WATER_NOVA_RADIUS {
                commands.entity(enemy_entity).insert(Slowed {
                    factor: WATER_NOVA_SLOW,
                    remaining_secs: WATER_NOVA_SLOW_SECS,
                });
            }
        }
    }
}

fn player_regen_system(
    time: Res<Time>,
    loadout: Res<PlayerLoadout>,
    mut query: Query<(&mut Health, &MaxHealth), With<Glowling>>,
    mut carry: Local<f32>,
) {
    if loadout.regen_per_sec <= 0.0 {
        return;
    }
    for (mut health, max_health) in query.iter_mut() {
        if health.0 <= 0 || health.0 >= max_health.0 {
            continue;
        }
        *carry += loadout.regen_per_sec * time.delta_seconds();
        let whole = carry.floor() as i32;
        if whole > 0 {
            *carry -= whole as f32;
            health.0 = (health.0 + whole).min(max_health.0);
        }
    }
}

fn player_growth_system(time: Res<Time>, mut query: Query<(&mut Glowling, &mut Sprite)>) {
    for (mut glowling, mut sprite) in query.iter_mut() {
        glowling.size_bonus = (glowling.size_bonus + SIZE_GROWTH_PER_SEC * time.delta_seconds()).min(SIZE_GROWTH_MAX);
        sprite.custom_size = Some(Vec2::splat(glowling.radius() * 2.0));
    }
}

fn player_auto_attack_system(
    mut commands: Commands,
    time: Res<Time>,
    loadout: Res<PlayerLoadout>,
    mut player_query: Query<(Entity, &Transform, &mut Glowling)>,
    enemy_query: Query<(), With<Enemy>>,
    mut sound_events: EventWriter<PlaySoundEvent>,
) {
    let Ok((player_entity, transform, mut glowling)) = player_query.get_single_mut() else { return };
    let interval = std::time::Duration::from_secs_f32(loadout.fire_interval_secs.max(0.05));
    if glowling.fire_timer.duration() != interval {
        glowling.fire_timer.set_duration(interval);
    }
    glowling.fire_timer.tick(time.delta());
    if !glowling.fire_timer.just_finished() || enemy_query.is_empty() {
        return;
    }
    let dir = glowling.aim_direction;
    if dir == Vec2::ZERO {
        return;
    }
    let mut rng = rand::thread_rng();
    let spread = rng.gen_range(-0.03..0.03);
    let aimed = Vec2::from_angle(spread).rotate(dir);
    let burn = (glowling.element == Element::Fire).then_some(BurnPayload {
        dps: FIRE_BURN_DPS,
        duration_secs: FIRE_BURN_SECS,
    });
    sound_events.send(PlaySoundEvent(SoundEffect::PlayerShot));
    spawn_player_projectile(
        &mut commands,
        player_entity,
        transform.translation.truncate(),
        aimed * loadout.projectile_speed,
        loadout.weapon_damage.floor() as i32,
        loadout.flat_pierce,
        burn,
    );
}
