use bevy::prelude::*;
use rand::Rng;

use crate::{
    audio::{PlaySoundEvent, SoundEffect},
    components::{Health, MaxHealth},
    enemy::{suppress_ranged, BloodmageBehavior, Enemy, ShooterBehavior, SniperBehavior},
    errors::BossCastError,
    game::{AppState, GameState, SimSet, ARENA_HALF_HEIGHT, ARENA_HALF_WIDTH},
    hazards::{spawn_hazard, Hazard, HazardGroupId, HazardGroups, HazardSpec},
    loadout::PlayerLoadout,
    player::Glowling,
    projectiles::{spawn_boss_projectile, Projectile},
    waves::{is_boss_wave, WaveRuntime},
};

pub const BOSS_RADIUS: f32 = 52.0;
const BOSS_Z: f32 = 0.6;
const BOSS_BASE_SPEED: f32 = 70.0;
const BOSS_SPAWN_DISTANCE: f32 = 420.0;

const IDLE_SECS: f32 = 2.0;
const ENRAGE_HP_FRACTION: f32 = 0.5;
const ENRAGE_SPEED_MULT: f32 = 1.15;
const ENRAGE_COOLDOWN_MULT: f32 = 0.8;

/// Pattern damage as hand-tuned multiples of the player's current base weapon
/// damage. The values are preserved as-is, not re-derived.
const WAVE5_DAMAGE_MULT: f32 = 1.4;
const WAVE10_DAMAGE_MULT: f32 = 3.24;
const WAVE15_DAMAGE_MULT: f32 = 1.6;
const FINAL_DAMAGE_MULT: f32 = 3.24;

const CONE_BURST_COUNT: u32 = 9;
const CONE_BURST_ARC: f32 = std::f32::consts::FRAC_PI_3; // 60 degrees
const CONE_BURST_SPEED: f32 = 320.0;

const SPINNER_HAZARD_LIFE_SECS: f32 = 5.0;
const SPINNER_HAZARD_SPEED: f32 = 200.0;
const SPINNER_HAZARD_RADIUS: f32 = 26.0;
const SPINNER_ROT_VEL: f32 = 3.0;

const SPIRAL_SECS: f32 = 2.8;
const SPIRAL_EMIT_SECS: f32 = 0.08;
const SPIRAL_SPEED: f32 = 210.0;
const SPIRAL_ANGLE_STEP: f32 = 0.35;
const SPIRAL_ENRAGE_STEP_MULT: f32 = 1.3;

const BEAM_SECS: f32 = 1.6;
const BEAM_EMIT_SECS: f32 = 0.05;
const BEAM_SPEED: f32 = 700.0;
const BEAM_SWEEP_RADIANS: f32 = 1.8;

const STARFALL_LANES: u32 = 4;
const STARFALL_LANE_SPACING: f32 = 150.0;
const STARFALL_SPEED: f32 = 260.0;

const RING_BULLETS: u32 = 26;
const RING_GAP_BULLETS: u32 = 5;
const RING_SPEED: f32 = 120.0;
const RING_RADIUS: f32 = 380.0;

const SHOCKWAVE_EXPAND_RATE: f32 = 260.0;
const SHOCKWAVE_LIFE_SECS: f32 = 1.4;

const DASH_WINDUP_SECS: f32 = 0.5;
const DASH_ACTIVE_SECS: f32 = 0.5;
const DASH_SPEED: f32 = 620.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossKind {
    /// Wave 5, the light opener: a single spinner cycle.
    Cindermaw,
    /// Wave 10: spinner/cone/starfall at full weight, and it mutes every
    /// ranged enemy while it lives.
    GaleTyrant,
    /// Wave 15: the wave-10 shape with lighter counts and damage.
    AbyssWeaver,
    /// Wave 20, the final machine: dash, spiral, beam, ring, shockwave and a
    /// support summon, with an enrage below half health.
    LumenKing,
}

impl BossKind {
    pub fn for_wave(wave: u32) -> Result<BossKind, BossCastError> {
        match wave {
            5 => Ok(BossKind::Cindermaw),
            10 => Ok(BossKind::GaleTyrant),
            15 => Ok(BossKind::AbyssWeaver),
            20 => Ok(BossKind::LumenKing),
            other => Err(BossCastError::UnknownBossWave(other)),
        }
    }

    /// Boss HP in multiples of player base weapon damage, same discipline as
    /// regular enemy HP so the fight length tracks loadout progression.
    pub fn hp_multiple(self) -> f32 {
        match self {
            BossKind::Cindermaw => 60.0,
            BossKind::GaleTyrant => 90.0,
            BossKind::AbyssWeaver => 140.0,
            BossKind::LumenKing => 220.0,
        }
    }

    pub fn damage_mult(self) -> f32 {
        match self {
            BossKind::Cindermaw => WAVE5_DAMAGE_MULT,
            BossKind::GaleTyrant => WAVE10_DAMAGE_MULT,
            BossKind::AbyssWeaver => WAVE15_DAMAGE_MULT,
            BossKind::LumenKing => FINAL_DAMAGE_MULT,
        }
    }

    pub fn contact_damage(self) -> i32 {
        match self {
            BossKind::Cindermaw => 18,
            BossKind::GaleTyrant => 22,
            BossKind::AbyssWeaver => 26,
            BossKind::LumenKing => 30,
        }
    }

    fn color(self) -> Color {
        match self {
            BossKind::Cindermaw => Color::rgb(0.95, 0.3, 0.1),
            BossKind::GaleTyrant => Color::rgb(0.5, 0.85, 0.95),
            BossKind::AbyssWeaver => Color::rgb(0.45, 0.2, 0.6),
            BossKind::LumenKing => Color::rgb(1.0, 0.95, 0.6),
        }
    }

    pub fn rotation(self) -> &'static [Pattern] {
        use Pattern::*;
        match self {
            BossKind::Cindermaw => &[Spinner],
            BossKind::GaleTyrant => &[Spinner, ConeBurst, Starfall],
            BossKind::AbyssWeaver => &[Spinner, ConeBurst, Starfall],
            BossKind::LumenKing => &[Dash, Spiral, Beam, Ring, Shockwave, Summon],
        }
    }

    fn spinner_hazards(self) -> u32 {
        match self {
            BossKind::GaleTyrant => 3,
            _ => 2,
        }
    }

    fn starfall_per_lane(self) -> u32 {
        match self {
            BossKind::AbyssWeaver => 4,
            _ => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    ConeBurst,
    Spinner,
    Shockwave,
    Dash,
    Starfall,
    Spiral,
    Beam,
    Ring,
    Summon,
}

#[derive(Component)]
pub struct Boss {
    pub kind: BossKind,
    pub enraged: bool,
    pub speed: f32,
    pub contact_damage: i32,
    /// Pattern damage resolved once at spawn from the player's base damage.
    pub pattern_damage: i32,
    pub melee_timer: Timer,
    pattern_index: usize,
}

/// One phase at a time; each variant owns exactly the memory its pattern
/// needs. `Idle` gates the next transition on its group being fully cleared.
#[derive(Component)]
pub enum BossPhase {
    Idle { timer: Timer, gate: Option<HazardGroupId> },
    ConeBurst { cast: bool, linger: Timer, group: HazardGroupId },
    Spinner { cast: bool, linger: Timer, group: HazardGroupId },
    Shockwave { cast: bool, linger: Timer, group: HazardGroupId },
    Dash { windup: Timer, active: Timer, dir: Vec2, started: bool, group: HazardGroupId },
    Starfall { cast: bool, linger: Timer, group: HazardGroupId },
    Spiral { duration: Timer, emit: Timer, angle: f32, group: HazardGroupId },
    Beam { duration: Timer, emit: Timer, base_angle: f32, aimed: bool, group: HazardGroupId },
    Ring { cast: bool, linger: Timer, group: HazardGroupId },
    Summon { cast: bool, linger: Timer },
}

/// Idle gap between patterns; enrage shortens it with every other cooldown.
pub fn idle_secs(enraged: bool) -> f32 {
    if enraged { IDLE_SECS * ENRAGE_COOLDOWN_MULT } else { IDLE_SECS }
}

impl BossPhase {
    fn idle(enraged: bool, gate: Option<HazardGroupId>) -> Self {
        BossPhase::Idle { timer: Timer::from_seconds(idle_secs(enraged), TimerMode::Once), gate }
    }
}

pub fn spawn_boss(
    commands: &mut Commands,
    wave: u32,
    base_damage: f32,
    player_pos: Vec2,
    rng: &mut impl Rng,
) -> Result<Entity, BossCastError> {
    let kind = BossKind::for_wave(wave)?;
    let hp = (base_damage.max(1.0) * kind.hp_multiple()).ceil() as i32;
    let pattern_damage = (base_damage.max(1.0) * kind.damage_mult()).ceil() as i32;
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let position = Vec2::new(
        (player_pos.x + angle.cos() * BOSS_SPAWN_DISTANCE)
            .clamp(-ARENA_HALF_WIDTH + BOSS_RADIUS, ARENA_HALF_WIDTH - BOSS_RADIUS),
        (player_pos.y + angle.sin() * BOSS_SPAWN_DISTANCE)
            .clamp(-ARENA_HALF_HEIGHT + BOSS_RADIUS, ARENA_HALF_HEIGHT - BOSS_RADIUS),
    );
    info!("boss {:?} enters at wave {}", kind, wave);
    Ok(commands
        .spawn((
            SpriteBundle {
                sprite: Sprite {
                    custom_size: Some(Vec2::splat(BOSS_RADIUS * 2.0)),
                    color: kind.color(),
                    ..default()
                },
                transform: Transform::from_translation(position.extend(BOSS_Z)),
                ..default()
            },
            Boss {
                kind,
                enraged: false,
                speed: BOSS_BASE_SPEED,
                contact_damage: kind.contact_damage(),
                pattern_damage,
                melee_timer: Timer::from_seconds(0.8, TimerMode::Repeating),
                pattern_index: 0,
            },
            BossPhase::idle(false, None),
            Health(hp),
            MaxHealth(hp),
            Name::new(format!("Boss_{:?}", kind)),
        ))
        .id())
}

pub struct BossPlugin;

impl Plugin for BossPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                boss_spawn_system,
                boss_enrage_system,
                boss_movement_system,
                boss_phase_system,
                ranged_suppression_system,
            )
                .chain()
                .in_set(SimSet::Boss)
                .run_if(in_state(AppState::InGame)),
        );
    }
}

fn boss_spawn_system(
    mut commands: Commands,
    game_state: Res<GameState>,
    loadout: Res<PlayerLoadout>,
    mut runtime: ResMut<WaveRuntime>,
    player_query: Query<&Transform, With<Glowling>>,
    mut sound_events: EventWriter<PlaySoundEvent>,
) {
    if !game_state.wave_active || runtime.boss_spawned || !is_boss_wave(game_state.wave) {
        return;
    }
    let Ok(player_transform) = player_query.get_single() else { return };
    let mut rng = rand::thread_rng();
    match spawn_boss(
        &mut commands,
        game_state.wave,
        loadout.weapon_damage,
        player_transform.translation.truncate(),
        &mut rng,
    ) {
        Ok(_) => {
            runtime.boss_spawned = true;
            sound_events.send(PlaySoundEvent(SoundEffect::BossArrival));
        }
        Err(err) => warn!("boss spawn failed: {}", err),
    }
}

/// One-way flip at half health: faster, shorter cooldowns, denser patterns.
fn boss_enrage_system(mut query: Query<(&mut Boss, &Health, &MaxHealth, &mut Sprite)>) {
    for (mut boss, health, max_health, mut sprite) in query.iter_mut() {
        if boss.enraged || health.0 > (max_health.0 as f32 * ENRAGE_HP_FRACTION) as i32 {
            continue;
        }
        boss.enraged = true;
        boss.speed *= ENRAGE_SPEED_MULT;
        sprite.color = sprite.color * 1.25;
        info!("boss {:?} enrages", boss.kind);
    }
}

fn boss_movement_system(
    time: Res<Time>,
    player_query: Query<&Transform, (With<Glowling>, Without<Boss>)>,
    mut query: Query<(&mut Transform, &Boss, &BossPhase)>,
) {
    let dt = time.delta_seconds().min(0.066);
    let Ok(player_transform) = player_query.get_single() else { return };
    let player_pos = player_transform.translation.truncate();

    for (mut transform, boss, phase) in query.iter_mut() {
        let pos = transform.translation.truncate();
        let vel = match phase {
            BossPhase::Dash { dir, started: true, windup, .. } if windup.finished() => *dir * DASH_SPEED,
            // Beams and windups anchor the boss.
            BossPhase::Beam { .. } | BossPhase::Dash { .. } => Vec2::ZERO,
            _ => (player_pos - pos).normalize_or_zero() * boss.speed,
        };
        transform.translation.x = (transform.translation.x + vel.x * dt)
            .clamp(-ARENA_HALF_WIDTH + BOSS_RADIUS, ARENA_HALF_WIDTH - BOSS_RADIUS);
        transform.translation.y = (transform.translation.y + vel.y * dt)
            .clamp(-ARENA_HALF_HEIGHT + BOSS_RADIUS, ARENA_HALF_HEIGHT - BOSS_RADIUS);
    }
}

/// Counts live pattern entities tagged with the gate group. The idle phase
/// only advances once the previous pattern's bullets and hazards are gone.
fn group_cleared(
    gate: Option<HazardGroupId>,
    projectiles: &Query<&Projectile>,
    hazards: &Query<&Hazard>,
) -> bool {
    let Some(group) = gate else { return true };
    let live_projectiles = projectiles.iter().any(|p| p.group == Some(group));
    let live_hazards = hazards.iter().any(|h| h.group == Some(group));
    !live_projectiles && !live_hazards
}

fn boss_phase_system(
    mut commands: Commands,
    time: Res<Time>,
    mut groups: ResMut<HazardGroups>,
    mut runtime: ResMut<WaveRuntime>,
    player_query: Query<&Transform, (With<Glowling>, Without<Boss>)>,
    projectile_query: Query<&Projectile>,
    hazard_query: Query<&Hazard>,
    mut boss_query: Query<(Entity, &Transform, &mut Boss, &mut BossPhase)>,
    mut sound_events: EventWriter<PlaySoundEvent>,
) {
    let player_pos = player_query.get_single().ok().map(|t| t.translation.truncate());
    let mut rng = rand::thread_rng();

    for (boss_entity, transform, mut boss, mut phase) in boss_query.iter_mut() {
        let pos = transform.translation.truncate();
        let kind = boss.kind;
        let enraged = boss.enraged;
        let damage = boss.pattern_damage;

        let next = match &mut *phase {
            BossPhase::Idle { timer, gate } => {
                timer.tick(time.delta());
                if timer.finished() && group_cleared(*gate, &projectile_query, &hazard_query) {
                    let rotation = kind.rotation();
                    let pattern = rotation[boss.pattern_index % rotation.len()];
                    boss.pattern_index += 1;
                    Some(begin_pattern(pattern, enraged, &mut groups, &mut rng))
                } else {
                    None
                }
            }

            BossPhase::ConeBurst { cast, linger, group } => {
                if !*cast {
                    match cast_cone_burst(&mut commands, boss_entity, pos, player_pos, damage, *group) {
                        Ok(()) => {
                            *cast = true;
                            sound_events.send(PlaySoundEvent(SoundEffect::BossPattern));
                        }
                        Err(err) => debug!("cone burst deferred: {}", err),
                    }
                }
                linger.tick(time.delta());
                let group = *group;
                linger.finished().then(|| BossPhase::idle(enraged, Some(group)))
            }

            BossPhase::Spinner { cast, linger, group } => {
                if !*cast {
                    match cast_spinner(&mut commands, kind, pos, player_pos, damage, *group, &mut rng) {
                        Ok(()) => {
                            *cast = true;
                            sound_events.send(PlaySoundEvent(SoundEffect::BossPattern));
                        }
                        Err(err) => debug!("spinner deferred: {}", err),
                    }
                }
                linger.tick(time.delta());
                let group = *group;
                linger.finished().then(|| BossPhase::idle(enraged, Some(group)))
            }

            BossPhase::Shockwave { cast, linger, group } => {
                if !*cast {
                    *cast = true;
                    sound_events.send(PlaySoundEvent(SoundEffect::BossPattern));
                    // Two staggered expanding rings; the second races the first.
                    for (i, rate_scale) in [1.0_f32, 1.35].iter().enumerate() {
                        spawn_hazard(&mut commands, HazardSpec {
                            position: pos,
                            radius: BOSS_RADIUS - i as f32 * 18.0,
                            expand_rate: SHOCKWAVE_EXPAND_RATE * rate_scale * if enraged { 1.2 } else { 1.0 },
                            move_dir: Vec2::ZERO,
                            move_speed: 0.0,
                            bounce_walls: false,
                            rot_vel: 0.0,
                            slow_factor: Some(0.7),
                            dps: damage as f32,
                            life_secs: SHOCKWAVE_LIFE_SECS,
                            group: Some(*group),
                            color: Color::rgba(1.0, 0.5, 0.2, 0.45),
                        });
                    }
                }
                linger.tick(time.delta());
                let group = *group;
                linger.finished().then(|| BossPhase::idle(enraged, Some(group)))
            }

            BossPhase::Dash { windup, active, dir, started, group } => {
                windup.tick(time.delta());
                if !windup.finished() {
                    // Lock the charge direction at the end of the windup.
                    if let Some(target) = player_pos {
                        *dir = (target - pos).normalize_or_zero();
                    }
                    None
                } else {
                    if !*started {
                        *started = true;
                        sound_events.send(PlaySoundEvent(SoundEffect::BossPattern));
                    }
                    active.tick(time.delta());
                    if active.just_finished() {
                        // The charge ends in a cone of fire at the player.
                        if let Err(err) =
                            cast_cone_burst(&mut commands, boss_entity, pos, player_pos, damage, *group)
                        {
                            debug!("dash burst skipped: {}", err);
                        }
                    }
                    let group = *group;
                    active.finished().then(|| BossPhase::idle(enraged, Some(group)))
                }
            }

            BossPhase::Starfall { cast, linger, group } => {
                match player_pos {
                    Some(target) if !*cast => {
                        *cast = true;
                        sound_events.send(PlaySoundEvent(SoundEffect::BossPattern));
                        cast_starfall(&mut commands, boss_entity, kind, target.x, damage, *group, &mut rng);
                    }
                    None if !*cast => debug!("starfall deferred: {}", BossCastError::NoPlayer),
                    _ => {}
                }
                linger.tick(time.delta());
                let group = *group;
                linger.finished().then(|| BossPhase::idle(enraged, Some(group)))
            }

            BossPhase::Spiral { duration, emit, angle, group } => {
                duration.tick(time.delta());
                emit.tick(time.delta());
                if emit.just_finished() {
                    // Counter-rotating twin streams; a third joins when enraged.
                    let streams: &[f32] = if enraged {
                        &[0.0, std::f32::consts::TAU / 3.0, 2.0 * std::f32::consts::TAU / 3.0]
                    } else {
                        &[0.0, std::f32::consts::PI]
                    };
                    for (i, offset) in streams.iter().enumerate() {
                        let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
                        let dir = Vec2::from_angle(sign * *angle + offset);
                        spawn_boss_projectile(&mut commands, boss_entity, pos, dir * SPIRAL_SPEED, damage, 2.6, Some(*group));
                    }
                    let step = if enraged { SPIRAL_ANGLE_STEP * SPIRAL_ENRAGE_STEP_MULT } else { SPIRAL_ANGLE_STEP };
                    *angle += step;
                }
                let group = *group;
                duration.finished().then(|| BossPhase::idle(enraged, Some(group)))
            }

            BossPhase::Beam { duration, emit, base_angle, aimed, group } => {
                if !*aimed {
                    match player_pos {
                        Some(target) => {
                            *base_angle = (target - pos).to_angle() - BEAM_SWEEP_RADIANS / 2.0;
                            *aimed = true;
                            sound_events.send(PlaySoundEvent(SoundEffect::BossPattern));
                        }
                        None => {
                            debug!("beam deferred: {}", BossCastError::NoPlayer);
                            continue;
                        }
                    }
                }
                duration.tick(time.delta());
                emit.tick(time.delta());
                if emit.just_finished() {
                    let progress = duration.fraction();
                    let angle = *base_angle + BEAM_SWEEP_RADIANS * progress;
                    let dir = Vec2::from_angle(angle);
                    spawn_boss_projectile(&mut commands, boss_entity, pos + dir * BOSS_RADIUS, dir * BEAM_SPEED, damage, 1.4, Some(*group));
                }
                let group = *group;
                duration.finished().then(|| BossPhase::idle(enraged, Some(group)))
            }

            BossPhase::Ring { cast, linger, group } => {
                if !*cast {
                    match player_pos {
                        Some(target) => {
                            *cast = true;
                            sound_events.send(PlaySoundEvent(SoundEffect::BossPattern));
                            let rings = if enraged { 3 } else { rng.gen_range(1..=2) };
                            for ring in 0..rings {
                                cast_ring(&mut commands, boss_entity, target, ring, damage, *group, &mut rng);
                            }
                        }
                        None => debug!("ring deferred: {}", BossCastError::NoPlayer),
                    }
                }
                linger.tick(time.delta());
                let group = *group;
                linger.finished().then(|| BossPhase::idle(enraged, Some(group)))
            }

            BossPhase::Summon { cast, linger } => {
                if !*cast {
                    *cast = true;
                    runtime.boss_wants_refill = true;
                    sound_events.send(PlaySoundEvent(SoundEffect::BossPattern));
                }
                linger.tick(time.delta());
                linger.finished().then(|| BossPhase::idle(enraged, None))
            }
        };

        if let Some(next_phase) = next {
            *phase = next_phase;
        }
    }
}

fn begin_pattern(
    pattern: Pattern,
    enraged: bool,
    groups: &mut HazardGroups,
    rng: &mut impl Rng,
) -> BossPhase {
    let scale = if enraged { ENRAGE_COOLDOWN_MULT } else { 1.0 };
    let group = groups.allocate();
    match pattern {
        Pattern::ConeBurst => BossPhase::ConeBurst {
            cast: false,
            linger: Timer::from_seconds(0.6 * scale, TimerMode::Once),
            group,
        },
        Pattern::Spinner => BossPhase::Spinner {
            cast: false,
            linger: Timer::from_seconds(1.0 * scale, TimerMode::Once),
            group,
        },
        Pattern::Shockwave => BossPhase::Shockwave {
            cast: false,
            linger: Timer::from_seconds(SHOCKWAVE_LIFE_SECS, TimerMode::Once),
            group,
        },
        Pattern::Dash => BossPhase::Dash {
            windup: Timer::from_seconds(DASH_WINDUP_SECS * scale, TimerMode::Once),
            active: Timer::from_seconds(DASH_ACTIVE_SECS, TimerMode::Once),
            dir: Vec2::X,
            started: false,
            group,
        },
        Pattern::Starfall => BossPhase::Starfall {
            cast: false,
            linger: Timer::from_seconds(1.2, TimerMode::Once),
            group,
        },
        Pattern::Spiral => BossPhase::Spiral {
            duration: Timer::from_seconds(SPIRAL_SECS, TimerMode::Once),
            emit: Timer::from_seconds(SPIRAL_EMIT_SECS * scale, TimerMode::Repeating),
            angle: rng.gen_range(0.0..std::f32::consts::TAU),
            group,
        },
        Pattern::Beam => BossPhase::Beam {
            duration: Timer::from_seconds(BEAM_SECS, TimerMode::Once),
            emit: Timer::from_seconds(BEAM_EMIT_SECS, TimerMode::Repeating),
            base_angle: 0.0,
            aimed: false,
            group,
        },
        Pattern::Ring => BossPhase::Ring {
            cast: false,
            linger: Timer::from_seconds(0.8, TimerMode::Once),
            group,
        },
        Pattern::Summon => BossPhase::Summon {
            cast: false,
            linger: Timer::from_seconds(1.5 * scale, TimerMode::Once),
        },
    }
}

/// 9 bullets fanned across a 60 degree arc centered on the player.
fn cast_cone_burst(
    commands: &mut Commands,
    owner: Entity,
    pos: Vec2,
    player_pos: Option<Vec2>,
    damage: i32,
    group: HazardGroupId,
) -> Result<(), BossCastError> {
    let target = player_pos.ok_or(BossCastError::NoPlayer)?;
    let center = (target - pos).normalize_or_zero();
    if center == Vec2::ZERO {
        return Err(BossCastError::NoPlayer);
    }
    for i in 0..CONE_BURST_COUNT {
        let t = i as f32 / (CONE_BURST_COUNT - 1) as f32 - 0.5;
        let dir = Vec2::from_angle(t * CONE_BURST_ARC).rotate(center);
        spawn_boss_projectile(commands, owner, pos, dir * CONE_BURST_SPEED, damage, 2.4, Some(group));
    }
    Ok(())
}

/// Bouncing, rotating hazard shards launched toward the player with a small
/// angular fan between them.
fn cast_spinner(
    commands: &mut Commands,
    kind: BossKind,
    pos: Vec2,
    player_pos: Option<Vec2>,
    damage: i32,
    group: HazardGroupId,
    rng: &mut impl Rng,
) -> Result<(), BossCastError> {
    let target = player_pos.ok_or(BossCastError::NoPlayer)?;
    let center = (target - pos).normalize_or_zero();
    if center == Vec2::ZERO {
        return Err(BossCastError::NoPlayer);
    }
    let count = kind.spinner_hazards();
    for i in 0..count {
        let fan = (i as f32 - (count - 1) as f32 / 2.0) * 0.4;
        let dir = Vec2::from_angle(fan).rotate(center);
        spawn_hazard(commands, HazardSpec {
            position: pos + dir * BOSS_RADIUS,
            radius: SPINNER_HAZARD_RADIUS,
            expand_rate: 0.0,
            move_dir: dir,
            move_speed: SPINNER_HAZARD_SPEED * rng.gen_range(0.9..1.1),
            bounce_walls: true,
            rot_vel: if i % 2 == 0 { SPINNER_ROT_VEL } else { -SPINNER_ROT_VEL },
            slow_factor: None,
            dps: damage as f32,
            life_secs: SPINNER_HAZARD_LIFE_SECS,
            group: Some(group),
            color: Color::rgb(1.0, 0.4, 0.3),
        });
    }
    Ok(())
}

/// Lanes of falling bullets centered on the player's x position, staggered
/// above the arena top.
fn cast_starfall(
    commands: &mut Commands,
    owner: Entity,
    kind: BossKind,
    center_x: f32,
    damage: i32,
    group: HazardGroupId,
    rng: &mut impl Rng,
) {
    let per_lane = kind.starfall_per_lane();
    for lane in 0..STARFALL_LANES {
        let offset = (lane as f32 - (STARFALL_LANES - 1) as f32 / 2.0) * STARFALL_LANE_SPACING;
        let x = (center_x + offset + rng.gen_range(-30.0..30.0))
            .clamp(-ARENA_HALF_WIDTH, ARENA_HALF_WIDTH);
        for row in 0..per_lane {
            let y = ARENA_HALF_HEIGHT + 40.0 + row as f32 * 90.0;
            spawn_boss_projectile(
                commands,
                owner,
                Vec2::new(x, y),
                Vec2::new(0.0, -STARFALL_SPEED),
                damage,
                (y + ARENA_HALF_HEIGHT + 60.0) / STARFALL_SPEED,
                Some(group),
            );
        }
    }
}

/// One closing circle of bullets around the player with a randomly placed
/// angular gap; successive rings stagger their gap and radius.
fn cast_ring(
    commands: &mut Commands,
    owner: Entity,
    center: Vec2,
    ring: u32,
    damage: i32,
    group: HazardGroupId,
    rng: &mut impl Rng,
) {
    let radius = RING_RADIUS + ring as f32 * 110.0;
    let gap_start = rng.gen_range(0..RING_BULLETS);
    for i in 0..RING_BULLETS {
        let in_gap = (i + RING_BULLETS - gap_start) % RING_BULLETS < RING_GAP_BULLETS;
        if in_gap {
            continue;
        }
        let angle = i as f32 / RING_BULLETS as f32 * std::f32::consts::TAU;
        let offset = Vec2::from_angle(angle) * radius;
        spawn_boss_projectile(
            commands,
            owner,
            center + offset,
            -offset.normalize_or_zero() * RING_SPEED,
            damage,
            radius / RING_SPEED,
            Some(group),
        );
    }
}

/// While the wave-10 boss is alive every ranged enemy is muted; the fight is
/// about the boss's own patterns, not chip fire from the support trickle.
fn ranged_suppression_system(
    boss_query: Query<&Boss>,
    mut enemy_query: Query<(
        &mut Enemy,
        Option<&mut ShooterBehavior>,
        Option<&mut SniperBehavior>,
        Option<&mut BloodmageBehavior>,
    )>,
) {
    let suppressing = boss_query.iter().any(|b| b.kind == BossKind::GaleTyrant);
    if !suppressing {
        return;
    }
    for (mut enemy, shooter, sniper, bloodmage) in enemy_query.iter_mut() {
        if !enemy.is_ranged {
            continue;
        }
        suppress_ranged(
            &mut enemy,
            shooter.map(|s| s.into_inner()),
            sniper.map(|s| s.into_inner()),
            bloodmage.map(|b| b.into_inner()),
        );
    }
}
