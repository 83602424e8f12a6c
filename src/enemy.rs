use bevy::prelude::*;
use rand::Rng;

use crate::{
    components::{Health, Hitstop, Knockback, MaxHealth, Slowed, Velocity},
    game::{AppState, GameState, ARENA_HALF_HEIGHT, ARENA_HALF_WIDTH, SimSet},
    player::Glowling,
    projectiles::{spawn_enemy_projectile, Faction, Projectile},
};

pub const SMALL_ENEMY_RADIUS: f32 = 16.0;
pub const BIG_ENEMY_RADIUS: f32 = 28.0;
const ENEMY_Z: f32 = 0.5;

const CHASE_MULT_PER_WAVE: f32 = 0.01;
const CHASE_MULT_MAX_BONUS: f32 = 0.20;
const WALL_MARGIN: f32 = 60.0;
const WALL_INWARD_PUSH: f32 = 45.0;
const WALL_TANGENT_DAMP: f32 = 0.9;
const STUCK_TRIGGER_SECS: f32 = 0.6;
const STUCK_MIN_DISPLACEMENT: f32 = 2.0;
const SEPARATION_PUSH: f32 = 60.0;

const RANGED_UNLOCK_WAVE: u32 = 5;
const SHOOTER_RANGE: f32 = 420.0;
const SHOOTER_PROJECTILE_SPEED: f32 = 300.0;
const SHOOTER_SPREAD_RADIANS: f32 = 0.10;
const SHOOTER_BURST_WAVE: u32 = 11;
const SHOOTER_BURST_CHANCE: f64 = 0.25;
const DUTY_CYCLE_WAVE: u32 = 11;

const SNIPER_RANGE: f32 = 560.0;
const SNIPER_WINDUP_SECS: f32 = 0.6;
const SNIPER_SHOT_SPEED: f32 = 820.0;

const BLOODMAGE_WAVE: u32 = 11;
const BLOODMAGE_PULSE_RADIUS: f32 = 90.0;
const BLOODMAGE_PULSE_SECS: f32 = 2.0;
const BLOODMAGE_BURST_COUNT: u32 = 8;
const BLOODMAGE_BURST_SPEED: f32 = 180.0;

const EVADE_WAVE: u32 = 10;
const EVADE_HIGH_WAVE: u32 = 15;
const EVADE_DANGER_RADIUS_BASE: f32 = 230.0;
const EVADE_DANGER_RADIUS_MAX: f32 = 300.0;
const EVADE_CHANCE_LOW: f64 = 0.28;
const EVADE_CHANCE_HIGH: f64 = 0.50;

const MUTANT_BUFF_SECS: f32 = 3.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnemyRole {
    Rush,
    Shooter,
    Fast,
    Tank,
    Elite,
    Sniper,
    Bloodmage,
    Berserker,
    Overcharged,
    Parasite,
    Juggernaut,
    Mutant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeTier {
    Small,
    Big,
}

impl EnemyRole {
    pub fn is_ranged(self) -> bool {
        matches!(self, EnemyRole::Shooter | EnemyRole::Sniper | EnemyRole::Bloodmage)
    }

    /// Heavy roles are excluded from boss-wave support spawns.
    pub fn is_heavy(self) -> bool {
        matches!(self, EnemyRole::Tank | EnemyRole::Elite | EnemyRole::Juggernaut)
    }

    pub fn size_tier(self) -> SizeTier {
        match self {
            EnemyRole::Tank | EnemyRole::Elite | EnemyRole::Juggernaut => SizeTier::Big,
            _ => SizeTier::Small,
        }
    }

    pub fn base_speed(self) -> f32 {
        match self {
            EnemyRole::Rush => 120.0,
            EnemyRole::Shooter => 90.0,
            EnemyRole::Fast => 170.0,
            EnemyRole::Tank => 55.0,
            EnemyRole::Elite => 85.0,
            EnemyRole::Sniper => 70.0,
            EnemyRole::Bloodmage => 75.0,
            EnemyRole::Berserker => 130.0,
            EnemyRole::Overcharged => 110.0,
            EnemyRole::Parasite => 115.0,
            EnemyRole::Juggernaut => 50.0,
            EnemyRole::Mutant => 100.0,
        }
    }

    pub fn contact_damage(self) -> i32 {
        match self {
            EnemyRole::Rush | EnemyRole::Fast => 8,
            EnemyRole::Shooter | EnemyRole::Sniper => 6,
            EnemyRole::Tank => 14,
            EnemyRole::Elite => 16,
            EnemyRole::Bloodmage => 8,
            EnemyRole::Berserker => 12,
            EnemyRole::Overcharged => 10,
            EnemyRole::Parasite => 10,
            EnemyRole::Juggernaut => 20,
            EnemyRole::Mutant => 10,
        }
    }

    fn base_stagger_resist(self) -> f32 {
        match self {
            EnemyRole::Tank => 0.5,
            EnemyRole::Elite => 0.4,
            EnemyRole::Juggernaut => 0.8,
            EnemyRole::Berserker => 0.25,
            _ => 0.1,
        }
    }

    pub fn color(self) -> Color {
        match self {
            EnemyRole::Rush => Color::rgb(0.85, 0.35, 0.35),
            EnemyRole::Shooter => Color::rgb(0.4, 0.7, 0.9),
            EnemyRole::Fast => Color::rgb(0.95, 0.75, 0.3),
            EnemyRole::Tank => Color::rgb(0.45, 0.45, 0.55),
            EnemyRole::Elite => Color::rgb(0.75, 0.4, 0.85),
            EnemyRole::Sniper => Color::rgb(0.3, 0.9, 0.6),
            EnemyRole::Bloodmage => Color::rgb(0.8, 0.15, 0.3),
            EnemyRole::Berserker => Color::rgb(0.95, 0.45, 0.15),
            EnemyRole::Overcharged => Color::rgb(0.95, 0.95, 0.4),
            EnemyRole::Parasite => Color::rgb(0.55, 0.8, 0.3),
            EnemyRole::Juggernaut => Color::rgb(0.3, 0.3, 0.4),
            EnemyRole::Mutant => Color::rgb(0.6, 0.9, 0.9),
        }
    }
}

/// Wave-scaled 0..0.9 resistance to hitstop/knockback.
pub fn stagger_resist(role: EnemyRole, wave: u32) -> f32 {
    (role.base_stagger_resist() + wave as f32 * 0.01).min(0.9)
}

#[derive(Component)]
pub struct Enemy {
    pub role: EnemyRole,
    pub size: SizeTier,
    pub radius: f32,
    pub speed: f32,
    pub speed_mult: f32,
    pub contact_damage: i32,
    pub is_ranged: bool,
    pub stagger_resist: f32,
    pub melee_timer: Timer,
    /// Set by combat when the last hit came from the player side; decides
    /// kill credit (on-kill heal, combo).
    pub hurt_by_player: bool,
    stuck_accum: f32,
    last_pos: Vec2,
}

impl Enemy {
    pub fn new(role: EnemyRole, wave: u32, position: Vec2) -> Self {
        let size = role.size_tier();
        let radius = match size {
            SizeTier::Small => SMALL_ENEMY_RADIUS,
            SizeTier::Big => BIG_ENEMY_RADIUS,
        };
        Self {
            role,
            size,
            radius,
            speed: role.base_speed(),
            speed_mult: 1.0,
            contact_damage: role.contact_damage(),
            is_ranged: role.is_ranged() && wave >= RANGED_UNLOCK_WAVE,
            stagger_resist: stagger_resist(role, wave),
            melee_timer: Timer::from_seconds(0.8, TimerMode::Repeating),
            hurt_by_player: false,
            stuck_accum: 0.0,
            last_pos: position,
        }
    }
}

// --- Role behaviors, inserted per archetype at spawn ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DutyPhase {
    Attack,
    Pause,
}

#[derive(Component)]
pub struct ShooterBehavior {
    pub fire_timer: Timer,
    pub duty_phase: DutyPhase,
    pub duty_timer: Timer,
    pub uses_duty_cycle: bool,
    pub suppressed: bool,
}

impl ShooterBehavior {
    fn new(wave: u32, rng: &mut impl Rng) -> Self {
        Self {
            fire_timer: Timer::from_seconds(rng.gen_range(0.85..1.45), TimerMode::Repeating),
            duty_phase: DutyPhase::Attack,
            duty_timer: Timer::from_seconds(rng.gen_range(1.6..2.2), TimerMode::Once),
            uses_duty_cycle: wave >= DUTY_CYCLE_WAVE,
            suppressed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SniperState {
    Stalking,
    Windup,
    Cooldown,
}

#[derive(Component)]
pub struct SniperBehavior {
    pub state: SniperState,
    pub state_timer: Timer,
    pub locked_dir: Vec2,
    pub suppressed: bool,
}

impl SniperBehavior {
    fn new(rng: &mut impl Rng) -> Self {
        Self {
            state: SniperState::Stalking,
            state_timer: Timer::from_seconds(rng.gen_range(1.0..2.0), TimerMode::Once),
            locked_dir: Vec2::X,
            suppressed: false,
        }
    }
}

#[derive(Component)]
pub struct BloodmageBehavior {
    pub pulse_timer: Timer,
    pub burst_timer: Timer,
    pub suppressed: bool,
}

impl BloodmageBehavior {
    fn new(rng: &mut impl Rng) -> Self {
        Self {
            pulse_timer: Timer::from_seconds(BLOODMAGE_PULSE_SECS, TimerMode::Repeating),
            burst_timer: Timer::from_seconds(rng.gen_range(2.6..3.4), TimerMode::Repeating),
            suppressed: false,
        }
    }
}

#[derive(Component, Default)]
pub struct BerserkerBehavior {
    pub rage_secs: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutantBuff {
    Speed,
    Damage,
    Armor,
}

#[derive(Component)]
pub struct MutantBehavior {
    pub roll_timer: Timer,
    pub active: Option<MutantBuff>,
    pub active_secs: f32,
}

impl MutantBehavior {
    fn new(rng: &mut impl Rng) -> Self {
        Self {
            roll_timer: Timer::from_seconds(rng.gen_range(3.0..5.0), TimerMode::Once),
            active: None,
            active_secs: 0.0,
        }
    }
}

/// Shooter sidestep out of incoming player/turret fire (wave >= 10).
#[derive(Component)]
pub struct EvadeDash {
    pub cooldown: Timer,
    pub dash_dir: Vec2,
    pub dash_secs: f32,
}

impl EvadeDash {
    fn new(wave: u32, rng: &mut impl Rng) -> Self {
        let mut cooldown = Timer::from_seconds(evade_cooldown_secs(wave, rng), TimerMode::Once);
        cooldown.tick(cooldown.duration());
        Self { cooldown, dash_dir: Vec2::ZERO, dash_secs: 0.0 }
    }
}

fn evade_cooldown_secs(wave: u32, rng: &mut impl Rng) -> f32 {
    if wave >= EVADE_HIGH_WAVE { rng.gen_range(1.6..2.4) } else { rng.gen_range(2.4..3.4) }
}

pub fn evade_danger_radius(wave: u32) -> f32 {
    (EVADE_DANGER_RADIUS_BASE + (wave.saturating_sub(EVADE_WAVE)) as f32 * 10.0)
        .min(EVADE_DANGER_RADIUS_MAX)
}

pub fn evade_chance(wave: u32) -> f64 {
    if wave >= EVADE_HIGH_WAVE { EVADE_CHANCE_HIGH } else { EVADE_CHANCE_LOW }
}

/// Ranged suppression used during the wave-10 boss fight: the flag drops and
/// every fire timer is parked far beyond the fight's horizon.
pub fn suppress_ranged(enemy: &mut Enemy, shooter: Option<&mut ShooterBehavior>, sniper: Option<&mut SniperBehavior>, bloodmage: Option<&mut BloodmageBehavior>) {
    enemy.is_ranged = false;
    if let Some(s) = shooter {
        s.suppressed = true;
    }
    if let Some(s) = sniper {
        s.suppressed = true;
        s.state = SniperState::Stalking;
    }
    if let Some(b) = bloodmage {
        b.suppressed = true;
    }
}

pub fn spawn_enemy(
    commands: &mut Commands,
    role: EnemyRole,
    wave: u32,
    position: Vec2,
    base_damage: f32,
    rng: &mut impl Rng,
) -> Entity {
    let enemy = Enemy::new(role, wave, position);
    let hp = crate::waves::enemy_hp(wave, role, enemy.size, base_damage);

    let mut entity = commands.spawn((
        SpriteBundle {
            sprite: Sprite {
                custom_size: Some(Vec2::splat(enemy.radius * 2.0)),
                color: role.color(),
                ..default()
            },
            transform: Transform::from_translation(position.extend(ENEMY_Z)),
            ..default()
        },
        enemy,
        Health(hp),
        MaxHealth(hp),
        Velocity(Vec2::ZERO),
        Knockback::default(),
        Name::new(format!("Enemy_{:?}", role)),
    ));

    match role {
        EnemyRole::Shooter => {
            entity.insert(ShooterBehavior::new(wave, rng));
            if wave >= EVADE_WAVE {
                entity.insert(EvadeDash::new(wave, rng));
            }
        }
        EnemyRole::Sniper => {
            entity.insert(SniperBehavior::new(rng));
        }
        EnemyRole::Bloodmage => {
            entity.insert(BloodmageBehavior::new(rng));
        }
        EnemyRole::Berserker => {
            entity.insert(BerserkerBehavior::default());
        }
        EnemyRole::Mutant => {
            entity.insert(MutantBehavior::new(rng));
        }
        _ => {}
    }
    entity.id()
}

pub struct EnemyPlugin;

impl Plugin for EnemyPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                enemy_movement_system,
                mutant_buff_system,
                shooter_attack_system,
                sniper_attack_system,
                bloodmage_attack_system,
                evasion_dash_system,
                status_decay_system,
            )
                .in_set(SimSet::Ai)
                .run_if(in_state(AppState::InGame)),
        )
        .add_systems(
            Update,
            enemy_separation_system
                .in_set(SimSet::Separation)
                .run_if(in_state(AppState::InGame)),
        );
    }
}

/// Chase steering with wall containment and anti-stuck recovery. No
/// center-seeking bias: near a wall only the outward component is removed
/// and a small inward normal push injected.
fn enemy_movement_system(
    time: Res<Time>,
    game_state: Res<GameState>,
    player_query: Query<&Transform, (With<Glowling>, Without<Enemy>)>,
    mut query: Query<(
        &mut Transform,
        &mut Velocity,
        &mut Enemy,
        &mut Knockback,
        Option<&Slowed>,
        Option<&Hitstop>,
        Option<&SniperBehavior>,
        Option<&BerserkerBehavior>,
        Option<&MutantBehavior>,
        Option<&EvadeDash>,
    )>,
) {
    let dt = time.delta_seconds().min(0.066);
    let player_pos = player_query.get_single().ok().map(|t| t.translation.truncate());
    let chase_mult = 1.0 + (game_state.wave as f32 * CHASE_MULT_PER_WAVE).min(CHASE_MULT_MAX_BONUS);
    let mut rng = rand::thread_rng();

    for (mut transform, mut velocity, mut enemy, mut knockback, slowed, hitstop, sniper, berserker, mutant, evade) in query.iter_mut() {
        let pos = transform.translation.truncate();

        let mut speed_factor = enemy.speed_mult;
        if let Some(s) = slowed {
            speed_factor *= s.factor;
        }
        if let Some(h) = hitstop {
            speed_factor *= h.factor;
        }
        if let Some(b) = berserker {
            if b.rage_secs > 0.0 {
                speed_factor *= 1.4;
            }
        }
        if let Some(m) = mutant {
            if m.active == Some(MutantBuff::Speed) {
                speed_factor *= 1.35;
            }
        }

        let mut desired = match player_pos {
            // Idle wander when no target exists mid-transition.
            None => Vec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)).normalize_or_zero() * 0.3,
            Some(target) => (target - pos).normalize_or_zero() * chase_mult,
        };

        // Sniper holds position through the windup telegraph.
        if let Some(s) = sniper {
            if s.state == SniperState::Windup {
                desired = Vec2::ZERO;
            }
        }
        // An active evasion dash overrides chase steering entirely.
        if let Some(e) = evade {
            if e.dash_secs > 0.0 {
                desired = e.dash_dir * 2.4;
            }
        }

        let mut vel = desired * enemy.speed * speed_factor;

        // Wall containment: zero the outward component, push inward, damp the
        // tangential component so bots stop sliding along walls into corners.
        let near_left = pos.x < -ARENA_HALF_WIDTH + WALL_MARGIN;
        let near_right = pos.x > ARENA_HALF_WIDTH - WALL_MARGIN;
        let near_bottom = pos.y < -ARENA_HALF_HEIGHT + WALL_MARGIN;
        let near_top = pos.y > ARENA_HALF_HEIGHT - WALL_MARGIN;
        if near_left || near_right {
            if (near_left && vel.x < 0.0) || (near_right && vel.x > 0.0) {
                vel.x = 0.0;
            }
            vel.x += if near_left { WALL_INWARD_PUSH } else { -WALL_INWARD_PUSH };
            vel.y *= WALL_TANGENT_DAMP;
        }
        if near_bottom || near_top {
            if (near_bottom && vel.y < 0.0) || (near_top && vel.y > 0.0) {
                vel.y = 0.0;
            }
            vel.y += if near_bottom { WALL_INWARD_PUSH } else { -WALL_INWARD_PUSH };
            vel.x *= WALL_TANGENT_DAMP;
        }

        vel += knockback.0;
        knockback.0 *= (1.0 - 6.0 * dt).max(0.0);

        velocity.0 = vel;
        transform.translation.x = (transform.translation.x + vel.x * dt).clamp(-ARENA_HALF_WIDTH, ARENA_HALF_WIDTH);
        transform.translation.y = (transform.translation.y + vel.y * dt).clamp(-ARENA_HALF_HEIGHT, ARENA_HALF_HEIGHT);

        // Anti-stuck: near-edge low-displacement time past the threshold gets
        // a jittered nudge toward the arena interior.
        let near_edge = near_left || near_right || near_bottom || near_top;
        let displaced = pos.distance(enemy.last_pos);
        if near_edge && displaced < STUCK_MIN_DISPLACEMENT {
            enemy.stuck_accum += dt;
        } else {
            enemy.stuck_accum = 0.0;
        }
        if enemy.stuck_accum > STUCK_TRIGGER_SECS {
            let jitter = Vec2::new(rng.gen_range(-40.0..40.0), rng.gen_range(-40.0..40.0));
            let inward = (-pos).normalize_or_zero() * 80.0 + jitter;
            transform.translation.x = (transform.translation.x + inward.x * dt * 4.0).clamp(-ARENA_HALF_WIDTH, ARENA_HALF_WIDTH);
            transform.translation.y = (transform.translation.y + inward.y * dt * 4.0).clamp(-ARENA_HALF_HEIGHT, ARENA_HALF_HEIGHT);
            enemy.stuck_accum = 0.0;
        }
        enemy.last_pos = transform.translation.truncate();
    }
}

/// Pairwise push so bots that visually overlap drift apart.
fn enemy_separation_system(mut query: Query<(&mut Transform, &Enemy)>, time: Res<Time>) {
    let dt = time.delta_seconds().min(0.066);
    let mut combinations = query.iter_combinations_mut();
    while let Some([(mut ta, ea), (mut tb, eb)]) = combinations.fetch_next() {
        let a = ta.translation.truncate();
        let b = tb.translation.truncate();
        let min_dist = ea.radius + eb.radius;
        let delta = a - b;
        let dist = delta.length();
        if dist > 0.001 && dist < min_dist {
            let push = delta / dist * SEPARATION_PUSH * dt;
            ta.translation += push.extend(0.0);
            tb.translation -= push.extend(0.0);
        }
    }
}

fn mutant_buff_system(time: Res<Time>, mut query: Query<&mut MutantBehavior>) {
    let mut rng = rand::thread_rng();
    for mut mutant in query.iter_mut() {
        if let Some(_) = mutant.active {
            mutant.active_secs -= time.delta_seconds();
            if mutant.active_secs <= 0.0 {
                mutant.active = None;
            }
            continue;
        }
        mutant.roll_timer.tick(time.delta());
        if mutant.roll_timer.finished() {
            mutant.active = Some(match rng.gen_range(0..3) {
                0 => MutantBuff::Speed,
                1 => MutantBuff::Damage,
                _ => MutantBuff::Armor,
            });
            mutant.active_secs = MUTANT_BUFF_SECS;
            let next = rng.gen_range(3.0..5.0);
            mutant.roll_timer = Timer::from_seconds(next, TimerMode::Once);
        }
    }
}

fn shooter_attack_system(
    mut commands: Commands,
    time: Res<Time>,
    game_state: Res<GameState>,
    player_query: Query<&Transform, (With<Glowling>, Without<Enemy>)>,
    mut query: Query<(&Transform, &Enemy, &mut ShooterBehavior)>,
) {
    let Ok(player_transform) = player_query.get_single() else { return };
    let player_pos = player_transform.translation.truncate();
    let mut rng = rand::thread_rng();
    let wave = game_state.wave;

    for (transform, enemy, mut shooter) in query.iter_mut() {
        if !enemy.is_ranged || shooter.suppressed {
            continue;
        }
        if shooter.uses_duty_cycle {
            shooter.duty_timer.tick(time.delta());
            if shooter.duty_timer.finished() {
                let (next_phase, secs) = match shooter.duty_phase {
                    DutyPhase::Attack => (DutyPhase::Pause, rng.gen_range(1.0..1.6)),
                    DutyPhase::Pause => (DutyPhase::Attack, rng.gen_range(1.6..2.2)),
                };
                shooter.duty_phase = next_phase;
                shooter.duty_timer = Timer::from_seconds(secs, TimerMode::Once);
            }
            if shooter.duty_phase == DutyPhase::Pause {
                continue;
            }
        }
        shooter.fire_timer.tick(time.delta());
        let pos = transform.translation.truncate();
        if shooter.fire_timer.just_finished() && pos.distance(player_pos) <= SHOOTER_RANGE {
            let dir = (player_pos - pos).normalize_or_zero();
            if dir == Vec2::ZERO {
                continue;
            }
            let shots = if wave >= SHOOTER_BURST_WAVE && rng.gen_bool(SHOOTER_BURST_CHANCE) {
                rng.gen_range(2..=3)
            } else {
                1
            };
            for i in 0..shots {
                let spread = rng.gen_range(-SHOOTER_SPREAD_RADIANS..SHOOTER_SPREAD_RADIANS)
                    + (i as f32 - (shots - 1) as f32 / 2.0) * 0.08;
                let aimed = Vec2::from_angle(spread).rotate(dir);
                spawn_enemy_projectile(
                    &mut commands,
                    pos,
                    aimed * SHOOTER_PROJECTILE_SPEED,
                    shooter_damage(wave),
                    false,
                );
            }
            let next = rng.gen_range(0.85..1.45);
            shooter.fire_timer.set_duration(std::time::Duration::from_secs_f32(next));
        }
    }
}

fn shooter_damage(wave: u32) -> i32 {
    match wave {
        0..=9 => 8,
        10..=15 => 12,
        _ => 16,
    }
}

/// Two-phase sniper: a telegraphed windup with a locked aim, then a single
/// fast high-damage shot, then a cooldown before the next windup.
fn sniper_attack_system(
    mut commands: Commands,
    time: Res<Time>,
    game_state: Res<GameState>,
    player_query: Query<&Transform, (With<Glowling>, Without<Enemy>)>,
    mut query: Query<(&Transform, &Enemy, &mut SniperBehavior, &mut Sprite)>,
) {
    let Ok(player_transform) = player_query.get_single() else { return };
    let player_pos = player_transform.translation.truncate();
    let mut rng = rand::thread_rng();

    for (transform, enemy, mut sniper, mut sprite) in query.iter_mut() {
        if !enemy.is_ranged || sniper.suppressed {
            continue;
        }
        let pos = transform.translation.truncate();
        sniper.state_timer.tick(time.delta());
        match sniper.state {
            SniperState::Stalking => {
                if sniper.state_timer.finished() && pos.distance(player_pos) <= SNIPER_RANGE {
                    sniper.state = SniperState::Windup;
                    sniper.state_timer = Timer::from_seconds(SNIPER_WINDUP_SECS, TimerMode::Once);
                    sniper.locked_dir = (player_pos - pos).normalize_or_zero();
                    sprite.color = Color::rgb(0.9, 1.0, 0.85);
                }
            }
            SniperState::Windup => {
                // Track the player until the shot leaves; the telegraph is the
                // brightened sprite, the shot itself is near-instant.
                sniper.locked_dir = (player_pos - pos).normalize_or_zero();
                if sniper.state_timer.finished() {
                    spawn_enemy_projectile(
                        &mut commands,
                        pos,
                        sniper.locked_dir * SNIPER_SHOT_SPEED,
                        sniper_damage(game_state.wave),
                        true,
                    );
                    sniper.state = SniperState::Cooldown;
                    sniper.state_timer = Timer::from_seconds(rng.gen_range(2.5..3.5), TimerMode::Once);
                    sprite.color = enemy.role.color();
                }
            }
            SniperState::Cooldown => {
                if sniper.state_timer.finished() {
                    sniper.state = SniperState::Stalking;
                    sniper.state_timer = Timer::from_seconds(rng.gen_range(0.5..1.2), TimerMode::Once);
                }
            }
        }
    }
}

fn sniper_damage(wave: u32) -> i32 {
    match wave {
        0..=12 => 18,
        _ => 26,
    }
}

/// Bloodmage: self-centered melee pulse on one clock, radial slow-projectile
/// burst on an independent one. Wave-gated at spawn (>= 11).
fn bloodmage_attack_system(
    mut commands: Commands,
    time: Res<Time>,
    game_state: Res<GameState>,
    player_query: Query<&Transform, (With<Glowling>, Without<Enemy>)>,
    mut query: Query<(&Transform, &Enemy, &mut BloodmageBehavior)>,
    mut pulse_events: EventWriter<crate::combat::AreaPulseEvent>,
) {
    let player_pos = player_query.get_single().ok().map(|t| t.translation.truncate());
    if game_state.wave < BLOODMAGE_WAVE {
        return;
    }
    for (transform, enemy, mut mage) in query.iter_mut() {
        if !enemy.is_ranged || mage.suppressed {
            continue;
        }
        let pos = transform.translation.truncate();
        mage.pulse_timer.tick(time.delta());
        if mage.pulse_timer.just_finished() {
            if let Some(target) = player_pos {
                if pos.distance(target) <= BLOODMAGE_PULSE_RADIUS {
                    pulse_events.send(crate::combat::AreaPulseEvent {
                        center: pos,
                        radius: BLOODMAGE_PULSE_RADIUS,
                        damage: 6,
                    });
                }
            }
        }
        mage.burst_timer.tick(time.delta());
        if mage.burst_timer.just_finished() {
            for i in 0..BLOODMAGE_BURST_COUNT {
                let angle = i as f32 / BLOODMAGE_BURST_COUNT as f32 * std::f32::consts::TAU;
                spawn_enemy_projectile(
                    &mut commands,
                    pos,
                    Vec2::from_angle(angle) * BLOODMAGE_BURST_SPEED,
                    7,
                    false,
                );
            }
        }
    }
}

/// Wave >= 10 shooters sidestep incoming player/turret projectiles: a shot
/// inside the danger radius and geometrically approaching (dot test) rolls a
/// wave-scaled chance to trigger a short perpendicular dash, preferring the
/// side that opens distance from the player.
fn evasion_dash_system(
    time: Res<Time>,
    game_state: Res<GameState>,
    player_query: Query<&Transform, (With<Glowling>, Without<Enemy>)>,
    projectile_query: Query<(&Transform, &Velocity, &Projectile), Without<Enemy>>,
    mut query: Query<(&Transform, &mut EvadeDash), With<Enemy>>,
) {
    let dt = time.delta_seconds().min(0.066);
    let wave = game_state.wave;
    if wave < EVADE_WAVE {
        return;
    }
    let player_pos = player_query.get_single().ok().map(|t| t.translation.truncate());
    let danger_radius = evade_danger_radius(wave);
    let mut rng = rand::thread_rng();

    for (transform, mut evade) in query.iter_mut() {
        if evade.dash_secs > 0.0 {
            evade.dash_secs -= dt;
            continue;
        }
        evade.cooldown.tick(time.delta());
        if !evade.cooldown.finished() {
            continue;
        }
        let pos = transform.translation.truncate();
        for (proj_transform, proj_velocity, projectile) in projectile_query.iter() {
            if projectile.faction != Faction::Player {
                continue;
            }
            let proj_pos = proj_transform.translation.truncate();
            let to_enemy = pos - proj_pos;
            if to_enemy.length() > danger_radius {
                continue;
            }
            if proj_velocity.0.normalize_or_zero().dot(to_enemy.normalize_or_zero()) < 0.75 {
                continue;
            }
            if !rng.gen_bool(evade_chance(wave)) {
                // One failed roll per threat window; re-arm the cooldown.
                evade.cooldown = Timer::from_seconds(evade_cooldown_secs(wave, &mut rng), TimerMode::Once);
                break;
            }
            let travel = proj_velocity.0.normalize_or_zero();
            let perp = Vec2::new(-travel.y, travel.x);
            let side = match player_pos {
                Some(p) => {
                    // Prefer the perpendicular that increases distance from the player.
                    if (pos + perp * 10.0).distance(p) >= (pos - perp * 10.0).distance(p) { 1.0 } else { -1.0 }
                }
                None => if rng.gen_bool(0.5) { 1.0 } else { -1.0 },
            };
            evade.dash_dir = perp * side;
            evade.dash_secs = rng.gen_range(0.2..0.28);
            evade.cooldown = Timer::from_seconds(evade_cooldown_secs(wave, &mut rng), TimerMode::Once);
            break;
        }
    }
}

/// Ticks down rage/slow/hitstop fields owned by enemies.
fn status_decay_system(
    mut commands: Commands,
    time: Res<Time>,
    mut rage_query: Query<&mut BerserkerBehavior>,
    mut slow_query: Query<(Entity, &mut Slowed)>,
    mut hitstop_query: Query<(Entity, &mut Hitstop)>,
) {
    let dt = time.delta_seconds();
    for mut rage in rage_query.iter_mut() {
        rage.rage_secs = (rage.rage_secs - dt).max(0.0);
    }
    for (entity, mut slowed) in slow_query.iter_mut() {
        slowed.remaining_secs -= dt;
        if slowed.remaining_secs <= 0.0 {
            commands.entity(entity).remove::<Slowed>();
        }
    }
    for (entity, mut hitstop) in hitstop_query.iter_mut() {
        hitstop.remaining_secs -= dt;
        if hitstop.remaining_secs <= 0.0 {
            commands.entity(entity).remove::<Hitstop>();
        }
    }
}
