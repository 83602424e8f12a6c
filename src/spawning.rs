use bevy::prelude::*;
use rand::Rng;

use crate::{
    enemy::{spawn_enemy, Enemy, EnemyRole},
    errors::SpawnError,
    game::{AppState, GameState, SimSet, ARENA_HALF_HEIGHT, ARENA_HALF_WIDTH},
    loadout::PlayerLoadout,
    player::Glowling,
    waves::{choose_role, fallback_role, is_boss_wave, WaveRuntime, PERFORMANCE_CAP},
};

const MAX_SPAWNS_PER_FRAME: u32 = 3;
const EDGE_INSET: f32 = 30.0;
/// Corner margin widens after wave 6 so spawns stop clustering in corners
/// right when compositions turn ranged-heavy.
const CORNER_MARGIN_EARLY: f32 = 40.0;
const CORNER_MARGIN_LATE: f32 = 140.0;

const PRESSURE_RADIUS: f32 = 1000.0;
const PRESSURE_TRIGGER_SECS: f32 = 3.5;
const PRESSURE_EDGE_JITTER: f32 = 220.0;

/// Boss waves keep a thin trickle of light support; heavies never join it.
const BOSS_SUPPORT_CAP: u32 = 10;
const BOSS_SUPPORT_RATE_SCALE: f32 = 0.35;
const BOSS_REFILL_PACK: [(EnemyRole, u32); 2] = [(EnemyRole::Rush, 6), (EnemyRole::Shooter, 4)];

/// Fractional spawn pacing: rate * dt accumulates and only whole units spawn,
/// so a 2.4/s rate yields 2 then 3 instead of bursty rounding.
#[derive(Resource, Debug)]
pub struct SpawnDirector {
    pub accumulator: f32,
    pub pressure_secs: f32,
}

impl Default for SpawnDirector {
    fn default() -> Self {
        Self { accumulator: 0.0, pressure_secs: 0.0 }
    }
}

impl SpawnDirector {
    /// Returns the whole number of spawns owed this frame, capped.
    pub fn advance(&mut self, rate_per_sec: f32, dt: f32) -> u32 {
        self.accumulator += rate_per_sec * dt;
        let whole = (self.accumulator.floor() as u32).min(MAX_SPAWNS_PER_FRAME);
        self.accumulator -= whole as f32;
        whole
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.pressure_secs = 0.0;
    }
}

pub fn edge_spawn_position(wave: u32, rng: &mut impl Rng) -> Vec2 {
    let corner_margin = if wave > 6 { CORNER_MARGIN_LATE } else { CORNER_MARGIN_EARLY };
    let x_span = ARENA_HALF_WIDTH - corner_margin;
    let y_span = ARENA_HALF_HEIGHT - corner_margin;
    match rng.gen_range(0..4) {
        0 => Vec2::new(rng.gen_range(-x_span..x_span), ARENA_HALF_HEIGHT - EDGE_INSET),
        1 => Vec2::new(rng.gen_range(-x_span..x_span), -ARENA_HALF_HEIGHT + EDGE_INSET),
        2 => Vec2::new(-ARENA_HALF_WIDTH + EDGE_INSET, rng.gen_range(-y_span..y_span)),
        _ => Vec2::new(ARENA_HALF_WIDTH - EDGE_INSET, rng.gen_range(-y_span..y_span)),
    }
}

/// Pure admission check for one planned spawn. Pulled out of the system so
/// the cap/budget/support rules are testable without an `App`.
pub fn admit_planned_spawn(
    runtime: &WaveRuntime,
    live_enemies: u32,
    boss_alive: bool,
    has_player: bool,
) -> Result<(), SpawnError> {
    if !has_player {
        return Err(SpawnError::NoPlayer);
    }
    let cap = runtime.desired_cap.min(PERFORMANCE_CAP);
    if live_enemies >= cap {
        return Err(SpawnError::CapReached { cap });
    }
    if boss_alive && live_enemies >= BOSS_SUPPORT_CAP {
        return Err(SpawnError::BossSupportCeiling);
    }
    if runtime.budget_remaining == 0 {
        return Err(SpawnError::BudgetExhausted);
    }
    Ok(())
}

/// Heavies sit out boss fights; remap them to the light chaser.
pub fn support_safe_role(role: EnemyRole) -> EnemyRole {
    if role.is_heavy() { EnemyRole::Rush } else { role }
}

/// Admission for the anti-lull pressure spawn: it is exempt from the wave's
/// threat budget but still bows to the concurrency caps.
pub fn admit_pressure_spawn(runtime: &WaveRuntime, live_enemies: u32) -> Result<(), SpawnError> {
    let cap = runtime.desired_cap.min(PERFORMANCE_CAP);
    if live_enemies >= cap {
        return Err(SpawnError::CapReached { cap });
    }
    Ok(())
}

/// Pressure spawns come in from the arena edge nearest the player, jittered
/// along that edge, so the chaser arrives from the player's general direction
/// instead of an arbitrary point on the ring.
pub fn pressure_spawn_position(player_pos: Vec2, rng: &mut impl Rng) -> Vec2 {
    let jitter = rng.gen_range(-PRESSURE_EDGE_JITTER..PRESSURE_EDGE_JITTER);
    let x_span = ARENA_HALF_WIDTH - CORNER_MARGIN_EARLY;
    let y_span = ARENA_HALF_HEIGHT - CORNER_MARGIN_EARLY;

    let to_right = ARENA_HALF_WIDTH - player_pos.x;
    let to_left = ARENA_HALF_WIDTH + player_pos.x;
    let to_top = ARENA_HALF_HEIGHT - player_pos.y;
    let to_bottom = ARENA_HALF_HEIGHT + player_pos.y;
    let nearest = to_right.min(to_left).min(to_top).min(to_bottom);

    if nearest == to_right {
        Vec2::new(ARENA_HALF_WIDTH - EDGE_INSET, (player_pos.y + jitter).clamp(-y_span, y_span))
    } else if nearest == to_left {
        Vec2::new(-ARENA_HALF_WIDTH + EDGE_INSET, (player_pos.y + jitter).clamp(-y_span, y_span))
    } else if nearest == to_top {
        Vec2::new((player_pos.x + jitter).clamp(-x_span, x_span), ARENA_HALF_HEIGHT - EDGE_INSET)
    } else {
        Vec2::new((player_pos.x + jitter).clamp(-x_span, x_span), -ARENA_HALF_HEIGHT + EDGE_INSET)
    }
}

pub struct SpawningPlugin;

impl Plugin for SpawningPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SpawnDirector>().add_systems(
            Update,
            (spawn_director_system, pressure_fallback_system)
                .chain()
                .in_set(SimSet::Spawning)
                .run_if(in_state(AppState::InGame)),
        );
    }
}

fn spawn_director_system(
    mut commands: Commands,
    time: Res<Time>,
    game_state: Res<GameState>,
    loadout: Res<PlayerLoadout>,
    mut director: ResMut<SpawnDirector>,
    mut runtime: ResMut<WaveRuntime>,
    player_query: Query<(), With<Glowling>>,
    enemy_query: Query<&Enemy>,
    boss_query: Query<(), With<crate::boss::Boss>>,
) {
    if !game_state.wave_active {
        return;
    }
    let wave = game_state.wave;
    let boss_alive = !boss_query.is_empty();
    let has_player = !player_query.is_empty();

    // Final boss summon phase: top the composition back up, budget-exempt.
    if runtime.boss_wants_refill {
        runtime.boss_wants_refill = false;
        for (role, count) in BOSS_REFILL_PACK {
            runtime.comp_remaining.push((role, count));
        }
        runtime.budget_remaining += BOSS_REFILL_PACK.iter().map(|(_, n)| n).sum::<u32>();
        debug!("boss summon refilled composition");
    }

    let mut rate = loadout.spawn_rate();
    if boss_alive {
        rate *= BOSS_SUPPORT_RATE_SCALE;
    }
    let owed = director.advance(rate, time.delta_seconds());
    if owed == 0 {
        return;
    }

    let mut live = enemy_query.iter().count() as u32;
    let mut rng = rand::thread_rng();
    for _ in 0..owed {
        match admit_planned_spawn(&runtime, live, boss_alive, has_player) {
            Ok(()) => {}
            Err(SpawnError::NoPlayer) => {
                warn!("spawn skipped: {}", SpawnError::NoPlayer);
                return;
            }
            Err(err) => {
                debug!("spawn deferred: {}", err);
                return;
            }
        }
        let mut role = choose_role(wave, &mut runtime.comp_remaining, &mut rng);
        if boss_alive {
            role = support_safe_role(role);
        }
        runtime.consume_budget();
        let position = edge_spawn_position(wave, &mut rng);
        spawn_enemy(&mut commands, role, wave, position, loadout.weapon_damage, &mut rng);
        live += 1;
    }
}

/// Anti-lull: if nothing has been within pressure range of the player for a
/// few seconds, drop a budget-exempt chaser near them.
fn pressure_fallback_system(
    mut commands: Commands,
    time: Res<Time>,
    game_state: Res<GameState>,
    loadout: Res<PlayerLoadout>,
    runtime: Res<WaveRuntime>,
    mut director: ResMut<SpawnDirector>,
    player_query: Query<&Transform, With<Glowling>>,
    enemy_query: Query<&Transform, With<Enemy>>,
) {
    if !game_state.wave_active || is_boss_wave(game_state.wave) {
        return;
    }
    let Ok(player_transform) = player_query.get_single() else { return };
    let player_pos = player_transform.translation.truncate();

    let any_near = enemy_query
        .iter()
        .any(|t| t.translation.truncate().distance(player_pos) <= PRESSURE_RADIUS);
    if any_near {
        director.pressure_secs = 0.0;
        return;
    }
    director.pressure_secs += time.delta_seconds();
    if director.pressure_secs < PRESSURE_TRIGGER_SECS {
        return;
    }
    director.pressure_secs = 0.0;

    let live = enemy_query.iter().count() as u32;
    if let Err(err) = admit_pressure_spawn(&runtime, live) {
        debug!("pressure spawn deferred: {}", err);
        return;
    }
    let mut rng = rand::thread_rng();
    let position = pressure_spawn_position(player_pos, &mut rng);
    let role = fallback_role(game_state.wave, &mut rng);
    debug!("pressure spawn: {:?}", role);
    spawn_enemy(&mut commands, role, game_state.wave, position, loadout.weapon_damage, &mut rng);
}
