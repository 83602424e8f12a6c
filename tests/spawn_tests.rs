use rand::rngs::StdRng;
use rand::SeedableRng;

use glowlings::enemy::EnemyRole;
use glowlings::errors::SpawnError;
use glowlings::game::{ARENA_HALF_HEIGHT, ARENA_HALF_WIDTH};
use glowlings::spawning::{
    admit_planned_spawn, admit_pressure_spawn, edge_spawn_position, pressure_spawn_position,
    support_safe_role, SpawnDirector,
};
use bevy::math::Vec2;
use glowlings::waves::{WaveRuntime, PERFORMANCE_CAP};

fn runtime_with(budget: u32, cap: u32) -> WaveRuntime {
    WaveRuntime {
        budget_remaining: budget,
        comp_remaining: Vec::new(),
        desired_cap: cap,
        boss_spawned: false,
        boss_wants_refill: false,
    }
}

#[test]
fn accumulator_smooths_fractional_rates() {
    let mut director = SpawnDirector::default();
    let dt = 1.0 / 60.0;
    let rate = 2.4;
    let mut total = 0;
    for _ in 0..600 {
        let owed = director.advance(rate, dt);
        assert!(owed <= 3, "per-frame cap violated: {}", owed);
        total += owed;
    }
    // 10 seconds at 2.4/s: the carry loses at most a fraction of one spawn.
    assert!((23..=24).contains(&total), "got {}", total);
}

#[test]
fn accumulator_caps_a_burst_frame() {
    let mut director = SpawnDirector::default();
    // A huge stall frame still only releases the per-frame cap.
    let owed = director.advance(10.0, 2.0);
    assert_eq!(owed, 3);
}

#[test]
fn admission_requires_a_player() {
    let runtime = runtime_with(10, 20);
    assert_eq!(admit_planned_spawn(&runtime, 0, false, false), Err(SpawnError::NoPlayer));
}

#[test]
fn admission_enforces_the_concurrent_cap() {
    let runtime = runtime_with(10, 20);
    assert_eq!(
        admit_planned_spawn(&runtime, 20, false, true),
        Err(SpawnError::CapReached { cap: 20 })
    );
    assert!(admit_planned_spawn(&runtime, 19, false, true).is_ok());
}

#[test]
fn admission_caps_at_the_performance_ceiling() {
    let runtime = runtime_with(10, 500);
    assert_eq!(
        admit_planned_spawn(&runtime, PERFORMANCE_CAP, false, true),
        Err(SpawnError::CapReached { cap: PERFORMANCE_CAP })
    );
}

#[test]
fn boss_fights_throttle_support_to_ten() {
    let runtime = runtime_with(50, 40);
    assert_eq!(
        admit_planned_spawn(&runtime, 10, true, true),
        Err(SpawnError::BossSupportCeiling)
    );
    assert!(admit_planned_spawn(&runtime, 9, true, true).is_ok());
    // Without a boss the same count sails through.
    assert!(admit_planned_spawn(&runtime, 10, false, true).is_ok());
}

#[test]
fn admission_fails_once_the_budget_is_spent() {
    let runtime = runtime_with(0, 20);
    assert_eq!(admit_planned_spawn(&runtime, 0, false, true), Err(SpawnError::BudgetExhausted));
}

#[test]
fn heavies_are_remapped_out_of_boss_support() {
    assert_eq!(support_safe_role(EnemyRole::Tank), EnemyRole::Rush);
    assert_eq!(support_safe_role(EnemyRole::Elite), EnemyRole::Rush);
    assert_eq!(support_safe_role(EnemyRole::Juggernaut), EnemyRole::Rush);
    assert_eq!(support_safe_role(EnemyRole::Shooter), EnemyRole::Shooter);
    assert_eq!(support_safe_role(EnemyRole::Rush), EnemyRole::Rush);
}

#[test]
fn pressure_spawn_ignores_the_budget_but_not_the_caps() {
    // An exhausted budget never blocks the anti-lull spawn.
    let spent = runtime_with(0, 20);
    assert!(admit_pressure_spawn(&spent, 5).is_ok());
    // The concurrency caps still do.
    assert_eq!(admit_pressure_spawn(&spent, 20), Err(SpawnError::CapReached { cap: 20 }));
    let huge = runtime_with(0, 500);
    assert_eq!(
        admit_pressure_spawn(&huge, PERFORMANCE_CAP),
        Err(SpawnError::CapReached { cap: PERFORMANCE_CAP })
    );
}

#[test]
fn pressure_spawn_enters_from_the_nearest_edge() {
    let mut rng = StdRng::seed_from_u64(17);
    // Player hugging the right wall: the chaser comes in over that wall,
    // near the player's height.
    let player = Vec2::new(ARENA_HALF_WIDTH - 80.0, 120.0);
    for _ in 0..200 {
        let pos = pressure_spawn_position(player, &mut rng);
        assert!(pos.x > ARENA_HALF_WIDTH - 60.0, "wrong edge: {:?}", pos);
        assert!((pos.y - player.y).abs() <= 260.0, "too far along the edge: {:?}", pos);
        assert!(pos.y.abs() <= ARENA_HALF_HEIGHT);
    }
    // Player near the top: the chaser drops in from the top edge.
    let player = Vec2::new(-200.0, ARENA_HALF_HEIGHT - 50.0);
    for _ in 0..200 {
        let pos = pressure_spawn_position(player, &mut rng);
        assert!(pos.y > ARENA_HALF_HEIGHT - 60.0, "wrong edge: {:?}", pos);
        assert!((pos.x - player.x).abs() <= 260.0, "too far along the edge: {:?}", pos);
    }
}

#[test]
fn edge_spawns_hug_the_walls_inside_corner_margins() {
    let mut rng = StdRng::seed_from_u64(99);
    for wave in [3, 12] {
        for _ in 0..500 {
            let pos = edge_spawn_position(wave, &mut rng);
            assert!(pos.x.abs() <= ARENA_HALF_WIDTH);
            assert!(pos.y.abs() <= ARENA_HALF_HEIGHT);
            let on_vertical_edge = (pos.x.abs() - (ARENA_HALF_WIDTH - 30.0)).abs() < 0.5;
            let on_horizontal_edge = (pos.y.abs() - (ARENA_HALF_HEIGHT - 30.0)).abs() < 0.5;
            assert!(on_vertical_edge || on_horizontal_edge, "not on an edge: {:?}", pos);
        }
    }
}

#[test]
fn corner_margin_widens_after_wave_six() {
    let mut rng = StdRng::seed_from_u64(5);
    // On late waves no spawn lands within the widened corner margin along
    // its edge axis.
    for _ in 0..500 {
        let pos = edge_spawn_position(12, &mut rng);
        let on_horizontal_edge = (pos.y.abs() - (ARENA_HALF_HEIGHT - 30.0)).abs() < 0.5;
        if on_horizontal_edge {
            assert!(pos.x.abs() <= ARENA_HALF_WIDTH - 140.0, "corner spawn: {:?}", pos);
        } else {
            assert!(pos.y.abs() <= ARENA_HALF_HEIGHT - 140.0, "corner spawn: {:?}", pos);
        }
    }
}

#[test]
fn director_reset_clears_carry_and_pressure() {
    let mut director = SpawnDirector::default();
    director.advance(5.0, 0.13);
    director.pressure_secs = 2.0;
    director.reset();
    assert_eq!(director.accumulator, 0.0);
    assert_eq!(director.pressure_secs, 0.0);
}
