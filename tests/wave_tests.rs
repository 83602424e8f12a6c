use rand::rngs::StdRng;
use rand::SeedableRng;

use glowlings::enemy::{evade_chance, evade_danger_radius, stagger_resist, EnemyRole, SizeTier};
use glowlings::waves::{
    choose_role, desired_cap, enemy_hp, init_composition, is_boss_wave, planned_wave,
    threat_budget, wave_duration_secs, WaveRuntime, BOSS_WAVES, GLOBAL_MAX_BOTS,
    RESERVED_BOSS_WAVES,
};

fn rng() -> StdRng {
    StdRng::seed_from_u64(7)
}

#[test]
fn boss_waves_are_exactly_the_four_milestones() {
    for wave in 1..=30 {
        assert_eq!(is_boss_wave(wave), BOSS_WAVES.contains(&wave), "wave {}", wave);
    }
    // Reserved waves are not boss waves yet.
    for wave in RESERVED_BOSS_WAVES {
        assert!(!is_boss_wave(wave));
    }
}

#[test]
fn boss_waves_have_no_planned_composition() {
    for wave in BOSS_WAVES.iter().chain(RESERVED_BOSS_WAVES.iter()) {
        assert!(planned_wave(*wave).is_none(), "wave {} should be unplanned", wave);
    }
}

#[test]
fn all_non_boss_waves_to_30_are_planned() {
    for wave in 1..=30 {
        if is_boss_wave(wave) || RESERVED_BOSS_WAVES.contains(&wave) {
            continue;
        }
        let plan = planned_wave(wave).unwrap_or_else(|| panic!("wave {} missing", wave));
        assert!(!plan.comp.is_empty());
        assert!(plan.comp.iter().all(|(_, n)| *n > 0));
    }
}

#[test]
fn wave_duration_uses_plan_then_bands() {
    let mut r = rng();
    assert_eq!(wave_duration_secs(1, &mut r), 25.0);
    assert_eq!(wave_duration_secs(24, &mut r), 72.0);
    // Unplanned waves degrade to the banded fallback.
    for _ in 0..50 {
        let d = wave_duration_secs(5, &mut r);
        assert!((30.0..40.0).contains(&d), "got {}", d);
        let late = wave_duration_secs(40, &mut r);
        assert_eq!(late, 75.0);
    }
}

#[test]
fn threat_budget_bands_are_respected() {
    let mut r = rng();
    for _ in 0..100 {
        assert!((30..=40).contains(&threat_budget(2, &mut r)));
        assert!((50..=70).contains(&threat_budget(5, &mut r)));
        assert!((80..=120).contains(&threat_budget(9, &mut r)));
        assert!((130..=180).contains(&threat_budget(13, &mut r)));
        assert!((200..=250).contains(&threat_budget(18, &mut r)));
        assert_eq!(threat_budget(25, &mut r), 200);
    }
}

#[test]
fn desired_cap_is_bucketed_and_never_exceeds_global_max() {
    for wave in 1..=30 {
        let cap = desired_cap(wave);
        assert!([12, 20, 30, 40].contains(&cap), "wave {} cap {}", wave, cap);
        assert!(cap <= GLOBAL_MAX_BOTS);
    }
    // Wave 1 plans 12 bots: the smallest bucket.
    assert_eq!(desired_cap(1), 12);
}

#[test]
fn rebalance_kicks_in_from_wave_six() {
    // Below the threshold the plan passes through untouched.
    let early = init_composition(4);
    assert_eq!(early, planned_wave(4).unwrap().comp);

    let comp = init_composition(6);
    let original = planned_wave(6).unwrap().comp;
    let total: u32 = comp.iter().map(|(_, n)| n).sum();
    let original_total: u32 = original.iter().map(|(_, n)| n).sum();

    // Fast is zeroed out; its share is dropped, the rush cut moves to shooters.
    assert!(!comp.iter().any(|(r, _)| *r == EnemyRole::Fast));
    let fast_share: u32 = original
        .iter()
        .filter(|(r, _)| *r == EnemyRole::Fast)
        .map(|(_, n)| n)
        .sum();
    assert_eq!(total, original_total - fast_share);

    let rush = comp.iter().find(|(r, _)| *r == EnemyRole::Rush).map(|(_, n)| *n).unwrap_or(0);
    let original_rush = original.iter().find(|(r, _)| *r == EnemyRole::Rush).map(|(_, n)| *n).unwrap();
    assert_eq!(rush, original_rush - original_rush / 2);

    let shooters = comp.iter().find(|(r, _)| *r == EnemyRole::Shooter).map(|(_, n)| *n).unwrap();
    let original_shooters = original.iter().find(|(r, _)| *r == EnemyRole::Shooter).map(|(_, n)| *n).unwrap_or(0);
    assert_eq!(shooters, original_shooters + original_rush / 2);

    // A tank is always guaranteed after the rebalance.
    assert!(comp.iter().any(|(r, n)| *r == EnemyRole::Tank && *n > 0));
}

#[test]
fn choose_role_drains_composition_before_falling_back() {
    let mut r = rng();
    let mut comp = vec![(EnemyRole::Rush, 3), (EnemyRole::Tank, 2)];
    for _ in 0..5 {
        let role = choose_role(7, &mut comp, &mut r);
        assert!(matches!(role, EnemyRole::Rush | EnemyRole::Tank));
    }
    assert!(comp.iter().all(|(_, n)| *n == 0));
    // Composition spent: the pick degrades to the banded fallback table.
    for _ in 0..20 {
        let _ = choose_role(7, &mut comp, &mut r);
        assert!(comp.iter().all(|(_, n)| *n == 0));
    }
}

#[test]
fn enemy_hp_is_a_whole_multiple_of_base_damage() {
    let base = 10.0;
    assert_eq!(enemy_hp(1, EnemyRole::Rush, SizeTier::Small, base), 10);
    assert_eq!(enemy_hp(4, EnemyRole::Rush, SizeTier::Small, base), 20);
    assert_eq!(enemy_hp(8, EnemyRole::Rush, SizeTier::Small, base), 20);
    assert_eq!(enemy_hp(12, EnemyRole::Rush, SizeTier::Small, base), 30);
    // Ranged smalls have their own band.
    assert_eq!(enemy_hp(6, EnemyRole::Shooter, SizeTier::Small, base), 10);
    assert_eq!(enemy_hp(9, EnemyRole::Shooter, SizeTier::Small, base), 20);
    // Big tier.
    assert_eq!(enemy_hp(6, EnemyRole::Tank, SizeTier::Big, base), 20);
    assert_eq!(enemy_hp(10, EnemyRole::Tank, SizeTier::Big, base), 40);
    assert_eq!(enemy_hp(16, EnemyRole::Juggernaut, SizeTier::Big, base), 60);
    // Fractional base damage rounds up, never down to a free kill threshold.
    assert_eq!(enemy_hp(1, EnemyRole::Rush, SizeTier::Small, 10.3), 11);
    // Degenerate base damage still yields at least 1 HP.
    assert!(enemy_hp(1, EnemyRole::Rush, SizeTier::Small, 0.0) >= 1);
}

#[test]
fn stagger_resist_scales_with_wave_and_clamps() {
    assert!(stagger_resist(EnemyRole::Rush, 1) < stagger_resist(EnemyRole::Rush, 20));
    assert!(stagger_resist(EnemyRole::Juggernaut, 1) > stagger_resist(EnemyRole::Tank, 1));
    assert_eq!(stagger_resist(EnemyRole::Juggernaut, 100), 0.9);
}

#[test]
fn evasion_tuning_steps_up_at_wave_fifteen() {
    assert_eq!(evade_chance(10), 0.28);
    assert_eq!(evade_chance(14), 0.28);
    assert_eq!(evade_chance(15), 0.50);
    assert_eq!(evade_danger_radius(10), 230.0);
    assert!(evade_danger_radius(14) > evade_danger_radius(11));
    assert_eq!(evade_danger_radius(30), 300.0);
}

#[test]
fn wave_runtime_budget_never_underflows() {
    let mut r = rng();
    let mut runtime = WaveRuntime::start_wave(2, &mut r);
    let budget = runtime.budget_remaining;
    for _ in 0..budget {
        assert!(runtime.consume_budget());
    }
    assert_eq!(runtime.budget_remaining, 0);
    assert!(!runtime.consume_budget());
    assert_eq!(runtime.budget_remaining, 0);
}

#[test]
fn role_tier_queries_are_consistent() {
    for role in [
        EnemyRole::Rush,
        EnemyRole::Shooter,
        EnemyRole::Fast,
        EnemyRole::Tank,
        EnemyRole::Elite,
        EnemyRole::Sniper,
        EnemyRole::Bloodmage,
        EnemyRole::Berserker,
        EnemyRole::Overcharged,
        EnemyRole::Parasite,
        EnemyRole::Juggernaut,
        EnemyRole::Mutant,
    ] {
        if role.is_heavy() {
            assert_eq!(role.size_tier(), SizeTier::Big, "{:?}", role);
        }
        if role.is_ranged() {
            assert_eq!(role.size_tier(), SizeTier::Small, "{:?}", role);
        }
    }
}
