use rand::rngs::StdRng;
use rand::SeedableRng;

use bevy::math::Vec2;

use glowlings::combat::{
    apply_armor, apply_heal, clamp_no_lethal, consume_pierce, contact_effect, roll_crit,
    stagger_scale, ContactEffect, MIN_STAGGER_SCALE,
};
use glowlings::economy::{drop_value, UpgradeCard};
use glowlings::enemy::{Enemy, EnemyRole, SizeTier};
use glowlings::loadout::PlayerLoadout;
use glowlings::player::{Element, Glowling};
use glowlings::projectiles::{Faction, Projectile};

fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn bolt(pierce: u32) -> Projectile {
    Projectile {
        faction: Faction::Player,
        damage: 10,
        pierce_left: pierce,
        already_hit: Vec::new(),
        burn: None,
        is_sniper: false,
        owner: None,
        group: None,
    }
}

#[test]
fn crit_chance_zero_never_crits() {
    let mut r = rng();
    for _ in 0..200 {
        let (damage, crit) = roll_crit(10, 0.0, 0.5, &mut r);
        assert_eq!(damage, 10);
        assert!(!crit);
    }
}

#[test]
fn crit_chance_one_always_crits_with_the_multiplier() {
    let mut r = rng();
    for _ in 0..200 {
        let (damage, crit) = roll_crit(10, 1.0, 0.5, &mut r);
        assert_eq!(damage, 15);
        assert!(crit);
    }
}

#[test]
fn crit_rounds_to_nearest_whole_point() {
    let mut r = rng();
    let (damage, _) = roll_crit(7, 1.0, 0.5, &mut r);
    assert_eq!(damage, 11); // 10.5 rounds up
}

#[test]
fn armor_subtracts_but_floors_at_one() {
    assert_eq!(apply_armor(10, 3), 7);
    assert_eq!(apply_armor(5, 5), 1);
    assert_eq!(apply_armor(2, 50), 1);
    assert_eq!(apply_armor(10, 0), 10);
}

#[test]
fn revive_grace_clamps_lethal_damage() {
    // Inside the grace a hit may bring the player to 1 HP but not below.
    assert_eq!(clamp_no_lethal(100, 30, true), 29);
    assert_eq!(clamp_no_lethal(5, 30, true), 5);
    assert_eq!(clamp_no_lethal(100, 1, true), 0);
    // Outside the grace damage passes through unchanged.
    assert_eq!(clamp_no_lethal(100, 30, false), 100);
}

#[test]
fn stagger_scale_shrinks_with_resist_but_never_vanishes() {
    assert_eq!(stagger_scale(0.0), 1.0);
    assert!((stagger_scale(0.4) - 0.6).abs() < 1e-6);
    assert_eq!(stagger_scale(0.9), MIN_STAGGER_SCALE);
    assert_eq!(stagger_scale(1.5), MIN_STAGGER_SCALE);
}

#[test]
fn flat_pierce_two_survives_exactly_two_extra_hits() {
    let mut r = rng();
    let mut projectile = bolt(2);
    // First two hits are absorbed by the pierce counter; the third spends
    // the bolt, so it strikes exactly three targets.
    assert!(consume_pierce(&mut projectile, 0.0, &mut r));
    assert!(consume_pierce(&mut projectile, 0.0, &mut r));
    assert!(!consume_pierce(&mut projectile, 0.0, &mut r));
}

#[test]
fn pierce_chance_one_always_carries_through() {
    let mut r = rng();
    let mut projectile = bolt(0);
    for _ in 0..50 {
        assert!(consume_pierce(&mut projectile, 1.0, &mut r));
    }
}

#[test]
fn parasite_bite_heals_half_and_never_overheals() {
    let enemy = Enemy::new(EnemyRole::Parasite, 13, Vec2::ZERO);
    let ContactEffect::Lifesteal { heal } = contact_effect(enemy.role, enemy.contact_damage) else {
        panic!("parasite lost its lifesteal");
    };
    assert_eq!(heal, enemy.contact_damage / 2);

    // A full-health parasite stays pinned at max through repeated bites.
    let max = 30;
    let mut hp = 30;
    for _ in 0..3 {
        hp = apply_heal(hp, max, heal);
    }
    assert_eq!(hp, max);
    // A wounded one recovers by the half-damage amount.
    assert_eq!(apply_heal(20, max, heal), 20 + heal);
}

#[test]
fn melee_riders_match_their_roles() {
    // The berserker's speed buff rides its own landed hit, not incoming fire.
    assert!(matches!(
        contact_effect(EnemyRole::Berserker, 12),
        ContactEffect::Rage { secs } if secs > 0.0
    ));
    // The overcharged splash is a rider on a persistent attacker, not a
    // self-destruct.
    assert!(matches!(
        contact_effect(EnemyRole::Overcharged, 10),
        ContactEffect::Splash { damage, .. } if damage > 0
    ));
    assert!(matches!(contact_effect(EnemyRole::Juggernaut, 20), ContactEffect::Shove { .. }));
    assert_eq!(contact_effect(EnemyRole::Rush, 8), ContactEffect::None);
    assert_eq!(contact_effect(EnemyRole::Tank, 14), ContactEffect::None);
}

#[test]
fn invulnerability_windows_suppress_damage() {
    let mut glowling = Glowling::new(Element::Fire);
    // Spawn protection opens a window immediately.
    assert!(glowling.is_invulnerable());
    glowling.tick_windows(10.0);
    assert!(!glowling.is_invulnerable());
    glowling.dodge_iframes_secs = 0.3;
    assert!(glowling.is_invulnerable());
    glowling.tick_windows(0.31);
    assert!(!glowling.is_invulnerable());
}

#[test]
fn drop_value_scales_with_tier_and_wave() {
    assert_eq!(drop_value(SizeTier::Small, false, 1), 1);
    assert_eq!(drop_value(SizeTier::Big, false, 1), 3);
    assert!(drop_value(SizeTier::Small, false, 24) > drop_value(SizeTier::Small, false, 1));
    assert!(drop_value(SizeTier::Big, true, 5) >= 15);
}

#[test]
fn upgrades_mutate_the_loadout_slots() {
    let mut loadout = PlayerLoadout::default();

    UpgradeCard::WeaponDamage.apply(&mut loadout);
    assert!((loadout.weapon_damage - 12.0).abs() < 1e-4);

    UpgradeCard::FireRate.apply(&mut loadout);
    assert!(loadout.fire_interval_secs < 0.5);

    UpgradeCard::FlatPierce.apply(&mut loadout);
    assert_eq!(loadout.flat_pierce, 1);

    UpgradeCard::Armor.apply(&mut loadout);
    assert_eq!(loadout.armor, 1);

    UpgradeCard::Aura.apply(&mut loadout);
    assert_eq!(loadout.aura_dps, 3.0);
    assert!(loadout.aura_radius >= 120.0);

    UpgradeCard::OnKillHeal.apply(&mut loadout);
    assert_eq!(loadout.on_kill_heal, 1);
}

#[test]
fn fire_interval_never_collapses_to_zero() {
    let mut loadout = PlayerLoadout::default();
    for _ in 0..100 {
        UpgradeCard::FireRate.apply(&mut loadout);
    }
    assert!(loadout.fire_interval_secs >= 0.1);
}

#[test]
fn crit_chance_upgrade_is_capped() {
    let mut loadout = PlayerLoadout::default();
    for _ in 0..50 {
        UpgradeCard::CritChance.apply(&mut loadout);
    }
    assert!(loadout.crit_chance <= 0.8);
}

#[test]
fn upgrade_costs_rise_with_wave() {
    for card in [UpgradeCard::WeaponDamage, UpgradeCard::Turret, UpgradeCard::Armor] {
        assert!(card.cost(20) > card.cost(1), "{:?}", card);
    }
}

#[test]
fn stronger_loadouts_spawn_faster() {
    let weak = PlayerLoadout::default();
    let mut strong = PlayerLoadout::default();
    strong.weapon_damage *= 3.0;
    strong.aura_dps = 12.0;
    assert!(strong.player_power() > weak.player_power());
    assert!(strong.spawn_rate() > weak.spawn_rate());
}
