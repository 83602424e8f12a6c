use bevy::math::Vec2;
use bevy::time::{Timer, TimerMode};

use glowlings::boss::{idle_secs, BossKind, Pattern};
use glowlings::enemy::{
    suppress_ranged, DutyPhase, Enemy, EnemyRole, ShooterBehavior, SniperBehavior, SniperState,
};
use glowlings::errors::BossCastError;
use glowlings::waves::{BOSS_WAVES, RESERVED_BOSS_WAVES};

#[test]
fn each_boss_wave_maps_to_its_kind() {
    assert_eq!(BossKind::for_wave(5), Ok(BossKind::Cindermaw));
    assert_eq!(BossKind::for_wave(10), Ok(BossKind::GaleTyrant));
    assert_eq!(BossKind::for_wave(15), Ok(BossKind::AbyssWeaver));
    assert_eq!(BossKind::for_wave(20), Ok(BossKind::LumenKing));
}

#[test]
fn non_boss_and_reserved_waves_have_no_machine() {
    for wave in [1, 2, 7, 13, 19, 21] {
        assert_eq!(BossKind::for_wave(wave), Err(BossCastError::UnknownBossWave(wave)));
    }
    // The reserved milestones exist in the plan tables but carry no phase
    // machine yet.
    for wave in RESERVED_BOSS_WAVES {
        assert_eq!(BossKind::for_wave(wave), Err(BossCastError::UnknownBossWave(wave)));
    }
}

#[test]
fn boss_hp_multiples_grow_monotonically() {
    let multiples: Vec<f32> = [
        BossKind::Cindermaw,
        BossKind::GaleTyrant,
        BossKind::AbyssWeaver,
        BossKind::LumenKing,
    ]
    .iter()
    .map(|k| k.hp_multiple())
    .collect();
    for pair in multiples.windows(2) {
        assert!(pair[1] > pair[0], "{:?}", multiples);
    }
}

#[test]
fn contact_damage_grows_with_the_boss_tier() {
    assert!(BossKind::GaleTyrant.contact_damage() > BossKind::Cindermaw.contact_damage());
    assert!(BossKind::AbyssWeaver.contact_damage() > BossKind::GaleTyrant.contact_damage());
    assert!(BossKind::LumenKing.contact_damage() > BossKind::AbyssWeaver.contact_damage());
}

#[test]
fn only_the_final_boss_summons() {
    for wave in BOSS_WAVES {
        let kind = BossKind::for_wave(wave).unwrap();
        let summons = kind.rotation().contains(&Pattern::Summon);
        assert_eq!(summons, kind == BossKind::LumenKing, "{:?}", kind);
    }
}

#[test]
fn opener_boss_runs_a_single_spinner_cycle() {
    assert_eq!(BossKind::Cindermaw.rotation(), &[Pattern::Spinner]);
}

#[test]
fn mid_bosses_share_the_three_phase_shape() {
    let expected = [Pattern::Spinner, Pattern::ConeBurst, Pattern::Starfall];
    assert_eq!(BossKind::GaleTyrant.rotation(), &expected);
    assert_eq!(BossKind::AbyssWeaver.rotation(), &expected);
}

#[test]
fn final_boss_has_the_richest_rotation() {
    let rotation = BossKind::LumenKing.rotation();
    assert!(rotation.len() >= 6, "{:?}", rotation);
    for pattern in [Pattern::Dash, Pattern::Spiral, Pattern::Beam, Pattern::Ring, Pattern::Shockwave] {
        assert!(rotation.contains(&pattern), "missing {:?}", pattern);
    }
}

#[test]
fn pattern_damage_multipliers_keep_their_tuning() {
    assert_eq!(BossKind::Cindermaw.damage_mult(), 1.4);
    assert_eq!(BossKind::GaleTyrant.damage_mult(), 3.24);
    // The wave-15 encounter reuses the wave-10 shape at lighter damage.
    assert!(BossKind::AbyssWeaver.damage_mult() < BossKind::GaleTyrant.damage_mult());
    assert!((1.4..=1.6).contains(&BossKind::AbyssWeaver.damage_mult()));
}

#[test]
fn enrage_shortens_the_idle_gap_by_a_fifth() {
    assert!((idle_secs(true) - idle_secs(false) * 0.8).abs() < 1e-6);
}

#[test]
fn suppression_mutes_every_ranged_archetype() {
    let mut shooter_enemy = Enemy::new(EnemyRole::Shooter, 10, Vec2::ZERO);
    assert!(shooter_enemy.is_ranged);
    let mut shooter = ShooterBehavior {
        fire_timer: Timer::from_seconds(1.0, TimerMode::Repeating),
        duty_phase: DutyPhase::Attack,
        duty_timer: Timer::from_seconds(2.0, TimerMode::Once),
        uses_duty_cycle: false,
        suppressed: false,
    };
    suppress_ranged(&mut shooter_enemy, Some(&mut shooter), None, None);
    assert!(!shooter_enemy.is_ranged);
    assert!(shooter.suppressed);

    // A sniper mid-windup is pulled back to stalking.
    let mut sniper_enemy = Enemy::new(EnemyRole::Sniper, 10, Vec2::ZERO);
    let mut sniper = SniperBehavior {
        state: SniperState::Windup,
        state_timer: Timer::from_seconds(0.6, TimerMode::Once),
        locked_dir: Vec2::X,
        suppressed: false,
    };
    suppress_ranged(&mut sniper_enemy, None, Some(&mut sniper), None);
    assert!(sniper.suppressed);
    assert_eq!(sniper.state, SniperState::Stalking);
}

#[test]
fn cast_errors_carry_readable_messages() {
    assert_eq!(
        BossCastError::UnknownBossWave(25).to_string(),
        "boss wave 25 has no phase machine"
    );
    assert_eq!(BossCastError::NoPlayer.to_string(), "no live player to aim the pattern at");
}
