use bevy::prelude::*;
use rand::Rng;

use crate::{
    audio::{PlaySoundEvent, SoundEffect},
    boss::Boss,
    camera_systems::CameraShakeEvent,
    components::{Burning, Health, HitFlash, Hitstop, Knockback, MaxHealth, Slowed},
    enemy::{BerserkerBehavior, Enemy, EnemyRole, MutantBehavior, MutantBuff, SizeTier},
    game::{AppState, GameState, SimSet},
    loadout::PlayerLoadout,
    player::{Glowling, REVIVE_NO_LETHAL_SECS},
    projectiles::{Faction, Projectile, ENEMY_PROJECTILE_RADIUS, PLAYER_PROJECTILE_RADIUS},
    visual_effects::DamageTextEvent,
};

pub const MIN_STAGGER_SCALE: f32 = 0.15;
const KNOCKBACK_IMPULSE: f32 = 160.0;
const HITSTOP_SECS: f32 = 0.09;
const HITSTOP_FACTOR: f32 = 0.15;
const HIT_FLASH_SECS: f32 = 0.08;

const BERSERKER_RAGE_SECS: f32 = 3.0;
const OVERCHARGED_SPLASH_RADIUS: f32 = 110.0;
const OVERCHARGED_SPLASH_DAMAGE: i32 = 14;
const JUGGERNAUT_SLOW_FACTOR: f32 = 0.55;
const JUGGERNAUT_SLOW_SECS: f32 = 1.2;
const JUGGERNAUT_PLAYER_KNOCK: f32 = 240.0;
const MUTANT_ARMOR_REDUCTION: f32 = 0.5;

const KILL_SCORE_SMALL: u32 = 10;
const KILL_SCORE_BIG: u32 = 25;
const KILL_SCORE_BOSS: u32 = 500;
const COMBO_WINDOW_SECS: f32 = 3.0;

/// Damage routed at the player. Applied in one place so armor, the
/// invulnerability windows, and the revive grace are all honored uniformly.
#[derive(Event)]
pub struct PlayerDamageEvent {
    pub damage: i32,
    /// Hazard contact and area pulses accumulate fractional damage and hand
    /// it over as whole points several times a second; flat armor with its
    /// floor of 1 would flatten every such tick to the same value, so those
    /// continuous sources skip the armor step by contract. Direct hits
    /// (bullets, melee swings) always pass through armor.
    pub bypass_armor: bool,
}

/// Centered AoE aimed at the player (bloodmage pulse, overcharged splash).
#[derive(Event)]
pub struct AreaPulseEvent {
    pub center: Vec2,
    pub radius: f32,
    pub damage: i32,
}

/// Emitted exactly once per enemy/boss death, after despawn is queued.
#[derive(Event)]
pub struct KillEvent {
    pub position: Vec2,
    pub size: SizeTier,
    pub boss: bool,
    pub by_player: bool,
}

// --- Pure resolution helpers ---

/// Crit roll: crits add `crit_damage_mult` of the base on top.
pub fn roll_crit(damage: i32, crit_chance: f32, crit_damage_mult: f32, rng: &mut impl Rng) -> (i32, bool) {
    if crit_chance > 0.0 && rng.gen_bool(f64::from(crit_chance.min(1.0))) {
        let boosted = (damage as f32 * (1.0 + crit_damage_mult)).round() as i32;
        (boosted, true)
    } else {
        (damage, false)
    }
}

/// Armor subtracts flat damage but a connecting hit always deals at least 1.
pub fn apply_armor(damage: i32, armor: i32) -> i32 {
    (damage - armor).max(1)
}

/// During the revive grace no single hit may kill: damage is clamped so at
/// least 1 HP survives. Outside the grace the damage passes through.
pub fn clamp_no_lethal(damage: i32, health: i32, grace_active: bool) -> i32 {
    if grace_active {
        damage.min((health - 1).max(0))
    } else {
        damage
    }
}

/// Knockback/hitstop scale: resist shrinks it but never erases it.
pub fn stagger_scale(resist: f32) -> f32 {
    (1.0 - resist).max(MIN_STAGGER_SCALE)
}

/// Heals never push hp past max. Used by lifesteal and on-kill heal.
pub fn apply_heal(health: i32, max_health: i32, heal: i32) -> i32 {
    (health + heal).min(max_health)
}

/// On-hit rider a melee role adds on top of its contact damage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactEffect {
    None,
    /// Small splash around the attacker. It rides the per-enemy swing clock,
    /// so it cannot stack with itself.
    Splash { radius: f32, damage: i32 },
    /// The attacker heals for half the damage it dealt.
    Lifesteal { heal: i32 },
    Shove { impulse: f32, slow_factor: f32, slow_secs: f32 },
    /// The attacker gains its speed buff on landing the hit.
    Rage { secs: f32 },
}

pub fn contact_effect(role: EnemyRole, contact_damage: i32) -> ContactEffect {
    match role {
        EnemyRole::Overcharged => ContactEffect::Splash {
            radius: OVERCHARGED_SPLASH_RADIUS,
            damage: OVERCHARGED_SPLASH_DAMAGE,
        },
        EnemyRole::Parasite => ContactEffect::Lifesteal { heal: contact_damage / 2 },
        EnemyRole::Juggernaut => ContactEffect::Shove {
            impulse: JUGGERNAUT_PLAYER_KNOCK,
            slow_factor: JUGGERNAUT_SLOW_FACTOR,
            slow_secs: JUGGERNAUT_SLOW_SECS,
        },
        EnemyRole::Berserker => ContactEffect::Rage { secs: BERSERKER_RAGE_SECS },
        _ => ContactEffect::None,
    }
}

pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PlayerDamageEvent>()
            .add_event::<AreaPulseEvent>()
            .add_event::<KillEvent>()
            .add_systems(
                Update,
                (
                    player_projectile_hit_system,
                    enemy_projectile_hit_system,
                    melee_contact_system,
                    area_pulse_system,
                    burning_tick_system,
                    aura_damage_system,
                    player_damage_apply_system,
                )
                    .chain()
                    .in_set(SimSet::Combat)
                    .run_if(in_state(AppState::InGame)),
            )
            .add_systems(
                Update,
                death_system
                    .in_set(SimSet::Cleanup)
                    .run_if(in_state(AppState::InGame)),
            );
    }
}

/// Player bolts vs enemies and bosses. Pierce is resolved per target: flat
/// pierce charges first, then a fresh pierce-chance roll; each entity can be
/// struck at most once per projectile.
fn player_projectile_hit_system(
    mut commands: Commands,
    loadout: Res<PlayerLoadout>,
    mut projectile_query: Query<(Entity, &Transform, &mut Projectile)>,
    mut enemy_query: Query<
        (
            Entity,
            &Transform,
            &mut Enemy,
            &mut Health,
            &mut Knockback,
            &Sprite,
            Option<&MutantBehavior>,
        ),
        Without<Boss>,
    >,
    mut boss_query: Query<(Entity, &Transform, &mut Health, &Sprite), (With<Boss>, Without<Enemy>)>,
    mut text_events: EventWriter<DamageTextEvent>,
    mut sound_events: EventWriter<PlaySoundEvent>,
) {
    let mut rng = rand::thread_rng();

    for (proj_entity, proj_transform, mut projectile) in projectile_query.iter_mut() {
        if projectile.faction != Faction::Player {
            continue;
        }
        let proj_pos = proj_transform.translation.truncate();
        let mut spent = false;

        for (enemy_entity, transform, mut enemy, mut health, mut knockback, sprite, mutant) in
            enemy_query.iter_mut()
        {
            if spent || health.0 <= 0 || projectile.already_hit.contains(&enemy_entity) {
                continue;
            }
            let pos = transform.translation.truncate();
            if pos.distance(proj_pos) > enemy.radius + PLAYER_PROJECTILE_RADIUS {
                continue;
            }

            let (mut damage, crit) =
                roll_crit(projectile.damage, loadout.crit_chance, loadout.crit_damage_mult, &mut rng);
            if matches!(mutant.and_then(|m| m.active), Some(MutantBuff::Armor)) {
                damage = ((damage as f32 * MUTANT_ARMOR_REDUCTION).round() as i32).max(1);
            }
            health.0 -= damage;
            enemy.hurt_by_player = true;

            let scale = stagger_scale(enemy.stagger_resist);
            let dir = (pos - proj_pos).normalize_or_zero();
            knockback.0 += dir * KNOCKBACK_IMPULSE * scale;
            commands.entity(enemy_entity).insert(Hitstop {
                factor: HITSTOP_FACTOR,
                remaining_secs: HITSTOP_SECS * scale,
            });
            commands.entity(enemy_entity).insert(HitFlash {
                timer: Timer::from_seconds(HIT_FLASH_SECS, TimerMode::Once),
                base_color: sprite.color,
            });
            if let Some(burn) = projectile.burn {
                commands.entity(enemy_entity).insert(Burning {
                    dps: burn.dps,
                    remaining_secs: burn.duration_secs,
                    carry: 0.0,
                });
            }
            text_events.send(DamageTextEvent { position: pos, amount: damage, crit });
            sound_events.send(PlaySoundEvent(SoundEffect::EnemyHit));

            projectile.already_hit.push(enemy_entity);
            spent = !consume_pierce(&mut projectile, loadout.pierce_chance, &mut rng);
        }

        // Bosses never stagger; the hit is pure damage.
        for (boss_entity, transform, mut health, sprite) in boss_query.iter_mut() {
            if spent || health.0 <= 0 || projectile.already_hit.contains(&boss_entity) {
                continue;
            }
            let pos = transform.translation.truncate();
            if pos.distance(proj_pos) > crate::boss::BOSS_RADIUS + PLAYER_PROJECTILE_RADIUS {
                continue;
            }
            let (damage, crit) =
                roll_crit(projectile.damage, loadout.crit_chance, loadout.crit_damage_mult, &mut rng);
            health.0 -= damage;
            commands.entity(boss_entity).insert(HitFlash {
                timer: Timer::from_seconds(HIT_FLASH_SECS, TimerMode::Once),
                base_color: sprite.color,
            });
            text_events.send(DamageTextEvent { position: pos, amount: damage, crit });
            sound_events.send(PlaySoundEvent(SoundEffect::EnemyHit));
            projectile.already_hit.push(boss_entity);
            spent = !consume_pierce(&mut projectile, loadout.pierce_chance, &mut rng);
        }

        if spent {
            commands.entity(proj_entity).despawn_recursive();
        }
    }
}

/// Returns whether the projectile survives this hit.
pub fn consume_pierce(projectile: &mut Projectile, pierce_chance: f32, rng: &mut impl Rng) -> bool {
    if projectile.pierce_left > 0 {
        projectile.pierce_left -= 1;
        return true;
    }
    pierce_chance > 0.0 && rng.gen_bool(f64::from(pierce_chance.min(1.0)))
}

fn enemy_projectile_hit_system(
    mut commands: Commands,
    projectile_query: Query<(Entity, &Transform, &Projectile)>,
    player_query: Query<(&Transform, &Glowling)>,
    mut damage_events: EventWriter<PlayerDamageEvent>,
) {
    let Ok((player_transform, glowling)) = player_query.get_single() else { return };
    // Dodge i-frames and spawn protection let bullets pass through rather
    // than absorb them: nothing is consumed while a window is open.
    if glowling.is_invulnerable() {
        return;
    }
    let player_pos = player_transform.translation.truncate();

    for (entity, transform, projectile) in projectile_query.iter() {
        if projectile.faction != Faction::Enemy {
            continue;
        }
        let pos = transform.translation.truncate();
        if pos.distance(player_pos) > glowling.radius() + ENEMY_PROJECTILE_RADIUS {
            continue;
        }
        damage_events.send(PlayerDamageEvent { damage: projectile.damage, bypass_armor: false });
        commands.entity(entity).despawn_recursive();
    }
}

/// Melee contact, both directions of specials: rammers hurt the player on a
/// per-enemy swing clock, and some roles ride an extra effect on the hit.
fn melee_contact_system(
    mut commands: Commands,
    time: Res<Time>,
    player_query: Query<(Entity, &Transform, &Glowling)>,
    mut enemy_query: Query<(&Transform, &mut Enemy, &mut Health, &MaxHealth, Option<&mut BerserkerBehavior>)>,
    mut boss_query: Query<(&Transform, &mut Boss)>,
    mut damage_events: EventWriter<PlayerDamageEvent>,
    mut pulse_events: EventWriter<AreaPulseEvent>,
) {
    let Ok((player_entity, player_transform, glowling)) = player_query.get_single() else { return };
    let player_pos = player_transform.translation.truncate();
    let player_radius = glowling.radius();
    // Riders that feed on the damage dealt (lifesteal, rage) only apply when
    // the swing actually connects through the invulnerability windows.
    let landed = !glowling.is_invulnerable();

    for (transform, mut enemy, mut health, max_health, berserker) in enemy_query.iter_mut() {
        enemy.melee_timer.tick(time.delta());
        if health.0 <= 0 {
            continue;
        }
        let pos = transform.translation.truncate();
        if pos.distance(player_pos) > enemy.radius + player_radius {
            continue;
        }
        if !enemy.melee_timer.finished() {
            continue;
        }
        enemy.melee_timer.reset();

        match contact_effect(enemy.role, enemy.contact_damage) {
            ContactEffect::Splash { radius, damage } => {
                pulse_events.send(AreaPulseEvent { center: pos, radius, damage });
            }
            ContactEffect::Lifesteal { heal } => {
                if landed {
                    health.0 = apply_heal(health.0, max_health.0, heal);
                }
            }
            ContactEffect::Shove { impulse, slow_factor, slow_secs } => {
                let shove = (player_pos - pos).normalize_or_zero() * impulse;
                commands.entity(player_entity).insert((
                    Slowed { factor: slow_factor, remaining_secs: slow_secs },
                    crate::components::Knockback(shove),
                ));
            }
            ContactEffect::Rage { secs } => {
                if landed {
                    if let Some(mut rage) = berserker {
                        rage.rage_secs = secs;
                    }
                }
            }
            ContactEffect::None => {}
        }
        damage_events.send(PlayerDamageEvent { damage: enemy.contact_damage, bypass_armor: false });
    }

    for (transform, mut boss) in boss_query.iter_mut() {
        boss.melee_timer.tick(time.delta());
        let pos = transform.translation.truncate();
        if pos.distance(player_pos) > crate::boss::BOSS_RADIUS + player_radius {
            continue;
        }
        if boss.melee_timer.finished() {
            boss.melee_timer.reset();
            damage_events.send(PlayerDamageEvent { damage: boss.contact_damage, bypass_armor: false });
        }
    }
}

fn area_pulse_system(
    mut pulse_events: EventReader<AreaPulseEvent>,
    player_query: Query<(&Transform, &Glowling)>,
    mut damage_events: EventWriter<PlayerDamageEvent>,
) {
    let Ok((player_transform, glowling)) = player_query.get_single() else { return };
    let player_pos = player_transform.translation.truncate();
    for pulse in pulse_events.read() {
        if pulse.center.distance(player_pos) <= pulse.radius + glowling.radius() {
            damage_events.send(PlayerDamageEvent { damage: pulse.damage, bypass_armor: true });
        }
    }
}

/// Burn DoT with a fractional carry so low dps still lands whole points.
fn burning_tick_system(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut Burning, &mut Health, &mut Enemy)>,
) {
    let dt = time.delta_seconds();
    for (entity, mut burning, mut health, mut enemy) in query.iter_mut() {
        burning.remaining_secs -= dt;
        burning.carry += burning.dps * dt;
        let whole = burning.carry.floor() as i32;
        if whole > 0 {
            burning.carry -= whole as f32;
            health.0 -= whole;
            enemy.hurt_by_player = true;
        }
        if burning.remaining_secs <= 0.0 {
            commands.entity(entity).remove::<Burning>();
        }
    }
}

fn aura_damage_system(
    time: Res<Time>,
    loadout: Res<PlayerLoadout>,
    player_query: Query<&Transform, With<Glowling>>,
    mut enemy_query: Query<(&Transform, &mut Health, &mut Enemy)>,
    mut carry: Local<f32>,
) {
    if loadout.aura_dps <= 0.0 {
        return;
    }
    let Ok(player_transform) = player_query.get_single() else { return };
    let player_pos = player_transform.translation.truncate();

    *carry += loadout.aura_dps * time.delta_seconds();
    let whole = carry.floor() as i32;
    if whole == 0 {
        return;
    }
    *carry -= whole as f32;
    for (transform, mut health, mut enemy) in enemy_query.iter_mut() {
        if transform.translation.truncate().distance(player_pos) <= loadout.aura_radius {
            health.0 -= whole;
            enemy.hurt_by_player = true;
        }
    }
}

/// The single place player HP moves down. Order: invulnerability windows,
/// armor (floor 1), revive-grace clamp.
fn player_damage_apply_system(
    mut commands: Commands,
    loadout: Res<PlayerLoadout>,
    mut damage_events: EventReader<PlayerDamageEvent>,
    mut player_query: Query<(Entity, &Glowling, &mut Health, &Sprite)>,
    mut shake_events: EventWriter<CameraShakeEvent>,
    mut sound_events: EventWriter<PlaySoundEvent>,
) {
    let Ok((entity, glowling, mut health, sprite)) = player_query.get_single_mut() else { return };
    for event in damage_events.read() {
        if glowling.is_invulnerable() || health.0 <= 0 {
            continue;
        }
        let mut damage = event.damage;
        if !event.bypass_armor {
            damage = apply_armor(damage, loadout.armor);
        }
        damage = clamp_no_lethal(damage, health.0, glowling.no_lethal_secs > 0.0);
        if damage <= 0 {
            continue;
        }
        health.0 -= damage;
        commands.entity(entity).insert(HitFlash {
            timer: Timer::from_seconds(HIT_FLASH_SECS, TimerMode::Once),
            base_color: sprite.color,
        });
        shake_events.send(CameraShakeEvent { intensity: (damage as f32 / 10.0).clamp(2.0, 8.0) });
        sound_events.send(PlaySoundEvent(SoundEffect::PlayerHit));
    }
}

/// Death sweep: each dead entity despawns exactly once and emits exactly one
/// kill event. Player death consumes a life or ends the run.
fn death_system(
    mut commands: Commands,
    loadout: Res<PlayerLoadout>,
    mut game_state: ResMut<GameState>,
    enemy_query: Query<(Entity, &Transform, &Enemy, &Health)>,
    boss_query: Query<(Entity, &Transform, &Boss, &Health), Without<Enemy>>,
    mut player_query: Query<(&mut Glowling, &mut Health, &MaxHealth), (Without<Enemy>, Without<Boss>)>,
    mut kill_events: EventWriter<KillEvent>,
    mut next_state: ResMut<NextState<AppState>>,
    mut sound_events: EventWriter<PlaySoundEvent>,
) {
    for (entity, transform, enemy, health) in enemy_query.iter() {
        if health.0 > 0 {
            continue;
        }
        commands.entity(entity).despawn_recursive();
        let by_player = enemy.hurt_by_player;
        if by_player {
            game_state.register_kill(match enemy.size {
                SizeTier::Small => KILL_SCORE_SMALL,
                SizeTier::Big => KILL_SCORE_BIG,
            }, COMBO_WINDOW_SECS);
            if loadout.on_kill_heal > 0 {
                if let Ok((_, mut player_health, max_health)) = player_query.get_single_mut() {
                    player_health.0 = apply_heal(player_health.0, max_health.0, loadout.on_kill_heal);
                }
            }
        }
        kill_events.send(KillEvent {
            position: transform.translation.truncate(),
            size: enemy.size,
            boss: false,
            by_player,
        });
        sound_events.send(PlaySoundEvent(SoundEffect::EnemyDeath));
    }

    for (entity, transform, boss, health) in boss_query.iter() {
        if health.0 > 0 {
            continue;
        }
        info!("boss {:?} defeated", boss.kind);
        commands.entity(entity).despawn_recursive();
        game_state.register_kill(KILL_SCORE_BOSS, COMBO_WINDOW_SECS);
        kill_events.send(KillEvent {
            position: transform.translation.truncate(),
            size: SizeTier::Big,
            boss: true,
            by_player: true,
        });
        sound_events.send(PlaySoundEvent(SoundEffect::BossDeath));
    }

    if let Ok((mut glowling, mut health, max_health)) = player_query.get_single_mut() {
        if health.0 <= 0 {
            if glowling.lives > 0 {
                glowling.lives -= 1;
                health.0 = max_health.0;
                glowling.spawn_protection_secs = 1.5;
                glowling.no_lethal_secs = REVIVE_NO_LETHAL_SECS;
                info!("glowling revived, {} lives left", glowling.lives);
            } else {
                info!("run over at wave {} score {}", game_state.wave, game_state.score);
                sound_events.send(PlaySoundEvent(SoundEffect::GameOver));
                next_state.set(AppState::GameOver);
            }
        }
    }
}
