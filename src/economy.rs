use bevy::prelude::*;
use rand::{seq::SliceRandom, Rng};

use crate::{
    audio::{PlaySoundEvent, SoundEffect},
    combat::KillEvent,
    components::{Health, MaxHealth},
    enemy::SizeTier,
    game::{AppState, GameState, SimSet},
    loadout::PlayerLoadout,
    player::Glowling,
    towers::spawn_tower,
    waves::is_boss_wave,
};

const DROP_Z: f32 = 0.3;
const DROP_CHANCE_SMALL: f64 = 0.45;
const GRAVITATE_RADIUS: f32 = 140.0;
const GRAVITATE_SPEED: f32 = 420.0;
const PICKUP_MARGIN: f32 = 10.0;
const OFFER_COUNT: usize = 3;

#[derive(Resource, Default)]
pub struct Materials(pub u32);

#[derive(Component)]
pub struct MaterialDrop {
    pub value: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeCard {
    WeaponDamage,
    FireRate,
    CritChance,
    CritDamage,
    Armor,
    Regen,
    FlatPierce,
    Aura,
    Speed,
    MaxHealthUp,
    OnKillHeal,
    Turret,
}

impl UpgradeCard {
    const ALL: [UpgradeCard; 12] = [
        UpgradeCard::WeaponDamage,
        UpgradeCard::FireRate,
        UpgradeCard::CritChance,
        UpgradeCard::CritDamage,
        UpgradeCard::Armor,
        UpgradeCard::Regen,
        UpgradeCard::FlatPierce,
        UpgradeCard::Aura,
        UpgradeCard::Speed,
        UpgradeCard::MaxHealthUp,
        UpgradeCard::OnKillHeal,
        UpgradeCard::Turret,
    ];

    pub fn label(self) -> &'static str {
        match self {
            UpgradeCard::WeaponDamage => "+20% weapon damage",
            UpgradeCard::FireRate => "-12% fire interval",
            UpgradeCard::CritChance => "+6% crit chance",
            UpgradeCard::CritDamage => "+25% crit damage",
            UpgradeCard::Armor => "+1 armor",
            UpgradeCard::Regen => "+0.8 HP/s regen",
            UpgradeCard::FlatPierce => "+1 pierce",
            UpgradeCard::Aura => "glow aura +3 dps, +25 radius",
            UpgradeCard::Speed => "+8% move speed",
            UpgradeCard::MaxHealthUp => "+20 max HP",
            UpgradeCard::OnKillHeal => "+1 HP on kill",
            UpgradeCard::Turret => "deploy a glow turret",
        }
    }

    pub fn cost(self, wave: u32) -> u32 {
        let base = match self {
            UpgradeCard::Armor | UpgradeCard::Regen | UpgradeCard::OnKillHeal => 6,
            UpgradeCard::Turret => 14,
            _ => 8,
        };
        base + wave / 2
    }

    pub fn apply(self, loadout: &mut PlayerLoadout) {
        match self {
            UpgradeCard::WeaponDamage => loadout.weapon_damage *= 1.2,
            UpgradeCard::FireRate => loadout.fire_interval_secs = (loadout.fire_interval_secs * 0.88).max(0.1),
            UpgradeCard::CritChance => loadout.crit_chance = (loadout.crit_chance + 0.06).min(0.8),
            UpgradeCard::CritDamage => loadout.crit_damage_mult += 0.25,
            UpgradeCard::Armor => loadout.armor += 1,
            UpgradeCard::Regen => loadout.regen_per_sec += 0.8,
            UpgradeCard::FlatPierce => loadout.flat_pierce += 1,
            UpgradeCard::Aura => {
                loadout.aura_dps += 3.0;
                loadout.aura_radius = (loadout.aura_radius + 25.0).max(120.0);
            }
            UpgradeCard::Speed => loadout.speed_boost *= 1.08,
            UpgradeCard::OnKillHeal => loadout.on_kill_heal += 1,
            // These touch entities, not just the loadout; the purchase
            // system finishes them.
            UpgradeCard::MaxHealthUp | UpgradeCard::Turret => {}
        }
    }
}

/// The three cards on offer this intermission; a bought slot empties.
#[derive(Resource, Default)]
pub struct ShopOffers(pub Vec<Option<UpgradeCard>>);

#[derive(Component)]
struct ShopUi;

pub struct EconomyPlugin;

impl Plugin for EconomyPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Materials>()
            .init_resource::<ShopOffers>()
            .add_systems(
                Update,
                (drop_on_kill_system, pickup_system)
                    .chain()
                    .in_set(SimSet::Pickups)
                    .run_if(in_state(AppState::InGame)),
            )
            .add_systems(OnEnter(AppState::Intermission), (roll_offers, spawn_shop_ui).chain())
            .add_systems(
                Update,
                (purchase_system, pre_boss_heal_system).run_if(in_state(AppState::Intermission)),
            )
            .add_systems(OnExit(AppState::Intermission), despawn_shop_ui);
    }
}

pub fn drop_value(size: SizeTier, boss: bool, wave: u32) -> u32 {
    if boss {
        return 15 + wave / 2;
    }
    let base = match size {
        SizeTier::Small => 1,
        SizeTier::Big => 3,
    };
    base + wave / 8
}

fn drop_on_kill_system(
    mut commands: Commands,
    game_state: Res<GameState>,
    mut kill_events: EventReader<KillEvent>,
) {
    let mut rng = rand::thread_rng();
    for kill in kill_events.read() {
        if !kill.by_player {
            continue;
        }
        if !kill.boss && kill.size == SizeTier::Small && !rng.gen_bool(DROP_CHANCE_SMALL) {
            continue;
        }
        let value = drop_value(kill.size, kill.boss, game_state.wave);
        commands.spawn((
            SpriteBundle {
                sprite: Sprite {
                    custom_size: Some(Vec2::splat(10.0)),
                    color: Color::rgb(0.6, 1.0, 0.8),
                    ..default()
                },
                transform: Transform::from_translation(kill.position.extend(DROP_Z)),
                ..default()
            },
            MaterialDrop { value },
            Name::new("MaterialDrop"),
        ));
    }
}

fn pickup_system(
    mut commands: Commands,
    time: Res<Time>,
    mut materials: ResMut<Materials>,
    player_query: Query<(&Transform, &Glowling)>,
    mut drop_query: Query<(Entity, &mut Transform, &MaterialDrop), Without<Glowling>>,
    mut sound_events: EventWriter<PlaySoundEvent>,
) {
    let Ok((player_transform, glowling)) = player_query.get_single() else { return };
    let player_pos = player_transform.translation.truncate();
    let dt = time.delta_seconds().min(0.066);

    for (entity, mut transform, drop) in drop_query.iter_mut() {
        let pos = transform.translation.truncate();
        let distance = pos.distance(player_pos);
        if distance <= glowling.radius() + PICKUP_MARGIN {
            materials.0 += drop.value;
            commands.entity(entity).despawn_recursive();
            sound_events.send(PlaySoundEvent(SoundEffect::Pickup));
            continue;
        }
        if distance <= GRAVITATE_RADIUS {
            let pull = (player_pos - pos).normalize_or_zero() * GRAVITATE_SPEED * dt;
            transform.translation += pull.extend(0.0);
        }
    }
}

fn roll_offers(mut offers: ResMut<ShopOffers>) {
    let mut rng = rand::thread_rng();
    let picks: Vec<Option<UpgradeCard>> = UpgradeCard::ALL
        .choose_multiple(&mut rng, OFFER_COUNT)
        .map(|card| Some(*card))
        .collect();
    offers.0 = picks;
}

fn spawn_shop_ui(mut commands: Commands, offers: Res<ShopOffers>, game_state: Res<GameState>) {
    let mut lines = String::new();
    for (i, slot) in offers.0.iter().enumerate() {
        if let Some(card) = slot {
            lines.push_str(&format!("[{}] {} ({} mats)\n", i + 1, card.label(), card.cost(game_state.wave)));
        }
    }
    commands.spawn((
        TextBundle::from_section(
            lines,
            TextStyle { font_size: 24.0, color: Color::rgb(0.7, 1.0, 0.85), ..default() },
        )
        .with_style(Style {
            position_type: PositionType::Absolute,
            left: Val::Percent(28.0),
            top: Val::Percent(42.0),
            ..default()
        }),
        ShopUi,
    ));
}

fn despawn_shop_ui(mut commands: Commands, query: Query<Entity, With<ShopUi>>) {
    for entity in query.iter() {
        commands.entity(entity).despawn_recursive();
    }
}

fn purchase_system(
    mut commands: Commands,
    keyboard_input: Res<ButtonInput<KeyCode>>,
    game_state: Res<GameState>,
    mut materials: ResMut<Materials>,
    mut offers: ResMut<ShopOffers>,
    mut loadout: ResMut<PlayerLoadout>,
    mut player_query: Query<(&Transform, &mut Health, &mut MaxHealth), With<Glowling>>,
    mut sound_events: EventWriter<PlaySoundEvent>,
) {
    let slot = if keyboard_input.just_pressed(KeyCode::Digit1) {
        0
    } else if keyboard_input.just_pressed(KeyCode::Digit2) {
        1
    } else if keyboard_input.just_pressed(KeyCode::Digit3) {
        2
    } else {
        return;
    };
    let Some(Some(card)) = offers.0.get(slot).copied() else { return };
    let cost = card.cost(game_state.wave);
    if materials.0 < cost {
        debug!("cannot afford {:?}: {} < {}", card, materials.0, cost);
        return;
    }
    materials.0 -= cost;
    card.apply(&mut loadout);
    match card {
        UpgradeCard::MaxHealthUp => {
            if let Ok((_, mut health, mut max_health)) = player_query.get_single_mut() {
                max_health.0 += 20;
                health.0 += 20;
            }
        }
        UpgradeCard::Turret => {
            if let Ok((transform, _, _)) = player_query.get_single_mut() {
                spawn_tower(&mut commands, transform.translation.truncate(), &loadout);
            }
        }
        _ => {}
    }
    offers.0[slot] = None;
    sound_events.send(PlaySoundEvent(SoundEffect::Purchase));
    info!("bought {:?} for {} materials", card, cost);
}

/// Before a boss wave the whole stash can be traded for a full heal.
fn pre_boss_heal_system(
    keyboard_input: Res<ButtonInput<KeyCode>>,
    game_state: Res<GameState>,
    mut materials: ResMut<Materials>,
    mut player_query: Query<(&mut Health, &MaxHealth), With<Glowling>>,
    mut sound_events: EventWriter<PlaySoundEvent>,
) {
    if !keyboard_input.just_pressed(KeyCode::KeyH) || !is_boss_wave(game_state.wave + 1) {
        return;
    }
    if materials.0 == 0 {
        return;
    }
    let Ok((mut health, max_health)) = player_query.get_single_mut() else { return };
    if health.0 >= max_health.0 {
        return;
    }
    materials.0 = 0;
    health.0 = max_health.0;
    sound_events.send(PlaySoundEvent(SoundEffect::Purchase));
    info!("pre-boss full heal purchased");
}
