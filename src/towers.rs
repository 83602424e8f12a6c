use bevy::prelude::*;
use rand::Rng;

use crate::{
    boss::Boss,
    enemy::Enemy,
    game::{AppState, SimSet},
    loadout::PlayerLoadout,
    projectiles::spawn_player_projectile,
};

const TOWER_Z: f32 = 0.4;
const TOWER_SIZE: f32 = 30.0;
const TOWER_RANGE: f32 = 380.0;
const TOWER_FIRE_INTERVAL_SECS: f32 = 1.1;
const TOWER_PROJECTILE_SPEED: f32 = 520.0;
/// Turrets hit at a fraction of the weapon's punch at purchase time.
pub const TOWER_DAMAGE_SHARE: f32 = 0.6;

#[derive(Component)]
pub struct Tower {
    pub damage: i32,
    pub range: f32,
    pub fire_timer: Timer,
}

pub fn spawn_tower(commands: &mut Commands, position: Vec2, loadout: &PlayerLoadout) -> Entity {
    let damage = (loadout.weapon_damage * TOWER_DAMAGE_SHARE).ceil() as i32;
    commands
        .spawn((
            SpriteBundle {
                sprite: Sprite {
                    custom_size: Some(Vec2::splat(TOWER_SIZE)),
                    color: Color::rgb(0.55, 0.9, 1.0),
                    ..default()
                },
                transform: Transform::from_translation(position.extend(TOWER_Z)),
                ..default()
            },
            Tower {
                damage,
                range: TOWER_RANGE,
                fire_timer: Timer::from_seconds(TOWER_FIRE_INTERVAL_SECS, TimerMode::Repeating),
            },
            Name::new("GlowTurret"),
        ))
        .id()
}

pub struct TowersPlugin;

impl Plugin for TowersPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            tower_attack_system
                .in_set(SimSet::PlayerAttack)
                .run_if(in_state(AppState::InGame)),
        )
        .add_systems(OnEnter(AppState::MainMenu), despawn_towers);
    }
}

fn despawn_towers(mut commands: Commands, query: Query<Entity, With<Tower>>) {
    for entity in query.iter() {
        commands.entity(entity).despawn_recursive();
    }
}

/// Fires at the nearest target in range; bosses count as targets too.
fn tower_attack_system(
    mut commands: Commands,
    time: Res<Time>,
    mut tower_query: Query<(Entity, &Transform, &mut Tower)>,
    enemy_query: Query<&Transform, (With<Enemy>, Without<Tower>)>,
    boss_query: Query<&Transform, (With<Boss>, Without<Tower>)>,
) {
    let mut rng = rand::thread_rng();
    for (tower_entity, transform, mut tower) in tower_query.iter_mut() {
        tower.fire_timer.tick(time.delta());
        if !tower.fire_timer.just_finished() {
            continue;
        }
        let pos = transform.translation.truncate();
        let nearest = enemy_query
            .iter()
            .chain(boss_query.iter())
            .map(|t| t.translation.truncate())
            .filter(|p| p.distance(pos) <= tower.range)
            .min_by(|a, b| {
                a.distance_squared(pos)
                    .partial_cmp(&b.distance_squared(pos))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        let Some(target) = nearest else { continue };
        let dir = (target - pos).normalize_or_zero();
        if dir == Vec2::ZERO {
            continue;
        }
        let jitter = Vec2::from_angle(rng.gen_range(-0.04..0.04)).rotate(dir);
        spawn_player_projectile(
            &mut commands,
            tower_entity,
            pos,
            jitter * TOWER_PROJECTILE_SPEED,
            tower.damage,
            0,
            None,
        );
    }
}
