use bevy::prelude::*;
use rand::random;

use crate::{components::HitFlash, game::AppState};

const DAMAGE_TEXT_LIFETIME_SECONDS: f32 = 0.75;
const DAMAGE_TEXT_SPEED: f32 = 60.0;
const FLASH_COLOR: Color = Color::WHITE;

/// Floating combat number request; crits render bigger and hotter.
#[derive(Event)]
pub struct DamageTextEvent {
    pub position: Vec2,
    pub amount: i32,
    pub crit: bool,
}

pub struct VisualEffectsPlugin;

impl Plugin for VisualEffectsPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<DamageTextEvent>().add_systems(
            Update,
            (spawn_damage_text_system, animate_damage_text_system, hit_flash_system)
                .run_if(in_state(AppState::InGame)),
        );
    }
}

#[derive(Component)]
pub struct DamageTextEffect {
    pub spawn_time: f32,
    pub velocity: Vec2,
}

fn spawn_damage_text_system(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    time: Res<Time>,
    mut text_events: EventReader<DamageTextEvent>,
) {
    for event in text_events.read() {
        let random_offset_x = (random::<f32>() - 0.5) * 20.0;
        let (font_size, color) = if event.crit {
            (28.0, Color::rgb(1.0, 0.9, 0.3))
        } else {
            (20.0, Color::rgb(1.0, 0.8, 0.8))
        };
        commands.spawn((
            Text2dBundle {
                text: Text::from_section(
                    event.amount.to_string(),
                    TextStyle {
                        font: asset_server.load("fonts/FiraSans-Bold.ttf"),
                        font_size,
                        color,
                    },
                ),
                transform: Transform::from_translation(
                    event.position.extend(5.0) + Vec3::new(random_offset_x, 10.0, 0.0),
                ),
                ..default()
            },
            DamageTextEffect {
                spawn_time: time.elapsed_seconds(),
                velocity: Vec2::new(random_offset_x * 0.5, DAMAGE_TEXT_SPEED),
            },
            Name::new("DamageText"),
        ));
    }
}

fn animate_damage_text_system(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &DamageTextEffect, &mut Transform, &mut Text)>,
) {
    let current_time = time.elapsed_seconds();
    for (entity, effect_data, mut transform, mut text_component) in query.iter_mut() {
        let time_alive = current_time - effect_data.spawn_time;
        if time_alive > DAMAGE_TEXT_LIFETIME_SECONDS {
            commands.entity(entity).despawn_recursive();
            continue;
        }
        transform.translation.y += effect_data.velocity.y * time.delta_seconds();
        transform.translation.x += effect_data.velocity.x * time.delta_seconds();

        if let Some(section) = text_component.sections.get_mut(0) {
            let alpha_progress = (time_alive / DAMAGE_TEXT_LIFETIME_SECONDS).powf(2.0);
            section.style.color.set_a((1.0 - alpha_progress).max(0.0));
        }
    }
}

/// White flash on anything freshly hit, restoring the stored base color.
fn hit_flash_system(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut HitFlash, &mut Sprite)>,
) {
    for (entity, mut flash, mut sprite) in query.iter_mut() {
        flash.timer.tick(time.delta());
        if flash.timer.finished() {
            sprite.color = flash.base_color;
            commands.entity(entity).remove::<HitFlash>();
        } else {
            sprite.color = FLASH_COLOR;
        }
    }
}
