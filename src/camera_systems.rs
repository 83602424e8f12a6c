use bevy::prelude::*;
use rand::Rng;

use crate::game::AppState;
use crate::player::Glowling;

const CAMERA_LERP_FACTOR: f32 = 0.05;
const SHAKE_DECAY_PER_SEC: f32 = 14.0;

#[derive(Component)]
pub struct MainCamera;

#[derive(Event)]
pub struct CameraShakeEvent {
    pub intensity: f32,
}

#[derive(Resource, Default)]
struct ShakeState {
    trauma: f32,
}

pub struct CameraSystemsPlugin;

impl Plugin for CameraSystemsPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<CameraShakeEvent>()
            .init_resource::<ShakeState>()
            .add_systems(
                Update,
                (soft_camera_follow_system, camera_shake_system)
                    .chain()
                    .run_if(in_state(AppState::InGame)),
            );
    }
}

fn soft_camera_follow_system(
    player_query: Query<&Transform, (With<Glowling>, Without<MainCamera>)>,
    mut camera_query: Query<&mut Transform, (With<MainCamera>, Without<Glowling>)>,
) {
    if let Ok(player_transform) = player_query.get_single() {
        if let Ok(mut camera_transform) = camera_query.get_single_mut() {
            let target = player_transform.translation.truncate().extend(camera_transform.translation.z);
            camera_transform.translation = camera_transform.translation.lerp(target, CAMERA_LERP_FACTOR);
        }
    }
}

/// Additive jitter on top of the follow, decaying every frame.
fn camera_shake_system(
    time: Res<Time>,
    mut shake_events: EventReader<CameraShakeEvent>,
    mut state: ResMut<ShakeState>,
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
) {
    for event in shake_events.read() {
        state.trauma = (state.trauma + event.intensity).min(12.0);
    }
    if state.trauma <= 0.0 {
        return;
    }
    state.trauma = (state.trauma - SHAKE_DECAY_PER_SEC * time.delta_seconds()).max(0.0);
    let Ok(mut camera_transform) = camera_query.get_single_mut() else { return };
    let mut rng = rand::thread_rng();
    camera_transform.translation.x += rng.gen_range(-1.0..1.0) * state.trauma;
    camera_transform.translation.y += rng.gen_range(-1.0..1.0) * state.trauma;
}
