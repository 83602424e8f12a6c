use bevy::prelude::*;

use glowlings::audio::GameAudioPlugin;
use glowlings::boss::BossPlugin;
use glowlings::camera_systems::{CameraSystemsPlugin, MainCamera};
use glowlings::combat::CombatPlugin;
use glowlings::economy::EconomyPlugin;
use glowlings::enemy::EnemyPlugin;
use glowlings::game::GamePlugin;
use glowlings::hazards::HazardsPlugin;
use glowlings::player::PlayerPlugin;
use glowlings::projectiles::ProjectilesPlugin;
use glowlings::spawning::SpawningPlugin;
use glowlings::towers::TowersPlugin;
use glowlings::visual_effects::VisualEffectsPlugin;

const SCREEN_WIDTH: f32 = 1280.0;
const SCREEN_HEIGHT: f32 = 720.0;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Glowlings".into(),
                resolution: (SCREEN_WIDTH, SCREEN_HEIGHT).into(),
                resizable: false,
                ..default()
            }),
            ..default()
        }))
        .add_plugins((
            GamePlugin,
            PlayerPlugin,
            EnemyPlugin,
            SpawningPlugin,
            BossPlugin,
            HazardsPlugin,
            ProjectilesPlugin,
            CombatPlugin,
            EconomyPlugin,
            TowersPlugin,
            VisualEffectsPlugin,
            GameAudioPlugin,
            CameraSystemsPlugin,
        ))
        .add_systems(Startup, setup_global_camera)
        .run();
}

fn setup_global_camera(mut commands: Commands) {
    let mut camera_bundle = Camera2dBundle::default();
    camera_bundle.transform.translation.z = 999.0;
    commands.spawn((camera_bundle, MainCamera));
}
