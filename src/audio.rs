use bevy::prelude::*;

#[derive(Event)]
pub struct PlaySoundEvent(pub SoundEffect);

#[derive(Debug, Clone, Copy)]
pub enum SoundEffect {
    PlayerShot,
    PlayerHit,
    Dodge,
    EnemyHit,
    EnemyDeath,
    Pickup,
    Purchase,
    WaveStart,
    BossArrival,
    BossPattern,
    BossDeath,
    GameOver,
}

pub struct GameAudioPlugin;

impl Plugin for GameAudioPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PlaySoundEvent>()
            .add_systems(Update, play_sound_system);
    }
}

fn play_sound_system(
    mut sound_events: EventReader<PlaySoundEvent>,
    mut commands: Commands,
    asset_server: Res<AssetServer>,
) {
    for event in sound_events.read() {
        let sound_effect = match event.0 {
            SoundEffect::PlayerShot => "audio/player_shot_placeholder.ogg",
            SoundEffect::PlayerHit => "audio/player_hit_placeholder.ogg",
            SoundEffect::Dodge => "audio/dodge_placeholder.ogg",
            SoundEffect::EnemyHit => "audio/enemy_hit_placeholder.ogg",
            SoundEffect::EnemyDeath => "audio/enemy_death_placeholder.ogg",
            SoundEffect::Pickup => "audio/pickup_placeholder.ogg",
            SoundEffect::Purchase => "audio/purchase_placeholder.ogg",
            SoundEffect::WaveStart => "audio/wave_start_placeholder.ogg",
            SoundEffect::BossArrival => "audio/boss_arrival_placeholder.ogg",
            SoundEffect::BossPattern => "audio/boss_pattern_placeholder.ogg",
            SoundEffect::BossDeath => "audio/boss_death_placeholder.ogg",
            SoundEffect::GameOver => "audio/game_over_placeholder.ogg",
        };
        commands.spawn(AudioBundle {
            source: asset_server.load(sound_effect),
            settings: PlaybackSettings::DESPAWN,
        });
    }
}
