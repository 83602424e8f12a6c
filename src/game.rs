use bevy::prelude::*;

use crate::{
    audio::{PlaySoundEvent, SoundEffect},
    boss::Boss,
    components::Health,
    economy::{MaterialDrop, Materials},
    enemy::Enemy,
    hazards::Hazard,
    loadout::PlayerLoadout,
    player::{ChosenElement, Element, Glowling, INITIAL_LIVES},
    projectiles::Projectile,
    spawning::SpawnDirector,
    waves::{is_boss_wave, wave_duration_secs, WaveRuntime},
};

pub const ARENA_HALF_WIDTH: f32 = 1200.0;
pub const ARENA_HALF_HEIGHT: f32 = 800.0;

#[derive(States, Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub enum AppState {
    #[default]
    MainMenu,
    InGame,
    Intermission,
    GameOver,
}

/// Fixed per-tick ordering of the whole simulation. Every gameplay system
/// hangs off one of these sets; the chain below is the only ordering rule.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    Abilities,
    Spawning,
    Boss,
    Ai,
    Separation,
    PlayerAttack,
    ProjectileMove,
    Combat,
    Cleanup,
    Pickups,
    Ui,
}

#[derive(Resource, Debug)]
pub struct GameState {
    pub wave: u32,
    pub wave_time_left: f32,
    pub wave_active: bool,
    pub score: u32,
    pub combo: u32,
    pub combo_secs: f32,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            wave: 1,
            wave_time_left: 0.0,
            wave_active: false,
            score: 0,
            combo: 0,
            combo_secs: 0.0,
        }
    }
}

impl GameState {
    /// Score scales gently with the rolling combo; the window refreshes on
    /// every credited kill.
    pub fn register_kill(&mut self, base: u32, window_secs: f32) {
        self.combo += 1;
        self.combo_secs = window_secs;
        self.score += base * (10 + self.combo.min(50)) / 10;
    }
}

pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<AppState>()
            .init_resource::<GameState>()
            .init_resource::<PlayerLoadout>()
            .init_resource::<WaveRuntime>()
            .configure_sets(
                Update,
                (
                    SimSet::Abilities,
                    SimSet::Spawning,
                    SimSet::Boss,
                    SimSet::Ai,
                    SimSet::Separation,
                    SimSet::PlayerAttack,
                    SimSet::ProjectileMove,
                    SimSet::Combat,
                    SimSet::Cleanup,
                    SimSet::Pickups,
                    SimSet::Ui,
                )
                    .chain(),
            )
            .add_systems(OnEnter(AppState::MainMenu), (reset_run, spawn_menu_ui))
            .add_systems(Update, main_menu_system.run_if(in_state(AppState::MainMenu)))
            .add_systems(OnExit(AppState::MainMenu), despawn_screen::<MenuUi>)
            .add_systems(OnEnter(AppState::InGame), begin_wave)
            .add_systems(
                Update,
                (wave_clock_system, wave_end_system)
                    .chain()
                    .in_set(SimSet::Ui)
                    .run_if(in_state(AppState::InGame)),
            )
            .add_systems(OnEnter(AppState::Intermission), (clear_battlefield, spawn_intermission_ui))
            .add_systems(Update, intermission_continue_system.run_if(in_state(AppState::Intermission)))
            .add_systems(OnExit(AppState::Intermission), despawn_screen::<IntermissionUi>)
            .add_systems(OnEnter(AppState::GameOver), (clear_battlefield, spawn_game_over_ui))
            .add_systems(Update, game_over_system.run_if(in_state(AppState::GameOver)))
            .add_systems(OnExit(AppState::GameOver), despawn_screen::<GameOverUi>)
            .add_systems(Startup, spawn_hud)
            .add_systems(Update, hud_system.in_set(SimSet::Ui));
    }
}

#[derive(Component)]
struct MenuUi;

#[derive(Component)]
struct IntermissionUi;

#[derive(Component)]
struct GameOverUi;

#[derive(Component)]
struct HudText;

fn despawn_screen<T: Component>(mut commands: Commands, query: Query<Entity, With<T>>) {
    for entity in query.iter() {
        commands.entity(entity).despawn_recursive();
    }
}

fn reset_run(
    mut commands: Commands,
    mut game_state: ResMut<GameState>,
    mut loadout: ResMut<PlayerLoadout>,
    mut materials: ResMut<Materials>,
    mut director: ResMut<SpawnDirector>,
    player_query: Query<Entity, With<Glowling>>,
) {
    *game_state = GameState::default();
    *loadout = PlayerLoadout::default();
    materials.0 = 0;
    director.reset();
    for entity in player_query.iter() {
        commands.entity(entity).despawn_recursive();
    }
}

fn spawn_menu_ui(mut commands: Commands) {
    commands.spawn((
        TextBundle::from_section(
            "GLOWLINGS\n\n[1] Fire   [2] Water   [3] Air\n\nEnter to begin",
            TextStyle { font_size: 42.0, color: Color::WHITE, ..default() },
        )
        .with_style(Style {
            position_type: PositionType::Absolute,
            left: Val::Percent(32.0),
            top: Val::Percent(30.0),
            ..default()
        }),
        MenuUi,
    ));
}

fn main_menu_system(
    keyboard_input: Res<ButtonInput<KeyCode>>,
    mut element: ResMut<ChosenElement>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if keyboard_input.just_pressed(KeyCode::Digit1) {
        element.0 = Element::Fire;
    }
    if keyboard_input.just_pressed(KeyCode::Digit2) {
        element.0 = Element::Water;
    }
    if keyboard_input.just_pressed(KeyCode::Digit3) {
        element.0 = Element::Air;
    }
    if keyboard_input.just_pressed(KeyCode::Enter) {
        next_state.set(AppState::InGame);
    }
}

fn begin_wave(
    mut game_state: ResMut<GameState>,
    mut runtime: ResMut<WaveRuntime>,
    mut director: ResMut<SpawnDirector>,
    mut sound_events: EventWriter<PlaySoundEvent>,
) {
    let wave = game_state.wave;
    let mut rng = rand::thread_rng();
    game_state.wave_time_left = wave_duration_secs(wave, &mut rng);
    game_state.wave_active = true;
    *runtime = WaveRuntime::start_wave(wave, &mut rng);
    director.reset();
    sound_events.send(PlaySoundEvent(SoundEffect::WaveStart));
    info!(
        "wave {} begins: {:.0}s, budget {}, cap {}",
        wave, game_state.wave_time_left, runtime.budget_remaining, runtime.desired_cap
    );
}

fn wave_clock_system(time: Res<Time>, mut game_state: ResMut<GameState>) {
    if game_state.wave_active && !is_boss_wave(game_state.wave) {
        game_state.wave_time_left = (game_state.wave_time_left - time.delta_seconds()).max(0.0);
    }
    if game_state.combo_secs > 0.0 {
        game_state.combo_secs -= time.delta_seconds();
        if game_state.combo_secs <= 0.0 {
            game_state.combo = 0;
        }
    }
}

/// Non-boss waves end on the clock or when both the budget and the field are
/// empty. Boss waves ignore the clock entirely and end when the boss falls.
fn wave_end_system(
    game_state: Res<GameState>,
    runtime: Res<WaveRuntime>,
    enemy_query: Query<(), With<Enemy>>,
    boss_query: Query<(), With<Boss>>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if !game_state.wave_active {
        return;
    }
    let done = if is_boss_wave(game_state.wave) {
        runtime.boss_spawned && boss_query.is_empty()
    } else {
        game_state.wave_time_left <= 0.0
            || (runtime.budget_remaining == 0 && enemy_query.is_empty())
    };
    if done {
        next_state.set(AppState::Intermission);
    }
}

/// Everything hostile or in flight is swept between waves and on run end.
fn clear_battlefield(
    mut commands: Commands,
    mut game_state: ResMut<GameState>,
    enemies: Query<Entity, With<Enemy>>,
    bosses: Query<Entity, With<Boss>>,
    projectiles: Query<Entity, With<Projectile>>,
    hazards: Query<Entity, With<Hazard>>,
    drops: Query<Entity, With<MaterialDrop>>,
) {
    game_state.wave_active = false;
    for entity in enemies
        .iter()
        .chain(bosses.iter())
        .chain(projectiles.iter())
        .chain(hazards.iter())
        .chain(drops.iter())
    {
        commands.entity(entity).despawn_recursive();
    }
}

fn spawn_intermission_ui(mut commands: Commands, game_state: Res<GameState>) {
    let next = game_state.wave + 1;
    let warning = if is_boss_wave(next) { "\nA boss stirs... [H] full heal (all materials)" } else { "" };
    commands.spawn((
        TextBundle::from_section(
            format!(
                "Wave {} cleared\n\n[1/2/3] buy upgrade    Enter for wave {}{}",
                game_state.wave, next, warning
            ),
            TextStyle { font_size: 30.0, color: Color::rgb(0.9, 0.95, 1.0), ..default() },
        )
        .with_style(Style {
            position_type: PositionType::Absolute,
            left: Val::Percent(28.0),
            top: Val::Percent(20.0),
            ..default()
        }),
        IntermissionUi,
    ));
}

fn intermission_continue_system(
    keyboard_input: Res<ButtonInput<KeyCode>>,
    mut game_state: ResMut<GameState>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if keyboard_input.just_pressed(KeyCode::Enter) {
        game_state.wave += 1;
        next_state.set(AppState::InGame);
    }
}

fn spawn_game_over_ui(mut commands: Commands, game_state: Res<GameState>) {
    commands.spawn((
        TextBundle::from_section(
            format!(
                "The glow fades.\n\nWave {}   Score {}\n\n[R] try again",
                game_state.wave, game_state.score
            ),
            TextStyle { font_size: 38.0, color: Color::rgb(1.0, 0.6, 0.6), ..default() },
        )
        .with_style(Style {
            position_type: PositionType::Absolute,
            left: Val::Percent(32.0),
            top: Val::Percent(32.0),
            ..default()
        }),
        GameOverUi,
    ));
}

fn game_over_system(
    keyboard_input: Res<ButtonInput<KeyCode>>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if keyboard_input.just_pressed(KeyCode::KeyR) {
        next_state.set(AppState::MainMenu);
    }
}

fn spawn_hud(mut commands: Commands) {
    commands.spawn((
        TextBundle::from_section(
            String::new(),
            TextStyle { font_size: 22.0, color: Color::WHITE, ..default() },
        )
        .with_style(Style {
            position_type: PositionType::Absolute,
            left: Val::Px(12.0),
            top: Val::Px(8.0),
            ..default()
        }),
        HudText,
    ));
}

fn hud_system(
    game_state: Res<GameState>,
    materials: Res<Materials>,
    player_query: Query<(&Health, &Glowling)>,
    mut text_query: Query<&mut Text, With<HudText>>,
) {
    let Ok(mut text) = text_query.get_single_mut() else { return };
    let (hp, lives) = player_query
        .get_single()
        .map(|(h, g)| (h.0, g.lives))
        .unwrap_or((0, INITIAL_LIVES));
    let timer = if is_boss_wave(game_state.wave) {
        "BOSS".to_string()
    } else {
        format!("{:.0}s", game_state.wave_time_left)
    };
    let combo = if game_state.combo > 1 { format!("  x{}", game_state.combo) } else { String::new() };
    text.sections[0].value = format!(
        "Wave {}  {}  |  HP {}  Lives {}  |  Score {}{}  |  Materials {}",
        game_state.wave, timer, hp, lives, game_state.score, combo, materials.0
    );
}
