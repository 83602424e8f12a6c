pub mod audio;
pub mod boss;
pub mod camera_systems;
pub mod combat;
pub mod components;
pub mod economy;
pub mod enemy;
pub mod errors;
pub mod game;
pub mod hazards;
pub mod loadout;
pub mod player;
pub mod projectiles;
pub mod spawning;
pub mod towers;
pub mod visual_effects;
pub mod waves;
