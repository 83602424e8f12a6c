use bevy::prelude::*;

pub const BASE_WEAPON_DAMAGE: f32 = 10.0;
pub const BASE_FIRE_INTERVAL_SECS: f32 = 0.5;
const SPAWN_RATE_BASE: f32 = 1.5;
const SPAWN_RATE_POWER_DIVISOR: f32 = 30.0;
const SPAWN_RATE_CAP: f32 = 10.0;

/// The one piece of cross-layer shared mutable state: shop purchases write
/// these fields, the combat resolver and the spawn director read them each
/// tick. Everything lives in named slots so the data flow stays traceable.
#[derive(Resource, Debug, Clone)]
pub struct PlayerLoadout {
    pub weapon_damage: f32,
    pub fire_interval_secs: f32,
    pub projectile_speed: f32,
    pub armor: i32,
    pub regen_per_sec: f32,
    pub crit_chance: f32,
    pub crit_damage_mult: f32,
    /// Chance that a projectile passes through a target it had no pierce
    /// counter left for.
    pub pierce_chance: f32,
    pub flat_pierce: u32,
    pub on_kill_heal: i32,
    pub aura_dps: f32,
    pub aura_radius: f32,
    pub speed_boost: f32,
    pub maneuver_boost: f32,
    pub turret_damage: f32,
}

impl Default for PlayerLoadout {
    fn default() -> Self {
        Self {
            weapon_damage: BASE_WEAPON_DAMAGE,
            fire_interval_secs: BASE_FIRE_INTERVAL_SECS,
            projectile_speed: 600.0,
            armor: 0,
            regen_per_sec: 0.0,
            crit_chance: 0.05,
            crit_damage_mult: 0.5,
            pierce_chance: 0.0,
            flat_pierce: 0,
            on_kill_heal: 0,
            aura_dps: 0.0,
            aura_radius: 0.0,
            speed_boost: 1.0,
            maneuver_boost: 1.0,
            turret_damage: 0.0,
        }
    }
}

impl PlayerLoadout {
    /// Rough damage throughput, the input to spawn pressure. Stronger players
    /// face faster spawns.
    pub fn player_power(&self) -> f32 {
        let weapon_dps = self.weapon_damage / self.fire_interval_secs.max(0.05);
        weapon_dps + self.aura_dps + self.turret_damage
    }

    /// Spawns per second derived from power, clamped so the director never
    /// floods the arena on a maxed-out build.
    pub fn spawn_rate(&self) -> f32 {
        (SPAWN_RATE_BASE + self.player_power() / SPAWN_RATE_POWER_DIVISOR).min(SPAWN_RATE_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_rate_is_clamped() {
        let mut loadout = PlayerLoadout::default();
        loadout.weapon_damage = 10_000.0;
        assert_eq!(loadout.spawn_rate(), SPAWN_RATE_CAP);
    }
}
