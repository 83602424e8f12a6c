use bevy::prelude::*;
use rand::Rng;

use crate::enemy::{EnemyRole, SizeTier};

pub const BOSS_WAVES: [u32; 4] = [5, 10, 15, 20];
/// Reserved for a longer run; present in the plan table, no phase machines yet.
pub const RESERVED_BOSS_WAVES: [u32; 2] = [25, 30];
pub const GLOBAL_MAX_BOTS: u32 = 40;
pub const PERFORMANCE_CAP: u32 = 60;

pub fn is_boss_wave(wave: u32) -> bool {
    BOSS_WAVES.contains(&wave)
}

#[derive(Debug, Clone)]
pub struct WavePlan {
    pub duration_secs: f32,
    pub comp: Vec<(EnemyRole, u32)>,
}

/// Static plan for the non-boss waves. Boss waves (5/10/15/20, plus the
/// reserved 25/30) are intentionally absent and handled by the boss machines.
pub fn planned_wave(wave: u32) -> Option<WavePlan> {
    use EnemyRole::*;
    let plan = |duration_secs: f32, comp: &[(EnemyRole, u32)]| {
        Some(WavePlan { duration_secs, comp: comp.to_vec() })
    };
    match wave {
        1 => plan(25.0, &[(Rush, 12)]),
        2 => plan(28.0, &[(Rush, 14), (Fast, 4)]),
        3 => plan(30.0, &[(Rush, 16), (Fast, 6)]),
        4 => plan(32.0, &[(Rush, 14), (Fast, 6), (Tank, 2)]),
        6 => plan(38.0, &[(Rush, 14), (Shooter, 6), (Fast, 6), (Tank, 2)]),
        7 => plan(40.0, &[(Rush, 14), (Shooter, 8), (Fast, 6), (Tank, 3)]),
        8 => plan(42.0, &[(Rush, 12), (Shooter, 10), (Fast, 6), (Tank, 3), (Sniper, 2)]),
        9 => plan(45.0, &[(Rush, 12), (Shooter, 10), (Fast, 8), (Tank, 4), (Sniper, 3)]),
        11 => plan(50.0, &[(Rush, 10), (Shooter, 12), (Tank, 4), (Sniper, 3), (Bloodmage, 2), (Berserker, 3)]),
        12 => plan(52.0, &[(Rush, 10), (Shooter, 12), (Tank, 4), (Sniper, 4), (Bloodmage, 3), (Overcharged, 3)]),
        13 => plan(54.0, &[(Rush, 8), (Shooter, 14), (Tank, 5), (Sniper, 4), (Bloodmage, 3), (Parasite, 4)]),
        14 => plan(56.0, &[(Rush, 8), (Shooter, 14), (Elite, 2), (Sniper, 4), (Bloodmage, 4), (Mutant, 3)]),
        16 => plan(60.0, &[(Shooter, 14), (Tank, 6), (Elite, 3), (Sniper, 5), (Bloodmage, 4), (Juggernaut, 2)]),
        17 => plan(62.0, &[(Shooter, 14), (Tank, 6), (Elite, 3), (Sniper, 5), (Berserker, 5), (Juggernaut, 2)]),
        18 => plan(64.0, &[(Shooter, 16), (Tank, 6), (Elite, 4), (Sniper, 6), (Mutant, 4), (Juggernaut, 3)]),
        19 => plan(66.0, &[(Shooter, 16), (Tank, 7), (Elite, 4), (Sniper, 6), (Bloodmage, 5), (Juggernaut, 3)]),
        21 => plan(70.0, &[(Shooter, 16), (Elite, 5), (Sniper, 6), (Bloodmage, 5), (Berserker, 6), (Juggernaut, 4)]),
        22 => plan(70.0, &[(Shooter, 16), (Elite, 5), (Sniper, 7), (Overcharged, 6), (Mutant, 5), (Juggernaut, 4)]),
        23 => plan(72.0, &[(Shooter, 18), (Elite, 6), (Sniper, 7), (Parasite, 6), (Bloodmage, 6), (Juggernaut, 4)]),
        24 => plan(72.0, &[(Shooter, 18), (Elite, 6), (Sniper, 8), (Berserker, 6), (Mutant, 6), (Juggernaut, 5)]),
        26 => plan(75.0, &[(Shooter, 18), (Elite, 7), (Sniper, 8), (Bloodmage, 7), (Overcharged, 7), (Juggernaut, 5)]),
        27 => plan(75.0, &[(Shooter, 20), (Elite, 7), (Sniper, 8), (Parasite, 8), (Mutant, 6), (Juggernaut, 6)]),
        28 => plan(78.0, &[(Shooter, 20), (Elite, 8), (Sniper, 9), (Bloodmage, 8), (Berserker, 8), (Juggernaut, 6)]),
        29 => plan(80.0, &[(Shooter, 22), (Elite, 8), (Sniper, 10), (Bloodmage, 8), (Mutant, 8), (Juggernaut, 7)]),
        _ => None,
    }
}

/// Fixed duration for planned waves; banded random fallback otherwise.
/// An unplanned wave is not an error, it just degrades to the bands.
pub fn wave_duration_secs(wave: u32, rng: &mut impl Rng) -> f32 {
    if let Some(plan) = planned_wave(wave) {
        return plan.duration_secs;
    }
    match wave {
        0..=3 => rng.gen_range(25.0..30.0),
        4..=6 => rng.gen_range(30.0..40.0),
        7..=10 => rng.gen_range(40.0..50.0),
        11..=15 => rng.gen_range(50.0..60.0),
        16..=19 => rng.gen_range(60.0..70.0),
        _ => 75.0,
    }
}

/// Integer cap on total planned spawns for the wave. Bosses and pressure
/// spawns never draw from it.
pub fn threat_budget(wave: u32, rng: &mut impl Rng) -> u32 {
    match wave {
        0..=3 => rng.gen_range(30..=40),
        4..=6 => rng.gen_range(50..=70),
        7..=10 => rng.gen_range(80..=120),
        11..=15 => rng.gen_range(130..=180),
        16..=19 => rng.gen_range(200..=250),
        _ => 200,
    }
}

/// Concurrent-enemy target derived from the planned composition total,
/// bucketed so pacing steps up in readable jumps.
pub fn desired_cap(wave: u32) -> u32 {
    let total: u32 = planned_wave(wave)
        .map(|p| p.comp.iter().map(|(_, n)| n).sum())
        .unwrap_or(20);
    let bucket = match total {
        0..=15 => 12,
        16..=30 => 20,
        31..=50 => 30,
        _ => 40,
    };
    bucket.min(GLOBAL_MAX_BOTS)
}

/// Copies the plan composition into a mutable remaining counter. Non-boss
/// waves >= 6 are rebalanced toward tactical ranged pressure: rush share is
/// halved, the cut moves to shooters, at least one tank is guaranteed, and
/// the kiting fast role is zeroed out.
pub fn init_composition(wave: u32) -> Vec<(EnemyRole, u32)> {
    let Some(plan) = planned_wave(wave) else { return Vec::new() };
    let mut comp = plan.comp;
    if wave >= 6 && !is_boss_wave(wave) {
        let mut moved = 0;
        for (role, count) in comp.iter_mut() {
            match role {
                EnemyRole::Rush => {
                    let cut = *count / 2;
                    *count -= cut;
                    moved += cut;
                }
                EnemyRole::Fast => {
                    *count = 0;
                }
                _ => {}
            }
        }
        if let Some((_, count)) = comp.iter_mut().find(|(r, _)| *r == EnemyRole::Shooter) {
            *count += moved;
        } else if moved > 0 {
            comp.push((EnemyRole::Shooter, moved));
        }
        if !comp.iter().any(|(r, n)| *r == EnemyRole::Tank && *n > 0) {
            comp.push((EnemyRole::Tank, 1));
        }
        comp.retain(|(_, n)| *n > 0);
    }
    comp
}

/// Weighted pick over the remaining composition, decrementing the winner.
/// Falls back to a hand-tuned banded table when the composition is spent.
pub fn choose_role(wave: u32, comp: &mut Vec<(EnemyRole, u32)>, rng: &mut impl Rng) -> EnemyRole {
    let total: u32 = comp.iter().map(|(_, n)| n).sum();
    if total > 0 {
        let mut pick = rng.gen_range(0..total);
        for (role, count) in comp.iter_mut() {
            if pick < *count {
                *count -= 1;
                return *role;
            }
            pick -= *count;
        }
    }
    fallback_role(wave, rng)
}

/// Weak/fast/tank/elite weights shifting toward the heavy end at high waves.
pub fn fallback_role(wave: u32, rng: &mut impl Rng) -> EnemyRole {
    let roll = rng.gen_range(0..100);
    match wave {
        0..=3 => {
            if roll < 80 { EnemyRole::Rush } else { EnemyRole::Fast }
        }
        4..=6 => {
            if roll < 55 { EnemyRole::Rush } else if roll < 80 { EnemyRole::Fast } else { EnemyRole::Tank }
        }
        7..=10 => {
            if roll < 35 { EnemyRole::Rush } else if roll < 60 { EnemyRole::Shooter } else if roll < 80 { EnemyRole::Fast } else { EnemyRole::Tank }
        }
        11..=15 => {
            if roll < 25 { EnemyRole::Rush } else if roll < 55 { EnemyRole::Shooter } else if roll < 80 { EnemyRole::Tank } else { EnemyRole::Elite }
        }
        _ => {
            if roll < 15 { EnemyRole::Rush } else if roll < 45 { EnemyRole::Shooter } else if roll < 75 { EnemyRole::Tank } else { EnemyRole::Elite }
        }
    }
}

/// HP is always a deterministic multiple of the player's current base weapon
/// damage per wave band, so difficulty tracks player progression instead of
/// raw numbers.
pub fn enemy_hp(wave: u32, role: EnemyRole, size: SizeTier, base_damage: f32) -> i32 {
    let one_hit = base_damage.max(1.0);
    let multiple = match size {
        SizeTier::Small => {
            if role.is_ranged() {
                // No ranged enemies exist below wave 5; the band starts there.
                if wave <= 7 { 1.0 } else { 2.0 }
            } else {
                match wave {
                    0..=3 => 1.0,
                    4 => 2.0,
                    5..=10 => 2.0,
                    _ => 3.0,
                }
            }
        }
        SizeTier::Big => match wave {
            0..=7 => 2.0,
            8..=13 => 4.0,
            _ => 6.0,
        },
    };
    (one_hit * multiple).ceil() as i32
}

/// Per-wave mutable planner state. Reset by the game flow at each wave start.
#[derive(Resource, Debug, Default)]
pub struct WaveRuntime {
    pub budget_remaining: u32,
    pub comp_remaining: Vec<(EnemyRole, u32)>,
    pub desired_cap: u32,
    pub boss_spawned: bool,
    /// Set by the final boss's summon phase, consumed by the spawn director.
    pub boss_wants_refill: bool,
}

impl WaveRuntime {
    pub fn start_wave(wave: u32, rng: &mut impl Rng) -> Self {
        Self {
            budget_remaining: threat_budget(wave, rng),
            comp_remaining: init_composition(wave),
            desired_cap: desired_cap(wave),
            boss_spawned: false,
            boss_wants_refill: false,
        }
    }

    /// Budget only moves on planned/pressure-exempt spawns, and never below 0.
    pub fn consume_budget(&mut self) -> bool {
        if self.budget_remaining == 0 {
            return false;
        }
        self.budget_remaining -= 1;
        true
    }
}
