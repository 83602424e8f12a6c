use bevy::prelude::*;

#[derive(Component, Deref, DerefMut)]
pub struct Velocity(pub Vec2);

#[derive(Component)]
pub struct Health(pub i32);

#[derive(Component)]
pub struct MaxHealth(pub i32);

#[derive(Component)]
pub struct Lifetime {
    pub timer: Timer,
}

/// Timed burn applied by fiery projectiles. Per-tick damage is fractional, so
/// a carry field keeps the floored integer application lossless over time.
#[derive(Component, Debug)]
pub struct Burning {
    pub dps: f32,
    pub remaining_secs: f32,
    pub carry: f32,
}

/// Timed movement slow (boss hazards, juggernaut hits, water nova).
#[derive(Component, Debug)]
pub struct Slowed {
    pub factor: f32,
    pub remaining_secs: f32,
}

/// Brief forced slow on a damaged enemy for hit feedback, already scaled by
/// the target's stagger resistance when applied.
#[derive(Component, Debug)]
pub struct Hitstop {
    pub factor: f32,
    pub remaining_secs: f32,
}

/// Impulse added on top of steering, decays toward zero each tick.
#[derive(Component, Debug, Default)]
pub struct Knockback(pub Vec2);

#[derive(Component)]
pub struct HitFlash {
    pub timer: Timer,
    pub base_color: Color,
}
