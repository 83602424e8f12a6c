use thiserror::Error;

/// Failures inside spawn helpers. None of these abort the frame: callers log
/// and retry on a later tick via the same unset guard flag.
#[derive(Debug, Error, PartialEq)]
pub enum SpawnError {
    #[error("no live player to anchor the spawn")]
    NoPlayer,
    #[error("concurrent enemy cap reached ({cap})")]
    CapReached { cap: u32 },
    #[error("wave threat budget exhausted")]
    BudgetExhausted,
    #[error("boss support ceiling reached")]
    BossSupportCeiling,
}

/// Failures inside boss phase casts. A failed cast leaves the phase's cast
/// flag unset so the same cast is retried next tick.
#[derive(Debug, Error, PartialEq)]
pub enum BossCastError {
    #[error("no live player to aim the pattern at")]
    NoPlayer,
    #[error("boss wave {0} has no phase machine")]
    UnknownBossWave(u32),
}
