use serde::{Deserialize, Serialize};

/// A trap adds `1 / TRAP_EXTENSION_DIVISOR` of the phase's remaining time.
pub const TRAP_EXTENSION_DIVISOR: i64 = 5;

/// Slow debuff of one player. Replaced as a whole, never patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectState {
    /// Epoch milliseconds at which the slow wears off.
    pub slow_until_ms: u64,
    /// Duration added by the trigger that produced this state.
    pub duration_ms: u64,
}

impl EffectState {
    pub fn is_active(&self, now_ms: u64) -> bool {
        now_ms < self.slow_until_ms
    }

    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.slow_until_ms.saturating_sub(now_ms)
    }
}

/// Resolves a trap trigger against the player's current slow expiry.
///
/// The extension is a fifth of the time left in the phase and is anchored on
/// the existing expiry when there is one, so repeated hits stack while each
/// hit shrinks as the phase runs out. Once the phase has ended the extension
/// is zero: the debuff is kept as is and never shortened.
pub fn stack_slow(
    now_ms: u64,
    phase_ends_at_ms: u64,
    current_slow_until_ms: Option<u64>,
) -> EffectState {
    let remaining = phase_ends_at_ms as i64 - now_ms as i64;
    let extension = (remaining / TRAP_EXTENSION_DIVISOR).max(0) as u64;
    let base = current_slow_until_ms.unwrap_or(now_ms);

    EffectState {
        slow_until_ms: base.saturating_add(extension),
        duration_ms: extension,
    }
}
