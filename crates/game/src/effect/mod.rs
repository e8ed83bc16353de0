mod slow;

pub use slow::{EffectState, TRAP_EXTENSION_DIVISOR, stack_slow};
