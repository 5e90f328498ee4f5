mod system_clock;
mod timer_scope;

pub use system_clock::SystemClock;
pub use timer_scope::{TimerId, TimerScope};
