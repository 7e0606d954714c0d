//! Time subsystem.
//!
//! Provides the scene clock and the time state it publishes, without coupling to
//! the render loop. Intended usage:
//! - one `SceneClock` per scene, created with the scene
//! - call `advance()` exactly once per frame to obtain `TimeState`

mod scene_clock;
mod source;
mod state;

pub use scene_clock::{ClockConfig, SceneClock};
pub use source::{ManualSource, MonotonicSource, TimeSource};
pub use state::TimeState;
