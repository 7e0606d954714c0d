//! Meadow engine crate.
//!
//! This crate owns the per-frame scene state shared between the host and shader
//! stages: the entity registry, the scene clock, and the device-resident block
//! the clock is published into every frame.

pub mod device;
pub mod logging;
pub mod scene;
pub mod time;
