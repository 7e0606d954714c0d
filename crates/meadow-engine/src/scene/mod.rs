//! Scene (per-frame composition) types.
//!
//! Responsibilities:
//! - keep ordered, non-owning registries of models and blade fields
//! - own the scene clock and publish its state to a device-resident time block
//! - hand the render loop one object per frame: registry views + time binding

mod arena;
mod config;
mod error;
mod registry;
mod root;
mod time_block;

pub use arena::{Arena, Handle};
pub use config::{SceneConfig, StalenessPolicy, TimeBlockConfig};
pub use error::SceneError;
pub use registry::EntityRegistry;
pub use root::Scene;
pub use time_block::{TimeBinding, TimeBlock, TimeBlockLayout};
