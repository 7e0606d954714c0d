use clap::Parser;

/// Headless scene driver: runs the per-frame time publish + blade dispatch loop.
#[derive(Parser, Debug, Clone)]
#[command(name = "meadow-studio")]
#[command(about = "Headless meadow scene runner", long_about = None)]
pub struct Cli {
    /// Number of frames to run.
    #[arg(long, default_value_t = 240)]
    pub frames: u32,

    /// Target frame rate used to pace the loop.
    #[arg(long, default_value_t = 60.0)]
    pub fps: f32,

    /// Number of blade fields to register.
    #[arg(long, default_value_t = 2)]
    pub blades: u32,

    /// Blades per field.
    #[arg(long, default_value_t = 4096)]
    pub blades_per_field: u32,

    /// Number of static models to register.
    #[arg(long, default_value_t = 3)]
    pub models: u32,

    /// Pad the time block to 16 bytes.
    #[arg(long)]
    pub pad: bool,

    /// Give each in-flight frame its own time slot instead of rewriting one.
    #[arg(long)]
    pub frames_in_flight: Option<u32>,

    /// Log filter (env_logger syntax). Falls back to RUST_LOG.
    #[arg(long)]
    pub log: Option<String>,
}
