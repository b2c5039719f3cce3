pub mod config;
pub mod progress;
pub mod track_id;

pub use config::{Config, ConfigError, Style};
pub use progress::{Error, ProgressHandle, ProgressReporter, ProgressSnapshot, Renderer, TaskId};
pub use track_id::{extract_track_id, identify, Source, TrackId};
