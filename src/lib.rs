//! Music terrain library - audio-reactive terrain field

pub mod audio;
pub mod cli;
pub mod noise;
pub mod params;
pub mod snapshot;
pub mod terrain;
