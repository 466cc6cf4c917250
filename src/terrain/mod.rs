//! Audio-reactive terrain: scrolling history, grid mesh and field generator.

mod history;
mod mesh;
mod system;

// Re-export public types
pub use history::{bin_for_column, fill_row_from_snapshot, TerrainHistory, SPECTRUM_COVERAGE};
pub use mesh::{TerrainGrid, Vertex};
pub use system::{height_alpha, height_color, TerrainSystem, SCROLL_RATE};
