//! Terrain field generator: noise plus scrolling audio history, every frame.

use super::history::TerrainHistory;
use super::mesh::TerrainGrid;
use crate::noise::HeightNoise;
use crate::params::{Color, ConfigError, TerrainParams};

/// Offset added to heights before normalizing them for the color ramp
pub const COLOR_HEIGHT_OFFSET: f32 = 20.0;

/// Extra range (beyond `height_scale`) covered by the color ramp
pub const COLOR_HEIGHT_PADDING: f32 = 40.0;

/// Scroll units per unit of `speed` per second
pub const SCROLL_RATE: f64 = 10.0;

/// High-level terrain system owning the grid, history and noise field
pub struct TerrainSystem {
    pub grid: TerrainGrid,
    history: TerrainHistory,
    noise: Box<dyn HeightNoise>,
    params: TerrainParams,
    /// Accumulated noise offset along the row axis
    scroll_offset: f64,
    /// Last validation failure reported, so a bad value is logged once
    rejected: Option<String>,
}

impl TerrainSystem {
    /// Create new terrain system with specified parameters
    pub fn new(params: TerrainParams, noise: Box<dyn HeightNoise>) -> Self {
        let grid = TerrainGrid::new(&params);
        let history = TerrainHistory::new(grid.rows(), grid.cols());
        Self {
            grid,
            history,
            noise,
            params,
            scroll_offset: 0.0,
            rejected: None,
        }
    }

    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    /// Live parameters; changes are picked up on the next update
    pub fn params_mut(&mut self) -> &mut TerrainParams {
        &mut self.params
    }

    pub fn history(&self) -> &TerrainHistory {
        &self.history
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    /// Swap the noise field without touching grid or history
    pub fn set_noise(&mut self, noise: Box<dyn HeightNoise>) {
        self.noise = noise;
    }

    /// Throw away grid and history and rebuild them from the current params
    ///
    /// Invalid params leave the existing grid and history untouched.
    pub fn create_terrain(&mut self) -> Result<(), ConfigError> {
        self.params.validate()?;

        let side = self.params.vertices_per_side();
        self.grid = TerrainGrid::new(&self.params);
        self.history.reset(side, side);
        log::debug!(
            "Rebuilt terrain: {}x{} vertices over {}x{}",
            side,
            side,
            self.params.width,
            self.params.depth
        );
        Ok(())
    }

    /// Advance one frame
    ///
    /// `snapshot` of `None` is treated as silence: the history receives an
    /// all-zero row and heights come from the noise field alone. While the
    /// live params are invalid the frame is skipped and the last good grid
    /// stays in place.
    pub fn update_terrain(&mut self, snapshot: Option<&[u8]>, delta_time: f32) {
        if let Err(e) = self.params.validate() {
            let message = e.to_string();
            if self.rejected.as_deref() != Some(message.as_str()) {
                log::warn!("Keeping previous terrain: {}", message);
                self.rejected = Some(message);
            }
            return;
        }
        self.rejected = None;

        if !self.grid.matches(&self.params) {
            // Validated above
            let _ = self.create_terrain();
        }

        self.scroll_offset -= self.params.speed as f64 * delta_time as f64 * SCROLL_RATE;
        self.history.push_snapshot(snapshot);

        let params = &self.params;
        let half_scale = params.height_scale / 2.0;
        let noise_scale = params.noise_scale as f64;
        let cols = self.grid.cols();

        for (y, audio_row) in self.history.iter().enumerate().take(self.grid.rows()) {
            let y_off = self.scroll_offset + y as f64 * noise_scale;

            for x in 0..cols {
                let noise_value = self.noise.sample(x as f64 * noise_scale, y_off);
                let audio_value = audio_row.get(x).copied().unwrap_or(0.0);

                let height = noise_value * half_scale + audio_value * params.audio_strength;
                let color = height_color(height, params);

                let index = y * cols + x;
                self.grid.set_vertex(index, height, color);
            }
        }

        self.grid.wireframe = params.wireframe;
        self.grid.recompute_normals();
        self.grid.mark_dirty();
    }
}

/// Position of `height` on the color ramp, clamped to [0, 1]
///
/// A degenerate ramp (non-positive span) or a non-finite height maps to 0.
pub fn height_alpha(height: f32, height_scale: f32) -> f32 {
    let span = height_scale + COLOR_HEIGHT_PADDING;
    let alpha = (height + COLOR_HEIGHT_OFFSET) / span;
    if span > 0.0 && alpha.is_finite() {
        alpha.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Vertex color for `height` between `color_low` and `color_high`
pub fn height_color(height: f32, params: &TerrainParams) -> Color {
    let alpha = height_alpha(height, params.height_scale);
    params.color_low.lerp(params.color_high, alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::NoiseGenerator;
    use crate::params::NoiseKind;

    /// Field that is zero everywhere
    struct FlatNoise;

    impl HeightNoise for FlatNoise {
        fn sample(&self, _x: f64, _y: f64) -> f32 {
            0.0
        }
    }

    /// Field equal to `x` (clamped), handy for checking sample coordinates
    struct RampNoise;

    impl HeightNoise for RampNoise {
        fn sample(&self, x: f64, _y: f64) -> f32 {
            (x as f32).clamp(-1.0, 1.0)
        }
    }

    fn scenario_params() -> TerrainParams {
        TerrainParams {
            segments: 4,
            height_scale: 40.0,
            noise_scale: 0.5,
            audio_strength: 60.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_creation_shapes() {
        for segments in [1, 4, 24, 64] {
            let params = TerrainParams {
                segments,
                ..Default::default()
            };
            let terrain = TerrainSystem::new(params, Box::new(FlatNoise));

            assert_eq!(terrain.grid.vertex_count(), (segments + 1).pow(2));
            assert_eq!(terrain.history().len(), segments + 1);
            assert!(terrain.history().iter().all(|row| row.len() == segments + 1));
        }
    }

    #[test]
    fn test_silence_gives_pure_noise_heights() {
        let params = scenario_params();
        let mut terrain = TerrainSystem::new(
            params.clone(),
            Box::new(NoiseGenerator::new(NoiseKind::OpenSimplex, 42)),
        );
        let reference = NoiseGenerator::new(NoiseKind::OpenSimplex, 42);

        for frame in 0..5 {
            let silence = [0u8; 256];
            let snapshot = if frame % 2 == 0 { None } else { Some(&silence[..]) };
            terrain.update_terrain(snapshot, 0.016);

            let offset = terrain.scroll_offset();
            for y in 0..5 {
                for x in 0..5 {
                    let n = reference.sample(x as f64 * 0.5, offset + y as f64 * 0.5);
                    assert_eq!(terrain.grid.height(x, y), n * 20.0);
                }
            }
        }
    }

    #[test]
    fn test_scroll_offset_advances_with_speed() {
        let mut terrain = TerrainSystem::new(scenario_params(), Box::new(FlatNoise));
        terrain.params_mut().speed = 0.5;

        terrain.update_terrain(None, 0.1);
        assert!((terrain.scroll_offset() + 0.5).abs() < 1e-6);

        terrain.update_terrain(None, 0.1);
        assert!((terrain.scroll_offset() + 1.0).abs() < 1e-6);

        // Zero elapsed time still pushes a row and recomputes, but does not scroll
        terrain.update_terrain(None, 0.0);
        assert!((terrain.scroll_offset() + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_first_bin_lifts_newest_row_first_column() {
        let mut terrain = TerrainSystem::new(scenario_params(), Box::new(FlatNoise));
        let mut snapshot = [0u8; 256];
        snapshot[0] = 255;

        terrain.update_terrain(Some(&snapshot), 0.016);

        assert_eq!(terrain.grid.height(0, 0), 60.0);
        for y in 0..5 {
            for x in 0..5 {
                if (x, y) != (0, 0) {
                    assert_eq!(terrain.grid.height(x, y), 0.0);
                }
            }
        }
    }

    #[test]
    fn test_audio_rows_scroll_back() {
        let mut terrain = TerrainSystem::new(scenario_params(), Box::new(FlatNoise));
        let mut snapshot = [0u8; 256];
        snapshot[0] = 255;

        terrain.update_terrain(Some(&snapshot), 0.016);
        terrain.update_terrain(None, 0.016);
        terrain.update_terrain(None, 0.016);

        assert_eq!(terrain.grid.height(0, 0), 0.0);
        assert_eq!(terrain.grid.height(0, 2), 60.0);

        // Three more pushes move the loud row out of the window
        for _ in 0..3 {
            terrain.update_terrain(None, 0.016);
        }
        assert!(terrain.grid.vertices.iter().all(|v| v.position[1] == 0.0));
    }

    #[test]
    fn test_noise_sampled_at_scaled_column() {
        let mut terrain = TerrainSystem::new(scenario_params(), Box::new(RampNoise));
        terrain.update_terrain(None, 0.016);

        // x * noise_scale = 0, 0.5, 1.0, 1.5 (clamped to 1), ...; height = n * 20
        assert_eq!(terrain.grid.height(0, 3), 0.0);
        assert_eq!(terrain.grid.height(1, 3), 10.0);
        assert_eq!(terrain.grid.height(2, 3), 20.0);
        assert_eq!(terrain.grid.height(4, 3), 20.0);
    }

    #[test]
    fn test_color_ramp_endpoints() {
        let params = scenario_params();
        let low_height = -COLOR_HEIGHT_OFFSET;
        let high_height = params.height_scale + COLOR_HEIGHT_PADDING - COLOR_HEIGHT_OFFSET;

        assert_eq!(height_alpha(low_height, params.height_scale), 0.0);
        assert_eq!(height_alpha(high_height, params.height_scale), 1.0);
        assert_eq!(height_color(low_height, &params), params.color_low);
        assert_eq!(height_color(high_height, &params), params.color_high);
    }

    #[test]
    fn test_color_ramp_clamps_extremes() {
        let params = scenario_params();

        assert_eq!(height_color(-1.0e6, &params), params.color_low);
        assert_eq!(height_color(1.0e6, &params), params.color_high);

        // Flat zero height sits a quarter of the way up with the default scale
        assert_eq!(height_alpha(0.0, 40.0), 0.25);
    }

    #[test]
    fn test_segment_change_regenerates() {
        let mut terrain = TerrainSystem::new(scenario_params(), Box::new(FlatNoise));
        terrain.update_terrain(Some(&[255u8; 256]), 0.016);

        terrain.params_mut().segments = 8;
        terrain.update_terrain(None, 0.016);

        assert_eq!(terrain.grid.vertex_count(), 81);
        assert_eq!(terrain.history().len(), 9);
        // Previous audio was discarded with the old history
        assert!(terrain.grid.vertices.iter().all(|v| v.position[1] == 0.0));
    }

    #[test]
    fn test_live_params_apply_without_regeneration() {
        let mut terrain = TerrainSystem::new(scenario_params(), Box::new(FlatNoise));
        terrain.update_terrain(None, 0.016);

        let white = Color::new(1.0, 1.0, 1.0);
        terrain.params_mut().color_low = white;
        terrain.params_mut().color_high = white;
        terrain.params_mut().wireframe = false;
        terrain.update_terrain(None, 0.016);

        assert!(!terrain.grid.wireframe);
        assert_eq!(terrain.grid.color(2, 2), white);
        assert_eq!(terrain.grid.vertex_count(), 25);
    }

    #[test]
    fn test_update_marks_grid_dirty() {
        let mut terrain = TerrainSystem::new(scenario_params(), Box::new(FlatNoise));
        terrain.grid.take_dirty();

        terrain.update_terrain(None, 0.016);
        assert!(terrain.grid.take_dirty());
    }

    #[test]
    fn test_reproducible_with_fixed_seed() {
        let make = || {
            TerrainSystem::new(
                scenario_params(),
                Box::new(NoiseGenerator::new(NoiseKind::OpenSimplex, 1234)),
            )
        };
        let mut a = make();
        let mut b = make();

        for _ in 0..3 {
            a.update_terrain(None, 0.016);
            b.update_terrain(None, 0.016);
        }
        assert_eq!(a.grid.vertices, b.grid.vertices);
    }

    #[test]
    fn test_zero_segments_keeps_previous_grid() {
        let mut terrain = TerrainSystem::new(scenario_params(), Box::new(FlatNoise));
        terrain.update_terrain(None, 0.016);
        let before = terrain.grid.vertices.clone();

        terrain.params_mut().segments = 0;
        terrain.update_terrain(Some(&[255u8; 256]), 0.016);
        terrain.update_terrain(None, 0.016);

        assert_eq!(terrain.grid.vertex_count(), 25);
        assert_eq!(terrain.grid.vertices, before);
        assert!(terrain
            .grid
            .vertices
            .iter()
            .all(|v| v.position.iter().chain(&v.normal).all(|c| c.is_finite())));
        assert!(terrain.create_terrain().is_err());

        // Back to a valid value: rebuilt on the next frame
        terrain.params_mut().segments = 8;
        terrain.update_terrain(None, 0.016);
        assert_eq!(terrain.grid.vertex_count(), 81);
    }

    #[test]
    fn test_negative_height_scale_never_yields_nan_colors() {
        for height in [-100.0, 0.0, 100.0, f32::NAN] {
            let alpha = height_alpha(height, -40.0);
            assert!((0.0..=1.0).contains(&alpha));
        }
        assert_eq!(height_alpha(10.0, -60.0), 0.0);

        let mut terrain = TerrainSystem::new(scenario_params(), Box::new(FlatNoise));
        terrain.update_terrain(None, 0.016);
        terrain.params_mut().height_scale = -40.0;
        terrain.update_terrain(None, 0.016);

        assert!(terrain
            .grid
            .vertices
            .iter()
            .all(|v| v.color.iter().all(|c| c.is_finite())));
    }

    #[test]
    fn test_set_noise_swaps_field_in_place() {
        let mut terrain = TerrainSystem::new(scenario_params(), Box::new(FlatNoise));
        terrain.update_terrain(None, 0.016);
        assert_eq!(terrain.grid.height(2, 3), 0.0);

        terrain.set_noise(Box::new(RampNoise));
        terrain.update_terrain(None, 0.016);

        // Same grid, heights now follow the ramp
        assert_eq!(terrain.grid.vertex_count(), 25);
        assert_eq!(terrain.grid.height(1, 3), 10.0);
        assert_eq!(terrain.grid.height(2, 3), 20.0);
    }
}
