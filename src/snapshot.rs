//! Top-down PNG snapshots of the terrain grid.

use glam::Vec3;
use image::{Rgb, RgbImage};
use std::path::Path;

use crate::params::Color;
use crate::terrain::TerrainGrid;

/// Light direction used for shaded snapshots (from above, slightly behind)
const LIGHT_DIR: Vec3 = Vec3::new(0.3, 1.0, 0.4);

/// Ambient term so faces turned away from the light stay visible
const AMBIENT: f32 = 0.35;

/// Largest snapshot edge in pixels
pub const MAX_SNAPSHOT_SIDE: u32 = 8192;

/// Render the grid seen from above, `scale` pixels per cell
///
/// `scale` is clamped so the image edge stays within `MAX_SNAPSHOT_SIDE`.
///
/// Wireframe grids draw only the cell edges over black; shaded grids fill
/// every pixel and apply simple Lambert lighting from the vertex normals.
pub fn render_top_down(grid: &TerrainGrid, scale: u32) -> RgbImage {
    let segments = grid.segments() as u32;
    let scale = clamp_scale(segments, scale);
    let size = segments * scale + 1;
    let mut img = RgbImage::new(size, size);
    let light = LIGHT_DIR.normalize();

    for py in 0..size {
        for px in 0..size {
            let on_edge = px % scale == 0 || py % scale == 0;
            if grid.wireframe && !on_edge {
                continue;
            }

            let gx = px as f32 / scale as f32;
            let gy = py as f32 / scale as f32;
            let (color, normal) = sample_bilinear(grid, gx, gy);

            let shaded = if grid.wireframe {
                color
            } else {
                let lambert = normal.dot(light).max(0.0);
                let k = AMBIENT + (1.0 - AMBIENT) * lambert;
                Color::new(color.r * k, color.g * k, color.b * k)
            };

            img.put_pixel(px, py, Rgb(shaded.to_rgb8()));
        }
    }

    img
}

/// Pixels per cell, at least 1 and small enough that the image fits
fn clamp_scale(segments: u32, scale: u32) -> u32 {
    let max_scale = ((MAX_SNAPSHOT_SIDE - 1) / segments.max(1)).max(1);
    scale.clamp(1, max_scale)
}

/// Write a snapshot PNG
pub fn write_snapshot(grid: &TerrainGrid, path: &Path, scale: u32) -> image::ImageResult<()> {
    render_top_down(grid, scale).save(path)
}

/// Interpolated color and normal at fractional grid coordinates
fn sample_bilinear(grid: &TerrainGrid, gx: f32, gy: f32) -> (Color, Vec3) {
    let max = grid.segments();
    let x0 = (gx.floor() as usize).min(max);
    let y0 = (gy.floor() as usize).min(max);
    let x1 = (x0 + 1).min(max);
    let y1 = (y0 + 1).min(max);
    let tx = gx - x0 as f32;
    let ty = gy - y0 as f32;

    let top = grid.color(x0, y0).lerp(grid.color(x1, y0), tx);
    let bottom = grid.color(x0, y1).lerp(grid.color(x1, y1), tx);
    let color = top.lerp(bottom, ty);

    let normal_at = |x: usize, y: usize| Vec3::from_array(grid.vertices[grid.index(x, y)].normal);
    let normal = normal_at(x0, y0)
        .lerp(normal_at(x1, y0), tx)
        .lerp(normal_at(x0, y1).lerp(normal_at(x1, y1), tx), ty)
        .normalize_or_zero();

    (color, normal)
}
