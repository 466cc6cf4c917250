//! Terrain grid mesh: positions, normals, vertex colors and index buffers.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::params::{Color, TerrainParams, MAX_SEGMENTS};

/// Vertex data for the terrain mesh (position + normal + color)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

/// Square grid of `(segments + 1)²` vertices lying in the XZ plane
///
/// Row `y` sits at `z = y * depth / segments - depth / 2`, column `x` at
/// `x * width / segments - width / 2`; only heights (Y), normals and colors
/// change between frames.
pub struct TerrainGrid {
    pub vertices: Vec<Vertex>,
    /// Triangle list for shaded rendering (counter-clockwise from above)
    pub triangle_indices: Vec<u32>,
    /// Line list for wireframe rendering
    pub line_indices: Vec<u32>,
    pub wireframe: bool,
    segments: usize,
    width: f32,
    depth: f32,
    dirty: bool,
}

impl TerrainGrid {
    /// Create a flat grid with specified parameters
    ///
    /// Segments are clamped to `1..=MAX_SEGMENTS`.
    pub fn new(params: &TerrainParams) -> Self {
        let segments = params.segments.clamp(1, MAX_SEGMENTS);
        let side = segments + 1;
        let cell_w = params.width / segments as f32;
        let cell_d = params.depth / segments as f32;
        let half_w = params.width / 2.0;
        let half_d = params.depth / 2.0;

        let mut vertices = Vec::with_capacity(side * side);
        for y in 0..side {
            for x in 0..side {
                vertices.push(Vertex {
                    position: [x as f32 * cell_w - half_w, 0.0, y as f32 * cell_d - half_d],
                    normal: [0.0, 1.0, 0.0],
                    color: params.color_low.to_array(),
                });
            }
        }

        Self {
            vertices,
            triangle_indices: triangle_indices(segments),
            line_indices: line_indices(segments),
            wireframe: params.wireframe,
            segments,
            width: params.width,
            depth: params.depth,
            dirty: true,
        }
    }

    /// Vertices per row
    pub fn cols(&self) -> usize {
        self.segments + 1
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.segments + 1
    }

    pub fn segments(&self) -> usize {
        self.segments
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Flat index of vertex (x, y)
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.cols() + x
    }

    pub fn height(&self, x: usize, y: usize) -> f32 {
        self.vertices[self.index(x, y)].position[1]
    }

    pub fn color(&self, x: usize, y: usize) -> Color {
        let [r, g, b] = self.vertices[self.index(x, y)].color;
        Color::new(r, g, b)
    }

    /// Set height and color of vertex `index`
    pub fn set_vertex(&mut self, index: usize, height: f32, color: Color) {
        let vertex = &mut self.vertices[index];
        vertex.position[1] = height;
        vertex.color = color.to_array();
    }

    /// True when `params` describe the same grid shape
    pub fn matches(&self, params: &TerrainParams) -> bool {
        self.segments == params.segments && self.width == params.width && self.depth == params.depth
    }

    /// Lowest and highest vertex height
    pub fn height_range(&self) -> (f32, f32) {
        self.vertices
            .iter()
            .map(|v| v.position[1])
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), h| {
                (lo.min(h), hi.max(h))
            })
    }

    /// Recompute smooth vertex normals from the triangle list
    ///
    /// Face normals are accumulated unnormalized, so larger faces weigh more.
    pub fn recompute_normals(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.vertices.len()];

        for tri in self.triangle_indices.chunks_exact(3) {
            let (ia, ib, ic) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let a = Vec3::from_array(self.vertices[ia].position);
            let b = Vec3::from_array(self.vertices[ib].position);
            let c = Vec3::from_array(self.vertices[ic].position);

            let face = (c - b).cross(a - b);
            accum[ia] += face;
            accum[ib] += face;
            accum[ic] += face;
        }

        for (vertex, normal) in self.vertices.iter_mut().zip(accum) {
            vertex.normal = normal.normalize_or_zero().to_array();
        }
    }

    /// Flag the buffers for re-upload
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Return and clear the re-upload flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Vertex buffer contents
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index buffer for the current render mode
    pub fn active_indices(&self) -> &[u32] {
        if self.wireframe {
            &self.line_indices
        } else {
            &self.triangle_indices
        }
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.active_indices())
    }
}

/// Two triangles per cell: (a, b, d) and (b, c, d)
fn triangle_indices(segments: usize) -> Vec<u32> {
    let side = segments + 1;
    let mut indices = Vec::with_capacity(segments * segments * 6);

    for y in 0..segments {
        for x in 0..segments {
            let a = (y * side + x) as u32;
            let b = ((y + 1) * side + x) as u32;
            let c = b + 1;
            let d = a + 1;

            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    indices
}

/// Every horizontal and vertical grid edge as a line segment
fn line_indices(segments: usize) -> Vec<u32> {
    let side = segments + 1;
    let mut indices = Vec::with_capacity(segments * side * 4);

    // Horizontal lines (connect vertices in same row)
    for y in 0..side {
        for x in 0..segments {
            let i = (y * side + x) as u32;
            indices.extend_from_slice(&[i, i + 1]);
        }
    }
    // Vertical lines (connect vertices in same column)
    for y in 0..segments {
        for x in 0..side {
            let i = (y * side + x) as u32;
            indices.extend_from_slice(&[i, i + side as u32]);
        }
    }
    indices
}
