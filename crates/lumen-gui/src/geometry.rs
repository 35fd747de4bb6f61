//! CPU-side vertex batching
//!
//! Geometry is emitted as plain triangle lists: every vertex carries its own
//! position and color, so one draw call covers the whole tick.

use glam::Vec2;

use crate::color::Color;

/// Vertex layout shared with the backend shaders: `vec2` position + `vec4` color
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub pos: [f32; 2],
    pub color: [f32; 4],
}

/// Byte stride of one [`Vertex`]
pub const VERTEX_STRIDE: u64 = std::mem::size_of::<Vertex>() as u64;

impl Vertex {
    pub fn new(pos: Vec2, color: Color) -> Self {
        Self {
            pos: pos.to_array(),
            color: color.to_array(),
        }
    }
}

/// Two triangles covering the rectangle at `pos` with size `extent`
pub fn quad(pos: Vec2, extent: Vec2, color: Color) -> [Vertex; 6] {
    let min = pos;
    let max = pos + extent;
    [
        Vertex::new(Vec2::new(min.x, min.y), color),
        Vertex::new(Vec2::new(max.x, min.y), color),
        Vertex::new(Vec2::new(max.x, max.y), color),
        Vertex::new(Vec2::new(max.x, max.y), color),
        Vertex::new(Vec2::new(min.x, max.y), color),
        Vertex::new(Vec2::new(min.x, min.y), color),
    ]
}

/// Vertices written during one tick.
///
/// The storage is cleared, never freed, at the start of every tick so the
/// steady state does not allocate.
#[derive(Clone, Debug, Default)]
pub struct GeometryBatch {
    vertices: Vec<Vertex>,
}

impl GeometryBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
        }
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    pub fn push_rect(&mut self, pos: Vec2, extent: Vec2, color: Color) {
        self.vertices.extend_from_slice(&quad(pos, extent, color));
    }

    /// Push one triangle with a color per corner
    pub fn push_triangle(&mut self, corners: [Vec2; 3], colors: [Color; 3]) {
        for (corner, color) in corners.into_iter().zip(colors) {
            self.vertices.push(Vertex::new(corner, color));
        }
    }

    /// Append every vertex of `other` after the ones already batched
    pub fn extend_from(&mut self, other: &GeometryBatch) {
        self.vertices.extend_from_slice(&other.vertices);
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_stride() {
        assert_eq!(VERTEX_STRIDE, 24);
    }

    #[test]
    fn test_quad_covers_rect() {
        let color = Color::rgb(1.0, 0.0, 0.0);
        let verts = quad(Vec2::new(10.0, 20.0), Vec2::new(32.0, 128.0), color);

        assert_eq!(verts[0].pos, [10.0, 20.0]);
        assert_eq!(verts[2].pos, [42.0, 148.0]);
        assert_eq!(verts[4].pos, [10.0, 148.0]);
        assert_eq!(verts[5], verts[0]);
        assert!(verts.iter().all(|v| v.color == color.to_array()));
    }

    #[test]
    fn test_batch_bytes_and_clear() {
        let mut batch = GeometryBatch::with_capacity(16);
        batch.push_rect(Vec2::ZERO, Vec2::ONE, Color::default());
        batch.push_triangle(
            [Vec2::ZERO, Vec2::X, Vec2::Y],
            [Color::gray(0.0), Color::gray(0.5), Color::gray(1.0)],
        );

        assert_eq!(batch.vertex_count(), 9);
        assert_eq!(batch.as_bytes().len() as u64, 9 * VERTEX_STRIDE);
        assert_eq!(batch.vertices()[7].color, [0.5, 0.5, 0.5, 1.0]);

        batch.clear();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_extend_appends_after_existing() {
        let mut quads = GeometryBatch::new();
        quads.push_rect(Vec2::ZERO, Vec2::ONE, Color::gray(0.2));

        let mut overlay = GeometryBatch::new();
        overlay.push_triangle([Vec2::ZERO, Vec2::X, Vec2::Y], [Color::gray(0.9); 3]);

        quads.extend_from(&overlay);
        assert_eq!(quads.vertex_count(), 9);
        assert_eq!(quads.vertices()[6].color, Color::gray(0.9).to_array());
        assert_eq!(overlay.vertex_count(), 3);
    }
}
