//! CPU-side mesh geometry.

use cgmath::InnerSpace;

use crate::data_structures::material::Material;

/// Indexed triangle geometry.
///
/// `indices` always holds whole triangles. Normals are optional and, when
/// present, have one entry per position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Creates geometry, generating sequential indices when none are given
    /// (non-indexed glTF primitives).
    pub fn new(positions: Vec<[f32; 3]>, normals: Vec<[f32; 3]>, indices: Option<Vec<u32>>) -> Self {
        let indices = indices.unwrap_or_else(|| (0..positions.len() as u32).collect());
        // drop a dangling partial triangle
        let whole = indices.len() - indices.len() % 3;
        let mut indices = indices;
        indices.truncate(whole);
        Self {
            positions,
            normals,
            indices,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Corner positions of triangle `i`, or `None` if an index is out of range.
    pub fn triangle(&self, i: usize) -> Option<[cgmath::Vector3<f32>; 3]> {
        let tri = self.indices.get(i * 3..i * 3 + 3)?;
        let a = *self.positions.get(tri[0] as usize)?;
        let b = *self.positions.get(tri[1] as usize)?;
        let c = *self.positions.get(tri[2] as usize)?;
        Some([a.into(), b.into(), c.into()])
    }

    pub fn triangles(&self) -> impl Iterator<Item = [cgmath::Vector3<f32>; 3]> + '_ {
        (0..self.triangle_count()).filter_map(|i| self.triangle(i))
    }

    pub fn surface_area(&self) -> f32 {
        self.triangles().map(|t| triangle_area(&t)).sum()
    }
}

pub fn triangle_area([a, b, c]: &[cgmath::Vector3<f32>; 3]) -> f32 {
    (b - a).cross(c - a).magnitude() * 0.5
}

/// A named piece of geometry with its material.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub name: String,
    pub geometry: MeshData,
    pub material: Material,
}
