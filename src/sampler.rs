//! Area-weighted surface sampling of meshes into colored point clouds.
//!
//! A triangle is picked with probability proportional to its area, then a
//! point is picked uniformly inside it from barycentric coordinates. Repeating
//! this gives a uniform density over the whole surface regardless of how the
//! mesh is tessellated.

use cgmath::Vector3;
use rand::Rng;

use crate::{
    data_structures::{
        material::{Color, PointsMaterial},
        mesh::{MeshData, triangle_area},
    },
    error::SampleError,
};

/// Points per cloud when the caller does not say otherwise.
pub const DEFAULT_POINT_COUNT: usize = 3000;

/// The colours sampled points are drawn from.
pub const DEFAULT_PALETTE: [&str; 4] = ["#FAAD80", "#FF6767", "#FF3D68", "#A73489"];

pub fn default_palette() -> Vec<Color> {
    DEFAULT_PALETTE
        .iter()
        .filter_map(|hex| Color::parse(hex).ok())
        .collect()
}

/// Precomputed cumulative triangle areas of one mesh.
pub struct MeshSurfaceSampler<'a> {
    mesh: &'a MeshData,
    triangles: Vec<usize>,
    cumulative: Vec<f32>,
}

impl<'a> MeshSurfaceSampler<'a> {
    pub fn build(mesh: &'a MeshData) -> Result<Self, SampleError> {
        let mut triangles = Vec::new();
        let mut cumulative = Vec::new();
        let mut total = 0.0;
        for i in 0..mesh.triangle_count() {
            let Some(corners) = mesh.triangle(i) else {
                continue;
            };
            let area = triangle_area(&corners);
            // zero-area triangles can never be hit, leave them out of the table
            if area > 0.0 && area.is_finite() {
                total += area;
                triangles.push(i);
                cumulative.push(total);
            }
        }
        if triangles.is_empty() {
            return Err(SampleError::EmptySurface);
        }
        Ok(Self {
            mesh,
            triangles,
            cumulative,
        })
    }

    pub fn total_area(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// One point on the surface.
    pub fn sample(&self, rng: &mut impl Rng) -> Vector3<f32> {
        let target = rng.gen_range(0.0..self.total_area());
        let slot = self
            .cumulative
            .partition_point(|&area| area <= target)
            .min(self.cumulative.len() - 1);
        let [a, b, c] = self
            .mesh
            .triangle(self.triangles[slot])
            .unwrap_or([Vector3::new(0.0, 0.0, 0.0); 3]);

        let mut u: f32 = rng.r#gen();
        let mut v: f32 = rng.r#gen();
        // fold points from the far half of the parallelogram back into the triangle
        if u + v > 1.0 {
            u = 1.0 - u;
            v = 1.0 - v;
        }
        a + (b - a) * u + (c - a) * v
    }
}

/// A cloud of coloured points sampled from a mesh surface.
///
/// `positions` and `colors` are flat `xyz` / `rgb` arrays of equal length.
#[derive(Clone, Debug, PartialEq)]
pub struct PointCloud {
    pub positions: Vec<f32>,
    pub colors: Vec<f32>,
    pub material: PointsMaterial,
}

impl PointCloud {
    /// Samples `count` points with the default palette and material.
    pub fn sample(mesh: &MeshData, count: usize) -> Result<Self, SampleError> {
        Self::sample_with(
            mesh,
            count,
            &default_palette(),
            PointsMaterial::default(),
            &mut rand::thread_rng(),
        )
    }

    pub fn sample_with(
        mesh: &MeshData,
        count: usize,
        palette: &[Color],
        material: PointsMaterial,
        rng: &mut impl Rng,
    ) -> Result<Self, SampleError> {
        let sampler = MeshSurfaceSampler::build(mesh)?;
        let mut positions = Vec::with_capacity(count * 3);
        let mut colors = Vec::with_capacity(count * 3);
        for _ in 0..count {
            let point = sampler.sample(rng);
            positions.extend([point.x, point.y, point.z]);
            let color = if palette.is_empty() {
                Color::WHITE
            } else {
                palette[rng.gen_range(0..palette.len())]
            };
            colors.extend(color.to_array());
        }
        Ok(Self {
            positions,
            colors,
            material,
        })
    }

    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = ([f32; 3], [f32; 3])> + '_ {
        self.positions
            .chunks_exact(3)
            .zip(self.colors.chunks_exact(3))
            .map(|(p, c)| ([p[0], p[1], p[2]], [c[0], c[1], c[2]]))
    }
}
