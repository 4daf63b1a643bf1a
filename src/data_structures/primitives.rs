//! Generated primitives and the fallback used when building one fails.

use std::f32::consts::PI;

use crate::{
    data_structures::{
        material::Material,
        mesh::{Mesh, MeshData},
    },
    error::{GeometryError, LoadWarning, Outcome},
};

fn positive(what: &'static str, value: f32) -> Result<f32, GeometryError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(GeometryError::NonPositive { what, value })
    }
}

fn segments(what: &'static str, min: u32, value: u32) -> Result<u32, GeometryError> {
    if value >= min {
        Ok(value)
    } else {
        Err(GeometryError::TooFewSegments { what, min, value })
    }
}

/// Axis-aligned box centred on the origin with one quad (two triangles) per face.
pub fn box_geometry(width: f32, height: f32, depth: f32) -> Result<MeshData, GeometryError> {
    let hx = positive("box width", width)? * 0.5;
    let hy = positive("box height", height)? * 0.5;
    let hz = positive("box depth", depth)? * 0.5;

    // normal, then the four corners counter-clockwise seen from outside
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        ([1.0, 0.0, 0.0], [[hx, -hy, hz], [hx, -hy, -hz], [hx, hy, -hz], [hx, hy, hz]]),
        ([-1.0, 0.0, 0.0], [[-hx, -hy, -hz], [-hx, -hy, hz], [-hx, hy, hz], [-hx, hy, -hz]]),
        ([0.0, 1.0, 0.0], [[-hx, hy, hz], [hx, hy, hz], [hx, hy, -hz], [-hx, hy, -hz]]),
        ([0.0, -1.0, 0.0], [[-hx, -hy, -hz], [hx, -hy, -hz], [hx, -hy, hz], [-hx, -hy, hz]]),
        ([0.0, 0.0, 1.0], [[-hx, -hy, hz], [hx, -hy, hz], [hx, hy, hz], [-hx, hy, hz]]),
        ([0.0, 0.0, -1.0], [[hx, -hy, -hz], [-hx, -hy, -hz], [-hx, hy, -hz], [hx, hy, -hz]]),
    ];

    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, corners) in faces {
        let base = positions.len() as u32;
        positions.extend(corners);
        normals.extend([normal; 4]);
        indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    Ok(MeshData::new(positions, normals, Some(indices)))
}

/// UV sphere. Pole rows produce a single triangle per segment.
pub fn sphere_geometry(
    radius: f32,
    width_segments: u32,
    height_segments: u32,
) -> Result<MeshData, GeometryError> {
    let radius = positive("sphere radius", radius)?;
    let width_segments = segments("sphere width", 3, width_segments)?;
    let height_segments = segments("sphere height", 2, height_segments)?;

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        let theta = v * PI;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let phi = u * 2.0 * PI;
            let normal = [
                -phi.cos() * theta.sin(),
                theta.cos(),
                phi.sin() * theta.sin(),
            ];
            positions.push([normal[0] * radius, normal[1] * radius, normal[2] * radius]);
            normals.push(normal);
        }
    }

    let row = width_segments + 1;
    let mut indices = Vec::new();
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;
            if iy != 0 {
                indices.extend([a, b, d]);
            }
            if iy != height_segments - 1 {
                indices.extend([b, c, d]);
            }
        }
    }
    Ok(MeshData::new(positions, normals, Some(indices)))
}

/// The primitive substituted for a mesh that could not be built.
pub fn default_primitive(name: &str) -> Mesh {
    let geometry = sphere_geometry(0.3, 64, 64).unwrap_or_default();
    Mesh {
        name: name.to_string(),
        geometry,
        material: Material::standard(0xff00ff),
    }
}

/// Builds a mesh, or the default primitive if the geometry is invalid.
pub fn build_mesh_or_default(
    name: &str,
    geometry: Result<MeshData, GeometryError>,
    material: Material,
) -> Outcome<Mesh> {
    match geometry {
        Ok(geometry) => Outcome::clean(Mesh {
            name: name.to_string(),
            geometry,
            material,
        }),
        Err(e) => {
            log::warn!("Could not build mesh {name}, substituting the default primitive: {e}");
            Outcome::with_warnings(
                default_primitive(name),
                vec![LoadWarning::PrimitiveFallback {
                    name: name.to_string(),
                    reason: e.to_string(),
                }],
            )
        }
    }
}
