//! Material descriptions.
//!
//! These are plain data: the shading itself belongs to the pipelines. The
//! variants mirror the material families the teaching scenes use (basic,
//! standard, physical, Phong, Lambert), plus the matcap swap applied to loaded
//! models and the sprite material of point clouds.

use std::sync::Arc;

use anyhow::{Context, anyhow};

/// sRGB colour with components in `0.0..=1.0`, stored as the hex bytes divided
/// by 255 without conversion to linear.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const MAGENTA: Color = Color::rgb(1.0, 0.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// `0xRRGGBB`
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self::rgb(channel(16), channel(8), channel(0))
    }

    /// Parses `#RRGGBB` (the leading `#` is optional).
    pub fn parse(css: &str) -> anyhow::Result<Self> {
        let digits = css.trim().trim_start_matches('#');
        if digits.len() != 6 {
            return Err(anyhow!("expected six hex digits in colour '{css}'"));
        }
        let hex = u32::from_str_radix(digits, 16)
            .with_context(|| format!("invalid hex colour '{css}'"))?;
        Ok(Self::from_hex(hex))
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [to_u8(self.r), to_u8(self.g), to_u8(self.b), 255]
    }
}

/// A decoded image shared between materials.
#[derive(Clone, Debug)]
pub struct ImageTexture {
    pub name: String,
    pub image: Arc<image::RgbaImage>,
}

impl PartialEq for ImageTexture {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.image, &other.image)
    }
}

/// A texture slot: the real image, or the flat colour substituted when the
/// image could not be loaded.
#[derive(Clone, Debug, PartialEq)]
pub enum ColorMap {
    Texture(ImageTexture),
    Flat(Color),
}

impl ColorMap {
    pub fn is_fallback(&self) -> bool {
        matches!(self, ColorMap::Flat(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Blending {
    #[default]
    Normal,
    Additive,
}

/// How the points of a point cloud are drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct PointsMaterial {
    pub size: f32,
    pub vertex_colors: bool,
    pub transparent: bool,
    pub alpha_map: Option<ColorMap>,
    /// Fragments with a lower alpha are discarded.
    pub alpha_test: f32,
    pub depth_write: bool,
    pub blending: Blending,
}

impl Default for PointsMaterial {
    fn default() -> Self {
        Self {
            size: 0.12,
            vertex_colors: true,
            transparent: true,
            alpha_map: None,
            alpha_test: 0.001,
            depth_write: false,
            blending: Blending::Additive,
        }
    }
}

impl PointsMaterial {
    pub fn with_alpha_map(mut self, alpha_map: ColorMap) -> Self {
        self.alpha_map = Some(alpha_map);
        self
    }
}

/// Physically based parameters beyond the standard metallic/roughness set.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicalMaterial {
    pub color: Color,
    pub map: Option<ColorMap>,
    pub metalness: f32,
    pub roughness: f32,
    pub transmission: f32,
    pub ior: f32,
    pub clearcoat: f32,
    pub opacity: f32,
}

impl Default for PhysicalMaterial {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            map: None,
            metalness: 0.0,
            roughness: 1.0,
            transmission: 0.0,
            ior: 1.5,
            clearcoat: 0.0,
            opacity: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Material {
    /// Unlit flat colour.
    Basic { color: Color },
    /// Metallic/roughness PBR, which is also what glTF materials decode to.
    Standard {
        color: Color,
        map: Option<ColorMap>,
        metalness: f32,
        roughness: f32,
    },
    Physical(PhysicalMaterial),
    Phong {
        color: Color,
        specular: Color,
        shininess: f32,
        emissive: Color,
    },
    Lambert { color: Color, emissive: Color },
    /// Lighting baked into a sphere-mapped texture.
    Matcap { matcap: ColorMap },
    Points(PointsMaterial),
}

impl Material {
    pub fn basic(hex: u32) -> Self {
        Material::Basic {
            color: Color::from_hex(hex),
        }
    }

    pub fn standard(hex: u32) -> Self {
        Material::Standard {
            color: Color::from_hex(hex),
            map: None,
            metalness: 0.0,
            roughness: 1.0,
        }
    }

    pub fn phong(hex: u32, shininess: f32) -> Self {
        Material::Phong {
            color: Color::from_hex(hex),
            specular: Color::from_hex(0x111111),
            shininess,
            emissive: Color::from_hex(0x000000),
        }
    }

    pub fn lambert(hex: u32) -> Self {
        Material::Lambert {
            color: Color::from_hex(hex),
            emissive: Color::from_hex(0x000000),
        }
    }

    /// Every texture slot this material reads from.
    pub fn color_maps(&self) -> Vec<&ColorMap> {
        match self {
            Material::Standard { map, .. } => map.iter().collect(),
            Material::Physical(physical) => physical.map.iter().collect(),
            Material::Matcap { matcap } => vec![matcap],
            Material::Points(points) => points.alpha_map.iter().collect(),
            Material::Basic { .. } | Material::Phong { .. } | Material::Lambert { .. } => {
                Vec::new()
            }
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::standard(0xffffff)
    }
}
