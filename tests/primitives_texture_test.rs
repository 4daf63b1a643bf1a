use model_ngin::{
    LoadWarning, MemorySource,
    data_structures::{
        material::{Color, ColorMap, Material, PointsMaterial},
        primitives::{box_geometry, build_mesh_or_default, default_primitive, sphere_geometry},
        texture::soft_circle_sprite,
    },
    error::GeometryError,
    resources::texture::{load_color_map, texture_url},
};

use crate::common::test_utils::png_bytes;

mod common;

#[test]
fn box_has_six_faces() {
    let cube = box_geometry(2.0, 1.0, 4.0).unwrap();
    assert_eq!(cube.triangle_count(), 12);
    assert!((cube.surface_area() - 2.0 * (2.0 + 8.0 + 4.0)).abs() < 1e-4);
}

#[test]
fn sphere_area_approaches_the_analytic_one() {
    let sphere = sphere_geometry(1.0, 64, 32).unwrap();
    let exact = 4.0 * std::f32::consts::PI;
    assert!((sphere.surface_area() - exact).abs() / exact < 0.01);
}

#[test]
fn invalid_parameters_are_rejected() {
    assert!(matches!(
        box_geometry(-1.0, 1.0, 1.0),
        Err(GeometryError::NonPositive { what: "box width", .. })
    ));
    assert!(matches!(
        sphere_geometry(1.0, 2, 8),
        Err(GeometryError::TooFewSegments { min: 3, .. })
    ));
    assert!(box_geometry(1.0, f32::NAN, 1.0).is_err());
}

#[test]
fn failed_primitive_becomes_the_default_sphere() {
    let outcome = build_mesh_or_default("crate", box_geometry(0.0, 1.0, 1.0), Material::lambert(0x00ff00));
    assert!(matches!(
        outcome.warnings.as_slice(),
        [LoadWarning::PrimitiveFallback { name, .. }] if name == "crate"
    ));
    let mesh = outcome.value;
    assert_eq!(mesh.name, "crate");
    assert!(matches!(mesh.material, Material::Standard { color, .. } if color == Color::MAGENTA));
    assert_eq!(mesh.geometry, default_primitive("other").geometry);
}

#[test]
fn valid_primitive_keeps_its_material() {
    let outcome = build_mesh_or_default("crate", box_geometry(1.0, 1.0, 1.0), Material::lambert(0x00ff00));
    assert!(outcome.is_clean());
    assert!(matches!(outcome.value.material, Material::Lambert { .. }));
}

#[test]
fn colors_parse_from_css_hex() {
    let color = Color::parse("#FF6767").unwrap();
    assert_eq!(color.to_rgba8(), [0xff, 0x67, 0x67, 0xff]);
    assert_eq!(Color::from_hex(0xff6767), color);
    assert_eq!(Color::parse("FF6767").unwrap(), color);
    assert!(Color::parse("#FF67").is_err());
    assert!(Color::parse("#GG0000").is_err());
}

#[test]
fn colors_keep_their_srgb_components() {
    let grey = Color::from_hex(0x808080);
    assert_eq!(grey.r, 128.0 / 255.0);
    assert_eq!(grey.g, grey.r);
    assert_eq!(grey.to_rgba8(), [0x80, 0x80, 0x80, 0xff]);
}

#[test]
fn soft_circle_is_transparent_outside_the_disc() {
    let sprite = soft_circle_sprite(32);
    assert_eq!(sprite.dimensions(), (32, 32));
    assert_eq!(sprite.get_pixel(0, 0)[3], 0);
    assert_eq!(sprite.get_pixel(31, 0)[3], 0);
    assert!(sprite.get_pixel(16, 16)[3] > 200);
    assert!(sprite.get_pixel(16, 16)[3] > sprite.get_pixel(24, 16)[3]);
}

#[test]
fn soft_circle_carries_its_mask_in_the_grey_level() {
    let sprite = soft_circle_sprite(32);
    for pixel in sprite.pixels() {
        let [r, g, b, a] = pixel.0;
        assert_eq!((r, g, b), (a, a, a));
    }
    assert_eq!(sprite.get_pixel(0, 0)[1], 0);
    assert!(sprite.get_pixel(16, 16)[1] > 200);
}

#[tokio::test]
async fn opaque_greyscale_sprite_keeps_its_mask() {
    // white dot on black, fully opaque like the usual particle images
    let particle = image::RgbaImage::from_fn(8, 8, |x, y| {
        let level = if (3..5).contains(&x) && (3..5).contains(&y) { 255 } else { 0 };
        image::Rgba([level, level, level, 255])
    });
    let source = MemorySource::new().with("10.png", png_bytes(&particle));
    let outcome = load_color_map(&source, "10.png", Color::WHITE).await;

    let ColorMap::Texture(texture) = outcome.value else {
        panic!("particle should have loaded");
    };
    let cutoff = PointsMaterial::default().alpha_test;
    let mask = |x, y| texture.image.get_pixel(x, y)[1] as f32 / 255.0;
    assert!(mask(0, 0) < cutoff);
    assert!(mask(3, 3) > cutoff);
    // alpha alone would keep every texel
    assert_eq!(texture.image.get_pixel(0, 0)[3], 255);
}

#[test]
fn texture_urls_live_below_the_texture_directory() {
    assert_eq!(texture_url("wood.png"), "textures/wood.png");
    assert_eq!(texture_url("/wood.png"), "textures/wood.png");
}

#[tokio::test]
async fn missing_texture_falls_back_to_a_flat_color() {
    let source = MemorySource::new();
    let outcome = load_color_map(&source, &texture_url("missing.png"), Color::from_hex(0x336699)).await;
    assert_eq!(outcome.value, ColorMap::Flat(Color::from_hex(0x336699)));
    assert!(matches!(
        outcome.warnings.as_slice(),
        [LoadWarning::TextureFallback { url, .. }] if url == "textures/missing.png"
    ));
}

#[tokio::test]
async fn texture_is_decoded_when_present() {
    let image = image::RgbaImage::from_pixel(4, 2, image::Rgba([1, 2, 3, 255]));
    let source = MemorySource::new().with("textures/wood.png", png_bytes(&image));
    let outcome = load_color_map(&source, "textures/wood.png", Color::WHITE).await;
    assert!(outcome.is_clean());
    match outcome.value {
        ColorMap::Texture(texture) => {
            assert_eq!(texture.image.dimensions(), (4, 2));
            assert_eq!(texture.image.get_pixel(3, 1), &image::Rgba([1, 2, 3, 255]));
        }
        ColorMap::Flat(_) => panic!("texture should have loaded"),
    }
}

#[tokio::test]
async fn undecodable_texture_falls_back_too() {
    let source = MemorySource::new().with("textures/bad.png", b"not a png".to_vec());
    let outcome = load_color_map(&source, "textures/bad.png", Color::WHITE).await;
    assert!(outcome.value.is_fallback());
    assert_eq!(outcome.warnings.len(), 1);
}
