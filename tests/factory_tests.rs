//! Integration tests for the effect factory.
//!
//! All tests run against [`DummyDevice`], which counts resource creation so
//! cache behavior is observable without GPU hardware. On-disk fixtures
//! (texture images and shader blobs) live in per-test temp directories.

use rstest::rstest;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use render_effects::{
    DummyDevice, EffectFactory, EffectInfo, FactoryError, FactoryOptions, RenderDevice,
    ShaderEffectInfo,
};

const SPIRV_MAGIC: [u8; 4] = [0x03, 0x02, 0x23, 0x07];

fn write_shader_blob(dir: &Path, name: &str) {
    let mut blob = SPIRV_MAGIC.to_vec();
    blob.extend_from_slice(&[0u8; 16]);
    fs::write(dir.join(name), blob).unwrap();
}

fn write_texture_png(dir: &Path, name: &str) {
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 255, 255]));
    img.save(dir.join(name)).unwrap();
}

/// Factory over a fresh dummy device with a temp search directory.
fn test_factory() -> (Arc<DummyDevice>, EffectFactory, TempDir) {
    let dummy = Arc::new(DummyDevice::new());
    let device: Arc<dyn RenderDevice> = dummy.clone();
    let factory = EffectFactory::new(device);
    let dir = TempDir::new().unwrap();
    factory.set_search_directory(dir.path());
    (dummy, factory, dir)
}

// ============================================================================
// Effect cache behavior
// ============================================================================

#[test]
fn test_named_effect_is_shared() {
    let (_dummy, factory, _dir) = test_factory();
    let info = EffectInfo::new("wall").with_diffuse(glam::Vec3::new(0.8, 0.2, 0.2));

    let first = factory.create_effect(&info).unwrap();
    let second = factory.create_effect(&info).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_unnamed_effect_is_never_cached() {
    let (_dummy, factory, _dir) = test_factory();
    let info = EffectInfo::default();

    let first = factory.create_effect(&info).unwrap();
    let second = factory.create_effect(&info).unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn test_sharing_disabled_builds_fresh_instances() {
    let (_dummy, factory, _dir) = test_factory();
    factory.set_sharing(false);
    let info = EffectInfo::new("wall");

    let first = factory.create_effect(&info).unwrap();
    let second = factory.create_effect(&info).unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn test_release_cache_forgets_effects() {
    let (_dummy, factory, _dir) = test_factory();
    let info = EffectInfo::new("wall");

    let first = factory.create_effect(&info).unwrap();
    factory.release_cache();
    let second = factory.create_effect(&info).unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn test_factories_on_same_device_share_caches() {
    let dummy = Arc::new(DummyDevice::new());
    let device: Arc<dyn RenderDevice> = dummy.clone();
    let factory_a = EffectFactory::new(device.clone());
    let factory_b = EffectFactory::new(device);
    let info = EffectInfo::new("wall");

    let first = factory_a.create_effect(&info).unwrap();
    let second = factory_b.create_effect(&info).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_factories_on_different_devices_do_not_share() {
    let device_a: Arc<dyn RenderDevice> = Arc::new(DummyDevice::new());
    let device_b: Arc<dyn RenderDevice> = Arc::new(DummyDevice::new());
    let factory_a = EffectFactory::new(device_a);
    let factory_b = EffectFactory::new(device_b);
    let info = EffectInfo::new("wall");

    let first = factory_a.create_effect(&info).unwrap();
    let second = factory_b.create_effect(&info).unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn test_options_disable_sharing() {
    let device: Arc<dyn RenderDevice> = Arc::new(DummyDevice::new());
    let factory = EffectFactory::with_options(
        device,
        FactoryOptions {
            sharing: false,
            search_directory: None,
        },
    );
    let info = EffectInfo::new("wall");

    let first = factory.create_effect(&info).unwrap();
    let second = factory.create_effect(&info).unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
}

// ============================================================================
// Texture path
// ============================================================================

#[test]
fn test_texture_is_loaded_once_and_shared() {
    let (dummy, factory, dir) = test_factory();
    write_texture_png(dir.path(), "stone.png");

    let first = factory.create_texture("stone.png").unwrap();
    let second = factory.create_texture("stone.png").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(dummy.textures_created(), 1);
    assert_eq!(first.width, 2);
    assert_eq!(first.height, 2);
}

#[test]
fn test_effect_texture_shares_the_texture_cache() {
    let (dummy, factory, dir) = test_factory();
    write_texture_png(dir.path(), "stone.png");

    let info = EffectInfo::new("wall").with_diffuse_texture("stone.png");
    let effect = factory.create_effect(&info).unwrap();
    let texture = factory.create_texture("stone.png").unwrap();

    assert!(effect.textured());
    assert!(Arc::ptr_eq(effect.texture(0).unwrap(), &texture));
    assert_eq!(dummy.textures_created(), 1);
}

#[test]
fn test_missing_texture_file_is_an_error() {
    let (_dummy, factory, _dir) = test_factory();
    let result = factory.create_texture("does_not_exist.png");
    assert!(matches!(result, Err(FactoryError::Resource(_))));
}

#[test]
fn test_undecodable_texture_is_an_error() {
    let (_dummy, factory, dir) = test_factory();
    fs::write(dir.path().join("junk.png"), b"not an image").unwrap();
    let result = factory.create_texture("junk.png");
    assert!(matches!(result, Err(FactoryError::Resource(_))));
}

#[rstest]
#[case::texture(true)]
#[case::shader(false)]
fn test_empty_resource_name_is_rejected(#[case] texture: bool) {
    let (_dummy, factory, _dir) = test_factory();
    let result = if texture {
        factory.create_texture("").map(|_| ())
    } else {
        factory.create_pixel_shader("").map(|_| ())
    };
    assert!(matches!(result, Err(FactoryError::InvalidName)));
}

#[test]
fn test_release_cache_frees_unused_gpu_textures() {
    let (dummy, factory, dir) = test_factory();
    write_texture_png(dir.path(), "stone.png");

    let texture = factory.create_texture("stone.png").unwrap();
    assert_eq!(dummy.live_textures(), 1);

    factory.release_cache();
    // Still alive: the caller holds the last Arc.
    assert_eq!(dummy.live_textures(), 1);

    drop(texture);
    assert_eq!(dummy.live_textures(), 0);
}

// ============================================================================
// Pixel shader path
// ============================================================================

#[test]
fn test_pixel_shader_is_loaded_once_and_shared() {
    let (dummy, factory, dir) = test_factory();
    write_shader_blob(dir.path(), "wood_toon.spv");

    let first = factory.create_pixel_shader("wood_toon.spv").unwrap();
    let second = factory.create_pixel_shader("wood_toon.spv").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(dummy.shaders_created(), 1);
}

#[test]
fn test_missing_shader_blob_is_an_error() {
    let (_dummy, factory, _dir) = test_factory();
    let result = factory.create_pixel_shader("missing.spv");
    assert!(matches!(result, Err(FactoryError::Resource(_))));
}

#[test]
fn test_device_shader_failure_is_propagated() {
    let (dummy, factory, dir) = test_factory();
    write_shader_blob(dir.path(), "wood_toon.spv");

    dummy.set_fail_shader_creation(true);
    let result = factory.create_pixel_shader("wood_toon.spv");
    assert!(matches!(result, Err(FactoryError::Resource(_))));
}

// ============================================================================
// Shader effects and the variant table
// ============================================================================

#[rstest]
#[case::lambert("brick_lambert.spv", true, false)]
#[case::phong("brick_phong.spv", true, true)]
#[case::unlit("brick_unlit.spv", false, true)]
fn test_builtin_variants_need_no_blob(
    #[case] shader: &str,
    #[case] lighting: bool,
    #[case] specular: bool,
) {
    let (dummy, factory, _dir) = test_factory();
    let mut info = ShaderEffectInfo::new("brick").with_pixel_shader(shader);
    info.base.specular_color = glam::Vec3::ONE;

    let effect = factory.create_shader_effect(&info).unwrap();

    assert_eq!(effect.lighting_enabled(), lighting);
    assert_eq!(effect.specular_enabled(), specular);
    assert!(effect.pixel_shader().is_none());
    // Built-in variants never touch the filesystem or the device shader path.
    assert_eq!(dummy.shaders_created(), 0);
}

#[test]
fn test_unlit_variant_still_allows_specular_color() {
    // Unlit disables lighting but does not forbid specular; only the
    // lambert variant forbids specular.
    let (_dummy, factory, _dir) = test_factory();
    let mut info = ShaderEffectInfo::new("glow").with_pixel_shader("glow_unlit.spv");
    info.base.specular_color = glam::Vec3::ONE;

    let effect = factory.create_shader_effect(&info).unwrap();
    assert!(!effect.lighting_enabled());
    assert!(effect.specular_enabled());
}

#[test]
fn test_custom_shader_loaded_on_full_device() {
    let (dummy, factory, dir) = test_factory();
    write_shader_blob(dir.path(), "wood_toon.spv");

    let info = ShaderEffectInfo::new("wood").with_pixel_shader("wood_toon.spv");
    let effect = factory.create_shader_effect(&info).unwrap();

    let shader = effect.pixel_shader().expect("custom shader bound");
    assert_eq!(shader.name, "wood_toon.spv");
    assert_eq!(dummy.shaders_created(), 1);
}

#[test]
fn test_downlevel_device_uses_fallback_blob() {
    let dummy = Arc::new(DummyDevice::downlevel());
    let device: Arc<dyn RenderDevice> = dummy.clone();
    let factory = EffectFactory::new(device);
    let dir = TempDir::new().unwrap();
    factory.set_search_directory(dir.path());
    // Only the fallback exists; the custom blob must not be requested.
    write_shader_blob(dir.path(), "toon.spv");

    let info = ShaderEffectInfo::new("wood").with_pixel_shader("wood_toon.spv");
    let effect = factory.create_shader_effect(&info).unwrap();

    let shader = effect.pixel_shader().expect("fallback shader bound");
    assert_eq!(shader.name, "toon.spv");
}

#[test]
fn test_no_pixel_shader_builds_default_lit_effect() {
    let (dummy, factory, _dir) = test_factory();
    let mut info = ShaderEffectInfo::new("plain");
    info.base.specular_color = glam::Vec3::ONE;

    let effect = factory.create_shader_effect(&info).unwrap();

    assert!(effect.lighting_enabled());
    assert!(effect.specular_enabled());
    assert!(effect.pixel_shader().is_none());
    assert_eq!(dummy.shaders_created(), 0);
}

#[test]
fn test_empty_pixel_shader_name_builds_default_lit_effect() {
    let (dummy, factory, _dir) = test_factory();
    let mut info = ShaderEffectInfo::new("plain").with_pixel_shader("");
    info.base.specular_color = glam::Vec3::ONE;

    let effect = factory.create_shader_effect(&info).unwrap();

    assert!(effect.lighting_enabled());
    assert!(effect.specular_enabled());
    assert!(effect.pixel_shader().is_none());
    assert_eq!(dummy.shaders_created(), 0);
}

#[test]
fn test_extra_textures_fill_upper_slots() {
    let (dummy, factory, dir) = test_factory();
    write_texture_png(dir.path(), "diffuse.png");
    write_texture_png(dir.path(), "normal.png");

    let mut info = ShaderEffectInfo::new("wood")
        .with_pixel_shader("wood_phong.spv")
        .with_texture(3, "normal.png");
    info.base.diffuse_texture = Some("diffuse.png".into());

    let effect = factory.create_shader_effect(&info).unwrap();

    assert!(effect.textured());
    assert_eq!(effect.texture(0).unwrap().name, "diffuse.png");
    assert_eq!(effect.texture(3).unwrap().name, "normal.png");
    assert!(effect.texture(1).is_none());
    assert_eq!(dummy.textures_created(), 2);
}

#[test]
fn test_shader_effects_share_by_name() {
    let (_dummy, factory, _dir) = test_factory();
    let info = ShaderEffectInfo::new("brick").with_pixel_shader("brick_phong.spv");

    let first = factory.create_shader_effect(&info).unwrap();
    let second = factory.create_shader_effect(&info).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
}
