//! The caching effect factory
//!
//! Resolves declarative material descriptions into ready-to-bind effects,
//! textures, and compiled pixel shaders, de-duplicating by name. Factory
//! state is shared per device: every `EffectFactory` constructed on the same
//! device sees the same caches.

mod pool;

pub use pool::SharedResourcePool;

use crate::backend::{DeviceId, FeatureLevel, RenderDevice};
use crate::resources::{
    read_shader_blob, Effect, EffectInfo, GpuTexture, PixelShader, ResourceError, ShaderEffectInfo,
    ShaderVariant, TextureData,
};
use crate::FactoryOptions;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use thiserror::Error;

/// Factory error type
#[derive(Error, Debug)]
pub enum FactoryError {
    #[error("Resource name must not be empty")]
    InvalidName,
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// Global pool of per-device factory state.
static FACTORY_POOL: OnceLock<SharedResourcePool<DeviceId, FactoryShared>> = OnceLock::new();

fn factory_pool() -> &'static SharedResourcePool<DeviceId, FactoryShared> {
    FACTORY_POOL.get_or_init(SharedResourcePool::new)
}

/// The three name-keyed caches, behind one coarse lock.
#[derive(Default)]
struct ResourceCaches {
    effects: HashMap<String, Arc<Effect>>,
    textures: HashMap<String, Arc<GpuTexture>>,
    shaders: HashMap<String, Arc<PixelShader>>,
}

/// Per-device shared factory state. At most one exists per device, no matter
/// how many public factory instances are constructed on it.
struct FactoryShared {
    device: Arc<dyn RenderDevice>,
    caches: Mutex<ResourceCaches>,
    sharing: AtomicBool,
    search_directory: Mutex<Option<PathBuf>>,
}

/// Caching factory for effects, textures, and pixel shaders.
pub struct EffectFactory {
    shared: Arc<FactoryShared>,
}

impl EffectFactory {
    /// Create a factory on a device, attaching to the device's shared caches.
    pub fn new(device: Arc<dyn RenderDevice>) -> Self {
        let shared = factory_pool().demand_create(device.device_id(), || {
            log::debug!("creating factory state for {:?}", device.device_id());
            Arc::new(FactoryShared {
                device: device.clone(),
                caches: Mutex::new(ResourceCaches::default()),
                sharing: AtomicBool::new(true),
                search_directory: Mutex::new(None),
            })
        });
        Self { shared }
    }

    /// Create a factory and apply [`FactoryOptions`].
    ///
    /// Options land on the shared per-device state, so they affect every
    /// factory on this device.
    pub fn with_options(device: Arc<dyn RenderDevice>, options: FactoryOptions) -> Self {
        let factory = Self::new(device);
        factory.set_sharing(options.sharing);
        *factory.shared.search_directory.lock() = options.search_directory;
        factory
    }

    /// The device this factory creates resources on
    pub fn device(&self) -> &Arc<dyn RenderDevice> {
        &self.shared.device
    }

    /// Enable or disable instance sharing.
    ///
    /// With sharing off, every call builds a fresh object and the caches are
    /// neither consulted nor filled.
    pub fn set_sharing(&self, enabled: bool) {
        self.shared.sharing.store(enabled, Ordering::Relaxed);
    }

    /// Set the directory relative resource names resolve against.
    pub fn set_search_directory<P: Into<PathBuf>>(&self, directory: P) {
        *self.shared.search_directory.lock() = Some(directory.into());
    }

    /// Drop every cached effect, texture, and shader.
    ///
    /// GPU resources are released once the last outstanding `Arc` drops.
    pub fn release_cache(&self) {
        log::debug!("releasing factory caches");
        let mut caches = self.shared.caches.lock();
        caches.effects.clear();
        caches.textures.clear();
        caches.shaders.clear();
    }

    /// Build a basic lit effect from a material description.
    ///
    /// Named effects are cached; an empty name always builds a fresh one.
    pub fn create_effect(&self, info: &EffectInfo) -> Result<Arc<Effect>, FactoryError> {
        if self.sharing() && !info.name.is_empty() {
            if let Some(effect) = self.shared.caches.lock().effects.get(&info.name) {
                log::debug!("effect cache hit: {}", info.name);
                return Ok(effect.clone());
            }
        }

        let mut effect = Effect::new(info, true, true);

        if let Some(path) = &info.diffuse_texture {
            let texture = self.create_texture_at(path)?;
            effect.set_texture(0, texture);
        }

        Ok(self.insert_effect(&info.name, Arc::new(effect)))
    }

    /// Build an effect driven by a named pixel shader.
    ///
    /// The shader name selects the lighting model (see [`ShaderVariant`]);
    /// unrecognized names load a custom blob, substituting the fallback blob
    /// on downlevel devices.
    pub fn create_shader_effect(
        &self,
        info: &ShaderEffectInfo,
    ) -> Result<Arc<Effect>, FactoryError> {
        let name = &info.base.name;
        if self.sharing() && !name.is_empty() {
            if let Some(effect) = self.shared.caches.lock().effects.get(name) {
                log::debug!("effect cache hit: {name}");
                return Ok(effect.clone());
            }
        }

        let mut lighting = true;
        let mut allow_specular = true;
        let mut custom_shader = None;

        // An absent or empty shader name builds the default lit effect.
        if let Some(shader_path) = info
            .pixel_shader
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
        {
            let shader_name = shader_path.to_string_lossy();
            let variant = ShaderVariant::from_shader_name(&shader_name);
            lighting = variant.lighting_enabled();
            allow_specular = variant.allows_specular();

            if let ShaderVariant::Custom { fallback } = variant {
                custom_shader = Some(match self.shared.device.feature_level() {
                    FeatureLevel::Downlevel => fallback,
                    FeatureLevel::Full => shader_name.into_owned(),
                });
            }
        }

        let mut effect = Effect::new(&info.base, lighting, allow_specular);

        if let Some(shader_name) = custom_shader {
            let shader = self.create_pixel_shader(&shader_name)?;
            effect.set_pixel_shader(shader);
        }

        if let Some(path) = &info.base.diffuse_texture {
            let texture = self.create_texture_at(path)?;
            effect.set_texture(0, texture);
        }
        for (slot, path) in info.extra_textures.iter().enumerate() {
            if let Some(path) = path {
                let texture = self.create_texture_at(path)?;
                effect.set_texture(slot + 1, texture);
            }
        }

        Ok(self.insert_effect(name, Arc::new(effect)))
    }

    /// Decode and upload a texture, cached by name.
    pub fn create_texture(&self, name: &str) -> Result<Arc<GpuTexture>, FactoryError> {
        if name.is_empty() {
            return Err(FactoryError::InvalidName);
        }
        self.create_texture_at(Path::new(name))
    }

    /// Load a precompiled shader blob and register it, cached by name.
    pub fn create_pixel_shader(&self, name: &str) -> Result<Arc<PixelShader>, FactoryError> {
        if name.is_empty() {
            return Err(FactoryError::InvalidName);
        }

        if self.sharing() {
            if let Some(shader) = self.shared.caches.lock().shaders.get(name) {
                log::debug!("shader cache hit: {name}");
                return Ok(shader.clone());
            }
        }

        let path = self.resolve_path(Path::new(name));
        log::debug!("loading pixel shader {name} from {}", path.display());
        let blob = read_shader_blob(&path)?;
        let shader = PixelShader::create(&self.shared.device, name, &blob)?;

        if self.sharing() {
            let mut caches = self.shared.caches.lock();
            Ok(caches.shaders.entry(name.to_string()).or_insert(shader).clone())
        } else {
            Ok(shader)
        }
    }

    fn create_texture_at(&self, name: &Path) -> Result<Arc<GpuTexture>, FactoryError> {
        let key = name.to_string_lossy().into_owned();

        if self.sharing() {
            if let Some(texture) = self.shared.caches.lock().textures.get(&key) {
                log::debug!("texture cache hit: {key}");
                return Ok(texture.clone());
            }
        }

        let path = self.resolve_path(name);
        log::debug!("loading texture {key} from {}", path.display());
        let data = TextureData::from_file(&path)?;
        let texture = GpuTexture::create(&self.shared.device, &data)?;

        if self.sharing() && !key.is_empty() {
            let mut caches = self.shared.caches.lock();
            Ok(caches.textures.entry(key).or_insert(texture).clone())
        } else {
            Ok(texture)
        }
    }

    fn insert_effect(&self, name: &str, effect: Arc<Effect>) -> Arc<Effect> {
        if self.sharing() && !name.is_empty() {
            let mut caches = self.shared.caches.lock();
            // First insert wins when two builds race, so later callers all
            // observe the same instance.
            caches
                .effects
                .entry(name.to_string())
                .or_insert(effect)
                .clone()
        } else {
            effect
        }
    }

    fn sharing(&self) -> bool {
        self.shared.sharing.load(Ordering::Relaxed)
    }

    fn resolve_path(&self, name: &Path) -> PathBuf {
        if name.is_absolute() {
            return name.to_path_buf();
        }
        match &*self.shared.search_directory.lock() {
            Some(directory) => directory.join(name),
            None => name.to_path_buf(),
        }
    }
}
