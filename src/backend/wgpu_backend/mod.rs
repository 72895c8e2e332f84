//! wgpu device implementation
//!
//! Wraps an externally created `wgpu::Device` and `wgpu::Queue`; device and
//! adapter setup belong to the application. Pixel shader bytecode is
//! precompiled SPIR-V.

use crate::backend::traits::*;
use crate::backend::types::*;
use parking_lot::Mutex;
use std::collections::HashMap;

/// SPIR-V magic number in the blob's native endianness.
const SPIRV_MAGIC: [u8; 4] = 0x0723_0203u32.to_le_bytes();

/// Live wgpu objects, keyed by the ids handed out as handles.
#[derive(Default)]
struct WgpuResources {
    textures: HashMap<u64, (wgpu::Texture, TextureFormat)>,
    texture_views: HashMap<u64, wgpu::TextureView>,
    samplers: HashMap<u64, wgpu::Sampler>,
    shaders: HashMap<u64, wgpu::ShaderModule>,
    next_texture_id: u64,
    next_view_id: u64,
    next_sampler_id: u64,
    next_shader_id: u64,
}

/// wgpu implementation of [`RenderDevice`]
pub struct WgpuDevice {
    id: DeviceId,
    device: wgpu::Device,
    queue: wgpu::Queue,
    feature_level: FeatureLevel,
    resources: Mutex<WgpuResources>,
}

impl WgpuDevice {
    /// Wrap an externally created device and queue.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        // WebGL2-class adapters expose no fragment-stage storage buffers and
        // cannot run arbitrary shader blobs.
        let feature_level = if device.limits().max_storage_buffers_per_shader_stage == 0 {
            FeatureLevel::Downlevel
        } else {
            FeatureLevel::Full
        };

        log::debug!("WgpuDevice created, feature level {:?}", feature_level);

        Self {
            id: DeviceId::next(),
            device,
            queue,
            feature_level,
            resources: Mutex::new(WgpuResources::default()),
        }
    }

    /// Access the wrapped wgpu device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Access the wrapped wgpu queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Run a closure against the wgpu texture view behind a handle.
    ///
    /// Used when binding factory-built textures into bind groups.
    pub fn with_texture_view<R>(
        &self,
        view: TextureViewHandle,
        f: impl FnOnce(&wgpu::TextureView) -> R,
    ) -> Option<R> {
        self.resources.lock().texture_views.get(&view.0).map(f)
    }

    /// Run a closure against the wgpu shader module behind a handle.
    pub fn with_shader_module<R>(
        &self,
        shader: PixelShaderHandle,
        f: impl FnOnce(&wgpu::ShaderModule) -> R,
    ) -> Option<R> {
        self.resources.lock().shaders.get(&shader.0).map(f)
    }

    fn convert_texture_format(format: TextureFormat) -> wgpu::TextureFormat {
        match format {
            TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
            TextureFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            TextureFormat::Bgra8Unorm => wgpu::TextureFormat::Bgra8Unorm,
            TextureFormat::Bgra8UnormSrgb => wgpu::TextureFormat::Bgra8UnormSrgb,
            TextureFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
            TextureFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
        }
    }

    fn convert_texture_usage(usage: TextureUsage) -> wgpu::TextureUsages {
        let mut result = wgpu::TextureUsages::empty();
        if usage.contains(TextureUsage::COPY_SRC) {
            result |= wgpu::TextureUsages::COPY_SRC;
        }
        if usage.contains(TextureUsage::COPY_DST) {
            result |= wgpu::TextureUsages::COPY_DST;
        }
        if usage.contains(TextureUsage::TEXTURE_BINDING) {
            result |= wgpu::TextureUsages::TEXTURE_BINDING;
        }
        if usage.contains(TextureUsage::RENDER_ATTACHMENT) {
            result |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }
        result
    }

    fn convert_filter_mode(mode: FilterMode) -> wgpu::FilterMode {
        match mode {
            FilterMode::Nearest => wgpu::FilterMode::Nearest,
            FilterMode::Linear => wgpu::FilterMode::Linear,
        }
    }

    fn convert_address_mode(mode: AddressMode) -> wgpu::AddressMode {
        match mode {
            AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
            AddressMode::Repeat => wgpu::AddressMode::Repeat,
            AddressMode::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
        }
    }
}

impl RenderDevice for WgpuDevice {
    fn device_id(&self) -> DeviceId {
        self.id
    }

    fn feature_level(&self) -> FeatureLevel {
        self.feature_level
    }

    fn create_texture(&self, desc: &TextureDescriptor) -> DeviceResult<TextureHandle> {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: desc.label.as_deref(),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: desc.mip_levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::convert_texture_format(desc.format),
            usage: Self::convert_texture_usage(desc.usage),
            view_formats: &[],
        });

        let mut resources = self.resources.lock();
        let id = resources.next_texture_id;
        resources.next_texture_id += 1;
        resources.textures.insert(id, (texture, desc.format));

        Ok(TextureHandle(id))
    }

    fn create_texture_view(&self, texture: TextureHandle) -> DeviceResult<TextureViewHandle> {
        let mut resources = self.resources.lock();
        let (tex, _) = resources
            .textures
            .get(&texture.0)
            .ok_or(DeviceError::UnknownHandle)?;

        let view = tex.create_view(&wgpu::TextureViewDescriptor::default());

        let id = resources.next_view_id;
        resources.next_view_id += 1;
        resources.texture_views.insert(id, view);

        Ok(TextureViewHandle(id))
    }

    fn write_texture(&self, texture: TextureHandle, data: &[u8], width: u32, height: u32) {
        let resources = self.resources.lock();
        if let Some((tex, format)) = resources.textures.get(&texture.0) {
            self.queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: tex,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                data,
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(width * format.bytes_per_pixel()),
                    rows_per_image: Some(height),
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
        }
    }

    fn create_sampler(&self, desc: &SamplerDescriptor) -> DeviceResult<SamplerHandle> {
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: desc.label.as_deref(),
            address_mode_u: Self::convert_address_mode(desc.address_mode_u),
            address_mode_v: Self::convert_address_mode(desc.address_mode_v),
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: Self::convert_filter_mode(desc.mag_filter),
            min_filter: Self::convert_filter_mode(desc.min_filter),
            mipmap_filter: Self::convert_filter_mode(desc.mipmap_filter),
            ..Default::default()
        });

        let mut resources = self.resources.lock();
        let id = resources.next_sampler_id;
        resources.next_sampler_id += 1;
        resources.samplers.insert(id, sampler);

        Ok(SamplerHandle(id))
    }

    fn create_pixel_shader(
        &self,
        label: Option<&str>,
        bytecode: &[u8],
    ) -> DeviceResult<PixelShaderHandle> {
        if bytecode.len() < 4 || bytecode.len() % 4 != 0 {
            return Err(DeviceError::InvalidShaderBytecode(format!(
                "blob length {} is not a whole number of SPIR-V words",
                bytecode.len()
            )));
        }
        if bytecode[0..4] != SPIRV_MAGIC {
            return Err(DeviceError::InvalidShaderBytecode(
                "missing SPIR-V magic number".into(),
            ));
        }

        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label,
            source: wgpu::util::make_spirv(bytecode),
        });

        let mut resources = self.resources.lock();
        let id = resources.next_shader_id;
        resources.next_shader_id += 1;
        resources.shaders.insert(id, module);

        Ok(PixelShaderHandle(id))
    }

    fn destroy_texture(&self, texture: TextureHandle) {
        if let Some((tex, _)) = self.resources.lock().textures.remove(&texture.0) {
            tex.destroy();
        }
    }

    fn destroy_texture_view(&self, view: TextureViewHandle) {
        self.resources.lock().texture_views.remove(&view.0);
    }

    fn destroy_sampler(&self, sampler: SamplerHandle) {
        self.resources.lock().samplers.remove(&sampler.0);
    }

    fn destroy_pixel_shader(&self, shader: PixelShaderHandle) {
        self.resources.lock().shaders.remove(&shader.0);
    }
}
