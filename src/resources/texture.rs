//! Texture loading and upload

use crate::backend::*;
use crate::resources::ResourceError;
use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;

/// Decoded CPU-side texture data
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub data: Vec<u8>,
    pub name: String,
}

impl TextureData {
    /// Load and decode a texture from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ResourceError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let img = image::open(path).map_err(|source| match source {
            image::ImageError::IoError(source) => ResourceError::Io {
                path: path.to_path_buf(),
                source,
            },
            source => ResourceError::ImageDecode {
                name: name.clone(),
                source,
            },
        })?;
        Ok(Self::from_image(img, &name))
    }

    /// Decode a texture from in-memory bytes
    pub fn from_bytes(bytes: &[u8], name: &str) -> Result<Self, ResourceError> {
        let img = image::load_from_memory(bytes).map_err(|source| ResourceError::ImageDecode {
            name: name.to_string(),
            source,
        })?;
        Ok(Self::from_image(img, name))
    }

    fn from_image(img: DynamicImage, name: &str) -> Self {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        Self {
            width,
            height,
            format: TextureFormat::Rgba8UnormSrgb,
            data: rgba.into_raw(),
            name: name.to_string(),
        }
    }

    /// Create a 1x1 solid color texture
    pub fn solid_color(color: [u8; 4], name: &str) -> Self {
        Self {
            width: 1,
            height: 1,
            format: TextureFormat::Rgba8UnormSrgb,
            data: color.to_vec(),
            name: name.to_string(),
        }
    }

    /// Create a default white texture
    pub fn white() -> Self {
        Self::solid_color([255, 255, 255, 255], "white")
    }
}

/// Uploaded GPU texture with its shader resource view.
///
/// Owns its device handles; the texture and view are destroyed when the last
/// `Arc` drops, so evicting a cache entry releases GPU memory once no effect
/// still binds it.
pub struct GpuTexture {
    device: Arc<dyn RenderDevice>,
    handle: TextureHandle,
    view: TextureViewHandle,
    sampler: SamplerHandle,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub name: String,
}

impl GpuTexture {
    /// Create and upload a texture to the device
    pub fn create(
        device: &Arc<dyn RenderDevice>,
        data: &TextureData,
    ) -> Result<Arc<Self>, ResourceError> {
        let handle = device.create_texture(&TextureDescriptor {
            label: Some(data.name.clone()),
            width: data.width,
            height: data.height,
            mip_levels: 1,
            format: data.format,
            usage: TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
        })?;

        let view = device.create_texture_view(handle)?;
        let sampler = device.create_sampler(&SamplerDescriptor {
            label: Some(data.name.clone()),
            ..Default::default()
        })?;
        device.write_texture(handle, &data.data, data.width, data.height);

        Ok(Arc::new(Self {
            device: device.clone(),
            handle,
            view,
            sampler,
            width: data.width,
            height: data.height,
            format: data.format,
            name: data.name.clone(),
        }))
    }

    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    /// The shader resource view over this texture
    pub fn view(&self) -> TextureViewHandle {
        self.view
    }

    /// The default sampler created alongside this texture
    pub fn sampler(&self) -> SamplerHandle {
        self.sampler
    }
}

impl Drop for GpuTexture {
    fn drop(&mut self) {
        self.device.destroy_sampler(self.sampler);
        self.device.destroy_texture_view(self.view);
        self.device.destroy_texture(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_from_bytes_decodes_rgba() {
        let data = TextureData::from_bytes(&encode_png(4, 2), "checker").unwrap();
        assert_eq!(data.width, 4);
        assert_eq!(data.height, 2);
        assert_eq!(data.data.len(), 4 * 2 * 4);
        assert_eq!(data.format, TextureFormat::Rgba8UnormSrgb);
    }

    #[test]
    fn test_from_bytes_rejects_junk() {
        let result = TextureData::from_bytes(b"definitely not an image", "junk");
        assert!(matches!(result, Err(ResourceError::ImageDecode { .. })));
    }

    #[test]
    fn test_solid_color_is_one_pixel() {
        let data = TextureData::white();
        assert_eq!((data.width, data.height), (1, 1));
        assert_eq!(data.data, vec![255, 255, 255, 255]);
    }

    #[test]
    fn test_gpu_texture_releases_handles_on_drop() {
        let dummy = Arc::new(crate::backend::DummyDevice::new());
        let device: Arc<dyn RenderDevice> = dummy.clone();

        let texture = GpuTexture::create(&device, &TextureData::white()).unwrap();
        assert_eq!(dummy.live_textures(), 1);
        assert_eq!(dummy.views_created(), 1);
        assert_eq!(dummy.samplers_created(), 1);

        drop(texture);
        assert_eq!(dummy.live_textures(), 0);
    }
}
