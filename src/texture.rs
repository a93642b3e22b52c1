//! Texture loading.

use std::path::Path;

use image::RgbaImage;

use crate::error::{LoadError, Result};
use crate::gpu::handle::take_for_release;
use crate::gpu::{GpuBackend, GpuHandle, Texture, TextureParams};

/// Decodes images and uploads them as RGBA8 textures.
#[derive(Clone, Copy)]
pub struct TextureLoader<'a> {
    gpu: &'a dyn GpuBackend,
}

impl<'a> TextureLoader<'a> {
    /// A loader issuing calls to `gpu`.
    #[must_use]
    pub fn new(gpu: &'a dyn GpuBackend) -> Self {
        Self { gpu }
    }

    /// Decodes the image at `path` and uploads it with
    /// [`TextureParams::MIPMAPPED_REPEAT`].
    ///
    /// The image is always expanded to four channels. With
    /// `flip_vertically` the bottom image row is uploaded first, which is
    /// what GL texture coordinates expect for images stored top-down.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::ImageDecode`] if the file is missing or cannot
    /// be decoded, and [`LoadError::ResourceCreation`] if the backend cannot
    /// allocate a texture.
    pub fn load_texture(&self, path: impl AsRef<Path>, flip_vertically: bool) -> Result<Texture> {
        let path = path.as_ref();
        let label = path.display().to_string();
        let image = image::open(path).map_err(|e| decode_error(&label, &e))?;
        self.upload_image(&label, image.to_rgba8(), flip_vertically)
    }

    /// Like [`load_texture`](Self::load_texture), for an encoded image
    /// already in memory. `label` stands in for the path in logs and errors.
    ///
    /// # Errors
    ///
    /// Same as [`load_texture`](Self::load_texture).
    pub fn load_texture_from_memory(
        &self,
        label: &str,
        bytes: &[u8],
        flip_vertically: bool,
    ) -> Result<Texture> {
        let image = image::load_from_memory(bytes).map_err(|e| decode_error(label, &e))?;
        self.upload_image(label, image.to_rgba8(), flip_vertically)
    }

    /// Uploads raw RGBA8 pixels (`width * height * 4` bytes, first row at the
    /// bottom) with explicit sampler state.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::ResourceCreation`] if `pixels` has the wrong
    /// length or the backend cannot allocate a texture.
    pub fn upload_rgba8(
        &self,
        width: u32,
        height: u32,
        pixels: &[u8],
        params: &TextureParams,
    ) -> Result<Texture> {
        let expected = u64::from(width) * u64::from(height) * 4;
        if u64::try_from(pixels.len()).ok() != Some(expected) {
            return Err(LoadError::ResourceCreation {
                object: Texture::KIND,
                reason: format!(
                    "{width}x{height} RGBA8 needs {expected} bytes, got {}",
                    pixels.len()
                ),
            });
        }

        let raw = self
            .gpu
            .create_texture()
            .map_err(|reason| LoadError::ResourceCreation {
                object: Texture::KIND,
                reason,
            })?;
        self.gpu.upload_texture_rgba8(raw, width, height, pixels, params);
        Ok(Texture::new(raw, self.gpu.context_id()))
    }

    /// Releases the texture in `slot`, leaving `None`. No-op on `None`.
    pub fn delete_texture(&self, slot: &mut Option<Texture>) {
        if let Some(raw) = take_for_release(self.gpu, slot) {
            self.gpu.delete_texture(raw);
        }
    }

    fn upload_image(&self, label: &str, mut image: RgbaImage, flip: bool) -> Result<Texture> {
        if flip {
            image::imageops::flip_vertical_in_place(&mut image);
        }
        let (width, height) = image.dimensions();
        let texture = self.upload_rgba8(
            width,
            height,
            image.as_raw(),
            &TextureParams::MIPMAPPED_REPEAT,
        )?;
        log::info!("Loaded texture: {label} ({width}x{height})");
        Ok(texture)
    }
}

fn decode_error(label: &str, error: &image::ImageError) -> LoadError {
    log::error!("Failed to load texture: {label} ({error})");
    LoadError::ImageDecode {
        path: label.to_owned(),
        reason: error.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::gpu::{Filter, Wrap};
    use crate::headless::HeadlessGpu;
    use image::{GrayImage, Luma, Rgba};

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    /// 1x2 PNG: red on top, blue below.
    fn write_red_over_blue(dir: &Path) -> std::path::PathBuf {
        let mut img = RgbaImage::new(1, 2);
        img.put_pixel(0, 0, Rgba(RED));
        img.put_pixel(0, 1, Rgba(BLUE));
        let path = dir.join("red_over_blue.png");
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn upload_keeps_row_order_without_flip() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_red_over_blue(dir.path());
        let gpu = HeadlessGpu::new();
        let texture = TextureLoader::new(&gpu).load_texture(&path, false).unwrap();

        let snapshot = gpu.texture(texture.id()).unwrap();
        assert_eq!((snapshot.width, snapshot.height), (1, 2));
        assert_eq!(&snapshot.pixels[..4], &RED);
        assert_eq!(&snapshot.pixels[4..], &BLUE);
    }

    #[test]
    fn flip_uploads_bottom_row_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_red_over_blue(dir.path());
        let gpu = HeadlessGpu::new();
        let texture = TextureLoader::new(&gpu).load_texture(&path, true).unwrap();

        let snapshot = gpu.texture(texture.id()).unwrap();
        assert_eq!(&snapshot.pixels[..4], &BLUE);
        assert_eq!(&snapshot.pixels[4..], &RED);
    }

    #[test]
    fn grayscale_is_expanded_to_rgba_with_mipmapped_repeat() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        GrayImage::from_pixel(4, 4, Luma([128])).save(&path).unwrap();

        let gpu = HeadlessGpu::new();
        let texture = TextureLoader::new(&gpu).load_texture(&path, true).unwrap();
        let snapshot = gpu.texture(texture.id()).unwrap();

        assert_eq!(snapshot.pixels.len(), 4 * 4 * 4);
        assert_eq!(&snapshot.pixels[..4], &[128, 128, 128, 255]);
        assert_eq!(snapshot.params.wrap, Wrap::Repeat);
        assert_eq!(snapshot.params.min_filter, Filter::LinearMipmapLinear);
        assert_eq!(snapshot.params.mag_filter, Filter::Linear);
        assert_eq!(snapshot.mip_levels, 3);
    }

    #[test]
    fn missing_file_is_decode_error_and_allocates_nothing() {
        let gpu = HeadlessGpu::new();
        let err = TextureLoader::new(&gpu)
            .load_texture("textures/does_not_exist.png", true)
            .unwrap_err();

        assert_eq!(err.message(), "Failed to load texture");
        assert!(err.context().contains("does_not_exist.png"));
        assert_eq!(gpu.live_objects().textures, 0);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let gpu = HeadlessGpu::new();
        let err = TextureLoader::new(&gpu)
            .load_texture_from_memory("garbage", b"not an image", false)
            .unwrap_err();
        assert!(matches!(err, LoadError::ImageDecode { ref path, .. } if path == "garbage"));
    }

    #[test]
    fn wrong_pixel_count_is_rejected() {
        let gpu = HeadlessGpu::new();
        let err = TextureLoader::new(&gpu)
            .upload_rgba8(2, 2, &[0; 15], &TextureParams::LINEAR_CLAMPED)
            .unwrap_err();
        assert!(matches!(err, LoadError::ResourceCreation { object: "texture", .. }));
        assert_eq!(gpu.live_objects().textures, 0);
    }

    #[test]
    fn delete_is_idempotent() {
        let gpu = HeadlessGpu::new();
        let loader = TextureLoader::new(&gpu);
        let mut slot = Some(
            loader
                .upload_rgba8(1, 1, &RED, &TextureParams::LINEAR_CLAMPED)
                .unwrap(),
        );

        loader.delete_texture(&mut slot);
        loader.delete_texture(&mut slot);
        let mut never_loaded = None;
        loader.delete_texture(&mut never_loaded);

        assert!(slot.is_none());
        assert_eq!(gpu.live_objects().textures, 0);
        assert_eq!(gpu.invalid_deletes(), 0);
    }
}
