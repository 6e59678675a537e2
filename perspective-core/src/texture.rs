/// CPU textures with mip chains and filtered sampling
use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbaImage;
use nalgebra::Vector2;

use crate::color::Color;
use crate::error::TextureError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    Repeat,
    ClampToEdge,
}

/// Which way `v` runs through the image rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAxis {
    /// `v = 0` is the first (top) row, as for images loaded without flipping
    Down,
    /// `v = 0` is the last (bottom) row, as for rendered targets
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorEncoding {
    Linear,
    Srgb,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerConfig {
    pub wrap: WrapMode,
    /// UV scale applied before sampling
    pub repeat: f32,
    pub v_axis: VAxis,
    pub encoding: ColorEncoding,
    pub mipmaps: bool,
    pub anisotropy: u8,
}

impl SamplerConfig {
    /// Tiled paper maps
    pub fn tiled(repeat: f32, encoding: ColorEncoding, anisotropy: u8) -> Self {
        Self {
            wrap: WrapMode::Repeat,
            repeat,
            v_axis: VAxis::Down,
            encoding,
            mipmaps: true,
            anisotropy: anisotropy.clamp(1, 16),
        }
    }

    /// Offscreen render results stretched once over a face
    pub fn render_target(anisotropy: u8) -> Self {
        Self {
            wrap: WrapMode::ClampToEdge,
            repeat: 1.0,
            v_axis: VAxis::Up,
            encoding: ColorEncoding::Linear,
            mipmaps: true,
            anisotropy: anisotropy.clamp(1, 16),
        }
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            wrap: WrapMode::ClampToEdge,
            repeat: 1.0,
            v_axis: VAxis::Down,
            encoding: ColorEncoding::Linear,
            mipmaps: false,
            anisotropy: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Texture {
    levels: Vec<RgbaImage>,
    sampler: SamplerConfig,
}

impl Texture {
    pub fn from_image(image: RgbaImage, sampler: SamplerConfig) -> Self {
        let mut levels = vec![image];
        if sampler.mipmaps {
            while let Some(last) = levels.last() {
                let (w, h) = last.dimensions();
                if w <= 1 && h <= 1 {
                    break;
                }
                let next = imageops::resize(last, (w / 2).max(1), (h / 2).max(1), FilterType::Triangle);
                levels.push(next);
            }
        }
        Self { levels, sampler }
    }

    /// Decode an encoded image (PNG, JPEG)
    pub fn from_bytes(bytes: &[u8], sampler: SamplerConfig) -> Result<Self, TextureError> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        Ok(Self::from_image(image, sampler))
    }

    pub fn open<P: AsRef<Path>>(path: P, sampler: SamplerConfig) -> Result<Self, TextureError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes, sampler)
    }

    pub fn width(&self) -> u32 {
        self.levels[0].width()
    }

    pub fn height(&self) -> u32 {
        self.levels[0].height()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn sampler(&self) -> &SamplerConfig {
        &self.sampler
    }

    /// Full resolution image
    pub fn image(&self) -> &RgbaImage {
        &self.levels[0]
    }

    /// Sample the full resolution level with bilinear filtering
    pub fn sample(&self, uv: Vector2<f32>) -> Color {
        self.sample_level(0, uv)
    }

    /// Sample with mip selection from screen-space UV derivatives
    pub fn sample_grad(&self, uv: Vector2<f32>, duv_dx: Vector2<f32>, duv_dy: Vector2<f32>) -> Color {
        if self.levels.len() == 1 {
            return self.sample(uv);
        }
        let lod = self.level_of_detail(duv_dx, duv_dy);
        let lower = lod.floor() as usize;
        let upper = (lower + 1).min(self.levels.len() - 1);
        let t = lod - lower as f32;
        let a = self.sample_level(lower, uv);
        if upper == lower || t <= 0.0 {
            return a;
        }
        a.lerp(self.sample_level(upper, uv), t)
    }

    fn level_of_detail(&self, duv_dx: Vector2<f32>, duv_dy: Vector2<f32>) -> f32 {
        let scale = Vector2::new(
            self.width() as f32 * self.sampler.repeat,
            self.height() as f32 * self.sampler.repeat,
        );
        let fx = duv_dx.component_mul(&scale).norm();
        let fy = duv_dy.component_mul(&scale).norm();
        let (major, minor) = if fx > fy { (fx, fy) } else { (fy, fx) };
        if !(major > 0.0) {
            return 0.0;
        }
        let max_aniso = self.sampler.anisotropy.max(1) as f32;
        let taps = (major / minor.max(1e-6)).ceil().min(max_aniso).max(1.0);
        let lod = (major / taps).log2();
        lod.clamp(0.0, (self.levels.len() - 1) as f32)
    }

    fn sample_level(&self, level: usize, uv: Vector2<f32>) -> Color {
        let image = &self.levels[level.min(self.levels.len() - 1)];
        let (w, h) = image.dimensions();
        let u = uv.x * self.sampler.repeat;
        let v = uv.y * self.sampler.repeat;
        let row = match self.sampler.v_axis {
            VAxis::Down => v,
            VAxis::Up => 1.0 - v,
        };
        let x = u * w as f32 - 0.5;
        let y = row * h as f32 - 0.5;
        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = (x - x0, y - y0);
        let (x0, y0) = (x0 as i64, y0 as i64);

        let fetch = |tx: i64, ty: i64| {
            let px = image.get_pixel(self.wrap(tx, w), self.wrap(ty, h)).0;
            match self.sampler.encoding {
                ColorEncoding::Linear => Color::from_rgba8(px),
                ColorEncoding::Srgb => Color::from_srgb8(px),
            }
        };

        let top = fetch(x0, y0).lerp(fetch(x0 + 1, y0), fx);
        let bottom = fetch(x0, y0 + 1).lerp(fetch(x0 + 1, y0 + 1), fx);
        top.lerp(bottom, fy)
    }

    fn wrap(&self, coord: i64, size: u32) -> u32 {
        let size = size as i64;
        match self.sampler.wrap {
            WrapMode::Repeat => coord.rem_euclid(size) as u32,
            WrapMode::ClampToEdge => coord.clamp(0, size - 1) as u32,
        }
    }
}
