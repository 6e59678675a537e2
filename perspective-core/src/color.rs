/// Linear RGB colour math
use rand::Rng;
use std::ops::{Add, Mul};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_array(rgb: [f32; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2])
    }

    pub fn lerp(self, other: Color, t: f32) -> Color {
        self * (1.0 - t) + other * t
    }

    pub fn clamped(self) -> Color {
        Color::new(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
        )
    }

    /// HSL to RGB, hue in degrees
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Color {
        let h = hue.rem_euclid(360.0);
        let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
        let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = lightness - c / 2.0;
        let (r, g, b) = match h {
            h if h < 60.0 => (c, x, 0.0),
            h if h < 120.0 => (x, c, 0.0),
            h if h < 180.0 => (0.0, c, x),
            h if h < 240.0 => (0.0, x, c),
            h if h < 300.0 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        Color::new(r + m, g + m, b + m)
    }

    /// Random hue at fixed saturation 0.85 and lightness 0.5
    pub fn random_saturated<R: Rng + ?Sized>(rng: &mut R) -> Color {
        Self::from_hsl(rng.gen_range(0.0..360.0), 0.85, 0.5)
    }

    /// Quantize to 8-bit channels without any transfer function
    pub fn to_rgba8(self) -> [u8; 4] {
        let c = self.clamped();
        [
            (c.r * 255.0).round() as u8,
            (c.g * 255.0).round() as u8,
            (c.b * 255.0).round() as u8,
            255,
        ]
    }

    pub fn from_rgba8(px: [u8; 4]) -> Color {
        Color::new(px[0] as f32 / 255.0, px[1] as f32 / 255.0, px[2] as f32 / 255.0)
    }

    /// Encode linear values with the sRGB transfer function
    pub fn to_srgb8(self) -> [u8; 4] {
        let c = self.clamped();
        [
            (linear_to_srgb(c.r) * 255.0).round() as u8,
            (linear_to_srgb(c.g) * 255.0).round() as u8,
            (linear_to_srgb(c.b) * 255.0).round() as u8,
            255,
        ]
    }

    /// Decode 8-bit sRGB channels into linear values
    pub fn from_srgb8(px: [u8; 4]) -> Color {
        let lut = srgb_decode_table();
        Color::new(lut[px[0] as usize], lut[px[1] as usize], lut[px[2] as usize])
    }
}

impl Add for Color {
    type Output = Color;

    fn add(self, rhs: Color) -> Color {
        Color::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

impl Mul<f32> for Color {
    type Output = Color;

    fn mul(self, rhs: f32) -> Color {
        Color::new(self.r * rhs, self.g * rhs, self.b * rhs)
    }
}

impl Mul for Color {
    type Output = Color;

    fn mul(self, rhs: Color) -> Color {
        Color::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b)
    }
}

pub fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn srgb_decode_table() -> &'static [f32; 256] {
    static TABLE: OnceLock<[f32; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0.0; 256];
        for (i, v) in table.iter_mut().enumerate() {
            *v = srgb_to_linear(i as f32 / 255.0);
        }
        table
    })
}

/// GLSL-style smoothstep
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
