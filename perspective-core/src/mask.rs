/// Text mask rendering.
///
/// Text is extruded into glyph meshes, drawn unlit through an orthographic
/// camera that spans exactly one card face, and captured from an offscreen
/// target as a face-sized texture. Masks are black glyphs on white; the
/// letter colour variant draws each glyph in its own hue on black.
use log::{debug, info};
use nalgebra::Vector3;
use rand::Rng;

use crate::color::Color;
use crate::config::CardConfig;
use crate::geometry::Mesh;
use crate::projection::{Camera, OrthoBounds};
use crate::raster::{DrawCall, FrameBuffer, RenderContext};
use crate::shader::{ShadeContext, SurfaceShader, UnlitShader};
use crate::text::{layout_letters, TextGeometry, TextStyle};
use crate::texture::{ColorEncoding, SamplerConfig, Texture};
use crate::typeface::Typeface;

/// Where a text item lands on the face
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextPlacement {
    /// Bounding box centred on the face
    Centered,
    /// Lower-left bounding box corner at `(x, y)` in face units
    Anchored { x: f32, y: f32 },
}

#[derive(Debug, Clone, Copy)]
pub struct TextItem<'a> {
    pub text: &'a str,
    pub font: &'a Typeface,
    pub size: f32,
    pub placement: TextPlacement,
}

impl<'a> TextItem<'a> {
    pub fn centered(text: &'a str, font: &'a Typeface, size: f32) -> Self {
        Self {
            text,
            font,
            size,
            placement: TextPlacement::Centered,
        }
    }

    pub fn anchored(text: &'a str, font: &'a Typeface, size: f32, x: f32, y: f32) -> Self {
        Self {
            text,
            font,
            size,
            placement: TextPlacement::Anchored { x, y },
        }
    }

    /// Extruded, placed geometry for this item
    pub fn geometry(&self, curve_segments: u32) -> TextGeometry {
        let style = TextStyle::new(self.size).with_curve_segments(curve_segments);
        let geometry = TextGeometry::new(self.font, self.text, style);
        match self.placement {
            TextPlacement::Centered => geometry.centered(),
            TextPlacement::Anchored { x, y } => geometry.anchored(x, y),
        }
    }
}

/// Mask plus per-letter colours for the same line of text
#[derive(Debug, Clone)]
pub struct LetterTextures {
    pub mask: Texture,
    pub colors: Texture,
}

/// Renders text into face-sized textures
#[derive(Debug, Clone)]
pub struct MaskRenderer {
    face_width: f32,
    face_height: f32,
    texture_width: u32,
    texture_height: u32,
    anisotropy: u8,
    curve_segments: u32,
}

impl MaskRenderer {
    /// Texture height follows the face aspect ratio
    pub fn new(face_width: f32, face_height: f32, texture_width: u32, anisotropy: u8) -> Self {
        let texture_width = texture_width.max(1);
        let aspect = face_width / face_height;
        let texture_height = (texture_width as f32 / aspect).round().max(1.0) as u32;
        Self {
            face_width,
            face_height,
            texture_width,
            texture_height,
            anisotropy,
            curve_segments: TextStyle::new(1.0).curve_segments,
        }
    }

    pub fn from_config(config: &CardConfig) -> Self {
        let mut renderer = Self::new(
            config.card.width,
            config.card.height,
            config.render.mask_texture_width,
            config.render.max_anisotropy,
        );
        renderer.curve_segments = config.render.curve_segments;
        renderer
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.texture_width, self.texture_height)
    }

    pub fn curve_segments(&self) -> u32 {
        self.curve_segments
    }

    /// Camera spanning exactly one face
    pub fn camera(&self) -> Camera {
        Camera::orthographic(
            OrthoBounds::centered(self.face_width, self.face_height),
            1.0,
            0.1,
            10.0,
        )
    }

    /// Black text on white for every item
    pub fn render_text(&self, ctx: &mut RenderContext, items: &[TextItem<'_>]) -> Texture {
        let mut mesh = Mesh::new();
        for item in items {
            mesh.extend(item.geometry(self.curve_segments).into_mesh());
        }
        mesh.set_material(0);
        let black = UnlitShader::new(Color::BLACK);
        let materials: [&dyn SurfaceShader; 1] = [&black];
        let texture = self.render_pass(ctx, &mesh, &materials, Color::WHITE);
        info!(
            "Rendered text mask for {} item(s) at {}x{}",
            items.len(),
            self.texture_width,
            self.texture_height
        );
        texture
    }

    /// Mask and per-letter colour textures for one centred line.
    ///
    /// Each letter draws `Color::random_saturated` from `rng`, in order.
    pub fn render_letters<R: Rng + ?Sized>(
        &self,
        ctx: &mut RenderContext,
        text: &str,
        font: &Typeface,
        size: f32,
        rng: &mut R,
    ) -> LetterTextures {
        let style = TextStyle::new(size).with_curve_segments(self.curve_segments);
        let mut mesh = Mesh::new();
        for (slot, mut letter) in layout_letters(font, text, style).into_iter().enumerate() {
            letter.set_material(slot);
            mesh.extend(letter);
        }

        let black = UnlitShader::new(Color::BLACK);
        let colored: Vec<UnlitShader> = text
            .chars()
            .map(|_| UnlitShader::new(Color::random_saturated(rng)))
            .collect();

        let mask_materials: Vec<&dyn SurfaceShader> = colored.iter().map(|_| &black as &dyn SurfaceShader).collect();
        let color_materials: Vec<&dyn SurfaceShader> =
            colored.iter().map(|s| s as &dyn SurfaceShader).collect();

        let mask = self.render_pass(ctx, &mesh, &mask_materials, Color::WHITE);
        let colors = self.render_pass(ctx, &mesh, &color_materials, Color::BLACK);
        info!(
            "Rendered letter textures for {:?} ({} letters) at {}x{}",
            text,
            colored.len(),
            self.texture_width,
            self.texture_height
        );
        LetterTextures { mask, colors }
    }

    fn render_pass(
        &self,
        ctx: &mut RenderContext,
        mesh: &Mesh,
        materials: &[&dyn SurfaceShader],
        clear: Color,
    ) -> Texture {
        let camera = self.camera();
        let target = FrameBuffer::new(self.texture_width, self.texture_height, ColorEncoding::Linear);
        let anisotropy = self.anisotropy.min(ctx.max_anisotropy());

        let mut pass = ctx.bind_offscreen(target, clear);
        pass.clear();
        pass.draw(&camera, &DrawCall::new(mesh, materials), &ShadeContext::unlit());
        let target = pass.finish();
        debug!("Offscreen pass drew {} triangles", mesh.triangles.len());

        Texture::from_image(target.into_image(), SamplerConfig::render_target(anisotropy))
    }
}

/// Extent of a text item's bounds, for layouts stacked relative to it
pub fn measure(item: &TextItem<'_>, curve_segments: u32) -> Vector3<f32> {
    let bounds = *item.geometry(curve_segments).bounds();
    bounds.max - bounds.min
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const FIXTURE: &str = include_str!("../tests/fixtures/block.typeface.json");

    fn font() -> Typeface {
        Typeface::from_json(FIXTURE).unwrap()
    }

    fn renderer() -> MaskRenderer {
        MaskRenderer::new(4.0, 2.5, 256, 16)
    }

    #[test]
    fn test_resolution_follows_face_aspect() {
        assert_eq!(MaskRenderer::new(4.0, 2.5, 4096, 16).resolution(), (4096, 2560));
        assert_eq!(MaskRenderer::from_config(&CardConfig::default()).resolution(), (4096, 2560));
    }

    #[test]
    fn test_empty_item_list_is_all_white() {
        let mut ctx = RenderContext::new(4, 4);
        let texture = renderer().render_text(&mut ctx, &[]);
        assert_eq!(texture.width(), 256);
        assert_eq!(texture.height(), 160);
        assert!(texture.image().pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn test_render_restores_context() {
        let font = font();
        let mut ctx = RenderContext::new(4, 4);
        ctx.set_clear_color(Color::new(0.1, 0.2, 0.3));
        renderer().render_text(&mut ctx, &[TextItem::centered("P", &font, 1.0)]);
        assert!(!ctx.has_offscreen_target());
        assert_eq!(ctx.clear_color(), Color::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_anchored_item_lands_at_lower_left() {
        let font = font();
        let mut ctx = RenderContext::new(4, 4);
        let texture = renderer().render_text(&mut ctx, &[TextItem::anchored("I", &font, 0.5, -1.5, -1.0)]);
        let image = texture.image();
        let dark: Vec<(u32, u32)> = image
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] < 128)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!dark.is_empty());
        // 64 pixels per unit: face x = -1.5 is column 32, face y = -1.0 is row 144
        let min_x = dark.iter().map(|p| p.0).min().unwrap();
        let max_y = dark.iter().map(|p| p.1).max().unwrap();
        assert!((min_x as i64 - 32).abs() <= 1, "min_x = {}", min_x);
        assert!((max_y as i64 - 143).abs() <= 1, "max_y = {}", max_y);
    }

    #[test]
    fn test_letters_share_coverage_with_mask() {
        let font = font();
        let mut ctx = RenderContext::new(4, 4);
        let mut rng = StdRng::seed_from_u64(7);
        let letters = renderer().render_letters(&mut ctx, "Did", &font, 0.8, &mut rng);
        assert_eq!(letters.mask.width(), letters.colors.width());
        assert_eq!(letters.mask.height(), letters.colors.height());
        for (m, c) in letters.mask.image().pixels().zip(letters.colors.image().pixels()) {
            let masked = m.0[0] == 0;
            let colored = c.0[..3] != [0, 0, 0];
            assert_eq!(masked, colored);
        }
    }

    #[test]
    fn test_letter_colours_repeat_for_same_seed() {
        let font = font();
        let mut ctx = RenderContext::new(4, 4);
        let a = renderer().render_letters(&mut ctx, "Did", &font, 0.8, &mut StdRng::seed_from_u64(3));
        let b = renderer().render_letters(&mut ctx, "Did", &font, 0.8, &mut StdRng::seed_from_u64(3));
        assert_eq!(a.colors.image().as_raw(), b.colors.image().as_raw());
    }
}
