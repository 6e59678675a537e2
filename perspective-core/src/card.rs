/// Card assembly: box mesh, face materials and the hover hit region
use log::info;
use nalgebra::{Matrix4, Point2};
use rand::Rng;

use crate::color::Color;
use crate::config::CardConfig;
use crate::geometry::{face, Mesh};
use crate::mask::{measure, MaskRenderer, TextItem};
use crate::material::{EngravedShader, PaperShader};
use crate::raster::RenderContext;
use crate::ray::Ray;
use crate::shader::SurfaceShader;
use crate::typeface::Typeface;

/// Parsed fonts for the two faces
#[derive(Debug, Clone, Copy)]
pub struct CardFonts<'a> {
    /// Front title
    pub title: &'a Typeface,
    /// Back tagline, quote and attribution
    pub body: &'a Typeface,
}

/// Invisible rectangle over the front title, in card space.
///
/// It sits just above the front face and is hit from either side, so the
/// card body never occludes it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverHitRegion {
    pub width: f32,
    pub height: f32,
    pub center: Point2<f32>,
    pub z: f32,
}

impl HoverHitRegion {
    /// Whether a world-space ray crosses the region on a card with `model`
    pub fn intersects(&self, ray: &Ray, model: &Matrix4<f32>) -> bool {
        let Some(local) = ray.to_local(model) else {
            return false;
        };
        let Some(t) = local.intersect_z_plane(self.z) else {
            return false;
        };
        let hit = local.at(t);
        (hit.x - self.center.x).abs() <= self.width / 2.0
            && (hit.y - self.center.y).abs() <= self.height / 2.0
    }
}

/// Positions of the three back-face text runs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackLayout {
    pub quote: (f32, f32),
    pub tagline: (f32, f32),
    pub attribution: (f32, f32),
}

impl BackLayout {
    /// Quote anchored near the lower-left corner, tagline above it and the
    /// attribution below, spaced by the measured quote height.
    pub fn new(card_width: f32, card_height: f32, quote_height: f32) -> Self {
        let x = -card_width / 2.0 + 0.15;
        let y = -card_height / 2.0 + 0.25;
        Self {
            quote: (x, y),
            tagline: (x, y + quote_height + 0.05),
            attribution: (x + 0.1, y - quote_height - 0.02),
        }
    }
}

/// The assembled card. Built once; only its rotation changes afterwards.
#[derive(Debug, Clone)]
pub struct Card {
    pub mesh: Mesh,
    pub side: PaperShader,
    pub front: EngravedShader,
    pub back: EngravedShader,
    pub hit_region: HoverHitRegion,
}

impl Card {
    /// Render the face textures and assemble the card
    pub fn build<R: Rng + ?Sized>(
        config: &CardConfig,
        fonts: CardFonts<'_>,
        ctx: &mut RenderContext,
        rng: &mut R,
    ) -> Self {
        let dims = &config.card;
        let text = &config.text;
        let masks = MaskRenderer::from_config(config);
        let segments = masks.curve_segments();
        let paper = PaperShader::new(config.paper.clone());

        let letters = masks.render_letters(ctx, &text.title, fonts.title, text.title_size, rng);
        let front = EngravedShader::front(paper.clone(), letters.mask, letters.colors);

        let quote_size = text.quote_size;
        let quote_height = measure(&TextItem::centered(&text.quote, fonts.body, quote_size), segments).y;
        let layout = BackLayout::new(dims.width, dims.height, quote_height);
        let items = [
            TextItem::anchored(
                &text.tagline,
                fonts.body,
                quote_size * 0.75,
                layout.tagline.0,
                layout.tagline.1,
            ),
            TextItem::anchored(&text.quote, fonts.body, quote_size, layout.quote.0, layout.quote.1),
            TextItem::anchored(
                &text.attribution,
                fonts.body,
                quote_size * 0.85,
                layout.attribution.0,
                layout.attribution.1,
            ),
        ];
        let back_mask = masks.render_text(ctx, &items);
        let back = EngravedShader::back(
            paper.clone(),
            back_mask,
            text.back_uv_flip_x,
            Color::from_array(text.hover_accent),
        );

        let title_extent = measure(&TextItem::centered(&text.title, fonts.title, text.title_size), segments);
        let hit_region = HoverHitRegion {
            width: title_extent.x + text.hover_padding * 2.0,
            height: title_extent.y + text.hover_padding * 2.0,
            center: Point2::origin(),
            z: dims.depth / 2.0 + 0.001,
        };

        let mesh = Mesh::card_box(dims.width, dims.height, dims.depth, dims.face_segments);
        info!(
            "Built card {}x{}x{} with {} triangles, hover region {:.3}x{:.3}",
            dims.width,
            dims.height,
            dims.depth,
            mesh.triangles.len(),
            hit_region.width,
            hit_region.height
        );

        Self {
            mesh,
            side: paper,
            front,
            back,
            hit_region,
        }
    }

    /// Shaders in face slot order
    pub fn materials(&self) -> [&dyn SurfaceShader; face::COUNT] {
        let side: &dyn SurfaceShader = &self.side;
        let mut slots = [side; face::COUNT];
        slots[face::FRONT] = &self.front;
        slots[face::BACK] = &self.back;
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::RotationState;
    use nalgebra::{Point3, Vector3};

    fn region() -> HoverHitRegion {
        HoverHitRegion {
            width: 2.0,
            height: 0.5,
            center: Point2::origin(),
            z: 0.0015,
        }
    }

    fn ray_at(x: f32, y: f32) -> Ray {
        Ray::new(Point3::new(x, y, 5.0), -Vector3::z()).unwrap()
    }

    #[test]
    fn test_hit_region_bounds() {
        let model = Matrix4::identity();
        assert!(region().intersects(&ray_at(0.0, 0.0), &model));
        assert!(region().intersects(&ray_at(0.99, 0.24), &model));
        assert!(!region().intersects(&ray_at(1.01, 0.0), &model));
        assert!(!region().intersects(&ray_at(0.0, 0.3), &model));
    }

    #[test]
    fn test_hit_region_is_double_sided() {
        // Card turned around: the region now faces away but still counts
        let model = RotationState::new(0.0, std::f32::consts::PI).matrix();
        assert!(region().intersects(&ray_at(0.5, 0.1), &model));
    }

    #[test]
    fn test_hit_region_follows_rotation() {
        let model = RotationState::new(0.0, 1.2).matrix();
        // Edge-on enough that the projected width shrinks below 0.9
        assert!(!region().intersects(&ray_at(0.9, 0.0), &model));
        assert!(region().intersects(&ray_at(0.2, 0.0), &model));
    }

    #[test]
    fn test_edge_on_card_is_never_hovered() {
        let model = RotationState::new(0.0, std::f32::consts::FRAC_PI_2).matrix();
        let centred = HoverHitRegion {
            z: 0.0,
            ..region()
        };
        assert!(!centred.intersects(&ray_at(0.0, 0.0), &model));
        assert!(!region().intersects(&ray_at(0.0, 0.0), &model));
    }

    #[test]
    fn test_back_layout_stacks_around_quote() {
        let layout = BackLayout::new(4.0, 2.5, 0.1);
        assert!((layout.quote.0 - (-1.85)).abs() < 1e-6);
        assert!((layout.quote.1 - (-1.0)).abs() < 1e-6);
        assert!((layout.tagline.1 - (-0.85)).abs() < 1e-6);
        assert!((layout.attribution.0 - (-1.75)).abs() < 1e-6);
        assert!((layout.attribution.1 - (-1.12)).abs() < 1e-6);
    }
}
