/// Paper and engraved surface shaders.
///
/// Every face of the card shares one paper model. The engraved faces run the
/// paper lighting first and then darken the lit colour wherever the face's
/// text mask is dark, blending toward a reveal colour as the hover scalar
/// rises.
use std::f32::consts::PI;

use nalgebra::{Point3, Vector2, Vector3};

use crate::color::{smoothstep, Color};
use crate::config::{CardText, PaperParams};
use crate::geometry::Vertex;
use crate::shader::{FaceSide, Fragment, ShadeContext, SurfaceShader};
use crate::texture::Texture;

/// Lit paper: tiled colour map, tangent-space normals, roughness and
/// displacement, all taken from the shared [`ShadeContext::paper`] maps.
#[derive(Debug, Clone, PartialEq)]
pub struct PaperShader {
    pub params: PaperParams,
}

impl PaperShader {
    pub fn new(params: PaperParams) -> Self {
        Self { params }
    }

    fn shading_normal(&self, fragment: &Fragment, ctx: &ShadeContext<'_>) -> Vector3<f32> {
        let Some(map) = ctx.paper.normal.as_ref() else {
            return fragment.normal;
        };
        let texel = map.sample_grad(fragment.uv, fragment.duv_dx, fragment.duv_dy);
        let scale = self.params.normal_scale;
        let local = Vector3::new(
            (texel.r * 2.0 - 1.0) * scale,
            (texel.g * 2.0 - 1.0) * scale,
            texel.b * 2.0 - 1.0,
        );
        // Tangents come from the face, so flip them along with the normal
        let sign = if fragment.front_facing { 1.0 } else { -1.0 };
        let perturbed = fragment.tangent * local.x * sign
            + fragment.bitangent * local.y * sign
            + fragment.normal * local.z;
        perturbed.try_normalize(1e-6).unwrap_or(fragment.normal)
    }

    /// Linear lit colour before any engraving
    pub fn lit(&self, fragment: &Fragment, ctx: &ShadeContext<'_>) -> Color {
        let p = &self.params;
        let albedo = ctx
            .paper
            .color
            .as_ref()
            .map(|map| map.sample_grad(fragment.uv, fragment.duv_dx, fragment.duv_dy))
            .unwrap_or(Color::WHITE);

        // Ambient light and the emissive copy of the colour map
        let mut lit = albedo * (p.ambient_intensity / PI + p.emissive_intensity);

        if p.key_light_intensity > 0.0 {
            let light = Vector3::from(p.key_light_direction)
                .try_normalize(1e-6)
                .unwrap_or_else(Vector3::z);
            let n = self.shading_normal(fragment, ctx);
            let n_dot_l = n.dot(&light).max(0.0);
            if n_dot_l > 0.0 {
                let roughness = ctx
                    .paper
                    .roughness
                    .as_ref()
                    .map(|map| map.sample_grad(fragment.uv, fragment.duv_dx, fragment.duv_dy).g)
                    .unwrap_or(1.0)
                    * p.roughness;
                let alpha = (roughness * roughness).max(1e-3);
                let shininess = (2.0 / (alpha * alpha) - 2.0).clamp(1.0, 2048.0);
                let half = (light + fragment.view_dir).try_normalize(1e-6).unwrap_or(n);
                let specular = n.dot(&half).max(0.0).powf(shininess) * (shininess + 8.0) / (8.0 * PI);

                let f0 = Color::new(0.04, 0.04, 0.04).lerp(albedo, p.metalness.clamp(0.0, 1.0));
                let diffuse = albedo * (1.0 - p.metalness.clamp(0.0, 1.0)) * (1.0 / PI);
                lit = lit + (diffuse + f0 * specular) * (p.key_light_intensity * n_dot_l * PI);
            }
        }
        lit
    }
}

impl SurfaceShader for PaperShader {
    fn displace(&self, vertex: &Vertex, ctx: &ShadeContext<'_>) -> Point3<f32> {
        match ctx.paper.displacement.as_ref() {
            Some(map) => {
                let height = map.sample(vertex.uv.coords).r;
                vertex.position + vertex.normal * (height * self.params.displacement_scale)
            }
            None => vertex.position,
        }
    }

    fn shade(&self, fragment: &Fragment, ctx: &ShadeContext<'_>) -> Color {
        self.lit(fragment, ctx)
    }
}

/// Post-lighting engraving step for one pixel.
///
/// `mask` is the mask sample (dark inside glyphs), `reveal` the colour shown
/// through the glyphs at full hover.
pub fn engrave(lit: Color, mask: Color, reveal: Color, hover: f32) -> Color {
    let raw = 1.0 - mask.r;
    let in_text = smoothstep(0.0, 0.95, raw);
    let darken = in_text * (1.0 - hover * 0.5);
    let darkened = lit * (1.0 - darken);
    darkened.lerp(reveal, hover * in_text)
}

/// Paper with engraved text from a mask texture
#[derive(Debug, Clone)]
pub struct EngravedShader {
    pub paper: PaperShader,
    pub mask: Texture,
    /// Per-letter reveal colours, same size and orientation as `mask`
    pub letter_colors: Option<Texture>,
    /// Mirror the mask horizontally (faces seen from behind)
    pub flip_x: bool,
    /// When false the hover scalar is pinned at 0
    pub hover_enabled: bool,
    pub accent: Color,
}

impl EngravedShader {
    pub fn new(paper: PaperShader, mask: Texture) -> Self {
        Self {
            paper,
            mask,
            letter_colors: None,
            flip_x: false,
            hover_enabled: false,
            accent: Color::from_array(CardText::default().hover_accent),
        }
    }

    /// Front face: hover reveals the letter colours
    pub fn front(paper: PaperShader, mask: Texture, letter_colors: Texture) -> Self {
        Self {
            letter_colors: Some(letter_colors),
            hover_enabled: true,
            ..Self::new(paper, mask)
        }
    }

    /// Back face: mirrored, accent reveal, hover pinned
    pub fn back(paper: PaperShader, mask: Texture, flip_x: bool, accent: Color) -> Self {
        Self {
            flip_x,
            accent,
            ..Self::new(paper, mask)
        }
    }

    fn mask_coords(&self, fragment: &Fragment) -> (Vector2<f32>, Vector2<f32>, Vector2<f32>) {
        if self.flip_x {
            let flip = |d: Vector2<f32>| Vector2::new(-d.x, d.y);
            (
                Vector2::new(1.0 - fragment.uv.x, fragment.uv.y),
                flip(fragment.duv_dx),
                flip(fragment.duv_dy),
            )
        } else {
            (fragment.uv, fragment.duv_dx, fragment.duv_dy)
        }
    }
}

impl SurfaceShader for EngravedShader {
    fn displace(&self, vertex: &Vertex, ctx: &ShadeContext<'_>) -> Point3<f32> {
        self.paper.displace(vertex, ctx)
    }

    fn shade(&self, fragment: &Fragment, ctx: &ShadeContext<'_>) -> Color {
        let lit = self.paper.lit(fragment, ctx);
        let (uv, dx, dy) = self.mask_coords(fragment);
        let mask = self.mask.sample_grad(uv, dx, dy);
        let reveal = self
            .letter_colors
            .as_ref()
            .map(|colors| colors.sample_grad(uv, dx, dy))
            .unwrap_or(self.accent);
        let hover = if self.hover_enabled {
            ctx.hover.clamp(0.0, 1.0)
        } else {
            0.0
        };
        engrave(lit, mask, reveal, hover)
    }

    fn side(&self) -> FaceSide {
        FaceSide::Front
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::PaperTextures;
    use crate::texture::{ColorEncoding, SamplerConfig};
    use approx::assert_relative_eq;
    use image::{Rgba, RgbaImage};

    fn fragment(u: f32, v: f32) -> Fragment {
        Fragment {
            uv: Vector2::new(u, v),
            duv_dx: Vector2::zeros(),
            duv_dy: Vector2::zeros(),
            position: Point3::origin(),
            normal: Vector3::z(),
            tangent: Vector3::x(),
            bitangent: Vector3::y(),
            view_dir: Vector3::z(),
            front_facing: true,
        }
    }

    fn unlit_paper() -> PaperShader {
        PaperShader::new(PaperParams::default())
    }

    /// Left half black (text), right half white
    fn half_mask() -> Texture {
        let image = RgbaImage::from_fn(8, 4, |x, _| {
            if x < 4 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        Texture::from_image(image, SamplerConfig::render_target(16))
    }

    fn solid(color: [u8; 4]) -> Texture {
        Texture::from_image(RgbaImage::from_pixel(4, 4, Rgba(color)), SamplerConfig::render_target(16))
    }

    #[test]
    fn test_paper_without_maps_is_ambient_plus_emissive() {
        let shader = unlit_paper();
        let color = shader.shade(&fragment(0.5, 0.5), &ShadeContext::unlit());
        let expected = 1.0 / PI + 0.65;
        assert_relative_eq!(color.r, expected, epsilon = 1e-5);
        assert_relative_eq!(color.b, expected, epsilon = 1e-5);
    }

    #[test]
    fn test_key_light_brightens_facing_surface() {
        let keyed = PaperShader::new(PaperParams {
            key_light_intensity: 0.35,
            ..PaperParams::default()
        });
        let lit = keyed.shade(&fragment(0.5, 0.5), &ShadeContext::unlit());
        let flat = unlit_paper().shade(&fragment(0.5, 0.5), &ShadeContext::unlit());
        assert!(lit.r > flat.r);
    }

    #[test]
    fn test_default_paper_keeps_colour_map_detail() {
        let sampler = SamplerConfig::tiled(1.0, ColorEncoding::Srgb, 1);
        let shade = |value: u8| {
            let mut paper = PaperTextures::default();
            paper.color = Some(Texture::from_image(
                RgbaImage::from_pixel(4, 4, Rgba([value, value, value, 255])),
                sampler,
            ));
            let ctx = ShadeContext { paper: &paper, hover: 0.0 };
            unlit_paper().shade(&fragment(0.5, 0.5), &ctx)
        };
        let light = shade(230);
        let darker = shade(200);
        assert!(light.r < 1.0, "paper clipped to white: {}", light.r);
        assert!(darker.r < light.r);
        assert!(light.to_srgb8()[0] < 255);
    }

    #[test]
    fn test_displacement_moves_along_normal() {
        let mut paper = PaperTextures::default();
        paper.displacement = Some(solid([255, 255, 255, 255]));
        let ctx = ShadeContext { paper: &paper, hover: 0.0 };
        let vertex = Vertex::new(Point3::new(1.0, 0.0, 0.0), Vector3::z(), nalgebra::Point2::new(0.2, 0.3));
        let moved = unlit_paper().displace(&vertex, &ctx);
        assert_relative_eq!(moved.z, 0.025, epsilon = 1e-6);
        assert_relative_eq!(moved.x, 1.0);

        let untouched = unlit_paper().displace(&vertex, &ShadeContext::unlit());
        assert_eq!(untouched, vertex.position);
    }

    #[test]
    fn test_engrave_darkens_text_without_hover() {
        let lit = Color::new(0.8, 0.8, 0.8);
        let out = engrave(lit, Color::BLACK, Color::new(1.0, 0.0, 0.0), 0.0);
        assert_relative_eq!(out.r, 0.0, epsilon = 1e-6);
        assert_eq!(engrave(lit, Color::WHITE, Color::new(1.0, 0.0, 0.0), 0.0), lit);
    }

    #[test]
    fn test_engrave_full_hover_shows_reveal_colour() {
        let lit = Color::new(0.8, 0.8, 0.8);
        let reveal = Color::new(0.9, 0.1, 0.2);
        let out = engrave(lit, Color::BLACK, reveal, 1.0);
        assert_relative_eq!(out.r, reveal.r, epsilon = 1e-6);
        assert_relative_eq!(out.g, reveal.g, epsilon = 1e-6);

        // Halfway: darkened by 0.75, then half way to the reveal colour
        let half = engrave(lit, Color::BLACK, reveal, 0.5);
        assert_relative_eq!(half.r, 0.8 * 0.25 * 0.5 + 0.9 * 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_engrave_partial_coverage_uses_smoothstep() {
        let lit = Color::WHITE;
        // raw = 0.475, halfway through the smoothstep ramp
        let mask = Color::new(0.525, 0.525, 0.525);
        let out = engrave(lit, mask, Color::BLACK, 0.0);
        assert_relative_eq!(out.r, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_pinned_hover_ignores_context() {
        let shader = EngravedShader::back(unlit_paper(), half_mask(), false, Color::new(0.04, 0.08, 0.5));
        let paper = PaperTextures::default();
        let idle = shader.shade(&fragment(0.25, 0.5), &ShadeContext { paper: &paper, hover: 0.0 });
        let hovered = shader.shade(&fragment(0.25, 0.5), &ShadeContext { paper: &paper, hover: 1.0 });
        assert_eq!(idle, hovered);
    }

    #[test]
    fn test_front_reveals_letter_colours() {
        let colors = solid([255, 0, 0, 255]);
        let shader = EngravedShader::front(unlit_paper(), half_mask(), colors);
        let paper = PaperTextures::default();
        let ctx = ShadeContext { paper: &paper, hover: 1.0 };
        let inside = shader.shade(&fragment(0.25, 0.5), &ctx);
        assert_relative_eq!(inside.r, 1.0, epsilon = 1e-5);
        assert_relative_eq!(inside.g, 0.0, epsilon = 1e-5);

        let outside = shader.shade(&fragment(0.75, 0.5), &ctx);
        assert_relative_eq!(outside.g, 1.0 / PI + 0.65, epsilon = 1e-5);
    }

    #[test]
    fn test_flip_mirrors_mask_lookup() {
        let plain = EngravedShader::back(unlit_paper(), half_mask(), false, Color::BLACK);
        let flipped = EngravedShader::back(unlit_paper(), half_mask(), true, Color::BLACK);
        let ctx = ShadeContext::unlit();
        // u = 0.25 is inside the black half unless mirrored
        assert_relative_eq!(plain.shade(&fragment(0.25, 0.5), &ctx).r, 0.0, epsilon = 1e-6);
        assert_relative_eq!(
            flipped.shade(&fragment(0.25, 0.5), &ctx).r,
            1.0 / PI + 0.65,
            epsilon = 1e-5
        );
    }
}
