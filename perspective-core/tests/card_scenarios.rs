use perspective_core::color::Color;
use perspective_core::config::{CardConfig, Config};
use perspective_core::interaction::{InputEvent, MousePhase, TouchPhase};
use perspective_core::mask::{MaskRenderer, TextItem};
use perspective_core::raster::{FrameBuffer, RenderContext};
use perspective_core::texture::ColorEncoding;
use perspective_core::{CardFonts, CardScene, PaperMap, Typeface};

use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::SeedableRng;

const FONT: &str = include_str!("fixtures/block.typeface.json");

fn font() -> Typeface {
    Typeface::from_json(FONT).expect("fixture typeface parses")
}

fn dark_columns(image: &image::RgbaImage) -> Option<(u32, u32)> {
    let mut min = None;
    let mut max = None;
    for (x, _, px) in image.enumerate_pixels() {
        if px.0[0] < 128 {
            min = Some(min.map_or(x, |m: u32| m.min(x)));
            max = Some(max.map_or(x, |m: u32| m.max(x)));
        }
    }
    Some((min?, max?))
}

fn scene_with(config: CardConfig, font: &Typeface) -> CardScene {
    let fonts = CardFonts {
        title: font,
        body: font,
    };
    CardScene::new(config, fonts, 80, 50, 42)
}

fn light_config() -> CardConfig {
    let mut config = CardConfig::default();
    config.render.mask_texture_width = 160;
    config.card.face_segments = 1;
    config
}

#[test]
fn centred_title_sits_on_the_mask_midline() {
    let font = font();
    let renderer = MaskRenderer::new(4.0, 2.5, 4096, 16);
    assert_eq!(renderer.resolution(), (4096, 2560));

    let mut ctx = RenderContext::new(1, 1);
    let mask = renderer.render_text(&mut ctx, &[TextItem::centered("Perspective", &font, 0.35)]);
    let (min_x, max_x) = dark_columns(mask.image()).expect("title is drawn");
    let midpoint = (min_x + max_x + 1) as f32 / 2.0;
    assert!((midpoint - 2048.0).abs() <= 1.0, "midpoint {}", midpoint);
}

#[test]
fn letter_layout_is_centred_too() {
    let font = font();
    let renderer = MaskRenderer::new(4.0, 2.5, 1024, 16);
    let mut ctx = RenderContext::new(1, 1);
    let mut rng = StdRng::seed_from_u64(9);
    let letters = renderer.render_letters(&mut ctx, "Perspective", &font, 0.35, &mut rng);
    let (min_x, max_x) = dark_columns(letters.mask.image()).expect("title is drawn");
    let midpoint = (min_x + max_x + 1) as f32 / 2.0;
    assert!((midpoint - 512.0).abs() <= 1.0, "midpoint {}", midpoint);
}

#[test]
fn rendering_the_same_items_twice_is_pixel_identical() {
    let font = font();
    let renderer = MaskRenderer::new(4.0, 2.5, 512, 16);
    let items = [
        TextItem::centered("Did I lose my perspective?", &font, 0.2),
        TextItem::anchored("\u{2014} Charlotte", &font, 0.1, -1.8, -1.1),
    ];
    let mut ctx = RenderContext::new(1, 1);
    let first = renderer.render_text(&mut ctx, &items);
    let second = renderer.render_text(&mut ctx, &items);
    assert_eq!(first.image().as_raw(), second.image().as_raw());
}

#[test]
fn mask_covers_glyph_interiors_only() {
    let font = font();
    let renderer = MaskRenderer::new(4.0, 2.5, 512, 16);
    let mut ctx = RenderContext::new(1, 1);
    let mask = renderer.render_text(&mut ctx, &[TextItem::centered("I", &font, 1.0)]);

    let inside = mask.sample(Vector2::new(0.5, 0.5));
    let outside = mask.sample(Vector2::new(0.1, 0.9));
    assert!(1.0 - inside.r > 0.99);
    assert!(1.0 - outside.r < 0.01);
}

#[test]
fn offscreen_pass_restores_context_after_panic() {
    let mut ctx = RenderContext::new(8, 8);
    ctx.set_clear_color(Color::new(0.5, 0.25, 0.0));
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let mut pass = ctx.bind_offscreen(FrameBuffer::new(16, 16, ColorEncoding::Linear), Color::WHITE);
        pass.clear();
        panic!("draw failed mid-pass");
    }));
    assert!(result.is_err());
    assert!(!ctx.has_offscreen_target());
    assert_eq!(ctx.clear_color(), Color::new(0.5, 0.25, 0.0));
    assert_eq!(ctx.target_size(), (8, 8));
}

#[test]
fn hovering_the_title_eases_in() {
    let font = font();
    let mut scene = scene_with(light_config(), &font);
    scene.handle_input(&InputEvent::mouse(MousePhase::Move, 40.0, 25.0));
    scene.tick();
    assert!((scene.hover() - 0.08).abs() < 1e-6);
    scene.tick();
    assert!((scene.hover() - 0.1536).abs() < 1e-6);

    scene.handle_input(&InputEvent::Leave);
    let before = scene.hover();
    scene.tick();
    assert!(scene.hover() < before);
}

#[test]
fn touch_drag_keeps_pitch_in_range() {
    let font = font();
    let mut scene = scene_with(light_config(), &font);
    let limit = 30f32.to_radians() + 1e-6;
    scene.handle_input(&InputEvent::touch(TouchPhase::Start, Some((40.0, 25.0))));
    for (i, y) in [400.0, -900.0, 25.0, 1200.0, -50.0].into_iter().enumerate() {
        scene.handle_input(&InputEvent::touch(TouchPhase::Move, Some((40.0 + i as f32 * 10.0, y))));
        assert!(scene.rotation().pitch.abs() <= limit);
    }
    scene.handle_input(&InputEvent::touch(TouchPhase::End, None));
    let frozen = scene.rotation();
    scene.handle_input(&InputEvent::mouse(MousePhase::Move, 0.0, 0.0));
    assert_eq!(scene.rotation(), frozen);
}

#[test]
fn scene_waits_for_paper_maps_before_drawing_the_card() {
    let font = font();
    let mut config = light_config();
    config.render.background = [0.0, 0.0, 0.0];
    let mut scene = scene_with(config, &font);

    let lit = |frame: &FrameBuffer| frame.as_bytes().chunks_exact(4).filter(|p| p[0] > 0).count();
    assert_eq!(lit(scene.frame()), 0);

    for map in [PaperMap::Color, PaperMap::Normal, PaperMap::Roughness] {
        scene.set_paper_map(map, None);
    }
    assert_eq!(lit(scene.frame()), 0);

    scene.set_paper_map(PaperMap::Displacement, None);
    assert!(lit(scene.frame()) > 0);
}

#[test]
fn config_from_toml_drives_the_scene() {
    let config = CardConfig::from_toml_str(
        r#"
        [interaction]
        max_pitch_degrees = 10.0

        [render]
        mask_texture_width = 160
        "#,
    )
    .expect("valid config");
    let font = font();
    let mut scene = scene_with(config, &font);
    scene.nudge(0.0, -100_000.0);
    assert!((scene.rotation().pitch - 10f32.to_radians()).abs() < 1e-6);
}
