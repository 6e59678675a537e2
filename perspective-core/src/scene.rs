/// The card scene: camera, card, paper maps, input and the per-frame tick
use log::{debug, info, warn};
use nalgebra::{Matrix4, Point3};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::assets::{AssetGate, PaperMap, PaperTextures, SlotState};
use crate::card::{Card, CardFonts};
use crate::color::Color;
use crate::config::CardConfig;
use crate::error::TextureError;
use crate::interaction::{InputEvent, InteractionController};
use crate::projection::Camera;
use crate::raster::{DrawCall, FrameBuffer, RenderContext};
use crate::shader::ShadeContext;
use crate::texture::Texture;
use crate::transform::RotationState;

pub struct CardScene {
    config: CardConfig,
    camera: Camera,
    card: Card,
    controller: InteractionController,
    paper: PaperTextures,
    gate: AssetGate,
    ctx: RenderContext,
    background: Color,
}

impl CardScene {
    /// Build the card for a `width` x `height` viewport.
    ///
    /// `seed` drives the per-letter reveal colours.
    pub fn new(config: CardConfig, fonts: CardFonts<'_>, width: u32, height: u32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut ctx = RenderContext::new(width, height);
        let card = Card::build(&config, fonts, &mut ctx, &mut rng);

        let mut camera = Camera::new(width, height);
        camera.fov = config.render.camera_fov_degrees.to_radians();
        camera.position = Point3::new(0.0, 0.0, config.render.camera_distance);

        let controller = InteractionController::new(&config.interaction, width, height);
        let gate = AssetGate::new(config.render.block_until_textures_ready);
        let background = Color::from_array(config.render.background);
        info!("Card scene ready at {}x{}", width, height);

        Self {
            config,
            camera,
            card,
            controller,
            paper: PaperTextures::default(),
            gate,
            ctx,
            background,
        }
    }

    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn card(&self) -> &Card {
        &self.card
    }

    pub fn gate(&self) -> &AssetGate {
        &self.gate
    }

    pub fn hover(&self) -> f32 {
        self.controller.hover()
    }

    pub fn rotation(&self) -> RotationState {
        self.controller.rotation
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.controller.viewport()
    }

    pub fn handle_input(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::Resize { width, height } => self.resize(width, height),
            _ => self.controller.handle(event),
        }
    }

    /// Keyboard-style rotation by drag-pixel steps
    pub fn nudge(&mut self, dx: f32, dy: f32) {
        self.controller.nudge(dx, dy);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        self.ctx.resize(width, height);
        self.camera.set_viewport(width, height);
        self.controller.handle(&InputEvent::Resize { width, height });
        debug!("Viewport resized to {}x{}", width, height);
    }

    /// Fill or fail one paper slot. `None` records a failed load.
    pub fn set_paper_map(&mut self, map: PaperMap, texture: Option<Texture>) {
        let state = if texture.is_some() {
            SlotState::Ready
        } else {
            SlotState::Failed
        };
        self.paper.set(map, texture);
        self.gate.resolve(map, state);
        if self.gate.is_resolved() {
            info!("All paper maps resolved");
        }
    }

    /// Decode an encoded image into a paper slot
    pub fn load_paper_bytes(&mut self, map: PaperMap, bytes: &[u8]) -> Result<(), TextureError> {
        let sampler = map.sampler(self.config.paper.repeat, self.config.render.max_anisotropy);
        match Texture::from_bytes(bytes, sampler) {
            Ok(texture) => {
                info!("Paper {} map decoded ({}x{})", map, texture.width(), texture.height());
                self.set_paper_map(map, Some(texture));
                Ok(())
            }
            Err(e) => {
                warn!("Paper {} map failed to decode: {}", map, e);
                self.set_paper_map(map, None);
                Err(e)
            }
        }
    }

    /// Replace every paper map at once, e.g. after loading from disk
    pub fn set_paper(&mut self, paper: PaperTextures, gate: &AssetGate) {
        self.paper = paper;
        for map in PaperMap::ALL {
            self.gate.resolve(map, gate.state(map));
        }
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        self.controller.rotation.matrix()
    }

    /// Whether the pointer ray currently crosses the title hit region
    pub fn pointer_over_title(&self) -> bool {
        let Some((x, y)) = self.controller.pointer_ndc() else {
            return false;
        };
        let Some(ray) = self.camera.ray_through_ndc(x, y) else {
            return false;
        };
        self.card.hit_region.intersects(&ray, &self.model_matrix())
    }

    /// Update the hover target and advance the hover scalar one step.
    ///
    /// The target is held while a drag is in progress.
    pub fn tick(&mut self) -> f32 {
        let hovered = if self.controller.is_dragging() {
            self.controller.hover_targeted()
        } else {
            self.pointer_over_title()
        };
        self.controller.update_hover(hovered)
    }

    /// Draw the current state. Until the asset gate opens only the
    /// background is drawn.
    pub fn render(&mut self) -> &FrameBuffer {
        self.ctx.set_clear_color(self.background);
        self.ctx.clear();
        if self.gate.is_open() {
            let materials = self.card.materials();
            let call = DrawCall::new(&self.card.mesh, &materials).with_model(self.model_matrix());
            let shade = ShadeContext {
                paper: &self.paper,
                hover: self.controller.hover(),
            };
            self.ctx.draw(&self.camera, &call, &shade);
        }
        self.ctx.screen()
    }

    /// One frame: tick then render
    pub fn frame(&mut self) -> &FrameBuffer {
        self.tick();
        self.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::MousePhase;
    use crate::typeface::Typeface;

    const FIXTURE: &str = include_str!("../tests/fixtures/block.typeface.json");

    fn small_config() -> CardConfig {
        let mut config = CardConfig::default();
        config.render.mask_texture_width = 128;
        config.card.face_segments = 2;
        // Paper renders near white, so contrast it against black
        config.render.background = [0.0, 0.0, 0.0];
        config
    }

    fn scene(config: CardConfig) -> CardScene {
        let font = Typeface::from_json(FIXTURE).unwrap();
        let fonts = CardFonts {
            title: &font,
            body: &font,
        };
        CardScene::new(config, fonts, 64, 40, 1)
    }

    fn fail_all(scene: &mut CardScene) {
        for map in PaperMap::ALL {
            scene.set_paper_map(map, None);
        }
    }

    fn non_background(buffer: &FrameBuffer) -> usize {
        buffer
            .as_bytes()
            .chunks_exact(4)
            .filter(|px| px[..3] != [0, 0, 0])
            .count()
    }

    #[test]
    fn test_closed_gate_draws_background_only() {
        let mut scene = scene(small_config());
        assert_eq!(non_background(scene.render()), 0);
        fail_all(&mut scene);
        assert!(non_background(scene.render()) > 0);
    }

    #[test]
    fn test_non_blocking_gate_draws_immediately() {
        let mut config = small_config();
        config.render.block_until_textures_ready = false;
        let mut scene = scene(config);
        assert!(non_background(scene.render()) > 0);
    }

    #[test]
    fn test_pointer_over_title_raises_hover() {
        let mut scene = scene(small_config());
        scene.handle_input(&InputEvent::mouse(MousePhase::Move, 32.0, 20.0));
        assert!(scene.pointer_over_title());
        assert!((scene.tick() - 0.08).abs() < 1e-6);
        assert!((scene.tick() - 0.1536).abs() < 1e-6);
    }

    #[test]
    fn test_pointer_in_corner_misses_title() {
        let mut scene = scene(small_config());
        scene.handle_input(&InputEvent::mouse(MousePhase::Move, 1.0, 1.0));
        assert!(!scene.pointer_over_title());
        assert_eq!(scene.tick(), 0.0);
    }

    #[test]
    fn test_drag_holds_hover_target() {
        let mut scene = scene(small_config());
        scene.handle_input(&InputEvent::mouse(MousePhase::Move, 1.0, 1.0));
        scene.tick();
        scene.handle_input(&InputEvent::mouse(MousePhase::Down, 1.0, 1.0));
        scene.handle_input(&InputEvent::mouse(MousePhase::Move, 32.0, 20.0));
        // Still dragging: the off-title target from before the drag holds
        assert_eq!(scene.tick(), 0.0);
        scene.handle_input(&InputEvent::mouse(MousePhase::Up, 32.0, 20.0));
        assert!(scene.tick() > 0.0);
    }

    #[test]
    fn test_bad_texture_bytes_fail_the_slot() {
        let mut scene = scene(small_config());
        assert!(scene.load_paper_bytes(PaperMap::Normal, b"not an image").is_err());
        assert_eq!(scene.gate().state(PaperMap::Normal), SlotState::Failed);
    }

    #[test]
    fn test_resize_updates_viewport() {
        let mut scene = scene(small_config());
        scene.handle_input(&InputEvent::Resize { width: 30, height: 20 });
        assert_eq!(scene.viewport(), (30, 20));
        assert_eq!(scene.render().width(), 30);
    }
}
