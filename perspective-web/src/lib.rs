/// Perspective Web - WASM front end for the engraved card
///
/// JavaScript owns the animation loop, the DOM listeners and the texture
/// downloads. It forwards pointer input, hands over texture bytes as they
/// arrive and calls `frame()` once per animation frame; each frame is
/// rasterized in the core and blitted into a 2D canvas.
use log::{info, Level, LevelFilter, Log, Metadata, Record};
use perspective_core::{parse_fonts, CardConfig, CardFonts, CardScene, Config, InputEvent, MousePhase, PaperMap, TouchPhase};
use wasm_bindgen::prelude::*;
use wasm_bindgen::{Clamped, JsCast};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

/// Forwards `log` records to the browser console
struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => web_sys::console::error_1(&line),
            Level::Warn => web_sys::console::warn_1(&line),
            Level::Info => web_sys::console::info_1(&line),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

#[wasm_bindgen(start)]
pub fn start() {
    // Setup panic hook for better error messages in browser console
    console_error_panic_hook::set_once();
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Info);
    }
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Rasterized size for a CSS-pixel viewport
pub fn scaled_size(css_width: f32, css_height: f32, render_scale: f32) -> (u32, u32) {
    let scale = if render_scale > 0.0 { render_scale } else { 1.0 };
    (
        (css_width * scale).round().max(1.0) as u32,
        (css_height * scale).round().max(1.0) as u32,
    )
}

#[wasm_bindgen]
pub struct CardApp {
    scene: CardScene,
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    render_scale: f32,
}

#[wasm_bindgen]
impl CardApp {
    /// Parse fonts and config, render the face masks and size the canvas.
    ///
    /// `width` and `height` are the canvas size in CSS pixels.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas: HtmlCanvasElement,
        title_font_json: &str,
        body_font_json: &str,
        config_toml: Option<String>,
        width: f32,
        height: f32,
        seed: u32,
    ) -> Result<CardApp, JsValue> {
        let config = match config_toml.as_deref().map(str::trim) {
            Some(toml) if !toml.is_empty() => CardConfig::from_toml_str(toml).map_err(js_error)?,
            _ => CardConfig::default(),
        };
        let (title, body) = parse_fonts(title_font_json, body_font_json).map_err(js_error)?;

        let context = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d canvas context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;

        let render_scale = config.render.render_scale;
        let (w, h) = scaled_size(width, height, render_scale);
        canvas.set_width(w);
        canvas.set_height(h);

        let fonts = CardFonts {
            title: &title,
            body: &body,
        };
        let scene = CardScene::new(config, fonts, w, h, seed as u64);
        info!("Card ready, rendering at {}x{}", w, h);

        Ok(CardApp {
            scene,
            canvas,
            context,
            render_scale,
        })
    }

    fn to_pixels(&self, x: f32, y: f32) -> (f32, f32) {
        let scale = if self.render_scale > 0.0 { self.render_scale } else { 1.0 };
        (x * scale, y * scale)
    }

    #[wasm_bindgen(js_name = "mouseDown")]
    pub fn mouse_down(&mut self, x: f32, y: f32) {
        let (x, y) = self.to_pixels(x, y);
        self.scene.handle_input(&InputEvent::mouse(MousePhase::Down, x, y));
    }

    #[wasm_bindgen(js_name = "mouseMove")]
    pub fn mouse_move(&mut self, x: f32, y: f32) {
        let (x, y) = self.to_pixels(x, y);
        self.scene.handle_input(&InputEvent::mouse(MousePhase::Move, x, y));
    }

    #[wasm_bindgen(js_name = "mouseUp")]
    pub fn mouse_up(&mut self, x: f32, y: f32) {
        let (x, y) = self.to_pixels(x, y);
        self.scene.handle_input(&InputEvent::mouse(MousePhase::Up, x, y));
    }

    #[wasm_bindgen(js_name = "touchStart")]
    pub fn touch_start(&mut self, x: f32, y: f32) {
        let position = self.to_pixels(x, y);
        self.scene
            .handle_input(&InputEvent::touch(TouchPhase::Start, Some(position)));
    }

    #[wasm_bindgen(js_name = "touchMove")]
    pub fn touch_move(&mut self, x: f32, y: f32) {
        let position = self.to_pixels(x, y);
        self.scene
            .handle_input(&InputEvent::touch(TouchPhase::Move, Some(position)));
    }

    #[wasm_bindgen(js_name = "touchEnd")]
    pub fn touch_end(&mut self) {
        self.scene.handle_input(&InputEvent::touch(TouchPhase::End, None));
    }

    #[wasm_bindgen(js_name = "pointerLeave")]
    pub fn pointer_leave(&mut self) {
        self.scene.handle_input(&InputEvent::Leave);
    }

    /// Resize to a CSS-pixel viewport
    pub fn resize(&mut self, width: f32, height: f32) {
        let (w, h) = scaled_size(width, height, self.render_scale);
        self.canvas.set_width(w);
        self.canvas.set_height(h);
        self.scene.handle_input(&InputEvent::Resize { width: w, height: h });
    }

    /// Decode a paper map (`color`, `normal`, `roughness`, `displacement`)
    #[wasm_bindgen(js_name = "loadTexture")]
    pub fn load_texture(&mut self, kind: &str, bytes: &[u8]) -> Result<(), JsValue> {
        let map: PaperMap = kind.parse().map_err(js_error)?;
        self.scene.load_paper_bytes(map, bytes).map_err(js_error)
    }

    /// Record that a paper map download failed; the slot degrades silently
    #[wasm_bindgen(js_name = "textureFailed")]
    pub fn texture_failed(&mut self, kind: &str) -> Result<(), JsValue> {
        let map: PaperMap = kind.parse().map_err(js_error)?;
        self.scene.set_paper_map(map, None);
        Ok(())
    }

    /// Tick, render and blit one frame
    pub fn frame(&mut self) -> Result<(), JsValue> {
        let frame = self.scene.frame();
        let image = ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(frame.as_bytes()),
            frame.width(),
            frame.height(),
        )?;
        self.context.put_image_data(&image, 0.0, 0.0)
    }

    pub fn hover(&self) -> f32 {
        self.scene.hover()
    }

    #[wasm_bindgen(js_name = "isReady")]
    pub fn is_ready(&self) -> bool {
        self.scene.gate().is_open()
    }
}
