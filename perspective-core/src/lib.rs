/// Perspective Core Library - the engraved card engine
///
/// This library holds everything the front ends share: typeface parsing and
/// text extrusion, a software rasterizer with an explicit render context,
/// text mask rendering, the paper and engraved shaders, pointer interaction
/// and the per-frame card scene.

pub mod assets;
pub mod card;
pub mod color;
pub mod config;
pub mod error;
pub mod geometry;
pub mod interaction;
pub mod mask;
pub mod material;
pub mod projection;
pub mod raster;
pub mod ray;
pub mod scene;
pub mod shader;
pub mod text;
pub mod texture;
pub mod transform;
pub mod typeface;

// Re-export commonly used types
pub use assets::{AssetGate, PaperMap, PaperTextures, SlotState};
pub use card::{Card, CardFonts, HoverHitRegion};
pub use color::Color;
pub use config::{CardConfig, Config};
pub use error::{CardError, ConfigError, FontError, TextureError};
pub use geometry::{Mesh, Triangle, Vertex};
pub use interaction::{InputEvent, InteractionController, MousePhase, PointerAction, TouchPhase};
pub use mask::{LetterTextures, MaskRenderer, TextItem, TextPlacement};
pub use material::{EngravedShader, PaperShader};
pub use projection::{Camera, ProjectionMode};
pub use raster::{FrameBuffer, RenderContext};
pub use scene::CardScene;
pub use texture::Texture;
pub use transform::RotationState;
pub use typeface::Typeface;

/// Parse the title and body typefaces from their JSON documents
pub fn parse_fonts(title_json: &str, body_json: &str) -> Result<(Typeface, Typeface), FontError> {
    Ok((Typeface::from_json(title_json)?, Typeface::from_json(body_json)?))
}
