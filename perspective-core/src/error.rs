/// Error types shared by the card engine
use thiserror::Error;

/// Typeface loading errors
#[derive(Error, Debug)]
pub enum FontError {
    /// The typeface document is not valid JSON or misses required fields
    #[error("Invalid typeface JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A glyph outline string could not be parsed
    #[error("Malformed outline for glyph {glyph:?}: {message}")]
    Outline { glyph: char, message: String },

    /// The typeface declares a non-positive resolution
    #[error("Typeface resolution must be positive, got {0}")]
    Resolution(f32),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Texture loading errors
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Unknown paper map kind: {0}")]
    UnknownMap(String),
}

/// Top-level error for building and driving a card scene
#[derive(Error, Debug)]
pub enum CardError {
    #[error("Font error: {0}")]
    Font(#[from] FontError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Texture error: {0}")]
    Texture(#[from] TextureError),
}
