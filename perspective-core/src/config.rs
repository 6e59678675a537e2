/// Card configuration loaded from TOML
use std::path::Path;

pub use serde::{Deserialize, Serialize};

pub use crate::error::ConfigError;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !has_toml_extension(path) {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from a TOML document
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration to file
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if !has_toml_extension(path) {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()));
        }
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

fn has_toml_extension(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("toml")
}

/// Everything needed to build and drive one card scene
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CardConfig {
    pub card: CardDimensions,
    pub paper: PaperParams,
    pub text: CardText,
    pub interaction: InteractionParams,
    pub render: RenderParams,
    pub assets: AssetPaths,
}

impl Config for CardConfig {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardDimensions {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    /// Subdivisions per face edge; the displacement map moves these vertices
    pub face_segments: u32,
}

impl Default for CardDimensions {
    fn default() -> Self {
        Self {
            width: 4.0,
            height: 2.5,
            depth: 0.001,
            face_segments: 24,
        }
    }
}

/// Shared paper surface parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperParams {
    pub repeat: f32,
    pub emissive_intensity: f32,
    pub normal_scale: f32,
    pub roughness: f32,
    pub metalness: f32,
    pub displacement_scale: f32,
    pub ambient_intensity: f32,
    pub key_light_intensity: f32,
    pub key_light_direction: [f32; 3],
}

impl Default for PaperParams {
    fn default() -> Self {
        Self {
            repeat: 2.0,
            emissive_intensity: 0.65,
            normal_scale: 1.6,
            roughness: 0.6,
            metalness: 0.0,
            displacement_scale: 0.025,
            ambient_intensity: 1.0,
            key_light_intensity: 0.0,
            key_light_direction: [0.3, 0.5, 1.0],
        }
    }
}

/// Copy and layout of the engraved text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardText {
    pub title: String,
    pub title_size: f32,
    pub tagline: String,
    pub quote: String,
    pub attribution: String,
    pub quote_size: f32,
    /// Padding around the title bounds for the hover hit region
    pub hover_padding: f32,
    /// Reveal colour for faces without a letter colour texture
    pub hover_accent: [f32; 3],
    pub back_uv_flip_x: bool,
}

impl Default for CardText {
    fn default() -> Self {
        Self {
            title: "Perspective".to_string(),
            title_size: 0.35,
            tagline: "... building the web we want to live with, one system at a time".to_string(),
            quote: "\"Did I lose my perspective?\"".to_string(),
            attribution: "\u{2014} Charlotte Emma Aitchison".to_string(),
            quote_size: 0.08,
            hover_padding: 0.03,
            hover_accent: [0.04, 0.08, 0.5],
            back_uv_flip_x: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionParams {
    /// Radians of rotation per pixel of drag
    pub drag_sensitivity: f32,
    pub max_pitch_degrees: f32,
    /// Fraction of the remaining distance covered by the hover scalar per frame
    pub hover_lerp: f32,
}

impl Default for InteractionParams {
    fn default() -> Self {
        Self {
            drag_sensitivity: 0.005,
            max_pitch_degrees: 30.0,
            hover_lerp: 0.08,
        }
    }
}

impl InteractionParams {
    pub fn max_pitch(&self) -> f32 {
        self.max_pitch_degrees.abs().to_radians()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderParams {
    pub mask_texture_width: u32,
    pub max_anisotropy: u8,
    pub background: [f32; 3],
    pub camera_fov_degrees: f32,
    pub camera_distance: f32,
    pub curve_segments: u32,
    /// Fraction of the viewport resolution actually rasterized (web front end)
    pub render_scale: f32,
    /// Draw only the background until every paper map has loaded or failed
    pub block_until_textures_ready: bool,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            mask_texture_width: 4096,
            max_anisotropy: 16,
            background: [1.0, 1.0, 1.0],
            camera_fov_degrees: 75.0,
            camera_distance: 5.0,
            curve_segments: 32,
            render_scale: 0.5,
            block_until_textures_ready: true,
        }
    }
}

/// Asset locations used by front ends that read from disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    pub title_font: String,
    pub body_font: String,
    pub paper_color: String,
    pub paper_normal: String,
    pub paper_roughness: String,
    pub paper_displacement: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        let paper = "assets/textures/Paper001_2K-JPG/Paper001_2K-JPG";
        Self {
            title_font: "assets/fonts/Baskervville Medium_Regular.json".to_string(),
            body_font: "assets/fonts/Baskervville_Regular.json".to_string(),
            paper_color: format!("{paper}_Color.jpg"),
            paper_normal: format!("{paper}_NormalGL.jpg"),
            paper_roughness: format!("{paper}_Roughness.jpg"),
            paper_displacement: format!("{paper}_Displacement.jpg"),
        }
    }
}
