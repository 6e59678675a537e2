/// Paper texture slots and the first-render gate
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use log::{info, warn};

use crate::config::AssetPaths;
use crate::error::TextureError;
use crate::texture::{ColorEncoding, SamplerConfig, Texture};

/// The four maps of the shared paper material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaperMap {
    Color,
    Normal,
    Roughness,
    Displacement,
}

impl PaperMap {
    pub const ALL: [PaperMap; 4] = [
        PaperMap::Color,
        PaperMap::Normal,
        PaperMap::Roughness,
        PaperMap::Displacement,
    ];

    fn index(self) -> usize {
        match self {
            PaperMap::Color => 0,
            PaperMap::Normal => 1,
            PaperMap::Roughness => 2,
            PaperMap::Displacement => 3,
        }
    }

    /// Only the colour map holds sRGB-encoded values
    pub fn sampler(self, repeat: f32, anisotropy: u8) -> SamplerConfig {
        let encoding = match self {
            PaperMap::Color => ColorEncoding::Srgb,
            _ => ColorEncoding::Linear,
        };
        SamplerConfig::tiled(repeat, encoding, anisotropy)
    }

    pub fn path(self, assets: &AssetPaths) -> &str {
        match self {
            PaperMap::Color => &assets.paper_color,
            PaperMap::Normal => &assets.paper_normal,
            PaperMap::Roughness => &assets.paper_roughness,
            PaperMap::Displacement => &assets.paper_displacement,
        }
    }
}

impl fmt::Display for PaperMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaperMap::Color => "color",
            PaperMap::Normal => "normal",
            PaperMap::Roughness => "roughness",
            PaperMap::Displacement => "displacement",
        };
        f.write_str(name)
    }
}

impl FromStr for PaperMap {
    type Err = TextureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "color" | "colour" | "map" => Ok(PaperMap::Color),
            "normal" | "normalmap" => Ok(PaperMap::Normal),
            "roughness" => Ok(PaperMap::Roughness),
            "displacement" | "height" => Ok(PaperMap::Displacement),
            _ => Err(TextureError::UnknownMap(s.to_string())),
        }
    }
}

/// Shared paper maps; any slot may stay empty
#[derive(Debug, Clone, Default)]
pub struct PaperTextures {
    pub color: Option<Texture>,
    pub normal: Option<Texture>,
    pub roughness: Option<Texture>,
    pub displacement: Option<Texture>,
}

impl PaperTextures {
    pub const EMPTY: PaperTextures = PaperTextures {
        color: None,
        normal: None,
        roughness: None,
        displacement: None,
    };

    pub fn set(&mut self, map: PaperMap, texture: Option<Texture>) {
        let slot = match map {
            PaperMap::Color => &mut self.color,
            PaperMap::Normal => &mut self.normal,
            PaperMap::Roughness => &mut self.roughness,
            PaperMap::Displacement => &mut self.displacement,
        };
        *slot = texture;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Pending,
    Ready,
    Failed,
}

/// Tracks which paper maps are still in flight.
///
/// With blocking enabled the scene draws only its background until every
/// slot is resolved; failed slots count as resolved.
#[derive(Debug, Clone)]
pub struct AssetGate {
    slots: [SlotState; 4],
    blocking: bool,
}

impl AssetGate {
    pub fn new(blocking: bool) -> Self {
        Self {
            slots: [SlotState::Pending; 4],
            blocking,
        }
    }

    pub fn state(&self, map: PaperMap) -> SlotState {
        self.slots[map.index()]
    }

    pub fn resolve(&mut self, map: PaperMap, state: SlotState) {
        self.slots[map.index()] = state;
    }

    pub fn is_resolved(&self) -> bool {
        self.slots.iter().all(|s| *s != SlotState::Pending)
    }

    pub fn is_open(&self) -> bool {
        !self.blocking || self.is_resolved()
    }
}

/// Load all four maps from disk. Failures leave the slot empty and are logged.
pub fn load_paper_from_disk(
    assets: &AssetPaths,
    repeat: f32,
    anisotropy: u8,
) -> (PaperTextures, AssetGate) {
    let mut paper = PaperTextures::default();
    let mut gate = AssetGate::new(true);
    for map in PaperMap::ALL {
        let path = map.path(assets);
        match load_map(path, map, repeat, anisotropy) {
            Ok(texture) => {
                info!("Loaded paper {} map {} ({}x{})", map, path, texture.width(), texture.height());
                paper.set(map, Some(texture));
                gate.resolve(map, SlotState::Ready);
            }
            Err(e) => {
                warn!("Paper {} map unavailable ({}): {}", map, path, e);
                gate.resolve(map, SlotState::Failed);
            }
        }
    }
    (paper, gate)
}

fn load_map(path: &str, map: PaperMap, repeat: f32, anisotropy: u8) -> Result<Texture, TextureError> {
    Texture::open(Path::new(path), map.sampler(repeat, anisotropy))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_opens_when_all_slots_resolve() {
        let mut gate = AssetGate::new(true);
        assert!(!gate.is_open());
        for map in [PaperMap::Color, PaperMap::Normal, PaperMap::Roughness] {
            gate.resolve(map, SlotState::Ready);
        }
        assert!(!gate.is_open());
        gate.resolve(PaperMap::Displacement, SlotState::Failed);
        assert!(gate.is_open());
    }

    #[test]
    fn test_non_blocking_gate_is_always_open() {
        let gate = AssetGate::new(false);
        assert!(gate.is_open());
        assert!(!gate.is_resolved());
    }

    #[test]
    fn test_map_names_parse() {
        assert_eq!("Color".parse::<PaperMap>().unwrap(), PaperMap::Color);
        assert_eq!("displacement".parse::<PaperMap>().unwrap(), PaperMap::Displacement);
        assert!("specular".parse::<PaperMap>().is_err());
        for map in PaperMap::ALL {
            assert_eq!(map.to_string().parse::<PaperMap>().unwrap(), map);
        }
    }

    #[test]
    fn test_missing_files_degrade_to_empty_slots() {
        let assets = AssetPaths {
            paper_color: "/nonexistent/color.jpg".to_string(),
            paper_normal: "/nonexistent/normal.jpg".to_string(),
            paper_roughness: "/nonexistent/roughness.jpg".to_string(),
            paper_displacement: "/nonexistent/displacement.jpg".to_string(),
            ..AssetPaths::default()
        };
        let (paper, gate) = load_paper_from_disk(&assets, 2.0, 16);
        assert!(paper.color.is_none());
        assert_eq!(gate.state(PaperMap::Normal), SlotState::Failed);
        assert!(gate.is_open());
    }
}
