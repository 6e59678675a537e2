/// Surface shader interface used by the software rasterizer
use nalgebra::{Point3, Vector2, Vector3};

use crate::assets::PaperTextures;
use crate::color::Color;
use crate::geometry::Vertex;

/// Which triangle sides a shader draws
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceSide {
    Front,
    Back,
    Double,
}

/// Interpolated inputs for one pixel
#[derive(Debug, Clone, Copy)]
pub struct Fragment {
    /// Raw face UV, before any texture repeat
    pub uv: Vector2<f32>,
    /// UV change per pixel step along screen X and Y
    pub duv_dx: Vector2<f32>,
    pub duv_dy: Vector2<f32>,
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    pub tangent: Vector3<f32>,
    pub bitangent: Vector3<f32>,
    /// Unit vector from the surface towards the camera
    pub view_dir: Vector3<f32>,
    pub front_facing: bool,
}

/// Per-frame values shared by every shader in a pass
#[derive(Debug, Clone, Copy)]
pub struct ShadeContext<'a> {
    pub paper: &'a PaperTextures,
    /// Current hover reveal scalar in [0, 1]
    pub hover: f32,
}

static NO_PAPER: PaperTextures = PaperTextures::EMPTY;

impl ShadeContext<'static> {
    /// Context for passes that sample no shared textures
    pub fn unlit() -> Self {
        Self {
            paper: &NO_PAPER,
            hover: 0.0,
        }
    }
}

pub trait SurfaceShader {
    /// Object-space vertex position after any displacement
    fn displace(&self, vertex: &Vertex, _ctx: &ShadeContext<'_>) -> Point3<f32> {
        vertex.position
    }

    /// Linear output colour for a fragment
    fn shade(&self, fragment: &Fragment, ctx: &ShadeContext<'_>) -> Color;

    fn side(&self) -> FaceSide {
        FaceSide::Front
    }
}

/// Flat colour with no lighting model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnlitShader {
    pub color: Color,
}

impl UnlitShader {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl SurfaceShader for UnlitShader {
    fn shade(&self, _fragment: &Fragment, _ctx: &ShadeContext<'_>) -> Color {
        self.color
    }

    fn side(&self) -> FaceSide {
        FaceSide::Double
    }
}
