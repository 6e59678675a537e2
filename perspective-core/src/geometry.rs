/// Geometry primitives for the card and glyph meshes
use nalgebra::{Point2, Point3, Vector3};

/// Material slot of each box face, in box face order
pub mod face {
    pub const RIGHT: usize = 0;
    pub const LEFT: usize = 1;
    pub const TOP: usize = 2;
    pub const BOTTOM: usize = 3;
    pub const FRONT: usize = 4;
    pub const BACK: usize = 5;
    pub const COUNT: usize = 6;
}

/// A 3D vertex with position, normal and face UV
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    pub uv: Point2<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, uv: Point2<f32>) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    /// Vertex without texture coordinates (glyph geometry)
    pub fn untextured(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self::new(position, normal, Point2::origin())
    }
}

/// A triangle face defined by three vertices and the material slot it draws with
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
    pub material: usize,
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
            material: 0,
        }
    }

    pub fn with_material(mut self, material: usize) -> Self {
        self.material = material;
        self
    }

    /// Calculate the face normal from the triangle's vertices
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1.cross(&edge2).try_normalize(1e-12).unwrap_or_else(Vector3::z)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    /// Zero-size box at the origin, used for empty geometry
    pub fn empty() -> Self {
        Self {
            min: Point3::origin(),
            max: Point3::origin(),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f32>>) -> Self {
        let mut points = points.into_iter();
        let Some(first) = points.next() else {
            return Self::empty();
        };
        let (mut min, mut max) = (*first, *first);
        for p in points {
            min = min.inf(p);
            max = max.sup(p);
        }
        // NaN coordinates from broken outlines collapse to the empty box
        if !(min.coords.iter().chain(max.coords.iter()).all(|c| c.is_finite())) {
            return Self::empty();
        }
        Self { min, max }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Append another mesh's triangles
    pub fn extend(&mut self, other: Mesh) {
        self.triangles.extend(other.triangles);
    }

    pub fn translate(&mut self, offset: Vector3<f32>) {
        for triangle in &mut self.triangles {
            for vertex in &mut triangle.vertices {
                vertex.position += offset;
            }
        }
    }

    pub fn set_material(&mut self, material: usize) {
        for triangle in &mut self.triangles {
            triangle.material = material;
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_points(
            self.triangles
                .iter()
                .flat_map(|t| t.vertices.iter().map(|v| &v.position)),
        )
    }

    /// Subdivided box with one material slot per face (see [`face`]).
    ///
    /// UVs follow the usual box convention: on every face `u` runs left to
    /// right and `v` runs bottom to top as seen from outside the face.
    pub fn card_box(width: f32, height: f32, depth: f32, segments: u32) -> Self {
        let segments = segments.max(1);
        let mut mesh = Self::new();
        // (u axis, v axis, w axis, u dir, v dir, u extent, v extent, w extent)
        let planes: [(usize, usize, usize, f32, f32, f32, f32, f32); 6] = [
            (2, 1, 0, -1.0, -1.0, depth, height, width),
            (2, 1, 0, 1.0, -1.0, depth, height, -width),
            (0, 2, 1, 1.0, 1.0, width, depth, height),
            (0, 2, 1, 1.0, -1.0, width, depth, -height),
            (0, 1, 2, 1.0, -1.0, width, height, depth),
            (0, 1, 2, -1.0, -1.0, width, height, -depth),
        ];
        for (material, &(u, v, w, udir, vdir, uext, vext, wext)) in planes.iter().enumerate() {
            Self::add_plane(
                &mut mesh, u, v, w, udir, vdir, uext, vext, wext, segments, material,
            );
        }
        mesh
    }

    #[allow(clippy::too_many_arguments)]
    fn add_plane(
        mesh: &mut Mesh,
        u: usize,
        v: usize,
        w: usize,
        udir: f32,
        vdir: f32,
        uext: f32,
        vext: f32,
        wext: f32,
        segments: u32,
        material: usize,
    ) {
        let grid = segments as usize;
        let mut normal = Vector3::zeros();
        normal[w] = wext.signum();

        let vertex_at = |ix: usize, iy: usize| {
            let x = ix as f32 * uext / grid as f32 - uext / 2.0;
            let y = iy as f32 * vext / grid as f32 - vext / 2.0;
            let mut position = Point3::origin();
            position[u] = x * udir;
            position[v] = y * vdir;
            position[w] = wext / 2.0;
            let uv = Point2::new(ix as f32 / grid as f32, 1.0 - iy as f32 / grid as f32);
            Vertex::new(position, normal, uv)
        };

        for iy in 0..grid {
            for ix in 0..grid {
                let a = vertex_at(ix, iy);
                let b = vertex_at(ix, iy + 1);
                let c = vertex_at(ix + 1, iy + 1);
                let d = vertex_at(ix + 1, iy);
                mesh.add_triangle(Triangle::new(a, b, d).with_material(material));
                mesh.add_triangle(Triangle::new(b, c, d).with_material(material));
            }
        }
    }

    /// Single quad in the XY plane facing +Z
    pub fn plane(width: f32, height: f32) -> Self {
        let (hw, hh) = (width / 2.0, height / 2.0);
        let n = Vector3::z();
        let v = |x: f32, y: f32, u: f32, t: f32| Vertex::new(Point3::new(x, y, 0.0), n, Point2::new(u, t));
        let mut mesh = Self::with_capacity(2);
        mesh.add_triangle(Triangle::new(v(-hw, -hh, 0.0, 0.0), v(hw, -hh, 1.0, 0.0), v(hw, hh, 1.0, 1.0)));
        mesh.add_triangle(Triangle::new(v(-hw, -hh, 0.0, 0.0), v(hw, hh, 1.0, 1.0), v(-hw, hh, 0.0, 1.0)));
        mesh
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}
