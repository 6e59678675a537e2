/// Extruded text geometry built from typeface outlines
use log::warn;
use lyon_path::geom::{CubicBezierSegment, QuadraticBezierSegment};
use lyon_path::math::point;
use lyon_path::Path;
use lyon_tessellation::{BuffersBuilder, FillOptions, FillTessellator, FillVertex, VertexBuffers};
use nalgebra::{Point2, Point3, Vector3};

use crate::geometry::{Aabb, Mesh, Triangle, Vertex};
use crate::typeface::{OutlineCommand, Typeface};

/// Size and extrusion settings for a run of text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// World units per em
    pub size: f32,
    /// Extrusion depth along +Z
    pub depth: f32,
    /// Line segments each curve is divided into
    pub curve_segments: u32,
}

impl TextStyle {
    pub fn new(size: f32) -> Self {
        Self {
            size,
            depth: 0.002,
            curve_segments: 32,
        }
    }

    pub fn with_curve_segments(mut self, curve_segments: u32) -> Self {
        self.curve_segments = curve_segments;
        self
    }
}

/// Flatten outline commands into closed polylines
pub fn flatten_contours(commands: &[OutlineCommand], curve_segments: u32) -> Vec<Vec<Point2<f32>>> {
    let segments = curve_segments.max(1);
    let mut contours: Vec<Vec<Point2<f32>>> = Vec::new();
    let mut current: Vec<Point2<f32>> = Vec::new();

    let finish = |current: &mut Vec<Point2<f32>>, contours: &mut Vec<Vec<Point2<f32>>>| {
        if current.len() > 1 && current.first() == current.last() {
            current.pop();
        }
        if current.len() >= 3 {
            contours.push(std::mem::take(current));
        } else {
            current.clear();
        }
    };

    for command in commands {
        let from = current.last().map(|p| point(p.x, p.y));
        match *command {
            OutlineCommand::MoveTo(p) => {
                finish(&mut current, &mut contours);
                current.push(p);
            }
            OutlineCommand::LineTo(p) => current.push(p),
            OutlineCommand::QuadTo { ctrl, to } => {
                let Some(from) = from else {
                    current.push(to);
                    continue;
                };
                let curve = QuadraticBezierSegment {
                    from,
                    ctrl: point(ctrl.x, ctrl.y),
                    to: point(to.x, to.y),
                };
                for i in 1..=segments {
                    let p = curve.sample(i as f32 / segments as f32);
                    current.push(Point2::new(p.x, p.y));
                }
            }
            OutlineCommand::CubicTo { ctrl1, ctrl2, to } => {
                let Some(from) = from else {
                    current.push(to);
                    continue;
                };
                let curve = CubicBezierSegment {
                    from,
                    ctrl1: point(ctrl1.x, ctrl1.y),
                    ctrl2: point(ctrl2.x, ctrl2.y),
                    to: point(to.x, to.y),
                };
                for i in 1..=segments {
                    let p = curve.sample(i as f32 / segments as f32);
                    current.push(Point2::new(p.x, p.y));
                }
            }
            OutlineCommand::Close => finish(&mut current, &mut contours),
        }
    }
    finish(&mut current, &mut contours);
    contours
}

/// Fill the contours (non-zero winding) and extrude them from z = 0 to z = depth
pub fn extrude_contours(contours: &[Vec<Point2<f32>>], depth: f32) -> Mesh {
    if contours.is_empty() {
        return Mesh::new();
    }

    let mut builder = Path::builder();
    for contour in contours {
        builder.begin(point(contour[0].x, contour[0].y));
        for p in &contour[1..] {
            builder.line_to(point(p.x, p.y));
        }
        builder.end(true);
    }
    let path = builder.build();

    let mut buffers: VertexBuffers<Point2<f32>, u32> = VertexBuffers::new();
    let result = FillTessellator::new().tessellate_path(
        &path,
        &FillOptions::non_zero(),
        &mut BuffersBuilder::new(&mut buffers, |v: FillVertex| {
            let p = v.position();
            Point2::new(p.x, p.y)
        }),
    );
    if let Err(e) = result {
        warn!("Glyph tessellation failed, dropping glyph: {:?}", e);
        return Mesh::new();
    }

    let front_normal = Vector3::z();
    let back_normal = -Vector3::z();
    let mut mesh = Mesh::with_capacity(buffers.indices.len() / 3 * 2 + contours.len() * 8);

    for tri in buffers.indices.chunks_exact(3) {
        let [mut a, mut b, c] = [
            buffers.vertices[tri[0] as usize],
            buffers.vertices[tri[1] as usize],
            buffers.vertices[tri[2] as usize],
        ];
        // Normalize the cap to counter-clockwise when seen from +Z
        if (b - a).perp(&(c - a)) < 0.0 {
            std::mem::swap(&mut a, &mut b);
        }
        let front = |p: Point2<f32>| Vertex::untextured(Point3::new(p.x, p.y, depth), front_normal);
        let back = |p: Point2<f32>| Vertex::untextured(Point3::new(p.x, p.y, 0.0), back_normal);
        mesh.add_triangle(Triangle::new(front(a), front(b), front(c)));
        mesh.add_triangle(Triangle::new(back(a), back(c), back(b)));
    }

    for contour in contours {
        for (i, p0) in contour.iter().enumerate() {
            let p1 = contour[(i + 1) % contour.len()];
            let edge = p1 - p0;
            let Some(dir) = edge.try_normalize(1e-9) else {
                continue;
            };
            let normal = Vector3::new(dir.y, -dir.x, 0.0);
            let v = |p: &Point2<f32>, z: f32| Vertex::untextured(Point3::new(p.x, p.y, z), normal);
            mesh.add_triangle(Triangle::new(v(p0, 0.0), v(&p1, 0.0), v(&p1, depth)));
            mesh.add_triangle(Triangle::new(v(p0, 0.0), v(&p1, depth), v(p0, depth)));
        }
    }

    mesh
}

/// Extruded geometry for a string, with its measured bounds
#[derive(Debug, Clone)]
pub struct TextGeometry {
    mesh: Mesh,
    bounds: Aabb,
}

impl TextGeometry {
    pub fn new(font: &Typeface, text: &str, style: TextStyle) -> Self {
        let mut mesh = Mesh::new();
        for glyph in font.layout(text, style.size) {
            let contours = flatten_contours(&glyph.commands, style.curve_segments);
            mesh.extend(extrude_contours(&contours, style.depth));
        }
        let bounds = mesh.bounding_box();
        Self { mesh, bounds }
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn into_mesh(self) -> Mesh {
        self.mesh
    }

    pub fn translate(&mut self, offset: Vector3<f32>) {
        self.mesh.translate(offset);
        self.bounds.min += offset;
        self.bounds.max += offset;
    }

    /// Move the bounding box centre (in X and Y) to the origin
    pub fn centered(mut self) -> Self {
        let c = self.bounds.center();
        self.translate(Vector3::new(-c.x, -c.y, 0.0));
        self
    }

    /// Move the lower-left bounding box corner to `(x, y)`
    pub fn anchored(mut self, x: f32, y: f32) -> Self {
        let min = self.bounds.min;
        self.translate(Vector3::new(x - min.x, y - min.y, 0.0));
        self
    }
}

/// Lay `text` out one glyph at a time.
///
/// Each glyph advances by its own bounding width and is centred vertically on
/// its own bounds; the finished line is centred horizontally on the origin.
pub fn layout_letters(font: &Typeface, text: &str, style: TextStyle) -> Vec<Mesh> {
    let mut x_offset = 0.0;
    let mut letters = Vec::new();
    for ch in text.chars() {
        let mut glyph = TextGeometry::new(font, ch.encode_utf8(&mut [0; 4]), style);
        let bounds = *glyph.bounds();
        let cy = bounds.center().y;
        glyph.translate(Vector3::new(x_offset - bounds.min.x, -cy, 0.0));
        x_offset += bounds.width();
        letters.push(glyph.into_mesh());
    }
    let shift = Vector3::new(-x_offset / 2.0, 0.0, 0.0);
    for letter in &mut letters {
        letter.translate(shift);
    }
    letters
}
