/// Software rasterizer and render context.
///
/// The [`RenderContext`] owns the screen buffer, the currently bound offscreen
/// target and the clear colour. Offscreen passes bind a target through
/// [`RenderContext::bind_offscreen`], which hands back a guard; dropping the
/// guard (normally, or while unwinding) restores the previous target and clear
/// colour.
use std::ops::{Deref, DerefMut};

use image::RgbaImage;
use nalgebra::{Matrix4, Point3, Vector2, Vector3};

use crate::color::Color;
use crate::geometry::{Mesh, Triangle};
use crate::projection::{Camera, ProjectedPoint, ProjectionMode};
use crate::shader::{FaceSide, Fragment, ShadeContext, SurfaceShader};
use crate::texture::ColorEncoding;

/// Colour and depth storage for one render target
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    encoding: ColorEncoding,
    color: Vec<u8>,
    depth: Vec<f32>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32, encoding: ColorEncoding) -> Self {
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            encoding,
            color: vec![0; size * 4],
            depth: vec![f32::INFINITY; size],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self, color: Color) {
        let px = self.encode(color);
        for chunk in self.color.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
        self.depth.fill(f32::INFINITY);
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [self.color[i], self.color[i + 1], self.color[i + 2], self.color[i + 3]]
    }

    /// Row-major RGBA bytes, top row first
    pub fn as_bytes(&self) -> &[u8] {
        &self.color
    }

    pub fn into_image(self) -> RgbaImage {
        let (width, height) = (self.width, self.height);
        RgbaImage::from_raw(width, height, self.color).unwrap_or_else(|| RgbaImage::new(width, height))
    }

    fn encode(&self, color: Color) -> [u8; 4] {
        match self.encoding {
            ColorEncoding::Linear => color.to_rgba8(),
            ColorEncoding::Srgb => color.to_srgb8(),
        }
    }

    fn write(&mut self, index: usize, depth: f32, color: Color) {
        let px = self.encode(color);
        self.depth[index] = depth;
        self.color[index * 4..index * 4 + 4].copy_from_slice(&px);
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new(0, 0, ColorEncoding::Linear)
    }
}

/// One mesh drawn with a material per triangle slot
pub struct DrawCall<'a> {
    pub mesh: &'a Mesh,
    pub model: Matrix4<f32>,
    pub materials: &'a [&'a dyn SurfaceShader],
}

impl<'a> DrawCall<'a> {
    pub fn new(mesh: &'a Mesh, materials: &'a [&'a dyn SurfaceShader]) -> Self {
        Self {
            mesh,
            model: Matrix4::identity(),
            materials,
        }
    }

    pub fn with_model(mut self, model: Matrix4<f32>) -> Self {
        self.model = model;
        self
    }
}

/// The renderer's mutable state: screen buffer, bound target, clear colour
#[derive(Debug)]
pub struct RenderContext {
    screen: FrameBuffer,
    offscreen: Option<FrameBuffer>,
    clear_color: Color,
    max_anisotropy: u8,
}

impl RenderContext {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            screen: FrameBuffer::new(width, height, ColorEncoding::Srgb),
            offscreen: None,
            clear_color: Color::BLACK,
            max_anisotropy: 16,
        }
    }

    pub fn screen(&self) -> &FrameBuffer {
        &self.screen
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) != (self.screen.width, self.screen.height) {
            self.screen = FrameBuffer::new(width, height, ColorEncoding::Srgb);
        }
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    pub fn max_anisotropy(&self) -> u8 {
        self.max_anisotropy
    }

    pub fn has_offscreen_target(&self) -> bool {
        self.offscreen.is_some()
    }

    /// Size of the buffer draws currently land in
    pub fn target_size(&self) -> (u32, u32) {
        let target = self.offscreen.as_ref().unwrap_or(&self.screen);
        (target.width, target.height)
    }

    /// Bind `target` and `clear_color` until the returned pass is dropped
    pub fn bind_offscreen(&mut self, target: FrameBuffer, clear_color: Color) -> OffscreenPass<'_> {
        let previous_target = self.offscreen.replace(target);
        let previous_clear = std::mem::replace(&mut self.clear_color, clear_color);
        OffscreenPass {
            ctx: self,
            previous_target: Some(previous_target),
            previous_clear,
        }
    }

    pub fn clear(&mut self) {
        let color = self.clear_color;
        self.target_mut().clear(color);
    }

    fn target_mut(&mut self) -> &mut FrameBuffer {
        self.offscreen.as_mut().unwrap_or(&mut self.screen)
    }

    pub fn draw(&mut self, camera: &Camera, call: &DrawCall<'_>, ctx: &ShadeContext<'_>) {
        let view_projection = camera.view_projection();
        let target = self.offscreen.as_mut().unwrap_or(&mut self.screen);
        let mut raster = TriangleRaster {
            target,
            view_projection,
            camera_position: camera.position,
            orthographic: matches!(camera.mode, ProjectionMode::Orthographic(_)),
            view_axis: (camera.target - camera.position)
                .try_normalize(1e-9)
                .unwrap_or_else(|| -Vector3::z()),
        };
        for triangle in &call.mesh.triangles {
            let Some(shader) = call.materials.get(triangle.material) else {
                continue;
            };
            raster.draw_triangle(triangle, &call.model, *shader, ctx);
        }
    }
}

/// Scoped offscreen binding; restores the previous target on drop
pub struct OffscreenPass<'a> {
    ctx: &'a mut RenderContext,
    previous_target: Option<Option<FrameBuffer>>,
    previous_clear: Color,
}

impl OffscreenPass<'_> {
    /// Take the rendered target; the previous binding is restored
    pub fn finish(mut self) -> FrameBuffer {
        let target = self.ctx.offscreen.take().unwrap_or_default();
        self.ctx.offscreen = self.previous_target.take().flatten();
        target
    }
}

impl Deref for OffscreenPass<'_> {
    type Target = RenderContext;

    fn deref(&self) -> &RenderContext {
        self.ctx
    }
}

impl DerefMut for OffscreenPass<'_> {
    fn deref_mut(&mut self) -> &mut RenderContext {
        self.ctx
    }
}

impl Drop for OffscreenPass<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous_target.take() {
            self.ctx.offscreen = previous;
        }
        self.ctx.clear_color = self.previous_clear;
    }
}

struct ScreenVertex {
    projected: ProjectedPoint,
    world: Point3<f32>,
    normal: Vector3<f32>,
    uv: Vector2<f32>,
}

struct TriangleRaster<'t> {
    target: &'t mut FrameBuffer,
    view_projection: Matrix4<f32>,
    camera_position: Point3<f32>,
    orthographic: bool,
    view_axis: Vector3<f32>,
}

impl TriangleRaster<'_> {
    fn draw_triangle(
        &mut self,
        triangle: &Triangle,
        model: &Matrix4<f32>,
        shader: &dyn SurfaceShader,
        ctx: &ShadeContext<'_>,
    ) {
        let (width, height) = (self.target.width, self.target.height);
        let mut verts = Vec::with_capacity(3);
        for vertex in &triangle.vertices {
            let world = model.transform_point(&shader.displace(vertex, ctx));
            let Some(projected) = Camera::project_with(&self.view_projection, &world, width, height) else {
                return; // Triangle crosses the near plane
            };
            verts.push(ScreenVertex {
                projected,
                world,
                normal: model
                    .transform_vector(&vertex.normal)
                    .try_normalize(1e-9)
                    .unwrap_or_else(Vector3::z),
                uv: vertex.uv.coords,
            });
        }
        let (v0, v1, v2) = (&verts[0], &verts[1], &verts[2]);
        let (p0, p1, p2) = (v0.projected, v1.projected, v2.projected);

        // Screen Y points down, so counter-clockwise triangles have negative area
        let area = (p1.x - p0.x) * (p2.y - p0.y) - (p2.x - p0.x) * (p1.y - p0.y);
        if area.abs() < 1e-9 {
            return;
        }
        let front_facing = area < 0.0;
        match shader.side() {
            FaceSide::Front if !front_facing => return,
            FaceSide::Back if front_facing => return,
            _ => {}
        }

        let (tangent, bitangent) = tangent_frame(v0, v1, v2);

        // Bounding box
        let min_x = p0.x.min(p1.x).min(p2.x).floor() as i64;
        let max_x = p0.x.max(p1.x).max(p2.x).ceil() as i64;
        let min_y = p0.y.min(p1.y).min(p2.y).floor() as i64;
        let max_y = p0.y.max(p1.y).max(p2.y).ceil() as i64;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(width as i64 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(height as i64 - 1);

        let corners = ((p0.x, p0.y), (p1.x, p1.y), (p2.x, p2.y));
        let inv_w = [p0.inv_w, p1.inv_w, p2.inv_w];
        let uv_at = |px: f32, py: f32| -> Option<Vector2<f32>> {
            let (w0, w1, w2) = barycentric(corners.0, corners.1, corners.2, (px, py))?;
            let weights = perspective_weights([w0, w1, w2], inv_w)?;
            Some(v0.uv * weights[0] + v1.uv * weights[1] + v2.uv * weights[2])
        };

        // Scanline rasterization
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                // Barycentric coordinates
                let Some((w0, w1, w2)) = barycentric(corners.0, corners.1, corners.2, (px, py)) else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                // Interpolate depth
                let depth = w0 * p0.depth + w1 * p1.depth + w2 * p2.depth;
                if !(-1.0..=1.0).contains(&depth) {
                    continue;
                }
                let idx = y as usize * width as usize + x as usize;
                if depth >= self.target.depth[idx] {
                    continue;
                }

                let Some(weights) = perspective_weights([w0, w1, w2], inv_w) else {
                    continue;
                };
                let uv = v0.uv * weights[0] + v1.uv * weights[1] + v2.uv * weights[2];
                let duv_dx = uv_at(px + 1.0, py).map(|n| n - uv).unwrap_or_else(Vector2::zeros);
                let duv_dy = uv_at(px, py + 1.0).map(|n| n - uv).unwrap_or_else(Vector2::zeros);
                let position = Point3::from(
                    v0.world.coords * weights[0] + v1.world.coords * weights[1] + v2.world.coords * weights[2],
                );
                let mut normal = (v0.normal * weights[0] + v1.normal * weights[1] + v2.normal * weights[2])
                    .try_normalize(1e-9)
                    .unwrap_or_else(Vector3::z);
                if !front_facing {
                    normal = -normal;
                }
                let view_dir = if self.orthographic {
                    -self.view_axis
                } else {
                    (self.camera_position - position)
                        .try_normalize(1e-9)
                        .unwrap_or_else(|| -self.view_axis)
                };

                let fragment = Fragment {
                    uv,
                    duv_dx,
                    duv_dy,
                    position,
                    normal,
                    tangent,
                    bitangent,
                    view_dir,
                    front_facing,
                };
                let color = shader.shade(&fragment, ctx);
                self.target.write(idx, depth, color);
            }
        }
    }
}

/// Barycentric weights corrected for perspective, from screen weights and 1/w
fn perspective_weights(screen: [f32; 3], inv_w: [f32; 3]) -> Option<[f32; 3]> {
    let a = screen[0] * inv_w[0];
    let b = screen[1] * inv_w[1];
    let c = screen[2] * inv_w[2];
    let sum = a + b + c;
    if sum.abs() < 1e-12 {
        return None;
    }
    Some([a / sum, b / sum, c / sum])
}

/// Per-triangle tangent and bitangent from world positions and UVs
fn tangent_frame(v0: &ScreenVertex, v1: &ScreenVertex, v2: &ScreenVertex) -> (Vector3<f32>, Vector3<f32>) {
    let e1 = v1.world - v0.world;
    let e2 = v2.world - v0.world;
    let d1 = v1.uv - v0.uv;
    let d2 = v2.uv - v0.uv;
    let det = d1.x * d2.y - d2.x * d1.y;
    let normal = v0.normal;
    if det.abs() > 1e-12 {
        let r = 1.0 / det;
        let tangent = (e1 * d2.y - e2 * d1.y) * r;
        let bitangent = (e2 * d1.x - e1 * d2.x) * r;
        if let (Some(t), Some(b)) = (tangent.try_normalize(1e-9), bitangent.try_normalize(1e-9)) {
            return (t, b);
        }
    }
    // No usable UVs: any frame around the normal
    let helper = if normal.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
    let tangent = helper.cross(&normal).try_normalize(1e-9).unwrap_or_else(Vector3::x);
    (tangent, normal.cross(&tangent))
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-9 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::OrthoBounds;
    use crate::shader::UnlitShader;

    fn ortho() -> Camera {
        Camera::orthographic(OrthoBounds::centered(2.0, 2.0), 1.0, 0.1, 10.0)
    }

    #[test]
    fn test_offscreen_pass_restores_binding() {
        let mut ctx = RenderContext::new(4, 4);
        ctx.set_clear_color(Color::new(0.2, 0.4, 0.6));
        {
            let mut pass = ctx.bind_offscreen(FrameBuffer::new(8, 8, ColorEncoding::Linear), Color::WHITE);
            assert_eq!(pass.clear_color(), Color::WHITE);
            assert_eq!(pass.target_size(), (8, 8));
            pass.clear();
            let target = pass.finish();
            assert_eq!(target.pixel(3, 3), [255, 255, 255, 255]);
        }
        assert!(!ctx.has_offscreen_target());
        assert_eq!(ctx.clear_color(), Color::new(0.2, 0.4, 0.6));
        assert_eq!(ctx.target_size(), (4, 4));
    }

    #[test]
    fn test_nested_passes_unwind_in_order() {
        let mut ctx = RenderContext::new(4, 4);
        let mut outer = ctx.bind_offscreen(FrameBuffer::new(8, 8, ColorEncoding::Linear), Color::WHITE);
        {
            let inner = outer.bind_offscreen(FrameBuffer::new(2, 2, ColorEncoding::Linear), Color::BLACK);
            assert_eq!(inner.target_size(), (2, 2));
        }
        assert_eq!(outer.target_size(), (8, 8));
        assert_eq!(outer.clear_color(), Color::WHITE);
        drop(outer);
        assert_eq!(ctx.target_size(), (4, 4));
    }

    #[test]
    fn test_panicking_pass_still_restores() {
        let mut ctx = RenderContext::new(4, 4);
        ctx.set_clear_color(Color::BLACK);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _pass = ctx.bind_offscreen(FrameBuffer::new(8, 8, ColorEncoding::Linear), Color::WHITE);
            panic!("pass failed");
        }));
        assert!(result.is_err());
        assert!(!ctx.has_offscreen_target());
        assert_eq!(ctx.clear_color(), Color::BLACK);
    }

    #[test]
    fn test_draw_fills_covered_pixels_only() {
        let mut ctx = RenderContext::new(1, 1);
        let mesh = Mesh::plane(1.0, 1.0);
        let black = UnlitShader::new(Color::BLACK);
        let materials: [&dyn SurfaceShader; 1] = [&black];
        let mut pass = ctx.bind_offscreen(FrameBuffer::new(20, 20, ColorEncoding::Linear), Color::WHITE);
        pass.clear();
        pass.draw(&ortho(), &DrawCall::new(&mesh, &materials), &ShadeContext::unlit());
        let target = pass.finish();

        // The plane covers the middle half of a 2x2 view volume
        assert_eq!(target.pixel(10, 10), [0, 0, 0, 255]);
        assert_eq!(target.pixel(6, 6), [0, 0, 0, 255]);
        assert_eq!(target.pixel(2, 2), [255, 255, 255, 255]);
        assert_eq!(target.pixel(17, 10), [255, 255, 255, 255]);
    }

    #[test]
    fn test_front_side_shader_culls_back_faces() {
        struct FrontOnly;
        impl SurfaceShader for FrontOnly {
            fn shade(&self, _f: &Fragment, _c: &ShadeContext<'_>) -> Color {
                Color::BLACK
            }
        }
        let mut ctx = RenderContext::new(10, 10);
        ctx.set_clear_color(Color::WHITE);
        ctx.clear();
        let mut mesh = Mesh::plane(1.0, 1.0);
        for t in &mut mesh.triangles {
            t.vertices.swap(1, 2);
        }
        let shader = FrontOnly;
        let materials: [&dyn SurfaceShader; 1] = [&shader];
        ctx.draw(&ortho(), &DrawCall::new(&mesh, &materials), &ShadeContext::unlit());
        assert_eq!(ctx.screen().pixel(5, 5), [255, 255, 255, 255]);
    }

    #[test]
    fn test_uv_interpolation_and_derivatives() {
        struct UvProbe;
        impl SurfaceShader for UvProbe {
            fn shade(&self, f: &Fragment, _c: &ShadeContext<'_>) -> Color {
                Color::new(f.uv.x, f.uv.y, f.duv_dx.x * 10.0)
            }
        }
        let mut ctx = RenderContext::new(1, 1);
        let mesh = Mesh::plane(2.0, 2.0);
        let probe = UvProbe;
        let materials: [&dyn SurfaceShader; 1] = [&probe];
        let mut pass = ctx.bind_offscreen(FrameBuffer::new(10, 10, ColorEncoding::Linear), Color::BLACK);
        pass.draw(&ortho(), &DrawCall::new(&mesh, &materials), &ShadeContext::unlit());
        let target = pass.finish();

        // Top-left pixel centre sits at uv (0.05, 0.95); one pixel is 0.1 in u
        let px = target.pixel(0, 0);
        assert_eq!(px[0], (0.05f32 * 255.0).round() as u8);
        assert_eq!(px[1], (0.95f32 * 255.0).round() as u8);
        assert_eq!(px[2], 255);
    }
}
