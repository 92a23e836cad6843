//! Offscreen gizmo drawing for headless runs

use sc_renderer::{
    GizmoCameraUniform, GizmoConfig, GizmoRenderer, GizmoRendererError, OFFSCREEN_COLOR_FORMAT,
    OFFSCREEN_DEPTH_FORMAT, headless_device,
};

use crate::viewport::Viewport;

/// Gizmo renderer with its own device.
///
/// Field order matters: the renderer releases its buffers before the device
/// goes away.
pub struct GizmoGpu {
    renderer: GizmoRenderer,
    queue: wgpu::Queue,
    device: wgpu::Device,
    frames: u64,
}

impl GizmoGpu {
    /// Acquire a device and compile the gizmo pipeline
    pub fn new(config: &GizmoConfig) -> Result<Self, GizmoRendererError> {
        let (device, queue) = headless_device()?;
        let renderer = GizmoRenderer::new(&device, OFFSCREEN_COLOR_FORMAT, OFFSCREEN_DEPTH_FORMAT, config)?;
        Ok(Self {
            renderer,
            queue,
            device,
            frames: 0,
        })
    }

    /// Draw the viewport's current gizmos offscreen
    pub fn draw(&mut self, viewport: &Viewport) {
        let camera = viewport.cameras().viewport_camera();
        let uniform = GizmoCameraUniform::new(&camera.view_matrix(), &camera.projection_matrix());
        let size = viewport.input().viewport_size;
        let size = (size.x.max(1.0) as u32, size.y.max(1.0) as u32);
        self.renderer
            .render_offscreen(&self.device, &self.queue, size, uniform, viewport.draw_list());
        self.frames += 1;
    }

    /// Frames drawn so far
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
