//! Drawing surface dimensions tracking the host window.

use glam::Vec2;

/// Pixel dimensions of the drawing surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSurface {
    pub width: u32,
    pub height: u32,
    /// Fraction of the host height the surface covers
    height_fraction: f32,
}

impl RenderSurface {
    pub fn new(host_width: u32, host_height: u32, height_fraction: f32) -> Self {
        let mut surface = Self {
            width: 0,
            height: 0,
            height_fraction: height_fraction.clamp(0.0, 1.0),
        };
        surface.resize(host_width, host_height);
        surface
    }

    /// Track new host dimensions. Returns whether the size changed.
    pub fn resize(&mut self, host_width: u32, host_height: u32) -> bool {
        let width = host_width;
        let height = (host_height as f32 * self.height_fraction).floor() as u32;
        if (width, height) == (self.width, self.height) {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }

    /// Point at the given fractions of width and height
    pub fn point_at(&self, fx: f32, fy: f32) -> Vec2 {
        Vec2::new(self.width as f32 * fx, self.height as f32 * fy)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_tracks_host() {
        let mut surface = RenderSurface::new(800, 600, 1.0);
        assert!(surface.resize(1920, 1080));
        assert_eq!((surface.width, surface.height), (1920, 1080));
    }

    #[test]
    fn test_resize_is_idempotent() {
        let mut surface = RenderSurface::new(800, 600, 1.0);
        assert!(surface.resize(1024, 768));
        assert!(!surface.resize(1024, 768));
        assert_eq!((surface.width, surface.height), (1024, 768));
    }

    #[test]
    fn test_height_fraction() {
        let mut surface = RenderSurface::new(800, 600, 0.8);
        assert_eq!((surface.width, surface.height), (800, 480));
        surface.resize(1000, 1001);
        assert_eq!(surface.height, 800);
    }

    #[test]
    fn test_point_at() {
        let surface = RenderSurface::new(900, 600, 1.0);
        assert_eq!(surface.point_at(0.5, 1.0 / 3.0), Vec2::new(450.0, 200.0));
    }
}
