//! Backend-agnostic draw commands produced by a simulation tick.

use glam::Vec2;

use super::particle::Color;

/// Axis-aligned rectangle in surface pixels (origin top-left, y down)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    /// Translucent rectangle over the whole surface (previous frames fade)
    Fade { rect: Rect, color: Color, alpha: f32 },

    /// Opaque spectrum bar
    Bar { rect: Rect, color: Color },

    /// Filled particle disc
    Circle {
        center: Vec2,
        radius: f32,
        color: Color,
        alpha: f32,
    },
}

/// Draw commands for one tick, in painter's order
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub commands: Vec<DrawCommand>,
}

impl Frame {
    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn bars(&self) -> impl Iterator<Item = (&Rect, &Color)> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Bar { rect, color } => Some((rect, color)),
            _ => None,
        })
    }

    /// (center, radius, alpha) of each circle
    pub fn circles(&self) -> impl Iterator<Item = (Vec2, f32, f32)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Circle {
                center,
                radius,
                alpha,
                ..
            } => Some((*center, *radius, *alpha)),
            _ => None,
        })
    }
}
