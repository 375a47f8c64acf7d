//! Sine plasma demo renderer.
//!
//! A self-contained content generator for bring-up and demos: four summed
//! sine terms over the plane, with a slowly orbiting centre, mapped to the
//! red and green channels. Purely a [`Renderer`] implementation; the
//! engine does not depend on it.

use core::f32::consts::PI;

use embedded_graphics::prelude::Point;
use micromath::F32Ext;

use crate::framebuffer::{FrameBuffer, Renderer};
use crate::Color;

/// Plasma animation state: one phase value advanced per frame.
pub struct Plasma {
    phase: f32,
}

impl Plasma {
    /// Start the animation at phase zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { phase: 0.0 }
    }
}

impl Default for Plasma {
    fn default() -> Self {
        Self::new()
    }
}

impl<const ROWS: usize, const COLS: usize> Renderer<ROWS, COLS> for Plasma {
    fn render(&mut self, frame: &mut FrameBuffer<ROWS, COLS>) {
        self.phase += 0.025;
        let t = self.phase;

        for y in 0..ROWS {
            let yy = y as f32 / ROWS as f32 - 0.5;
            for x in 0..COLS {
                let xx = x as f32 / COLS as f32 - 0.5;

                let mut v = (xx * 10.0 + t).sin();
                v += ((yy * 10.0 + t) / 2.0).sin();
                v += ((xx * 10.0 + yy * 10.0 + t) / 2.0).sin();
                let cx = xx + 0.5 * (t / 5.0).sin();
                let cy = yy + 0.5 * (t / 3.0).cos();
                v += ((100.0 * (cx * cx + cy * cy) + 1.0).sqrt() + t).sin();
                v /= 2.0;

                let r = (255.0 * (v * PI).sin().abs()) as u8;
                let g = (255.0 * (v * PI).cos().abs()) as u8;
                frame.set_pixel(Point::new(x as i32, y as i32), Color::new(r, g, 0));
            }
        }
    }
}
