//! Seven-segment clock rendering
//!
//! The render core is independent of the graphics backend. It talks to a
//! `SegmentCanvas`, which offers the handful of operations needed to draw
//! bars: clear, set a vec2 uniform, bind one of the two bar shapes and draw
//! it as a triangle strip. `ClockRenderer` turns an elapsed time into the
//! sequence of those calls for one frame.

pub mod digits;
pub mod geometry;
pub mod time;

use digits::SegmentMask;
use geometry::{BARS, BarShape, DIGIT_X_OFFSETS, ORIGIN, XY};
use log::debug;
use time::ClockReading;

/// Vec2 uniforms of the segment program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uniform {
    /// Glyph-space translation added to each vertex
    Offset,
    /// Glyph-space to clip-space scale
    Scale,
}

/// Drawing operations a graphics backend provides to the clock
pub trait SegmentCanvas {
    /// Clear the color buffer to the background
    fn clear(&mut self);

    fn set_uniform(&mut self, uniform: Uniform, value: XY);

    /// Bind the vertex data of `shape` to the position attribute
    fn bind_vertices(&mut self, shape: BarShape);

    /// Draw the bound vertices as a triangle strip
    fn draw_triangle_strip(&mut self, vertex_count: u32);
}

/// Result of a frame request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was drawn with this many bars
    Drawn { bars: usize },
    /// Same second as the last drawn frame, nothing was issued
    Unchanged,
}

/// Renderer context, created once at startup and passed every frame
#[derive(Debug, Default)]
pub struct ClockRenderer {
    skip_unchanged: bool,
    last_second: Option<u64>,
}

impl ClockRenderer {
    /// `skip_unchanged` enables the redundant-redraw guard
    pub fn new(skip_unchanged: bool) -> Self {
        Self {
            skip_unchanged,
            last_second: None,
        }
    }

    /// Forget the last drawn second so the next frame is always drawn
    pub fn invalidate(&mut self) {
        self.last_second = None;
    }

    /// Render one frame for a `width` x `height` viewport at `elapsed` seconds
    pub fn render<C>(&mut self, canvas: &mut C, width: u32, height: u32, elapsed: f64) -> FrameOutcome
    where
        C: SegmentCanvas + ?Sized,
    {
        let second = time::whole_seconds(elapsed);
        if self.skip_unchanged && self.last_second == Some(second) {
            debug!("Second {} already on screen, skipping frame", second);
            return FrameOutcome::Unchanged;
        }
        self.last_second = Some(second);

        canvas.clear();
        canvas.set_uniform(Uniform::Scale, geometry::scale_for_viewport(width, height));

        let reading = ClockReading::from_seconds(second);
        let bars: usize = reading
            .digits()
            .into_iter()
            .zip(DIGIT_X_OFFSETS)
            .map(|(digit, x)| draw_digit(&mut *canvas, digit, x))
            .sum();

        FrameOutcome::Drawn { bars }
    }
}

/// Draw the lit bars of `digit` with its glyph origin at `offset_x`
fn draw_digit<C>(canvas: &mut C, digit: u8, offset_x: f32) -> usize
where
    C: SegmentCanvas + ?Sized,
{
    let Some(mask) = SegmentMask::for_digit(digit) else {
        debug_assert!(false, "not a decimal digit: {}", digit);
        return 0;
    };

    let mut drawn = 0;
    for bar in BARS.iter().filter(|b| mask.lit(b.segment)) {
        let offset = ORIGIN + XY::new(offset_x, 0.0) + bar.offset;
        canvas.set_uniform(Uniform::Offset, offset);
        canvas.bind_vertices(bar.shape);
        canvas.draw_triangle_strip(bar.shape.vertex_count());
        drawn += 1;
    }
    drawn
}
