//! Glyph geometry
//!
//! A glyph is built from two shared 6-vertex triangle strips, a horizontal
//! and a vertical bar, each with mitred ends so neighbouring bars meet at
//! 45 degrees. The seven `BARS` place those shapes inside a glyph whose
//! origin is its bottom-left corner, in glyph units. `BASE_SCALE` maps
//! glyph units to clip space.

use super::digits::Segment;
use glam::Vec2;

/// 2-component float vector used for positions, offsets and scales
pub type XY = Vec2;

/// Length of a bar along its long axis
pub const BAR_WIDTH: f32 = 5.0;
/// Thickness of a bar
pub const BAR_HEIGHT: f32 = 1.0;
/// Inset of the mitred tips
pub const TAPER_WIDTH: f32 = BAR_HEIGHT / 2.0;
/// Distance between the origins of neighbouring glyphs in a group
pub const DIGIT_GAP: f32 = BAR_WIDTH + TAPER_WIDTH + 1.0;

/// X origin of each of the six glyphs (HH MM SS), relative to the centre.
/// The group separators are fixed literals and do not follow `DIGIT_GAP`.
pub const DIGIT_X_OFFSETS: [f32; 6] = [
    -20.0 - 2.0 * DIGIT_GAP,
    -20.0 - DIGIT_GAP,
    -DIGIT_GAP,
    0.0,
    20.0,
    20.0 + DIGIT_GAP,
];

/// Clip-space scale before aspect correction
pub const BASE_SCALE: XY = Vec2::new(0.02, 0.03);

/// Shared origin added to every glyph offset
pub const ORIGIN: XY = Vec2::ZERO;

const TIP: f32 = BAR_HEIGHT * TAPER_WIDTH;

pub const HORIZONTAL_BAR: [XY; 6] = [
    Vec2::new(TIP, 0.0),                    // bottom-left
    Vec2::new(0.0, BAR_HEIGHT / 2.0),       // middle-left
    Vec2::new(BAR_WIDTH - TIP, 0.0),        // bottom-right
    Vec2::new(TIP, BAR_HEIGHT),             // top-left
    Vec2::new(BAR_WIDTH, BAR_HEIGHT / 2.0), // middle-right
    Vec2::new(BAR_WIDTH - TIP, BAR_HEIGHT), // top-right
];

pub const VERTICAL_BAR: [XY; 6] = [
    Vec2::new(0.0, TIP),
    Vec2::new(BAR_HEIGHT / 2.0, 0.0),
    Vec2::new(0.0, BAR_WIDTH - TIP),
    Vec2::new(BAR_HEIGHT, TIP),
    Vec2::new(BAR_HEIGHT / 2.0, BAR_WIDTH),
    Vec2::new(BAR_HEIGHT, BAR_WIDTH - TIP),
];

/// Which of the two shared strips a bar uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarShape {
    Horizontal,
    Vertical,
}

impl BarShape {
    pub const fn vertices(self) -> &'static [XY; 6] {
        match self {
            BarShape::Horizontal => &HORIZONTAL_BAR,
            BarShape::Vertical => &VERTICAL_BAR,
        }
    }

    pub const fn vertex_count(self) -> u32 {
        self.vertices().len() as u32
    }
}

/// A positioned bar within a glyph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub segment: Segment,
    pub offset: XY,
    pub shape: BarShape,
}

/// The seven bars of a glyph, in segment bit order
pub const BARS: [Bar; 7] = [
    Bar {
        segment: Segment::Top,
        offset: Vec2::new(TAPER_WIDTH, 2.0 * BAR_WIDTH),
        shape: BarShape::Horizontal,
    },
    Bar {
        segment: Segment::TopLeft,
        offset: Vec2::new(0.0, BAR_WIDTH + TAPER_WIDTH),
        shape: BarShape::Vertical,
    },
    Bar {
        segment: Segment::TopRight,
        offset: Vec2::new(BAR_WIDTH, BAR_WIDTH + TAPER_WIDTH),
        shape: BarShape::Vertical,
    },
    Bar {
        segment: Segment::Middle,
        offset: Vec2::new(TAPER_WIDTH, BAR_WIDTH),
        shape: BarShape::Horizontal,
    },
    Bar {
        segment: Segment::BottomLeft,
        offset: Vec2::new(0.0, TAPER_WIDTH),
        shape: BarShape::Vertical,
    },
    Bar {
        segment: Segment::BottomRight,
        offset: Vec2::new(BAR_WIDTH, TAPER_WIDTH),
        shape: BarShape::Vertical,
    },
    Bar {
        segment: Segment::Bottom,
        offset: Vec2::new(TAPER_WIDTH, 0.0),
        shape: BarShape::Horizontal,
    },
];

/// Scale uniform for a viewport: X fixed, Y stretched by the aspect ratio
/// so glyphs keep their proportions in pixels.
pub fn scale_for_viewport(width: u32, height: u32) -> XY {
    let ratio = if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    };
    Vec2::new(BASE_SCALE.x, BASE_SCALE.y * ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_bar_is_horizontal_bar_transposed() {
        for (h, v) in HORIZONTAL_BAR.iter().zip(VERTICAL_BAR.iter()) {
            assert_eq!(Vec2::new(h.y, h.x), *v);
        }
    }

    #[test]
    fn horizontal_bar_spans_width_and_height() {
        let min = HORIZONTAL_BAR.iter().fold(Vec2::splat(f32::MAX), |a, v| a.min(*v));
        let max = HORIZONTAL_BAR.iter().fold(Vec2::splat(f32::MIN), |a, v| a.max(*v));
        assert_eq!(min, Vec2::ZERO);
        assert_eq!(max, Vec2::new(BAR_WIDTH, BAR_HEIGHT));
    }

    #[test]
    fn bars_are_in_segment_order() {
        for (bar, segment) in BARS.iter().zip(Segment::ALL) {
            assert_eq!(bar.segment, segment);
        }
        let rows: Vec<f32> = BARS
            .iter()
            .filter(|b| b.shape == BarShape::Horizontal)
            .map(|b| b.offset.y)
            .collect();
        assert_eq!(rows, vec![2.0 * BAR_WIDTH, BAR_WIDTH, 0.0]);
    }

    #[test]
    fn digit_offsets_keep_literal_group_spacing() {
        assert_eq!(DIGIT_GAP, 6.5);
        assert_eq!(DIGIT_X_OFFSETS, [-33.0, -26.5, -6.5, 0.0, 20.0, 26.5]);
    }

    #[test]
    fn scale_follows_aspect_ratio() {
        let wide = scale_for_viewport(800, 600);
        assert_eq!(wide.x, BASE_SCALE.x);
        assert_eq!(wide.y, BASE_SCALE.y * (800.0 / 600.0));
        assert_eq!(scale_for_viewport(1024, 1024), BASE_SCALE);
        assert_eq!(scale_for_viewport(640, 0), BASE_SCALE);
    }

    #[test]
    fn both_shapes_have_six_vertices() {
        assert_eq!(BarShape::Horizontal.vertex_count(), 6);
        assert_eq!(BarShape::Vertical.vertex_count(), 6);
    }
}
