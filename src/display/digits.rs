//! Seven-segment digit encoding
//!
//! Maps the decimal digits 0-9 to the set of segments that are lit.
//! Bit positions follow the segment order top, top-left, top-right,
//! middle, bottom-left, bottom-right, bottom.

use bitflags::bitflags;

bitflags! {
    /// Segments lit for one glyph
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SegmentMask: u8 {
        const TOP = 1 << 0;
        const TOP_LEFT = 1 << 1;
        const TOP_RIGHT = 1 << 2;
        const MIDDLE = 1 << 3;
        const BOTTOM_LEFT = 1 << 4;
        const BOTTOM_RIGHT = 1 << 5;
        const BOTTOM = 1 << 6;
    }
}

/// One of the seven bars of a glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Top,
    TopLeft,
    TopRight,
    Middle,
    BottomLeft,
    BottomRight,
    Bottom,
}

impl Segment {
    /// All segments in bit order
    pub const ALL: [Segment; 7] = [
        Segment::Top,
        Segment::TopLeft,
        Segment::TopRight,
        Segment::Middle,
        Segment::BottomLeft,
        Segment::BottomRight,
        Segment::Bottom,
    ];

    pub const fn mask(self) -> SegmentMask {
        match self {
            Segment::Top => SegmentMask::TOP,
            Segment::TopLeft => SegmentMask::TOP_LEFT,
            Segment::TopRight => SegmentMask::TOP_RIGHT,
            Segment::Middle => SegmentMask::MIDDLE,
            Segment::BottomLeft => SegmentMask::BOTTOM_LEFT,
            Segment::BottomRight => SegmentMask::BOTTOM_RIGHT,
            Segment::Bottom => SegmentMask::BOTTOM,
        }
    }
}

const DIGIT_MASKS: [SegmentMask; 10] = [
    // 0
    SegmentMask::TOP
        .union(SegmentMask::TOP_LEFT)
        .union(SegmentMask::TOP_RIGHT)
        .union(SegmentMask::BOTTOM_LEFT)
        .union(SegmentMask::BOTTOM_RIGHT)
        .union(SegmentMask::BOTTOM),
    // 1
    SegmentMask::TOP_RIGHT.union(SegmentMask::BOTTOM_RIGHT),
    // 2
    SegmentMask::TOP
        .union(SegmentMask::TOP_RIGHT)
        .union(SegmentMask::MIDDLE)
        .union(SegmentMask::BOTTOM_LEFT)
        .union(SegmentMask::BOTTOM),
    // 3
    SegmentMask::TOP
        .union(SegmentMask::TOP_RIGHT)
        .union(SegmentMask::MIDDLE)
        .union(SegmentMask::BOTTOM_RIGHT)
        .union(SegmentMask::BOTTOM),
    // 4
    SegmentMask::TOP_LEFT
        .union(SegmentMask::TOP_RIGHT)
        .union(SegmentMask::MIDDLE)
        .union(SegmentMask::BOTTOM_RIGHT),
    // 5
    SegmentMask::TOP
        .union(SegmentMask::TOP_LEFT)
        .union(SegmentMask::MIDDLE)
        .union(SegmentMask::BOTTOM_RIGHT)
        .union(SegmentMask::BOTTOM),
    // 6
    SegmentMask::TOP
        .union(SegmentMask::TOP_LEFT)
        .union(SegmentMask::MIDDLE)
        .union(SegmentMask::BOTTOM_LEFT)
        .union(SegmentMask::BOTTOM_RIGHT)
        .union(SegmentMask::BOTTOM),
    // 7
    SegmentMask::TOP
        .union(SegmentMask::TOP_RIGHT)
        .union(SegmentMask::BOTTOM_RIGHT),
    // 8
    SegmentMask::all(),
    // 9
    SegmentMask::TOP
        .union(SegmentMask::TOP_LEFT)
        .union(SegmentMask::TOP_RIGHT)
        .union(SegmentMask::MIDDLE)
        .union(SegmentMask::BOTTOM_RIGHT)
        .union(SegmentMask::BOTTOM),
];

impl SegmentMask {
    /// Segments lit for `digit`, or `None` when it is not a decimal digit
    pub fn for_digit(digit: u8) -> Option<SegmentMask> {
        DIGIT_MASKS.get(usize::from(digit)).copied()
    }

    pub fn lit(self, segment: Segment) -> bool {
        self.contains(segment.mask())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit_segments(digit: u8) -> Vec<Segment> {
        let mask = SegmentMask::for_digit(digit).unwrap();
        Segment::ALL.into_iter().filter(|s| mask.lit(*s)).collect()
    }

    #[test]
    fn digit_table_matches_seven_segment_encoding() {
        use Segment::*;
        let expected: [&[Segment]; 10] = [
            &[Top, TopLeft, TopRight, BottomLeft, BottomRight, Bottom],
            &[TopRight, BottomRight],
            &[Top, TopRight, Middle, BottomLeft, Bottom],
            &[Top, TopRight, Middle, BottomRight, Bottom],
            &[TopLeft, TopRight, Middle, BottomRight],
            &[Top, TopLeft, Middle, BottomRight, Bottom],
            &[Top, TopLeft, Middle, BottomLeft, BottomRight, Bottom],
            &[Top, TopRight, BottomRight],
            &[Top, TopLeft, TopRight, Middle, BottomLeft, BottomRight, Bottom],
            &[Top, TopLeft, TopRight, Middle, BottomRight, Bottom],
        ];
        for (digit, segments) in expected.iter().enumerate() {
            assert_eq!(lit_segments(digit as u8), segments.to_vec(), "digit {}", digit);
        }
    }

    #[test]
    fn raw_bits_follow_segment_order() {
        assert_eq!(SegmentMask::for_digit(1).unwrap().bits(), 0b010_0100);
        assert_eq!(SegmentMask::for_digit(8).unwrap().bits(), 0b111_1111);
        for (bit, segment) in Segment::ALL.iter().enumerate() {
            assert_eq!(segment.mask().bits(), 1 << bit);
        }
    }

    #[test]
    fn out_of_range_digit_has_no_mask() {
        assert_eq!(SegmentMask::for_digit(10), None);
        assert_eq!(SegmentMask::for_digit(255), None);
    }
}
