//! Subdivision of long measured segments into near-equal pieces

use geo::Point;

use crate::{
    Error,
    model::{MeasuredSegment, RoadEdge, SegmentId},
};

/// How a matched segment is to be split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitPlan {
    /// Matched a roundabout edge, kept as a single unit
    Roundabout,
    /// Short enough already
    Atomic,
    /// Split into this many pieces, always at least 2
    Pieces(usize),
}

impl SplitPlan {
    /// `round(length / target)` pieces, halves rounded away from zero,
    /// unless the matched edge is a roundabout or the result is below 2.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn plan(length_m: f64, target_m: f64, matched: &RoadEdge) -> Self {
        if matched.is_roundabout() {
            return SplitPlan::Roundabout;
        }
        let pieces = (length_m / target_m).round();
        if pieces.is_finite() && pieces >= 2.0 {
            SplitPlan::Pieces(pieces as usize)
        } else {
            SplitPlan::Atomic
        }
    }

    /// Split marker as stored in diagnostics: `0` for roundabouts, `-1` for
    /// atomic segments, otherwise the piece count
    pub fn marker(self) -> i64 {
        match self {
            SplitPlan::Roundabout => 0,
            SplitPlan::Atomic => -1,
            SplitPlan::Pieces(n) => i64::try_from(n).unwrap_or(i64::MAX),
        }
    }
}

/// Cut `segment` into `pieces` consecutive sub-segments of equal length.
///
/// Interior points are interpolated linearly; the first piece starts exactly
/// at the segment start, the last one ends exactly at its end and every
/// piece starts where the previous one ended.
#[allow(clippy::cast_precision_loss)]
pub fn split_segment(
    segment: &MeasuredSegment,
    pieces: usize,
    next_id: &mut SegmentId,
) -> Vec<MeasuredSegment> {
    if pieces < 2 {
        return vec![segment.clone()];
    }

    let delta = segment.end.0 - segment.start.0;
    let points: Vec<Point<f64>> = (0..=pieces)
        .map(|i| match i {
            0 => segment.start,
            i if i == pieces => segment.end,
            i => Point(segment.start.0 + delta * (i as f64 / pieces as f64)),
        })
        .collect();

    points
        .windows(2)
        .map(|pair| {
            let piece = MeasuredSegment {
                id: *next_id,
                parent: Some(segment.id),
                start: pair[0],
                end: pair[1],
                traffic_level: segment.traffic_level,
            };
            *next_id += 1;
            piece
        })
        .collect()
}

/// Apply one plan per segment. Unsplit segments are passed through as they
/// are; pieces get fresh ids from `next_id`.
///
/// # Errors
///
/// Returns [`Error::MatchCountMismatch`] when `plans` and `segments` are not
/// aligned one to one.
pub fn split_segments(
    segments: &[MeasuredSegment],
    plans: &[SplitPlan],
    next_id: &mut SegmentId,
) -> Result<Vec<MeasuredSegment>, Error> {
    if segments.len() != plans.len() {
        return Err(Error::MatchCountMismatch {
            expected: segments.len(),
            got: plans.len(),
        });
    }

    let mut result = Vec::with_capacity(segments.len());
    for (segment, plan) in segments.iter().zip(plans) {
        match plan {
            SplitPlan::Pieces(n) => result.extend(split_segment(segment, *n, next_id)),
            SplitPlan::Roundabout | SplitPlan::Atomic => result.push(segment.clone()),
        }
    }
    Ok(result)
}
