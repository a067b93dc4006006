// Alignment snapping for a moving rect against its siblings.
//
// Direct snapping is resolved per axis over an ordered candidate list
// (sibling start/center/end, then the container origin and center). The
// gap pass runs afterwards over the snapped rect. Both passes are pure; the
// accelerated backend shares `best_match` ordering and `assemble` so the two
// paths produce identical results.

use serde::{Deserialize, Serialize};

use crate::geometry::{Axis, Orientation, Rect, edges_of, overlap_on};

pub const DEFAULT_THRESHOLD: f64 = 8.0;
const GAP_EPS: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideKind {
    Edge,
    Center,
    Gap,
}

/// A line the overlay draws for one frame. `position` is the coordinate on
/// the axis the guide marks (x for vertical guides); `start`/`end` is the
/// span along the line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapGuide {
    pub orientation: Orientation,
    pub position: f64,
    pub kind: GuideKind,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SnapResult {
    pub x: f64,
    pub y: f64,
    pub guides: Vec<SnapGuide>,
}

impl SnapResult {
    pub fn unsnapped(moving: &Rect) -> Self {
        Self {
            x: moving.left,
            y: moving.top,
            guides: Vec::new(),
        }
    }

    /// The moving rect placed at the resolved position.
    pub fn rect(&self, moving: &Rect) -> Rect {
        moving.moved_to(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapOptions {
    pub threshold: f64,
    /// Frame of the container in child coordinates. Its origin and center
    /// become snap targets after every sibling candidate.
    pub container: Option<Rect>,
    pub gap_snapping: bool,
}

impl Default for SnapOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            container: None,
            gap_snapping: true,
        }
    }
}

impl SnapOptions {
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.threshold.is_nan() && self.threshold > 0.0
    }
}

pub fn resolve_snap(moving: &Rect, siblings: &[Rect], threshold: f64) -> SnapResult {
    resolve_snap_with(moving, siblings, &SnapOptions::with_threshold(threshold))
}

pub fn resolve_snap_with(moving: &Rect, siblings: &[Rect], options: &SnapOptions) -> SnapResult {
    if siblings.is_empty() || !options.is_enabled() {
        return SnapResult::unsnapped(moving);
    }
    let container = options.container.as_ref();
    let x_candidates = axis_candidates(siblings, container, Axis::X);
    let y_candidates = axis_candidates(siblings, container, Axis::Y);
    let x = best_match(moving, &x_candidates, Axis::X, options.threshold)
        .map(|m| (m, x_candidates[m.candidate]));
    let y = best_match(moving, &y_candidates, Axis::Y, options.threshold)
        .map(|m| (m, y_candidates[m.candidate]));
    assemble(moving, siblings, options, x, y)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Candidate {
    pub value: f64,
    pub kind: GuideKind,
    /// Rect the candidate belongs to; used for the guide span.
    pub source: Rect,
}

pub(crate) fn axis_candidates(siblings: &[Rect], container: Option<&Rect>, axis: Axis) -> Vec<Candidate> {
    let mut out = Vec::with_capacity(siblings.len() * 3 + 2);
    for rect in siblings {
        for (idx, value) in edges_of(rect, axis).into_iter().enumerate() {
            out.push(Candidate {
                value,
                kind: if idx == 1 {
                    GuideKind::Center
                } else {
                    GuideKind::Edge
                },
                source: *rect,
            });
        }
    }
    if let Some(frame) = container {
        out.push(Candidate {
            value: frame.start(axis),
            kind: GuideKind::Edge,
            source: *frame,
        });
        out.push(Candidate {
            value: frame.center(axis),
            kind: GuideKind::Center,
            source: *frame,
        });
    }
    out
}

/// A moving edge (start/center/end) within threshold of a candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AxisMatch {
    pub candidate: usize,
    pub edge: usize,
    pub distance: f64,
}

impl AxisMatch {
    /// Smaller distance wins; exact ties go to the earlier candidate, then
    /// the earlier moving edge.
    pub(crate) fn beats(&self, other: &AxisMatch) -> bool {
        if self.distance != other.distance {
            return self.distance < other.distance;
        }
        (self.candidate, self.edge) < (other.candidate, other.edge)
    }
}

pub(crate) fn best_match(
    moving: &Rect,
    candidates: &[Candidate],
    axis: Axis,
    threshold: f64,
) -> Option<AxisMatch> {
    let edges = edges_of(moving, axis);
    let mut best: Option<AxisMatch> = None;
    for (candidate, target) in candidates.iter().enumerate() {
        for (edge, value) in edges.iter().enumerate() {
            let distance = (value - target.value).abs();
            if distance >= threshold {
                continue;
            }
            let found = AxisMatch {
                candidate,
                edge,
                distance,
            };
            if best.is_none_or(|current| found.beats(&current)) {
                best = Some(found);
            }
        }
    }
    best
}

/// Applies direct matches, runs the gap pass and emits guides.
pub(crate) fn assemble(
    moving: &Rect,
    siblings: &[Rect],
    options: &SnapOptions,
    x: Option<(AxisMatch, Candidate)>,
    y: Option<(AxisMatch, Candidate)>,
) -> SnapResult {
    let direct = [x, y];
    let mut rect = *moving;
    for (axis, found) in Axis::BOTH.into_iter().zip(direct) {
        if let Some((m, candidate)) = found {
            let edge = edges_of(moving, axis)[m.edge];
            rect = rect.with_start(axis, moving.start(axis) + (candidate.value - edge));
        }
    }

    let mut gaps: [Option<GapChoice>; 2] = [None, None];
    if options.gap_snapping {
        for (slot, axis) in Axis::BOTH.into_iter().enumerate() {
            let snapped = direct[slot].is_some();
            if let Some(choice) = gap_snap(&rect, siblings, axis, options.threshold, snapped) {
                rect = rect.with_start(axis, choice.start);
                gaps[slot] = Some(choice);
            }
        }
    }

    let mut guides = Vec::new();
    for (slot, axis) in Axis::BOTH.into_iter().enumerate() {
        if let Some((_, candidate)) = direct[slot] {
            guides.push(alignment_guide(&rect, &candidate, axis));
        }
        if let Some(choice) = &gaps[slot] {
            guides.extend(choice.guides(&rect, axis));
        }
    }

    SnapResult {
        x: rect.left,
        y: rect.top,
        guides,
    }
}

fn alignment_guide(rect: &Rect, candidate: &Candidate, axis: Axis) -> SnapGuide {
    let cross = axis.cross();
    SnapGuide {
        orientation: axis.orientation(),
        position: candidate.value,
        kind: candidate.kind,
        start: rect.start(cross).min(candidate.source.start(cross)),
        end: rect.end(cross).max(candidate.source.end(cross)),
    }
}

/// Empty space between two row members on an axis.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Gap {
    from: f64,
    to: f64,
    cross_start: f64,
    cross_end: f64,
    order: usize,
}

impl Gap {
    fn size(&self) -> f64 {
        self.to - self.from
    }

    fn guide(&self, axis: Axis) -> SnapGuide {
        SnapGuide {
            orientation: axis.orientation(),
            position: (self.from + self.to) / 2.0,
            kind: GuideKind::Gap,
            start: self.cross_start,
            end: self.cross_end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GapMatch {
    /// Gap to the neighbor before the moving rect equals an existing gap.
    Before { neighbor: Rect, existing: Gap },
    /// Gap to the neighbor after the moving rect equals an existing gap.
    After { neighbor: Rect, existing: Gap },
    /// Moving rect centered between both neighbors.
    Between { before: Rect, after: Rect },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct GapChoice {
    start: f64,
    matched: GapMatch,
}

impl GapChoice {
    fn guides(&self, rect: &Rect, axis: Axis) -> Vec<SnapGuide> {
        let cross = axis.cross();
        let between = |a: &Rect, b: &Rect| {
            Gap {
                from: a.end(axis),
                to: b.start(axis),
                cross_start: a.start(cross).min(b.start(cross)),
                cross_end: a.end(cross).max(b.end(cross)),
                order: 0,
            }
            .guide(axis)
        };
        match self.matched {
            GapMatch::Before { neighbor, existing } => {
                vec![between(&neighbor, rect), existing.guide(axis)]
            }
            GapMatch::After { neighbor, existing } => {
                vec![between(rect, &neighbor), existing.guide(axis)]
            }
            GapMatch::Between { before, after } => {
                vec![between(&before, rect), between(rect, &after)]
            }
        }
    }
}

fn gap_snap(
    rect: &Rect,
    siblings: &[Rect],
    axis: Axis,
    threshold: f64,
    locked: bool,
) -> Option<GapChoice> {
    let cross = axis.cross();
    let row: Vec<(usize, Rect)> = siblings
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, sibling)| overlap_on(sibling, rect, cross) > 0.0)
        .collect();
    if row.len() < 2 {
        return None;
    }
    let existing = existing_gaps(&row, rect, axis);
    let before = row
        .iter()
        .filter(|(_, s)| s.center(axis) < rect.center(axis) && s.end(axis) <= rect.start(axis) + threshold)
        .fold(None::<Rect>, |best, (_, s)| match best {
            Some(b) if b.end(axis) >= s.end(axis) => Some(b),
            _ => Some(*s),
        });
    let after = row
        .iter()
        .filter(|(_, s)| s.center(axis) > rect.center(axis) && s.start(axis) >= rect.end(axis) - threshold)
        .fold(None::<Rect>, |best, (_, s)| match best {
            Some(b) if b.start(axis) <= s.start(axis) => Some(b),
            _ => Some(*s),
        });

    let limit = if locked { GAP_EPS } else { threshold };
    let mut best: Option<(f64, GapChoice)> = None;
    let mut consider = |start: f64, matched: GapMatch| {
        let diff = (start - rect.start(axis)).abs();
        if diff < limit && best.is_none_or(|(d, _)| diff < d) {
            best = Some((diff, GapChoice { start, matched }));
        }
    };

    if let Some(neighbor) = before {
        for gap in &existing {
            consider(neighbor.end(axis) + gap.size(), GapMatch::Before {
                neighbor,
                existing: *gap,
            });
        }
    }
    if let Some(neighbor) = after {
        for gap in &existing {
            consider(
                neighbor.start(axis) - gap.size() - rect.extent(axis),
                GapMatch::After {
                    neighbor,
                    existing: *gap,
                },
            );
        }
    }
    if let (Some(before), Some(after)) = (before, after) {
        let free = after.start(axis) - before.end(axis) - rect.extent(axis);
        if free > 0.0 {
            consider(before.end(axis) + free / 2.0, GapMatch::Between { before, after });
        }
    }

    let (_, choice) = best?;
    Some(GapChoice {
        start: if locked { rect.start(axis) } else { choice.start },
        ..choice
    })
}

/// Positive gaps between consecutive row members that do not straddle the
/// moving rect, in sibling iteration order.
fn existing_gaps(row: &[(usize, Rect)], rect: &Rect, axis: Axis) -> Vec<Gap> {
    let cross = axis.cross();
    let mut sorted = row.to_vec();
    sorted.sort_by(|a, b| a.1.start(axis).total_cmp(&b.1.start(axis)));
    let mut gaps: Vec<Gap> = sorted
        .windows(2)
        .filter_map(|pair| {
            let (prev_idx, prev) = pair[0];
            let (next_idx, next) = pair[1];
            let from = prev.end(axis);
            let to = next.start(axis);
            if to - from <= 0.0 {
                return None;
            }
            if rect.start(axis) < to && rect.end(axis) > from {
                return None;
            }
            Some(Gap {
                from,
                to,
                cross_start: prev.start(cross).min(next.start(cross)),
                cross_end: prev.end(cross).max(next.end(cross)),
                order: prev_idx.min(next_idx),
            })
        })
        .collect();
    gaps.sort_by_key(|gap| gap.order);
    gaps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Rect {
        Rect::new(x, y, w, h)
    }

    fn vertical(guides: &[SnapGuide]) -> Vec<&SnapGuide> {
        guides
            .iter()
            .filter(|g| g.orientation == Orientation::Vertical)
            .collect()
    }

    #[test]
    fn left_edges_align_within_threshold() {
        let moving = rect(5.0, 0.0, 50.0, 50.0);
        let result = resolve_snap(&moving, &[rect(0.0, 0.0, 50.0, 50.0)], 8.0);
        assert_eq!(result.x, 0.0);
        let v = vertical(&result.guides);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].position, 0.0);
        assert_eq!(v[0].kind, GuideKind::Edge);
    }

    #[test]
    fn out_of_threshold_leaves_position() {
        let moving = rect(12.0, 100.0, 50.0, 50.0);
        let result = resolve_snap(&moving, &[rect(0.0, 0.0, 50.0, 30.0)], 8.0);
        assert_eq!(result, SnapResult::unsnapped(&moving));
    }

    #[test]
    fn threshold_is_exclusive() {
        let moving = rect(108.0, 500.0, 10.0, 10.0);
        let result = resolve_snap(&moving, &[rect(0.0, 0.0, 100.0, 100.0)], 8.0);
        assert_eq!(result.x, 108.0);
        assert!(result.guides.is_empty());
    }

    #[test]
    fn no_siblings_returns_input() {
        let moving = rect(3.0, 4.0, 10.0, 10.0);
        let options = SnapOptions {
            container: Some(rect(0.0, 0.0, 100.0, 100.0)),
            ..SnapOptions::default()
        };
        assert_eq!(resolve_snap_with(&moving, &[], &options), SnapResult::unsnapped(&moving));
    }

    #[test]
    fn disabled_threshold_never_snaps() {
        let moving = rect(1.0, 1.0, 10.0, 10.0);
        let siblings = [rect(0.0, 0.0, 10.0, 10.0)];
        for threshold in [0.0, -3.0, f64::NAN] {
            assert_eq!(resolve_snap(&moving, &siblings, threshold), SnapResult::unsnapped(&moving));
        }
    }

    #[test]
    fn closest_candidate_wins() {
        let moving = rect(100.0, 500.0, 20.0, 20.0);
        let siblings = [rect(0.0, 0.0, 95.0, 10.0), rect(102.0, 0.0, 10.0, 10.0)];
        let result = resolve_snap(&moving, &siblings, 8.0);
        assert_eq!(result.x, 102.0);
    }

    #[test]
    fn exact_ties_prefer_earlier_sibling() {
        // Left edge is 4 from the first sibling's right edge, right edge 4
        // from the second sibling's left edge.
        let moving = rect(50.0, 500.0, 100.0, 20.0);
        let siblings = [rect(0.0, 0.0, 46.0, 10.0), rect(154.0, 0.0, 10.0, 10.0)];
        let result = resolve_snap(&moving, &siblings, 8.0);
        assert_eq!(result.x, 46.0);
        assert_eq!(vertical(&result.guides)[0].position, 46.0);
    }

    #[test]
    fn centers_snap_with_center_guides() {
        let moving = rect(338.0, 200.0, 20.0, 20.0);
        let siblings = [rect(300.0, 0.0, 100.0, 100.0)];
        let result = resolve_snap(&moving, &siblings, 8.0);
        assert_eq!(result.x, 340.0);
        let v = vertical(&result.guides);
        assert_eq!(v[0].kind, GuideKind::Center);
        assert_eq!(v[0].position, 350.0);
        assert_eq!((v[0].start, v[0].end), (0.0, 220.0));
    }

    #[test]
    fn container_center_is_a_target() {
        let moving = rect(393.0, 900.0, 10.0, 10.0);
        let options = SnapOptions {
            container: Some(rect(0.0, 0.0, 800.0, 600.0)),
            gap_snapping: false,
            ..SnapOptions::default()
        };
        let result = resolve_snap_with(&moving, &[rect(0.0, 2000.0, 5.0, 5.0)], &options);
        assert_eq!(result.x, 395.0);
        assert_eq!(result.y, 900.0);
    }

    #[test]
    fn equal_gap_snaps_in_a_row() {
        // a | 20 | b | ~23 | moving
        let siblings = [rect(0.0, 0.0, 50.0, 50.0), rect(70.0, 0.0, 50.0, 50.0)];
        let moving = rect(143.0, 0.0, 50.0, 50.0);
        let options = SnapOptions::default();
        let result = resolve_snap_with(&moving, &siblings, &options);
        assert_eq!(result.x, 140.0);
        let gaps: Vec<&SnapGuide> = result
            .guides
            .iter()
            .filter(|g| g.kind == GuideKind::Gap)
            .collect();
        assert_eq!(gaps.len(), 2);
        assert_eq!(gaps[0].position, 130.0);
        assert_eq!(gaps[1].position, 60.0);
    }

    #[test]
    fn gap_pass_can_be_disabled() {
        let siblings = [rect(0.0, 0.0, 50.0, 50.0), rect(70.0, 0.0, 50.0, 50.0)];
        let moving = rect(143.0, 0.0, 50.0, 50.0);
        let options = SnapOptions {
            gap_snapping: false,
            ..SnapOptions::default()
        };
        let result = resolve_snap_with(&moving, &siblings, &options);
        assert_eq!(result.x, 143.0);
    }

    #[test]
    fn centered_between_neighbors() {
        let siblings = [rect(0.0, 0.0, 50.0, 50.0), rect(150.0, 0.0, 50.0, 50.0)];
        // Free space 50 around a 50 wide rect: centered start is 75.
        let moving = rect(70.0, 0.0, 50.0, 50.0);
        let result = resolve_snap_with(&moving, &siblings, &SnapOptions::default());
        assert_eq!(result.x, 75.0);
        let gaps: Vec<f64> = result
            .guides
            .iter()
            .filter(|g| g.kind == GuideKind::Gap)
            .map(|g| g.position)
            .collect();
        assert_eq!(gaps, vec![62.5, 137.5]);
    }

    fn gap_positions(result: &SnapResult) -> Vec<f64> {
        result
            .guides
            .iter()
            .filter(|g| g.kind == GuideKind::Gap)
            .map(|g| g.position)
            .collect()
    }

    #[test]
    fn before_neighbor_gap_wins_equal_adjustments() {
        // a 20 b | moving | c 30 d: matching the a-b gap on the left, the
        // same gap on the right and centering all land on x = 80.
        let siblings = [
            rect(0.0, 0.0, 20.0, 10.0),
            rect(40.0, 0.0, 20.0, 10.0),
            rect(120.0, 0.0, 20.0, 10.0),
            rect(170.0, 0.0, 20.0, 10.0),
        ];
        let moving = rect(83.0, 0.0, 20.0, 10.0);
        let result = resolve_snap_with(&moving, &siblings, &SnapOptions::default());
        assert_eq!(result.x, 80.0);
        assert_eq!(gap_positions(&result), vec![70.0, 30.0]);
    }

    #[test]
    fn equal_existing_gaps_follow_sibling_order() {
        // c-d is listed before a-b, so it is the gap reported.
        let siblings = [
            rect(120.0, 0.0, 20.0, 10.0),
            rect(160.0, 0.0, 20.0, 10.0),
            rect(0.0, 0.0, 20.0, 10.0),
            rect(40.0, 0.0, 20.0, 10.0),
        ];
        let moving = rect(83.0, 0.0, 20.0, 10.0);
        let result = resolve_snap_with(&moving, &siblings, &SnapOptions::default());
        assert_eq!(result.x, 80.0);
        assert_eq!(gap_positions(&result), vec![70.0, 150.0]);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let siblings = [rect(0.0, 0.0, 50.0, 50.0), rect(70.0, 3.0, 50.0, 50.0)];
        let moving = rect(141.0, 6.0, 50.0, 50.0);
        let a = resolve_snap(&moving, &siblings, 8.0);
        let b = resolve_snap(&moving, &siblings, 8.0);
        assert_eq!(a, b);
    }
}
