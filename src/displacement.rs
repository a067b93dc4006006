use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::{Axis, Rect, overlap};
use crate::index::Sibling;

/// New absolute top-left of a displaced sibling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

/// Siblings pushed out of the way of an in-flight drag. A sibling absent
/// from the map is unchanged.
pub type DisplacementMap = BTreeMap<String, Offset>;

/// Pushes every sibling that truly intersects `proposed` out along its axis
/// of smaller overlap, away from the dragged rect's center. Equal overlaps
/// push along x; equal centers push toward positive coordinates.
///
/// The sibling lands flush against the dragged rect. For a partial overlap
/// that is a move by the overlap amount; a sibling lying entirely inside
/// the dragged rect on the pushed axis moves further, past the far edge.
pub fn resolve_displacement(dragged_id: &str, proposed: &Rect, siblings: &[Sibling]) -> DisplacementMap {
    let mut out = DisplacementMap::new();
    for sibling in siblings {
        if sibling.id == dragged_id {
            continue;
        }
        let extents = overlap(proposed, &sibling.rect);
        if !extents.is_intersection() {
            continue;
        }
        let axis = if extents.dx <= extents.dy { Axis::X } else { Axis::Y };
        let pushed = push_out(proposed, &sibling.rect, axis);
        out.insert(
            sibling.id.clone(),
            Offset {
                x: pushed.left,
                y: pushed.top,
            },
        );
    }
    out
}

fn push_out(proposed: &Rect, sibling: &Rect, axis: Axis) -> Rect {
    let start = if proposed.center(axis) <= sibling.center(axis) {
        proposed.end(axis)
    } else {
        proposed.start(axis) - sibling.extent(axis)
    };
    sibling.with_start(axis, start)
}

/// Effective rect of a sibling given the current displacement.
pub fn displaced_rect(map: &DisplacementMap, id: &str, rect: &Rect) -> Rect {
    match map.get(id) {
        Some(offset) => rect.moved_to(offset.x, offset.y),
        None => *rect,
    }
}
