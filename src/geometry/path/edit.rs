use tracing::{debug, trace};

use super::{Path, PathElement, RawSubpath};
use crate::error::Result;
use crate::math::{try_normalize, Point2, TOLERANCE};

/// Control handles attached to an anchor point, as point indices.
#[derive(Debug, Default)]
struct AnchorLinks {
    incoming: Option<usize>,
    outgoing: Option<usize>,
    /// Anchor coinciding with this one where a subpath wraps onto its start.
    twin: Option<usize>,
}

impl RawSubpath {
    fn end_anchor(&self, k: usize) -> usize {
        self.elements[k].2.end - 1
    }

    fn incoming_handle(&self, k: usize) -> Option<usize> {
        let (_, element, range) = &self.elements[k];
        (*element == PathElement::CurveTo).then_some(range.start + 1)
    }

    fn outgoing_handle(&self, k: usize) -> Option<usize> {
        let (_, element, range) = &self.elements[k];
        (*element == PathElement::CurveTo).then_some(range.start)
    }
}

impl Path {
    /// Removes element `index` and its points.
    ///
    /// The neighbours reconnect through the point buffer: removing a drawing
    /// element joins the previous anchor to the next element, removing a
    /// `MoveTo` merges its subpath into the previous one. `MoveTo`s left
    /// without a following drawing element are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::PathError::IndexOutOfBounds`] if `index` is
    /// out of range.
    pub fn remove_element(&mut self, index: usize) -> Result<()> {
        let range = self.element_point_range(index)?;
        let removed = self.elements.remove(index);
        self.points.drain(range);
        trace!(?removed, index, "removed path element");
        self.normalize_moves();
        self.invalidate();
        Ok(())
    }

    fn normalize_moves(&mut self) {
        let mut changed = true;
        while changed {
            changed = false;

            match self.elements.first().copied() {
                Some(PathElement::Close) => {
                    self.elements.remove(0);
                    changed = true;
                    continue;
                }
                Some(first) if first.is_drawing() => {
                    let count = first.point_count();
                    self.points.drain(..count - 1);
                    self.elements[0] = PathElement::MoveTo;
                    changed = true;
                    continue;
                }
                _ => {}
            }

            let mut index = 0;
            let mut point = 0;
            while index < self.elements.len() {
                let element = self.elements[index];
                let next = self.elements.get(index + 1).copied();
                match (element, next) {
                    (PathElement::MoveTo, None | Some(PathElement::MoveTo)) => {
                        debug!(index, "dropping stranded move");
                        self.elements.remove(index);
                        self.points.remove(point);
                        changed = true;
                    }
                    (PathElement::MoveTo, Some(PathElement::Close)) => {
                        debug!(index, "dropping empty closed subpath");
                        self.elements.drain(index..index + 2);
                        self.points.remove(point);
                        changed = true;
                    }
                    (PathElement::Close, Some(PathElement::Close)) => {
                        self.elements.remove(index);
                        changed = true;
                    }
                    _ => {
                        point += element.point_count();
                        index += 1;
                    }
                }
            }
        }
    }

    /// Moves point `index` while keeping the curve structure around it.
    ///
    /// Moving an anchor drags the cubic handles attached to it. Moving a cubic
    /// handle re-aims the opposite handle of the same anchor through the
    /// anchor, keeping its length, so the join becomes smooth.
    /// Anchors where a subpath ends on its own start are treated as one.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::PathError::IndexOutOfBounds`] if `index` is
    /// out of range.
    pub fn set_point_structured(&mut self, index: usize, p: Point2) -> Result<()> {
        let (element_index, offset) = self.locate_point(index)?;
        let element = self.elements[element_index];

        if element == PathElement::CurveTo && offset < 2 {
            if let Some(anchor) = self.handle_anchor(element_index, offset) {
                let links = self.anchor_links(anchor);
                let pair = if offset == 0 {
                    links.incoming
                } else {
                    links.outgoing
                };
                if let Some(pair) = pair {
                    self.mirror_handle(anchor, index, pair, p);
                }
            }
        } else if element != PathElement::QuadTo || offset == 1 {
            let delta = p - self.points[index];
            let links = self.anchor_links(index);
            for handle in [links.incoming, links.outgoing].into_iter().flatten() {
                self.points[handle] += delta;
            }
            if let Some(twin) = links.twin {
                self.points[twin] = p;
            }
        }

        self.points[index] = p;
        self.invalidate();
        Ok(())
    }

    fn mirror_handle(&mut self, anchor: usize, handle: usize, pair: usize, p: Point2) {
        let a = self.points[anchor];
        let lv = (self.points[pair] - a).norm();
        if handle == pair || lv <= TOLERANCE {
            return;
        }
        if let Some(dir) = try_normalize(&(a - p)) {
            self.points[pair] = a + dir * lv;
        }
    }

    /// Anchor a cubic handle belongs to: the curve start for the first
    /// handle, the curve end for the second.
    fn handle_anchor(&self, element_index: usize, offset: usize) -> Option<usize> {
        let subpaths = self.raw_subpaths();
        let (sub, k) = subpaths.iter().find_map(|sub| {
            sub.elements
                .iter()
                .position(|(i, _, _)| *i == element_index)
                .map(|k| (sub, k))
        })?;
        if offset == 1 {
            Some(sub.end_anchor(k))
        } else if k == 0 {
            sub.move_index
                .and_then(|i| self.element_point_range(i).ok())
                .map(|range| range.start)
        } else {
            Some(sub.end_anchor(k - 1))
        }
    }

    fn anchor_links(&self, anchor: usize) -> AnchorLinks {
        for sub in self.raw_subpaths() {
            let n = sub.elements.len();
            let move_point = sub
                .move_index
                .and_then(|i| self.element_point_range(i).ok())
                .map(|range| range.start);
            let wraps = n > 0
                && move_point.is_some()
                && (self.points[sub.end_anchor(n - 1)] - sub.start).norm() <= TOLERANCE;

            if move_point == Some(anchor) {
                if n == 0 {
                    return AnchorLinks::default();
                }
                return AnchorLinks {
                    incoming: if wraps { sub.incoming_handle(n - 1) } else { None },
                    outgoing: sub.outgoing_handle(0),
                    twin: wraps.then(|| sub.end_anchor(n - 1)),
                };
            }
            if let Some(k) = (0..n).find(|&k| sub.end_anchor(k) == anchor) {
                let last = k + 1 == n;
                let outgoing = if !last {
                    sub.outgoing_handle(k + 1)
                } else if wraps {
                    sub.outgoing_handle(0)
                } else {
                    None
                };
                return AnchorLinks {
                    incoming: sub.incoming_handle(k),
                    outgoing,
                    twin: if last && wraps { move_point } else { None },
                };
            }
        }
        AnchorLinks::default()
    }

    /// Returns the path traversed in the opposite direction.
    ///
    /// Subpaths come out in reverse order, each starting at its former end
    /// and keeping its `Close`.
    #[must_use]
    pub fn reversed(&self) -> Path {
        let mut path = Path::with_winding_rule(self.winding_rule);
        for sub in self.raw_subpaths().iter().rev() {
            let mut anchors = Vec::with_capacity(sub.elements.len() + 1);
            anchors.push(sub.start);
            anchors.extend(sub.elements.iter().map(|(_, _, range)| self.points[range.end - 1]));

            path.push(PathElement::MoveTo, &anchors[anchors.len() - 1..]);
            for (k, (_, element, range)) in sub.elements.iter().enumerate().rev() {
                let points = &self.points[range.clone()];
                let target = anchors[k];
                match element {
                    PathElement::LineTo => path.push(PathElement::LineTo, &[target]),
                    PathElement::QuadTo => path.push(PathElement::QuadTo, &[points[0], target]),
                    PathElement::CurveTo => {
                        path.push(PathElement::CurveTo, &[points[1], points[0], target]);
                    }
                    PathElement::MoveTo | PathElement::Close => {}
                }
            }
            if sub.closed {
                path.close_path();
            }
        }
        path
    }
}
