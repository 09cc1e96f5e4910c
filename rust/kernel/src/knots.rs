// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Knot resolution: mitering the rectangles of axes that meet at a point.
//!
//! Around a knot, every incident axis is turned into an arm pointing away from
//! the knot, and the arms are sorted by their angle in the XZ plane. Walking
//! adjacent arm pairs, the long edges facing each other are intersected and
//! both rectangles' corners are moved onto the intersection. When three or
//! more axes meet and their corners enclose an area, that polygon is the gap
//! in the middle of the junction and gets a filler face.

use nalgebra::Vector3;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::error::Result;
use crate::offset_faces::OffsetFaces;
use crate::triangulation::area_normal;
use crate::vector::{from_vector, horizontal_angle, intersect_implicit, round_vector, to_vector, up};
use crate::{Coordinates, Id};

/// One axis seen from a knot.
#[derive(Debug, Clone, Copy)]
struct Arm {
    axis: Id,
    /// Whether the knot is the axis' start point.
    at_start: bool,
    /// `up × d`, with `d` the unit direction pointing away from the knot.
    side: Vector3<f64>,
    width: f64,
    /// Axis offset measured along `side`.
    offset: f64,
    angle: f64,
}

impl Arm {
    /// Edge on the `-side` half, facing the next arm counter to `side`.
    fn trailing_anchor(&self, knot: &Vector3<f64>) -> Vector3<f64> {
        knot + self.side * (self.offset - self.width / 2.0)
    }

    /// Edge on the `+side` half, facing the previous arm.
    fn leading_anchor(&self, knot: &Vector3<f64>) -> Vector3<f64> {
        knot + self.side * (self.offset + self.width / 2.0)
    }

    /// Rectangle corner index moved by the trailing edge.
    fn trailing_corner(&self) -> usize {
        if self.at_start {
            0
        } else {
            2
        }
    }

    /// Rectangle corner index moved by the leading edge.
    fn leading_corner(&self) -> usize {
        if self.at_start {
            1
        } else {
            3
        }
    }
}

/// Implicit line `side · X = side · anchor` in the XZ plane.
fn implicit(side: &Vector3<f64>, anchor: &Vector3<f64>) -> (f64, f64, f64) {
    (side.x, side.z, side.x * anchor.x + side.z * anchor.z)
}

// =============================================================================
// Knot maintenance
// =============================================================================

impl OffsetFaces {
    /// Re-resolves every knot in `knots`.
    pub fn update_knots(&mut self, knots: &FxHashSet<Id>) -> Result<()> {
        for &knot in knots {
            self.update_knot(knot)?;
        }
        Ok(())
    }

    fn update_knot(&mut self, knot: Id) -> Result<()> {
        let (Some(adjacency), Some(center)) = (self.axes.point(knot), self.axes.vertices.get(knot)) else {
            return self.remove_knot(knot);
        };
        let center = to_vector(center);

        let mut arms: SmallVec<[Arm; 4]> = SmallVec::new();
        let incident = adjacency
            .start
            .iter()
            .map(|&axis| (axis, true))
            .chain(adjacency.end.iter().map(|&axis| (axis, false)));
        for (axis, at_start) in incident {
            let (Some(face), Some(frame)) = (self.list.get(&axis), self.axis_frame(axis)) else {
                continue;
            };
            let (direction, offset) = if at_start {
                (frame.direction, face.offset)
            } else {
                (-frame.direction, -face.offset)
            };
            arms.push(Arm {
                axis,
                at_start,
                side: up().cross(&direction),
                width: face.width,
                offset,
                angle: horizontal_angle(&direction),
            });
        }

        if arms.is_empty() {
            return self.remove_knot(knot);
        }

        // Start from plain rectangle ends so stale miters never survive.
        for arm in &arms {
            self.reset_corners(arm)?;
        }

        if arms.len() < 2 {
            self.replace_filler(knot, &[])?;
            return Ok(());
        }

        arms.sort_by(|a, b| a.angle.total_cmp(&b.angle));

        let mut corners: Vec<Coordinates> = Vec::with_capacity(arms.len() * 2);
        for i in 0..arms.len() {
            let current = arms[i];
            let next = arms[(i + 1) % arms.len()];

            let current_anchor = current.trailing_anchor(&center);
            let next_anchor = next.leading_anchor(&center);

            match intersect_implicit(
                implicit(&current.side, &current_anchor),
                implicit(&next.side, &next_anchor),
                self.precision,
            ) {
                Some((x, z)) => {
                    let corner = [x, center.y, z];
                    self.move_corner(current.axis, current.trailing_corner(), corner);
                    self.move_corner(next.axis, next.leading_corner(), corner);
                    corners.push(corner);
                }
                None => {
                    let a = round_vector(&current_anchor, self.precision);
                    let b = round_vector(&next_anchor, self.precision);
                    if a == b {
                        let corner = from_vector(&current_anchor);
                        self.move_corner(current.axis, current.trailing_corner(), corner);
                        self.move_corner(next.axis, next.leading_corner(), corner);
                        corners.push(corner);
                    } else {
                        tracing::trace!(knot, "Parallel knot edges do not meet");
                        corners.push(from_vector(&current_anchor));
                        corners.push(from_vector(&next_anchor));
                    }
                }
            }
        }

        let mut distinct: Vec<Coordinates> = Vec::with_capacity(corners.len());
        let mut seen: Vec<Vector3<f64>> = Vec::with_capacity(corners.len());
        for corner in corners {
            let key = round_vector(&to_vector(corner), self.precision);
            if !seen.contains(&key) {
                seen.push(key);
                distinct.push(corner);
            }
        }

        // Two arms never leave a gap, and neither do corners on one line.
        let area = area_normal(&distinct).norm() / 2.0;
        let tolerance = 1.0 / (self.precision * self.precision);
        if arms.len() >= 3 && distinct.len() >= 3 && area > tolerance {
            distinct.reverse();
            self.replace_filler(knot, &distinct)
        } else {
            self.replace_filler(knot, &[])
        }
    }

    fn reset_corners(&mut self, arm: &Arm) -> Result<()> {
        let Some(face) = self.list.get(&arm.axis) else {
            return Ok(());
        };
        let Some(rectangle) = self.rectangle(arm.axis, face.width, face.offset) else {
            return Ok(());
        };
        let points = face.points;
        for corner in [arm.trailing_corner(), arm.leading_corner()] {
            self.faces.set_point(points[corner], rectangle[corner]);
        }
        Ok(())
    }

    fn move_corner(&mut self, axis: Id, corner: usize, coordinates: Coordinates) {
        if let Some(point) = self.list.get(&axis).map(|face| face.points[corner]) {
            self.faces.set_point(point, coordinates);
        }
    }

    /// Swaps the knot's filler face for a new one over `corners`, or for none
    /// when `corners` is empty.
    fn replace_filler(&mut self, knot: Id, corners: &[Coordinates]) -> Result<()> {
        if let Some(Some(old)) = self.knots.get(&knot).copied() {
            if let Some(points) = self.faces.face(old).map(|f| f.points.clone()) {
                self.faces.remove_points(&points)?;
            }
        }

        let filler = if corners.is_empty() {
            None
        } else {
            let points = self.faces.add_points(corners);
            let face = self.faces.add(&points, &[])?;
            tracing::debug!(knot, corners = corners.len(), face, "Created knot filler face");
            Some(face)
        };
        self.knots.insert(knot, filler);
        Ok(())
    }

    /// Drops a knot and its filler face.
    pub(crate) fn remove_knot(&mut self, knot: Id) -> Result<()> {
        if let Some(Some(face)) = self.knots.remove(&knot) {
            if let Some(points) = self.faces.face(face).map(|f| f.points.clone()) {
                self.faces.remove_points(&points)?;
            }
        }
        Ok(())
    }

    /// Point ids of a knot's filler face.
    pub fn knot_points(&self, knot: Id) -> Option<Vec<Id>> {
        let face = self.knots.get(&knot).copied().flatten()?;
        self.faces.face(face).map(|f| f.points.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn distance(a: Coordinates, b: Coordinates) -> f64 {
        (to_vector(a) - to_vector(b)).norm()
    }

    #[test]
    fn three_way_junction_gets_a_triangular_filler() {
        let mut offset_faces = OffsetFaces::new();
        let center = offset_faces.add_points(&[[0.0, 0.0, 0.0]])[0];
        let mut axes = Vec::new();
        for k in 0..3 {
            let angle = k as f64 * 2.0 * PI / 3.0;
            let tip = offset_faces.add_points(&[[2.0 * angle.cos(), 0.0, 2.0 * angle.sin()]])[0];
            axes.extend(offset_faces.add(&[center, tip], 0.2, 0.0).unwrap());
        }

        let points = offset_faces.knot_points(center).unwrap();
        assert_eq!(points.len(), 3);

        let radius = 0.1 / (PI / 3.0).sin();
        for p in &points {
            let coords = offset_faces.faces.get_point(*p).unwrap();
            assert_abs_diff_eq!(distance(coords, [0.0, 0.0, 0.0]), radius, epsilon = 1e-6);
        }

        // Every arm's corners at the knot sit on the filler corners.
        let filler: Vec<Coordinates> = points.iter().map(|p| offset_faces.faces.get_point(*p).unwrap()).collect();
        for axis in axes {
            let corners = offset_faces.corners(axis).unwrap();
            for corner in &corners[..2] {
                assert!(filler.iter().any(|f| distance(*f, *corner) < 1e-6));
            }
        }
    }

    #[test]
    fn straight_continuation_needs_no_filler() {
        let mut offset_faces = OffsetFaces::new();
        let p = offset_faces.add_points(&[[-1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let ids = offset_faces.add(&p, 0.2, 0.0).unwrap();
        assert_eq!(offset_faces.knot(p[1]), Some(None));

        let first = offset_faces.corners(ids[0]).unwrap();
        let second = offset_faces.corners(ids[1]).unwrap();
        assert_abs_diff_eq!(distance(first[2], second[1]), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(distance(first[3], second[0]), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn right_angle_corner_is_mitered() {
        let mut offset_faces = OffsetFaces::new();
        let p = offset_faces.add_points(&[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 0.0, 2.0]]);
        let ids = offset_faces.add(&p, 0.2, 0.0).unwrap();
        assert_eq!(offset_faces.knot(p[1]), Some(None));

        let first = offset_faces.corners(ids[0]).unwrap();
        let second = offset_faces.corners(ids[1]).unwrap();
        let mut ends = vec![first[2], first[3]];
        ends.sort_by(|a, b| a[0].total_cmp(&b[0]));
        // inner corner (1.9, 0, 0.1) and outer corner (2.1, 0, -0.1)
        assert_abs_diff_eq!(ends[0][0], 1.9, epsilon = 1e-6);
        assert_abs_diff_eq!(ends[0][2], 0.1, epsilon = 1e-6);
        assert_abs_diff_eq!(ends[1][0], 2.1, epsilon = 1e-6);
        assert_abs_diff_eq!(ends[1][2], -0.1, epsilon = 1e-6);
        for end in ends {
            assert!(second[..2].iter().any(|c| distance(*c, end) < 1e-6));
        }
    }

    #[test]
    fn collinear_arms_of_different_widths_need_no_filler() {
        let mut offset_faces = OffsetFaces::new();
        let p = offset_faces.add_points(&[[-2.0, 0.0, 0.0], [0.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        let narrow = offset_faces.add(&p[..2], 0.2, 0.0).unwrap()[0];
        let wide = offset_faces.add(&p[1..], 0.4, 0.0).unwrap()[0];

        assert_eq!(offset_faces.knot(p[1]), Some(None));
        assert_eq!(offset_faces.knot_points(p[1]), None);
        assert_eq!(offset_faces.faces.len(), 2);

        // Both ends stay square on the knot.
        let narrow = offset_faces.corners(narrow).unwrap();
        let wide = offset_faces.corners(wide).unwrap();
        for corner in [narrow[2], narrow[3], wide[0], wide[1]] {
            assert_abs_diff_eq!(corner[0], 0.0, epsilon = 1e-6);
        }
        assert_abs_diff_eq!(narrow[2][2].abs().max(narrow[3][2].abs()), 0.1, epsilon = 1e-6);
        assert_abs_diff_eq!(wide[0][2].abs().max(wide[1][2].abs()), 0.2, epsilon = 1e-6);
    }

    #[test]
    fn removing_an_arm_drops_the_filler_and_resets_corners() {
        let mut offset_faces = OffsetFaces::new();
        let center = offset_faces.add_points(&[[0.0, 0.0, 0.0]])[0];
        let tips = offset_faces.add_points(&[[2.0, 0.0, 0.0], [-2.0, 0.0, 0.0], [0.0, 0.0, 2.0]]);
        let mut axes = Vec::new();
        for tip in &tips {
            axes.extend(offset_faces.add(&[center, *tip], 0.2, 0.0).unwrap());
        }
        assert!(offset_faces.knot_points(center).is_some());

        offset_faces.remove(&axes[2..]).unwrap();
        assert_eq!(offset_faces.knot(center), Some(None));
        assert_eq!(offset_faces.faces.len(), 2);

        let corners = offset_faces.corners(axes[0]).unwrap();
        assert_abs_diff_eq!(corners[0][0], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(corners[1][0], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn widening_an_arm_rebuilds_the_filler() {
        let mut offset_faces = OffsetFaces::new();
        let center = offset_faces.add_points(&[[0.0, 0.0, 0.0]])[0];
        let tips = offset_faces.add_points(&[[2.0, 0.0, 0.0], [-2.0, 0.0, 0.0], [0.0, 0.0, 2.0]]);
        let mut axes = Vec::new();
        for tip in &tips {
            axes.extend(offset_faces.add(&[center, *tip], 0.2, 0.0).unwrap());
        }
        let before = offset_faces.knot(center).flatten().unwrap();

        offset_faces.set_width(&axes[2..], 0.6).unwrap();

        let after = offset_faces.knot(center).flatten();
        assert!(after.is_some());
        assert_ne!(after, Some(before));
        assert!(offset_faces.faces.face(before).is_none());
    }
}
