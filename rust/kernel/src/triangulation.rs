// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar polygon triangulation.
//!
//! Faces are planar but arbitrarily oriented in 3D. Instead of rotating them
//! into a 2D basis, the axis most aligned with the face normal is dropped and
//! the remaining two coordinates are handed to earcutr.

use nalgebra::Vector3;

use crate::error::{Error, Result};
use crate::vector::to_vector;
use crate::Coordinates;

/// Returns the axis (0 = x, 1 = y, 2 = z) to drop when projecting a planar
/// polygon to 2D.
pub fn projection_dimension(points: &[Coordinates]) -> usize {
    let normal = polygon_normal(points);
    let abs = normal.abs();
    if abs.x >= abs.y && abs.x >= abs.z {
        0
    } else if abs.y >= abs.z {
        1
    } else {
        2
    }
}

/// Cross product of the first pair of consecutive edges that are not
/// collinear. Zero for fully degenerate input.
fn polygon_normal(points: &[Coordinates]) -> Vector3<f64> {
    let n = points.len();
    if n < 3 {
        return Vector3::zeros();
    }
    for i in 0..n {
        let a = to_vector(points[i]);
        let b = to_vector(points[(i + 1) % n]);
        let c = to_vector(points[(i + 2) % n]);
        let normal = (b - a).cross(&(c - b));
        if normal.norm_squared() > 1e-20 {
            return normal;
        }
    }
    Vector3::zeros()
}

/// Newell normal of a closed ring. Its length is twice the enclosed area and
/// it follows the ring's winding.
pub fn area_normal(points: &[Coordinates]) -> Vector3<f64> {
    let n = points.len();
    let mut normal = Vector3::zeros();
    for i in 0..n {
        let a = to_vector(points[i]);
        let b = to_vector(points[(i + 1) % n]);
        normal += a.cross(&b);
    }
    normal
}

/// Flattens points to 2D by dropping one axis.
pub fn project(points: &[Coordinates], drop: usize) -> Vec<f64> {
    let mut flat = Vec::with_capacity(points.len() * 2);
    for p in points {
        for (axis, value) in p.iter().enumerate() {
            if axis != drop {
                flat.push(*value);
            }
        }
    }
    flat
}

/// Triangulates a flat 2D polygon (outer ring followed by hole rings).
///
/// `hole_starts` holds the point index where each hole ring begins. The result
/// is a list of index triples into the input point order.
pub fn triangulate(flat_2d: &[f64], hole_starts: &[usize]) -> Result<Vec<usize>> {
    if flat_2d.len() < 6 {
        return Err(Error::DegenerateFace(flat_2d.len() / 2));
    }

    earcutr::earcut(flat_2d, hole_starts, 2).map_err(|e| Error::Triangulation(format!("{:?}", e)))
}

/// Triangulates a planar 3D polygon with holes in one call.
pub fn triangulate_rings(outer: &[Coordinates], holes: &[Vec<Coordinates>]) -> Result<Vec<usize>> {
    let mut all: Vec<Coordinates> = outer.to_vec();
    let mut hole_starts = Vec::with_capacity(holes.len());
    for hole in holes {
        hole_starts.push(all.len());
        all.extend_from_slice(hole);
    }
    let drop = projection_dimension(outer);
    triangulate(&project(&all, drop), &hole_starts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_polygons_drop_y() {
        let square = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]];
        assert_eq!(projection_dimension(&square), 1);
    }

    #[test]
    fn vertical_polygons_drop_their_normal_axis() {
        let wall = [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [2.0, 1.0, 0.0], [2.0, 0.0, 0.0]];
        assert_eq!(projection_dimension(&wall), 2);
    }

    #[test]
    fn collinear_leading_points_are_skipped() {
        let poly = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 0.0, 1.0]];
        assert_eq!(projection_dimension(&poly), 1);
    }

    #[test]
    fn square_with_hole_triangulates() {
        let outer = [[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [4.0, 0.0, 4.0], [0.0, 0.0, 4.0]];
        let hole = vec![[1.0, 0.0, 1.0], [1.0, 0.0, 3.0], [3.0, 0.0, 3.0], [3.0, 0.0, 1.0]];
        let indices = triangulate_rings(&outer, &[hole]).unwrap();
        assert_eq!(indices.len() % 3, 0);
        // 8 vertices with one hole: 8 triangles
        assert_eq!(indices.len(), 24);
        assert!(indices.iter().all(|&i| i < 8));
    }

    #[test]
    fn area_normal_measures_twice_the_area() {
        let square = [[0.0, 0.0, 0.0], [0.0, 0.0, 2.0], [2.0, 0.0, 2.0], [2.0, 0.0, 0.0]];
        let normal = area_normal(&square);
        assert_eq!(normal, Vector3::new(0.0, 8.0, 0.0));

        let collinear = [[0.0, 0.0, -0.2], [0.0, 0.0, -0.1], [0.0, 0.0, 0.1], [0.0, 0.0, 0.2]];
        assert_eq!(area_normal(&collinear), Vector3::zeros());
    }

    #[test]
    fn too_few_points_is_degenerate() {
        assert!(matches!(triangulate(&[0.0, 0.0, 1.0, 1.0], &[]), Err(Error::DegenerateFace(2))));
    }
}
