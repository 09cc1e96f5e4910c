// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Small vector helpers shared by the kernel.
//!
//! Coordinates cross the public API as `[f64; 3]`; math happens on nalgebra
//! types. Comparisons that must absorb floating point noise quantize through
//! [`round`] with a precision taken from the configuration.

use std::f64::consts::TAU;

use nalgebra::{Matrix4, Point3, Vector3};

use crate::Coordinates;

/// World up direction. Plans live in the XZ plane.
pub fn up() -> Vector3<f64> {
    Vector3::y()
}

#[inline]
pub fn to_vector(c: Coordinates) -> Vector3<f64> {
    Vector3::new(c[0], c[1], c[2])
}

#[inline]
pub fn to_point(c: Coordinates) -> Point3<f64> {
    Point3::new(c[0], c[1], c[2])
}

#[inline]
pub fn from_vector(v: &Vector3<f64>) -> Coordinates {
    [v.x, v.y, v.z]
}

/// Widens an f32 buffer element.
#[inline]
pub fn from_f32(v: [f32; 3]) -> Coordinates {
    [v[0] as f64, v[1] as f64, v[2] as f64]
}

/// Narrows coordinates to an f32 buffer element.
#[inline]
pub fn to_f32(c: Coordinates) -> [f32; 3] {
    [c[0] as f32, c[1] as f32, c[2] as f32]
}

/// Quantizes `value` to `1 / precision` steps.
#[inline]
pub fn round(value: f64, precision: f64) -> f64 {
    let rounded = (value * precision).round() / precision;
    // Avoid -0.0 so quantized values compare equal.
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

pub fn round_vector(v: &Vector3<f64>, precision: f64) -> Vector3<f64> {
    v.map(|c| round(c, precision))
}

/// Applies an affine 4×4 transform to a point.
pub fn transform_point(matrix: &Matrix4<f64>, c: Coordinates) -> Coordinates {
    let p = matrix.transform_point(&to_point(c));
    [p.x, p.y, p.z]
}

/// Angle of a direction in the XZ plane, normalized to `[0, 2π)`.
pub fn horizontal_angle(v: &Vector3<f64>) -> f64 {
    let angle = v.z.atan2(v.x);
    if angle < 0.0 {
        angle + TAU
    } else {
        angle
    }
}

/// Intersects the implicit lines `a1·x + b1·z = d1` and `a2·x + b2·z = d2`
/// with Cramer's rule. Returns `None` for (near) parallel lines.
pub fn intersect_implicit(
    (a1, b1, d1): (f64, f64, f64),
    (a2, b2, d2): (f64, f64, f64),
    precision: f64,
) -> Option<(f64, f64)> {
    let det = a1 * b2 - a2 * b1;
    if round(det, precision) == 0.0 {
        return None;
    }
    let x = (d1 * b2 - d2 * b1) / det;
    let z = (a1 * d2 - a2 * d1) / det;
    Some((x, z))
}
