// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ray picking against kernel geometry.
//!
//! Hits report buffer positions (`index` for points and lines, `face_index`
//! for triangles) which the owning component resolves back to ids, e.g.
//! through [`Faces::get_from_index`].

use nalgebra::{Point3, Vector3};

use crate::config::KernelConfig;
use crate::error::{Error, Result};
use crate::faces::Faces;
use crate::lines::Lines;
use crate::vector::{from_f32, to_point, to_vector};
use crate::vertices::{Vertices, POSITION};
use crate::{Coordinates, Index};

const EPSILON: f64 = 1e-9;

/// A half-line with a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f64>,
    pub direction: Vector3<f64>,
}

impl Ray {
    pub fn new(origin: Coordinates, direction: Coordinates) -> Self {
        Self {
            origin: to_point(origin),
            direction: to_vector(direction).try_normalize(EPSILON).unwrap_or_else(|| -Vector3::y()),
        }
    }

    pub fn at(&self, distance: f64) -> Point3<f64> {
        self.origin + self.direction * distance
    }

    /// Distance along the ray of the point closest to `p`.
    fn project(&self, p: &Point3<f64>) -> f64 {
        (p - self.origin).dot(&self.direction)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RayHit {
    pub point: Coordinates,
    pub distance: f64,
    /// Position of the hit object in the target list.
    pub target: usize,
    /// Point or line index in its buffer.
    pub index: Option<Index>,
    /// Triangle index in the face index buffer.
    pub face_index: Option<usize>,
}

/// Something a ray can be cast against.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Vertices(&'a Vertices),
    Lines(&'a Lines),
    Faces(&'a Faces),
    /// Infinite plane, used as a drawing surface.
    Plane { origin: Coordinates, normal: Coordinates },
}

pub trait Raycaster {
    /// Hits against `targets`, nearest first.
    fn cast(&self, targets: &[Target<'_>]) -> Result<Vec<RayHit>>;
}

/// Casts the last tracked pointer ray.
#[derive(Debug, Clone)]
pub struct SceneRaycaster {
    ray: Option<Ray>,
    point_threshold: f64,
    line_threshold: f64,
}

impl Default for SceneRaycaster {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneRaycaster {
    pub fn new() -> Self {
        Self::with_config(&KernelConfig::default())
    }

    pub fn with_config(config: &KernelConfig) -> Self {
        Self {
            ray: None,
            point_threshold: config.point_threshold,
            line_threshold: config.line_threshold,
        }
    }

    /// Follows the pointer.
    pub fn track(&mut self, ray: Ray) {
        self.ray = Some(ray);
    }

    pub fn ray(&self) -> Option<&Ray> {
        self.ray.as_ref()
    }

    fn cast_vertices(&self, ray: &Ray, target: usize, vertices: &Vertices, hits: &mut Vec<RayHit>) {
        let Some(position) = vertices.buffers().attribute(POSITION) else {
            return;
        };
        for index in 0..vertices.len() {
            let p = to_point(from_f32(position.get_xyz(index)));
            let distance = ray.project(&p);
            if distance < 0.0 {
                continue;
            }
            let closest = ray.at(distance);
            if (p - closest).norm() <= self.point_threshold {
                hits.push(RayHit {
                    point: [closest.x, closest.y, closest.z],
                    distance,
                    target,
                    index: Some(index),
                    face_index: None,
                });
            }
        }
    }

    fn cast_lines(&self, ray: &Ray, target: usize, lines: &Lines, hits: &mut Vec<RayHit>) {
        for index in 0..lines.len() {
            let (Some(a), Some(b)) = (lines.slot_position(index * 2), lines.slot_position(index * 2 + 1)) else {
                continue;
            };
            let Some((distance, on_segment, gap)) = closest_to_segment(ray, &to_point(a), &to_point(b)) else {
                continue;
            };
            if gap <= self.line_threshold {
                hits.push(RayHit {
                    point: [on_segment.x, on_segment.y, on_segment.z],
                    distance,
                    target,
                    index: Some(index),
                    face_index: None,
                });
            }
        }
    }

    fn cast_faces(&self, ray: &Ray, target: usize, faces: &Faces, hits: &mut Vec<RayHit>) {
        let Some(position) = faces.vertices.buffers().attribute(POSITION) else {
            return;
        };
        let count = faces.vertices.len();
        for (face_index, t) in faces.index().chunks_exact(3).enumerate() {
            let [a, b, c] = [t[0] as usize, t[1] as usize, t[2] as usize];
            if a >= count || b >= count || c >= count {
                continue;
            }
            let corners = [a, b, c].map(|i| to_point(from_f32(position.get_xyz(i))));
            if let Some(distance) = intersect_triangle(ray, &corners) {
                let p = ray.at(distance);
                hits.push(RayHit {
                    point: [p.x, p.y, p.z],
                    distance,
                    target,
                    index: None,
                    face_index: Some(face_index),
                });
            }
        }
    }
}

impl Raycaster for SceneRaycaster {
    fn cast(&self, targets: &[Target<'_>]) -> Result<Vec<RayHit>> {
        let ray = self.ray.ok_or(Error::RaycasterNotReady)?;
        let mut hits = Vec::new();
        for (target, object) in targets.iter().enumerate() {
            match object {
                Target::Vertices(vertices) => self.cast_vertices(&ray, target, vertices, &mut hits),
                Target::Lines(lines) => self.cast_lines(&ray, target, lines, &mut hits),
                Target::Faces(faces) => self.cast_faces(&ray, target, faces, &mut hits),
                Target::Plane { origin, normal } => {
                    if let Some(distance) = intersect_plane(&ray, *origin, *normal) {
                        let p = ray.at(distance);
                        hits.push(RayHit {
                            point: [p.x, p.y, p.z],
                            distance,
                            target,
                            index: None,
                            face_index: None,
                        });
                    }
                }
            }
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(hits)
    }
}

/// Ray distance of the crossing with a plane, if in front of the origin.
pub fn intersect_plane(ray: &Ray, origin: Coordinates, normal: Coordinates) -> Option<f64> {
    let normal = to_vector(normal);
    let denominator = normal.dot(&ray.direction);
    if denominator.abs() < EPSILON {
        return None;
    }
    let distance = (to_point(origin) - ray.origin).dot(&normal) / denominator;
    (distance >= 0.0).then_some(distance)
}

/// Möller–Trumbore, double sided.
pub fn intersect_triangle(ray: &Ray, [a, b, c]: &[Point3<f64>; 3]) -> Option<f64> {
    let edge1 = b - a;
    let edge2 = c - a;
    let h = ray.direction.cross(&edge2);
    let det = edge1.dot(&h);
    if det.abs() < EPSILON {
        return None;
    }
    let inv = 1.0 / det;
    let s = ray.origin - a;
    let u = inv * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(&edge1);
    let v = inv * ray.direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let distance = inv * edge2.dot(&q);
    (distance > EPSILON).then_some(distance)
}

/// Closest approach between a ray and segment `a → b`: ray distance, the
/// segment point and the gap between the two.
fn closest_to_segment(ray: &Ray, a: &Point3<f64>, b: &Point3<f64>) -> Option<(f64, Point3<f64>, f64)> {
    let segment = b - a;
    let length_sq = segment.norm_squared();
    let w = ray.origin - a;

    let along = if length_sq < EPSILON {
        0.0
    } else {
        let d = ray.direction;
        let b_dot = d.dot(&segment);
        let denominator = length_sq - b_dot * b_dot;
        let t = if denominator.abs() < EPSILON {
            // Parallel: any segment point works, take the one nearest the origin.
            w.dot(&segment) / length_sq
        } else {
            (w.dot(&segment) - b_dot * d.dot(&w)) / denominator
        };
        t.clamp(0.0, 1.0)
    };

    let on_segment = a + segment * along;
    let distance = ray.project(&on_segment);
    if distance < 0.0 {
        return None;
    }
    let gap = (on_segment - ray.at(distance)).norm();
    Some((distance, on_segment, gap))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn looking_down(x: f64, z: f64) -> SceneRaycaster {
        let mut raycaster = SceneRaycaster::new();
        raycaster.track(Ray::new([x, 10.0, z], [0.0, -1.0, 0.0]));
        raycaster
    }

    #[test]
    fn casting_without_a_ray_fails() {
        let raycaster = SceneRaycaster::new();
        assert!(matches!(raycaster.cast(&[]), Err(Error::RaycasterNotReady)));
    }

    #[test]
    fn hits_a_face_triangle() {
        let mut faces = Faces::new();
        let p = faces.add_points(&[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 0.0, 2.0], [0.0, 0.0, 2.0]]);
        let id = faces.add(&p, &[]).unwrap();

        let hits = looking_down(1.5, 0.3).cast(&[Target::Faces(&faces)]).unwrap();
        assert_eq!(hits.len(), 1);
        assert_abs_diff_eq!(hits[0].distance, 10.0, epsilon = 1e-9);
        let face_index = hits[0].face_index.unwrap();
        assert_eq!(faces.get_from_index(face_index), Some(id));

        assert!(looking_down(5.0, 5.0).cast(&[Target::Faces(&faces)]).unwrap().is_empty());
    }

    #[test]
    fn points_and_lines_use_thresholds() {
        let mut lines = Lines::new();
        let p = lines.add_points(&[[0.0, 0.0, 0.0], [4.0, 0.0, 0.0]]);
        lines.add(&p);

        let raycaster = looking_down(0.05, 0.0);
        let hits = raycaster.cast(&[Target::Vertices(&lines.vertices)]).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(lines.vertices.id_at(hits[0].index.unwrap()), Some(p[0]));

        let hits = looking_down(2.0, 0.03).cast(&[Target::Lines(&lines)]).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(lines.id_at(hits[0].index.unwrap()), lines.list().keys().next().copied());
        assert!(looking_down(2.0, 0.5).cast(&[Target::Lines(&lines)]).unwrap().is_empty());
    }

    #[test]
    fn hits_are_sorted_by_distance() {
        let raycaster = looking_down(0.0, 0.0);
        let targets = [
            Target::Plane {
                origin: [0.0, 0.0, 0.0],
                normal: [0.0, 1.0, 0.0],
            },
            Target::Plane {
                origin: [0.0, 5.0, 0.0],
                normal: [0.0, 1.0, 0.0],
            },
            Target::Plane {
                origin: [0.0, 20.0, 0.0],
                normal: [0.0, 1.0, 0.0],
            },
        ];
        let hits = raycaster.cast(&targets).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].target, 1);
        assert_eq!(hits[1].target, 0);
        assert_abs_diff_eq!(hits[1].point[1], 0.0, epsilon = 1e-9);
    }
}
