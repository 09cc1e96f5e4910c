// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Picking faces and moving them with the pointer.
//!
//! A transform gesture works on the horizontal plane through the center of
//! the picked face. Each pointer move applies only the increment since the
//! previous move, and the product of all increments is kept so the gesture
//! can be undone.

use nalgebra::{Matrix4, Vector3};

use crate::config::KernelConfig;
use crate::error::Result;
use crate::faces::Faces;
use crate::interaction::{InputEvent, Outcome};
use crate::raycast::{Raycaster, Target};
use crate::vector::{from_vector, horizontal_angle, to_vector};
use crate::{Coordinates, Id};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformMode {
    Translate,
    /// About the vertical axis through the anchor.
    Rotate,
    /// Horizontal, uniform, about the anchor.
    Scale,
}

#[derive(Debug, Clone, PartialEq)]
enum Gesture {
    Idle,
    Transforming {
        mode: TransformMode,
        face: Id,
        anchor: Vector3<f64>,
        last: Vector3<f64>,
        applied: Matrix4<f64>,
    },
}

#[derive(Debug, Clone)]
pub struct Planes {
    pub faces: Faces,
    gesture: Gesture,
    active: Option<Id>,
}

impl Default for Planes {
    fn default() -> Self {
        Self::new()
    }
}

impl Planes {
    pub fn new() -> Self {
        Self::with_config(&KernelConfig::default())
    }

    pub fn with_config(config: &KernelConfig) -> Self {
        Self {
            faces: Faces::with_config(config),
            gesture: Gesture::Idle,
            active: None,
        }
    }

    /// Creates a face with fresh points at `coordinates`.
    pub fn add(&mut self, coordinates: &[Coordinates]) -> Result<Id> {
        let points = self.faces.add_points(coordinates);
        self.faces.add(&points, &[])
    }

    /// Face under the pointer.
    pub fn pick<R: Raycaster>(&self, raycaster: &R) -> Result<Option<Id>> {
        let hits = raycaster.cast(&[Target::Faces(&self.faces)])?;
        Ok(hits
            .first()
            .and_then(|hit| hit.face_index)
            .and_then(|index| self.faces.get_from_index(index)))
    }

    /// Makes `id` the only selected face, or clears the selection.
    pub fn select(&mut self, id: Option<Id>) {
        self.faces.select(false, None);
        self.faces.select_points(false, None);
        if let Some(id) = id {
            self.faces.select(true, Some(&[id]));
        }
        self.active = id;
    }

    pub fn active(&self) -> Option<Id> {
        self.active
    }

    pub fn is_transforming(&self) -> bool {
        matches!(self.gesture, Gesture::Transforming { .. })
    }

    pub fn poll_input<R: Raycaster>(&mut self, event: InputEvent, raycaster: &R) -> Result<Outcome> {
        match (self.is_transforming(), event) {
            (false, InputEvent::Click) => {
                let picked = self.pick(raycaster)?;
                if picked == self.active {
                    return Ok(Outcome::Ignored);
                }
                self.select(picked);
                Ok(Outcome::Updated)
            }
            (false, InputEvent::Cancel) => {
                if self.active.is_none() {
                    return Ok(Outcome::Ignored);
                }
                self.select(None);
                Ok(Outcome::Updated)
            }
            (false, InputEvent::PointerMove) => Ok(Outcome::Ignored),
            (true, InputEvent::PointerMove) => self.drag(raycaster),
            (true, InputEvent::Click) => self.stop_transform(true),
            (true, InputEvent::Cancel) => self.stop_transform(false),
        }
    }

    /// Starts moving the selected face from the current pointer position.
    pub fn start_transform<R: Raycaster>(&mut self, mode: TransformMode, raycaster: &R) -> Result<Outcome> {
        if self.is_transforming() {
            return Ok(Outcome::Ignored);
        }
        let Some(face) = self.active else {
            return Ok(Outcome::Ignored);
        };
        let Some(anchor) = self.faces.get_center(face).map(to_vector) else {
            return Ok(Outcome::Ignored);
        };
        let last = pointer_on_plane(raycaster, &anchor)?.unwrap_or(anchor);
        self.gesture = Gesture::Transforming {
            mode,
            face,
            anchor,
            last,
            applied: Matrix4::identity(),
        };
        tracing::debug!(face, ?mode, "Started face transform");
        Ok(Outcome::Started)
    }

    /// Ends the gesture, keeping the result or undoing every increment.
    pub fn stop_transform(&mut self, commit: bool) -> Result<Outcome> {
        let Gesture::Transforming { face, applied, .. } = std::mem::replace(&mut self.gesture, Gesture::Idle) else {
            return Ok(Outcome::Ignored);
        };
        if commit {
            tracing::debug!(face, "Committed face transform");
            return Ok(Outcome::Committed(face));
        }
        if let Some(inverse) = applied.try_inverse() {
            self.faces.transform(&inverse);
        }
        tracing::debug!(face, "Reverted face transform");
        Ok(Outcome::Cancelled)
    }

    pub fn cancel(&mut self) -> Result<Outcome> {
        self.stop_transform(false)
    }

    fn drag<R: Raycaster>(&mut self, raycaster: &R) -> Result<Outcome> {
        let Gesture::Transforming {
            mode,
            anchor,
            last,
            ..
        } = self.gesture
        else {
            return Ok(Outcome::Ignored);
        };
        let Some(current) = pointer_on_plane(raycaster, &anchor)? else {
            return Ok(Outcome::Ignored);
        };
        let Some(step) = increment(mode, &anchor, &last, &current) else {
            return Ok(Outcome::Ignored);
        };

        self.faces.transform(&step);
        if let Gesture::Transforming { last, applied, .. } = &mut self.gesture {
            *last = current;
            *applied = step * *applied;
        }
        Ok(Outcome::Updated)
    }
}

/// Pointer position on the horizontal plane through `anchor`.
fn pointer_on_plane<R: Raycaster>(raycaster: &R, anchor: &Vector3<f64>) -> Result<Option<Vector3<f64>>> {
    let hits = raycaster.cast(&[Target::Plane {
        origin: from_vector(anchor),
        normal: [0.0, 1.0, 0.0],
    }])?;
    Ok(hits.first().map(|hit| to_vector(hit.point)))
}

/// Matrix taking the pointer from `from` to `to` in the given mode.
fn increment(
    mode: TransformMode,
    anchor: &Vector3<f64>,
    from: &Vector3<f64>,
    to: &Vector3<f64>,
) -> Option<Matrix4<f64>> {
    let about = |m: Matrix4<f64>| Matrix4::new_translation(anchor) * m * Matrix4::new_translation(&-anchor);
    match mode {
        TransformMode::Translate => Some(Matrix4::new_translation(&(to - from))),
        TransformMode::Rotate => {
            let (a, b) = (from - anchor, to - anchor);
            if a.xz().norm() < 1e-9 || b.xz().norm() < 1e-9 {
                return None;
            }
            // Rotating by θ about +Y lowers atan2(z, x) by θ.
            let angle = horizontal_angle(&b) - horizontal_angle(&a);
            Some(about(Matrix4::new_rotation(Vector3::y() * -angle)))
        }
        TransformMode::Scale => {
            let (a, b) = ((from - anchor).xz().norm(), (to - anchor).xz().norm());
            if a < 1e-9 || b < 1e-9 {
                return None;
            }
            let factor = b / a;
            Some(about(Matrix4::new_nonuniform_scaling(&Vector3::new(factor, 1.0, factor))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raycast::{Ray, SceneRaycaster};
    use approx::assert_abs_diff_eq;

    fn pointer(x: f64, z: f64) -> SceneRaycaster {
        let mut raycaster = SceneRaycaster::new();
        raycaster.track(Ray::new([x, 10.0, z], [0.0, -1.0, 0.0]));
        raycaster
    }

    /// Square centered on the origin, picked and selected.
    fn picked_square() -> (Planes, Id) {
        let mut planes = Planes::new();
        let id = planes
            .add(&[[-1.0, 0.0, -1.0], [1.0, 0.0, -1.0], [1.0, 0.0, 1.0], [-1.0, 0.0, 1.0]])
            .unwrap();
        let outcome = planes.poll_input(InputEvent::Click, &pointer(0.3, 0.1)).unwrap();
        assert_eq!(outcome, Outcome::Updated);
        assert_eq!(planes.active(), Some(id));
        (planes, id)
    }

    fn corner(planes: &Planes, id: Id) -> Coordinates {
        planes.faces.face_coordinates(id).unwrap()[2]
    }

    fn assert_coords_eq(a: Coordinates, b: Coordinates) {
        for i in 0..3 {
            assert_abs_diff_eq!(a[i], b[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn clicking_empty_space_clears_the_selection() {
        let (mut planes, id) = picked_square();
        assert!(planes.faces.is_selected(id));
        planes.poll_input(InputEvent::Click, &pointer(9.0, 9.0)).unwrap();
        assert_eq!(planes.active(), None);
        assert!(!planes.faces.is_selected(id));
    }

    #[test]
    fn translate_follows_the_pointer() {
        let (mut planes, id) = picked_square();
        planes.start_transform(TransformMode::Translate, &pointer(0.0, 0.0)).unwrap();
        planes.poll_input(InputEvent::PointerMove, &pointer(1.0, 0.0)).unwrap();
        planes.poll_input(InputEvent::PointerMove, &pointer(2.0, 0.5)).unwrap();
        let outcome = planes.poll_input(InputEvent::Click, &pointer(2.0, 0.5)).unwrap();

        assert_eq!(outcome, Outcome::Committed(id));
        assert_coords_eq(corner(&planes, id), [3.0, 0.0, 1.5]);
    }

    #[test]
    fn cancel_undoes_the_gesture() {
        let (mut planes, id) = picked_square();
        planes.start_transform(TransformMode::Translate, &pointer(0.0, 0.0)).unwrap();
        planes.poll_input(InputEvent::PointerMove, &pointer(4.0, -2.0)).unwrap();
        assert_eq!(planes.cancel().unwrap(), Outcome::Cancelled);

        assert!(!planes.is_transforming());
        assert_coords_eq(corner(&planes, id), [1.0, 0.0, 1.0]);
    }

    #[test]
    fn rotate_quarter_turn() {
        let (mut planes, id) = picked_square();
        planes.start_transform(TransformMode::Rotate, &pointer(2.0, 0.0)).unwrap();
        planes.poll_input(InputEvent::PointerMove, &pointer(0.0, 2.0)).unwrap();
        // (1, 1) turns with the pointer from +x towards +z
        assert_coords_eq(corner(&planes, id), [-1.0, 0.0, 1.0]);
    }

    #[test]
    fn scale_about_the_center() {
        let (mut planes, id) = picked_square();
        planes.start_transform(TransformMode::Scale, &pointer(1.0, 0.0)).unwrap();
        planes.poll_input(InputEvent::PointerMove, &pointer(2.0, 0.0)).unwrap();
        assert_coords_eq(corner(&planes, id), [2.0, 0.0, 2.0]);
    }

    #[test]
    fn transform_needs_a_selection() {
        let mut planes = Planes::new();
        let outcome = planes.start_transform(TransformMode::Translate, &pointer(0.0, 0.0)).unwrap();
        assert_eq!(outcome, Outcome::Ignored);
    }
}
