//! Affine transform stack for coordinate projection.
//!
//! Transforms are immutable values: every operation returns a new transform
//! with its inverse already resolved, so a published transform can be shared
//! between readers without synchronisation. All math is done in `f64`.

use glam::{DMat3, DMat4, DVec2, DVec3};
use tracing::trace;

use crate::error::{Result, ViewError};

/// Relative determinant threshold under which a matrix is treated as singular.
pub const SINGULAR_EPSILON: f64 = 1e-12;

fn singular_2d(m: &DMat3) -> Option<f64> {
    let det = m.determinant();
    let sx = m.x_axis.truncate().length();
    let sy = m.y_axis.truncate().length();
    let norm = sx * sy;
    if !det.is_finite() || !norm.is_finite() || norm == 0.0 || det.abs() <= SINGULAR_EPSILON * norm {
        Some(det)
    } else {
        None
    }
}

fn singular_3d(m: &DMat4) -> Option<f64> {
    let det = m.determinant();
    let norm = m.x_axis.length() * m.y_axis.length() * m.z_axis.length() * m.w_axis.length();
    if !det.is_finite() || !norm.is_finite() || norm == 0.0 || det.abs() <= SINGULAR_EPSILON * norm {
        Some(det)
    } else {
        None
    }
}

/// 2D transform stored as a 3×3 matrix acting on column vectors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform2D {
    matrix: DMat3,
    inverse: Option<DMat3>,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform2D {
    pub fn identity() -> Self {
        Self {
            matrix: DMat3::IDENTITY,
            inverse: Some(DMat3::IDENTITY),
        }
    }

    /// Wraps a matrix, resolving its inverse. Degenerate matrices are kept but
    /// flagged; they cannot be used for inverse mapping or rendering.
    pub fn from_matrix(matrix: DMat3) -> Self {
        let inverse = match singular_2d(&matrix) {
            Some(det) => {
                trace!(det, "degenerate 2d transform");
                None
            }
            None => {
                let inv = matrix.inverse();
                if inv.is_finite() {
                    Some(inv)
                } else {
                    None
                }
            }
        };
        Self { matrix, inverse }
    }

    pub fn from_scale(sx: f64, sy: f64) -> Self {
        Self::from_matrix(DMat3::from_scale(DVec2::new(sx, sy)))
    }

    pub fn from_translation(tx: f64, ty: f64) -> Self {
        Self::from_matrix(DMat3::from_translation(DVec2::new(tx, ty)))
    }

    /// Counter-clockwise rotation in degrees.
    pub fn from_rotation_deg(degrees: f64) -> Self {
        Self::from_matrix(DMat3::from_angle(degrees.to_radians()))
    }

    /// `x' = x + kx * y`, `y' = y + ky * x`.
    pub fn from_shear(kx: f64, ky: f64) -> Self {
        Self::from_matrix(DMat3::from_cols(
            glam::DVec3::new(1.0, ky, 0.0),
            glam::DVec3::new(kx, 1.0, 0.0),
            glam::DVec3::new(0.0, 0.0, 1.0),
        ))
    }

    /// `screen = data * scale + offset` on each axis.
    pub fn from_scale_translation(sx: f64, sy: f64, tx: f64, ty: f64) -> Self {
        Self::from_matrix(DMat3::from_cols(
            glam::DVec3::new(sx, 0.0, 0.0),
            glam::DVec3::new(0.0, sy, 0.0),
            glam::DVec3::new(tx, ty, 1.0),
        ))
    }

    pub fn matrix(&self) -> DMat3 {
        self.matrix
    }

    pub fn determinant(&self) -> f64 {
        self.matrix.determinant()
    }

    pub fn is_degenerate(&self) -> bool {
        self.inverse.is_none()
    }

    pub fn inverse(&self) -> Result<Transform2D> {
        match self.inverse {
            Some(inv) => Ok(Self {
                matrix: inv,
                inverse: Some(self.matrix),
            }),
            None => Err(self.singular()),
        }
    }

    /// Composes `parent ∘ child`: the child is applied first, in the parent's frame.
    pub fn compose(parent: &Transform2D, child: &Transform2D) -> Transform2D {
        let matrix = parent.matrix * child.matrix;
        match (parent.inverse, child.inverse) {
            (Some(pi), Some(ci)) if singular_2d(&matrix).is_none() => Self {
                matrix,
                inverse: Some(ci * pi),
            },
            _ => Self::from_matrix(matrix),
        }
    }

    /// Applies `next` after `self`.
    pub fn then(&self, next: &Transform2D) -> Transform2D {
        Self::compose(next, self)
    }

    pub fn map_forward(&self, point: DVec2) -> DVec2 {
        self.matrix.transform_point2(point)
    }

    pub fn map_inverse(&self, point: DVec2) -> Result<DVec2> {
        match &self.inverse {
            Some(inv) => Ok(inv.transform_point2(point)),
            None => Err(self.singular()),
        }
    }

    /// Maps a direction; translation is ignored.
    pub fn map_vector(&self, v: DVec2) -> DVec2 {
        self.matrix.transform_vector2(v)
    }

    /// Axis-aligned bounds of the mapped rectangle `[min, max]`.
    pub fn map_rect(&self, min: DVec2, max: DVec2) -> (DVec2, DVec2) {
        let corners = [
            self.map_forward(min),
            self.map_forward(DVec2::new(max.x, min.y)),
            self.map_forward(DVec2::new(min.x, max.y)),
            self.map_forward(max),
        ];
        let lo = corners.iter().fold(DVec2::splat(f64::INFINITY), |a, c| a.min(*c));
        let hi = corners.iter().fold(DVec2::splat(f64::NEG_INFINITY), |a, c| a.max(*c));
        (lo, hi)
    }

    /// Column-major matrix coefficients.
    pub fn to_coefficients(&self) -> [f64; 9] {
        self.matrix.to_cols_array()
    }

    pub fn from_coefficients(coefficients: &[f64; 9]) -> Self {
        Self::from_matrix(DMat3::from_cols_array(coefficients))
    }

    fn singular(&self) -> ViewError {
        ViewError::SingularTransform {
            determinant: self.matrix.determinant(),
        }
    }
}

impl std::ops::Mul for Transform2D {
    type Output = Transform2D;

    fn mul(self, rhs: Transform2D) -> Transform2D {
        Transform2D::compose(&self, &rhs)
    }
}

/// Accumulates incremental compositions (e.g. many small pan/zoom steps).
///
/// The forward matrix and its inverse are composed independently so the
/// inverse stays cheap; every `renormalize_interval` compositions the
/// projective row is snapped back to `(0, 0, 1)` and the inverse recomputed
/// from the forward matrix to stop error growth.
#[derive(Clone, Debug)]
pub struct TransformStack {
    forward: DMat3,
    inverse: DMat3,
    compositions: u32,
    renormalize_interval: u32,
}

impl TransformStack {
    pub fn new(base: &Transform2D, renormalize_interval: u32) -> Result<Self> {
        let inverse = base.inverse()?.matrix();
        Ok(Self {
            forward: base.matrix(),
            inverse,
            compositions: 0,
            renormalize_interval: renormalize_interval.max(1),
        })
    }

    /// Composes `child` inside the current frame. Degenerate children are
    /// refused and leave the stack unchanged.
    pub fn push(&mut self, child: &Transform2D) -> Result<()> {
        let child_inverse = child.inverse()?.matrix();
        self.forward *= child.matrix();
        self.inverse = child_inverse * self.inverse;
        self.compositions += 1;
        if self.compositions % self.renormalize_interval == 0 {
            self.renormalize()?;
        }
        Ok(())
    }

    pub fn renormalize(&mut self) -> Result<()> {
        let mut m = self.forward;
        m.x_axis.z = 0.0;
        m.y_axis.z = 0.0;
        m.z_axis.z = 1.0;
        let t = Transform2D::from_matrix(m);
        let inv = t.inverse()?.matrix();
        trace!(compositions = self.compositions, "renormalized transform stack");
        self.forward = m;
        self.inverse = inv;
        Ok(())
    }

    pub fn compositions(&self) -> u32 {
        self.compositions
    }

    pub fn current(&self) -> Transform2D {
        Transform2D {
            matrix: self.forward,
            inverse: Some(self.inverse),
        }
    }
}

/// 3D transform (model, view or projection) stored as a 4×4 matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3D {
    matrix: DMat4,
    inverse: Option<DMat4>,
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform3D {
    pub fn identity() -> Self {
        Self {
            matrix: DMat4::IDENTITY,
            inverse: Some(DMat4::IDENTITY),
        }
    }

    pub fn from_matrix(matrix: DMat4) -> Self {
        let inverse = match singular_3d(&matrix) {
            Some(det) => {
                trace!(det, "degenerate 3d transform");
                None
            }
            None => Some(matrix.inverse()),
        };
        Self { matrix, inverse }
    }

    pub fn from_translation(t: DVec3) -> Self {
        Self::from_matrix(DMat4::from_translation(t))
    }

    pub fn from_scale(s: DVec3) -> Self {
        Self::from_matrix(DMat4::from_scale(s))
    }

    pub fn from_axis_angle_deg(axis: DVec3, degrees: f64) -> Self {
        let axis = axis.try_normalize().unwrap_or(DVec3::Z);
        Self::from_matrix(DMat4::from_axis_angle(axis, degrees.to_radians()))
    }

    pub fn look_at(eye: DVec3, center: DVec3, up: DVec3) -> Self {
        Self::from_matrix(DMat4::look_at_rh(eye, center, up))
    }

    pub fn perspective(fov_y_deg: f64, aspect: f64, near: f64, far: f64) -> Self {
        Self::from_matrix(DMat4::perspective_rh(fov_y_deg.to_radians(), aspect, near, far))
    }

    pub fn orthographic(left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> Self {
        Self::from_matrix(DMat4::orthographic_rh(left, right, bottom, top, near, far))
    }

    pub fn matrix(&self) -> DMat4 {
        self.matrix
    }

    pub fn is_degenerate(&self) -> bool {
        self.inverse.is_none()
    }

    pub fn compose(parent: &Transform3D, child: &Transform3D) -> Transform3D {
        Self::from_matrix(parent.matrix * child.matrix)
    }

    /// Maps a point, applying the perspective divide.
    pub fn map_forward(&self, point: DVec3) -> DVec3 {
        self.matrix.project_point3(point)
    }

    pub fn map_inverse(&self, point: DVec3) -> Result<DVec3> {
        match &self.inverse {
            Some(inv) => Ok(inv.project_point3(point)),
            None => Err(ViewError::SingularTransform {
                determinant: self.matrix.determinant(),
            }),
        }
    }

    pub fn to_coefficients(&self) -> [f64; 16] {
        self.matrix.to_cols_array()
    }
}
