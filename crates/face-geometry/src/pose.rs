//! Head pose estimation from six canonical landmarks
//!
//! Solves the perspective-n-point problem for a fixed "average head"
//! 3D model against the observed 2D pixel positions, using a pinhole
//! camera whose focal length is the image width and whose principal
//! point is the image center (zero lens distortion). The resulting
//! rotation is converted to pitch/yaw/roll Euler angles in degrees.

use nalgebra::{Matrix3, Matrix6, Rotation3, SVector, Vector2, Vector3};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::landmarks::{pose_points, LandmarkFrame};
use crate::GeometryError;

/// Canonical 3D reference head, nose tip at the origin. Units are
/// millimetres of an average adult head.
const MODEL_POINTS: [[f64; 3]; 6] = [
    [0.0, 0.0, 0.0],       // Nose tip
    [0.0, -63.6, -12.5],   // Chin
    [-43.3, 32.7, -26.0],  // Left eye outer corner
    [43.3, 32.7, -26.0],   // Right eye outer corner
    [-28.9, -28.9, -24.1], // Left mouth corner
    [28.9, -28.9, -24.1],  // Right mouth corner
];

const MAX_ITERATIONS: usize = 100;
const STEP_TOLERANCE: f64 = 1e-10;

/// Head rotation in degrees, each angle normalized into [-180, 180).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

/// Pinhole camera intrinsics derived from the frame dimensions.
struct Pinhole {
    focal: f64,
    cx: f64,
    cy: f64,
}

impl Pinhole {
    fn for_frame(frame: &LandmarkFrame) -> Self {
        Self {
            focal: frame.width as f64,
            cx: frame.width as f64 / 2.0,
            cy: frame.height as f64 / 2.0,
        }
    }
}

/// Estimate head pose angles for one landmark frame.
pub fn head_pose_angles(frame: &LandmarkFrame) -> Result<HeadPose, GeometryError> {
    let observed = frame.points_px(&[
        pose_points::NOSE_TIP,
        pose_points::CHIN,
        pose_points::LEFT_EYE_OUTER,
        pose_points::RIGHT_EYE_OUTER,
        pose_points::LEFT_MOUTH,
        pose_points::RIGHT_MOUTH,
    ])?;

    let camera = Pinhole::for_frame(frame);
    let rotation = solve_pnp(&observed, &camera)?;
    let (pitch, yaw, roll) = euler_degrees(rotation.matrix());
    Ok(HeadPose { pitch, yaw, roll })
}

/// Normalize an angle in degrees into [-180, 180).
pub fn normalize_angle(angle: f64) -> f64 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

/// 6-DOF pose parameters: scaled-axis rotation then translation.
type Params = SVector<f64, 6>;
/// Stacked (u, v) reprojection residuals for the six correspondences.
type Residual = SVector<f64, 12>;

fn reprojection_residual(
    params: &Params,
    observed: &[Vector2<f64>; 6],
    camera: &Pinhole,
) -> Option<Residual> {
    let rotation = Rotation3::from_scaled_axis(params.fixed_rows::<3>(0).into_owned());
    let translation = params.fixed_rows::<3>(3).into_owned();

    let mut residual = Residual::zeros();
    for (i, (model, obs)) in MODEL_POINTS.iter().zip(observed.iter()).enumerate() {
        let cam_point = rotation * Vector3::from(*model) + translation;
        // A reference point at or behind the image plane is unusable.
        if cam_point.z <= 1e-6 {
            return None;
        }
        let u = camera.focal * cam_point.x / cam_point.z + camera.cx;
        let v = camera.focal * cam_point.y / cam_point.z + camera.cy;
        residual[2 * i] = u - obs.x;
        residual[2 * i + 1] = v - obs.y;
    }
    Some(residual)
}

/// Initial pose guess: front-facing rotation, depth from the observed
/// eye-corner spread, lateral offset from the observed nose tip.
fn initial_guess(observed: &[Vector2<f64>; 6], camera: &Pinhole) -> Params {
    let model_eye_span = 86.6;
    let observed_eye_span = (observed[2] - observed[3]).norm();
    let z = if observed_eye_span > 1.0 {
        camera.focal * model_eye_span / observed_eye_span
    } else {
        400.0
    };
    let tx = (observed[0].x - camera.cx) * z / camera.focal;
    let ty = (observed[0].y - camera.cy) * z / camera.focal;

    // The model's +y is up and +z faces the camera; image coordinates
    // have +y down and +z away, so a face looking at the camera sits
    // near a half-turn about the x axis.
    let mut params = Params::zeros();
    params[0] = std::f64::consts::PI;
    params[3] = tx;
    params[4] = ty;
    params[5] = z;
    params
}

/// Levenberg-Marquardt refinement of the 6-DOF pose, minimising pixel
/// reprojection error with a numeric Jacobian.
fn solve_pnp(
    observed: &[Vector2<f64>; 6],
    camera: &Pinhole,
) -> Result<Rotation3<f64>, GeometryError> {
    let mut params = initial_guess(observed, camera);
    let mut residual =
        reprojection_residual(&params, observed, camera).ok_or(GeometryError::PoseSolveFailed)?;
    let mut cost = residual.norm_squared();
    let mut lambda = 1e-3;

    for iteration in 0..MAX_ITERATIONS {
        // Central-difference Jacobian, 12 residuals x 6 parameters.
        let mut jacobian = nalgebra::SMatrix::<f64, 12, 6>::zeros();
        for col in 0..6 {
            let eps = 1e-6 * (1.0 + params[col].abs());
            let mut forward = params;
            forward[col] += eps;
            let mut backward = params;
            backward[col] -= eps;
            let rf = reprojection_residual(&forward, observed, camera)
                .ok_or(GeometryError::PoseSolveFailed)?;
            let rb = reprojection_residual(&backward, observed, camera)
                .ok_or(GeometryError::PoseSolveFailed)?;
            jacobian.set_column(col, &((rf - rb) / (2.0 * eps)));
        }

        let jt = jacobian.transpose();
        let jtj: Matrix6<f64> = jt * jacobian;
        let gradient = jt * residual;

        let mut damped = jtj;
        for i in 0..6 {
            damped[(i, i)] += lambda * jtj[(i, i)].max(1e-12);
        }

        let Some(step) = damped.lu().solve(&gradient) else {
            return Err(GeometryError::PoseSolveFailed);
        };

        let candidate = params - step;
        let candidate_residual = reprojection_residual(&candidate, observed, camera);
        let candidate_cost = candidate_residual.map(|r| r.norm_squared());

        match (candidate_residual, candidate_cost) {
            (Some(r), Some(c)) if c.is_finite() && c < cost => {
                params = candidate;
                residual = r;
                cost = c;
                lambda = (lambda * 0.5).max(1e-12);
                if step.norm() < STEP_TOLERANCE || cost < 1e-12 {
                    trace!(iteration, cost, "pnp converged");
                    break;
                }
            }
            _ => {
                lambda *= 10.0;
                if lambda > 1e12 {
                    return Err(GeometryError::PoseSolveFailed);
                }
            }
        }
    }

    if !cost.is_finite() {
        return Err(GeometryError::PoseSolveFailed);
    }

    Ok(Rotation3::from_scaled_axis(
        params.fixed_rows::<3>(0).into_owned(),
    ))
}

/// Convert a solved rotation matrix into (pitch, yaw, roll) degrees.
///
/// The Y and Z axes are negated first to move from the camera frame
/// back into the landmark coordinate convention. Near gimbal lock
/// (non-diagonal XY norm below 1e-6) roll is forced to zero.
fn euler_degrees(rotation: &Matrix3<f64>) -> (f64, f64, f64) {
    let mut r = *rotation;
    for row in 0..3 {
        r[(row, 1)] = -r[(row, 1)];
        r[(row, 2)] = -r[(row, 2)];
    }

    let sy = (r[(0, 0)] * r[(0, 0)] + r[(1, 0)] * r[(1, 0)]).sqrt();
    let (x, y, z) = if sy < 1e-6 {
        ((-r[(1, 2)]).atan2(r[(1, 1)]), (-r[(2, 0)]).atan2(sy), 0.0)
    } else {
        (
            r[(2, 1)].atan2(r[(2, 2)]),
            (-r[(2, 0)]).atan2(sy),
            r[(1, 0)].atan2(r[(0, 0)]),
        )
    };

    (
        normalize_angle(x.to_degrees()),
        normalize_angle(y.to_degrees()),
        normalize_angle(z.to_degrees()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::MIN_LANDMARKS;

    const WIDTH: u32 = 640;
    const HEIGHT: u32 = 480;

    /// Project the model head under a known pose into a landmark frame.
    fn synthetic_frame(rotation: Rotation3<f64>, translation: Vector3<f64>) -> LandmarkFrame {
        let indices = [
            pose_points::NOSE_TIP,
            pose_points::CHIN,
            pose_points::LEFT_EYE_OUTER,
            pose_points::RIGHT_EYE_OUTER,
            pose_points::LEFT_MOUTH,
            pose_points::RIGHT_MOUTH,
        ];
        let focal = WIDTH as f64;
        let (cx, cy) = (WIDTH as f64 / 2.0, HEIGHT as f64 / 2.0);

        let mut points = vec![[0.5f32, 0.5]; MIN_LANDMARKS];
        for (model, idx) in MODEL_POINTS.iter().zip(indices) {
            let cam_point = rotation * Vector3::from(*model) + translation;
            let u = focal * cam_point.x / cam_point.z + cx;
            let v = focal * cam_point.y / cam_point.z + cy;
            points[idx] = [(u / WIDTH as f64) as f32, (v / HEIGHT as f64) as f32];
        }
        LandmarkFrame::new(points, WIDTH, HEIGHT)
    }

    /// Front-facing prior: model axes flipped into the camera frame.
    fn facing_camera() -> Rotation3<f64> {
        Rotation3::from_scaled_axis(Vector3::new(std::f64::consts::PI, 0.0, 0.0))
    }

    #[test]
    fn test_front_facing_pose_is_neutral() {
        let frame = synthetic_frame(facing_camera(), Vector3::new(0.0, 0.0, 450.0));
        let pose = head_pose_angles(&frame).unwrap();
        assert!(pose.pitch.abs() < 0.5, "pitch was {}", pose.pitch);
        assert!(pose.yaw.abs() < 0.5, "yaw was {}", pose.yaw);
        assert!(pose.roll.abs() < 0.5, "roll was {}", pose.roll);
    }

    #[test]
    fn test_yaw_recovered() {
        let turned = Rotation3::from_axis_angle(&Vector3::y_axis(), 12f64.to_radians())
            * facing_camera();
        let frame = synthetic_frame(turned, Vector3::new(5.0, -10.0, 500.0));
        let pose = head_pose_angles(&frame).unwrap();
        assert!((pose.yaw - 12.0).abs() < 0.5, "yaw was {}", pose.yaw);
        assert!(pose.roll.abs() < 0.5, "roll was {}", pose.roll);
    }

    #[test]
    fn test_roll_recovered() {
        let tilted = Rotation3::from_axis_angle(&Vector3::z_axis(), 15f64.to_radians())
            * facing_camera();
        let frame = synthetic_frame(tilted, Vector3::new(0.0, 0.0, 420.0));
        let pose = head_pose_angles(&frame).unwrap();
        assert!((pose.roll - 15.0).abs() < 0.5, "roll was {}", pose.roll);
    }

    #[test]
    fn test_gimbal_lock_forces_zero_roll() {
        // Build a matrix whose adjusted form is a pure 90 degree yaw,
        // which zeroes the XY column norm.
        let mut adjusted = *Rotation3::from_axis_angle(&Vector3::y_axis(), 90f64.to_radians()).matrix();
        for row in 0..3 {
            adjusted[(row, 1)] = -adjusted[(row, 1)];
            adjusted[(row, 2)] = -adjusted[(row, 2)];
        }
        let (pitch, yaw, roll) = euler_degrees(&adjusted);
        assert!(pitch.abs() < 1e-6);
        assert!((yaw - 90.0).abs() < 1e-6);
        assert_eq!(roll, 0.0);
    }

    #[test]
    fn test_normalize_angle_wraps() {
        assert_eq!(normalize_angle(190.0), -170.0);
        assert_eq!(normalize_angle(-190.0), 170.0);
        assert_eq!(normalize_angle(180.0), -180.0);
        assert_eq!(normalize_angle(0.0), 0.0);
        assert_eq!(normalize_angle(360.0), 0.0);
    }
}
