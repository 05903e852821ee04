use nalgebra as na;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    /// Offsets are authored for the right hand, the left hand mirrors x
    fn mirror(self, offset: na::Vector3<f32>) -> na::Vector3<f32> {
        match self {
            Hand::Right => offset,
            Hand::Left => na::Vector3::new(-offset.x, offset.y, offset.z),
        }
    }
}

impl Default for Hand {
    fn default() -> Self {
        Hand::Right
    }
}

/// Distances in meters, pitches in degrees
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ArmModelParams {
    /// Shoulder height is roughly 82% of stature and eye height 94%
    pub shoulder_height_ratio: f32,
    pub shoulder_offset: na::Vector3<f32>,
    pub shoulder_elbow_offset: na::Vector3<f32>,
    pub elbow_wrist_offset: na::Vector3<f32>,
    pub wrist_controller_offset: na::Vector3<f32>,
    pub arm_extension_offset: na::Vector3<f32>,
    pub extension_min_pitch: f32,
    pub extension_max_pitch: f32,
    pub wrist_bend_ratio: f32,
    pub extension_ratio_weight: f32,
    /// 0.01 rad per update is about 35 degrees per second at 60Hz
    pub swing_threshold: f32,
    pub position_smoothing: f32,
    pub rotation_smoothing: f32,
}

impl Default for ArmModelParams {
    fn default() -> Self {
        Self {
            shoulder_height_ratio: 0.874,
            shoulder_offset: na::Vector3::new(0.155, 0.0, 0.0),
            shoulder_elbow_offset: na::Vector3::new(0.0, -0.265, -0.15),
            elbow_wrist_offset: na::Vector3::new(0.0, 0.0, -0.25),
            wrist_controller_offset: na::Vector3::new(0.0, 0.0, 0.05),
            arm_extension_offset: na::Vector3::new(-0.08, 0.14, 0.08),
            extension_min_pitch: 11.0,
            extension_max_pitch: 50.0,
            wrist_bend_ratio: 0.4,
            extension_ratio_weight: 0.4,
            swing_threshold: 0.01,
            position_smoothing: 0.5,
            rotation_smoothing: 0.5,
        }
    }
}

impl ArmModelParams {
    fn extension_ratio(&self, pitch_degrees: f32) -> f32 {
        let span = self.extension_max_pitch - self.extension_min_pitch;
        if span <= 0.0 {
            return if pitch_degrees >= self.extension_max_pitch {
                1.0
            } else {
                0.0
            };
        }
        ((pitch_degrees - self.extension_min_pitch) / span).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultPose {
    pub orientation: na::UnitQuaternion<f32>,
    pub position: na::Vector3<f32>,
}

impl Default for ResultPose {
    fn default() -> Self {
        Self {
            orientation: na::UnitQuaternion::identity(),
            position: na::Vector3::zeros(),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct FilterState {
    /// Torso yaw, trails head yaw during fast controller swings
    root: Option<na::UnitQuaternion<f32>>,
    last_controller: Option<na::UnitQuaternion<f32>>,
    pose: Option<ResultPose>,
}

#[derive(Debug, Clone)]
pub struct ArmModel {
    params: ArmModelParams,
    hand: Hand,
    head_orientation: na::UnitQuaternion<f32>,
    head_position: na::Vector3<f32>,
    controller_orientation: na::UnitQuaternion<f32>,
    state: FilterState,
    pose: ResultPose,
}

impl ArmModel {
    pub fn new(params: ArmModelParams, hand: Hand) -> Self {
        Self {
            params,
            hand,
            head_orientation: na::UnitQuaternion::identity(),
            head_position: na::Vector3::zeros(),
            controller_orientation: na::UnitQuaternion::identity(),
            state: FilterState::default(),
            pose: ResultPose::default(),
        }
    }

    pub fn set_head_orientation(&mut self, orientation: na::UnitQuaternion<f32>) {
        self.head_orientation = orientation;
    }

    pub fn set_head_position(&mut self, position: na::Vector3<f32>) {
        self.head_position = position;
    }

    pub fn set_controller_orientation(&mut self, orientation: na::UnitQuaternion<f32>) {
        self.controller_orientation = orientation;
    }

    /// Identity at the origin until the first update
    pub fn pose(&self) -> &ResultPose {
        &self.pose
    }

    pub fn is_ready(&self) -> bool {
        self.state.pose.is_some()
    }

    pub fn reset(&mut self) {
        self.state = FilterState::default();
        self.pose = ResultPose::default();
    }

    pub fn update(&mut self) {
        let params = &self.params;
        let controller = self.controller_orientation;
        let head_yaw = yaw_orientation(&self.head_orientation);

        let root = match (self.state.root, self.state.last_controller) {
            (Some(root), Some(last)) => {
                let swing = last.angle_to(&controller);
                if swing > params.swing_threshold {
                    slerp(&root, &head_yaw, (swing / 10.0).min(1.0))
                } else {
                    head_yaw
                }
            }
            _ => head_yaw,
        };

        // Raising the controller moves the elbow up and in so the user can
        // see the controller.
        let pitch = euler_yxz(&controller).x.to_degrees();
        let extension = params.extension_ratio(pitch);

        let local_controller = root.inverse() * controller;

        let elbow = self.hand.mirror(params.shoulder_offset)
            + self.hand.mirror(params.shoulder_elbow_offset)
            + self.hand.mirror(params.arm_extension_offset) * extension;

        // Split the rotation between elbow and wrist. The wrist takes more of
        // it as the arm extends, and close to a full turn both joints back off.
        let total_angle = local_controller.angle().to_degrees();
        let suppression = 1.0 - (total_angle / 180.0).powi(4);
        let wrist_share = suppression
            * (params.wrist_bend_ratio
                + (1.0 - params.wrist_bend_ratio) * extension * params.extension_ratio_weight);
        let wrist = slerp(
            &na::UnitQuaternion::identity(),
            &local_controller,
            wrist_share,
        );
        let elbow_rotation = local_controller * wrist.inverse();

        let hand = elbow
            + elbow_rotation * (params.elbow_wrist_offset + wrist * params.wrist_controller_offset);

        let anchor = na::Vector3::new(
            self.head_position.x,
            self.head_position.y * params.shoulder_height_ratio,
            self.head_position.z,
        );
        let raw = ResultPose {
            orientation: controller,
            position: anchor + root * hand,
        };

        let pose = match self.state.pose {
            Some(previous) => ResultPose {
                orientation: nlerp(
                    &previous.orientation,
                    &raw.orientation,
                    params.rotation_smoothing,
                ),
                position: previous
                    .position
                    .lerp(&raw.position, params.position_smoothing),
            },
            None => raw,
        };

        self.state.root = Some(root);
        self.state.last_controller = Some(controller);
        self.state.pose = Some(pose);
        self.pose = pose;
    }
}

impl Default for ArmModel {
    fn default() -> Self {
        Self::new(ArmModelParams::default(), Hand::default())
    }
}

/// Intrinsic X-Y-Z euler angles in radians
pub fn euler_xyz(q: &na::UnitQuaternion<f32>) -> na::Vector3<f32> {
    let rotation = q.to_rotation_matrix();
    let m = rotation.matrix();
    let m13 = m[(0, 2)].clamp(-1.0, 1.0);
    let y = m13.asin();
    if m13.abs() < 0.999_999 {
        na::Vector3::new(
            (-m[(1, 2)]).atan2(m[(2, 2)]),
            y,
            (-m[(0, 1)]).atan2(m[(0, 0)]),
        )
    } else {
        na::Vector3::new(m[(2, 1)].atan2(m[(1, 1)]), y, 0.0)
    }
}

/// Intrinsic Y-X-Z euler angles in radians, returned as (x, y, z)
fn euler_yxz(q: &na::UnitQuaternion<f32>) -> na::Vector3<f32> {
    let rotation = q.to_rotation_matrix();
    let m = rotation.matrix();
    let m23 = m[(1, 2)].clamp(-1.0, 1.0);
    let x = (-m23).asin();
    if m23.abs() < 0.999_999 {
        na::Vector3::new(
            x,
            m[(0, 2)].atan2(m[(2, 2)]),
            m[(1, 0)].atan2(m[(1, 1)]),
        )
    } else {
        na::Vector3::new(x, (-m[(2, 0)]).atan2(m[(0, 0)]), 0.0)
    }
}

fn yaw_orientation(q: &na::UnitQuaternion<f32>) -> na::UnitQuaternion<f32> {
    na::UnitQuaternion::from_axis_angle(&na::Vector3::y_axis(), euler_yxz(q).y)
}

fn slerp(
    from: &na::UnitQuaternion<f32>,
    to: &na::UnitQuaternion<f32>,
    t: f32,
) -> na::UnitQuaternion<f32> {
    from.try_slerp(to, t, 1.0e-6)
        .unwrap_or_else(|| nlerp(from, to, t))
}

fn nlerp(
    from: &na::UnitQuaternion<f32>,
    to: &na::UnitQuaternion<f32>,
    t: f32,
) -> na::UnitQuaternion<f32> {
    let target = if from.coords.dot(&to.coords) < 0.0 {
        -to.into_inner()
    } else {
        to.into_inner()
    };
    let blended = from.into_inner().lerp(&target, t);
    if blended.norm() < 1.0e-6 {
        return *to;
    }
    na::UnitQuaternion::from_quaternion(blended)
}
