use nalgebra as na;
use serde::{Deserialize, Serialize};

pub type AxisPair = [f32; 2];

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vector> for na::Vector3<f32> {
    fn from(v: Vector) -> Self {
        na::Vector3::new(v.x, v.y, v.z)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
    #[serde(default)]
    pub is_identity: bool,
}

/// Tracked device pose as published on the `tracking/pose` topic
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Pose {
    pub device_index: i32,
    pub device_class: String,
    pub position: Vector,
    pub rotation: Quaternion,
}

impl Pose {
    pub fn deserialize(data: &[u8]) -> serde_json::Result<Pose> {
        serde_json::from_slice::<Pose>(data)
    }

    pub fn is_hmd(&self) -> bool {
        self.device_class.eq_ignore_ascii_case("hmd")
    }

    pub fn to_head_sample(&self) -> HeadSample {
        let r = self.rotation;
        HeadSample {
            orientation: orientation_from_array(Some([r.x, r.y, r.z, r.w])),
            position: self.position.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadSample {
    pub orientation: na::UnitQuaternion<f32>,
    pub position: na::Vector3<f32>,
}

impl HeadSample {
    pub fn new(orientation: na::UnitQuaternion<f32>, position: na::Vector3<f32>) -> Self {
        Self {
            orientation,
            position,
        }
    }

    /// Standing viewer at 1.6m looking down -z
    pub fn standing() -> Self {
        Self::new(
            na::UnitQuaternion::identity(),
            na::Vector3::new(0.0, 1.6, 0.0),
        )
    }
}

impl Default for HeadSample {
    fn default() -> Self {
        Self::new(na::UnitQuaternion::identity(), na::Vector3::zeros())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    #[serde(default)]
    pub pressed: bool,
    #[serde(default)]
    pub touched: bool,
}

impl ButtonState {
    pub fn new(pressed: bool, touched: bool) -> Self {
        Self { pressed, touched }
    }

    /// Buttons without a capacitive sensor report touched whenever pressed
    pub fn from_pressed(pressed: bool) -> Self {
        Self::new(pressed, pressed)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct GamepadPose {
    #[serde(default)]
    pub orientation: Option<[f32; 4]>,
    #[serde(default)]
    pub position: Option<[f32; 3]>,
}

impl GamepadPose {
    pub fn orientation(&self) -> na::UnitQuaternion<f32> {
        orientation_from_array(self.orientation)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct DeviceSnapshot {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub pose: GamepadPose,
    #[serde(default)]
    pub buttons: Vec<ButtonState>,
    #[serde(default)]
    pub axes: AxisPair,
}

impl DeviceSnapshot {
    pub fn deserialize(data: &[u8]) -> serde_json::Result<DeviceSnapshot> {
        serde_json::from_slice::<DeviceSnapshot>(data)
    }
}

/// Missing, zero-length or non-finite input yields identity
pub fn orientation_from_array(orientation: Option<[f32; 4]>) -> na::UnitQuaternion<f32> {
    let [x, y, z, w] = match orientation {
        Some(o) => o,
        None => return na::UnitQuaternion::identity(),
    };
    let q = na::Quaternion::new(w, x, y, z);
    let norm = q.norm();
    if !norm.is_finite() || norm < 1.0e-6 {
        return na::UnitQuaternion::identity();
    }
    na::UnitQuaternion::from_quaternion(q)
}
