use crate::data::{DeviceSnapshot, GamepadPose, HeadSample};
use crate::host::{DeviceHandle, DeviceRegistry};
use nalgebra as na;

use anyhow::Result;
use log::*;
use std::collections::BTreeMap;

pub const CONTROLLER_ID_PREFIX: &str = "OpenVR Controller";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VrDeviceClass {
    Controller,
    Tracker,
    HMD,
    Sensor,
    Other,
}

impl VrDeviceClass {
    fn id(self, index: u32) -> String {
        let name = match self {
            VrDeviceClass::Controller => CONTROLLER_ID_PREFIX,
            VrDeviceClass::Tracker => "OpenVR Tracker",
            VrDeviceClass::HMD => "OpenVR HMD",
            VrDeviceClass::Sensor => "OpenVR Sensor",
            VrDeviceClass::Other => "OpenVR Device",
        };
        format!("{} {}", name, index)
    }
}

#[derive(Debug, Clone)]
pub struct VrDevice {
    pub id: String,
    pub position: na::Point3<f32>,
    pub rotation: na::UnitQuaternion<f32>,
    pub class: VrDeviceClass,
}

impl VrDevice {
    /// Orientation-only view of the device, its position is dropped
    fn snapshot(&self) -> DeviceSnapshot {
        let q = self.rotation.quaternion();
        DeviceSnapshot {
            id: self.id.clone(),
            pose: GamepadPose {
                orientation: Some([q.i, q.j, q.k, q.w]),
                position: None,
            },
            buttons: Vec::new(),
            axes: [0.0, 0.0],
        }
    }
}

/// Connected OpenVR devices, refreshed once per frame with [`VrDeviceManager::update`]
pub struct VrDeviceManager {
    devices: BTreeMap<u32, VrDevice>,
    /// Context needs to be kept around for interop reasons
    /// Otherwise you get a segfault
    #[allow(dead_code)]
    context: openvr::Context,
    openvr_system: openvr::System,
}

impl VrDeviceManager {
    pub fn new() -> Result<Self> {
        let context = unsafe { openvr::init(openvr::ApplicationType::Other) }?;
        let openvr_system = context.system()?;
        Ok(Self {
            devices: BTreeMap::new(),
            context,
            openvr_system,
        })
    }

    /// Refreshes poses. Returns true when devices connected or disconnected.
    pub fn update(&mut self) -> bool {
        let poses = self
            .openvr_system
            .device_to_absolute_tracking_pose(openvr::TrackingUniverseOrigin::Standing, 0.0);
        let mut changed = false;
        for (index, pose) in poses.iter().enumerate() {
            let index = index as u32;
            if !self.openvr_system.is_tracked_device_connected(index) {
                if let Some(device) = self.devices.remove(&index) {
                    info!("{} disconnected", device.id);
                    changed = true;
                }
                continue;
            }
            let class = match self.openvr_system.tracked_device_class(index) {
                openvr::TrackedDeviceClass::HMD => VrDeviceClass::HMD,
                openvr::TrackedDeviceClass::Controller => VrDeviceClass::Controller,
                openvr::TrackedDeviceClass::GenericTracker => VrDeviceClass::Tracker,
                openvr::TrackedDeviceClass::TrackingReference => VrDeviceClass::Sensor,
                _ => VrDeviceClass::Other,
            };
            let matrix = pose.device_to_absolute_tracking();
            let device = VrDevice {
                id: class.id(index),
                position: matrix.to_position(),
                rotation: matrix.to_rotation(),
                class,
            };
            if self.devices.insert(index, device).is_none() {
                changed = true;
            }
        }
        changed
    }

    pub fn devices(&self) -> impl Iterator<Item = &VrDevice> {
        self.devices.values()
    }

    pub fn get_device_by_class(&self, class: VrDeviceClass) -> Option<&VrDevice> {
        self.devices.values().find(|device| device.class == class)
    }

    pub fn head_pose(&self) -> Option<HeadSample> {
        self.get_device_by_class(VrDeviceClass::HMD)
            .map(|hmd| HeadSample::new(hmd.rotation, hmd.position.coords))
    }
}

impl DeviceRegistry for VrDeviceManager {
    fn devices_by_prefix(&self, prefix: &str) -> Vec<DeviceHandle> {
        self.devices
            .iter()
            .filter(|(_, device)| device.id.starts_with(prefix))
            .map(|(index, device)| DeviceHandle::new(*index as usize, device.id.clone()))
            .collect()
    }

    fn snapshot(&self, device: &DeviceHandle) -> Option<DeviceSnapshot> {
        self.devices
            .get(&(device.index as u32))
            .filter(|found| found.id == device.id)
            .map(VrDevice::snapshot)
    }
}

trait OpenVRPose {
    fn to_position(&self) -> na::Point3<f32>;
    fn to_rotation(&self) -> na::UnitQuaternion<f32>;
}

impl OpenVRPose for [[f32; 4]; 3] {
    /// based on [Valve implementation on github](
    /// https://github.com/ValveSoftware/openvr/blob/60eb187801956ad277f1cae6680e3a410ee0873b/samples/unity_teleport_sample/Assets/SteamVR/Scripts/SteamVR_Utils.cs#L155)
    fn to_position(&self) -> na::Point3<f32> {
        na::Point3::new(self[0][3], self[1][3], self[2][3])
    }

    /// Calculated rotation form pose matrix
    ///
    /// # Reference
    ///
    /// based on [Valve implementation on github](
    /// https://github.com/ValveSoftware/openvr/blob/60eb187801956ad277f1cae6680e3a410ee0873b/samples/unity_teleport_sample/Assets/SteamVR/Scripts/SteamVR_Utils.cs#L142)
    #[allow(clippy::many_single_char_names)]
    fn to_rotation(&self) -> na::UnitQuaternion<f32> {
        let m = self;
        let w = 0_f32.max(1. + m[0][0] + m[1][1] + m[2][2]).sqrt() / 2.0;
        let i = 0_f32.max(1. + m[0][0] - m[1][1] - m[2][2]).sqrt() / 2.0;
        let j = 0_f32.max(1. - m[0][0] + m[1][1] - m[2][2]).sqrt() / 2.0;
        let k = 0_f32.max(1. - m[0][0] - m[1][1] + m[2][2]).sqrt() / 2.0;
        let i = i.copysign(m[2][1] - m[1][2]);
        let j = j.copysign(m[0][2] - m[2][0]);
        let k = k.copysign(m[1][0] - m[0][1]);
        na::UnitQuaternion::from_quaternion(na::Quaternion::new(w, i, j, k))
    }
}
