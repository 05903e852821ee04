use crate::config::Color;
use crate::data::{DeviceSnapshot, HeadSample};
use crate::events::ControllerEvent;
use nalgebra as na;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceHandle {
    pub index: usize,
    pub id: String,
}

impl DeviceHandle {
    pub fn new(index: usize, id: impl Into<String>) -> Self {
        Self {
            index,
            id: id.into(),
        }
    }
}

pub trait DeviceRegistry {
    /// In registry order
    fn devices_by_prefix(&self, prefix: &str) -> Vec<DeviceHandle>;

    fn snapshot(&self, device: &DeviceHandle) -> Option<DeviceSnapshot>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    pub obj: String,
    pub mtl: String,
}

impl ModelDescriptor {
    pub fn vive_controller() -> Self {
        Self {
            obj: "https://cdn.aframe.io/controllers/vive/vr_controller_vive.obj".to_owned(),
            mtl: "https://cdn.aframe.io/controllers/vive/vr_controller_vive.mtl".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedModel {
    pub meshes: Vec<String>,
}

impl LoadedModel {
    pub fn has_mesh(&self, name: &str) -> bool {
        self.meshes.iter().any(|mesh| mesh == name)
    }
}

pub trait Camera {
    fn head_pose(&self) -> HeadSample;
}

pub trait Transform {
    /// Intrinsic X-Y-Z rotation in degrees
    fn set_rotation(&mut self, degrees: na::Vector3<f32>);
    fn set_position(&mut self, position: na::Vector3<f32>);
}

pub trait ModelBinder {
    fn attach(&mut self, model: &ModelDescriptor);
    fn detach(&mut self);
    fn set_pivot(&mut self, offset: na::Vector3<f32>);
    fn set_mesh_color(&mut self, mesh: &str, color: Color);
}

pub trait EventSink {
    fn emit(&mut self, event: &ControllerEvent);
}

pub trait Host: Camera + Transform + ModelBinder + EventSink {}

impl<T: Camera + Transform + ModelBinder + EventSink> Host for T {}
