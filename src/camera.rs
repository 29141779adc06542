//! Free-look camera state and the frustum it projects.

use tephra_geom::{Frustum, Vec3};

use crate::player::CameraBasis;

pub struct FlyCamera {
    pub position: Vec3,
    pub yaw: f32,   // degrees
    pub pitch: f32, // degrees
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl FlyCamera {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw: -45.0,
            pitch: 0.0,
            fov_y_deg: 70.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 512.0,
        }
    }

    pub fn forward(&self) -> Vec3 {
        let yaw = self.yaw.to_radians();
        let pitch = self.pitch.clamp(-89.0, 89.0).to_radians();
        Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalized()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::UP).normalized()
    }

    pub fn basis(&self) -> CameraBasis {
        CameraBasis {
            forward: self.forward(),
            right: self.right(),
        }
    }

    pub fn frustum(&self) -> Frustum {
        Frustum::from_camera(
            self.position,
            self.forward(),
            Vec3::UP,
            self.fov_y_deg,
            self.aspect,
            self.near,
            self.far,
        )
    }
}
