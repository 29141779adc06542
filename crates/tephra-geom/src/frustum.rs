use crate::{Aabb, Vec3};

/// A plane in normal/offset form; signed distance is positive on the
/// inside of the volume the plane bounds.
#[derive(Clone, Copy, Debug)]
pub struct Plane {
    pub normal: Vec3,
    pub offset: f32,
}

impl Plane {
    /// Plane through `point` with the given (not necessarily unit) normal.
    pub fn through(point: Vec3, normal: Vec3) -> Self {
        let n = normal.normalized();
        Self {
            normal: n,
            offset: -n.dot(point),
        }
    }

    #[inline]
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) + self.offset
    }
}

/// Result of testing a box against the frustum.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Containment {
    Miss,
    Partial,
    Inside,
}

/// View frustum as six inward-facing planes: near, far, left, right,
/// top, bottom.
#[derive(Clone, Copy, Debug)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Builds the frustum from a camera basis. `fov_y_deg` is the full
    /// vertical field of view in degrees.
    pub fn from_camera(
        eye: Vec3,
        forward: Vec3,
        up: Vec3,
        fov_y_deg: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let fwd = forward.normalized();
        let right = fwd.cross(up).normalized();
        let up = right.cross(fwd).normalized();

        let half_v = (fov_y_deg.to_radians() * 0.5).tan();
        let half_h = half_v * aspect;

        let near_plane = Plane::through(eye + fwd * near, fwd);
        let far_plane = Plane::through(eye + fwd * far, -fwd);
        // Side planes all pass through the eye; inward normals come from
        // crossing the edge direction with the matching basis vector.
        let left = Plane::through(eye, (fwd - right * half_h).cross(up));
        let right_p = Plane::through(eye, up.cross(fwd + right * half_h));
        let bottom = Plane::through(eye, right.cross(fwd - up * half_v));
        let top = Plane::through(eye, (fwd + up * half_v).cross(right));

        Self {
            planes: [near_plane, far_plane, left, right_p, top, bottom],
        }
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        self.planes.iter().all(|pl| pl.signed_distance(p) >= 0.0)
    }

    /// Three-state box test using the positive/negative vertex per plane.
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Containment {
        let mut result = Containment::Inside;
        for plane in &self.planes {
            let n = plane.normal;
            let p_vertex = Vec3::new(
                if n.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if n.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if n.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            if plane.signed_distance(p_vertex) < 0.0 {
                return Containment::Miss;
            }
            let n_vertex = Vec3::new(
                if n.x >= 0.0 { aabb.min.x } else { aabb.max.x },
                if n.y >= 0.0 { aabb.min.y } else { aabb.max.y },
                if n.z >= 0.0 { aabb.min.z } else { aabb.max.z },
            );
            if plane.signed_distance(n_vertex) < 0.0 {
                result = Containment::Partial;
            }
        }
        result
    }
}
