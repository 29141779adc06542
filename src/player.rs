//! Observer motion and per-block AABB collision response.

use tephra_geom::{Aabb, Vec3};

use crate::world::World;

/// Movement intents for one frame, already mapped from whatever input
/// device the host uses.
#[derive(Copy, Clone, Debug, Default)]
pub struct PlayerInput {
    /// Along camera forward, in [-1, 1].
    pub forward: f32,
    /// Along camera right, in [-1, 1].
    pub strafe: f32,
    /// Ghost-mode vertical intent, in [-1, 1].
    pub rise: f32,
    pub jump: bool,
    pub crouch: bool,
}

/// Camera basis supplied by the host each frame; only the horizontal
/// projection steers movement.
#[derive(Copy, Clone, Debug)]
pub struct CameraBasis {
    pub forward: Vec3,
    pub right: Vec3,
}

/// The embodied observer. `pos` is the standing eye position; the feet
/// sit at `pos.y - eye_level * height` regardless of crouching, which
/// only lowers where the camera samples from.
#[derive(Debug)]
pub struct Player {
    pub pos: Vec3,
    pub vel_y: f32,
    pub grounded: bool,
    pub crouched: bool,
    /// No gravity, no collision; free vertical movement.
    pub ghost: bool,
    pub width: f32,
    pub height: f32,
    /// Standing eye height as a fraction of total height.
    pub eye_level: f32,
    pub crouched_eye_level: f32,
    pub speed: f32,
    pub crouch_mult: f32,
    pub jump_speed: f32,
    pub gravity: f32,
}

impl Player {
    pub fn new(spawn_eye: Vec3) -> Self {
        Self {
            pos: spawn_eye,
            vel_y: 0.0,
            grounded: false,
            crouched: false,
            ghost: false,
            width: 0.75,
            height: 1.75,
            eye_level: 0.9,
            crouched_eye_level: 0.75,
            speed: 5.0,
            crouch_mult: 0.5,
            jump_speed: 7.5,
            gravity: -25.0,
        }
    }

    #[inline]
    fn feet_y(&self) -> f32 {
        self.pos.y - self.eye_level * self.height
    }

    /// Where the camera looks from. Crouching drops the eye without
    /// shrinking the collision box.
    pub fn eye_position(&self) -> Vec3 {
        let frac = if self.crouched {
            self.crouched_eye_level
        } else {
            self.eye_level
        };
        Vec3::new(self.pos.x, self.feet_y() + frac * self.height, self.pos.z)
    }

    pub fn aabb(&self) -> Aabb {
        let half = self.width * 0.5;
        let feet = self.feet_y();
        Aabb::new(
            Vec3::new(self.pos.x - half, feet, self.pos.z - half),
            Vec3::new(self.pos.x + half, feet + self.height, self.pos.z + half),
        )
    }

    pub fn advance(&mut self, input: &PlayerInput, cam: &CameraBasis, world: &World, dt: f32) {
        let loaded = world.chunklet_loaded_at(self.pos);
        self.advance_with(input, cam, dt, loaded, &|x, y, z| world.is_solid_at(x, y, z));
    }

    /// Core update against a block-solidity sampler. Split from
    /// `advance` so collision behavior is testable without a streamed
    /// world behind it.
    pub fn advance_with(
        &mut self,
        input: &PlayerInput,
        cam: &CameraBasis,
        dt: f32,
        chunklet_loaded: bool,
        solid: &dyn Fn(i32, i32, i32) -> bool,
    ) {
        self.crouched = input.crouch;

        let fwd = cam.forward.flattened().normalized();
        let right = cam.right.flattened().normalized();
        let wish = fwd * input.forward + right * input.strafe;
        let wish = if wish.length_sq() > 1.0 {
            wish.normalized()
        } else {
            wish
        };

        if self.ghost {
            let v = self.speed;
            self.pos += wish * v * dt;
            self.pos.y += input.rise * v * dt;
            self.vel_y = 0.0;
            self.grounded = false;
            return;
        }

        // Physics freezes until the ground under the observer streams
        // in; otherwise a fresh spawn falls through the world.
        if !chunklet_loaded {
            return;
        }

        let speed = if self.crouched {
            self.speed * self.crouch_mult
        } else {
            self.speed
        };

        if self.grounded && input.jump {
            self.vel_y = self.jump_speed;
            self.grounded = false;
        }

        self.vel_y += self.gravity * dt;
        self.pos.x += wish.x * speed * dt;
        self.pos.z += wish.z * speed * dt;
        self.pos.y += self.vel_y * dt;

        self.resolve_collisions(solid);
    }

    /// Pushes the AABB out of every overlapping solid block, one block
    /// at a time along the single axis of least penetration. Not a
    /// swept test: fast motion can tunnel through thin walls.
    fn resolve_collisions(&mut self, solid: &dyn Fn(i32, i32, i32) -> bool) {
        self.grounded = false;
        let bounds = self.aabb();
        let x0 = bounds.min.x.floor() as i32;
        let x1 = bounds.max.x.ceil() as i32;
        let y0 = bounds.min.y.floor() as i32;
        let y1 = bounds.max.y.ceil() as i32;
        let z0 = bounds.min.z.floor() as i32;
        let z1 = bounds.max.z.ceil() as i32;

        for by in y0..y1 {
            for bz in z0..z1 {
                for bx in x0..x1 {
                    if !solid(bx, by, bz) {
                        continue;
                    }
                    let cube = Aabb::unit_cube(bx, by, bz);
                    let aabb = self.aabb();
                    if !aabb.intersects(&cube) {
                        continue;
                    }
                    let depth = aabb.overlap(&cube);
                    let center = aabb.center();
                    let cube_center = cube.center();
                    if depth.x <= depth.y && depth.x <= depth.z {
                        let dir = if center.x >= cube_center.x { 1.0 } else { -1.0 };
                        self.pos.x += dir * depth.x;
                    } else if depth.y <= depth.z {
                        let dir = if center.y >= cube_center.y { 1.0 } else { -1.0 };
                        self.pos.y += dir * depth.y;
                        if dir * self.vel_y < 0.0 {
                            self.vel_y = 0.0;
                        }
                        if dir > 0.0 {
                            self.grounded = true;
                        }
                    } else {
                        let dir = if center.z >= cube_center.z { 1.0 } else { -1.0 };
                        self.pos.z += dir * depth.z;
                    }
                }
            }
        }
    }
}
