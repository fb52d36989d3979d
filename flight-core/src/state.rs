//! Shared vehicle-state record propagated between tasks within a tick.
//!
//! [`VehicleState`] is plain data. Each task owns a disjoint subset of its
//! fields, and the scheduler runs tasks to completion one after another, so a
//! reader always observes a consistent snapshot without locking.

/// Three-component vector used for angle and rate triples (radians, rad/s).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Axes {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Axes {
    /// All components zero.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Estimated and commanded flight quantities.
///
/// Angles follow the body-frame convention of the [`Imu`](crate::imu::Imu)
/// collaborator: `phi` roll, `theta` pitch, `psi` yaw.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VehicleState {
    pub x: f32,
    pub dx: f32,
    pub y: f32,
    pub dy: f32,
    pub z: f32,
    pub dz: f32,
    pub phi: f32,
    pub dphi: f32,
    pub theta: f32,
    pub dtheta: f32,
    pub psi: f32,
    pub dpsi: f32,
}

impl VehicleState {
    /// State with every field zeroed, as allocated at controller start.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            x: 0.0,
            dx: 0.0,
            y: 0.0,
            dy: 0.0,
            z: 0.0,
            dz: 0.0,
            phi: 0.0,
            dphi: 0.0,
            theta: 0.0,
            dtheta: 0.0,
            psi: 0.0,
            dpsi: 0.0,
        }
    }

    /// Returns `(phi, theta, psi)`.
    #[must_use]
    pub const fn angles(&self) -> Axes {
        Axes::new(self.phi, self.theta, self.psi)
    }

    /// Returns `(dphi, dtheta, dpsi)`.
    #[must_use]
    pub const fn rates(&self) -> Axes {
        Axes::new(self.dphi, self.dtheta, self.dpsi)
    }

    /// Overwrites the attitude angles verbatim.
    pub fn set_angles(&mut self, angles: Axes) {
        self.phi = angles.x;
        self.theta = angles.y;
        self.psi = angles.z;
    }

    /// Overwrites the angular rates verbatim.
    pub fn set_rates(&mut self, rates: Axes) {
        self.dphi = rates.x;
        self.dtheta = rates.y;
        self.dpsi = rates.z;
    }
}

/// Pilot or autopilot demands fed to the mixer.
///
/// `throttle` is normalized to `[0, 1]`; `roll`, `pitch` and `yaw` are
/// signed corrections in `[-1, 1]`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Demands {
    pub throttle: f32,
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl Demands {
    /// No thrust and no corrections.
    pub const IDLE: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(throttle: f32, roll: f32, pitch: f32, yaw: f32) -> Self {
        Self {
            throttle,
            roll,
            pitch,
            yaw,
        }
    }
}
