//! Motor mixing and the guarded write path to the actuator.

use crate::clock::Micros;
use crate::esc::Esc;
use crate::state::Demands;

/// Motor count for a quad-X frame.
pub const QUAD_MOTORS: usize = 4;

/// Per-motor contribution of each body-axis demand.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MotorMix {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl MotorMix {
    pub const fn new(roll: f32, pitch: f32, yaw: f32) -> Self {
        Self { roll, pitch, yaw }
    }
}

/// Fixed coefficient table mapping [`Demands`] to `M` motor commands.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Mixer<const M: usize> {
    table: [MotorMix; M],
}

impl Mixer<QUAD_MOTORS> {
    /// Quad-X, motors ordered rear-right, front-right, rear-left, front-left.
    pub const QUAD_X: Self = Self::new([
        MotorMix::new(-1.0, -1.0, -1.0),
        MotorMix::new(-1.0, 1.0, 1.0),
        MotorMix::new(1.0, -1.0, 1.0),
        MotorMix::new(1.0, 1.0, -1.0),
    ]);
}

impl<const M: usize> Mixer<M> {
    pub const fn new(table: [MotorMix; M]) -> Self {
        Self { table }
    }

    pub const fn table(&self) -> &[MotorMix; M] {
        &self.table
    }

    /// Mixes demands into per-motor commands clamped to `[0, 1]`.
    ///
    /// Non-finite results map to 0 so a bad demand can never spin a motor up.
    #[must_use]
    pub fn mix(&self, demands: &Demands) -> [f32; M] {
        let mut motors = [0.0; M];
        for (motor, mix) in motors.iter_mut().zip(&self.table) {
            let value = demands.throttle
                + demands.roll * mix.roll
                + demands.pitch * mix.pitch
                + demands.yaw * mix.yaw;
            *motor = if value.is_finite() {
                value.clamp(0.0, 1.0)
            } else {
                0.0
            };
        }
        motors
    }
}

/// Why the output stage wrote what it wrote.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputGate {
    /// ESC still inside its startup interval; zeros written.
    NotReady,
    /// ESC ready but vehicle disarmed; zeros written.
    Disarmed,
    /// Mixed demands written.
    Live,
}

/// Result of one output-stage update.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct OutputUpdate {
    pub gate: OutputGate,
    /// `true` on the first tick the ESC reported ready.
    pub became_ready: bool,
}

/// Writer that enforces the actuator-not-ready and disarmed guards.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OutputStage<const M: usize> {
    mixer: Mixer<M>,
    last: [f32; M],
    esc_ready: bool,
}

impl<const M: usize> OutputStage<M> {
    pub const fn new(mixer: Mixer<M>) -> Self {
        Self {
            mixer,
            last: [0.0; M],
            esc_ready: false,
        }
    }

    pub const fn mixer(&self) -> &Mixer<M> {
        &self.mixer
    }

    /// Commands sent on the most recent write.
    pub const fn last_output(&self) -> &[f32; M] {
        &self.last
    }

    pub const fn esc_ready(&self) -> bool {
        self.esc_ready
    }

    /// Writes one tick of motor commands.
    pub fn update<E>(&mut self, esc: &mut E, demands: &Demands, armed: bool, now: Micros) -> OutputUpdate
    where
        E: Esc + ?Sized,
    {
        let ready = esc.is_ready(now);
        let became_ready = ready && !self.esc_ready;
        self.esc_ready = ready;

        let gate = match (ready, armed) {
            (false, _) => OutputGate::NotReady,
            (true, false) => OutputGate::Disarmed,
            (true, true) => OutputGate::Live,
        };

        self.last = match gate {
            OutputGate::Live => self.mixer.mix(demands),
            OutputGate::NotReady | OutputGate::Disarmed => [0.0; M],
        };
        esc.write(&self.last);

        OutputUpdate { gate, became_ready }
    }

    /// Commands zero on every motor regardless of readiness.
    pub fn stop<E>(&mut self, esc: &mut E)
    where
        E: Esc + ?Sized,
    {
        self.last = [0.0; M];
        esc.write(&self.last);
    }
}
