#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! DShot300 framing and the bit-banged motor bank.
//!
//! Frame layout (MSB first): 11-bit throttle command, 1 telemetry request
//! bit, then a 4-bit XOR checksum over the three preceding nibbles. Command
//! values 1..=47 are reserved for ESC commands, so throttle uses 48..=2047
//! and 0 means motor stop.

/// Lowest command value that spins a motor.
pub const DSHOT_THROTTLE_MIN: u16 = 48;
/// Full-scale throttle command.
pub const DSHOT_THROTTLE_MAX: u16 = 2047;
/// Command value that stops the motor.
pub const DSHOT_MOTOR_STOP: u16 = 0;

/// Maps a unit throttle in `[0, 1]` onto the DShot throttle range.
///
/// Zero (and anything non-finite or negative) maps to motor stop.
#[must_use]
pub fn throttle_command(value: f32) -> u16 {
    if !value.is_finite() || value <= 0.0 {
        return DSHOT_MOTOR_STOP;
    }

    let span = f32::from(DSHOT_THROTTLE_MAX - DSHOT_THROTTLE_MIN);
    let scaled = value.min(1.0) * span;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let offset = (scaled + 0.5) as u16;
    DSHOT_THROTTLE_MIN + offset.min(DSHOT_THROTTLE_MAX - DSHOT_THROTTLE_MIN)
}

/// Builds the 16-bit wire frame for an 11-bit command.
#[must_use]
pub const fn dshot_frame(command: u16, telemetry: bool) -> u16 {
    let mut packet = (command & 0x07ff) << 1;
    if telemetry {
        packet |= 1;
    }

    let checksum = (packet ^ (packet >> 4) ^ (packet >> 8)) & 0x000f;
    (packet << 4) | checksum
}

/// Encodes one frame per motor from the mixer's unit outputs.
#[must_use]
pub fn encode_outputs<const M: usize>(values: &[f32]) -> [u16; M] {
    let mut frames = [dshot_frame(DSHOT_MOTOR_STOP, false); M];
    for (frame, value) in frames.iter_mut().zip(values) {
        *frame = dshot_frame(throttle_command(*value), false);
    }
    frames
}

#[cfg(target_os = "none")]
pub use bank::Dshot300Bank;

#[cfg(target_os = "none")]
mod bank {
    use cortex_m::asm;
    use embassy_stm32::gpio::Output;
    use flight_core::esc::dshot::DshotDriver;

    use super::encode_outputs;

    /// Bit-banged DShot300 outputs, one GPIO per motor.
    ///
    /// Cycle counts assume the 64 MHz system clock: a 3.33 µs bit, 2.5 µs
    /// high for a one and 1.25 µs high for a zero.
    pub struct Dshot300Bank<const M: usize> {
        pins: [Output<'static>; M],
    }

    impl<const M: usize> Dshot300Bank<M> {
        const BIT_TOTAL_CYCLES: u32 = 213;
        const BIT1_HIGH_CYCLES: u32 = 160;
        const BIT1_LOW_CYCLES: u32 = Self::BIT_TOTAL_CYCLES - Self::BIT1_HIGH_CYCLES;
        const BIT0_HIGH_CYCLES: u32 = 80;
        const BIT0_LOW_CYCLES: u32 = Self::BIT_TOTAL_CYCLES - Self::BIT0_HIGH_CYCLES;
        const FRAME_GAP_CYCLES: u32 = 2000;

        pub fn new(pins: [Output<'static>; M]) -> Self {
            Self { pins }
        }

        fn send_frame(pin: &mut Output<'static>, frame: u16) {
            // Interrupts stay masked for the whole frame so ISRs cannot stretch a bit.
            critical_section::with(|_cs| {
                for bit in (0..16).rev() {
                    let one = ((frame >> bit) & 0x1) != 0;

                    pin.set_high();
                    if one {
                        asm::delay(Self::BIT1_HIGH_CYCLES);
                        pin.set_low();
                        asm::delay(Self::BIT1_LOW_CYCLES);
                    } else {
                        asm::delay(Self::BIT0_HIGH_CYCLES);
                        pin.set_low();
                        asm::delay(Self::BIT0_LOW_CYCLES);
                    }
                }

                pin.set_low();
            });
            asm::delay(Self::FRAME_GAP_CYCLES);
        }
    }

    impl<const M: usize> DshotDriver for Dshot300Bank<M> {
        fn write(&mut self, values: &[f32]) {
            let frames = encode_outputs::<M>(values);
            for (pin, frame) in self.pins.iter_mut().zip(frames) {
                Self::send_frame(pin, frame);
            }
        }
    }
}
