use kaptx_geom::{Pwm, PWM_MAX_OFFSET};
use serde::{Deserialize, Serialize};

/// Number of channels in a frame.
pub const PPM_CHANNELS: usize = 6;

/// Center pulse width, in half microseconds (1.5ms).
pub const PPM_CENTER: u16 = 3000;

/// Upper bound on the size of an encoded frame, including the COBS overhead
/// and the terminating zero.
pub const MAX_FRAME_LEN: usize = 24;

/// The channels that the rig listens to. Numbering is one-based, the way the
/// receiver labels them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Channel {
    Pan = 1,
    Tilt = 2,
    Shutter = 3,
    Hover = 4,
}

/// The servo offsets for one frame of the pulse train.
///
/// Writes that name a channel that doesn't exist, or an offset the servos
/// can't take, are dropped. The previous value stays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PpmFrame {
    offsets: [Pwm; PPM_CHANNELS],
}

impl PpmFrame {
    /// Sets a channel by its one-based number.
    pub fn write(&mut self, channel: u8, offset: Pwm) {
        if channel == 0 || channel as usize > PPM_CHANNELS {
            return;
        }
        if !(-PWM_MAX_OFFSET..=PWM_MAX_OFFSET).contains(&offset) {
            return;
        }
        self.offsets[channel as usize - 1] = offset;
    }

    pub fn set(&mut self, channel: Channel, offset: Pwm) {
        self.write(channel as u8, offset);
    }

    pub fn offset(&self, channel: u8) -> Option<Pwm> {
        let idx = (channel as usize).checked_sub(1)?;
        self.offsets.get(idx).copied()
    }

    pub fn get(&self, channel: Channel) -> Pwm {
        self.offsets[channel as usize - 1]
    }

    /// Pulse widths in half microseconds, in channel order.
    pub fn pulse_widths(&self) -> [u16; PPM_CHANNELS] {
        self.offsets.map(|o| (PPM_CENTER as i32 + o as i32) as u16)
    }

    /// Serializes the frame with postcard and COBS-frames it, so that frames
    /// can be streamed back to back and resynchronized on a zero byte.
    pub fn encode<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], postcard::Error> {
        postcard::to_slice_cobs(self, buf)
    }

    /// Decodes one COBS-framed frame (in place).
    ///
    /// Offsets outside of the servo range are dropped, the same as they would
    /// be for a direct write.
    pub fn decode(buf: &mut [u8]) -> Result<Self, postcard::Error> {
        let raw: PpmFrame = postcard::from_bytes_cobs(buf)?;
        let mut frame = PpmFrame::default();
        for (i, offset) in raw.offsets.into_iter().enumerate() {
            frame.write(i as u8 + 1, offset);
        }
        Ok(frame)
    }
}
