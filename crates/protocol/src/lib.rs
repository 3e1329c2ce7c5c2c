#![cfg_attr(not(feature = "std"), no_std)]

//! Data exchanged between the controller core and the hardware around it:
//! joystick samples coming in, servo pulse frames and display updates going
//! out.

use kaptx_geom::{sector16, sector24, JsVector};

mod display;
mod ppm;

pub use display::{Refresh, ShutterIndicator, Status};
pub use ppm::{Channel, PpmFrame, MAX_FRAME_LEN, PPM_CENTER, PPM_CHANNELS};

/// A button press.
///
/// The joystick hands one of these out for each press, and whoever handles
/// the press takes it. It can't be copied, so a press can't be handled twice.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct Press;

impl Press {
    pub fn new() -> Self {
        Press
    }
}

impl Default for Press {
    fn default() -> Self {
        Press::new()
    }
}

/// One tick's worth of joystick input.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct JsReading {
    /// Filtered deflection, centered on zero.
    pub pos: JsVector,
    /// Set if the button was pressed since the last reading.
    pub press: Option<Press>,
}

impl JsReading {
    pub fn new(pos: JsVector) -> Self {
        JsReading { pos, press: None }
    }

    pub fn pressed(pos: JsVector) -> Self {
        JsReading {
            pos,
            press: Some(Press::new()),
        }
    }

    pub fn is_out(&self) -> bool {
        kaptx_geom::is_out(self.pos)
    }

    pub fn is_center(&self) -> bool {
        kaptx_geom::is_center(self.pos)
    }

    pub fn sector16(&self) -> u8 {
        sector16(self.pos)
    }

    pub fn sector24(&self) -> u8 {
        sector24(self.pos)
    }

    /// Takes the press, if there was one. Later calls return `None`.
    pub fn take_press(&mut self) -> Option<Press> {
        self.press.take()
    }
}
