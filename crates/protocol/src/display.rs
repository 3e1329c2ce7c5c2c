use core::fmt;

use bitflags::bitflags;
use kaptx_geom::AimPoint;
use kaptx_planner::ShootMode;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Which parts of the display need redrawing, and which indicators
    /// should be drawn inverted.
    ///
    /// The change bits accumulate until the display reads them. The invert
    /// bits are state, and stay set until the controller clears them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Refresh: u8 {
        const PAN_TILT = 1 << 0;
        const AUTO_COUNT = 1 << 1;
        const SHOOT_MODE = 1 << 2;
        const SHUTTER = 1 << 3;
        const HOVER = 1 << 4;

        /// The shoot mode is being chosen.
        const INV_SHOOT_MODE = 1 << 5;
        /// The hover orientation is being chosen.
        const INV_HOVER = 1 << 6;
        /// Auto mode is being toggled.
        const INV_AUTO_COUNT = 1 << 7;

        const CHANGES = Self::PAN_TILT.bits()
            | Self::AUTO_COUNT.bits()
            | Self::SHOOT_MODE.bits()
            | Self::SHUTTER.bits()
            | Self::HOVER.bits();
    }
}

impl Default for Refresh {
    /// Everything needs drawing the first time.
    fn default() -> Self {
        Refresh::CHANGES
    }
}

/// The shutter icon on the display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ShutterIndicator {
    #[default]
    No = 0,
    /// Manual mode, and the rig is still: a press will shoot right away.
    Ready = 1,
    /// A shot is on its way, or the camera is busy with one.
    Active = 2,
    /// The shutter is pressed.
    Triggered = 3,
}

impl From<u8> for ShutterIndicator {
    fn from(raw: u8) -> Self {
        match raw {
            1 => ShutterIndicator::Ready,
            2 => ShutterIndicator::Active,
            3 => ShutterIndicator::Triggered,
            _ => ShutterIndicator::No,
        }
    }
}

/// Everything the display shows, as of one read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Change and invert bits. Only the change bits are cleared by the read
    /// that produced this.
    pub refresh: Refresh,
    pub user: AimPoint,
    /// The mode to show. While choosing, this differs from the active mode.
    pub shoot_mode: ShootMode,
    pub auto: bool,
    pub shots_queued: u8,
    pub hover_vertical: bool,
    pub shutter: ShutterIndicator,
}

impl Status {
    pub fn is_dirty(&self) -> bool {
        self.refresh.intersects(Refresh::CHANGES)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inv = |flag| if self.refresh.contains(flag) { "*" } else { "" };
        write!(
            f,
            "pan {}° tilt {}° | {}{} | {}{} {} | {}{} | shutter {:?}",
            self.user.pan.degrees(),
            self.user.tilt.signed() * 15,
            inv(Refresh::INV_SHOOT_MODE),
            self.shoot_mode.name(),
            inv(Refresh::INV_AUTO_COUNT),
            if self.auto { "auto" } else { "manual" },
            self.shots_queued,
            inv(Refresh::INV_HOVER),
            if self.hover_vertical { "vertical" } else { "horizontal" },
            self.shutter,
        )
    }
}
