//! Planning for the kaptx rig: which directions to shoot in, and how to move
//! the servos there.
//!
//! [`pattern`] expands a shoot mode into a list of aim points, and [`slew`]
//! steps servo positions toward a goal with bounded acceleration.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod pattern;
pub mod slew;

pub use pattern::{plan, ShootMode, Shots, MAX_SHOTS};
pub use slew::{Axis, SlewIter};
