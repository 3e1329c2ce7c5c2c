//! Classification of joystick deflection into compass sectors.
//!
//! Joystick coordinates are signed and centered on zero, with positive `x`
//! to the right and positive `y` up. Both classifiers work by folding the
//! vector into the first octant (`0 <= y <= x`), comparing the slope against
//! fixed tangents, and then unfolding the resulting index.

/// Units for joystick deflection.
pub struct Js;

pub type JsVector = euclid::Vector2D<i32, Js>;

/// Full-scale deflection on either axis.
pub const JS_SPAN: i32 = 512;

/// Inside this radius the stick counts as centered.
pub const JS_NEUTRAL: i32 = 350;

/// Beyond this radius the stick counts as pushed.
pub const JS_OUT: i32 = 400;

/// How far the stick must drift along the perpendicular axis before a bump
/// turns into a slide.
pub const JS_SLIDE: i32 = 100;

const TAN_7_5: f32 = 0.131_652_5;
const TAN_22_5: f32 = 0.414_213_56;
const TAN_37_5: f32 = 0.767_327;

struct Folded {
    // Reflected about the x axis (y was negative).
    flip_y: bool,
    // Reflected about the y axis (x was negative).
    flip_x: bool,
    // Reflected about the diagonal (|y| was bigger than |x|).
    swap: bool,
    slope: f32,
}

fn fold(v: JsVector) -> Folded {
    let (mut x, mut y) = (v.x, v.y);
    let flip_y = y < 0;
    let flip_x = x < 0;
    x = x.abs();
    y = y.abs();
    let swap = y > x;
    if swap {
        core::mem::swap(&mut x, &mut y);
    }

    // x >= y >= 0 here, so x == 0 only for the zero vector.
    let slope = if x == 0 { 0.0 } else { y as f32 / x as f32 };
    Folded {
        flip_y,
        flip_x,
        swap,
        slope,
    }
}

/// Maps a deflection into one of 16 sectors, each 22.5 degrees wide.
///
/// Sector 0 spans from due east to 22.5 degrees north of east; numbering
/// runs counterclockwise, so sectors 3 and 4 straddle north, 7 and 8 west,
/// 11 and 12 south, and 15 and 0 east.
pub fn sector16(v: JsVector) -> u8 {
    let f = fold(v);
    let mut index = if f.slope > TAN_22_5 { 1 } else { 0 };

    if f.swap {
        index = 3 - index;
    }
    if f.flip_x {
        index = 7 - index;
    }
    if f.flip_y {
        index = 15 - index;
    }
    index
}

/// Maps a deflection into one of 24 sectors, each 15 degrees wide and
/// centered on a multiple of 15 degrees. Sector 0 is due east, 6 north,
/// 12 west and 18 south, which matches the angular index used for aiming.
pub fn sector24(v: JsVector) -> u8 {
    let f = fold(v);
    let mut index = if f.slope > TAN_22_5 {
        if f.slope > TAN_37_5 {
            3
        } else {
            2
        }
    } else if f.slope > TAN_7_5 {
        1
    } else {
        0
    };

    if f.swap {
        index = 6 - index;
    }
    if f.flip_x {
        index = 12 - index;
    }
    if f.flip_y {
        index = 24 - index;
    }
    if index == 24 {
        index = 0;
    }
    index
}

pub fn is_out(v: JsVector) -> bool {
    v.square_length() > JS_OUT * JS_OUT
}

pub fn is_center(v: JsVector) -> bool {
    v.square_length() < JS_NEUTRAL * JS_NEUTRAL
}

/// A deflection of `radius` in the direction `degrees` (counterclockwise from east).
pub fn from_polar(degrees: f32, radius: f32) -> JsVector {
    let rad = degrees * core::f32::consts::PI / 180.0;
    euclid::vec2(
        libm::roundf(radius * libm::cosf(rad)) as i32,
        libm::roundf(radius * libm::sinf(rad)) as i32,
    )
}
