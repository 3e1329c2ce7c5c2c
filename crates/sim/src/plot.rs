use std::path::Path;

use kaptx_geom::PWM_MAX_OFFSET;
use kaptx_protocol::{Channel, PpmFrame};
use kurbo::{Affine, BezPath, Point};
use svg::{
    node::element::{Circle, Line, Path as SvgPath},
    Document,
};

// One tick is this many units wide.
const TICK_WIDTH: f64 = 2.0;
// And one PWM step is this tall.
const PWM_HEIGHT: f64 = 0.1;

/// Maps (tick, pwm) to svg coordinates, with +1600 at the top.
fn to_svg() -> Affine {
    Affine::scale_non_uniform(TICK_WIDTH, -PWM_HEIGHT)
        .then_translate((0.0, PWM_MAX_OFFSET as f64 * PWM_HEIGHT).into())
}

fn trace(frames: &[PpmFrame], channel: Channel) -> BezPath {
    let mut path = BezPath::new();
    for (tick, frame) in frames.iter().enumerate() {
        let p = Point::new(tick as f64, frame.get(channel) as f64);
        if tick == 0 {
            path.move_to(p);
        } else {
            path.line_to(p);
        }
    }
    path.apply_affine(to_svg());
    path
}

/// Draws pan and tilt over time, with a dot wherever the shutter fired.
pub fn plot(frames: &[PpmFrame], presses: &[usize]) -> Document {
    let w = frames.len().max(1) as f64 * TICK_WIDTH;
    let h = 2.0 * PWM_MAX_OFFSET as f64 * PWM_HEIGHT;

    let zero = to_svg() * Point::new(0.0, 0.0);
    let mut document = Document::new().set("viewBox", (0.0, 0.0, w, h)).add(
        Line::new()
            .set("x1", 0.0)
            .set("y1", zero.y)
            .set("x2", w)
            .set("y2", zero.y)
            .set("stroke", "lightgray")
            .set("stroke-width", 0.5),
    );

    for (channel, color) in [(Channel::Pan, "blue"), (Channel::Tilt, "red")] {
        let path = trace(frames, channel);
        document = document.add(
            SvgPath::new()
                .set("fill", "none")
                .set("stroke", color)
                .set("stroke-width", 1)
                .set("d", path.to_svg()),
        );
    }

    for &tick in presses {
        let Some(frame) = frames.get(tick) else {
            continue;
        };
        for channel in [Channel::Pan, Channel::Tilt] {
            let p = to_svg() * Point::new(tick as f64, frame.get(channel) as f64);
            document = document.add(
                Circle::new()
                    .set("cx", p.x)
                    .set("cy", p.y)
                    .set("r", 2.0)
                    .set("fill", "black"),
            );
        }
    }

    document
}

pub fn save(path: &Path, frames: &[PpmFrame], presses: &[usize]) -> anyhow::Result<()> {
    svg::save(path, &plot(frames, presses))?;
    Ok(())
}
