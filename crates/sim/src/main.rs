use std::{path::PathBuf, time::Duration};

use anyhow::Context as _;
use clap::Parser;

use crate::{script::Script, simulator::Simulation};

mod plot;
mod script;
mod simulator;

/// The controller runs once per pulse frame.
const TICK: Duration = Duration::from_millis(20);

/// Runs a scripted joystick session through the rig controller.
#[derive(Parser)]
struct Args {
    /// JSON script to play back.
    script: PathBuf,

    /// Give up after this many ticks, even if the rig is still busy.
    #[arg(long, default_value_t = 30_000)]
    max_ticks: usize,

    /// Write a plot of the servo positions here.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write the servo frames here, COBS-framed.
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Run at the rig's speed (50 ticks per second) instead of flat out.
    #[arg(long)]
    realtime: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let args = Args::parse();

    let script = Script::load(&args.script)?;
    let mut sim = Simulation::new(&script);

    let mut interval = tokio::time::interval(TICK);
    while !sim.is_finished() && sim.ticks < args.max_ticks {
        if args.realtime {
            interval.tick().await;
        }
        sim.step();
    }

    let report = sim.report();
    if !report.settled {
        log::warn!("still busy after {} ticks", report.ticks);
    }
    eprintln!(
        "{} ticks ({:.1}s), {} shots queued, {} fired",
        report.ticks,
        report.ticks as f64 * TICK.as_secs_f64(),
        report.shots_queued,
        report.shots_fired,
    );
    if report.shots_fired > 0 {
        eprintln!("{:.1} ticks per shot", report.ticks as f64 / report.shots_fired as f64);
    }

    let frames = &sim.rig.ppm;
    if let Some(path) = &args.svg {
        let presses = frames.shutter_presses(sim.rig.model.tuning().shutter_down);
        plot::save(path, &frames.frames, &presses)
            .with_context(|| format!("failed to write plot to {}", path.display()))?;
    }
    if let Some(path) = &args.frames {
        std::fs::write(path, frames.encode()?)
            .with_context(|| format!("failed to write frames to {}", path.display()))?;
    }

    Ok(())
}
