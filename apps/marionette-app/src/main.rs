//! Marionette IK rig CLI.
//!
//! Provides two modes of operation:
//! - `solve`: Run a headless frame loop that sweeps an animated target
//!   past the chain and prints per-frame solver telemetry
//! - `info`: Print workspace crate versions and the default configuration
//!
//! The frame loop stands in for the host render loop: it feeds the rig a
//! target each frame, solves, and reads back the rendered effector the
//! way a renderer would read bone matrices.

use clap::{Parser, Subcommand};
use nalgebra::Point3;

use marionette_core::RigConfig;
use marionette_ik::{IkRig, SolveOutcome, TargetTrack};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Marionette skeletal IK rig.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a headless target sweep and print solver telemetry.
    Solve {
        /// Number of frames to run.
        #[arg(short, long, default_value_t = 240)]
        frames: u32,

        /// Number of bones in the chain (overrides the config file).
        #[arg(short, long)]
        bones: Option<usize>,

        /// Frames per target sweep (one end of the track to the other).
        #[arg(short, long, default_value_t = 60)]
        sweep: u32,

        /// Optional TOML rig configuration.
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,
    },

    /// Print crate information.
    Info,
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn run_solve(frames: u32, bones: Option<usize>, sweep: u32, config: Option<std::path::PathBuf>) {
    let mut config = match config {
        Some(path) => RigConfig::from_file(&path)
            .unwrap_or_else(|e| panic!("failed to load {}: {e}", path.display())),
        None => RigConfig::default(),
    };
    if let Some(bones) = bones {
        config.bone_count = bones;
    }
    config.validate().expect("invalid rig configuration");

    let mut rig = IkRig::new(&config).expect("failed to build rig");
    let reach = config.reach();

    // Sweep the target across the workspace, comfortably inside reach.
    let track = TargetTrack::line(
        Point3::new(0.6 * reach, 0.25 * reach, 0.0),
        Point3::new(-0.5 * reach, 0.55 * reach, 0.2 * reach),
    );

    println!(
        "rig: {} bones, segment {:.2}, reach {:.2}",
        config.bone_count, config.segment_length, reach
    );
    println!(
        "solver: max_iterations={}, tolerance={}",
        config.solver.max_iterations, config.solver.tolerance
    );
    println!("running {frames} frames, {sweep} frames per sweep\n");

    let mut converged = 0u32;
    for frame in 0..frames {
        rig.rebuild_if_needed().expect("rebuild failed");

        let phase = TargetTrack::ping_pong(frame as f32 / sweep as f32);
        let target = track.position_at(phase);

        if !config.run_solve {
            continue;
        }
        let report = rig.solve(&target);
        if report.reached() {
            converged += 1;
        }

        if frame % 10 == 0 {
            let effector = rig.effector_position();
            println!(
                "  frame {frame:4}  target [{:.2}, {:.2}, {:.2}]  effector [{:.3}, {:.3}, {:.3}]  err={:.4}  iters={}  {:?}",
                target.x, target.y, target.z,
                effector.x, effector.y, effector.z,
                report.position_error, report.iterations, report.outcome,
            );
        }
    }

    println!("\n{converged}/{frames} frames within tolerance");

    // Fixed-target verification sweep, independent of the animation.
    println!("\n--- Solver verification ---");
    let targets = [
        Point3::new(0.5 * reach, 0.3 * reach, 0.0),
        Point3::new(0.0, 0.9 * reach, 0.0),
        Point3::new(-0.4 * reach, 0.2 * reach, 0.4 * reach),
        Point3::new(0.0, 2.0 * reach, 0.0), // deliberately out of reach
    ];
    for (i, target) in targets.iter().enumerate() {
        let report = rig.solve(target);
        let label = match report.outcome {
            SolveOutcome::Converged | SolveOutcome::AlreadyAtTarget => "CONVERGED",
            SolveOutcome::IterationBudget => "BUDGET",
            SolveOutcome::Unreachable => "UNREACHABLE",
        };
        println!(
            "  target {i}: [{:.2}, {:.2}, {:.2}]  err={:.5}  iters={}  {label}",
            target.x, target.y, target.z, report.position_error, report.iterations,
        );
    }
}

fn run_info() {
    println!("marionette v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("crates:");
    println!("  marionette-core  {}", env!("CARGO_PKG_VERSION"));
    println!("  marionette-ik    {}", env!("CARGO_PKG_VERSION"));
    println!();
    let defaults = RigConfig::default();
    println!(
        "defaults: bones={}, segment_length={}, max_iterations={}, tolerance={}",
        defaults.bone_count,
        defaults.segment_length,
        defaults.solver.max_iterations,
        defaults.solver.tolerance
    );
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Solve {
            frames,
            bones,
            sweep,
            config,
        }) => run_solve(frames, bones, sweep, config),
        Some(Commands::Info) => run_info(),
        None => {
            // Default: a short solve run with defaults
            run_solve(120, None, 60, None);
        }
    }
}
