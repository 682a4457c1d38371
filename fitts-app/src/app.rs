//! Headless end-to-end run: one synthetic session per impairment level
//! against the real trial controller, persisted to the record store,
//! summarized to the upload sink, then pulled back through the analysis
//! pipeline with the regression printed per level.

use anyhow::{bail, Context, Result};
use fitts_analysis::{analyze, index_of_difficulty, AnalysisReport, FitStrength};
use fitts_core::{ImpairmentLevel, SessionReport, TrialDataset};
use fitts_session::{SessionConfig, SessionState, TrialController};
use fitts_store::{load_dataset, save_dataset, send_report, JsonLineSink};
use fitts_timing::ManualClock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::{self, File};
use std::path::Path;
use tracing::info;

const TRIALS_PER_SESSION: usize = 30;
const SESSION_SEED: u64 = 20_251_031;

pub fn run(data_dir: &Path) -> Result<()> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("creating data directory {}", data_dir.display()))?;
    let uploads = File::create(data_dir.join("uploads.jsonl"))?;
    let mut sink = JsonLineSink::new(uploads);

    for (i, level) in ImpairmentLevel::ALL.into_iter().enumerate() {
        let dataset = run_session(level, SESSION_SEED + i as u64)?;
        let path = data_dir.join(format!("fitts_{level}.csv"));
        save_dataset(&path, &dataset)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(level = %level, trials = dataset.len(), path = %path.display(), "dataset saved");

        // Fire-and-forget: a sink failure must not disturb persistence.
        send_report(&mut sink, &SessionReport::from_dataset(&dataset));
    }

    for level in ImpairmentLevel::ALL {
        let path = data_dir.join(format!("fitts_{level}.csv"));
        let loaded = load_dataset(&path, level)
            .with_context(|| format!("reading {}", path.display()))?;
        if loaded.skipped_rows > 0 {
            println!(
                "[{level}] skipped {} malformed row(s) during load",
                loaded.skipped_rows
            );
        }
        match analyze(&loaded.dataset) {
            Ok(report) => print_report(&report),
            Err(err) => println!("[{level}] analysis not possible: {err}\n"),
        }
    }

    Ok(())
}

/// Drives one full session with a scripted subject: it aims at the
/// rendered target center and takes a movement time that follows the
/// aiming law (with seeded noise), so harder targets take longer. The
/// impairment transform then distorts that input like a real session.
fn run_session(level: ImpairmentLevel, seed: u64) -> Result<TrialDataset> {
    let clock = ManualClock::new();
    let config = SessionConfig {
        trial_count: TRIALS_PER_SESSION,
        ..SessionConfig::default()
    };
    let surface_center = config.surface.center();
    let mut controller = TrialController::new(
        config,
        level.profile(),
        clock.clone(),
        StdRng::seed_from_u64(seed),
    );
    let mut subject = StdRng::seed_from_u64(seed ^ 0x5EED);

    controller.start()?;

    let mut previous_hit = surface_center;
    let mut aimed_trial = 0;
    let mut steps = 0u32;
    while controller.state() != SessionState::Complete {
        steps += 1;
        if steps > 1_000_000 {
            bail!("session for level {level} did not converge");
        }
        clock.advance(25);
        for event in controller.tick() {
            if let fitts_session::SessionEvent::Hit { observation } = event {
                info!(level = %level, trial = observation.trial_index,
                      mt_ms = observation.movement_time_ms, "hit");
            }
        }
        if controller.state() != SessionState::AwaitingInput
            || controller.pending_evaluations() > 0
        {
            continue;
        }
        let (trial, target) = match (controller.trial_index(), controller.current_target()) {
            (Some(trial), Some(target)) => (trial, target),
            _ => continue,
        };

        if trial != aimed_trial {
            // First attempt on this target: spend a difficulty-dependent
            // movement time before the click lands.
            let id = index_of_difficulty(
                previous_hit.distance_to(target.center),
                target.diameter_px(),
            );
            let planned_ms = 180.0 + 55.0 * id + subject.random_range(-20.0..=20.0);
            clock.advance(planned_ms.max(1.0) as u64);
            controller.tick();
            aimed_trial = trial;
        }
        if controller.state() == SessionState::AwaitingInput {
            if let Some(center) = controller.rendered_target_center() {
                controller.submit_input(center);
                previous_hit = target.center;
            }
        }
    }

    controller.into_dataset().map_err(Into::into)
}

fn print_report(report: &AnalysisReport) {
    let fit = &report.regression;
    println!("Fitts' Law Regression Results ({})", report.level);
    println!("-----------------------------");
    println!("Equation:  MT = {:.2} + {:.2} * ID", fit.intercept, fit.slope);
    println!("a (intercept): {:.2} ms", fit.intercept);
    println!("b (slope): {:.2} ms/bit", fit.slope);
    println!("R² (fit quality): {:.4}", fit.r_squared);
    println!(
        "Trials: {} loaded, {} dropped, {} outlier(s) removed, {} aggregated points",
        report.rows_loaded,
        report.rows_dropped,
        report.outliers_removed,
        report.points.len()
    );
    match report.strength {
        FitStrength::Strong => {
            println!("Strong linear relationship: results strongly support Fitts' Law.")
        }
        FitStrength::Moderate => {
            println!("Moderate correlation: results partially support Fitts' Law.")
        }
        FitStrength::Weak => {
            println!("Weak correlation: data shows remaining variance or inconsistency.")
        }
    }
    println!();
}
