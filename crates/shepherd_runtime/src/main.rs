//! Shepherd Runtime
//!
//! Headless session runner. Loads a session, ticks it at the configured
//! frame rate until it is won, lost, interrupted or out of ticks, logging
//! events along the way, then prints the final snapshot as JSON.
//!
//! Run with: cargo run -p shepherd_runtime -- hard --fast
//!       or: cargo run --bin shepherd -- demos/meadow.toml

mod boot_config;

use boot_config::BootConfig;
use shepherd_sim::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Ticks between progress lines
const REPORT_INTERVAL: u64 = 300;

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    let boot = BootConfig::load();
    boot.print_summary();

    let config = match boot.session_config() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load session: {}", e);
            std::process::exit(1);
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        log::info!("Received Ctrl+C, shutting down...");
        r.store(false, Ordering::SeqCst);
    }) {
        log::warn!("Failed to set Ctrl+C handler: {}", e);
    }

    let snapshot = match run(&boot, config, &running) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            log::error!("Session failed: {}", e);
            std::process::exit(1);
        }
    };

    let json = if boot.pretty {
        snapshot.to_json_pretty()
    } else {
        snapshot.to_json()
    };
    match json {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn run(boot: &BootConfig, config: SessionConfig, running: &AtomicBool) -> Result<Snapshot> {
    let mut limiter = FrameLimiter::new(config.frame_rate);
    let mut sim = SimulationState::new(config)?;

    while running.load(Ordering::SeqCst)
        && sim.outcome().is_none()
        && sim.tick_count() < boot.max_ticks
    {
        let now = Instant::now();
        if !boot.fast && !limiter.should_run(now) {
            std::thread::sleep(limiter.remaining(now));
            continue;
        }

        let input = TickInput {
            luring: boot.luring,
            scatter: false,
            recall: boot.auto_recall && sim.is_scattered(),
        };
        for event in sim.tick(&input)? {
            log_event(&event);
        }

        if sim.tick_count() % REPORT_INTERVAL == 0 {
            let survivor = sim.survivor();
            log::info!(
                "tick {}: {} at ({:.0}, {:.0}), {} recruited, route {:.0} left",
                sim.tick_count(),
                sim.status().as_str(),
                survivor.position.x,
                survivor.position.y,
                sim.recruited_count(),
                sim.route().remaining_length()
            );
        }
    }

    match sim.outcome() {
        Some(outcome) => log::info!("Finished after {} ticks: {:?}", sim.tick_count(), outcome),
        None => log::info!("Stopped after {} ticks without an outcome", sim.tick_count()),
    }
    Ok(sim.snapshot())
}

fn log_event(event: &SimEvent) {
    match event {
        SimEvent::Won => log::info!("The survivor reached the goal"),
        SimEvent::Lost { reason } => log::info!("Session lost: {:?}", reason),
        SimEvent::FlockScattered => log::info!("The flock scattered"),
        SimEvent::FlockRecalled { recruited } => {
            log::info!("Flock recalled with {} followers", recruited)
        }
        SimEvent::ZoneActivated { index } => log::info!("Speed zone {} activated", index),
        SimEvent::WaypointReached => log::info!("Waypoint reached"),
        SimEvent::ShelterEntered { index } => log::debug!("Entered shelter {}", index),
        SimEvent::ShelterLeft { index } => log::debug!("Left shelter {}", index),
    }
}
