use crate::plotting;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reactorlab_core::{
    fleet::Fleet,
    logger::{self, TimeSeriesLogger},
};
use reactorlab_schemas::{
    command::ScheduledCommand,
    file_formats::FleetFile,
    reactor::ReactorStatus,
};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Owns the fleet for one run together with its scripted scenario and the
/// time-series log it writes every refresh.
pub struct Driver {
    fleet: Fleet,
    scenario: Vec<ScheduledCommand>,
    next_command: usize,
    logger: TimeSeriesLogger,
    output_dir: PathBuf,
}

impl Driver {
    pub fn new(file: &FleetFile, start: DateTime<Utc>, output_dir: &Path) -> Result<Self> {
        fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

        let fleet = Fleet::from_file(file, start).context("Failed to build fleet")?;
        let logger = TimeSeriesLogger::new(output_dir.join("timeseries.csv"))?;

        let mut scenario = file.scenario.clone();
        scenario.sort_by_key(|s| s.at_refresh);

        let mut driver = Self {
            fleet,
            scenario,
            next_command: 0,
            logger,
            output_dir: output_dir.to_path_buf(),
        };
        driver.apply_due_commands();
        Ok(driver)
    }

    /// One driver period: advance the fleet, issue scenario commands that
    /// have become due, then append the refresh to the time-series log.
    pub fn refresh(&mut self) -> Result<()> {
        self.fleet.advance_all();
        self.apply_due_commands();
        self.logger.log_fleet(&self.fleet)?;
        Ok(())
    }

    /// Issues every command due at the current refresh count. A failing
    /// command is logged and skipped.
    fn apply_due_commands(&mut self) {
        while let Some(scheduled) = self.scenario.get(self.next_command) {
            if scheduled.at_refresh > self.fleet.refreshes() {
                break;
            }
            match self.fleet.execute(&scheduled.command) {
                Ok(()) => info!(
                    refresh = self.fleet.refreshes(),
                    reactor_id = scheduled.command.reactor_id(),
                    "scenario command applied"
                ),
                Err(err) => warn!(
                    refresh = self.fleet.refreshes(),
                    reactor_id = scheduled.command.reactor_id(),
                    %err,
                    "scenario command failed"
                ),
            }
            self.next_command += 1;
        }
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    /// Writes the closing snapshot and charts, then prints the report.
    pub fn finish(self, plots: bool) -> Result<()> {
        println!("\n--- [Workflow] Writing Outputs ---");
        let snapshot_path = self.output_dir.join("snapshot.json");
        logger::write_snapshot(&self.fleet, &snapshot_path)?;
        println!("Snapshot written to '{}'.", snapshot_path.display());

        if plots {
            plotting::generate_all_plots(&self.output_dir, &self.fleet)?;
        }

        print_summary_report(&self.fleet);
        Ok(())
    }
}

/// Advances the fleet `refreshes` times back to back.
pub fn run_headless(driver: &mut Driver, refreshes: u64) -> Result<()> {
    println!("\n--- [Workflow] Simulating {} refreshes ---", refreshes);
    for _ in 0..refreshes {
        driver.refresh()?;
    }
    Ok(())
}

/// Advances the fleet once per refresh interval until Ctrl-C, or until
/// `limit` refreshes when one is given.
pub async fn run_realtime(driver: &mut Driver, limit: Option<u64>) -> Result<()> {
    let period = Duration::from_millis(driver.fleet().settings().refresh_interval_ms.max(1));
    println!("\n--- [Workflow] Running in real time (every {:?}, Ctrl-C to stop) ---", period);

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately; consume it so the first refresh
    // lands one full period after start.
    interval.tick().await;

    loop {
        if limit.is_some_and(|limit| driver.fleet().refreshes() >= limit) {
            break;
        }
        tokio::select! {
            _ = interval.tick() => {
                driver.refresh()?;
                let stats = driver.fleet().stats();
                info!(
                    refresh = driver.fleet().refreshes(),
                    active = stats.active_reactors,
                    average_yield = stats.average_yield,
                    alerts = stats.total_alerts,
                    "refresh complete"
                );
            }
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl-C")?;
                info!("interrupt received, stopping");
                break;
            }
        }
    }
    Ok(())
}

fn print_summary_report(fleet: &Fleet) {
    let stats = fleet.stats();

    println!("\n\n--- [Final Summary Report] ---");
    println!("========================================");
    println!("Refreshes: {} | Simulated time: {}", fleet.refreshes(), fleet.now().to_rfc3339());
    println!("----------------------------------------");
    println!("Dashboard Statistics:");
    println!("  - Reactors (active/total): {}/{}", stats.active_reactors, stats.total_reactors);
    println!("  - Average Yield:            {:.1} %", stats.average_yield);
    println!("  - System Health:            {:.1} %", stats.system_health);
    println!("  - Daily Production:         {:.1} kg", stats.daily_production);
    println!("  - Uptime:                   {:.1} %", stats.uptime);
    println!("  - Open Alerts (critical):   {} ({})", stats.total_alerts, stats.critical_alerts);

    println!("\nReactors:");
    for reactor in fleet.reactors() {
        let metrics = reactor.metrics();
        let forecast = &reactor.prediction().enzyme_deactivation;
        println!(
            "  - {:<8} {:<20} | {:<11} | T {:>5.2} °C | pH {:>4.2} | Activity {:>5.1} % | Yield {:>5.1} % | ~{:.0} h left",
            reactor.id(),
            reactor.name(),
            reactor.status().as_str(),
            metrics.temperature,
            metrics.ph,
            metrics.enzyme_activity,
            metrics.product_yield,
            forecast.hours_remaining,
        );
        if reactor.status() == ReactorStatus::Maintenance {
            if let Some(action) = &forecast.suggested_action {
                println!("      maintenance: {}", action);
            }
        }
        for alert in reactor.alerts().unresolved() {
            println!("      [{:?}] {}", alert.kind, alert.message);
        }
    }

    let optimizations = fleet.snapshot().optimizations;
    if !optimizations.is_empty() {
        println!("\nOptimization Results:");
        for result in optimizations {
            println!(
                "  - {}: +{:.1}% yield, +{:.1}% efficiency, -{:.1}% cost ({} change(s))",
                result.reactor_id,
                result.yield_increase,
                result.efficiency_gain,
                result.cost_reduction,
                result.recommended_changes.len()
            );
        }
    }
    println!("========================================");
}
