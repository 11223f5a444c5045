use anyhow::{bail, Context, Result};
use reactorlab_schemas::{
    command::{Command, ScheduledCommand},
    file_formats::{FleetFile, ReactorDefinition, SimulationSettings},
    reactor::{OperatingMode, ReactorConfig},
};
use std::{collections::HashSet, fs, path::Path};

/// Loads a fleet description from a YAML file.
pub fn load_fleet_file(path: &Path) -> Result<FleetFile> {
    println!("Loading fleet from '{}'...", path.display());

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read fleet file: {}", path.display()))?;
    let fleet: FleetFile = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse YAML from {}", path.display()))?;
    validate(&fleet).with_context(|| format!("Invalid fleet file: {}", path.display()))?;

    println!("Fleet loaded: {} reactor(s), {} scheduled command(s).", fleet.reactors.len(), fleet.scenario.len());
    Ok(fleet)
}

/// Catches file-level mistakes that the simulator itself cannot see, such as
/// scenario commands aimed at reactors the file never defines.
pub fn validate(fleet: &FleetFile) -> Result<()> {
    let mut ids = HashSet::new();
    for reactor in &fleet.reactors {
        if reactor.id.trim().is_empty() {
            bail!("reactor '{}' has an empty id", reactor.name);
        }
        if !ids.insert(reactor.id.as_str()) {
            bail!("reactor id '{}' is defined more than once", reactor.id);
        }
    }
    for scheduled in &fleet.scenario {
        let reactor_id = scheduled.command.reactor_id();
        if !ids.contains(reactor_id) {
            bail!(
                "scenario command at refresh {} targets unknown reactor '{}'",
                scheduled.at_refresh,
                reactor_id
            );
        }
    }
    Ok(())
}

/// The four-reactor fleet used when no file is given.
pub fn demo_fleet() -> FleetFile {
    let reactor = |id: &str, name: &str, location: &str, seed: u64, uptime_hours: f64, batch_count: u32, config: ReactorConfig| {
        ReactorDefinition {
            id: id.to_string(),
            name: name.to_string(),
            location: location.to_string(),
            seed,
            uptime_hours,
            batch_count,
            config,
        }
    };

    FleetFile {
        simulation: SimulationSettings::default(),
        reactors: vec![
            reactor("ER-001", "Amylase Line A", "Building 1, Bay 2", 1001, 96.0, 12, ReactorConfig::default()),
            reactor(
                "ER-002",
                "Lipase Line B",
                "Building 1, Bay 4",
                2002,
                140.0,
                8,
                ReactorConfig {
                    target_temperature: 36.5,
                    target_ph: 7.3,
                    target_flow_rate: 160.0,
                    operating_mode: OperatingMode::FedBatch,
                    ..ReactorConfig::default()
                },
            ),
            reactor(
                "ER-003",
                "Protease Pilot",
                "Pilot Plant",
                3003,
                24.0,
                3,
                ReactorConfig {
                    target_temperature: 38.0,
                    target_flow_rate: 140.0,
                    operating_mode: OperatingMode::Batch,
                    ..ReactorConfig::default()
                },
            ),
            reactor(
                "ER-004",
                "Cellulase Line C",
                "Building 2, Bay 1",
                4004,
                60.0,
                21,
                ReactorConfig {
                    auto_optimize: true,
                    ..ReactorConfig::default()
                },
            ),
        ],
        scenario: vec![
            ScheduledCommand {
                at_refresh: 3,
                command: Command::StartOptimization {
                    reactor_id: "ER-001".to_string(),
                },
            },
            ScheduledCommand {
                at_refresh: 6,
                command: Command::ApplyOptimization {
                    reactor_id: "ER-001".to_string(),
                    changes: None,
                },
            },
            ScheduledCommand {
                at_refresh: 8,
                command: Command::StartOptimization {
                    reactor_id: "ER-004".to_string(),
                },
            },
            ScheduledCommand {
                at_refresh: 10,
                command: Command::AdjustParameter {
                    reactor_id: "ER-003".to_string(),
                    parameter: "pH".to_string(),
                    value: 7.35,
                },
            },
        ],
    }
}
