//! Locomotor CLI - write a default config and run headless simulations

use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use locomotor::config::SimulationConfig;
use locomotor::game::{
    AgentAction, AgentInputProvider, CharacterId, DeviceInputProvider, DeviceState, Simulation,
    TriggerPhase,
};

/// Spawn point of the demo arena
const SPAWN: [f32; 3] = [0.0, 1.5, 0.0];
/// Ticks between wander decisions
const DECISION_INTERVAL: u64 = 25;

#[derive(Parser)]
#[command(name = "locomotor")]
#[command(about = "Physics character controller sandbox", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a locomotor.toml with every default spelled out
    Init {
        /// Output path
        #[arg(default_value = "locomotor.toml")]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Run the demo arena headless and print one JSON observation per tick
    Run {
        /// Config file (defaults are used when omitted)
        #[arg(short, long, env = "LOCOMOTOR_CONFIG")]
        config: Option<PathBuf>,
        /// Number of fixed ticks to simulate
        #[arg(short, long, default_value = "500")]
        ticks: u64,
        /// Autonomous policy driving the character
        #[arg(long, value_enum, default_value = "wander")]
        policy: Policy,
        /// Replay recorded device frames (JSON lines of DeviceState) instead of a policy
        #[arg(long, conflicts_with = "policy")]
        replay: Option<PathBuf>,
        /// Seed for the wander policy
        #[arg(long, default_value = "0")]
        seed: u64,
        /// Debug-level logging on stderr
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Policy {
    Idle,
    Wander,
}

/// Where a run's input comes from
enum Driver {
    Agent {
        provider: AgentInputProvider,
        policy: Policy,
        rng: StdRng,
    },
    Replay {
        provider: DeviceInputProvider,
        frames: Vec<DeviceState>,
    },
}

impl Driver {
    /// Feeds the input for `tick`. Returns false when a replay has run out of frames.
    fn feed(&mut self, tick: u64) -> bool {
        match self {
            Driver::Agent {
                provider,
                policy,
                rng,
            } => {
                if tick % DECISION_INTERVAL == 0 {
                    provider.set_action(decide(*policy, rng));
                }
                true
            }
            Driver::Replay { provider, frames } => match frames.get(tick as usize) {
                Some(frame) => {
                    provider.poll(frame);
                    true
                }
                None => false,
            },
        }
    }
}

fn decide(policy: Policy, rng: &mut StdRng) -> AgentAction {
    match policy {
        Policy::Idle => AgentAction::default(),
        Policy::Wander => AgentAction {
            movement: [rng.gen_range(-1.0..=1.0), rng.gen_range(0.0..=1.0)],
            rotation: rng.gen_range(-0.5..=0.5),
            jump: rng.gen_bool(0.2),
            sprint: rng.gen_bool(0.3),
            dash: rng.gen_bool(0.1),
            dive: rng.gen_bool(0.05),
        },
    }
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { path, force } => init_config(&path, force),
        Commands::Run {
            config,
            ticks,
            policy,
            replay,
            seed,
            verbose,
        } => {
            init_tracing(verbose);
            run_simulation(config.as_deref(), ticks, policy, replay.as_deref(), seed)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn init_config(path: &Path, force: bool) -> Result<(), String> {
    if path.exists() && !force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }

    let rendered = SimulationConfig::default()
        .to_toml_string()
        .map_err(|e| e.to_string())?;
    let content = format!("# Locomotor simulation configuration\n\n{}", rendered);
    std::fs::write(path, content)
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;

    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn load_replay(path: &Path) -> Result<Vec<DeviceState>, String> {
    let file = std::fs::File::open(path)
        .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;

    let mut frames = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: DeviceState = serde_json::from_str(&line)
            .map_err(|e| format!("{}:{}: {}", path.display(), index + 1, e))?;
        frames.push(frame);
    }
    Ok(frames)
}

/// Floor, a goal flag ahead of the spawn and a kill volume below the floor.
fn build_arena(sim: &mut Simulation) {
    sim.add_floor(0.0, 25.0);
    sim.add_static_box([6.0, 0.25, 8.0], [1.5, 0.25, 1.5]);
    sim.add_trigger("Flag", [0.0, 1.0, 18.0], [1.0, 1.0, 1.0]);
    sim.add_trigger("Void", [0.0, -10.0, 0.0], [200.0, 2.0, 200.0]);
}

fn run_simulation(
    config_path: Option<&Path>,
    ticks: u64,
    policy: Policy,
    replay: Option<&Path>,
    seed: u64,
) -> Result<(), String> {
    let config = match config_path {
        Some(path) => SimulationConfig::from_file(path).map_err(|e| e.to_string())?,
        None => SimulationConfig::default(),
    };
    let timestep = config.physics.timestep;

    let mut sim = Simulation::new(config).map_err(|e| e.to_string())?;
    build_arena(&mut sim);

    let mut driver = match replay {
        Some(path) => Driver::Replay {
            provider: DeviceInputProvider::new(),
            frames: load_replay(path)?,
        },
        None => Driver::Agent {
            provider: AgentInputProvider::new(),
            policy,
            rng: StdRng::seed_from_u64(seed),
        },
    };

    let character = match &driver {
        Driver::Agent { provider, .. } => sim.spawn_character(Arc::new(provider.clone()), SPAWN),
        Driver::Replay { provider, .. } => sim.spawn_character(Arc::new(provider.clone()), SPAWN),
    }
    .map_err(|e| e.to_string())?;

    let stamina_updates = sim
        .stamina(character)
        .map_err(|e| e.to_string())?
        .write()
        .subscribe();

    tracing::info!(%character, ticks, seed, "simulation started");

    let mut episodes = 0u32;
    for tick in 0..ticks {
        if !driver.feed(tick) {
            tracing::info!(tick, "replay exhausted");
            break;
        }

        let events = sim.advance(timestep);

        if let Some(change) = stamina_updates.try_iter().last() {
            tracing::debug!(current = change.current, max = change.max, "stamina changed");
        }

        let observation = sim.observe(character).map_err(|e| e.to_string())?;
        let line = json!({
            "tick": sim.tick_count(),
            "episode": episodes,
            "observation": observation,
            "outcome": sim.last_outcome(character),
            "events": events,
        });
        println!("{}", line);

        if end_of_episode(&events, character) {
            episodes += 1;
            sim.reset_character(character, SPAWN)
                .map_err(|e| e.to_string())?;
        }
    }

    tracing::info!(ticks = sim.tick_count(), episodes, "simulation finished");
    Ok(())
}

fn end_of_episode(events: &[locomotor::game::TriggerEvent], character: CharacterId) -> bool {
    events.iter().any(|event| {
        event.character == character
            && event.phase == TriggerPhase::Entered
            && match event.zone.as_str() {
                "Flag" => {
                    tracing::info!("flag reached");
                    true
                }
                "Void" => {
                    tracing::info!("fell into the void");
                    true
                }
                other => {
                    tracing::debug!(zone = other, "entered zone without episode rule");
                    false
                }
            }
    })
}
