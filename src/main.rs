//! VoiceStudio CLI - inspect the runtime without loading any model
//!
//! Subcommands:
//! - `status`: current process/accelerator memory and pressure level
//! - `models`: model variants, their directories and install state
//! - `voices`: manage saved voice profiles

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use voice_studio::{
    CandleAccelerator, MemorySampler, ModelHub, ModelVariant, ProcSampler, ProfileKind,
    StudioConfig, VoiceLibrary, VERSION,
};
use std::sync::Arc;

/// VoiceStudio - memory-managed front-end runtime for Qwen3-TTS
#[derive(Parser, Debug)]
#[command(name = "voice-studio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show current memory usage and pressure level
    Status {
        /// Emit the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// List model variants and whether they are installed
    Models,
    /// Manage saved voice profiles
    Voices {
        #[command(subcommand)]
        action: VoicesAction,
    },
}

#[derive(Subcommand, Debug)]
enum VoicesAction {
    /// List saved voices, newest first
    List,
    /// Show one saved voice in detail
    Show { id: String },
    /// Delete a saved voice
    Delete { id: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to initialize logging")?;

    let config = match &cli.config {
        Some(path) => StudioConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => StudioConfig::default(),
    };

    match cli.command {
        Commands::Status { json } => status(&config, json),
        Commands::Models => models(&config),
        Commands::Voices { action } => voices(&config, action),
    }
}

fn hub_for(config: &StudioConfig) -> ModelHub {
    match &config.model_root {
        Some(root) => ModelHub::new(root),
        None => ModelHub::from_env(),
    }
}

fn status(config: &StudioConfig, json: bool) -> Result<()> {
    let sampler = ProcSampler::new(Arc::new(CandleAccelerator::detect()));
    let snapshot = sampler.sample().context("sampling process memory")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let memory = &config.memory;
    println!("VoiceStudio {VERSION}");
    println!(
        "resident:  {:>8.2} GiB ({:.1}% of system)",
        snapshot.resident_gib(),
        snapshot.percent_of_system
    );
    println!("virtual:   {:>8.2} GiB", snapshot.virtual_gib());
    println!(
        "budget:    {:>8.2} GiB (warning {:.0}%, critical {:.0}%)",
        memory.max_memory_bytes as f64 / (1024.0 * 1024.0 * 1024.0),
        memory.thresholds.warning_fraction * 100.0,
        memory.thresholds.critical_fraction * 100.0
    );
    println!("pressure:  {}", memory.classify(snapshot.resident_bytes));

    if snapshot.devices.is_empty() {
        println!("devices:   none");
    } else {
        for (id, device) in &snapshot.devices {
            println!(
                "device {}: allocated {} B, reserved {} B, peak {} B",
                id, device.allocated_bytes, device.reserved_bytes, device.peak_allocated_bytes
            );
        }
    }
    Ok(())
}

fn models(config: &StudioConfig) -> Result<()> {
    let hub = hub_for(config);
    println!("model root: {}", hub.root().display());
    for variant in ModelVariant::all() {
        let state = if hub.is_installed(*variant) {
            "installed"
        } else {
            "missing"
        };
        println!(
            "  {:<12} {:<10} {}",
            variant.to_string(),
            state,
            hub.variant_dir(*variant).display()
        );
    }
    Ok(())
}

fn voices(config: &StudioConfig, action: VoicesAction) -> Result<()> {
    let hub = hub_for(config);
    let voices_dir = config
        .voices_dir
        .clone()
        .unwrap_or_else(|| hub.root().join("cloned_voices"));
    let library = VoiceLibrary::new(voices_dir).context("opening voice library")?;

    match action {
        VoicesAction::List => {
            let voices = library.list().context("listing saved voices")?;
            if voices.is_empty() {
                println!("no saved voices");
                return Ok(());
            }
            for voice in voices {
                let kind = match voice.profile.kind {
                    ProfileKind::Clone { .. } => "clone",
                    ProfileKind::Design { .. } => "design",
                };
                println!(
                    "  {:<40} {:<8} {}  created {}",
                    voice.id,
                    kind,
                    voice.profile.name,
                    voice.profile.created.format("%Y-%m-%d %H:%M:%S")
                );
            }
        }
        VoicesAction::Show { id } => {
            let voice = library.get(&id)?;
            println!("id:       {}", voice.id);
            println!("name:     {}", voice.profile.name);
            println!("created:  {}", voice.profile.created.format("%Y-%m-%d %H:%M:%S"));
            println!("audio:    {}", voice.audio_path().display());
            match &voice.profile.kind {
                ProfileKind::Clone { ref_text } => {
                    println!("kind:     clone");
                    println!("ref text: {}", ref_text);
                }
                ProfileKind::Design {
                    design_instruct,
                    target_text,
                } => {
                    println!("kind:     design");
                    println!("design:   {}", design_instruct);
                    println!("text:     {}", target_text);
                }
            }
        }
        VoicesAction::Delete { id } => {
            if library.delete(&id)? {
                println!("deleted {}", id);
            } else {
                println!("no saved voice with id '{}'", id);
            }
        }
    }
    Ok(())
}
