use anyhow::{bail, Context, Result};
use clap::Parser;
use motsync::config::PlaybackSettings;
use motsync::core::ConnectionConfig;
use motsync::input::load_file;
use motsync::playback::{PlaybackEngine, PlaybackEvent, PlaybackMode, SystemClock, MAX_SLOTS};
use motsync::stream::{MockTransport, StreamManager};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Headless synchronized replay of MOT logs
#[derive(Debug, Parser)]
#[command(name = "motsync", version, about)]
struct Cli {
    /// Log or session files, one slot each (at most four)
    files: Vec<PathBuf>,

    /// Playback speed multiplier
    #[arg(long, short)]
    speed: Option<f64>,

    /// Settings file instead of the one in the user config dir
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Ticks per second
    #[arg(long)]
    hz: Option<u32>,

    /// Feed this log through a simulated stream into the next free slot
    #[arg(long = "simulate-live")]
    simulate_live: Option<PathBuf>,
}

fn slot_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut settings = match &cli.settings {
        Some(path) => PlaybackSettings::load_from(path)?,
        None => PlaybackSettings::load(),
    };
    if let Some(hz) = cli.hz.filter(|hz| *hz > 0) {
        settings.tick_rate_hz = hz;
    }

    let slot_count = cli.files.len() + usize::from(cli.simulate_live.is_some());
    if slot_count == 0 {
        bail!("Nothing to play: pass at least one file");
    }
    if slot_count > MAX_SLOTS {
        bail!("At most {} slots are available, got {}", MAX_SLOTS, slot_count);
    }

    let tick_rate = settings.tick_rate_hz;
    let mut engine = PlaybackEngine::with_settings(Arc::new(SystemClock::new()), settings);

    for (slot, path) in cli.files.iter().enumerate() {
        let sequence = load_file(path)?;
        engine.occupy_slot(slot, &slot_name(path), sequence)?;
    }

    let mut manager = StreamManager::new();
    let mut live_slot = None;
    if let Some(path) = &cli.simulate_live {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let mut transport = MockTransport::new("simulated");
        transport.inject_payloads(content.lines().filter(|line| !line.trim().is_empty()));
        transport.set_close_when_drained(true);

        let handle = engine.new_live_handle();
        let slot = cli.files.len();
        engine.occupy_live_slot(slot, &slot_name(path), handle.clone())?;
        live_slot = Some(slot);
        manager
            .connect(Box::new(transport), &ConnectionConfig::default(), handle)
            .await?;
    }

    if let Some(speed) = cli.speed {
        engine.set_speed(speed);
    }

    let events = engine.subscribe();
    engine.play();
    info!(
        "Playing {} frames at {}x ({} slots)",
        engine.max_length(),
        engine.speed(),
        slot_count
    );

    let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / f64::from(tick_rate)));
    let mut ticks: u64 = 0;
    let mut tail_replayed = false;
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }

        // the engine only leaves live mode when told the stream is gone
        if let Some(slot) = live_slot.filter(|_| !manager.is_running()) {
            info!("Simulated stream finished");
            engine.disconnect_slot(slot);
            live_slot = None;
        }

        let index = engine.tick();
        ticks += 1;

        for event in events.try_iter() {
            match event {
                PlaybackEvent::GapSkipped { duration } => info!("Gap of {:.1}s skipped at frame {}", duration, index),
                PlaybackEvent::ReachedEnd => info!("Reached end of playback"),
                PlaybackEvent::EnteredLive { slot } => info!("Following live slot {}", slot),
                PlaybackEvent::ModeChanged { .. } => {}
            }
        }

        if ticks % u64::from(tick_rate) == 0 {
            let timestamp = engine
                .anchor_slot()
                .and_then(|slot| engine.current_frame(slot))
                .map(|frame| frame.formatted_time())
                .unwrap_or_default();
            info!(
                "Frame {}/{} ({:.0}%) {}",
                index + 1,
                engine.max_length(),
                engine.progress() * 100.0,
                timestamp
            );
        }

        if engine.mode() == PlaybackMode::Paused && !engine.slots().has_streaming() {
            // a finished stream leaves its buffer behind as a static tail
            if cli.simulate_live.is_some() && !tail_replayed {
                tail_replayed = true;
                if engine.play() {
                    info!("Stream ended, replaying {} buffered frames", engine.max_length());
                    continue;
                }
            }
            break;
        }
    }

    manager.disconnect().await;
    for (slot, error) in engine.slots().occupied().filter_map(|(i, slot)| slot.stream_error().map(|e| (i, e))) {
        warn!("Slot {} stream error: {}", slot, error);
    }
    Ok(())
}
