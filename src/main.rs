//! Music terrain - a wireframe landscape that breathes with the music
//!
//! Spectrum energy scrolls across the grid as a rolling ridge while a noise
//! field keeps the ground moving when the music is quiet.

use anyhow::{Context, Result};
use clap::Parser;
use std::thread;
use std::time::{Duration, Instant};

use music_terrain::audio::{AudioEngine, AudioLoader, CpalBackend, HeadlessBackend, OutputBackend};
use music_terrain::cli::Args;
use music_terrain::noise::NoiseGenerator;
use music_terrain::params::VisualizerConfig;
use music_terrain::snapshot::write_snapshot;
use music_terrain::terrain::TerrainSystem;

/// Main application state
struct App {
    terrain: TerrainSystem,
    audio: AudioEngine,
    loader: AudioLoader,

    // Frame statistics
    frames: u64,
    uploads: u64,
    last_report: f32,
}

impl App {
    fn new(config: VisualizerConfig, backend: Box<dyn OutputBackend>) -> Self {
        let noise = NoiseGenerator::from_config(&config.noise);
        log::info!(
            "Terrain: {} segments over {}x{}, noise {:?} (seed {})",
            config.terrain.segments,
            config.terrain.width,
            config.terrain.depth,
            noise.kind(),
            noise.seed()
        );

        Self {
            terrain: TerrainSystem::new(config.terrain, Box::new(noise)),
            audio: AudioEngine::new(backend),
            loader: AudioLoader::new(),
            frames: 0,
            uploads: 0,
            last_report: 0.0,
        }
    }

    /// Advance a single frame
    fn update_frame(&mut self, time_s: f32, delta_time: f32) {
        // Finished loads replace the current session; failures keep it
        if let Some(result) = self.loader.poll() {
            if let Err(e) = result.and_then(|decoded| self.audio.install(decoded)) {
                log::error!("Audio setup failed: {}", e);
            }
        }

        self.audio.tick(delta_time);
        let snapshot = self.audio.get_audio_data();
        self.terrain.update_terrain(snapshot, delta_time);

        // Stand-in for the GPU upload a render driver would do here
        if self.terrain.grid.take_dirty() {
            self.uploads += 1;
        }
        self.frames += 1;

        if time_s - self.last_report >= 1.0 {
            self.last_report = time_s;
            self.report(time_s);
        }
    }

    fn report(&self, time_s: f32) {
        let (low, high) = self.terrain.grid.height_range();
        let source = self
            .audio
            .session()
            .map(|s| s.label().to_string())
            .unwrap_or_else(|| "silence".to_string());
        log::info!(
            "t={:5.1}s frames={} heights {:7.2}..{:7.2} audio: {}",
            time_s,
            self.frames,
            low,
            high,
            source
        );
    }
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();
    let config = args.build_config().context("Failed to load configuration")?;

    let backend: Box<dyn OutputBackend> = if args.headless {
        Box::new(HeadlessBackend::default())
    } else {
        Box::new(CpalBackend)
    };

    let mut app = App::new(config, backend);

    match args.audio_source() {
        Some(source) => app
            .loader
            .request(source)
            .context("Failed to start audio load")?,
        None => log::info!("No audio selected, terrain runs on noise alone"),
    }

    // Without a device clock the loop would outrun the load; settle it first
    if args.headless {
        if let Some(result) = app.loader.wait() {
            if let Err(e) = result.and_then(|decoded| app.audio.install(decoded)) {
                log::error!("Audio setup failed: {}", e);
            }
        }
    }

    let frame_time = args.frame_time();
    let total_frames = args.total_frames();
    let start_time = Instant::now();
    let mut last_frame = start_time;

    for frame in 0..total_frames {
        // Headless runs advance on the fixed frame clock as fast as possible
        let (time_s, delta_time) = if args.headless {
            ((frame + 1) as f32 * frame_time, frame_time)
        } else {
            let now = Instant::now();
            let dt = now.duration_since(last_frame).as_secs_f32();
            last_frame = now;
            (now.duration_since(start_time).as_secs_f32(), dt)
        };

        app.update_frame(time_s, delta_time);

        if !args.headless {
            let target = Duration::from_secs_f32(frame_time);
            let spent = last_frame.elapsed();
            if spent < target {
                thread::sleep(target - spent);
            }
        }
    }

    log::info!(
        "Done: {} frames, {} buffer uploads in {:.2}s",
        app.frames,
        app.uploads,
        start_time.elapsed().as_secs_f32()
    );

    if let Some(path) = &args.snapshot {
        write_snapshot(&app.terrain.grid, path, args.snapshot_scale)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        log::info!("Wrote snapshot {}", path.display());
    }

    app.audio.stop();
    Ok(())
}
