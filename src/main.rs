mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;

use cli::Cli;
use isoviz::audio::source::PcmSource;
use isoviz::config::{self, Config};
use isoviz::encode::ffmpeg::FfmpegEncoder;
use isoviz::pipeline::Visualizer;
use isoviz::render::canvas::Canvas;
use isoviz::render::text::TextOverlay;
use isoviz::render::waterfall::Rgb;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let mut cfg = match find_config(&cli) {
        Some(path) => match config::load_config(&path) {
            Some(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            None => {
                log::warn!("Failed to load config from {}, using defaults", path.display());
                Config::default()
            }
        },
        None => Config::default(),
    };
    cli.apply_to(&mut cfg);
    cfg.validate().context("Invalid configuration")?;

    if cli.print_config {
        print!("{}", toml::to_string_pretty(&cfg).context("Failed to serialize config")?);
        return Ok(());
    }

    let (width, height) = (cfg.display.width, cfg.display.height);
    log::info!("isoviz - isometric spectrum waterfall");
    log::info!(
        "Input: {}",
        cli.input_path().map_or_else(|| "<stdin>".to_string(), |p| p.display().to_string())
    );
    log::info!("Output: {}", cli.output.display());
    log::info!(
        "Audio: {} Hz, {} channel(s), {:?} {:?}, {} samples per frame",
        cfg.audio.sample_rate, cfg.audio.channels, cfg.audio.format, cfg.audio.layout, cfg.audio.chunk_size
    );
    log::info!(
        "Resolution: {}x{} @ {} fps, {} bands, {} slices",
        width, height, cfg.frame_rate(), cfg.analysis.num_bands, cfg.display.history_length
    );

    let (reader, input_len): (Box<dyn Read>, Option<u64>) = match cli.input_path() {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open audio input: {}", path.display()))?;
            let len = file.metadata().ok().map(|m| m.len());
            (Box::new(BufReader::new(file)), len)
        }
        None => (Box::new(std::io::stdin().lock()), None),
    };
    let mut source = PcmSource::new(reader, &cfg.audio);

    let mut total_frames = input_len.map(|len| len.div_ceil(source.frame_bytes() as u64));
    if let Some(max) = cli.max_frames {
        total_frames = Some(total_frames.map_or(max, |t| t.min(max)));
    }

    let overlay = load_overlay(&cli, height);

    let mut viz = Visualizer::new(&cfg);
    let mut canvas = Canvas::new(width, height);
    let background = Rgb::from(cfg.display.background_color);
    let status_color = Rgb::from(cfg.display.status_color);

    let mut encoder = FfmpegEncoder::new(
        &cli.output,
        canvas.width(),
        canvas.height(),
        &cfg.frame_rate(),
        &cfg.output,
    )?;

    let pb = match total_frames {
        Some(total) => {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")
                    .context("Invalid progress template")?
                    .progress_chars("=>-"),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("[{elapsed_precise}] {spinner} {pos} frames")
                    .context("Invalid progress template")?,
            );
            pb
        }
    };

    while let Some(frame) = source.next_frame().context("Failed to read audio frame")? {
        let commands = viz.tick(Some(&frame));

        canvas.clear(background);
        canvas.draw_all(&commands);

        if let Some(ref overlay) = overlay {
            let history = viz.history();
            let margin = 10;
            let buffer = format!("Buffer: {}/{}", history.len(), history.capacity());
            overlay.composite(&mut canvas, &buffer, margin, margin, status_color);
            let counter = format!("Frame: {}", source.frames_read());
            overlay.composite(&mut canvas, &counter, margin, margin + overlay.line_height(), status_color);
        }

        if let Err(err) = encoder.write_frame(canvas.pixels()) {
            pb.abandon();
            return Err(encoder.abort(err));
        }
        pb.inc(1);

        if cli.max_frames.is_some_and(|max| source.frames_read() >= max) {
            log::info!("Reached --max-frames limit");
            break;
        }
    }

    pb.finish_with_message("Rendering complete");
    log::info!("Rendered {} frames", source.frames_read());

    log::info!("Finishing encoding...");
    encoder.finish()?;

    log::info!("Done! Output: {}", cli.output.display());
    Ok(())
}

/// Explicit --config path, or auto-detect isoviz.toml / user config.
fn find_config(cli: &Cli) -> Option<PathBuf> {
    if let Some(ref path) = cli.config {
        return Some(path.clone());
    }
    let local = PathBuf::from("isoviz.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("isoviz").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("isoviz").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

fn load_overlay(cli: &Cli, height: u32) -> Option<TextOverlay> {
    if !cli.show_status {
        return None;
    }
    let Some(ref font) = cli.font else {
        log::warn!("--show-status needs --font; status overlay disabled");
        return None;
    };
    let font_size = (height as f32 * 0.033).max(14.0);
    match TextOverlay::from_file(font, font_size) {
        Ok(overlay) => Some(overlay),
        Err(err) => {
            log::warn!("Status overlay disabled: {}", err);
            None
        }
    }
}
