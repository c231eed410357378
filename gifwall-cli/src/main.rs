//! gifwall CLI - probe, extract, and play GIF animations.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use console::style;
use gifwall_codec::{Disposal, GifDecoder, GifHeader, HeaderParser, LoopCount};
use gifwall_core::{PixelBuffer, SharedPools, Status};
use gifwall_render::AnimationDriver;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Command-line arguments for the gifwall tool.
#[derive(Parser, Debug)]
#[command(name = "gifwall")]
#[command(version)]
#[command(about = "Probe, extract, and play animated GIFs")]
struct Args {
    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the parsed header and frame index
    Info {
        /// GIF file to probe
        file: PathBuf,

        /// Emit JSON for programmatic parsing
        #[arg(long)]
        json: bool,
    },
    /// Decode every frame to a PPM image
    Frames {
        /// GIF file to decode
        file: PathBuf,

        /// Directory the PPM files are written to
        #[arg(short, long, default_value = "frames")]
        out_dir: PathBuf,
    },
    /// Run the animation driver headless and report frame timing
    Play {
        /// GIF file to play
        file: PathBuf,

        /// Number of times to play the sequence (default: what the
        /// stream declares; 0 means forever)
        #[arg(long)]
        loops: Option<u32>,
    },
}

/// Header summary in JSON output.
#[derive(Debug, Serialize)]
struct HeaderInfo {
    width: u16,
    height: u16,
    frame_count: usize,
    loop_count: Option<u16>,
    total_iterations: Option<u32>,
    background_color: String,
    has_global_color_table: bool,
    status: String,
    frames: Vec<FrameInfo>,
}

/// Per-frame summary in JSON output.
#[derive(Debug, Serialize)]
struct FrameInfo {
    index: usize,
    x: u16,
    y: u16,
    width: u16,
    height: u16,
    delay_ms: u32,
    disposal: &'static str,
    interlaced: bool,
    transparency: bool,
    has_local_color_table: bool,
}

impl HeaderInfo {
    fn from_header(header: &GifHeader) -> Self {
        Self {
            width: header.width,
            height: header.height,
            frame_count: header.frame_count(),
            loop_count: match header.loop_count {
                LoopCount::Missing => None,
                LoopCount::Forever => Some(0),
                LoopCount::Count(n) => Some(n),
            },
            total_iterations: header.loop_count.total_iterations(),
            background_color: format!("#{:08X}", header.background_color),
            has_global_color_table: header.global_color_table.is_some(),
            status: status_name(header.status).to_string(),
            frames: header
                .frames
                .iter()
                .enumerate()
                .map(|(index, frame)| FrameInfo {
                    index,
                    x: frame.x,
                    y: frame.y,
                    width: frame.width,
                    height: frame.height,
                    delay_ms: frame.delay_ms,
                    disposal: disposal_name(frame.disposal),
                    interlaced: frame.interlaced,
                    transparency: frame.transparency,
                    has_local_color_table: frame.local_color_table.is_some(),
                })
                .collect(),
        }
    }
}

fn status_name(status: Status) -> &'static str {
    match status {
        Status::Ok => "ok",
        Status::FormatError => "format_error",
        Status::OpenError => "open_error",
        Status::PartialDecode => "partial_decode",
    }
}

fn disposal_name(disposal: Disposal) -> &'static str {
    match disposal {
        Disposal::None => "none",
        Disposal::Background => "background",
        Disposal::Previous => "previous",
    }
}

/// Encode a raster as a binary PPM (P6), dropping alpha.
fn encode_ppm(frame: &PixelBuffer) -> Vec<u8> {
    let mut out = format!("P6\n{} {}\n255\n", frame.width(), frame.height()).into_bytes();
    out.reserve(frame.pixels().len() * 3);
    for &argb in frame.pixels() {
        out.push((argb >> 16) as u8);
        out.push((argb >> 8) as u8);
        out.push(argb as u8);
    }
    out
}

/// How many sequence plays a `--loops` override resolves to.
fn resolve_plays(requested: Option<u32>, declared: Option<u32>) -> Option<u32> {
    match requested {
        Some(0) => None,
        Some(n) => Some(n),
        None => declared,
    }
}

fn read_gif(path: &Path) -> anyhow::Result<Vec<u8>> {
    let data =
        fs::read(path).with_context(|| format!("cannot open {}", path.display()))?;
    if !gifwall_codec::is_gif(&data) {
        bail!("{} is not a GIF file", path.display());
    }
    Ok(data)
}

fn run_info(file: &Path, json: bool) -> anyhow::Result<()> {
    let data = read_gif(file)?;
    let header = HeaderParser::new(&data).parse();
    let summary = HeaderInfo::from_header(&header);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", style(file.display()).cyan().bold());
    println!("  Size:          {}x{}", summary.width, summary.height);
    println!("  Frames:        {}", summary.frame_count);
    println!(
        "  Loop count:    {}",
        match header.loop_count {
            LoopCount::Missing => "not declared (plays once)".to_string(),
            LoopCount::Forever => "forever".to_string(),
            LoopCount::Count(n) => format!("{} ({} plays)", n, u32::from(n) + 1),
        }
    );
    println!("  Background:    {}", summary.background_color);
    println!(
        "  Status:        {}",
        if header.status.is_ok() {
            style(summary.status.as_str()).green()
        } else {
            style(summary.status.as_str()).red()
        }
    );
    for frame in &summary.frames {
        println!(
            "  Frame {:>3}:     {}x{} at ({}, {}), {} ms, disposal {}{}{}",
            frame.index,
            frame.width,
            frame.height,
            frame.x,
            frame.y,
            frame.delay_ms,
            frame.disposal,
            if frame.transparency {
                ", transparent"
            } else {
                ""
            },
            if frame.interlaced { ", interlaced" } else { "" },
        );
    }
    Ok(())
}

fn run_frames(file: &Path, out_dir: &Path) -> anyhow::Result<()> {
    let data = read_gif(file)?;
    let mut decoder = GifDecoder::new(SharedPools::new());
    let status = decoder.read(data);
    if status.is_error() {
        bail!("cannot decode {}: {}", file.display(), status_name(status));
    }

    fs::create_dir_all(out_dir)
        .with_context(|| format!("cannot create {}", out_dir.display()))?;

    let count = decoder.frame_count();
    for index in 0..count {
        decoder.advance();
        let Some(frame) = decoder.next_frame() else {
            bail!("frame {index} failed to decode");
        };
        if decoder.status() == Status::PartialDecode {
            debug!(index, "partial frame");
        }
        let path = out_dir.join(format!("frame_{index:03}.ppm"));
        fs::write(&path, encode_ppm(&frame))
            .with_context(|| format!("cannot write {}", path.display()))?;
        decoder.pools().release_frame(frame);
    }

    println!(
        "{} {} frames written to {}",
        style("Done:").green().bold(),
        count,
        out_dir.display()
    );
    Ok(())
}

fn run_play(file: &Path, loops: Option<u32>) -> anyhow::Result<()> {
    let data = read_gif(file)?;
    let mut decoder = GifDecoder::new(SharedPools::new());
    let status = decoder.read(data);
    if status.is_error() {
        bail!("cannot decode {}: {}", file.display(), status_name(status));
    }

    let mut driver = AnimationDriver::new(decoder);
    let frame_count = driver.frame_count() as u64;
    if frame_count < 2 {
        println!("static image, nothing to play");
        return Ok(());
    }

    let plays = resolve_plays(loops, driver.total_iteration_count());
    let target_swaps = plays.map(|p| u64::from(p) * frame_count);
    info!(frame_count, ?plays, "starting playback");

    let mut sub = driver.frames().subscribe();
    // Consume the primed first frame.
    sub.try_changed();

    driver.start();
    let started = Instant::now();
    let mut swaps = 0u64;
    let mut last_swap = started;

    loop {
        if let Some(target) = target_swaps {
            if swaps >= target {
                break;
            }
        }
        match sub.wait_for_change_timeout(Duration::from_secs(5)) {
            Some(_) => {
                let now = Instant::now();
                swaps += 1;
                println!(
                    "frame {:>4}  +{:>4} ms",
                    swaps % frame_count,
                    now.duration_since(last_swap).as_millis()
                );
                last_swap = now;
            }
            None => {
                driver.stop();
                bail!("animation stalled: {}", status_name(driver.status()));
            }
        }
    }

    driver.stop();
    println!(
        "{} {} frames in {:.2}s",
        style("Played:").green().bold(),
        swaps,
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match &args.command {
        Command::Info { file, json } => run_info(file, *json),
        Command::Frames { file, out_dir } => run_frames(file, out_dir),
        Command::Play { file, loops } => run_play(file, *loops),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_ppm() {
        let mut frame = PixelBuffer::new(2, 1);
        frame.pixels_mut().copy_from_slice(&[0xFFFF0000, 0xFF0000FF]);
        let ppm = encode_ppm(&frame);
        assert!(ppm.starts_with(b"P6\n2 1\n255\n"));
        assert_eq!(&ppm[ppm.len() - 6..], &[0xFF, 0, 0, 0, 0, 0xFF]);
    }

    #[test]
    fn test_resolve_plays() {
        // Explicit zero plays forever.
        assert_eq!(resolve_plays(Some(0), Some(3)), None);
        // Explicit count wins over the stream's declaration.
        assert_eq!(resolve_plays(Some(2), Some(6)), Some(2));
        // No override: the stream decides.
        assert_eq!(resolve_plays(None, Some(6)), Some(6));
        assert_eq!(resolve_plays(None, None), None);
    }

    #[test]
    fn test_status_and_disposal_names() {
        assert_eq!(status_name(Status::Ok), "ok");
        assert_eq!(status_name(Status::FormatError), "format_error");
        assert_eq!(disposal_name(Disposal::Previous), "previous");
    }

    #[test]
    fn test_header_info_loop_count_mapping() {
        let mut header = GifHeader {
            loop_count: LoopCount::Forever,
            ..GifHeader::default()
        };
        let info = HeaderInfo::from_header(&header);
        assert_eq!(info.loop_count, Some(0));
        assert_eq!(info.total_iterations, None);

        header.loop_count = LoopCount::Missing;
        let info = HeaderInfo::from_header(&header);
        assert_eq!(info.loop_count, None);
        assert_eq!(info.total_iterations, Some(1));
    }
}
