use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rayon::prelude::*;

use std::path::{Path, PathBuf};

use stillframe::{
    CompressedImageBuffer, DecodedImage, DecoderConfig, ImageOrientationDecoder, MirroredPolicy,
};

#[derive(Parser)]
#[command(name = "stillframe-cli")]
#[command(about = "Decode still images and correct them for their EXIF orientation", long_about = None)]
#[command(version)]
struct Args {
    /// Input images (JPEG, PNG, WebP, TIFF, ...)
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Write each oriented image as PNG into this directory
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Presentation timestamp attached to every input, in microseconds
    #[arg(
        short,
        long,
        value_name = "US",
        default_value_t = 0,
        allow_hyphen_values = true
    )]
    timestamp_us: i64,

    /// Decoder config file (JSON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// How to treat mirrored orientation tags
    #[arg(long, value_enum)]
    mirrored: Option<MirroredArg>,

    /// Keep pixels in stored order, ignoring the orientation tag
    #[arg(long, default_value_t)]
    no_orientation: bool,

    /// Reject images wider than this
    #[arg(long, value_name = "PIXELS")]
    max_width: Option<u32>,

    /// Reject images taller than this
    #[arg(long, value_name = "PIXELS")]
    max_height: Option<u32>,

    /// Decoder allocation budget in bytes
    #[arg(long, value_name = "BYTES")]
    max_alloc: Option<u64>,

    /// Verbose output
    #[arg(short, long, default_value_t)]
    verbose: bool,

    /// Quiet mode (minimal output)
    #[arg(short, long, default_value_t)]
    quiet: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum MirroredArg {
    Ignore,
    RotationOnly,
    Apply,
}

impl From<MirroredArg> for MirroredPolicy {
    fn from(arg: MirroredArg) -> Self {
        match arg {
            MirroredArg::Ignore => MirroredPolicy::Ignore,
            MirroredArg::RotationOnly => MirroredPolicy::RotationOnly,
            MirroredArg::Apply => MirroredPolicy::Apply,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose, args.quiet);

    let config = build_config(&args)?;
    log::debug!("Decoder config: {config:?}");

    if let Some(dir) = &args.output_dir {
        if !dir.exists() {
            std::fs::create_dir_all(dir).context("Failed to create output directory")?;
        }
    }

    // One decoder per worker: an instance only handles one buffer at a time
    let results: Vec<(&PathBuf, Result<()>)> = args
        .inputs
        .par_iter()
        .map_init(
            || ImageOrientationDecoder::with_config(config.clone()),
            |decoder, input| {
                let result = process(decoder, input, args.timestamp_us, args.output_dir.as_deref());
                (input, result)
            },
        )
        .collect();

    let mut failed = 0;
    for (input, result) in &results {
        if let Err(e) = result {
            failed += 1;
            log::error!("{}: {e:#}", input.display());
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} images failed to decode", results.len());
    }

    Ok(())
}

fn process(
    decoder: &ImageOrientationDecoder,
    input: &Path,
    timestamp_us: i64,
    output_dir: Option<&Path>,
) -> Result<()> {
    let data = std::fs::read(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let image = decoder
        .decode(CompressedImageBuffer::new(data, timestamp_us))
        .context("Failed to decode image")?;

    report(input, &image);

    if let Some(dir) = output_dir {
        let output = output_path(dir, input);
        image
            .into_image()
            .save(&output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        log::debug!("Wrote {}", output.display());
    }

    Ok(())
}

fn report(input: &Path, image: &DecodedImage) {
    let applied = image.applied_transform();
    let rotation: &'static str = applied.rotation.into();
    log::info!(
        "{}: {}x{} {:?}, {rotation}{}, t={}us",
        input.display(),
        image.width(),
        image.height(),
        image.color_type(),
        if applied.flip_horizontal { " + flip" } else { "" },
        image.timestamp_us(),
    );
}

fn output_path(dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    dir.join(format!("{stem}.oriented.png"))
}

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn load_config(path: &Path) -> Result<DecoderConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid config {}", path.display()))
}

fn build_config(args: &Args) -> Result<DecoderConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => DecoderConfig::default(),
    };

    // Flags win over the config file
    if let Some(mirrored) = args.mirrored {
        config.mirrored = mirrored.into();
    }
    if args.no_orientation {
        config.apply_orientation = false;
    }
    if args.max_width.is_some() {
        config.limits.max_width = args.max_width;
    }
    if args.max_height.is_some() {
        config.limits.max_height = args.max_height;
    }
    if args.max_alloc.is_some() {
        config.limits.max_alloc = args.max_alloc;
    }

    if config.limits.max_width == Some(0) || config.limits.max_height == Some(0) {
        anyhow::bail!("Size limits must be greater than 0");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["stillframe-cli"];
        argv.extend_from_slice(extra);
        argv.push("in.jpg");
        Args::parse_from(argv)
    }

    #[test]
    fn negative_timestamps_parse() {
        assert_eq!(args(&["-t", "-250"]).timestamp_us, -250);
    }

    #[test]
    fn flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"apply_orientation": true, "mirrored": "apply", "limits": {{"max_width": 100}}}}"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = build_config(&args(&[
            "--config",
            path.as_str(),
            "--mirrored",
            "rotation-only",
            "--no-orientation",
        ]))
        .unwrap();
        assert_eq!(config.mirrored, MirroredPolicy::RotationOnly);
        assert!(!config.apply_orientation);
        assert_eq!(config.limits.max_width, Some(100));
    }

    #[test]
    fn zero_limits_are_rejected() {
        assert!(build_config(&args(&["--max-width", "0"])).is_err());
    }

    #[test]
    fn output_name_keeps_dots_in_stem() {
        assert_eq!(
            output_path(Path::new("out"), Path::new("IMG_2024.01.05.jpg")),
            PathBuf::from("out/IMG_2024.01.05.oriented.png")
        );
    }
}
