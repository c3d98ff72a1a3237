use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thumbforge::compose::{TextEffect, TextLayer, TextPosition, Tilt, create_thumbnail, determine_layout};
use thumbforge::config::{self, ForgeConfig};
use thumbforge::enhance::EnhanceLevel;
use thumbforge::imaging::RustBackend;
use thumbforge::layout::Catalog;
use thumbforge::{inputs, output};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "thumbforge")]
#[command(about = "Compose several photos into one 1280x720 thumbnail")]
#[command(long_about = "\
Compose several photos into one 1280x720 thumbnail

Photos are analyzed (shape, detail, prominent subject) and an arrangement is
picked automatically, or named with --layout. Each photo is cover-fitted into
its slot; dividers and a text overlay are drawn on top.

Arrangements:
  Grids    1x1 1x2 1x3 2x1 2x2 2x3 3x1 3x2
  Custom   hero-side corner-grid banner-split spotlight l-shape
  Legacy   2-split (= 1x2), 3-split (= 1x3)

Settings are read from thumbforge.toml in the working directory (or --config);
flags override them. Run 'thumbforge gen-config' for a documented file.

Logging goes to stderr and is controlled with RUST_LOG (default thumbforge=info).")]
#[command(version = version_string())]
struct Cli {
    /// Config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Photos to use: files, or directories of images.
#[derive(clap::Args, Clone)]
struct InputArgs {
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Descend into subdirectories
    #[arg(long, short)]
    recursive: bool,

    /// Print machine-readable JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args, Clone)]
struct CreateArgs {
    #[command(flatten)]
    input: InputArgs,

    /// auto, a grid id (2x3), a custom shape (hero-side), 2-split or 3-split
    #[arg(long, short)]
    layout: Option<String>,

    /// Divider thickness in pixels
    #[arg(long)]
    delimiter_width: Option<u32>,

    /// Vertical divider tilt in degrees
    #[arg(long, allow_hyphen_values = true)]
    delimiter_tilt: Option<String>,

    /// Divider colour (#RGB or #RRGGBB)
    #[arg(long)]
    delimiter_color: Option<String>,

    /// Enhance every photo before composing
    #[arg(long)]
    enhance: bool,

    /// none, light, medium or high
    #[arg(long)]
    enhance_level: Option<EnhanceLevel>,

    /// Text to draw over the thumbnail
    #[arg(long)]
    text: Option<String>,

    #[arg(long)]
    font: Option<String>,

    #[arg(long)]
    text_size: Option<f64>,

    #[arg(long)]
    text_color: Option<String>,

    #[arg(long, value_enum)]
    text_position: Option<TextPosition>,

    #[arg(long, value_enum)]
    text_effect: Option<TextEffect>,

    #[arg(long, value_enum)]
    text_layer: Option<TextLayer>,

    /// Output directory
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Output file name (without .png)
    #[arg(long)]
    name: Option<String>,

    /// PNG compression level (0-9)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=9))]
    compression_level: Option<u8>,

    /// Skip the second, maximum-compression encode
    #[arg(long)]
    no_optimize: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Build a thumbnail from photos
    Create(CreateArgs),
    /// Show image features and the arrangement auto mode would pick
    Analyze(InputArgs),
    /// List the available arrangements
    Layouts,
    /// Print a stock thumbforge.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thumbforge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let catalog = Catalog::standard();

    match cli.command {
        Command::Create(args) => {
            let config = load_config(cli.config.as_ref())?;
            init_thread_pool(&config.processing);
            let images = inputs::expand_inputs(&args.input.inputs, args.input.recursive)?;

            let mut request = config.request(images);
            if let Some(layout) = &args.layout {
                request.layout_mode = layout.clone();
            }
            if let Some(width) = args.delimiter_width {
                request.delimiter_width = width;
            }
            if let Some(tilt) = &args.delimiter_tilt {
                request.delimiter_tilt = Tilt::Text(tilt.clone());
            }
            if let Some(color) = &args.delimiter_color {
                request.delimiter_color = color.clone();
            }
            if args.enhance {
                request.apply_enhance = true;
            }
            if let Some(level) = args.enhance_level {
                request.enhance_level = level;
            }
            if let Some(level) = args.compression_level {
                request.compression_level = level;
            }
            if args.no_optimize {
                request.youtube_optimize = false;
            }
            request.output_name = args.name.clone();
            if let Some(text) = &args.text {
                let mut overlay = config.text.overlay(text.as_str());
                if let Some(font) = &args.font {
                    overlay.font = font.clone();
                }
                if let Some(size) = args.text_size {
                    overlay.size = size;
                }
                if let Some(color) = &args.text_color {
                    overlay.color = color.clone();
                }
                if let Some(position) = args.text_position {
                    overlay.position = position;
                }
                if let Some(effect) = args.text_effect {
                    overlay.effect = effect;
                }
                if let Some(layer) = args.text_layer {
                    overlay.layer = layer;
                }
                request.text_overlay = Some(overlay);
            }

            let output_dir = args
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(&config.output.directory));
            let backend = RustBackend::new();
            let result = create_thumbnail(&backend, &catalog, &request, &output_dir);
            if args.input.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                output::print_result(&result);
            }
            if !result.success {
                std::process::exit(1);
            }
        }
        Command::Analyze(args) => {
            let config = load_config(cli.config.as_ref())?;
            init_thread_pool(&config.processing);
            let images = inputs::expand_inputs(&args.inputs, args.recursive)?;
            let backend = RustBackend::new();
            let (decision, _) = determine_layout(&backend, &catalog, &images);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&decision)?);
            } else {
                output::print_analysis(&decision);
            }
        }
        Command::Layouts => {
            output::print_catalog(&catalog);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load `--config`, or `thumbforge.toml` from the working directory when present.
///
/// An explicitly named file must exist.
fn load_config(path: Option<&PathBuf>) -> Result<ForgeConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) if !path.exists() => {
            Err(format!("Config file not found: {}", path.display()).into())
        }
        Some(path) => Ok(config::load_config(path)?),
        None => Ok(config::load_config(std::path::Path::new(config::CONFIG_FILE_NAME))?),
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
