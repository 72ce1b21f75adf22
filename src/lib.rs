//! Panelscan: link anomaly detections to solar panel detections.
//!
//! Drone inspection runs two detectors over every image: one finds solar
//! panels, the other finds anomalies such as cracks and dust. Both write
//! YOLO-style label files. Panelscan parses those files into pixel-space
//! boxes and works out which anomalies belong to which panel.
//!
//! # Modules
//!
//! - [`detection`]: Box geometry, coordinate spaces, class maps
//! - [`labels`]: Label file parsing
//! - [`link`]: Panel/anomaly linking and the resulting map
//! - [`session`]: Job records, batch processing and the results store
//! - [`error`]: Error types for panelscan operations
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use panelscan::detection::{ClassMap, ImageSize};
//! use panelscan::labels::parse_labels_str;
//! use panelscan::link::{link_anomalies_to_panels, LinkOptions};
//!
//! let image = ImageSize::new(640, 480).unwrap();
//! let panels = parse_labels_str("0 0.5 0.5 0.5 0.5 0.93\n", Path::new("p.txt"), &ClassMap::panels(), image).unwrap();
//! let anomalies = parse_labels_str("0 0.45 0.5 0.05 0.1 0.71\n", Path::new("a.txt"), &ClassMap::anomalies(), image).unwrap();
//!
//! let map = link_anomalies_to_panels(&panels, &anomalies, &LinkOptions::default());
//! assert_eq!(map.panels[0].anomalies[0].class_name, "cracked");
//! assert!(map.unassigned.is_empty());
//! ```

pub mod detection;
pub mod error;
pub mod labels;
pub mod link;
pub mod session;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::Level;

use detection::{BoundingBox, ClassMap, ImageSize};
use link::{LinkOptions, OverlapMetric};

pub use error::PanelscanError;

/// The panelscan CLI application.
#[derive(Parser)]
#[command(name = "panelscan")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Parse one label file into pixel-space boxes.
    Parse(ParseArgs),
    /// Link the anomalies of one image to its panels.
    Link(LinkArgs),
    /// Process every job in a JSON job manifest.
    Run(RunArgs),
}

/// Where the image dimensions come from.
#[derive(clap::Args)]
#[group(required = true, multiple = false)]
struct ImageArgs {
    /// Image file whose header gives the dimensions.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Explicit image dimensions, e.g. 1920x1080.
    #[arg(long, value_parser = parse_image_size)]
    size: Option<ImageSize>,
}

/// Arguments for the parse subcommand.
#[derive(clap::Args)]
struct ParseArgs {
    /// Label file to parse.
    labels: PathBuf,

    #[command(flatten)]
    image: ImageArgs,

    /// Class map: 'panel', 'anomaly', or a data.yaml / classes.txt path.
    #[arg(long, default_value = "panel")]
    classes: String,

    /// Output format ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the link subcommand.
#[derive(clap::Args)]
struct LinkArgs {
    /// Label file from the panel detector.
    #[arg(long)]
    panels: PathBuf,

    /// Label file from the anomaly detector.
    #[arg(long)]
    anomalies: PathBuf,

    #[command(flatten)]
    image: ImageArgs,

    /// Panel class map: 'panel', 'anomaly', or a data.yaml / classes.txt path.
    #[arg(long, default_value = "panel")]
    panel_classes: String,

    /// Anomaly class map: 'panel', 'anomaly', or a data.yaml / classes.txt path.
    #[arg(long, default_value = "anomaly")]
    anomaly_classes: String,

    /// Overlap metric ('containment' or 'iou').
    #[arg(long, env = "PANELSCAN_METRIC", default_value = "containment")]
    metric: String,

    /// Minimum overlap for a link; 0 links on any overlap.
    #[arg(long, env = "PANELSCAN_THRESHOLD", default_value_t = 0.0)]
    threshold: f64,

    /// Output format ('text', 'json', or 'csv').
    #[arg(long, default_value = "text")]
    output: String,

    /// Write the output to this file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

/// Arguments for the run subcommand.
#[derive(clap::Args)]
struct RunArgs {
    /// JSON job manifest.
    manifest: PathBuf,

    /// Write the results store to this file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Fail if any job was skipped.
    #[arg(long)]
    strict: bool,
}

/// Run the panelscan CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), PanelscanError> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Some(Commands::Parse(args)) => run_parse(args),
        Some(Commands::Link(args)) => run_link(args),
        Some(Commands::Run(args)) => run_jobs(args),
        None => {
            println!("panelscan {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Link anomaly detections to solar panel detections.");
            println!();
            println!("Run 'panelscan --help' for usage information.");
            Ok(())
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn parse_image_size(raw: &str) -> Result<ImageSize, String> {
    raw.parse::<ImageSize>().map_err(|e| e.to_string())
}

fn resolve_image_size(args: &ImageArgs) -> Result<ImageSize, PanelscanError> {
    match (&args.image, args.size) {
        (_, Some(size)) => Ok(size),
        (Some(path), None) => ImageSize::from_image_file(path),
        (None, None) => Err(PanelscanError::InvalidImageSize {
            message: "pass --image or --size".to_string(),
        }),
    }
}

fn resolve_class_map(name: &str) -> Result<ClassMap, PanelscanError> {
    match name {
        "panel" | "panels" => Ok(ClassMap::panels()),
        "anomaly" | "anomalies" => Ok(ClassMap::anomalies()),
        path => labels::read_class_map(Path::new(path)),
    }
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String, PanelscanError> {
    serde_json::to_string_pretty(value).map_err(|source| PanelscanError::JsonWrite {
        path: PathBuf::from("<stdout>"),
        source,
    })
}

fn print_boxes(boxes: &[BoundingBox], output: &str) -> Result<(), PanelscanError> {
    match output {
        "json" => println!("{}", to_pretty_json(&boxes)?),
        "text" => {
            for (idx, b) in boxes.iter().enumerate() {
                print!(
                    "{:>3} {:<10} [{:.1}, {:.1}, {:.1}, {:.1}]",
                    idx, b.class_name, b.bbox.x_min, b.bbox.y_min, b.bbox.x_max, b.bbox.y_max
                );
                match b.confidence {
                    Some(conf) => println!(" conf={conf:.2}"),
                    None => println!(),
                }
            }
        }
        other => {
            return Err(PanelscanError::UnsupportedFormat(format!(
                "'{other}' (supported: text, json)"
            )))
        }
    }
    Ok(())
}

/// Execute the parse subcommand.
///
/// On a bad line the boxes read before it are still printed before the
/// error is returned.
fn run_parse(args: ParseArgs) -> Result<(), PanelscanError> {
    let image = resolve_image_size(&args.image)?;
    let classes = resolve_class_map(&args.classes)?;

    match labels::read_label_file(&args.labels, &classes, image) {
        Ok(boxes) => print_boxes(&boxes, &args.output),
        Err(failure) => {
            let (parsed, error) = failure.into_parts();
            if !parsed.is_empty() {
                print_boxes(&parsed, &args.output)?;
            }
            Err(error)
        }
    }
}

/// Execute the link subcommand.
fn run_link(args: LinkArgs) -> Result<(), PanelscanError> {
    let opts = LinkOptions {
        metric: args.metric.parse::<OverlapMetric>()?,
        threshold: args.threshold,
    };
    opts.validate()?;

    let image = resolve_image_size(&args.image)?;
    let panel_classes = resolve_class_map(&args.panel_classes)?;
    let anomaly_classes = resolve_class_map(&args.anomaly_classes)?;

    let panels = labels::read_label_file(&args.panels, &panel_classes, image)?;
    let anomalies = labels::read_label_file(&args.anomalies, &anomaly_classes, image)?;
    let map = link::link_anomalies_to_panels(&panels, &anomalies, &opts);

    let rendered = match args.output.as_str() {
        "text" => map.to_string(),
        "json" => to_pretty_json(&map)? + "\n",
        "csv" => link::io_csv::to_links_csv_string(&map)?,
        other => {
            return Err(PanelscanError::UnsupportedFormat(format!(
                "'{other}' (supported: text, json, csv)"
            )))
        }
    };

    match args.out {
        Some(path) => {
            std::fs::write(&path, rendered).map_err(PanelscanError::Io)?;
            tracing::info!(path = %path.display(), "wrote link map");
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

/// Execute the run subcommand.
fn run_jobs(args: RunArgs) -> Result<(), PanelscanError> {
    let manifest = session::read_job_manifest(&args.manifest)?;
    let store = session::process_jobs(&manifest);

    match &args.out {
        Some(path) => {
            session::write_results_json(path, &store)?;
            tracing::info!(path = %path.display(), results = store.len(), "wrote results");
        }
        None => println!("{}", to_pretty_json(&store)?),
    }

    for skipped in store.skipped() {
        eprintln!("warning: skipped job '{}': {}", skipped.id, skipped.message);
    }

    if args.strict && !store.skipped().is_empty() {
        return Err(PanelscanError::JobsSkipped {
            count: store.skipped().len(),
        });
    }
    Ok(())
}
