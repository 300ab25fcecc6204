use clap::{Parser, Subcommand, ValueEnum};
use clusterviz::config::VisConfig;
use clusterviz::layout::{GraphLayoutResult, OverviewResult, Selection, Viewport};
use clusterviz::model::Document;
use clusterviz::session::Visualizer;
use clusterviz::svg::{ActivityPalette, SvgRenderer};
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about = "Lay out clustered process-mining views as SVG or JSON")]
struct Args {
    /// Input document (JSON)
    input: PathBuf,

    #[command(subcommand)]
    command: Command,

    /// Output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, value_enum, default_value_t = Format::Svg)]
    format: Format,

    /// Layout configuration (JSON, partial files allowed)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Cluster overview glyphs
    Overview {
        /// Cluster id, or "all"
        #[arg(short, long, default_value = "all")]
        cluster: String,
        #[arg(long, default_value_t = 800.0)]
        width: f64,
        #[arg(long, default_value_t = 600.0)]
        height: f64,
    },
    /// Process graph of one cluster
    Graph {
        cluster: String,
        /// Width offered to the graph; the canvas grows if nodes need more
        #[arg(long, default_value_t = 0.0)]
        width: f64,
    },
    /// Sorted activities of one cluster
    Activities { cluster: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Svg,
    Json,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{}", msg);
    process::exit(1);
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| fail(format!("JSON error: {}", e)))
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => VisConfig::from_path(path)
            .unwrap_or_else(|e| fail(format!("Failed to load {}: {}", path.display(), e))),
        None => VisConfig::default(),
    };

    let document = Document::from_path(&args.input)
        .unwrap_or_else(|e| fail(format!("Failed to load {}: {}", args.input.display(), e)));

    let renderer = SvgRenderer::new(
        ActivityPalette::from_document(&document),
        config.end_activities.clone(),
    );
    let mut vis = Visualizer::new(document, config);

    let out = match &args.command {
        Command::Overview {
            cluster,
            width,
            height,
        } => {
            let result = vis
                .layout_overview(&Selection::parse(cluster), Viewport::new(*width, *height))
                .unwrap_or_else(|e| fail(e));
            match (args.format, &*result) {
                (Format::Json, r) => to_json(r),
                (Format::Svg, OverviewResult::Positioned(layout)) => {
                    renderer.render_overview(layout, vis.document())
                }
                (Format::Svg, OverviewResult::Empty) => fail("No clusters to draw"),
            }
        }
        Command::Graph { cluster, width } => {
            let result = vis
                .layout_process_graph(cluster, *width)
                .unwrap_or_else(|e| fail(e));
            match (args.format, &*result) {
                (Format::Json, r) => to_json(r),
                (Format::Svg, GraphLayoutResult::Positioned(layout)) => {
                    renderer.render_process_graph(layout)
                }
                (Format::Svg, GraphLayoutResult::NoData) => renderer.render_no_data(cluster),
            }
        }
        Command::Activities { cluster } => {
            let activities = vis.cluster_activities(cluster).unwrap_or_else(|e| fail(e));
            match args.format {
                Format::Json => to_json(&activities),
                Format::Svg => activities.join("\n") + "\n",
            }
        }
    };

    match &args.output {
        Some(path) => {
            if let Err(e) = fs::write(path, &out) {
                fail(format!("Failed to write {}: {}", path.display(), e));
            }
        }
        None => print!("{}", out),
    }
}
