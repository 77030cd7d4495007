//! Command line front end for the link prediction engine.
#![forbid(unsafe_code)]

mod config;
mod ui;

use std::error::Error;
use std::io;
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::Serialize;

use config::{CliConfig, PredictSettings};
use linkpred::{
    cli::edge_list::{
        apply_renumber, load_graph, read_renumber_map, run_preprocess, CliError, EdgeFormat,
        PreprocessConfig, PreprocessSummary,
    },
    data_generator::{write_edge_list, DataGenerator},
    logging::init_logging,
    predict::{self, PredictOptions, RunStats, DEFAULT_MIN_DEGREE, DEFAULT_TOP_K},
    source::Orientation,
    ScoredPair,
};
use ui::{format_duration, Theme, Ui};

#[derive(Parser, Debug)]
#[command(
    name = "linkpred",
    version,
    about = "Adamic-Adar link prediction over SNAP edge lists",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "LINKPRED_CONFIG",
        value_name = "PATH",
        help = "Config file (defaults to <config_dir>/linkpred/cli.toml)"
    )]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Config profile to apply")]
    profile: Option<String>,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[arg(
        long,
        global = true,
        default_value = "warn",
        help = "Log level when RUST_LOG is unset"
    )]
    log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = Theme::Auto)]
    theme: Theme,

    #[arg(long, short, global = true, help = "Suppress decoration and spinners")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Rank non-adjacent hub pairs by Adamic-Adar score")]
    Predict(PredictCmd),

    #[command(about = "Strip comments and duplicates from an edge list")]
    Preprocess(PreprocessCmd),

    #[command(about = "Write a seeded random social graph as an edge list")]
    Generate(GenerateCmd),

    #[command(about = "List profiles from the config file")]
    Profiles,

    #[command(about = "Print shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct PredictCmd {
    #[arg(value_name = "EDGES", help = "Edge list file, plain or .gz (or `edges` from config)")]
    edges: Option<PathBuf>,

    #[arg(long, help = "Minimum degree for a vertex to be a hub [default: 100]")]
    min_degree: Option<u64>,

    #[arg(long, help = "Worker threads [default: available parallelism]")]
    workers: Option<usize>,

    #[arg(long, short = 'k', help = "Number of pairs to report [default: 10]")]
    top_k: Option<usize>,

    #[arg(long, help = "Treat every edge as undirected")]
    undirected: bool,

    #[arg(
        long,
        value_name = "FILE",
        help = "Renumber file (`original new` lines) to map results back to original ids"
    )]
    renumber: Option<PathBuf>,

    #[arg(long, default_value_t = 1, help = "Run the prediction this many times")]
    repeat: usize,
}

#[derive(Args, Debug)]
struct PreprocessCmd {
    #[arg(long, short, value_name = "FILE")]
    input: PathBuf,

    #[arg(long, short, value_name = "FILE", help = "Output file; must not exist")]
    output: PathBuf,

    #[arg(long, value_enum, default_value_t = EdgeFormatArg::Text)]
    output_format: EdgeFormatArg,

    #[arg(long, value_name = "FILE", help = "Renumber vertices and write `original new` pairs")]
    renumber_out: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Write a CSV node file (requires csv output)")]
    nodes_out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GenerateCmd {
    #[arg(long, short, value_name = "FILE")]
    output: PathBuf,

    #[arg(long, default_value_t = 1_000)]
    users: usize,

    #[arg(long, default_value_t = 20)]
    avg_connections: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum EdgeFormatArg {
    Text,
    Csv,
}

impl From<EdgeFormatArg> for EdgeFormat {
    fn from(format: EdgeFormatArg) -> Self {
        match format {
            EdgeFormatArg::Text => EdgeFormat::Text,
            EdgeFormatArg::Csv => EdgeFormat::Csv,
        }
    }
}

#[derive(Serialize)]
struct PredictReport {
    edges: PathBuf,
    undirected: bool,
    vertices: usize,
    edge_count: usize,
    repeat: usize,
    mean_ms: u64,
    results: Vec<ScoredPair<u64>>,
    stats: RunStats,
}

#[derive(Serialize)]
struct GenerateReport {
    output: PathBuf,
    users: usize,
    edges: usize,
    seed: u64,
}

#[derive(Serialize)]
struct ProfilesReport<'a> {
    config: Option<PathBuf>,
    default_profile: Option<&'a str>,
    profiles: Vec<ProfileEntry<'a>>,
}

#[derive(Serialize)]
struct ProfileEntry<'a> {
    name: &'a str,
    #[serde(flatten)]
    settings: &'a PredictSettings,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;
    let ui = Ui::new(cli.theme, cli.quiet);

    match cli.command {
        Command::Predict(ref cmd) => {
            let config = CliConfig::load(cli.config.clone())?;
            let settings = config.resolve(cli.profile.as_deref())?;
            run_predict(&ui, cli.format, cmd, settings)?;
        }
        Command::Preprocess(cmd) => {
            let cfg = PreprocessConfig {
                input: cmd.input,
                output: cmd.output,
                format: cmd.output_format.into(),
                renumber_out: cmd.renumber_out,
                nodes_out: cmd.nodes_out,
            };
            let task = ui.task(format!("Preprocessing {}", cfg.input.display()));
            let summary = run_preprocess(&cfg).map_err(into_boxed_error)?;
            let elapsed = task.finish();
            emit(cli.format, &summary, || {
                print_preprocess_text(&ui, &cfg, &summary);
                ui.success(&format!("done in {}", format_duration(elapsed)));
            })?;
        }
        Command::Generate(cmd) => {
            let edges = DataGenerator::new(cmd.seed)
                .generate_social_network(cmd.users, cmd.avg_connections);
            write_edge_list(&cmd.output, &edges)?;
            let report = GenerateReport {
                output: cmd.output,
                users: cmd.users,
                edges: edges.len(),
                seed: cmd.seed,
            };
            emit(cli.format, &report, || {
                ui.section(
                    "Generated graph",
                    [
                        ("output", report.output.display().to_string()),
                        ("users", report.users.to_string()),
                        ("edges", report.edges.to_string()),
                        ("seed", report.seed.to_string()),
                    ],
                );
            })?;
        }
        Command::Profiles => {
            let config = CliConfig::load(cli.config.clone())?;
            let report = ProfilesReport {
                config: config.path().map(PathBuf::from),
                default_profile: config.default_profile_name(),
                profiles: config
                    .profiles()
                    .map(|(name, settings)| ProfileEntry { name, settings })
                    .collect(),
            };
            emit(cli.format, &report, || print_profiles_text(&ui, &report))?;
        }
        Command::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "linkpred", &mut io::stdout());
        }
    }

    Ok(())
}

fn run_predict(
    ui: &Ui,
    format: OutputFormat,
    cmd: &PredictCmd,
    settings: PredictSettings,
) -> Result<(), Box<dyn Error>> {
    let edges = cmd
        .edges
        .clone()
        .or(settings.edges)
        .ok_or_else(|| CliError::from("no edge list given (pass EDGES or set `edges` in config)"))?;
    let orientation = if cmd.undirected || settings.undirected.unwrap_or(false) {
        Orientation::Undirected
    } else {
        Orientation::Directed
    };
    let mut options = PredictOptions::default()
        .min_degree(
            cmd.min_degree
                .or(settings.min_degree)
                .unwrap_or(DEFAULT_MIN_DEGREE),
        )
        .k(cmd.top_k.or(settings.top_k).unwrap_or(DEFAULT_TOP_K));
    if let Some(workers) = cmd.workers.or(settings.workers) {
        options = options.worker_count(workers);
    }
    let renumber = match cmd.renumber.clone().or(settings.renumber) {
        Some(path) => Some(read_renumber_map(&path).map_err(into_boxed_error)?),
        None => None,
    };

    let task = ui.task(format!("Loading {}", edges.display()));
    let graph = load_graph(&edges, orientation).map_err(into_boxed_error)?;
    task.finish();

    let task = ui.task(format!(
        "Scoring hubs with degree >= {} on {} workers",
        options.min_degree, options.worker_count
    ));
    let (prediction, mean) = predict::run_repeated(&graph, &options, cmd.repeat)?;
    task.finish();

    let results = match renumber.as_ref() {
        Some(map) => apply_renumber(prediction.results, map).map_err(into_boxed_error)?,
        None => prediction.results,
    };
    let report = PredictReport {
        edges,
        undirected: graph.orientation() == Orientation::Undirected,
        vertices: graph.vertex_count(),
        edge_count: graph.edge_count(),
        repeat: cmd.repeat,
        mean_ms: mean.as_millis() as u64,
        results,
        stats: prediction.stats,
    };
    emit(format, &report, || print_predict_text(ui, &report))
}

fn into_boxed_error(err: CliError) -> Box<dyn Error> {
    Box::new(err)
}

fn emit<T, F>(format: OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: Serialize,
    F: FnOnce(),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(),
    }
    Ok(())
}

fn print_predict_text(ui: &Ui, report: &PredictReport) {
    let stats = &report.stats;
    ui.section(
        "Graph",
        [
            ("edges file", report.edges.display().to_string()),
            (
                "orientation",
                if report.undirected { "undirected" } else { "directed" }.to_string(),
            ),
            ("vertices", report.vertices.to_string()),
            ("edges", report.edge_count.to_string()),
        ],
    );
    ui.section(
        "Run",
        [
            ("min degree", stats.min_degree.to_string()),
            ("hubs", stats.hubs.to_string()),
            ("candidates", stats.candidates.to_string()),
            ("scored", stats.scored.to_string()),
            ("workers", stats.workers.len().to_string()),
            (
                "degree cache",
                format!(
                    "{} entries, {} hits, {} misses",
                    stats.degree_cache.entries, stats.degree_cache.hits, stats.degree_cache.misses
                ),
            ),
            (
                "phases",
                format!(
                    "fetch {}ms, enumerate {}ms, score {}ms, merge {}ms",
                    stats.fetch_ms, stats.enumerate_ms, stats.score_ms, stats.merge_ms
                ),
            ),
        ],
    );
    if report.repeat > 1 {
        ui.section(
            "Timing",
            [
                ("runs", report.repeat.to_string()),
                ("mean", format!("{}ms", report.mean_ms)),
            ],
        );
    }
    ui.ranking("Top pairs", &report.results);
}

fn print_preprocess_text(ui: &Ui, cfg: &PreprocessConfig, summary: &PreprocessSummary) {
    let mut rows = vec![
        ("output", cfg.output.display().to_string()),
        ("lines", summary.lines.to_string()),
        ("skipped", summary.skipped.to_string()),
        ("duplicates", summary.duplicates.to_string()),
        ("edges", summary.edges.to_string()),
        ("vertices", summary.vertices.to_string()),
    ];
    if let Some(path) = cfg.renumber_out.as_ref() {
        rows.push(("renumber", path.display().to_string()));
    }
    if let Some(path) = cfg.nodes_out.as_ref() {
        rows.push(("nodes", path.display().to_string()));
    }
    ui.section("Preprocess", rows);
}

fn print_profiles_text(ui: &Ui, report: &ProfilesReport<'_>) {
    let location = report
        .config
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "(no config directory)".to_string());
    ui.section("Config", [("file", location)]);
    if report.profiles.is_empty() {
        println!("  no profiles configured");
        return;
    }
    for entry in &report.profiles {
        let title = if Some(entry.name) == report.default_profile {
            format!("{} (default)", entry.name)
        } else {
            entry.name.to_string()
        };
        let s = entry.settings;
        let rows = [
            ("edges", s.edges.as_ref().map(|p| p.display().to_string())),
            ("min_degree", s.min_degree.map(|v| v.to_string())),
            ("workers", s.workers.map(|v| v.to_string())),
            ("top_k", s.top_k.map(|v| v.to_string())),
            ("undirected", s.undirected.map(|v| v.to_string())),
            ("renumber", s.renumber.as_ref().map(|p| p.display().to_string())),
        ];
        let rows: Vec<_> = rows
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect();
        if rows.is_empty() {
            println!("{title}");
        } else {
            ui.section(&title, rows);
        }
    }
}
