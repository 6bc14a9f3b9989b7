use clap::{ArgAction, Parser, Subcommand};
use grn_editor::simulation::parse_levels;
use grn_editor::{
    EditorError, EditorSettings, InputSchedule, JsonHandoff, SimulationRequest,
    SimulationService,
};
use grn_model::{Graph, GraphError, NodeKind, assemble, graphml};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "grn",
    about = "Inspect gene regulatory network files and prepare simulation runs"
)]
struct Cli {
    /// Editor settings file (JSON)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// More logging: -v for debug, -vv for trace
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the assembled network as JSON
    Describe { file: PathBuf },
    /// Load a GraphML file, assemble it and check it survives a save/load cycle
    Check { file: PathBuf },
    /// Print a simulation request as JSON
    Simulate {
        file: PathBuf,

        /// Duration of each interval
        #[arg(long)]
        duration: Option<f64>,

        /// Input levels for one interval, e.g. I1=50,I2=0. Repeat once per
        /// interval; unlisted inputs take the default level.
        #[arg(long = "interval", value_name = "LEVELS")]
        intervals: Vec<String>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn load(path: &Path, settings: &EditorSettings) -> Result<Graph, EditorError> {
    let bytes = std::fs::read(path)?;
    Ok(graphml::import_with_radius(&bytes, settings.node_radius)?)
}

fn run(cli: Cli) -> Result<(), EditorError> {
    let settings = match &cli.settings {
        Some(path) => EditorSettings::load(path)?,
        None => EditorSettings::default(),
    };

    match cli.command {
        Command::Describe { file } => {
            let graph = load(&file, &settings)?;
            let description = assemble(&graph)?;
            println!("{}", serde_json::to_string_pretty(&description)?);
        }
        Command::Check { file } => {
            let graph = load(&file, &settings)?;
            let description = assemble(&graph)?;
            let reloaded = graphml::import_with_radius(
                &graphml::export(&graph)?,
                settings.node_radius,
            )?;
            if reloaded != graph {
                return Err(GraphError::MalformedFile(format!(
                    "{} does not survive a save/load cycle",
                    file.display()
                ))
                .into());
            }
            let isolated = graph
                .nodes()
                .filter(|node| node.kind != NodeKind::Input)
                .filter(|node| !graph.edges().any(|e| e.target.id == node.id))
                .count();
            if isolated > 0 {
                log::warn!("{isolated} output or gene nodes have no incoming edge");
            }
            println!(
                "{}: {} nodes ({} inputs, {} outputs, {} genes), {} edges, round-trip ok",
                file.display(),
                graph.node_count(),
                description.inputs.len(),
                description.outputs.len(),
                description.genes.len(),
                graph.edge_count()
            );
        }
        Command::Simulate {
            file,
            duration,
            intervals,
        } => {
            let graph = load(&file, &settings)?;
            let network = assemble(&graph)?;
            let default_level = settings.simulation.default_input_level;

            let mut schedule = InputSchedule::new();
            schedule.sync_inputs(&network.inputs, default_level);
            for (interval, spec) in intervals.iter().enumerate() {
                schedule.add_interval(default_level);
                for (input, level) in parse_levels(spec)? {
                    schedule.set_level(&input, interval, level)?;
                }
            }
            if schedule.interval_count() == 0 {
                log::info!("no --interval given; using one interval at level {default_level}");
                schedule.add_interval(default_level);
            }

            let duration = duration.unwrap_or(settings.simulation.interval_duration);
            let request = SimulationRequest::new(network, &schedule, duration)?;
            JsonHandoff::new(std::io::stdout().lock()).submit(&request)?;
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("ERROR: {e}");
        std::process::exit(1);
    }
}
