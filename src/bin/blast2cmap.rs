use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use blast2cmap::app::{App, PipelineOptions};
use blast2cmap::blast::SystemBlastClient;
use blast2cmap::centroids::{CentroidStore, CmapHttpClient, SqliteCentroids};
use blast2cmap::config::ConfigLoader;
use blast2cmap::domain::BlastProgram;
use blast2cmap::error::CmapError;
use blast2cmap::output::{JsonOutput, OutputMode, TextOutput};
use blast2cmap::plot::SystemPlotRunner;
use blast2cmap::workspace::Workspace;

#[derive(Parser)]
#[command(name = "blast2cmap")]
#[command(about = "BLAST hits to CMAP visualization")]
#[command(version, author)]
struct Cli {
    /// Query file for BLAST
    #[arg(short, long)]
    query: PathBuf,

    /// BLAST db
    #[arg(short, long)]
    blast_db: PathBuf,

    /// Centroids/SQLite db; the remote CMAP service is used when absent
    #[arg(short, long)]
    centroids_db: Option<PathBuf>,

    /// BLAST program
    #[arg(short = 'p', long, value_enum, default_value_t = BlastProgram::Blastn)]
    program: BlastProgram,

    /// BLAST percent identity
    #[arg(short = 'i', long)]
    perc_identity: Option<f64>,

    /// BLAST percent query coverage per hsp
    #[arg(short = 'Q', long)]
    qcov_hsp_perc: Option<f64>,

    /// Output directory
    #[arg(short, long, default_value = "out")]
    outdir: PathBuf,

    /// Num CPUs for parallel
    #[arg(short, long)]
    num_cpus: Option<usize>,

    /// Plotting program invoked per partition file
    #[arg(long)]
    plot_program: Option<String>,

    /// Optional JSON config with pipeline defaults
    #[arg(long)]
    config: Option<String>,

    /// Print the final report as JSON instead of text
    #[arg(long)]
    non_interactive_json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(cmap) = report.downcast_ref::<CmapError>() {
            return ExitCode::from(map_exit_code(cmap));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &CmapError) -> u8 {
    match error {
        CmapError::QueryNotFound(_)
        | CmapError::BlastDbDirMissing(_)
        | CmapError::BlastDbFilesMissing { .. }
        | CmapError::CentroidsDbMissing(_)
        | CmapError::PlotProgramMissing(_)
        | CmapError::ConfigRead(_)
        | CmapError::ConfigParse(_)
        | CmapError::MissingApiKey => 2,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive_json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    let config = ConfigLoader::resolve(cli.config.as_deref()).into_diagnostic()?;
    let resolved = ConfigLoader::merge(
        config,
        cli.perc_identity,
        cli.qcov_hsp_perc,
        cli.num_cpus,
        cli.plot_program,
    );

    let workspace = Workspace::new(&cli.outdir).into_diagnostic()?;
    let options = PipelineOptions {
        query: cli.query,
        blast_db: cli.blast_db,
        program: cli.program,
        config: resolved,
    };

    let report = match cli.centroids_db {
        Some(path) => {
            if !path.is_file() {
                return Err(CmapError::CentroidsDbMissing(path)).into_diagnostic();
            }
            let store = SqliteCentroids::open(&path).into_diagnostic()?;
            run_pipeline(workspace, store, &options)?
        }
        None => {
            let store = CmapHttpClient::new().into_diagnostic()?;
            run_pipeline(workspace, store, &options)?
        }
    };

    match output_mode {
        OutputMode::Json => JsonOutput::print_report(&report).into_diagnostic(),
        OutputMode::Text => TextOutput::print_report(&report).into_diagnostic(),
    }
}

fn run_pipeline<C: CentroidStore>(
    workspace: Workspace,
    store: C,
    options: &PipelineOptions,
) -> miette::Result<blast2cmap::app::PipelineReport> {
    let app = App::new(workspace, SystemBlastClient::new(), store, SystemPlotRunner::new());
    app.run(options).into_diagnostic()
}
