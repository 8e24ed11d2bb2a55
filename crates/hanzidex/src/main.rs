use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use hanzi_etl::LoadMode;
use hanzidex::{Config, Overrides, Stage, StageReport, run_all, run_stage};
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hanzidex")]
#[command(about = "Normalize Chinese-character corpora into the HanziDex tables")]
struct Cli {
    /// Project root [env: HANZIDEX_ROOT, default: current directory]
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    /// Where tables are written [env: HANZIDEX_OUT_DIR, default: <root>/data/processed]
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,
    /// How whole-file sources are read: mmap or owned [env: HANZIDEX_LOAD_MODE]
    #[arg(long, global = true, value_parser = parse_load_mode)]
    load_mode: Option<LoadMode>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Unihan exports to characters, readings and variants tables
    Unihan {
        #[arg(long)]
        unihan_dir: Option<PathBuf>,
    },
    /// Component decomposition to the parts table
    Decompose {
        #[arg(long)]
        decomposition_dir: Option<PathBuf>,
    },
    /// Leveled vocabulary merged with dictionary glosses
    Glossary {
        #[arg(long)]
        vocabulary: Option<PathBuf>,
        #[arg(long)]
        dictionary: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Stroke groups per character from the stroke dictionary
    Strokes {
        #[arg(long)]
        stroke_dictionary: Option<PathBuf>,
    },
    /// Index stroke-animation files into the asset table
    Assets {
        #[arg(long)]
        assets_dir: Option<PathBuf>,
    },
    /// Rewrite asset paths to root-relative URLs in place
    RewriteUrls,
    /// Every stage in order
    All,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(reports) => {
            let rows: usize = reports
                .iter()
                .flat_map(|r| r.outputs.iter().map(|(_, n)| n))
                .sum();
            info!("{} stage(s) done, {rows} rows written", reports.len());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<Vec<StageReport>> {
    let config = Config::load(Overrides {
        root: cli.root,
        out_dir: cli.out_dir,
        load_mode: cli.load_mode,
    });
    let mut layout = config.layout;
    info!("project root {}", layout.root.display());
    info!(
        "writing tables to {} (mode: {:?})",
        layout.output_dir.display(),
        config.load_mode
    );

    let stage = match cli.command {
        Commands::All => return run_all(&layout, config.load_mode),
        Commands::Unihan { unihan_dir } => {
            if let Some(dir) = unihan_dir {
                layout.unihan_dir = dir;
            }
            Stage::Unihan
        }
        Commands::Decompose { decomposition_dir } => {
            if let Some(dir) = decomposition_dir {
                layout.decomposition_dir = dir;
            }
            Stage::Decompose
        }
        Commands::Glossary {
            vocabulary,
            dictionary,
            output,
        } => {
            if let Some(path) = vocabulary {
                layout.vocabulary_csv = path;
            }
            if let Some(path) = dictionary {
                layout.dictionary = path;
            }
            if let Some(path) = output {
                layout.vocabulary_out = path;
            }
            Stage::Glossary
        }
        Commands::Strokes { stroke_dictionary } => {
            if let Some(path) = stroke_dictionary {
                layout.stroke_dictionary = path;
            }
            Stage::Strokes
        }
        Commands::Assets { assets_dir } => {
            if let Some(dir) = assets_dir {
                layout.stroke_assets = dir;
            }
            Stage::Assets
        }
        Commands::RewriteUrls => Stage::RewriteUrls,
    };
    Ok(vec![run_stage(stage, &layout, config.load_mode)?])
}

fn parse_load_mode(raw: &str) -> Result<LoadMode, String> {
    LoadMode::parse(raw).ok_or_else(|| format!("unknown load mode {raw:?}, expected mmap or owned"))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let max_level = env_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_max_level(max_level)
        .init();
}
