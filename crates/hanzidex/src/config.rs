use std::env;
use std::path::PathBuf;

use hanzi_etl::{LoadMode, ProjectLayout};
use tracing::warn;

pub const ROOT_VAR: &str = "HANZIDEX_ROOT";
pub const OUT_DIR_VAR: &str = "HANZIDEX_OUT_DIR";
pub const LOAD_MODE_VAR: &str = "HANZIDEX_LOAD_MODE";

/// Values given on the command line; `None` defers to the environment.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub root: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub load_mode: Option<LoadMode>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub layout: ProjectLayout,
    pub load_mode: LoadMode,
}

impl Config {
    /// Resolve from CLI values, then process environment variables, then defaults.
    pub fn load(cli: Overrides) -> Config {
        Self::resolve(cli, |key| env::var(key).ok())
    }

    /// Same as [`Config::load`] with an injectable variable lookup.
    pub fn resolve(cli: Overrides, var: impl Fn(&str) -> Option<String>) -> Config {
        let root = cli
            .root
            .or_else(|| var(ROOT_VAR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));
        let mut layout = ProjectLayout::from_root(root);
        if let Some(out) = cli.out_dir.or_else(|| var(OUT_DIR_VAR).map(PathBuf::from)) {
            layout = layout.with_output_dir(out);
        }
        let load_mode = cli
            .load_mode
            .or_else(|| {
                var(LOAD_MODE_VAR).and_then(|raw| {
                    let mode = LoadMode::parse(&raw);
                    if mode.is_none() {
                        warn!("ignoring {LOAD_MODE_VAR}={raw:?}; expected mmap or owned");
                    }
                    mode
                })
            })
            .unwrap_or_default();
        Config { layout, load_mode }
    }
}
