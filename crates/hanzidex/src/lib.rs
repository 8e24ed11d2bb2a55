pub mod config;
pub mod stages;

pub use config::{Config, Overrides};
pub use stages::{Stage, StageReport, rewrite_asset_urls, run_all, run_stage};
