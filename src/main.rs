use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cfg = blob_visualizer::config::Config::parse();
    if cfg.list_presets {
        blob_visualizer::app::list_presets();
        return Ok(());
    }

    blob_visualizer::app::run(cfg)
}
