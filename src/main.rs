mod app;
mod branding;
mod charts;
mod color;
mod data;
mod error;
mod state;
mod ui;

use std::path::PathBuf;

use app::DashboardApp;
use branding::Branding;
use clap::Parser;
use eframe::egui;
use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "jeu-video-dash")]
#[command(about = "Dashboard of the French video-game market", long_about = None)]
struct Args {
    /// Dataset file to open at startup
    #[arg(long, default_value = "assets/data.json")]
    data: PathBuf,

    /// Directory holding the sidebar logos
    #[arg(long, default_value = "assets")]
    assets: PathBuf,

    /// Refuse a dataset with an absent or malformed section
    #[arg(long)]
    strict: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut state = AppState::new(Branding::load(&args.assets));
    state.strict = args.strict;
    state.open(args.data);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 900.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Marché du jeu vidéo",
        options,
        Box::new(|cc| {
            // Install image loaders so egui can decode the logos.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(DashboardApp::new(state)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("eframe failed: {e}"))
}
