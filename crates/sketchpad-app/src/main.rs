//! Main application entry point.

use clap::Parser;
use sketchpad_app::Cli;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("Parsed arguments: {:?}", cli);

    let stdout = std::io::stdout();
    sketchpad_app::run(&cli, &mut stdout.lock())
}
