use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Use this config file instead of the one in your config directory.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Draw random frames instead of listening to the microphone.
    #[arg(long)]
    pub demo: bool,

    /// Print the names of the available input devices and exit.
    #[arg(long)]
    pub list_inputs: bool,
}
