use std::io;
use std::path::PathBuf;

use clap::Parser;
use crossterm::event::EventStream;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tui::backend::CrosstermBackend;
use tui::Terminal;

use crate::app::AppHandle;
use crate::config::Config;
use crate::session::FileStore;
use crate::ui_actor::UIHandle;

mod app;
mod config;
mod error;
mod model;
mod remote;
mod session;
mod state;
mod ui_actor;

#[derive(Parser)]
struct Opts {
    /// Remote sheet endpoint URL (or VOTE_ENDPOINT)
    #[clap(short, long)]
    endpoint: Option<String>,
    /// Judge access code (or VOTE_JUDGE_CODE)
    #[clap(short, long)]
    code: Option<String>,
    /// Where the local session lives between runs
    #[clap(short, long)]
    session_file: Option<PathBuf>,
}

#[tokio::main]
pub async fn main() {
    env_logger::init();

    let opts = Opts::parse();
    let config = Config::load(opts.endpoint, opts.code, opts.session_file);
    let store = FileStore::open(config.session_file.clone());

    let stdout = io::stdout();
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).unwrap();
    enable_raw_mode().unwrap();
    terminal.clear().unwrap();

    let (ui_handle, ui_starter) = UIHandle::new();
    let app_handle = AppHandle::new(config, store, ui_handle);

    if let Err(err) = ui_starter(EventStream::new(), app_handle, &mut terminal).await {
        log::error!("ui actor stopped: {}", err);
    }

    disable_raw_mode().unwrap();
    terminal.clear().unwrap();
}
