use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use camsnap::cli::{self, Args, Command, ConfigAction};
use camsnap::config::{self, Config};
use camsnap::event_loop::{self, ViewOptions};
use camsnap::export::DiskSaver;
use camsnap::native::NativeHost;
use camsnap::raw_mode::RawModeGuard;
use camsnap::session::CameraSession;

/// Route `log` records to stderr. `RUST_LOG` wins over `default_filter`.
fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Load the config file. An explicit `--config` must exist; a broken
/// default file falls back to defaults with a warning.
fn load_config(args: &Args) -> Config {
    let mut cfg = if let Some(ref path) = args.config {
        if !path.exists() {
            eprintln!("Error: config file not found: {}", path.display());
            std::process::exit(1);
        }
        match Config::load(Some(path)) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        match Config::load(None) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Warning: {}", e);
                eprintln!("Using default settings.\n");
                Config::default()
            }
        }
    };
    args.apply_to(&mut cfg);
    cfg
}

fn runtime() -> tokio::runtime::Runtime {
    match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create async runtime: {}", e);
            std::process::exit(1);
        }
    }
}

/// Interactive preview session until the user quits.
fn run_interactive(cfg: Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let rt = runtime();
    rt.block_on(async {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let host = NativeHost::new(cfg.native_options(), tx);
        let saver = DiskSaver::new(cfg.output_dir(), cfg.photo.save_method);
        let mut session = CameraSession::new(host, saver, cfg.session_options());

        let mut guard = RawModeGuard::enter()?;
        session.init().await;

        let view = ViewOptions {
            charset: cfg.ui.charset,
            preview: cfg.ui.preview,
        };
        let result = event_loop::run(&mut session, rx, view).await;

        session.shutdown();
        session.host().finish_pending_stops().await;
        guard.exit()?;

        if let Some(saved) = session.last_saved() {
            println!("Last photo: {}", saved.path.display());
        }
        result
    })
}

fn main() {
    let args = Args::parse();

    // Logs would scribble over the full-screen preview
    let default_filter = if args.command.is_none() { "off" } else { "warn" };
    init_logging(default_filter);

    match args.command {
        Some(Command::ListCameras) => {
            if let Err(e) = cli::list_cameras() {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Some(Command::Config { ref action }) => {
            let path: PathBuf = args.config.clone().unwrap_or_else(config::default_path);
            let cfg = match action {
                ConfigAction::Init => Config::default(),
                ConfigAction::Show => load_config(&args),
            };
            if let Err(e) = cli::handle_config_action(action.clone(), &cfg, &path) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Some(Command::Snap { wait_ms }) => {
            let cfg = load_config(&args);
            let rt = runtime();
            match rt.block_on(cli::snap(&cfg, Duration::from_millis(wait_ms))) {
                Ok(path) => println!("{}", path.display()),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        None => {
            let cfg = load_config(&args);
            if let Err(e) = run_interactive(cfg) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
