//! padgestr – multi-finger touchpad gestures for Linux.
//!
//! CLI entry point.

use std::fs::{File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Instant;

use clap::Parser;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

use padgestr::config::default_config_path;
use padgestr::manager::{GestureManager, list_touch_devices};

#[derive(Parser)]
#[command(name = "padgestr", about = "Multi-finger touchpad gestures")]
struct Cli {
    /// Path to configuration file [default: ~/.config/padgestr/gestures.toml]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// List available touchpad devices and exit
    #[arg(short, long)]
    list_devices: bool,

    /// Print detected gestures instead of running their commands
    #[arg(short, long)]
    test: bool,
}

/// Writes `<uptime> <LEVEL> [<thread>] <module>: <message>` lines to stderr
/// and, if configured, to a log file.
struct PadLog {
    level: LevelFilter,
    started: Instant,
    file: Option<Mutex<LineWriter<File>>>,
}

impl PadLog {
    fn format(&self, record: &Record) -> String {
        let uptime = self.started.elapsed().as_secs_f64();
        let current = thread::current();
        let thread = current.name().unwrap_or("-");
        let module = record
            .module_path()
            .unwrap_or(record.target())
            .strip_prefix("padgestr::")
            .unwrap_or("main");
        format!(
            "{uptime:>10.3} {:<5} [{thread}] {module}: {}\n",
            record.level(),
            record.args()
        )
    }
}

impl Log for PadLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.target().starts_with(env!("CARGO_CRATE_NAME"))
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = self.format(record);
        eprint!("{line}");

        if let Some(Ok(mut file)) = self.file.as_ref().map(Mutex::lock) {
            let _ = file.write_all(line.as_bytes());
        }
    }

    fn flush(&self) {
        if let Some(Ok(mut file)) = self.file.as_ref().map(Mutex::lock) {
            let _ = file.flush();
        }
    }
}

/// `--verbose` wins over the configured level; an unparsable level means info.
fn log_level(verbose: bool, configured: &str) -> LevelFilter {
    if verbose {
        return LevelFilter::Debug;
    }
    configured.parse().unwrap_or_else(|_| {
        eprintln!("Warning: unknown log level '{configured}', using info");
        LevelFilter::Info
    })
}

fn open_log_file(path: &str) -> Option<LineWriter<File>> {
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(LineWriter::new(file)),
        Err(e) => {
            eprintln!("Warning: cannot open log file '{path}': {e}");
            None
        }
    }
}

fn init_logging(manager: &GestureManager, verbose: bool) -> Result<(), SetLoggerError> {
    let level = log_level(verbose, manager.config_log_level());
    let logger = PadLog {
        level,
        started: Instant::now(),
        file: manager.config_log_file().and_then(open_log_file).map(Mutex::new),
    };
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(level);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.list_devices {
        return list_touch_devices();
    }

    let config_path = cli.config.unwrap_or_else(default_config_path);

    // The logger is configured from the file, so it cannot report load errors.
    let manager = match GestureManager::new(&config_path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!(
                "Error: {e}\n\n\
                 To find the touchpad device path, run:\n\
                 \x20 padgestr --list-devices"
            );
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&manager, cli.verbose) {
        eprintln!("Error: cannot install logger: {e}");
        return ExitCode::FAILURE;
    }

    let running = manager.running_flag();
    if let Err(e) = ctrlc::set_handler(move || running.store(false, Ordering::Relaxed)) {
        log::error!("Cannot install Ctrl-C handler: {e}");
        return ExitCode::FAILURE;
    }

    log::info!("Loaded configuration from {}", config_path.display());
    match manager.start(cli.test) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
