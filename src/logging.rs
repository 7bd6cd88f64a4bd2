use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::metadata::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable overriding the stderr filter (`EnvFilter` syntax).
pub const LOG_ENV: &str = "GIT_ONBOARD_LOG";

/// Rotate once the log reaches this size.
pub const MAX_LOG_BYTES: u64 = 1024 * 1024;

/// Number of rotated backups kept (`<file>.1` .. `<file>.N`).
pub const LOG_BACKUPS: usize = 5;

#[derive(Clone, Debug)]
pub struct LogOptions {
    /// Log file; `None` disables the file layer.
    pub file: Option<PathBuf>,
    /// Number of `-v` flags.
    pub verbosity: u8,
}

/// Keeps the non-blocking file writer flushing until dropped.
pub struct LogGuard {
    _guard: Option<WorkerGuard>,
}

fn stderr_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    }
}

fn file_level(verbosity: u8) -> LevelFilter {
    if verbosity == 0 {
        LevelFilter::INFO
    } else {
        LevelFilter::DEBUG
    }
}

fn backup_path(path: &Path, n: usize) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(format!(".{}", n));
    PathBuf::from(s)
}

/// Rotate `path` when it has grown to `max_bytes` or more.
///
/// `path` becomes `path.1`, existing `path.N` shift to `path.N+1`, and the
/// backup beyond `backups` is removed. Returns whether a rotation happened.
pub fn rotate_if_oversized(path: &Path, max_bytes: u64, backups: usize) -> io::Result<bool> {
    let len = match fs::metadata(path) {
        Ok(m) => m.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if len < max_bytes || backups == 0 {
        return Ok(false);
    }

    let oldest = backup_path(path, backups);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }
    for n in (1..backups).rev() {
        let from = backup_path(path, n);
        if from.exists() {
            fs::rename(&from, backup_path(path, n + 1))?;
        }
    }
    fs::rename(path, backup_path(path, 1))?;
    Ok(true)
}

/// Install the global subscriber.
///
/// Stderr gets a compact `fmt` layer at `warn` (raised by `-v`, or replaced by
/// `GIT_ONBOARD_LOG`). When a log file is configured it is rotated if
/// oversized and then appended to through a non-blocking writer without ANSI
/// colours. Problems setting up the file are reported once the subscriber is
/// live and never abort the run.
pub fn init(opts: LogOptions) -> LogGuard {
    let stderr_filter = EnvFilter::builder()
        .with_default_directive(stderr_level(opts.verbosity).into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = vec![Box::new(
        tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(io::stderr)
            .with_target(false)
            .with_filter(stderr_filter),
    )];

    let mut guard = None;
    let mut setup_error = None;
    let mut rotated = false;
    if let Some(file) = &opts.file {
        match open_file_layer(file, opts.verbosity) {
            Ok((layer, g, did_rotate)) => {
                layers.push(layer);
                guard = Some(g);
                rotated = did_rotate;
            }
            Err(e) => setup_error = Some(format!("log file {}: {}", file.display(), e)),
        }
    }

    if Registry::default().with(layers).try_init().is_err() {
        // Already installed (tests, embedding); keep the existing one.
        return LogGuard { _guard: guard };
    }

    if rotated {
        tracing::info!("rotated oversized log file");
    }
    if let Some(err) = setup_error {
        tracing::warn!("{err}");
    }
    LogGuard { _guard: guard }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn open_file_layer(file: &Path, verbosity: u8) -> io::Result<(BoxedLayer, WorkerGuard, bool)> {
    let dir = match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let name = file
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "log path has no file name"))?;
    fs::create_dir_all(&dir)?;

    let rotated = rotate_if_oversized(file, MAX_LOG_BYTES, LOG_BACKUPS).unwrap_or_else(|e| {
        eprintln!("warning: log rotation failed for {}: {}", file.display(), e);
        false
    });

    let appender = tracing_appender::rolling::never(&dir, name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_filter(file_level(verbosity))
        .boxed();
    Ok((layer, guard, rotated))
}
