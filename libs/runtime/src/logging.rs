use crate::config::{LoggingConfig, Section};
use std::{
    collections::HashMap,
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::{
    filter::{FilterFn, Targets},
    fmt,
};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};

const DEFAULT_SECTION: &str = "default";

// -------- level helpers --------

fn parse_tracing_level(s: &str) -> Option<Level> {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

/// Returns true if target == subsystem or target starts with "subsystem::"
fn matches_subsystem(target: &str, subsystem: &str) -> bool {
    target
        .strip_prefix(subsystem)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

type CatchAllFilter = FilterFn<Box<dyn Fn(&tracing::Metadata<'_>) -> bool + Send + Sync>>;

/// Passes events that no explicit subsystem claims, up to `max_level`.
fn catch_all_filter(claimed: Vec<String>, max_level: Level) -> CatchAllFilter {
    FilterFn::new(Box::new(move |meta: &tracing::Metadata<'_>| {
        let target = meta.target();
        !claimed.iter().any(|s| matches_subsystem(target, s)) && *meta.level() <= max_level
    }))
}

// -------- rotating file writers --------

type Rotating = Arc<Mutex<FileRotate<AppendTimestamp>>>;

#[derive(Clone)]
struct FileHandle(Option<Rotating>);

impl Write for FileHandle {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &self.0 {
            Some(f) => f
                .lock()
                .map_err(|_| std::io::Error::other("log file lock poisoned"))?
                .write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &self.0 {
            Some(f) => f
                .lock()
                .map_err(|_| std::io::Error::other("log file lock poisoned"))?
                .flush(),
            None => Ok(()),
        }
    }
}

/// Routes each record to the file of the subsystem that claims its target,
/// falling back to the default file.
#[derive(Clone, Default)]
struct FileRouter {
    fallback: Option<Rotating>,
    by_subsystem: HashMap<String, Rotating>,
}

impl FileRouter {
    fn is_empty(&self) -> bool {
        self.fallback.is_none() && self.by_subsystem.is_empty()
    }

    fn route(&self, target: &str) -> FileHandle {
        let hit = self
            .by_subsystem
            .iter()
            .find(|(name, _)| matches_subsystem(target, name))
            .map(|(_, f)| f.clone());
        FileHandle(hit.or_else(|| self.fallback.clone()))
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = FileHandle;

    fn make_writer(&'a self) -> Self::Writer {
        FileHandle(self.fallback.clone())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        self.route(meta.target())
    }
}

/// Resolve a log file path against `base_dir` (home_dir).
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn open_rotating(log_path: &Path, section: &Section) -> std::io::Result<Rotating> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let max_bytes = section.max_size_mb.unwrap_or(20) * 1024 * 1024;
    let keep = section.max_backups.unwrap_or(3);

    let rot = FileRotate::new(
        log_path,
        AppendTimestamp::default(FileLimit::MaxFiles(keep)),
        ContentLimit::BytesSurpassed(max_bytes as usize),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    Ok(Arc::new(Mutex::new(rot)))
}

fn open_section_file(name: &str, section: &Section, base_dir: &Path) -> Option<Rotating> {
    if section.file.trim().is_empty() {
        return None;
    }
    let path = resolve_log_path(&section.file, base_dir);
    match open_rotating(&path, section) {
        Ok(f) => Some(f),
        Err(e) => {
            eprintln!(
                "Failed to open log file for '{}': {} ({})",
                name,
                path.to_string_lossy(),
                e
            );
            None
        }
    }
}

// -------- plan --------

/// Everything derived from a `LoggingConfig` before any subscriber is installed.
struct LoggingPlan {
    console: Targets,
    files: Targets,
    router: FileRouter,
    subsystems: Vec<String>,
    default_console: Option<Level>,
    default_file: Option<Level>,
}

fn plan(cfg: &LoggingConfig, base_dir: &Path) -> LoggingPlan {
    let mut console = Targets::new().with_default(LevelFilter::OFF);
    let mut files = Targets::new().with_default(LevelFilter::OFF);
    let mut router = FileRouter::default();
    let mut subsystems = Vec::new();

    for (name, section) in cfg.iter().filter(|(k, _)| k.as_str() != DEFAULT_SECTION) {
        subsystems.push(name.clone());
        if let Some(level) = parse_tracing_level(&section.console_level) {
            console = console.with_target(name.clone(), LevelFilter::from_level(level));
        }
        if let Some(file) = open_section_file(name, section, base_dir) {
            router.by_subsystem.insert(name.clone(), file);
            if let Some(level) = parse_tracing_level(&section.file_level) {
                files = files.with_target(name.clone(), LevelFilter::from_level(level));
            }
        }
    }

    let default = cfg.get(DEFAULT_SECTION);
    router.fallback = default.and_then(|s| open_section_file(DEFAULT_SECTION, s, base_dir));

    LoggingPlan {
        console,
        files,
        default_console: default.and_then(|s| parse_tracing_level(&s.console_level)),
        default_file: router
            .fallback
            .as_ref()
            .and(default)
            .and_then(|s| parse_tracing_level(&s.file_level)),
        router,
        subsystems,
    }
}

// -------- public init --------

/// Initialize logging from a configuration.
/// - `cfg`: LoggingConfig containing the logging sections
/// - `base_dir`: base directory used to resolve relative log file paths (usually client.home_dir)
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    use tracing_subscriber::{layer::SubscriberExt, prelude::*, Layer, Registry};

    // Bridge `log` → `tracing` before installing the subscriber
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        let _ = fmt()
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(std::io::stderr)
            .try_init();
        return;
    }

    let p = plan(cfg, base_dir);
    let ansi = atty::is(atty::Stream::Stderr);

    let console_layer = fmt::layer()
        .with_ansi(ansi)
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(p.console);

    let console_default = p.default_console.map(|level| {
        fmt::layer()
            .with_ansi(ansi)
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_filter(catch_all_filter(p.subsystems.clone(), level))
    });

    let (file_layer, file_default) = if p.router.is_empty() {
        (None, None)
    } else {
        let explicit = fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(p.router.clone())
            .with_filter(p.files);
        let fallback = p.default_file.map(|level| {
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_writer(p.router.clone())
                .with_filter(catch_all_filter(p.subsystems.clone(), level))
        });
        (Some(explicit), fallback)
    };

    let _ = Registry::default()
        .with(console_layer)
        .with(console_default)
        .with(file_layer)
        .with(file_default)
        .try_init();
}

// =================== tests ===================
