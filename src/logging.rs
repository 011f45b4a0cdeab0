use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

/// Environment variable holding the log filter (`env_logger` syntax).
pub const LOG_ENV: &str = "DEVHOOKS_LOG";

/// Move `path` to `<path>.old` once it exceeds `max_bytes`, replacing any
/// previous backup.
pub fn rotate(path: &Path, max_bytes: u64) -> Result<bool> {
    let size = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e).with_context(|| format!("failed to stat {}", path.display())),
    };
    if size <= max_bytes {
        return Ok(false);
    }
    let mut backup = path.as_os_str().to_owned();
    backup.push(".old");
    fs::rename(path, &backup)
        .with_context(|| format!("failed to rotate {}", path.display()))?;
    Ok(true)
}

/// Route `log` records for this process into the shared hook log file.
///
/// Every line carries `tag` so that interleaved hooks can be told apart.
/// Failures are reported to the caller; hooks ignore them and run unlogged.
pub fn init(path: &Path, max_bytes: u64, tag: &'static str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    rotate(path, max_bytes)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    env_logger::Builder::new()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .filter_level(log::LevelFilter::Info)
        .parse_env(LOG_ENV)
        .format(move |buf, record| {
            writeln!(
                buf,
                "[{}] [{tag}] {}: {}",
                buf.timestamp_seconds(),
                record.level(),
                record.args()
            )
        })
        .try_init()
        .context("logger already initialized")?;
    Ok(())
}
