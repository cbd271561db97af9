//! Size-based rotation of the log file

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use jiff::Zoned;

use crate::logger::config::RotationConfig;
use crate::logger::error::LoggerError;

/// Decides when the active file rotates and prunes old generations
pub struct RotationManager {
    config: RotationConfig,
}

impl RotationManager {
    pub fn new(config: RotationConfig) -> Self {
        Self { config }
    }

    pub fn should_rotate(&self, current_file_size: u64) -> bool {
        current_file_size >= self.config.max_size
    }

    /// Move the active file aside, compress it if configured, then prune.
    pub fn rotate(&mut self, current_path: &Path) -> Result<(), LoggerError> {
        if current_path.exists() {
            let rotated_path = rotated_path(current_path);
            fs::rename(current_path, &rotated_path)?;

            if self.config.compress {
                compress_file(&rotated_path)?;
            }
        }

        self.cleanup_old_files(current_path)
    }

    /// Keep at most `max_files - 1` rotated files so the next rotation fits.
    fn cleanup_old_files(&self, base_path: &Path) -> Result<(), LoggerError> {
        let parent = match base_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let stem = base_path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();
        let prefix = format!("{stem}.");

        let mut rotated_files: Vec<PathBuf> = fs::read_dir(parent)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                let file_name = path.file_name().unwrap_or_default().to_string_lossy();
                file_name.starts_with(&prefix) && path.as_path() != base_path
            })
            .collect();

        // Oldest first
        rotated_files.sort_by_key(|path| fs::metadata(path).and_then(|m| m.modified()).ok());

        let excess = rotated_files
            .len()
            .saturating_sub(self.config.max_files.saturating_sub(1));
        for oldest in rotated_files.iter().take(excess) {
            fs::remove_file(oldest)?;
        }

        Ok(())
    }
}

/// `logs/app.log` becomes `logs/app.20240101_120000.log`
fn rotated_path(base_path: &Path) -> PathBuf {
    let timestamp = Zoned::now().strftime("%Y%m%d_%H%M%S%.f");
    let stem = base_path.file_stem().unwrap_or_default().to_string_lossy();
    let ext = base_path.extension().unwrap_or_default().to_string_lossy();

    let new_name = if ext.is_empty() {
        format!("{stem}.{timestamp}")
    } else {
        format!("{stem}.{timestamp}.{ext}")
    };

    base_path.with_file_name(new_name)
}

/// Replace `path` with `path.gz`
fn compress_file(path: &Path) -> Result<(), LoggerError> {
    let input = fs::read(path)?;

    let mut compressed = path.as_os_str().to_owned();
    compressed.push(".gz");

    let output = File::create(PathBuf::from(compressed))?;
    let mut encoder = GzEncoder::new(output, Compression::default());
    let compress_err = |e: std::io::Error| LoggerError::compression(format!("{}: {e}", path.display()));
    encoder.write_all(&input).map_err(compress_err)?;
    encoder.finish().map_err(compress_err)?;

    fs::remove_file(path)?;
    Ok(())
}
