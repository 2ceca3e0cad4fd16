use crate::config::LoggingConfig;
use crate::error_buffer::{ErrorBuffer, ErrorBufferLayer};
use crate::telegram::AlertLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging with the error ring buffer, optional Telegram alerts,
/// and optional rolling file output.
pub fn init(config: &LoggingConfig, error_buffer: ErrorBuffer, alert_layer: Option<AlertLayer>) {
    // Default to info level; override via RUST_LOG
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(ErrorBufferLayer::new(error_buffer))
        .with(alert_layer);

    if config.enabled {
        use std::fs;
        use tracing_appender::rolling;

        if let Err(e) = fs::create_dir_all(&config.directory) {
            eprintln!("Failed to create log directory {}: {}", config.directory, e);
        }

        cleanup_old_logs(config);

        let file_appender = match config.rotation.as_str() {
            "hourly" => rolling::hourly(&config.directory, &config.file_prefix),
            "never" => rolling::never(&config.directory, &config.file_prefix),
            _ => rolling::daily(&config.directory, &config.file_prefix),
        };

        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false),
            )
            .init();

        // The non_blocking writer stops flushing once its guard drops.
        // The server runs until process exit, so leaking it is fine.
        std::mem::forget(guard);
    } else {
        subscriber.init();
    }
}

/// Delete the oldest log files once the retention count is exceeded.
pub fn cleanup_old_logs(config: &LoggingConfig) {
    use std::fs;

    if config.max_files == 0 {
        return;
    }

    let log_dir = std::path::Path::new(&config.directory);
    if !log_dir.exists() {
        return;
    }

    let mut log_files: Vec<_> = match fs::read_dir(log_dir) {
        Ok(entries) => entries
            .filter_map(|entry_res| {
                let entry = entry_res.ok()?;
                let metadata = entry.metadata().ok()?;

                if !metadata.is_file() {
                    return None;
                }

                let file_name = entry.file_name();
                let name = file_name.to_str()?;

                if !name.starts_with(&config.file_prefix) {
                    return None;
                }

                let modified = metadata.modified().ok()?;
                Some((entry.path(), modified))
            })
            .collect(),
        Err(e) => {
            eprintln!("Failed to read log directory: {}", e);
            return;
        }
    };

    // Newest first, so anything past max_files is the oldest
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    for (path, _) in log_files.iter().skip(config.max_files as usize) {
        if let Err(e) = fs::remove_file(path) {
            eprintln!("Failed to delete log file {:?}: {}", path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    #[test]
    fn cleanup_keeps_newest_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            enabled: true,
            directory: dir.path().to_str().unwrap().to_string(),
            file_prefix: "skinai-server".to_string(),
            rotation: "daily".to_string(),
            max_files: 2,
        };

        for i in 0..4 {
            let path = dir.path().join(format!("skinai-server.2026-08-0{}", i + 1));
            let mut f = File::create(&path).unwrap();
            writeln!(f, "log {}", i).unwrap();
            // Stagger mtimes so the sort order is deterministic
            std::thread::sleep(std::time::Duration::from_millis(20));
        }

        cleanup_old_logs(&config);

        let remaining = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(remaining, 2);
    }

    #[test]
    fn cleanup_ignores_unrelated_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            enabled: true,
            directory: dir.path().to_str().unwrap().to_string(),
            file_prefix: "skinai-server".to_string(),
            rotation: "daily".to_string(),
            max_files: 1,
        };

        File::create(dir.path().join("notes.txt")).unwrap();
        cleanup_old_logs(&config);

        assert!(dir.path().join("notes.txt").exists());
    }
}
