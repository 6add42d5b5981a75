use anyhow::Result;
use std::path::PathBuf;

const HOMEWATCH_DIR: &str = ".homewatch";
const DB_FILE: &str = "homewatch.db";
const CONFIG_FILE: &str = "config.toml";
const SOCKET_FILE: &str = "homewatch.sock";
const LOGS_DIR: &str = "logs";

/// Environment variable to override the Homewatch directory.
pub const HOMEWATCH_DIR_ENV: &str = "HOMEWATCH_DIR";

/// Environment variable to override the database path.
pub const DB_PATH_ENV: &str = "HOMEWATCH_DB_PATH";

/// Resolve the Homewatch directory.
/// Priority: HOMEWATCH_DIR env var > ~/.homewatch/
pub fn resolve_homewatch_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(HOMEWATCH_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|h| h.join(HOMEWATCH_DIR))
        .ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))
}

/// Ensure the Homewatch directory exists and return its path.
pub fn ensure_homewatch_dir() -> Result<PathBuf> {
    let dir = resolve_homewatch_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Database path. Priority: HOMEWATCH_DB_PATH > ~/.homewatch/homewatch.db
pub fn database_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(DB_PATH_ENV)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }
    Ok(resolve_homewatch_dir()?.join(DB_FILE))
}

/// CLI config file: ~/.config/homewatch/config.toml
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("homewatch").join(CONFIG_FILE))
}

/// Daemon IPC socket: ~/.homewatch/homewatch.sock
pub fn socket_path() -> Result<PathBuf> {
    Ok(ensure_homewatch_dir()?.join(SOCKET_FILE))
}

/// Get the logs directory: ~/.homewatch/logs/
pub fn logs_dir() -> Result<PathBuf> {
    let dir = resolve_homewatch_dir()?.join(LOGS_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Tests mutate process-wide env vars.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_dir_override() {
        let _guard = ENV_LOCK.lock().unwrap();
        let temp = tempfile::tempdir().unwrap();
        unsafe {
            std::env::set_var(HOMEWATCH_DIR_ENV, temp.path());
            std::env::remove_var(DB_PATH_ENV);
        }

        assert_eq!(resolve_homewatch_dir().unwrap(), temp.path());
        assert_eq!(database_path().unwrap(), temp.path().join(DB_FILE));
        assert_eq!(socket_path().unwrap(), temp.path().join(SOCKET_FILE));
        assert!(logs_dir().unwrap().is_dir());

        unsafe {
            std::env::remove_var(HOMEWATCH_DIR_ENV);
        }
    }

    #[test]
    fn test_config_path_ignores_data_dir() {
        let _guard = ENV_LOCK.lock().unwrap();
        let temp = tempfile::tempdir().unwrap();
        unsafe {
            std::env::set_var(HOMEWATCH_DIR_ENV, temp.path());
        }

        if let Some(path) = config_path() {
            assert!(path.ends_with("homewatch/config.toml"));
            assert!(!path.starts_with(temp.path()));
        }

        unsafe {
            std::env::remove_var(HOMEWATCH_DIR_ENV);
        }
    }

    #[test]
    fn test_db_path_override() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var(DB_PATH_ENV, "/tmp/custom.db");
        }
        assert_eq!(database_path().unwrap(), PathBuf::from("/tmp/custom.db"));
        unsafe {
            std::env::remove_var(DB_PATH_ENV);
        }
    }
}
