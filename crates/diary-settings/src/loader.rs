//! Settings loading: defaults, optional `.env` file, environment overrides.
//!
//! Override parsing is strict and lenient at once: a malformed value (a port
//! of `"abc"`, a pool size of `0`) is ignored with a warning and the lower
//! layer's value stays in effect.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::{CorsSettings, Settings};

/// Load settings from defaults plus the current process environment.
pub fn load_settings() -> Settings {
    apply_overrides(Settings::default(), |key| std::env::var(key).ok())
}

/// Load a `.env` file into the environment, then [`load_settings`].
///
/// With `path = None` the file is searched for in the current directory and
/// its parents; a missing file is not an error. An explicit `path` must exist.
/// Variables already present in the environment are never replaced.
pub fn load_settings_with_dotenv(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => {
            let _ = dotenvy::from_path(path)?;
            debug!(path = %path.display(), "loaded .env file");
        }
        None => match dotenvy::dotenv() {
            Ok(found) => debug!(path = %found.display(), "loaded .env file"),
            Err(e) if e.not_found() => debug!("no .env file found, using environment only"),
            Err(e) => return Err(e.into()),
        },
    }
    Ok(load_settings())
}

/// Apply environment-style overrides on top of `settings`.
///
/// `lookup` resolves a variable name to its value. Taking it as a closure
/// keeps this function pure, so it can be tested without touching the real
/// process environment.
pub fn apply_overrides<F>(mut settings: Settings, lookup: F) -> Settings
where
    F: Fn(&str) -> Option<String>,
{
    // ── Database ────────────────────────────────────────────────────
    if let Some(v) = read_string(&lookup, "DB_PATH") {
        settings.database.path = Some(PathBuf::from(v));
    }
    if let Some(v) = read_string(&lookup, "DB_NAME") {
        settings.database.name = v;
    }
    if let Some(v) = read_u32(&lookup, "DB_POOL_SIZE", 1, 64) {
        settings.database.pool_size = v;
    }
    if let Some(v) = read_u32(&lookup, "DB_BUSY_TIMEOUT_MS", 0, 600_000) {
        settings.database.busy_timeout_ms = v;
    }

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = read_string(&lookup, "SERVER_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read_u16(&lookup, "SERVER_PORT", 1, 65535) {
        settings.server.port = v;
    }

    // ── CORS ────────────────────────────────────────────────────────
    if let Some(v) = read_string(&lookup, "CORS_ALLOWED_ORIGINS") {
        settings.cors.allowed_origins = CorsSettings::parse_origins(&v);
    }

    if let Some(v) = read_string(&lookup, "LOG_LEVEL") {
        settings.log_level = v;
    }

    settings
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a `u16` within an inclusive range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u32` within an inclusive range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Lookup readers ──────────────────────────────────────────────────────────

fn read_string<F: Fn(&str) -> Option<String>>(lookup: &F, name: &str) -> Option<String> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn read_u16<F: Fn(&str) -> Option<String>>(lookup: &F, name: &str, min: u16, max: u16) -> Option<u16> {
    let val = read_string(lookup, name)?;
    let result = parse_u16_range(&val, min, max);
    if result.is_none() {
        warn!(key = name, value = %val, "invalid u16 setting, ignoring");
    }
    result
}

fn read_u32<F: Fn(&str) -> Option<String>>(lookup: &F, name: &str, min: u32, max: u32) -> Option<u32> {
    let val = read_string(lookup, name)?;
    let result = parse_u32_range(&val, min, max);
    if result.is_none() {
        warn!(key = name, value = %val, "invalid u32 setting, ignoring");
    }
    result
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;
    use crate::errors::SettingsError;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn no_overrides_keeps_defaults() {
        let settings = apply_overrides(Settings::default(), lookup_from(&[]));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn all_overrides_applied() {
        let settings = apply_overrides(
            Settings::default(),
            lookup_from(&[
                ("DB_PATH", "/data/diary.db"),
                ("DB_NAME", "other"),
                ("DB_POOL_SIZE", "4"),
                ("DB_BUSY_TIMEOUT_MS", "250"),
                ("SERVER_HOST", "0.0.0.0"),
                ("SERVER_PORT", "9090"),
                ("CORS_ALLOWED_ORIGINS", "https://a.test, https://b.test"),
                ("LOG_LEVEL", "debug"),
            ]),
        );
        assert_eq!(settings.database.resolved_path(), PathBuf::from("/data/diary.db"));
        assert_eq!(settings.database.name, "other");
        assert_eq!(settings.database.pool_size, 4);
        assert_eq!(settings.database.busy_timeout_ms, 250);
        assert_eq!(settings.server.bind_addr(), "0.0.0.0:9090");
        assert_eq!(
            settings.cors.allowed_origins,
            vec!["https://a.test", "https://b.test"]
        );
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn db_name_drives_file_name() {
        let settings = apply_overrides(Settings::default(), lookup_from(&[("DB_NAME", "journal")]));
        assert_eq!(settings.database.resolved_path(), PathBuf::from("journal.db"));
    }

    #[test]
    fn invalid_numbers_are_ignored() {
        let settings = apply_overrides(
            Settings::default(),
            lookup_from(&[
                ("SERVER_PORT", "not-a-port"),
                ("DB_POOL_SIZE", "0"),
                ("DB_BUSY_TIMEOUT_MS", "-5"),
            ]),
        );
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.database.pool_size, 8);
        assert_eq!(settings.database.busy_timeout_ms, 5_000);
    }

    #[test]
    fn blank_values_are_ignored() {
        let settings = apply_overrides(
            Settings::default(),
            lookup_from(&[("SERVER_HOST", "   "), ("CORS_ALLOWED_ORIGINS", "")]),
        );
        assert_eq!(settings.server.host, "localhost");
        assert_eq!(settings.cors.allowed_origins, vec!["http://localhost:3000"]);
    }

    #[test]
    fn parse_ranges() {
        assert_eq!(parse_u16_range("8080", 1, 65535), Some(8080));
        assert_eq!(parse_u16_range("0", 1, 65535), None);
        assert_eq!(parse_u16_range("70000", 1, 65535), None);
        assert_eq!(parse_u32_range(" 12 ", 1, 64), Some(12));
        assert_eq!(parse_u32_range("65", 1, 64), None);
    }

    #[test]
    fn explicit_missing_dotenv_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_settings_with_dotenv(Some(&dir.path().join("missing.env")));
        assert!(matches!(result, Err(SettingsError::Dotenv(_))));
    }

    #[test]
    fn explicit_dotenv_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "DIARY_SETTINGS_TEST_ONLY=1").unwrap();
        drop(file);

        let settings = load_settings_with_dotenv(Some(&path)).unwrap();
        assert_eq!(std::env::var("DIARY_SETTINGS_TEST_ONLY").as_deref(), Ok("1"));
        assert!(!settings.server.host.is_empty());
    }
}
