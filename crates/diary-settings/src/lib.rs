//! # diary-settings
//!
//! Configuration for the diary backend, loaded once at startup from three
//! layers (lowest to highest priority):
//!
//! 1. **Compiled defaults**: [`Settings::default()`]
//! 2. **Local `.env` file**: loaded into the process environment, never
//!    replacing variables that are already set
//! 3. **Environment variables**: `DB_*`, `SERVER_*`, `CORS_ALLOWED_ORIGINS`, `LOG_LEVEL`
//!
//! The loaded [`Settings`] value is passed explicitly to whoever needs it;
//! there is no global instance.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{apply_overrides, load_settings, load_settings_with_dotenv};
pub use types::{CorsSettings, DatabaseSettings, ServerSettings, Settings};
