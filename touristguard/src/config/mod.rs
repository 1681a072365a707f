//! Configuration for the tracking core and its host.
//!
//! The user-facing file is `~/.touristguard/config.ini`:
//!
//! - [`settings`] - one struct per `[section]`
//! - [`defaults`] - `DEFAULT_*` constants and `ConfigFile::default()`
//! - `parser` / `writer` - INI to struct and back
//!
//! Typed runtime configs are derived with the `ConfigFile::to_*_config()`
//! helpers.
//!
//! # Example
//!
//! ```
//! use touristguard::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! let sampling = config.to_sampling_config();
//! assert_eq!(sampling.sample_interval.as_secs(), 600);
//! ```

pub mod defaults;
mod file;
mod parser;
pub mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::*;
