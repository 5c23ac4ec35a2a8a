//! Settings loading for the casita hub
//!
//! One YAML file configures the whole process: bridge endpoint and token,
//! classifier timing, the settle delay, and the button binding table. The
//! bond token can also come from the `CASITA_BOND_TOKEN` environment
//! variable so it stays out of the file.

mod error;
mod loader;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load, load_str, BOND_TOKEN_ENV};
pub use settings::{
    ApplicationSettings, BondSettings, DispatchSettings, GestureSettings, Settings,
};
