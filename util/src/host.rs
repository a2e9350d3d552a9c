//! Host environment utility functions

use std::path::PathBuf;

/// Name of the environment variable giving the software root directory.
pub const SW_ROOT_ENV_VAR: &str = "HEADTRACK_SW_ROOT";

/// Get the software root directory from the environment.
///
/// Sessions and parameter files are located relative to this directory.
pub fn get_headtrack_sw_root() -> Result<PathBuf, std::env::VarError> {
    std::env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
