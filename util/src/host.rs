//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Name of the environment variable which points to the software root. The
/// `params` and `sessions` directories are resolved relative to this path.
pub const SW_ROOT_ENV_VAR: &str = "LOCAL_PLANNER_ROOT";

/// Get the software root directory.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
