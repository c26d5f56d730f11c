//! Layered configuration.
//!
//! Tiers, lowest priority first, merged field by field:
//! 1. **Defaults** - [`Config::default`]
//! 2. **Project** - `$CWD/task-deps/config.yaml`
//! 3. **User** - `~/.task-deps/config.yaml`
//! 4. **Environment** - see below
//!
//! Command-line flags are applied by the binary on top of the result.
//!
//! ## Environment Variables
//! - `TASK_DEPS_CONFIG_PATH` - Explicit config file (replaces project and user tiers)
//! - `TASK_DEPS_DB_PATH` - Database path
//! - `TASK_DEPS_PORT` - HTTP port
//! - `TASK_DEPS_USER_DIR` - User config dir (default: `~/.task-deps`)
//! - `TASK_DEPS_PROJECT_DIR` - Project config dir (default: `./task-deps`)

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier};
pub use merge::{deep_merge, deep_merge_all};
pub use types::*;
