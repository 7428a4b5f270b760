//! Layered configuration.
//!
//! Tiers, lowest to highest priority, merged field-by-field:
//! 1. **Defaults** - compiled in
//! 2. **Project** - `$CWD/project-tracker/config.yaml`
//! 3. **User** - `~/.project-tracker/config.yaml`
//! 4. **Environment** - see below
//!
//! CLI flags are applied by the binary on top of all tiers.
//!
//! ## Environment Variables
//! - `PROJECT_TRACKER_CONFIG_PATH` - Explicit config file (replaces tiers 2 and 3)
//! - `PROJECT_TRACKER_DB_PATH` - Database path
//! - `PROJECT_TRACKER_HOST` - Bind interface
//! - `PROJECT_TRACKER_PORT` (or `PORT`) - Listen port
//! - `PROJECT_TRACKER_USER_DIR` - User config dir (default: `~/.project-tracker`)
//! - `PROJECT_TRACKER_PROJECT_DIR` - Project config dir (default: `./project-tracker`)

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier};
pub use merge::{deep_merge, deep_merge_all};
pub use types::*;
