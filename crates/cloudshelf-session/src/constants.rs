//! Session constants.

/// Channel buffer size for gateway results and timer events.
pub const EVENT_CHANNEL_SIZE: usize = 64;

/// Directory name under the user config dir.
pub const CONFIG_DIR_NAME: &str = "cloudshelf";

/// Settings file name.
pub const SETTINGS_FILE_NAME: &str = "settings.toml";
