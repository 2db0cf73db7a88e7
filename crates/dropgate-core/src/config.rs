//! Configuration module
//!
//! Engine settings loaded from the environment with per-field defaults. The
//! type policy itself lives in [`crate::policy`]; this module carries the
//! operational knobs: folder names, the destination deny-list, the user
//! allow-list, and the prompt/progress parameters.

use std::env;

use anyhow::anyhow;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Name of the root folder under which destinations live.
    pub root_folder_name: String,
    /// Destination names hidden from selection.
    pub excluded_folders: Vec<String>,
    /// Folder under the root holding the audit spreadsheet.
    pub statistics_folder: String,
    /// Name of the audit spreadsheet.
    pub statistics_file: String,
    /// Users allowed to upload; checked only when `use_allowed_users`.
    pub allowed_users: Vec<i64>,
    pub use_allowed_users: bool,
    /// Minimum seconds between destination prompts for one session.
    pub prompt_throttle_secs: u64,
    /// Fixed offset applied to the execution clock for dated folders and
    /// audit timestamps, in hours.
    pub timezone_offset_hours: i32,
    /// Transport ceiling for video-slot deliveries, in megabytes.
    pub video_transport_limit_mb: f64,
    /// Glyph width of the textual progress bar.
    pub progress_bar_width: usize,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        const PROMPT_THROTTLE_SECS: u64 = 5;
        const TIMEZONE_OFFSET_HOURS: i32 = 3;
        const VIDEO_TRANSPORT_LIMIT_MB: f64 = 20.0;
        const PROGRESS_BAR_WIDTH: usize = 20;

        let excluded_folders = env::var("EXCLUDED_FOLDERS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let allowed_users = env::var("ALLOWED_USERS")
            .unwrap_or_default()
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse::<i64>()
                    .map_err(|_| anyhow!("ALLOWED_USERS must be a comma-separated list of user ids"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            root_folder_name: env::var("ROOT_FOLDER_NAME").unwrap_or_else(|_| "Upload".to_string()),
            excluded_folders,
            statistics_folder: env::var("STATISTICS_FOLDER")
                .unwrap_or_else(|_| "Statistics".to_string()),
            statistics_file: env::var("STATISTICS_FILE")
                .unwrap_or_else(|_| "Upload statistics".to_string()),
            allowed_users,
            use_allowed_users: env::var("USE_ALLOWED_USERS")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(false),
            prompt_throttle_secs: env::var("PROMPT_THROTTLE_SECS")
                .unwrap_or_else(|_| PROMPT_THROTTLE_SECS.to_string())
                .parse()
                .unwrap_or(PROMPT_THROTTLE_SECS),
            timezone_offset_hours: env::var("TIMEZONE_OFFSET_HOURS")
                .unwrap_or_else(|_| TIMEZONE_OFFSET_HOURS.to_string())
                .parse()
                .unwrap_or(TIMEZONE_OFFSET_HOURS),
            video_transport_limit_mb: env::var("VIDEO_TRANSPORT_LIMIT_MB")
                .unwrap_or_else(|_| VIDEO_TRANSPORT_LIMIT_MB.to_string())
                .parse()
                .unwrap_or(VIDEO_TRANSPORT_LIMIT_MB),
            progress_bar_width: env::var("PROGRESS_BAR_WIDTH")
                .unwrap_or_else(|_| PROGRESS_BAR_WIDTH.to_string())
                .parse()
                .unwrap_or(PROGRESS_BAR_WIDTH),
        })
    }

    /// Whether a user may submit uploads.
    pub fn user_allowed(&self, user_id: i64) -> bool {
        !self.use_allowed_users || self.allowed_users.contains(&user_id)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            root_folder_name: "Upload".into(),
            excluded_folders: Vec::new(),
            statistics_folder: "Statistics".into(),
            statistics_file: "Upload statistics".into(),
            allowed_users: Vec::new(),
            use_allowed_users: false,
            prompt_throttle_secs: 5,
            timezone_offset_hours: 3,
            video_transport_limit_mb: 20.0,
            progress_bar_width: 20,
        }
    }
}
