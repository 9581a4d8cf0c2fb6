use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "hiit")
    }

    /// Where the settings record lives
    pub fn config_dir() -> Option<PathBuf> {
        Self::project().map(|pd| pd.config_dir().to_path_buf())
    }

    /// Log output goes under $HOME/.local/state/hiit when HOME is set
    pub fn log_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join("hiit"))
        } else {
            Self::project().map(|pd| pd.data_local_dir().to_path_buf())
        }
    }
}
