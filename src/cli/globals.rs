use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub api_url: String,
    /// Session persistence target; `None` keeps the session in memory for
    /// the lifetime of the process.
    pub session_file: Option<PathBuf>,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_url: String, session_file: Option<PathBuf>) -> Self {
        Self {
            api_url,
            session_file,
        }
    }
}
