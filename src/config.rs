use std::env;
use std::path::PathBuf;

const ENDPOINT_VAR: &str = "VOTE_ENDPOINT";
const JUDGE_CODE_VAR: &str = "VOTE_JUDGE_CODE";
const DEFAULT_SESSION_FILE: &str = "vote_session.json";

/// Startup configuration, read once. There is no runtime
/// reconfiguration.
pub struct Config {
    pub endpoint: String,
    pub judge_code: String,
    pub session_file: PathBuf,
}

impl Config {
    pub fn load(
        endpoint: Option<String>,
        judge_code: Option<String>,
        session_file: Option<PathBuf>,
    ) -> Self {
        Self {
            endpoint: required(endpoint, ENDPOINT_VAR),
            judge_code: required(judge_code, JUDGE_CODE_VAR),
            session_file: session_file.unwrap_or_else(|| {
                log::info!("no session file given, using {}", DEFAULT_SESSION_FILE);
                PathBuf::from(DEFAULT_SESSION_FILE)
            }),
        }
    }
}

fn required(flag: Option<String>, var: &str) -> String {
    flag.or_else(|| env::var(var).ok())
        .unwrap_or_else(|| panic!("missing configuration: pass a flag or set {}", var))
}
