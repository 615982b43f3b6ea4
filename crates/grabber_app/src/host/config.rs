use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use engine_logging::engine_info;
use grabber_core::GrabParams;
use grabber_engine::Credentials;
use serde::Deserialize;
use url::Url;

use super::logging::LogDestination;

pub(crate) const DEFAULT_RUN_FILE: &str = "grabber.ron";

/// Session captured by the login flow, as handed to the grabber.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SessionFile {
    #[serde(default)]
    bearer_token: String,
    #[serde(default)]
    cookies: BTreeMap<String, String>,
    #[serde(default)]
    user_agent: String,
    #[serde(default)]
    target_site: Option<String>,
}

impl SessionFile {
    pub(crate) fn into_credentials(self) -> anyhow::Result<Credentials> {
        let target_site = self
            .target_site
            .as_deref()
            .map(Url::parse)
            .transpose()
            .context("session target_site is not a valid URL")?;
        Ok(Credentials {
            bearer_token: self.bearer_token,
            cookies: self.cookies,
            user_agent: self.user_agent,
            target_site,
        })
    }
}

/// Everything one grabbing run needs. Read only; the app never writes it back.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RunFile {
    #[serde(default)]
    pub(crate) session: SessionFile,
    pub(crate) params: GrabParams,
    /// Stop automatically after this many seconds; otherwise wait for Enter.
    #[serde(default)]
    pub(crate) run_for_secs: Option<u64>,
    #[serde(default)]
    pub(crate) log: LogDestination,
}

pub(crate) fn load_run_file(path: &Path) -> anyhow::Result<RunFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read run file {}", path.display()))?;
    let run: RunFile = ron::from_str(&content)
        .with_context(|| format!("failed to parse run file {}", path.display()))?;
    engine_info!("Loaded run file from {:?}", path);
    Ok(run)
}
