//! Persistent protection against Growatt account lock-out.
//!
//! The last call time of every throttled function survives restarts in a small JSON file,
//! so that repeated runs within the window do not hammer the discovery endpoints.

use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{executor::run_blocking, prelude::*};

pub const DEFAULT_WINDOW_MINUTES: i64 = 5;

/// Bump together with a migration when the stored format changes.
pub const STORAGE_VERSION: u32 = 1;

const STORAGE_FILE: &str = "growatt_server.api_throttle.json";

#[derive(Default, Serialize, Deserialize)]
struct Storage {
    version: u32,

    /// Function name to the last call time.
    #[serde(default)]
    data: BTreeMap<String, String>,
}

pub struct ThrottleManager {
    path: PathBuf,
    window: TimeDelta,
    data: BTreeMap<String, String>,
}

impl ThrottleManager {
    #[instrument(skip_all, fields(state_dir = %state_dir.display()))]
    pub fn open(state_dir: &Path, window: TimeDelta) -> Result<Self> {
        let path = state_dir.join(STORAGE_FILE);
        let data = match fs::read_to_string(&path) {
            Ok(text) => {
                let storage = serde_json::from_str::<Storage>(&text)
                    .with_context(|| format!("failed to parse `{}`", path.display()))?;
                if storage.version == STORAGE_VERSION {
                    storage.data
                } else {
                    warn!(storage.version, "unsupported throttle storage version, starting over");
                    BTreeMap::new()
                }
            }
            Err(error) if error.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(error) => {
                let path = path.display();
                return Err(error).with_context(|| format!("failed to read `{path}`"));
            }
        };
        debug!(n_entries = data.len(), "loaded");
        Ok(Self { path, window, data })
    }

    /// Time left until the function may be called again.
    pub fn remaining(&self, name: &str, now: DateTime<Utc>) -> Option<TimeDelta> {
        let Some(last_call) = self.data.get(name) else {
            debug!(name, "no previous call recorded, allowing");
            return None;
        };
        let Some(last_call) = parse_timestamp(last_call) else {
            warn!(name, %last_call, "could not parse the last call time, allowing");
            return None;
        };
        let elapsed = now - last_call;
        if elapsed < self.window {
            let remaining = self.window - elapsed;
            warn!(
                name,
                elapsed = %format_wait(elapsed),
                remaining = %format_wait(remaining),
                "throttling",
            );
            Some(remaining)
        } else {
            debug!(name, elapsed = %format_wait(elapsed), "allowing");
            None
        }
    }

    pub fn should_throttle(&self, name: &str) -> bool {
        self.remaining(name, Utc::now()).is_some()
    }

    pub fn record_call(&mut self, name: &str, now: DateTime<Utc>) -> Result {
        let timestamp = now.to_rfc3339_opts(SecondsFormat::Micros, false);
        debug!(name, %timestamp, "recording");
        self.data.insert(name.to_owned(), timestamp);
        self.save()
    }

    /// Run the blocking call unless it has been made within the window.
    ///
    /// The call is recorded before it runs, so a failed call is throttled too.
    pub async fn throttled_call<F, T>(&mut self, name: &str, f: F) -> Result<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let now = Utc::now();
        if let Some(remaining) = self.remaining(name, now) {
            bail!(
                "API calls to `{name}` are rate-limited to prevent account lock-out, retry in {}",
                format_wait(remaining),
            );
        }
        self.record_call(name, now)?;
        run_blocking(f).await
    }

    fn save(&self) -> Result {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create `{}`", parent.display()))?;
        }
        let storage = Storage { version: STORAGE_VERSION, data: self.data.clone() };
        fs::write(&self.path, serde_json::to_string_pretty(&storage)?)
            .with_context(|| format!("failed to write `{}`", self.path.display()))
    }
}

/// RFC 3339 timestamp, or a legacy one without an offset which is taken as UTC.
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Some(timestamp.to_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .into_iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|timestamp| timestamp.and_utc())
}

/// Human-readable wait: `45 seconds`, `1 minute`, `3 minutes`, or `2:05`.
pub fn format_wait(remaining: TimeDelta) -> String {
    let total_seconds = remaining.num_seconds().max(0);
    match (total_seconds / 60, total_seconds % 60) {
        (0, seconds) => format!("{seconds} seconds"),
        (1, 0) => "1 minute".to_owned(),
        (minutes, 0) => format!("{minutes} minutes"),
        (minutes, seconds) => format!("{minutes}:{seconds:02}"),
    }
}
