// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Tracing runtime control.

use ordermap::OrderMap;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, Registry, prelude::*, reload};

use crate::{LevelFilter, targets::LOG_TARGETS, trace_target};

trace_target!("tracectl", LevelFilter::INFO, &[]);

#[derive(Debug, Error, PartialEq)]
pub enum TracingError {
    #[error("Invalid tracing directive '{0}': expected name=level")]
    BadSyntax(String),
    #[error("Invalid level '{0}'")]
    BadLevel(String),
    #[error("No tracing target or group named '{0}'")]
    Unknown(String),
}

#[derive(Debug, Clone)]
pub struct TargetCfg {
    pub(crate) target: &'static str,
    pub(crate) name: &'static str,
    pub(crate) level: LevelFilter,
    pub(crate) groups: Vec<&'static str>,
}
impl TargetCfg {
    #[must_use]
    pub fn target(&self) -> &'static str {
        self.target
    }
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
    #[must_use]
    pub fn level(&self) -> LevelFilter {
        self.level
    }
    fn matches(&self, key: &str) -> bool {
        self.name == key || self.target == key || self.groups.contains(&key)
    }
}

#[derive(Debug)]
pub(crate) struct TargetCfgDb {
    pub(crate) level: LevelFilter,
    pub(crate) targets: OrderMap<&'static str, TargetCfg>,
}
impl TargetCfgDb {
    fn new(level: LevelFilter) -> Self {
        let mut targets = OrderMap::new();
        for tgt in LOG_TARGETS {
            let cfg = TargetCfg {
                target: tgt.target,
                name: tgt.name,
                level: tgt.level,
                groups: tgt.groups.to_vec(),
            };
            if targets.insert(tgt.target, cfg).is_some() {
                warn!("Tracing target {} declared more than once", tgt.target);
            }
        }
        Self { level, targets }
    }
    fn env_filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::new(self.level.to_string());
        for cfg in self.targets.values() {
            match format!("{}={}", cfg.target, cfg.level).parse() {
                Ok(directive) => filter = filter.add_directive(directive),
                Err(e) => warn!("Skipping tracing target {}: {e}", cfg.target),
            }
        }
        filter
    }
    fn set_level(&mut self, key: &str, level: LevelFilter) -> Result<usize, TracingError> {
        let mut matched = 0;
        for cfg in self.targets.values_mut().filter(|cfg| cfg.matches(key)) {
            cfg.level = level;
            matched += 1;
        }
        if matched == 0 {
            return Err(TracingError::Unknown(key.to_owned()));
        }
        Ok(matched)
    }
}

/// Owner of the process' tracing subscriber and of the per-target levels
pub struct TracingControl {
    db: Mutex<TargetCfgDb>,
    reload_filter: reload::Handle<EnvFilter, Registry>,
}

static TRACING_CTL: OnceLock<TracingControl> = OnceLock::new();

/// Get the process-wide [`TracingControl`], installing the subscriber on first use
pub fn get_trace_ctl() -> &'static TracingControl {
    TRACING_CTL.get_or_init(TracingControl::new)
}

impl TracingControl {
    fn new() -> Self {
        let db = TargetCfgDb::new(LevelFilter::INFO);
        let (filter, reload_filter) = reload::Layer::new(db.env_filter());
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_line_number(true)
            .with_thread_names(true)
            .with_level(true);

        // a subscriber may exist already, e.g. in tests
        if tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .is_err()
        {
            eprintln!("A global tracing subscriber is already installed");
        }
        Self {
            db: Mutex::new(db),
            reload_filter,
        }
    }
    fn db(&self) -> MutexGuard<'_, TargetCfgDb> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
    fn reload(&self, db: &TargetCfgDb) {
        if let Err(e) = self.reload_filter.reload(db.env_filter()) {
            warn!("Failed to reload tracing filter: {e}");
        }
    }
    pub fn init() {
        get_trace_ctl();
    }
    #[must_use]
    pub fn default_level(&self) -> LevelFilter {
        self.db().level
    }
    pub fn set_default_level(&self, level: LevelFilter) {
        let mut db = self.db();
        if db.level != level {
            db.level = level;
            self.reload(&db);
            info!("Default tracing level is now {level}");
        }
    }
    /// Set the level of the targets with the given name, module path or group
    pub fn set_level(&self, key: &str, level: LevelFilter) -> Result<(), TracingError> {
        let mut db = self.db();
        let matched = db.set_level(key, level)?;
        self.reload(&db);
        info!("Tracing level of '{key}' set to {level} ({matched} targets)");
        Ok(())
    }
    pub fn set_level_all(&self, level: LevelFilter) {
        let mut db = self.db();
        db.targets.values_mut().for_each(|cfg| cfg.level = level);
        self.reload(&db);
    }

    /// Parse comma-separated name=level items. Level is one of off,error,warn,info,debug,trace.
    fn parse_config(input: &str) -> Result<Vec<(String, LevelFilter)>, TracingError> {
        input
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| {
                let (key, level) = item
                    .split_once('=')
                    .ok_or_else(|| TracingError::BadSyntax(item.to_owned()))?;
                let level = LevelFilter::from_str(level.trim())
                    .map_err(|_| TracingError::BadLevel(level.trim().to_owned()))?;
                Ok((key.trim().to_owned(), level))
            })
            .collect()
    }

    /// Apply a tracing configuration string. `default=level` sets the level of anything not
    /// registered, `all=level` that of every registered target; any other key names a target
    /// or a group and is applied afterwards, so `all=warn,engine=debug` works as expected.
    pub fn setup_from_string(&self, input: &str) -> Result<(), TracingError> {
        let config = Self::parse_config(input)?;
        for (key, level) in &config {
            match key.as_str() {
                "default" => self.set_default_level(*level),
                "all" => self.set_level_all(*level),
                _ => {}
            }
        }
        for (key, level) in config
            .iter()
            .filter(|(key, _)| key != "default" && key != "all")
        {
            self.set_level(key, *level)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn target(&self, key: &str) -> Option<TargetCfg> {
        self.db()
            .targets
            .values()
            .find(|cfg| cfg.name == key || cfg.target == key)
            .cloned()
    }
    pub fn targets(&self) -> impl Iterator<Item = TargetCfg> {
        self.db().targets.values().cloned().collect::<Vec<_>>().into_iter()
    }
    /// Render the current target table
    #[must_use]
    pub fn dump(&self) -> String {
        self.db().to_string()
    }
}

#[cfg(test)]
mod test {
    use super::{TracingControl, TracingError, get_trace_ctl};
    use crate::{LevelFilter, custom_target};
    use serial_test::serial;

    custom_target!("tracectl-test-a", LevelFilter::DEBUG, &["tracectl-test"]);
    custom_target!("tracectl-test-b", LevelFilter::ERROR, &["tracectl-test"]);

    #[test]
    fn parse_rejects_bad_items() {
        assert_eq!(
            TracingControl::parse_config("store=debug,engine"),
            Err(TracingError::BadSyntax("engine".to_owned()))
        );
        assert_eq!(
            TracingControl::parse_config("store=loud"),
            Err(TracingError::BadLevel("loud".to_owned()))
        );
        let parsed = TracingControl::parse_config(" store=debug , ,grpc=off").unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1], ("grpc".to_owned(), LevelFilter::OFF));
    }

    #[test]
    #[serial]
    fn registered_targets_are_known() {
        let tctl = get_trace_ctl();
        assert!(tctl.target("tracectl").is_some());
        assert_eq!(
            tctl.target("tracectl-test-b").map(|t| t.level()),
            Some(LevelFilter::ERROR)
        );
        assert!(tctl.dump().contains("tracectl-test-a"));
    }

    #[test]
    #[serial]
    fn group_level_change() {
        let tctl = get_trace_ctl();
        tctl.setup_from_string("tracectl-test=warn,tracectl-test-a=trace")
            .unwrap();
        assert_eq!(
            tctl.target("tracectl-test-a").map(|t| t.level()),
            Some(LevelFilter::TRACE)
        );
        assert_eq!(
            tctl.target("tracectl-test-b").map(|t| t.level()),
            Some(LevelFilter::WARN)
        );
        assert_eq!(
            tctl.set_level("no-such-target", LevelFilter::INFO),
            Err(TracingError::Unknown("no-such-target".to_owned()))
        );
    }
}
