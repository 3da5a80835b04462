use crate::app::config::AdxConfig;
use anyhow::Error;
use parking_lot::{RwLock, RwLockReadGuard};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// Owns the loaded [`AdxConfig`]. Loaded once at startup, the lock
/// leaves room for reloading without changing callers.
pub struct ConfigManager {
    path: PathBuf,
    cfg: RwLock<AdxConfig>,
    started: AtomicBool,
}

impl ConfigManager {
    pub fn new(cfg_path: PathBuf) -> ConfigManager {
        ConfigManager {
            path: cfg_path,
            cfg: RwLock::new(AdxConfig::default()),
            started: AtomicBool::new(false),
        }
    }

    /// Load the config file, failing on a missing
    /// file or one that does not validate
    pub fn start(&self) -> Result<(), Error> {
        let cfg = AdxConfig::load(&self.path)?;
        *self.cfg.write() = cfg;

        self.started.store(true, Ordering::Release);

        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Read guard on the current config. Calling this before
    /// [`Self::start`] is a startup ordering bug.
    pub fn get(&self) -> RwLockReadGuard<'_, AdxConfig> {
        if !self.is_started() {
            panic!("ConfigManager not started yet but fetching config");
        }

        self.cfg.read()
    }
}
