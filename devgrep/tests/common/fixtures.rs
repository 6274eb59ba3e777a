use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

const INVENTORY: &str = r#"[devices.pynet_rtr1]
host = "192.0.2.11"
platform = "cisco_ios"
user = "pyclass"

[devices.pynet_rtr2]
host = "192.0.2.12"
platform = "cisco_ios"
user = "pyclass"

[devices.juniper_srx]
host = "192.0.2.21"
port = 2222
platform = "juniper_junos"

[groups]
cisco = ["pynet_rtr1", "pynet_rtr2"]
"#;

/// An inventory file plus an empty cache directory in a temp dir.
pub struct TestInventory {
    pub dir: TempDir,
    pub inventory: PathBuf,
    pub cache_dir: PathBuf,
}

impl TestInventory {
    pub fn new() -> Self {
        crate::test_log!("FIXTURE: Creating test inventory");

        let dir = TempDir::new().expect("Failed to create temp dir");
        let inventory = dir.path().join("inventory.toml");
        let cache_dir = dir.path().join("cache");
        fs::write(&inventory, INVENTORY).expect("Failed to write inventory");

        Self {
            dir,
            inventory,
            cache_dir,
        }
    }

    /// Seed the cache as a previous live run would have.
    pub fn write_cache(&self, device: &str, content: &str) -> PathBuf {
        fs::create_dir_all(&self.cache_dir).expect("Failed to create cache dir");
        let path = self.cache_dir.join(format!("{device}.txt"));
        fs::write(&path, content).expect("Failed to write cache file");
        path
    }

    /// A devgrep command pointed at this inventory and cache.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_devgrep"));
        for var in [
            "DEVGREP_CONCURRENCY",
            "DEVGREP_TIMEOUT_SECS",
            "DEVGREP_LOG_LEVEL",
            "DEVGREP_LOG_FORMAT",
        ] {
            cmd.env_remove(var);
        }
        cmd.env("DEVGREP_INVENTORY", &self.inventory)
            .env("DEVGREP_CACHE_DIR", &self.cache_dir);
        cmd
    }
}
