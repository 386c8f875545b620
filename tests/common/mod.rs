#![allow(dead_code)]

pub mod mock_tts;

use std::path::PathBuf;
use std::process::{Command, Output};
use std::{env, fs};
use tempfile::TempDir;

/// Isolated directories for driving the binary
pub struct TestContext {
    pub temp_dir: TempDir,
    pub store_path: PathBuf,
    pub config_path: PathBuf,
}

impl TestContext {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config_dir = temp_dir.path().join("config");
        fs::create_dir_all(&config_dir).expect("Failed to create config dir");

        let store_path = temp_dir.path().join("translations.json");
        let config_path = config_dir.join("config.json");

        TestContext {
            temp_dir,
            store_path,
            config_path,
        }
    }

    /// Run the CLI against this context's store
    pub fn run(&self, args: &[&str]) -> Output {
        let bin_path = env!("CARGO_BIN_EXE_ibibio-translator");
        Command::new(bin_path)
            .arg("--store")
            .arg(&self.store_path)
            .args(args)
            .env("IBIBIO_TRANSLATOR_CONFIG", &self.config_path)
            .env("XDG_CONFIG_HOME", self.temp_dir.path().join("config"))
            .env("XDG_DATA_HOME", self.temp_dir.path().join("data"))
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to run ibibio-translator")
    }

    pub fn stdout(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "{:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn store_json(&self) -> serde_json::Value {
        let content = fs::read_to_string(&self.store_path).expect("Failed to read store");
        serde_json::from_str(&content).expect("Store is not valid JSON")
    }
}
