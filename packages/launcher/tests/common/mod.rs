#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use tokio::sync::{Mutex, MutexGuard};

use launcher::Config;

static TEST_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Serialize tests that write executables and spawn processes.
pub async fn process_guard() -> MutexGuard<'static, ()> {
    TEST_LOCK.lock().await
}

/// Config using in-memory queues.
pub fn memory_config() -> Config {
    Config::default().with("queue_backend", "memory")
}

/// Create one entry per name in the packages directory under `root`.
pub fn deploy_packages(root: &Path, config: &Config, names: &[&str]) -> io::Result<()> {
    let eggs_dir = root.join(config.eggs_dir());
    std::fs::create_dir_all(&eggs_dir)?;
    for name in names {
        std::fs::create_dir_all(eggs_dir.join(name))?;
    }
    Ok(())
}

/// Write an executable shell script standing in for the Python interpreter.
///
/// It is invoked as `<script> -m <runner> list`.
#[cfg(unix)]
pub fn fake_python(dir: &Path, body: &str) -> io::Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("python");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    Ok(path)
}
