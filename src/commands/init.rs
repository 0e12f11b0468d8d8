use crate::config::CONFIG_FILE_NAME;
use anyhow::Result;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG: &str = r#"# implmap configuration

[analysis]
include_tests = false
position_segments = 3
parallel = true
jobs = 0

[ignore]
patterns = [
    "**/mocks/**",
]

[output]
format = "json"
"#;

pub fn init_config(force: bool) -> Result<()> {
    let path = write_default_config(Path::new("."), force)?;
    println!("Created {}", path.display());
    Ok(())
}

pub fn write_default_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)?;
    Ok(config_path)
}
