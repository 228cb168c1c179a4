use henchman_core::Config;

const SAMPLE_CONFIG: &str = r#"# henchman configuration
# Command-line flags override these values.

defaults:
  # user: deploy
  # private_keyfile: /home/deploy/.ssh/id_ed25519
  port: 22
  password: false
"#;

pub fn run(path: bool, init: bool) -> anyhow::Result<()> {
    let config_path = Config::default_path();

    if path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config already exists at: {}", config_path.display());
            println!("Remove it first if you want to reinitialize.");
            return Ok(());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&config_path, SAMPLE_CONFIG)?;
        println!("Sample config written to: {}", config_path.display());
        return Ok(());
    }

    // Default: show current config path and effective defaults
    println!("Config path: {}", config_path.display());
    if !config_path.exists() {
        println!("Status:      not found (using built-in defaults)");
        println!("Run `henchman config --init` to create one.");
    }
    let config = if config_path.exists() {
        Config::load_from(&config_path)?
    } else {
        Config::default()
    };
    let d = &config.defaults;
    println!("User:        {}", d.user.as_deref().unwrap_or("$USER"));
    println!("Key file:    {}", d.keyfile().display());
    println!("Port:        {}", d.port);
    println!("Auth:        {}", if d.password { "password" } else { "key" });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn sample_config_parses() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_CONFIG.as_bytes()).unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.defaults.port, 22);
        assert!(config.defaults.user.is_none());
        assert!(!config.defaults.password);
    }
}
