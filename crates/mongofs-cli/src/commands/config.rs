use mongofs_config::MongoFsConfig;

/// Print the effective configuration after file loading and CLI
/// overrides.
pub fn run(config: &MongoFsConfig) -> Result<(), Box<dyn std::error::Error>> {
    print!("{}", serde_yaml::to_string(config)?);
    Ok(())
}
