use crate::sms;
use anyhow::Context;
use std::io::Read;

#[derive(serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bind_address: String,
    pub bind_port: u16,
    pub upload_dir: std::path::PathBuf,
    pub database: registry_db::Config,
    pub sms: sms::Config,
}

/// Reads `./app-config.toml`, then lets the environment override the
/// secrets and the invite link so they never have to live in the file.
pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    let mut configuration = String::with_capacity(4096);
    std::fs::File::open("./app-config.toml")
        .context("unable to open configuration file ./app-config.toml")?
        .read_to_string(&mut configuration)
        .context("unable to read configuration file ./app-config.toml")?;
    let mut config = toml::from_str::<Config>(&configuration)
        .context("unable to parse configuration file ./app-config.toml")?;
    if let Ok(sms_username) = std::env::var("REGISTRY_SMS_USERNAME") {
        config.sms.username = Some(sms_username);
    }
    if let Ok(sms_api_key) = std::env::var("REGISTRY_SMS_API_KEY") {
        config.sms.api_key = Some(sms_api_key);
    }
    if let Ok(invite_link) = std::env::var("REGISTRY_INVITE_LINK") {
        config.sms.invite_link = invite_link;
    }
    Ok(config)
}
