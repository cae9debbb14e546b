use config::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub matrix: MatrixSettings,
    pub registry: RegistrySettings,
    pub engine: EngineSettings,
    pub security: SecuritySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone)]
pub struct MatrixSettings {
    pub homeserver_url: String,
    pub user: String,
    pub token: String,
    pub device_id: String,
    // 桥接 Ghost 用户 ID 模板，如 "@_bridge_{id}:fed.example"
    pub user_template: String,
    pub command_prefix: String,
}

#[derive(Deserialize, Clone)]
pub struct RegistrySettings {
    pub path: String, // 不带扩展名，如 "communities"
}

#[derive(Deserialize, Clone)]
pub struct EngineSettings {
    pub scan_deadline_secs: u64,
}

#[derive(Deserialize, Clone)]
pub struct SecuritySettings {
    // 外部警报触发端点要求的 Bearer token
    pub trigger_token: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        let env_map = collect_env_vars();

        let s = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("matrix.homeserver_url", "https://matrix.org")?
            .set_default("matrix.device_id", "FLAREBOT")?
            .set_default("matrix.command_prefix", "!alert")?
            .set_default("registry.path", "communities")?
            .set_default("engine.scan_deadline_secs", 10)?
            .set_default("security.trigger_token", "change_me_please")?
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name(&format!("config.{}", run_mode)).required(false))
            .add_source(config::File::from_str(
                &serde_json::to_string(&env_map)
                    .expect("Environment variables should serialize to JSON"),
                config::FileFormat::Json,
            ))
            .build()?;

        s.try_deserialize()
    }
}

fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with("FLARE_"))
        .map(|(k, v)| {
            let new_key = k
                .trim_start_matches("FLARE_")
                .replace("__", ".")
                .to_lowercase();
            (new_key, v)
        })
        .collect()
}
