use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_env: String,
    pub port: u16,
    pub log_level: String,
    /// `api` serves HTTP directly; `lambda` expects the external gateway
    /// adapter and is rejected at startup in this build.
    pub deploy_mode: String,
    /// `mongo` or `memory`.
    pub data_backend: String,
    pub mongo_dsn: String,
    pub mongo_db: String,
    pub loki_url: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let cfg = config::Config::builder()
            .set_default("app_env", "development")?
            .set_default("port", 8000)?
            .set_default("log_level", "info")?
            .set_default("deploy_mode", "api")?
            .set_default("data_backend", "memory")?
            .set_default("mongo_dsn", "mongodb://127.0.0.1:27017")?
            .set_default("mongo_db", "forms_db")?
            .set_default("loki_url", "http://localhost:3100")?
            .add_source(config::Environment::default().separator("__"))
            .build()?;
        cfg.try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }
}
