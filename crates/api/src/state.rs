use std::sync::Arc;

use formsrv_domain::ports::answers::AnswerRepository;
use formsrv_domain::ports::forms::FormRepository;
use formsrv_infra::config::AppConfig;
use formsrv_infra::db::{MongoAdapter, MongoConfig};
use formsrv_infra::loki::LokiShipper;
use formsrv_infra::repositories::{
    InMemoryAnswerRepository, InMemoryFormRepository, MongoAnswerRepository, MongoFormRepository,
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub forms: Arc<dyn FormRepository>,
    pub answers: Arc<dyn AnswerRepository>,
    pub loki: Option<LokiShipper>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let (forms, answers): (Arc<dyn FormRepository>, Arc<dyn AnswerRepository>) =
            if config.data_backend.eq_ignore_ascii_case("mongo") {
                let adapter = MongoAdapter::connect(&MongoConfig::from_app_config(&config)).await?;
                (
                    Arc::new(MongoFormRepository::new(&adapter)),
                    Arc::new(MongoAnswerRepository::new(&adapter)),
                )
            } else {
                (
                    Arc::new(InMemoryFormRepository::new()),
                    Arc::new(InMemoryAnswerRepository::new()),
                )
            };

        // Error envelopes are mirrored to Loki outside production only.
        let loki = (!config.is_production()).then(|| LokiShipper::new(&config));

        Ok(Self {
            config,
            forms,
            answers,
            loki,
        })
    }

    #[allow(dead_code)]
    pub fn with_repositories(
        config: AppConfig,
        forms: Arc<dyn FormRepository>,
        answers: Arc<dyn AnswerRepository>,
    ) -> Self {
        Self {
            config,
            forms,
            answers,
            loki: None,
        }
    }
}
