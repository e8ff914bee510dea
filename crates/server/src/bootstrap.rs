use std::sync::Arc;

use axum::Router;
use gavel_core::config::{AppConfig, ConfigError};
use gavel_core::valuation::{AppraisalService, CatalogError};
use thiserror::Error;
use tracing::info;

use crate::{appraisals, health};

pub struct Application {
    pub config: AppConfig,
    pub service: Arc<AppraisalService>,
}

impl Application {
    pub fn router(&self) -> Router {
        appraisals::router(self.service.clone()).merge(health::router(self.service.clone()))
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("catalog load failed: {0}")]
    Catalog(#[from] CatalogError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let service = config.build_appraisal_service()?;
    let catalog_source = config
        .valuation
        .catalog_path
        .as_deref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "builtin".to_string());
    info!(
        event_name = "system.bootstrap.catalog_loaded",
        correlation_id = "bootstrap",
        source = %catalog_source,
        labels = service.estimator().catalog().label_count(),
        strategy = %service.estimator().strategy(),
        "valuation catalog loaded"
    );

    Ok(Application { config, service: Arc::new(service) })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use gavel_core::config::{AppConfig, ConfigOverrides, LoadOptions};
    use gavel_core::valuation::PricingStrategy;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::bootstrap::{bootstrap_with_config, Application, BootstrapError};

    fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
        bootstrap_with_config(AppConfig::load(options)?)
    }

    #[test]
    fn bootstrap_fails_fast_on_missing_catalog() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                catalog_path: Some("no/such/catalog.toml".into()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        let message = result.err().expect("error").to_string();
        assert!(message.contains("valuation.catalog_path"));
    }

    #[test]
    fn bootstrap_reports_invalid_catalog() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("catalog.toml");
        fs::write(&path, "[price_ranges]\ncar = { min = 9, max = 1 }\n").expect("write catalog");

        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                catalog_path: Some(path),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        let message = result.err().expect("error").to_string();
        assert!(message.contains("catalog load failed"));
    }

    #[tokio::test]
    async fn integration_smoke_covers_startup_and_appraisal_path() {
        let app = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                strategy: Some(PricingStrategy::Bucketed),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("bootstrap should succeed with defaults");

        let health = app
            .router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("health response");
        assert_eq!(health.status(), StatusCode::OK);

        let response = app
            .router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/appraisals")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"label":"sports_car","confidence":0.95,"condition":"Used"}"#,
                    ))
                    .expect("request"),
            )
            .await
            .expect("appraisal response");
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(payload["category"], "car");
        assert_eq!(payload["breakdown"]["final_price"], 1_575_000);
    }
}
