use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use provenance_backend::analysis::{ContentAnalyzer, GeminiAnalyzer};
use provenance_backend::config::{AppConfig, LedgerBackend, StorageBackend};
use provenance_backend::ledger::google_auth::{SHEETS_SCOPE, ServiceAccountAuth, ServiceAccountKey};
use provenance_backend::ledger::{DynamoLedger, LedgerClient, LedgerError, SheetsLedger};
use provenance_backend::pipeline::UploadPipeline;
use provenance_backend::routes::{RouteSettings, configure_routes};
use provenance_backend::storage::{LocalObjectStore, ObjectStore, S3ObjectStore, StorageError};
use std::path::PathBuf;
use std::sync::Arc;

async fn load_aws_config() -> aws_config::SdkConfig {
    let region_provider = RegionProviderChain::default_provider().or_else("us-east-1");
    aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await
}

async fn build_store(
    config: &AppConfig,
) -> Result<(Arc<dyn ObjectStore>, Option<PathBuf>), StorageError> {
    match &config.storage {
        StorageBackend::Local { upload_dir } => {
            let store = LocalObjectStore::new(upload_dir.clone(), &config.base_url).await?;
            log::info!("Storing uploads on disk at {}", store.base_path().display());
            Ok((Arc::new(store) as Arc<dyn ObjectStore>, Some(upload_dir.clone())))
        }
        StorageBackend::S3 {
            bucket,
            public_base_url,
        } => {
            let aws_config = load_aws_config().await;
            let region = aws_config
                .region()
                .map(|r| r.as_ref().to_string())
                .unwrap_or_else(|| "us-east-1".to_string());
            let client = aws_sdk_s3::Client::new(&aws_config);
            let store =
                S3ObjectStore::new(client, bucket.clone(), &region, public_base_url.as_deref())?;
            log::info!("Storing uploads in S3 bucket {} ({})", bucket, region);
            Ok((Arc::new(store) as Arc<dyn ObjectStore>, None))
        }
    }
}

async fn build_ledger(config: &AppConfig) -> Result<Option<Arc<dyn LedgerClient>>, LedgerError> {
    match &config.ledger {
        LedgerBackend::Sheets {
            sheet_id,
            sheet_name,
            credentials_path,
        } => {
            let key = ServiceAccountKey::from_file(credentials_path)?;
            log::info!("Recording uploads to sheet '{}' as {}", sheet_name, key.client_email);
            let auth = ServiceAccountAuth::new(key, SHEETS_SCOPE)?;
            let ledger: Arc<dyn LedgerClient> = Arc::new(SheetsLedger::new(sheet_id, sheet_name, auth));
            Ok(Some(ledger))
        }
        LedgerBackend::DynamoDb { table } => {
            let aws_config = load_aws_config().await;
            let client = aws_sdk_dynamodb::Client::new(&aws_config);
            let ledger: Arc<dyn LedgerClient> = Arc::new(DynamoLedger::new(client, table.clone()));
            Ok(Some(ledger))
        }
        LedgerBackend::None => {
            log::warn!("No ledger configured. Uploads will be stored but not recorded.");
            Ok(None)
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        std::io::Error::other(e)
    })?;

    let (store, upload_dir) = build_store(&config).await.map_err(|e| {
        log::error!("Failed to initialise object store: {}", e);
        std::io::Error::other(e)
    })?;

    let ledger = build_ledger(&config).await.map_err(|e| {
        log::error!("Failed to initialise ledger: {}", e);
        std::io::Error::other(e)
    })?;

    let analyzer = match &config.gemini_api_key {
        Some(api_key) => {
            log::info!("AI analysis enabled with model {}", config.analysis.model);
            Some(Arc::new(GeminiAnalyzer::new(api_key.clone(), config.analysis.model.clone()))
                as Arc<dyn ContentAnalyzer>)
        }
        None => {
            log::warn!("GEMINI_API_KEY not set. Uploads will be recorded without analysis.");
            None
        }
    };

    let pipeline = UploadPipeline::new(store, analyzer, ledger, &config.analysis.prompt);
    let route_settings = RouteSettings {
        upload_dir,
        max_upload_bytes: config.max_upload_bytes,
    };

    let bind_address = format!("0.0.0.0:{}", config.port);
    log::info!("Starting server on {} (public base {})", bind_address, config.base_url);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(web::Data::new(pipeline.clone()))
            .configure(|cfg| configure_routes(cfg, &route_settings))
    })
    .bind(&bind_address)?
    .run()
    .await
}
