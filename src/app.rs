use std::sync::Arc;
use std::time::Instant;

use actix_cors::Cors;
use actix_web::{
    dev::Service,
    http::header::{HeaderName, HeaderValue},
    middleware::Logger,
    web, App, HttpServer,
};
use env_logger::Env;
use log::{debug, info};
use uuid::Uuid;

use crate::{
    config::{Config, Environment, StorageBackend},
    db::Database,
    errors::AppError,
    repositories::{MemoryUrlRepository, PgUrlRepository, UrlRepositoryTrait},
    routes,
    services::{self, RateLimiter},
    types::AppState,
};

// Custom result type for the application
pub type AppResult<T> = Result<T, AppError>;

const REQUEST_ID_HEADER: &str = "x-request-id";

// Setup logging with custom format and configuration
fn setup_logging(config: &Config) -> Result<(), AppError> {
    let log_level = match config.app.environment {
        Environment::Development => config.app.log_level.clone(),
        Environment::Testing => "debug,actix_web=info".to_string(),
        Environment::Production => "info,actix_web=warn".to_string(),
    };

    let env = Env::default()
        .filter_or("RUST_LOG", log_level)
        .write_style_or("RUST_LOG_STYLE", "always");

    env_logger::try_init_from_env(env)
        .map_err(|e| AppError::Logger(format!("Failed to initialize logger: {}", e)))
}

fn cors(environment: &Environment) -> Cors {
    match environment {
        Environment::Development => Cors::permissive(),
        _ => Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST"])
            .allow_any_header()
            .max_age(3600),
    }
}

// Pick the store behind the url mappings
async fn connect_storage(
    config: &Config,
) -> AppResult<(Arc<dyn UrlRepositoryTrait>, Option<Database>)> {
    match config.storage {
        StorageBackend::Postgres => {
            let db = Database::connect(&config.db).await?;
            let repository: Arc<dyn UrlRepositoryTrait> = Arc::new(PgUrlRepository::new(&db));
            Ok((repository, Some(db)))
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage; mappings are lost on restart");
            Ok((Arc::new(MemoryUrlRepository::new()), None))
        }
    }
}

pub async fn server() -> AppResult<()> {
    let config = Config::load()?;

    setup_logging(&config)?;

    let start_time = Instant::now();

    info!("Starting {} v{}", config.app.name, config.app.version);
    info!("Environment: {:?}", config.app.environment);
    info!(
        "Binding to {}:{} with {} workers",
        config.server.host, config.server.port, config.server.workers
    );

    if config.app.environment == Environment::Development {
        debug!("Debug logging enabled");
        debug!("Full configuration: {:?}", config);
    }

    let (repository, database) = connect_storage(&config).await?;

    // One limiter for every worker, otherwise each worker would grant its own quota
    let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
    info!(
        "Rate limit: {} requests per {:?} per client",
        limiter.limit(),
        limiter.window()
    );
    let sweeper = config
        .rate_limit
        .sweep_interval()
        .map(|period| limiter.spawn_sweeper(period));

    let log_format = if config.app.environment == Environment::Production {
        "%a \"%r\" %s %b %T %{X-Request-ID}o"
    } else {
        "%a \"%r\" %s %b %T \"%{Referer}i\" \"%{User-Agent}i\" %{X-Request-ID}o"
    };

    let app_config = config.clone();
    HttpServer::new(move || {
        let repository = Arc::clone(&repository);
        let limiter = Arc::clone(&limiter);
        let app_config = app_config.clone();

        App::new()
            .app_data(web::Data::new(AppState {
                start_time,
                version: app_config.app.version.clone(),
                backend: app_config.storage.as_str(),
                repository: Arc::clone(&repository),
            }))
            .configure(|cfg| services::register(repository, &app_config.shortener, cfg))
            .configure(|cfg| routes::configure_routes(cfg, limiter, &app_config.rate_limit))
            // Tag every response with its own request id
            .wrap_fn(|req, srv| {
                let request_id = Uuid::new_v4().to_string();
                let fut = srv.call(req);
                async move {
                    let mut res = fut.await?;
                    if let Ok(value) = HeaderValue::from_str(&request_id) {
                        res.headers_mut()
                            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
                    }
                    Ok(res)
                }
            })
            .wrap(cors(&app_config.app.environment))
            .wrap(Logger::new(log_format))
    })
    .workers(config.server.workers)
    .bind((config.server.host.to_string(), config.server.port))?
    .run()
    .await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    if let Some(db) = database {
        db.shutdown().await;
    }

    Ok(())
}
