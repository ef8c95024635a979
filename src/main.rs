use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use clap::Parser;
use dogcare::api::SessionLifecycle;
use dogcare::capabilities::{
    ChatResponder, FaqMatcher, HttpImageClassifier, ImageClassifier, UnconfiguredClassifier,
};
use dogcare::cli::{commands::{Cli, Commands}, run_cli};
use dogcare::config::AppConfig;
use dogcare::llm::ProviderFactory;
use dogcare::report::ReportRenderer;
use dogcare::session::SessionStore;
use tracing::{error, info, warn};

fn build_lifecycle(config: &AppConfig) -> Result<SessionLifecycle, String> {
    let store = SessionStore::new(&config.storage.sessions_dir)
        .map_err(|e| format!("Failed to open session store: {}", e))?;
    let renderer = ReportRenderer::new(&config.storage.reports_dir)
        .map_err(|e| format!("Failed to prepare reports directory: {}", e))?;

    let faq = FaqMatcher::from_path(&config.chat.faq_path)
        .map_err(|e| format!("Failed to load FAQ: {}", e))?;
    let mut responder = ChatResponder::new(Arc::new(faq), config.chat.min_score);
    let llm = config
        .llm
        .as_ref()
        .and_then(|llm_config| ProviderFactory::create(llm_config).map(|p| (p, llm_config)));
    match llm {
        Some((llm, llm_config)) => {
            info!("Dynamic answers enabled via {}", llm.name());
            responder = responder
                .with_llm(
                    llm,
                    config.chat.system_prompt.clone(),
                    config.chat.history_window,
                )
                .with_sampling(llm_config.temperature, llm_config.max_tokens);
        }
        None => info!("No LLM configured, answering from the FAQ only"),
    }

    let classifier: Arc<dyn ImageClassifier> = match &config.vision.endpoint {
        Some(endpoint) if !endpoint.is_empty() => Arc::new(HttpImageClassifier::new(endpoint.clone())),
        _ => {
            warn!("No vision endpoint configured, image uploads will fail");
            Arc::new(UnconfiguredClassifier)
        }
    };

    let lifecycle = SessionLifecycle::new(
        Arc::new(store),
        renderer,
        responder,
        classifier,
        &config.storage.uploads_dir,
    )
    .map_err(|e| format!("Failed to prepare uploads directory: {}", e))?;

    Ok(lifecycle
        .with_dog_threshold(config.vision.dog_threshold)
        .with_max_upload_bytes(config.vision.max_upload_bytes))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if !matches!(cli.command, Commands::Serve) {
        run_cli(cli.command, cli.config);
        return Ok(());
    }

    info!("Starting Dog Health AI server...");

    let config = match AppConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let lifecycle = match build_lifecycle(&config) {
        Ok(l) => web::Data::new(l),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let host = config.server.host.clone();
    let port = config.server.port;

    info!("Server listening on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(lifecycle.clone())
            .configure(dogcare::api::routes::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
