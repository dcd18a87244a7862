use chrono::Local;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use clinicbot::config::AppConfig;
use clinicbot::console;
use clinicbot::db;
use clinicbot::models::Session;
use clinicbot::services::ai::ollama::OllamaProvider;
use clinicbot::services::ai::openai::OpenAiProvider;
use clinicbot::services::ai::LlmProvider;
use clinicbot::services::scheduling::BookingContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // stdout carries the conversation, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env();
    config.validate()?;

    let mut conn = db::init_db(&config.database_url)?;

    let llm: Box<dyn LlmProvider> = match config.llm_provider.as_str() {
        "ollama" => {
            tracing::info!("using Ollama LLM provider (url: {})", config.ollama_url);
            Box::new(OllamaProvider::new(
                config.ollama_url.clone(),
                config.ollama_model.clone(),
                config.temperature,
                config.llm_timeout_secs,
            )?)
        }
        _ => {
            tracing::info!("using OpenAI-compatible LLM provider (model: {})", config.openai_model);
            Box::new(OpenAiProvider::new(
                config.openai_api_key.clone(),
                config.openai_model.clone(),
                config.openai_base_url.clone(),
                config.temperature,
                config.llm_timeout_secs,
            )?)
        }
    };

    let mut ctx = BookingContext::load(&conn, config.validation_mode, Local::now().date_naive())?;
    tracing::info!(
        mode = ctx.mode.as_str(),
        doctors = ctx.roster.len(),
        "booking context loaded"
    );

    let mut session = Session::new(ctx.system_prompt());

    console::run(
        llm.as_ref(),
        &mut conn,
        &mut ctx,
        &mut session,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;

    Ok(())
}
