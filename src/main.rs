// Beans — serve the chat page and run until interrupted.

use log::{info, warn};

use beans_chat::atoms::error::EngineResult;
use beans_chat::engine::types::ProviderConfig;
use beans_chat::engine::webchat::{self, WebChatConfig};

#[tokio::main]
async fn main() -> EngineResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = WebChatConfig::from_env();
    let provider = ProviderConfig::from_env();

    if provider.api_key.is_none() {
        warn!("OPENAI_API_KEY not set — live mode will echo until a key is entered in the sidebar");
    }

    let addr = webchat::start(config, provider).await?;
    info!("Beans is brewing at http://{}/", addr);

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    webchat::stop();

    Ok(())
}
