use availability_proxy::{config::Config, Application};
use service_core::observability::init_tracing;
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.log.level, config.log.file.as_deref().map(Path::new))?;

    let application = Application::build(config).await?;
    application.run_until_stopped().await?;

    Ok(())
}
