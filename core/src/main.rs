use anyhow::{Context, Result};

use portgate::{cli::options_from_args, config::Config, logging::init_tracing, server};

#[tokio::main]
async fn main() -> Result<()> {
    let options = options_from_args()?;
    let config = Config::load(&options.config_path).with_context(|| {
        format!("failed to load config from {}", options.config_path.display())
    })?;

    if options.list_evaluators {
        let service = server::assemble_service(&config)?;
        let cache = service.orchestrator().cache();
        for descriptor in cache.get_or_discover(&config.discovery.search_path).iter() {
            println!("{descriptor}");
        }
        return Ok(());
    }

    let _logging = init_tracing(&config.logging)?;
    server::run(config).await
}
