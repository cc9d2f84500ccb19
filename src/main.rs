use clap::Parser;
use trellis::chat::{GeneratorLoader, OfflineLoader, OllamaLoader};
use trellis::cli::commands::Cli;
use trellis::cli::handlers::Session;
use trellis::cli::shell;
use trellis::io::config_io;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise warnings only, or debug for this crate with -v
fn init_logging(verbose: bool) {
    let default = if verbose { "warn,trellis=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let mut config = config_io::load_config(cli.config.as_deref(), &cwd)?;
    if let Some(model) = cli.model {
        config.chat.model = model;
    }
    if let Some(endpoint) = cli.endpoint {
        config.chat.endpoint = endpoint;
    }

    let loader: Box<dyn GeneratorLoader> = if cli.offline {
        Box::new(OfflineLoader)
    } else {
        Box::new(OllamaLoader::new(&config.chat.endpoint, &config.chat.model))
    };
    log::debug!("model {} via {}", loader.model_name(), config.chat.endpoint);

    let session = Session::new(&config.chat, loader, cli.json);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(shell::run(session))?;
    Ok(())
}
