use clap::Parser;
use smart_rewriter::cli::commands::{
    ConfigChanges, build_rewriter, cmd_add_mode, cmd_config, cmd_models, cmd_modes, cmd_rewrite,
    cmd_status,
};
use smart_rewriter::cli::config::{
    Cli, Commands, env_filter, load_config, log_subscriber, resolve_overrides,
};
use tracing::warn;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Installed before any file is read so load warnings reach stderr. The
    // persisted debug flag can only raise the level once the store is open.
    let (subscriber, filter_handle) = log_subscriber(cli.verbose, std::io::stderr);
    subscriber.init();

    let config = load_config(cli.config.as_deref());

    // Resolve settings: CLI > config file > persisted store > defaults
    let overrides = resolve_overrides(&cli, &config);
    let rewriter = build_rewriter(&overrides);

    if rewriter.config().debug && cli.verbose < 2 {
        if let Err(e) = filter_handle.reload(env_filter(2)) {
            warn!("could not raise log level for debug mode: {}", e);
        }
    }

    match cli.command {
        Commands::Rewrite {
            page,
            element,
            mode,
            url,
            output,
        } => {
            cmd_rewrite(
                &rewriter,
                &page,
                &element,
                mode.as_deref(),
                url.as_deref(),
                output.as_deref(),
            )
            .await?;
        }
        Commands::Models => cmd_models(&rewriter).await?,
        Commands::Status => {
            if !cmd_status(&rewriter).await {
                std::process::exit(1);
            }
        }
        Commands::Modes => cmd_modes(&rewriter),
        Commands::AddMode {
            name,
            prompt,
            description,
        } => cmd_add_mode(&rewriter, &name, &prompt, description.as_deref())?,
        Commands::Config {
            enable,
            disable,
            endpoint,
            model,
            default_mode,
            debug,
        } => {
            let enabled = match (enable, disable) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            cmd_config(
                &rewriter,
                ConfigChanges {
                    enabled,
                    endpoint,
                    model,
                    default_mode,
                    debug,
                },
            )?;
        }
    }

    Ok(())
}
