use clap::Parser;
use claudekit_hooks::cli::{Cli, Commands, Dispatcher};
use tracing_subscriber::EnvFilter;

/// Stderr verbosity: `warn` by default, `debug` when `CLAUDEKIT_DEBUG`
/// is set, always overridable through `CLAUDEKIT_LOG`.
fn init_tracing() {
    let default_filter = if std::env::var_os("CLAUDEKIT_DEBUG").is_some() {
        "claudekit_hooks=debug,claudekit_core=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env("CLAUDEKIT_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let dispatcher = Dispatcher::new();

    let code = match cli.command {
        Commands::Run {
            hook_id,
            config,
            timeout,
        } => dispatcher.run(&hook_id, config, timeout).await,
        Commands::List { json } => dispatcher.list(json),
        Commands::Test { hook_id, file } => dispatcher.test(&hook_id, file).await,
        Commands::Stats { session } => dispatcher.stats(session),
        Commands::Enable { hook_id } => dispatcher.set_enabled(&hook_id, true),
        Commands::Disable { hook_id } => dispatcher.set_enabled(&hook_id, false),
    };

    std::process::exit(code);
}
