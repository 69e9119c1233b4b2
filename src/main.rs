use anyhow::Result;
use clap::Parser;
use table_keys::{Cli, Commands, commands, logging};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init();

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    if let Some(threads) = cli.threads {
        builder.worker_threads(threads);
    }
    let runtime = builder.enable_all().thread_name("table-keys").build()?;

    runtime.block_on(async move {
        match cli.command {
            Commands::Scan(args) => commands::scan::run(args).await,
            Commands::Peek(args) => commands::peek::run(args).await,
            Commands::Completions { shell } => {
                Commands::generate_completions(shell);
                Ok(())
            }
        }
    })
}
