use clap::Parser;
use roundlord::cli::{consolidate, run, status, Cli, Commands};
use roundlord::config::Config;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => {
            let config = load_config(&args.config);
            run::execute(args, config).await
        }
        Commands::Status(args) => {
            let config = load_config(&args.config);
            status::execute(config).await
        }
        Commands::Consolidate(args) => {
            let config = load_config(&args.config);
            consolidate::execute(config, args.round).await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_config(path: &std::path::Path) -> Config {
    match Config::load(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    }
}
