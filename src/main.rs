use clap::Parser;
use std::io;
use std::process::ExitCode;
use userctl::cli::{self, Cli, Commands};
use userctl::core::config::DataPath;
use userctl::core::service::UserService;

async fn run(cli: Cli) -> io::Result<()> {
    let data_path = DataPath::new(cli.data_path.clone())?;

    if let Commands::Config { command } = &cli.command {
        return cli::handle_config_command(&data_path, command);
    }

    let config = cli::load_config(&data_path, &cli.endpoint)?;
    let service = UserService::new(config);
    match cli.command {
        Commands::List { page, size } => cli::handle_list_command(&service, page, size).await,
        Commands::Get { id } => cli::handle_get_command(&service, id).await,
        Commands::Add(args) => cli::handle_add_command(&service, args).await,
        Commands::Upload { file } => cli::handle_upload_command(&service, &file).await,
        Commands::Config { .. } => unreachable!("handled above"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
