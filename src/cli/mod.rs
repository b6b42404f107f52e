use crate::core::{
    config::{ConfigService, DataPath, ServiceConfig},
    models::User,
    service::{UserDirectory, UserService},
    status::code,
    validation::validate_user,
};
use clap::{Args, Parser, Subcommand};
use log::{error, info};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "userctl")]
#[command(about = "A CLI client for the user-management service.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets a custom data path
    #[arg(long, value_name = "FILE")]
    pub data_path: Option<PathBuf>,

    /// Overrides the configured service endpoint
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List users page by page
    List {
        /// The page number to fetch
        #[arg(long, default_value_t = 0)]
        page: u32,
        /// Users per page (defaults to the configured page size)
        #[arg(long)]
        size: Option<u32>,
    },
    /// Show a single user
    Get {
        /// The user's identifier
        id: u64,
    },
    /// Create a new user
    Add(UserArgs),
    /// Upload a CSV of users
    Upload {
        /// Path to the CSV file
        file: PathBuf,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// The key to get
        key: String,
    },
    /// Set a configuration value
    Set {
        /// The key to set
        key: String,
        /// The value to set
        value: String,
    },
}

#[derive(Args)]
pub struct UserArgs {
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    #[arg(long)]
    pub address: String,
    #[arg(long)]
    pub city: String,
    /// Two-letter US state abbreviation
    #[arg(long)]
    pub state: String,
    #[arg(long)]
    pub zip_code: String,
    /// Phone number, (123) 456-7890
    #[arg(long, default_value = "")]
    pub phone: String,
    #[arg(long)]
    pub email: String,
    /// Date of birth, mm/dd/yyyy
    #[arg(long)]
    pub dob: String,
    /// Social security number, 123-45-6789
    #[arg(long)]
    pub ssn: String,
    /// Picture URL
    #[arg(long, default_value = "")]
    pub picture: String,
}

impl From<UserArgs> for User {
    fn from(args: UserArgs) -> Self {
        User {
            id: None,
            first_name: args.first_name,
            last_name: args.last_name,
            address: args.address,
            city: args.city,
            state: args.state,
            zip_code: args.zip_code,
            phone: args.phone,
            email: args.email,
            dob: args.dob,
            ssn: args.ssn,
            picture: args.picture,
        }
    }
}

/// Resolve effective configuration: file values with CLI overrides on top.
pub fn load_config(data_path: &DataPath, endpoint: &Option<String>) -> io::Result<ServiceConfig> {
    let mut config = ConfigService::load_config(data_path)?;
    if let Some(endpoint) = endpoint {
        config.entry_point = endpoint.clone();
        config.validate()?;
    }
    Ok(config)
}

pub async fn handle_list_command(
    service: &UserService,
    page: u32,
    size: Option<u32>,
) -> io::Result<()> {
    let result = service.fetch_users(page, size).await;
    let status = service.latest_status();

    match result {
        Ok(user_page) => {
            if user_page.users.is_empty() {
                println!("No users found on page {page}.");
            }
            for user in &user_page.users {
                let id = user
                    .id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{id:>6}  {} {}  {}  {}, {} {}",
                    user.first_name, user.last_name, user.email, user.city, user.state,
                    user.zip_code
                );
            }
            let info = user_page.page;
            println!(
                "Page {} of {} ({} users total, {} per page)",
                info.number + 1,
                info.total_pages,
                info.total_elements,
                info.size
            );
            Ok(())
        }
        Err(e) => {
            // The hub carries the classified failure; show it to the user.
            error!("Failed to fetch users: {e}");
            println!("❌ {}", status.messages.join(", "));
            Err(e)
        }
    }
}

pub async fn handle_get_command(service: &UserService, id: u64) -> io::Result<()> {
    match service.fetch_user(id).await {
        Ok(user) => {
            println!("{} {} (id {})", user.first_name, user.last_name, id);
            println!("  {}", user.address);
            println!("  {}, {} {}", user.city, user.state, user.zip_code);
            if !user.phone.is_empty() {
                println!("  {}", user.phone);
            }
            println!("  {}", user.email);
            println!("  DOB: {}  SSN: {}", user.dob, user.ssn);
            if !user.picture.is_empty() {
                println!("  {}", user.picture);
            }
            Ok(())
        }
        Err(e) => {
            error!("Failed to fetch user {id}: {e}");
            println!("❌ {}", service.latest_status().messages.join(", "));
            Err(e)
        }
    }
}

pub async fn handle_add_command(service: &UserService, args: UserArgs) -> io::Result<()> {
    let user = User::from(args);
    validate_user(&user)?;

    match service.create_user(user).await {
        Ok(created) => {
            match created.id {
                Some(id) => println!(
                    "Added {} {} with id {id}.",
                    created.first_name, created.last_name
                ),
                None => println!(
                    "Added {} {} (server reported no id).",
                    created.first_name, created.last_name
                ),
            }
            Ok(())
        }
        Err(e) => {
            error!("Failed to add user: {e}");
            println!("❌ {}", service.latest_status().messages.join(", "));
            Err(e)
        }
    }
}

pub async fn handle_upload_command(service: &UserService, file: &PathBuf) -> io::Result<()> {
    // The refetch cue a list consumer would react to. Subscribed before the
    // upload starts so the signal cannot be missed.
    let mut completions = service.completion_signal();
    let mut updates = service.upload_csv(file).await?;

    println!("Uploading {}... (Ctrl-C stops watching, not the upload)", file.display());
    let mut terminal = None;
    loop {
        tokio::select! {
            status = updates.recv() => match status {
                Some(status) => {
                    for message in &status.messages {
                        println!("[{}] {message}", status.status);
                    }
                    let is_terminal = status.status != code::ACCEPTED
                        && status.status != code::PROCESSING;
                    if is_terminal {
                        terminal = Some(status);
                        break;
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                // Observation stops here; the request continues server-side.
                let cancelled = crate::core::status::StatusInfo::cancelled();
                println!("[{}] {}", cancelled.status, cancelled.messages.join(", "));
                return Ok(());
            }
        }
    }

    match terminal {
        Some(status) if status.is_success() => {
            if let Ok(signal) = completions.try_recv() {
                info!(
                    "Upload completed, list consumers should refetch: {}",
                    signal.messages.join(", ")
                );
            }
            println!("✅ Upload complete.");
            Ok(())
        }
        Some(status) => {
            error!("Upload failed: {}", status.messages.join(", "));
            println!("❌ Upload failed.");
            Err(io::Error::other(status.messages.join(", ")))
        }
        None => {
            // Status channel closed without a terminal event.
            Err(io::Error::other("Upload ended without a final status"))
        }
    }
}

pub fn handle_config_command(
    data_path: &DataPath,
    command: &Option<ConfigCommands>,
) -> io::Result<()> {
    match command {
        Some(ConfigCommands::Get { key }) => {
            let config = ConfigService::load_config(data_path)?;
            match key.as_str() {
                "entry_point" => println!("entry_point: {}", config.entry_point),
                "default_page_size" => {
                    println!("default_page_size: {}", config.default_page_size)
                }
                _ => println!("Unknown key: {key}"),
            }
        }
        Some(ConfigCommands::Set { key, value }) => {
            let mut config = ConfigService::load_config(data_path)?;
            match key.as_str() {
                "entry_point" => {
                    config.entry_point = value.clone();
                    ConfigService::save_config(&config, data_path)?;
                    info!("Updated entry_point configuration");
                    println!("entry_point set to: {}", config.entry_point);
                }
                "default_page_size" => {
                    config.default_page_size = value.parse().map_err(|_| {
                        io::Error::new(
                            io::ErrorKind::InvalidInput,
                            format!("'{value}' is not a valid page size"),
                        )
                    })?;
                    ConfigService::save_config(&config, data_path)?;
                    info!("Updated default_page_size configuration");
                    println!("default_page_size set to: {}", config.default_page_size);
                }
                _ => println!("Unknown key: {key}"),
            }
        }
        None => {
            let config = ConfigService::load_config(data_path)?;
            println!("Current Configuration:");
            println!("======================");
            println!("entry_point: {}", config.entry_point);
            println!("default_page_size: {}", config.default_page_size);
            println!();
            println!("Config file: {}", data_path.config_path().display());
        }
    }
    Ok(())
}
