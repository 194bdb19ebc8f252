use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::application::ui::help_text;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendName;
use crate::domain::models::BotStep;
use crate::domain::models::RecorderName;
use crate::domain::models::TicketRecord;
use crate::domain::services::SessionStore;
use crate::infrastructure::backends::BackendManager;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

async fn lookup_history(store: &SessionStore) -> Result<Vec<TicketRecord>> {
    if store.history().is_empty() {
        return Ok(vec![]);
    }

    let backend_name = match BackendName::parse(Config::get(ConfigKey::Backend)) {
        Some(name) => name,
        None => bail!(format!("Unknown backend: {}", Config::get(ConfigKey::Backend))),
    };

    let backend = BackendManager::get(backend_name)?;
    let mut tickets = backend.lookup_tickets(store.history()).await?;
    tickets.reverse();

    return Ok(tickets);
}

async fn print_tickets_list() -> Result<()> {
    let store = SessionStore::load(SessionStore::default_path()).await?;
    let tickets = lookup_history(&store).await?;

    if tickets.is_empty() {
        println!("No tickets have been opened from this device yet.");
        return Ok(());
    }

    let lines = tickets
        .iter()
        .map(|ticket| {
            return format!("- (ID: {}) {}", ticket.uuid, ticket.format());
        })
        .collect::<Vec<String>>();

    println!("{}", lines.join("\n"));
    return Ok(());
}

async fn activate_ticket(ticket: &TicketRecord) -> Result<()> {
    let mut store = SessionStore::load(SessionStore::default_path()).await?;
    store
        .activate(&ticket.uuid, &ticket.label, &ticket.category)
        .await?;
    store.set_step(BotStep::Chatting, None).await?;

    return Ok(());
}

async fn open_ticket(ticket_id: &str) -> Result<()> {
    let store = SessionStore::load(SessionStore::default_path()).await?;
    let ticket = lookup_history(&store)
        .await?
        .into_iter()
        .find(|e| return e.uuid == ticket_id || e.label == ticket_id);

    match ticket {
        Some(ticket) => return activate_ticket(&ticket).await,
        None => bail!(format!("Ticket {ticket_id} was not opened from this device")),
    }
}

/// Returns false when there was nothing to pick.
async fn open_ticket_interactive() -> Result<bool> {
    let store = SessionStore::load(SessionStore::default_path()).await?;
    let tickets = lookup_history(&store).await?;

    if tickets.is_empty() {
        println!("No tickets have been opened from this device yet.");
        return Ok(false);
    }

    let ticket_options = tickets
        .iter()
        .map(|ticket| return ticket.format())
        .collect::<Vec<String>>();

    let idx = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Which ticket would you like to resume?")
        .default(0)
        .items(&ticket_options)
        .interact_opt()?;

    match idx {
        Some(idx) => {
            activate_ticket(&tickets[idx]).await?;
            return Ok(true);
        }
        None => return Ok(false),
    }
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

async fn print_state() -> Result<()> {
    let store = SessionStore::load(SessionStore::default_path()).await?;
    print!("{}", serde_yaml::to_string(store.state())?);
    return Ok(());
}

async fn clear_state() -> Result<()> {
    let mut store = SessionStore::load(SessionStore::default_path()).await?;
    store.clear().await?;
    println!("Cleared the active ticket and the ticket history");
    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_state() -> Command {
    return Command::new("state")
        .about("Inspect what is kept between runs.")
        .subcommand(Command::new("show").about("Print the stored active ticket, pre-chat step and ticket history."))
        .subcommand(Command::new("path").about("Print the path of the state file."))
        .subcommand(Command::new("clear").about("Forget the active ticket and the ticket history."));
}

fn subcommand_tickets() -> Command {
    return Command::new("tickets")
        .about("Manage tickets opened from this device.")
        .arg_required_else_help(true)
        .subcommand(Command::new("list").about("List previous tickets with their current status."))
        .subcommand(
            Command::new("open")
                .about("Resume a previous ticket by ID or label. Omit passing an ID to load an interactive selection.")
                .arg(
                    clap::Arg::new("ticket-id")
                        .short('i')
                        .long("id")
                        .help("Ticket ID or label")
                        .required(false),
                ),
        );
}

fn arg_backend() -> Arg {
    return Arg::new(ConfigKey::Backend.to_string())
        .short('b')
        .long(ConfigKey::Backend.to_string())
        .env("CHATDESK_BACKEND")
        .num_args(1)
        .help(format!(
            "The helpdesk backend to talk to. [default: {}]",
            Config::default(ConfigKey::Backend)
        ))
        .value_parser(PossibleValuesParser::new(BackendName::VARIANTS))
        .global(true);
}

fn arg_backend_health_check_timeout() -> Arg {
    return Arg::new(ConfigKey::BackendHealthCheckTimeout.to_string())
        .long(ConfigKey::BackendHealthCheckTimeout.to_string())
        .env("CHATDESK_BACKEND_HEALTH_CHECK_TIMEOUT")
        .num_args(1)
        .help(
            format!("Time to wait in milliseconds before timing out when doing a healthcheck for a backend. [default: {}]", Config::default(ConfigKey::BackendHealthCheckTimeout)),
        )
        .global(true);
}

fn arg_base_url() -> Arg {
    return Arg::new(ConfigKey::BaseURL.to_string())
        .short('u')
        .long(ConfigKey::BaseURL.to_string())
        .env("CHATDESK_BASE_URL")
        .num_args(1)
        .help(format!(
            "Base URL of the helpdesk serving the chat endpoints. [default: {}]",
            Config::default(ConfigKey::BaseURL)
        ))
        .global(true);
}

fn arg_poll_interval() -> Arg {
    return Arg::new(ConfigKey::PollInterval.to_string())
        .long(ConfigKey::PollInterval.to_string())
        .env("CHATDESK_POLL_INTERVAL")
        .num_args(1)
        .help(format!(
            "How often, in milliseconds, the open chat is refreshed from the helpdesk. [default: {}]",
            Config::default(ConfigKey::PollInterval)
        ))
        .global(true);
}

fn arg_recorder() -> Arg {
    return Arg::new(ConfigKey::Recorder.to_string())
        .short('r')
        .long(ConfigKey::Recorder.to_string())
        .env("CHATDESK_RECORDER")
        .num_args(1)
        .help(format!(
            "The audio source used for voice notes. [default: {}]",
            Config::default(ConfigKey::Recorder)
        ))
        .value_parser(PossibleValuesParser::new(RecorderName::VARIANTS))
        .global(true);
}

fn arg_recorder_file() -> Arg {
    return Arg::new(ConfigKey::RecorderFile.to_string())
        .long(ConfigKey::RecorderFile.to_string())
        .env("CHATDESK_RECORDER_FILE")
        .num_args(1)
        .help("Path to a webm file replayed as the microphone by the file recorder.")
        .global(true);
}

fn arg_request_timeout() -> Arg {
    return Arg::new(ConfigKey::RequestTimeout.to_string())
        .long(ConfigKey::RequestTimeout.to_string())
        .env("CHATDESK_REQUEST_TIMEOUT")
        .num_args(1)
        .help(format!(
            "Time to wait in milliseconds for a helpdesk request before giving up. 0 disables the timeout. [default: {}]",
            Config::default(ConfigKey::RequestTimeout)
        ))
        .global(true);
}

fn arg_state_file() -> Arg {
    return Arg::new(ConfigKey::StateFile.to_string())
        .long(ConfigKey::StateFile.to_string())
        .env("CHATDESK_STATE_FILE")
        .num_args(1)
        .help(format!(
            "Where the active ticket and the ticket history are kept between runs. [default: {}]",
            Config::default(ConfigKey::StateFile)
        ))
        .global(true);
}

fn arg_uploads_path() -> Arg {
    return Arg::new(ConfigKey::UploadsPath.to_string())
        .long(ConfigKey::UploadsPath.to_string())
        .env("CHATDESK_UPLOADS_PATH")
        .num_args(1)
        .help(format!(
            "Path prefix under which the helpdesk serves uploaded files and voice notes. [default: {}]",
            Config::default(ConfigKey::UploadsPath)
        ))
        .global(true);
}

fn subcommand_chat() -> Command {
    return Command::new("chat").about("Open the support chat.");
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") || line.starts_with("MENU:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    );

    return Command::new("chatdesk")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(subcommand_chat())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_state())
        .subcommand(subcommand_tickets())
        .arg(arg_backend())
        .arg(arg_backend_health_check_timeout())
        .arg(arg_base_url())
        .arg(arg_poll_interval())
        .arg(arg_recorder())
        .arg(arg_recorder_file())
        .arg(arg_request_timeout())
        .arg(arg_state_file())
        .arg(arg_uploads_path())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("CHATDESK_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        );
}

async fn load(matches: &ArgMatches, subcmd_matches: &ArgMatches) -> Result<()> {
    return Config::load(build(), vec![matches, subcmd_matches]).await;
}

pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("chat", subcmd_matches)) => {
            load(&matches, subcmd_matches).await?;
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        Some(("state", subcmd_matches)) => {
            load(&matches, subcmd_matches).await?;
            match subcmd_matches.subcommand() {
                Some(("show", _)) => print_state().await?,
                Some(("path", _)) => println!("{}", Config::get(ConfigKey::StateFile)),
                Some(("clear", _)) => clear_state().await?,
                _ => subcommand_state().print_long_help()?,
            }

            return Ok(false);
        }
        Some(("tickets", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("list", list_matches)) => {
                load(&matches, list_matches).await?;
                print_tickets_list().await?;
                return Ok(false);
            }
            Some(("open", open_matches)) => {
                load(&matches, open_matches).await?;
                if let Some(ticket_id) = open_matches.get_one::<String>("ticket-id") {
                    open_ticket(ticket_id).await?;
                } else if !open_ticket_interactive().await? {
                    return Ok(false);
                }
            }
            _ => {
                subcommand_tickets().print_long_help()?;
                return Ok(false);
            }
        },
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(true);
}
