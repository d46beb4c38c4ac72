pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "queuebot",
    about = "Queuebot operator CLI",
    long_about = "Inspect configuration, manage brain parameters, and drive the bot queue locally.",
    after_help = "Examples:\n  queuebot doctor --json\n  queuebot brain put /queuebot/slack/access-token xoxb-... --secure\n  queuebot enqueue --channel C1 --user U1 --text '!ping'\n  queuebot poll --batches 3"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config and resolve the configured command apps")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Print the usage document for the configured command apps")]
    Usage,
    #[command(about = "Read and write parameters through the brain", subcommand)]
    Brain(BrainCommand),
    #[command(about = "Send a chat event to the configured queue")]
    Enqueue {
        #[arg(long)]
        channel: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        text: String,
    },
    #[command(about = "Receive and handle batches from the configured queue")]
    Poll {
        #[arg(long, default_value_t = 1, help = "Number of receive rounds to run")]
        batches: u32,
    },
}

#[derive(Debug, Subcommand)]
enum BrainCommand {
    #[command(about = "Print the value stored under a key (empty when missing)")]
    Get { key: String },
    #[command(about = "Store a value under a key")]
    Put {
        key: String,
        value: String,
        #[arg(long, help = "Store as an encrypted SecureString (e.g. the access token)")]
        secure: bool,
    },
    #[command(about = "List parameters stored below a path")]
    List {
        path: String,
        #[arg(long, default_value_t = 10, help = "Maximum entries to return (1-10)")]
        max: usize,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Usage => commands::usage::run(),
        Command::Brain(BrainCommand::Get { key }) => commands::brain::get(&key),
        Command::Brain(BrainCommand::Put { key, value, secure }) => {
            commands::brain::put(&key, &value, secure)
        }
        Command::Brain(BrainCommand::List { path, max }) => commands::brain::list(&path, max),
        Command::Enqueue { channel, user, text } => commands::enqueue::run(&channel, &user, &text),
        Command::Poll { batches } => commands::poll::run(batches),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
