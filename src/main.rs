use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tikitly_support::{
    config::Config,
    logging::{init_logging, LogTarget},
    ui::{self, conversation::SupportPanel},
    ChatEvent, ResponseMode, Role, SubmitOutcome, SupportClient, SupportDriver,
};
use tokio::sync::broadcast;

#[derive(Parser)]
#[command(name = "tikitly")]
#[command(version)]
#[command(about = "Tikitly support assistant in your terminal", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.tikitly/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Base URL of the support backend
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    /// How answers are delivered
    #[arg(long, global = true, value_enum)]
    mode: Option<ResponseMode>,

    /// More log output (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the support widget (default)
    Chat {
        /// Start with the panel open
        #[arg(long)]
        open: bool,
    },
    /// Ask one question and print the answer
    Ask {
        /// The question to ask
        #[arg(required_unless_present = "quick", conflicts_with = "quick")]
        question: Option<String>,
        /// Ask common question number N instead (see `tikitly quick`)
        #[arg(long, value_name = "N")]
        quick: Option<usize>,
    },
    /// List the common questions
    Quick,
    /// Show the effective configuration
    Config {
        /// Also write it to the config file
        #[arg(long)]
        write: bool,
    },
}

fn load_config(cli: &Cli) -> Result<(PathBuf, Config)> {
    let (path, mut config) = match &cli.config {
        Some(path) => {
            let mut config = Config::load_from(path)?;
            config.apply_env();
            (path.clone(), config)
        }
        None => (Config::default_path()?, Config::load()?),
    };
    if let Some(url) = &cli.api_url {
        config.api_url = url.clone();
    }
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    Ok((path, config))
}

fn build_driver(config: &Config) -> Result<SupportDriver<SupportClient>> {
    let client = SupportClient::new(config).context("Failed to create HTTP client")?;
    Ok(SupportDriver::new(client, config.mode).with_quick_actions(config.ui.quick_actions.clone()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (path, config) = load_config(&cli)?;

    let interactive = matches!(cli.command, None | Some(Commands::Chat { .. }));
    let target = if interactive {
        LogTarget::default_file()?
    } else {
        LogTarget::Stderr
    };
    init_logging(&target, cli.verbose)?;

    match cli.command {
        None => run_chat(&config, false).await,
        Some(Commands::Chat { open }) => run_chat(&config, open).await,
        Some(Commands::Ask { question, quick }) => run_ask(&config, question, quick).await,
        Some(Commands::Quick) => {
            println!("💬 Common questions:\n");
            for (index, question) in config.ui.quick_actions.iter().enumerate() {
                println!("  {}. {}", index + 1, question);
            }
            println!("\nAsk one with: tikitly ask --quick <N>");
            Ok(())
        }
        Some(Commands::Config { write }) => {
            if write {
                match &cli.config {
                    Some(path) => config.save_to(path)?,
                    None => config.save()?,
                }
                println!("✅ Saved {}", path.display());
            }
            println!("# {}", path.display());
            print!("{}", toml::to_string_pretty(&config).context("Failed to serialize config")?);
            Ok(())
        }
    }
}

async fn run_chat(config: &Config, open: bool) -> Result<()> {
    let driver = build_driver(config)?;
    let panel = SupportPanel::new(driver, &config.ui);
    ui::run(panel, open).await
}

async fn run_ask(config: &Config, question: Option<String>, quick: Option<usize>) -> Result<()> {
    let driver = build_driver(config)?;

    // Validate up front; an ignored submission emits no events to wait on.
    let question = match (question, quick) {
        (_, Some(number)) => {
            let index = number.checked_sub(1).filter(|index| *index < driver.quick_actions().len());
            match index {
                Some(index) => driver.quick_actions()[index].clone(),
                None => bail!(
                    "There is no common question number {number}; `tikitly quick` lists {} of them",
                    driver.quick_actions().len()
                ),
            }
        }
        (Some(question), None) if !question.trim().is_empty() => question,
        _ => bail!("The question is empty"),
    };

    let events = driver.subscribe();
    let task_driver = driver.clone();
    let exchange = tokio::spawn(async move { task_driver.submit(&question).await });

    print_answer(events).await?;

    match exchange.await.context("Answer task failed")? {
        SubmitOutcome::Answered => Ok(()),
        SubmitOutcome::Failed(error) => Err(error).context("Could not get an answer from Tikitly Support"),
        SubmitOutcome::Ignored(reason) => bail!("Nothing was asked ({reason:?})"),
    }
}

/// Print the assistant message as it grows until the exchange ends
async fn print_answer(mut events: broadcast::Receiver<ChatEvent>) -> Result<()> {
    let mut stdout = std::io::stdout();
    let mut printed = String::new();

    loop {
        let message = match events.recv().await {
            Ok(ChatEvent::BusyChanged(true)) => continue,
            Ok(ChatEvent::BusyChanged(false)) => break,
            Ok(ChatEvent::MessageAppended { message, .. } | ChatEvent::MessageUpdated { message, .. }) => message,
            Ok(ChatEvent::Cleared) => continue,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        };
        if message.role != Role::Assistant {
            continue;
        }

        match message.content.strip_prefix(printed.as_str()) {
            Some(delta) => write!(stdout, "{delta}")?,
            // Partial text was replaced, e.g. by the apology.
            None => write!(stdout, "\n{}", message.content)?,
        }
        stdout.flush()?;
        printed = message.content;
    }

    if !printed.is_empty() {
        writeln!(stdout)?;
    }
    Ok(())
}
