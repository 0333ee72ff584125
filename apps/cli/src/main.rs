use std::{io::Write, path::PathBuf, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Local;
use clap::Parser;
use client_core::{
    ActionOutcome, AppController, ConfirmationPort, FixedConfirmation, HttpTaskClient,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader, Lines, Stdin},
    sync::Mutex,
};
use tracing::info;

mod commands;
mod config;
mod render;

use commands::{parse_command, Command, HELP};

type SharedLines = Arc<Mutex<Lines<BufReader<Stdin>>>>;

#[derive(Parser, Debug)]
#[command(name = "taskline", about = "Natural-language task list client")]
struct Args {
    /// Task API base URL; overrides the config file and environment.
    #[arg(long)]
    api_url: Option<String>,
    /// Settings file; defaults to ./taskline.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Skip the delete confirmation prompt.
    #[arg(long)]
    assume_yes: bool,
}

/// Asks on stdin. End of input counts as "no".
struct StdinConfirmation {
    lines: SharedLines,
}

#[async_trait]
impl ConfirmationPort for StdinConfirmation {
    async fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        let _ = std::io::stdout().flush();
        match self.lines.lock().await.next_line().await {
            Ok(Some(answer)) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            _ => false,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = config::load_settings(args.config.as_deref())?;
    if let Some(api_url) = args.api_url {
        settings.api_base_url = api_url;
    }
    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .with_writer(std::io::stderr)
        .init();

    let base_url = config::parse_base_url(&settings.api_base_url)?;
    info!(api = %base_url, "starting taskline");

    let lines: SharedLines = Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines()));
    let confirmation: Arc<dyn ConfirmationPort> = if args.assume_yes {
        Arc::new(FixedConfirmation(true))
    } else {
        Arc::new(StdinConfirmation {
            lines: Arc::clone(&lines),
        })
    };
    let controller = AppController::new(Arc::new(HttpTaskClient::new(base_url)), confirmation);

    let mut connectivity = controller.connectivity().subscribe();
    println!("{}", render::render_connectivity(*connectivity.borrow_and_update()));
    let startup = controller.startup();
    tokio::pin!(startup);
    loop {
        tokio::select! {
            _ = &mut startup => break,
            Ok(()) = connectivity.changed() => {
                println!("{}", render::render_connectivity(*connectivity.borrow_and_update()));
            }
        }
    }
    redraw(&controller).await;

    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.lock().await.next_line().await? else {
            break;
        };
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        if !execute(&controller, command).await {
            break;
        }
    }

    info!("taskline exiting");
    Ok(())
}

async fn execute(controller: &AppController, command: Command) -> bool {
    let outcome = match command {
        Command::Add(text) => controller.create(&text).await,
        Command::Edit(id, patch) => controller.edit(&id, &patch).await,
        Command::Delete(id) => controller.delete(&id).await,
        Command::Refresh => controller.refresh().await,
        Command::List => ActionOutcome::Applied,
        Command::Show(id) => {
            match controller.inspect(&id).await {
                Ok(task) => print!("{}", render::render_task_detail(&task, &Local::now())),
                Err(_) => {
                    if let Some(task) = controller.cached(&id).await {
                        println!("Showing the last synced copy:");
                        print!("{}", render::render_task_detail(&task, &Local::now()));
                    }
                }
            }
            ActionOutcome::Applied
        }
        Command::Help => {
            println!("{HELP}");
            return true;
        }
        Command::Quit => return false,
    };
    match outcome {
        ActionOutcome::Declined => println!("Delete cancelled."),
        ActionOutcome::AlreadyPending => println!("That action is still in progress."),
        ActionOutcome::Applied | ActionOutcome::Failed(_) => {}
    }
    redraw(controller).await;
    true
}

async fn redraw(controller: &AppController) {
    if let Some(banner) = render::render_banner(&controller.notifications().current()) {
        println!("{banner}");
    }
    println!("{}", render::render_connectivity(controller.connectivity().current()));
    print!("{}", render::render_view(&controller.view().await, &Local::now()));
}
