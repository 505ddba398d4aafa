use clap::{Arg, ArgAction, Command};
use color_eyre::Result;
use std::sync::Arc;

mod adapters;
mod application;
mod domain;
mod ports;

use adapters::{
    api::{PostgrestClient, SupabaseTaskStore},
    config::FileConfigStore,
    tui::{run_tui, App},
};
use application::{AppError, TaskListController};
use domain::{TaskDraft, TaskId, TaskPatch};
use ports::{ConfigStore, TaskStore};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // Log to file; the terminal belongs to the TUI
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("taskdeck.log")?;

    tracing_subscriber::fmt()
        .with_writer(std::sync::Arc::new(log_file))
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let matches = Command::new("taskdeck")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A terminal task list backed by a hosted task store")
        .long_about("A keyboard-driven terminal task list.\n\nTasks are persisted through a Supabase-style REST backend; every change is written remotely and the list is re-fetched so the store stays authoritative.")
        .arg(
            Arg::new("url")
                .long("url")
                .value_name("URL")
                .help("Backend project URL (can also be set via TASKDECK_URL env var)")
                .global(true),
        )
        .arg(
            Arg::new("api-key")
                .long("api-key")
                .value_name("KEY")
                .help("Backend API key (can also be set via TASKDECK_API_KEY env var)")
                .global(true),
        )
        .subcommand(
            Command::new("tasks")
                .about("Task operations for scripting")
                .subcommand(Command::new("list").about("List all tasks as JSON"))
                .subcommand(
                    Command::new("add").about("Add a new task").arg(
                        Arg::new("text")
                            .help("Task text")
                            .required(true)
                            .index(1),
                    ),
                )
                .subcommand(
                    Command::new("done")
                        .about("Mark a task completed")
                        .arg(
                            Arg::new("task_id")
                                .help("Task ID to complete")
                                .required(true)
                                .index(1),
                        )
                        .arg(
                            Arg::new("reopen")
                                .long("reopen")
                                .help("Mark incomplete instead")
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(
                    Command::new("rm").about("Delete a task").arg(
                        Arg::new("task_id")
                            .help("Task ID to delete")
                            .required(true)
                            .index(1),
                    ),
                ),
        )
        .get_matches();

    // Load configuration
    let config_store = Arc::new(FileConfigStore::new()?);
    let mut config = config_store.load_config().await.map_err(AppError::from)?;

    // Override with command line arguments or environment variables
    if let Some(url) = matches.get_one::<String>("url") {
        config.backend_url = Some(url.clone());
    } else if let Ok(url) = std::env::var("TASKDECK_URL") {
        config.backend_url = Some(url);
    }

    if let Some(key) = matches.get_one::<String>("api-key") {
        config.api_key = Some(key.clone());
    }

    let backend_url = config.backend_url.clone().ok_or_else(|| {
        eprintln!("No backend URL configured!");
        eprintln!();
        eprintln!("To get started:");
        eprintln!("1. Create a project with a `tasks` table (id, text, completed)");
        eprintln!("2. Run: export TASKDECK_URL=https://<project>.supabase.co");
        eprintln!("3. Or run: taskdeck --url https://<project>.supabase.co");
        AppError::BackendNotConfigured
    })?;

    let api_key = config.api_key.clone().ok_or_else(|| {
        eprintln!("No API key found!");
        eprintln!();
        eprintln!("Provide one with: export TASKDECK_API_KEY=your_key_here");
        eprintln!("or: taskdeck --api-key your_key_here");
        AppError::BackendNotConfigured
    })?;

    // Remember the working settings for next time
    config_store.save_config(&config).await?;

    let client = PostgrestClient::new(backend_url, api_key).map_err(AppError::from)?;
    let store: Arc<dyn TaskStore> = Arc::new(SupabaseTaskStore::new(client));

    match matches.subcommand() {
        Some(("tasks", tasks_matches)) => match tasks_matches.subcommand() {
            Some(("list", _)) => match store.list().await {
                Ok(tasks) => {
                    let json = serde_json::to_string_pretty(&tasks)?;
                    println!("{json}");
                }
                Err(e) => {
                    eprintln!("Failed to list tasks: {e}");
                    std::process::exit(1);
                }
            },
            Some(("add", add_matches)) => {
                if let Some(text) = add_matches.get_one::<String>("text") {
                    match store.insert(&TaskDraft::new(text.as_str())).await {
                        Ok(task) => {
                            let json = serde_json::to_string_pretty(&task)?;
                            println!("{json}");
                        }
                        Err(e) => {
                            eprintln!("Failed to add task: {e}");
                            std::process::exit(1);
                        }
                    }
                }
            }
            Some(("done", done_matches)) => {
                if let Some(raw_id) = done_matches.get_one::<String>("task_id") {
                    let id = parse_task_id(raw_id);
                    let completed = !done_matches.get_flag("reopen");
                    if let Err(e) = store.update(id, &TaskPatch::completed(completed)).await {
                        eprintln!("Failed to update task {id}: {e}");
                        std::process::exit(1);
                    }
                }
            }
            Some(("rm", rm_matches)) => {
                if let Some(raw_id) = rm_matches.get_one::<String>("task_id") {
                    let id = parse_task_id(raw_id);
                    if let Err(e) = store.delete(id).await {
                        eprintln!("Failed to delete task {id}: {e}");
                        std::process::exit(1);
                    }
                }
            }
            _ => {
                eprintln!("Unknown tasks subcommand");
                std::process::exit(1);
            }
        },
        None => {
            // Default behavior - run TUI
            let controller = TaskListController::new(store);
            let app = App::new(controller);

            if let Err(e) = run_tui(app).await {
                eprintln!("Application error: {e}");
                std::process::exit(1);
            }
        }
        _ => {
            eprintln!("Unknown command");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn parse_task_id(raw: &str) -> TaskId {
    match raw.parse::<i64>() {
        Ok(id) => TaskId(id),
        Err(_) => {
            eprintln!("Invalid task id: {raw}");
            std::process::exit(1);
        }
    }
}
