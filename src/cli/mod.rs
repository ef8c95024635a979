pub mod commands;

use crate::cli::commands::{Commands, SessionAction};
use crate::config::AppConfig;
use crate::report::{ReportData, ReportRenderer};
use crate::session::{ChatTurn, SessionStore};

pub fn run_cli(command: Commands, config_path: String) {
    let config = match AppConfig::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return;
        }
    };

    let store = match SessionStore::new(&config.storage.sessions_dir) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };

    match command {
        Commands::Serve => {
            eprintln!("Serve command should be intercepted by main.rs to boot actix-web");
        }
        Commands::Session { action } => match action {
            SessionAction::List => match store.list_snapshots() {
                Ok(ids) if ids.is_empty() => println!("No sessions found."),
                Ok(ids) => {
                    println!("{:<38} | {:<32} | {:>5} | {:>6}", "ID", "Created At", "Chats", "Images");
                    println!("{:-<38}-+-{:-<32}-+-{:-<5}-+-{:-<6}", "", "", "", "");
                    for id in ids {
                        match store.read_snapshot(&id) {
                            Ok(Some(s)) => println!(
                                "{:<38} | {:<32} | {:>5} | {:>6}",
                                id,
                                s.created_at.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".into()),
                                s.chat_history.len(),
                                s.image_history.len()
                            ),
                            Ok(None) => {}
                            Err(e) => eprintln!("{:<38} | unreadable: {}", id, e),
                        }
                    }
                }
                Err(e) => eprintln!("Error: {}", e),
            },
            SessionAction::Show { id } => match store.read_snapshot(&id) {
                Ok(Some(snapshot)) => {
                    for turn in &snapshot.chat_history {
                        match turn {
                            ChatTurn::RoleText { role, text } => println!("[{}]: {}", role.to_uppercase(), text),
                            ChatTurn::QaPair { question, answer } => {
                                println!("[Q]: {}", question);
                                println!("[A]: {}", answer);
                            }
                            ChatTurn::Plain(text) => println!("[Q]: {}", text),
                            ChatTurn::Other(_) => continue,
                        }
                        println!("---");
                    }
                    println!("{} image analyses", snapshot.image_history.len());
                }
                Ok(None) => eprintln!("Session {} not found.", id),
                Err(e) => eprintln!("Error: {}", e),
            },
            SessionAction::Report { id } => {
                let snapshot = match store.read_snapshot(&id) {
                    Ok(Some(s)) => s,
                    Ok(None) => {
                        eprintln!("Session {} not found.", id);
                        return;
                    }
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        return;
                    }
                };
                let result = ReportRenderer::new(&config.storage.reports_dir).and_then(|renderer| {
                    renderer.render(
                        &id,
                        &ReportData {
                            chat_history: &snapshot.chat_history,
                            image_history: &snapshot.image_history,
                        },
                    )
                });
                match result {
                    Ok(path) => println!("Report written to: {}", path.display()),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
        },
    }
}
