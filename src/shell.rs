//! Interactive `browse` shell.

use std::io::Write;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use cloudshelf_core::InstanceAction;
use cloudshelf_gateway::RemoteGateway;
use cloudshelf_nav::NavMode;
use cloudshelf_ops::ActionId;
use cloudshelf_session::{Session, SessionError, Update};

use crate::render;

#[derive(Parser)]
#[command(multicall = true, disable_help_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand)]
enum ShellCommand {
    /// Show the current bucket list or folder
    #[command(alias = "l")]
    Ls,
    /// Open a bucket or folder; `..` goes up, `/` jumps to the bucket root
    Cd { target: String },
    /// Jump to a breadcrumb by index (0 is the bucket root)
    Jump { index: usize },
    /// Return to the bucket list
    Buckets,
    /// Re-fetch the current view
    Refresh,
    /// Delete a file in the current folder
    Rm { name: String },
    /// Delete an empty folder in the current folder
    Rmdir { name: String },
    /// Delete an empty bucket
    Rb { name: String },
    /// List instances
    Instances,
    /// Start an instance
    Start { id: String },
    /// Stop an instance
    Stop { id: String },
    /// Terminate an instance
    Terminate { id: String },
    /// List VPCs, optionally filtered
    Vpcs { filter: Option<String> },
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

enum Flow {
    Continue,
    Quit,
}

fn prompt<G: RemoteGateway>(session: &Session<G>, pending: Option<ActionId>) {
    if pending.is_some() {
        print!("Proceed? [y/N] ");
    } else {
        match session.view().selected() {
            Some(container) => print!("{}:/{}> ", container.name, session.view().current_path()),
            None => print!("cloudshelf> "),
        }
    }
    let _ = std::io::stdout().flush();
}

fn show_banner<G: RemoteGateway>(session: &Session<G>) {
    if let Some(banner) = session.banner() {
        println!(" ! {banner}");
    }
}

/// Run the shell until EOF or `quit`.
pub async fn run<G: RemoteGateway>(mut session: Session<G>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending: Option<ActionId> = None;

    session.load_containers();
    session.settle().await;
    render::print_view(session.view());
    show_banner(&session);
    prompt(&session, pending);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if let Some(id) = pending.take() {
                    answer(&mut session, id, &line).await;
                } else {
                    match execute(&mut session, &line).await {
                        Ok(Flow::Quit) => break,
                        Ok(Flow::Continue) => {}
                        Err(err) => println!(" {err}"),
                    }
                    pending = session.gate().pending_id().filter(|_| !session.gate().is_executing());
                }
                prompt(&session, pending);
            }
            Some(event) = session.next_event() => {
                // Only delayed instance re-fetches arrive between commands.
                if session.handle(event) == Update::Instances {
                    println!();
                    println!(" Instances refreshed.");
                    render::print_instances(session.board());
                    prompt(&session, pending);
                }
            }
        }
    }
    Ok(())
}

async fn answer<G: RemoteGateway>(session: &mut Session<G>, id: ActionId, line: &str) {
    let yes = matches!(line.trim().to_lowercase().as_str(), "y" | "yes");
    if !yes {
        if session.cancel(id).is_ok() {
            println!(" Cancelled.");
        }
        return;
    }
    if let Err(err) = session.confirm(id) {
        println!(" {err}");
        return;
    }
    let updates = session.settle().await;
    if took_effect(&updates) {
        println!(" Done.");
        if updates.contains(&Update::Instances) {
            render::print_instances(session.board());
        } else {
            render::print_view(session.view());
        }
    }
    show_banner(session);
}

/// Whether a confirmed action went through, even if its follow-up failed.
fn took_effect(updates: &[Update]) -> bool {
    updates
        .iter()
        .any(|u| matches!(u, Update::Deleted | Update::Instances))
}

async fn execute<G: RemoteGateway>(
    session: &mut Session<G>,
    line: &str,
) -> Result<Flow, SessionError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(Flow::Continue);
    }
    let command = match ShellLine::try_parse_from(words) {
        Ok(parsed) => parsed.command,
        Err(err) => {
            let _ = err.print();
            return Ok(Flow::Continue);
        }
    };

    match command {
        ShellCommand::Ls => render::print_view(session.view()),
        ShellCommand::Cd { target } => {
            match (session.view().mode(), target.as_str()) {
                (NavMode::ContainerList, "..") => {}
                (NavMode::ContainerList, name) => session.open_container(name)?,
                (NavMode::DirectoryListing, "..") => session.go_up()?,
                (NavMode::DirectoryListing, "/") => session.jump_to("")?,
                (NavMode::DirectoryListing, name) => session.enter_folder(name)?,
            }
            refreshed(session).await;
        }
        ShellCommand::Jump { index } => {
            let path = match index {
                0 => String::new(),
                n => session
                    .view()
                    .breadcrumbs()
                    .get(n - 1)
                    .map(|b| b.path.clone())
                    .unwrap_or_else(|| session.view().current_path().to_string()),
            };
            session.jump_to(&path)?;
            refreshed(session).await;
        }
        ShellCommand::Buckets => {
            session.leave_container();
            session.load_containers();
            refreshed(session).await;
        }
        ShellCommand::Refresh => {
            session.refresh();
            refreshed(session).await;
        }
        ShellCommand::Rm { name } => {
            session.request_delete_file(&name)?;
            show_pending(session);
        }
        ShellCommand::Rmdir { name } => {
            session.request_delete_folder(&name)?;
            show_pending(session);
        }
        ShellCommand::Rb { name } => {
            session.request_delete_bucket(&name)?;
            show_pending(session);
        }
        ShellCommand::Instances => {
            session.load_instances();
            session.settle().await;
            render::print_instances(session.board());
            show_banner(session);
        }
        ShellCommand::Start { id } => instance_action(session, &id, InstanceAction::Start)?,
        ShellCommand::Stop { id } => instance_action(session, &id, InstanceAction::Stop)?,
        ShellCommand::Terminate { id } => {
            instance_action(session, &id, InstanceAction::Terminate)?
        }
        ShellCommand::Vpcs { filter } => {
            session.load_vpcs();
            session.settle().await;
            render::print_vpcs(&session.vpcs_matching(filter.as_deref().unwrap_or("")));
            show_banner(session);
        }
        ShellCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn instance_action<G: RemoteGateway>(
    session: &mut Session<G>,
    id: &str,
    action: InstanceAction,
) -> Result<(), SessionError> {
    if session.board().instances().is_empty() {
        println!(" Run `instances` first.");
        return Ok(());
    }
    session.request_instance_action(id, action)?;
    show_pending(session);
    Ok(())
}

fn show_pending<G: RemoteGateway>(session: &Session<G>) {
    if let Some(action) = session.gate().pending() {
        render::print_pending(action);
    }
}

async fn refreshed<G: RemoteGateway>(session: &mut Session<G>) {
    session.settle().await;
    render::print_view(session.view());
    show_banner(session);
}
