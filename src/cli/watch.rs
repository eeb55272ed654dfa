//! Live dashboard: refreshes on a timer and on request until the user quits.
use super::dashboard::{self, DashboardOptions};
use super::ui;
use crate::core::board::BoardView;
use crate::core::{ConversionRequest, RateBoard, RateSource, RefreshScheduler};
use anyhow::Result;
use console::Term;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

const HELP: &str = "[r] refresh  [c <amount> <from> <to>] convert  [q] quit";

#[derive(Debug, Clone, PartialEq)]
pub enum WatchCommand {
    Refresh,
    Convert(ConversionRequest),
    Quit,
    Help,
    Invalid(String),
}

pub fn parse_command(line: &str) -> WatchCommand {
    let mut parts = line.split_whitespace();
    match parts.next().map(str::to_lowercase).as_deref() {
        None | Some("r") | Some("refresh") => WatchCommand::Refresh,
        Some("q") | Some("quit") | Some("exit") => WatchCommand::Quit,
        Some("h") | Some("help") | Some("?") => WatchCommand::Help,
        Some("c") | Some("convert") => {
            let args: Vec<&str> = parts.collect();
            let [amount, from, to] = args.as_slice() else {
                return WatchCommand::Invalid("Usage: c <amount> <from> <to>".to_string());
            };
            match amount.replace(',', ".").parse::<f64>() {
                Ok(amount) => WatchCommand::Convert(ConversionRequest::new(amount, from, to)),
                Err(_) => WatchCommand::Invalid(format!("Not a number: {amount}")),
            }
        }
        Some(other) => WatchCommand::Invalid(format!("Unknown command: {other}")),
    }
}

/// Reads stdin on a plain thread so a pending read never holds up runtime
/// shutdown.
fn spawn_input_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(8);
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn redraw(
    term: &Term,
    view: &BoardView,
    options: &DashboardOptions,
    message: Option<&str>,
) -> std::io::Result<()> {
    term.clear_screen()?;
    term.write_line(&dashboard::render_view(view, options))?;
    term.write_line("")?;
    if let Some(message) = message {
        term.write_line(&ui::style_text(message, ui::StyleType::Warning))?;
    }
    term.write_line(&ui::style_text(HELP, ui::StyleType::Subtle))
}

pub async fn run(
    source: Arc<dyn RateSource>,
    interval: Duration,
    mut options: DashboardOptions,
) -> Result<()> {
    let board = Arc::new(RateBoard::new());
    let mut updates = board.subscribe();
    let scheduler = RefreshScheduler::start(source, Arc::clone(&board), interval);

    let term = Term::stdout();
    let mut input = spawn_input_reader();
    let mut input_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut message: Option<String> = None;

    let result: Result<()> = loop {
        let view = updates.borrow_and_update().clone();
        if let Err(e) = redraw(&term, &view, &options, message.take().as_deref()) {
            break Err(anyhow::Error::new(e).context("Failed to draw dashboard"));
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
            }
            line = input.recv(), if input_open => match line {
                Some(line) => match parse_command(&line) {
                    WatchCommand::Refresh => {
                        if !scheduler.refresh_now() {
                            message = Some("A refresh is already pending".to_string());
                        }
                    }
                    WatchCommand::Convert(request) => {
                        debug!("Converter set to {request}");
                        options.converter = Some(request);
                    }
                    WatchCommand::Quit => break Ok(()),
                    WatchCommand::Help => message = Some(HELP.to_string()),
                    WatchCommand::Invalid(e) => message = Some(e),
                },
                None => {
                    debug!("Input closed, watching until interrupted");
                    input_open = false;
                }
            },
            _ = &mut ctrl_c => break Ok(()),
        }
    };

    scheduler.stop().await;
    result
}
