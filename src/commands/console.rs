//! Interactive console.
//!
//! Shows the seven actions and a log panel with the most recent routine
//! lines, newest first. While a routine runs, further actions are rejected
//! until it finishes. Monitoring runs alongside routines and can be stopped
//! from the menu.

use crate::libs::app::{Action, App};
use crate::libs::error::DemoError;
use crate::libs::log_buffer::LogBuffer;
use crate::libs::messages::Message;
use crate::{msg_error, msg_print, msg_warning};
use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Select};

#[derive(Debug, Args)]
pub struct ConsoleArgs {
    /// Keep existing records instead of clearing them on start
    #[arg(long)]
    keep_data: bool,
}

enum MenuItem {
    Action(Action),
    ShowLogs,
    StopMonitor,
    Quit,
}

impl MenuItem {
    fn all() -> Vec<MenuItem> {
        let mut items: Vec<MenuItem> = Action::ALL.into_iter().map(MenuItem::Action).collect();
        items.extend([MenuItem::ShowLogs, MenuItem::StopMonitor, MenuItem::Quit]);
        items
    }

    fn label(&self) -> String {
        match self {
            MenuItem::Action(action) => action.to_string(),
            MenuItem::ShowLogs => Message::ConsoleActionShowLogs.to_string(),
            MenuItem::StopMonitor => Message::ConsoleActionStopMonitor.to_string(),
            MenuItem::Quit => Message::ConsoleActionQuit.to_string(),
        }
    }
}

pub async fn cmd(args: ConsoleArgs) -> Result<()> {
    let mut app = App::from_data_storage(LogBuffer::new())?;
    app.init_store(!args.keep_data)?;

    let items = MenuItem::all();
    let labels: Vec<String> = items.iter().map(MenuItem::label).collect();

    let mut current: Option<Action> = None;
    loop {
        report_finished(&mut app, &mut current).await;
        render(&app);

        let selection = tokio::task::block_in_place(|| {
            Select::with_theme(&ColorfulTheme::default())
                .with_prompt(Message::ConsoleSelectAction.to_string())
                .items(&labels)
                .default(0)
                .interact()
        })?;

        match &items[selection] {
            MenuItem::Action(action) => {
                if trigger(&mut app, *action) {
                    current = Some(*action);
                }
            }
            MenuItem::ShowLogs => {}
            MenuItem::StopMonitor => app.stop_monitor(),
            MenuItem::Quit => break,
        }
    }

    app.shutdown().await?;
    Ok(())
}

/// True when `action` was started in the background.
fn trigger(app: &mut App, action: Action) -> bool {
    if app.is_running() {
        msg_warning!(Message::RoutineAlreadyRunning);
        return false;
    }

    app.logs().log(Message::RoutineStarted(action.to_string()));
    match app.trigger(action) {
        Ok(()) if action.is_background() => true,
        Ok(()) => {
            if action != Action::Monitor {
                app.logs().log(Message::RoutineFinished(action.to_string()));
            }
            false
        }
        Err(DemoError::SlotBusy) => {
            msg_warning!(Message::RoutineAlreadyRunning);
            false
        }
        Err(e) => {
            app.logs().log(Message::RoutineFailed(e.to_string()));
            msg_error!(Message::RoutineFailed(e.to_string()));
            false
        }
    }
}

async fn report_finished(app: &mut App, current: &mut Option<Action>) {
    let Some(result) = app.take_finished().await else {
        return;
    };
    let name = current.take().map(|a| a.to_string()).unwrap_or_default();
    match result {
        Ok(()) => app.logs().log(Message::RoutineFinished(name)),
        Err(DemoError::Join(e)) => app.logs().log(Message::TaskPanicked(e)),
        Err(e) => app.logs().log(Message::RoutineFailed(e.to_string())),
    }
}

fn render(app: &App) {
    msg_print!(Message::ConsoleTitle, true);
    if app.is_running() {
        msg_print!(Message::ConsoleRunning);
    } else {
        msg_print!(Message::ConsoleIdle);
    }

    let entries = app.logs().recent();
    if entries.is_empty() {
        msg_print!(Message::LogPanelEmpty);
        return;
    }
    msg_print!(Message::LogPanelHeader(entries.len()));
    for entry in entries {
        msg_print!(entry);
    }
}
