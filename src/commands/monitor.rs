//! Store monitoring command.
//!
//! Runs the change watcher until it stops on its own (empty store) or the
//! user presses Ctrl+C. Populate from another terminal to see deliveries.

use super::one_shot_app;
use crate::libs::messages::Message;
use crate::{msg_error, msg_info};
use anyhow::Result;
use std::time::Duration;

pub async fn cmd() -> Result<()> {
    let mut app = one_shot_app()?;
    app.start_monitor()?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                msg_info!(Message::MonitorShuttingDown);
                app.shutdown().await?;
                return Ok(());
            }
            _ = tokio::time::sleep(Duration::from_millis(200)) => {
                if !app.is_monitoring() {
                    break;
                }
            }
        }
    }

    if let Some(Err(e)) = app.wait_monitor().await {
        msg_error!(Message::MonitorError(e.to_string()));
    }
    Ok(())
}
