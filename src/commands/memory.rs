use super::one_shot_app;
use crate::libs::app::Action;
use anyhow::Result;

// Prints the memory report and both allocation probe rounds.
pub fn cmd() -> Result<()> {
    let mut app = one_shot_app()?;
    app.trigger(Action::Memory)?;
    Ok(())
}
