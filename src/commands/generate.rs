//! Population commands for both layouts.

use super::{one_shot_app, run_to_completion};
use crate::libs::app::Action;
use crate::libs::layout::Layout;
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Number of tasks to create (overrides the configured count)
    #[arg(long, short)]
    count: Option<u64>,

    /// Image titles per task (overrides the configured fan-out for the layout)
    #[arg(long, short)]
    fan_out: Option<u32>,
}

pub async fn cmd(layout: Layout, args: GenerateArgs) -> Result<()> {
    let mut app = one_shot_app()?;
    app.init_store(false)?;

    let config = app.config_mut();
    let mut generate = config.generate();
    if let Some(count) = args.count {
        generate.count = count;
    }
    if let Some(fan_out) = args.fan_out {
        match layout {
            Layout::Duplicated => generate.duplicate_fan_out = fan_out,
            Layout::Normalized => generate.normalized_fan_out = fan_out,
        }
    }
    config.generate = Some(generate);

    run_to_completion(&mut app, Action::Generate(layout)).await
}
