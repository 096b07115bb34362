//! Retrieval commands: repeated full fetch, batched fetch, foreground fetch.

use super::{one_shot_app, run_to_completion};
use crate::libs::app::Action;
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct BatchesArgs {
    /// Tasks per batch (overrides the configured batch size)
    #[arg(long, short)]
    batch_size: Option<usize>,
}

pub async fn cmd(action: Action) -> Result<()> {
    let mut app = one_shot_app()?;
    run_to_completion(&mut app, action).await
}

pub async fn batches(args: BatchesArgs) -> Result<()> {
    let mut app = one_shot_app()?;

    if let Some(batch_size) = args.batch_size {
        let config = app.config_mut();
        let mut retrieval = config.retrieval();
        retrieval.batch_size = batch_size.max(1);
        config.retrieval = Some(retrieval);
    }

    run_to_completion(&mut app, Action::Batches).await
}
