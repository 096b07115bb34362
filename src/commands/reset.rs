use crate::db::db::Db;
use crate::libs::messages::Message;
use crate::msg_success;
use anyhow::Result;

// Empties both layouts; the schema and migration history are kept.
pub fn cmd() -> Result<()> {
    Db::new()?.clear_all()?;
    msg_success!(Message::StoreReset);
    Ok(())
}
