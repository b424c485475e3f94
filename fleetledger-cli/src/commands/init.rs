//! Init command - create the data directory and sign in

use anyhow::Result;
use fleetledger_core::Role;

use super::get_context;
use crate::output;

pub fn run(user: &str, role: &str) -> Result<()> {
    let role: Role = role.parse()?;
    let ctx = get_context()?;

    let mut config = ctx.config.clone();
    config.session.user_id = Some(user.trim().to_string());
    config.save(&ctx.data_dir)?;
    ctx.repository.set_user_role(user.trim(), role)?;

    output::success(&format!("Signed in as {} ({})", user.trim(), role));
    output::info(&format!("Data directory: {}", ctx.data_dir.display()));
    Ok(())
}
