use crate::cli::{require_admin_surface, CliContext};
use crate::core::registry;
use crate::models::key::AccessKey;
use anyhow::{bail, Result};
use clap::{Args, Subcommand};

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Show dispatch settings
    Show,
    /// Update dispatch settings
    Set(SettingsSetArgs),
}

#[derive(Args, Debug)]
pub struct SettingsSetArgs {
    /// Bot token for the messaging API
    #[arg(long)]
    pub bot_token: Option<String>,

    /// Chat id the dispatched commands are sent to
    #[arg(long)]
    pub chat_id: Option<String>,
}

pub fn run(ctx: &CliContext, actor: &AccessKey, cmd: SettingsCommand) -> Result<()> {
    require_admin_surface(actor)?;
    match cmd {
        SettingsCommand::Show => run_show(ctx),
        SettingsCommand::Set(args) => run_set(ctx, args),
    }
}

fn run_show(ctx: &CliContext) -> Result<()> {
    let settings = registry::load_settings(&ctx.paths)?;
    println!("bot_token: {}", mask_token(&settings.bot_token));
    let chat_id = if settings.chat_id.is_empty() {
        "-"
    } else {
        settings.chat_id.as_str()
    };
    println!("chat_id:   {}", chat_id);
    Ok(())
}

fn run_set(ctx: &CliContext, args: SettingsSetArgs) -> Result<()> {
    if args.bot_token.is_none() && args.chat_id.is_none() {
        bail!("nothing to set (use --bot-token and/or --chat-id)");
    }

    let mut settings = registry::load_settings(&ctx.paths)?;
    if let Some(bot_token) = args.bot_token {
        settings.bot_token = bot_token;
    }
    if let Some(chat_id) = args.chat_id {
        settings.chat_id = chat_id;
    }
    registry::save_settings(&ctx.paths, &settings)?;
    println!("settings saved");
    Ok(())
}

/// The token is a secret; only its tail is ever echoed back.
fn mask_token(token: &str) -> String {
    if token.is_empty() {
        return "-".to_string();
    }
    let tail: String = token
        .chars()
        .rev()
        .take(4)
        .collect::<String>()
        .chars()
        .rev()
        .collect();
    format!("****{}", tail)
}
