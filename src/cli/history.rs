use crate::cli::{require_admin_surface, CliContext};
use crate::core::audit_log;
use crate::core::lifecycle;
use crate::models::key::AccessKey;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use clap::{Args, Subcommand};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Table};
use dialoguer::Confirm;

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// Display the audit trail
    Log(HistoryLogArgs),
    /// Verify audit chain integrity
    Verify(HistoryVerifyArgs),
    /// Wipe the audit trail (developer only)
    Clear(HistoryClearArgs),
}

#[derive(Args, Debug)]
pub struct HistoryLogArgs {
    /// Maximum number of entries to display
    #[arg(long, default_value_t = 50)]
    pub limit: usize,
}

#[derive(Args, Debug)]
pub struct HistoryVerifyArgs {}

#[derive(Args, Debug)]
pub struct HistoryClearArgs {
    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

pub fn run(ctx: &CliContext, actor: &AccessKey, cmd: HistoryCommand) -> Result<()> {
    require_admin_surface(actor)?;
    match cmd {
        HistoryCommand::Log(args) => run_log(ctx, args),
        HistoryCommand::Verify(_) => run_verify(ctx),
        HistoryCommand::Clear(args) => run_clear(ctx, actor, args),
    }
}

fn run_log(ctx: &CliContext, args: HistoryLogArgs) -> Result<()> {
    let mut entries = audit_log::list(&ctx.paths)?;
    entries.truncate(args.limit);

    if entries.is_empty() {
        println!("No audit entries found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Timestamp").add_attribute(Attribute::Bold),
        Cell::new("Action").add_attribute(Attribute::Bold),
        Cell::new("Actor").add_attribute(Attribute::Bold),
        Cell::new("Target").add_attribute(Attribute::Bold),
        Cell::new("Role").add_attribute(Attribute::Bold),
    ]);

    for entry in &entries {
        let local: DateTime<Local> = entry.timestamp.into();
        table.add_row(vec![
            local.format("%Y-%m-%d %H:%M:%S").to_string(),
            entry.action.to_string(),
            entry.actor_username.clone(),
            entry.target_username.clone(),
            entry.target_role.to_string(),
        ]);
    }

    println!("{}", table);
    println!("\n{} entries shown.", entries.len());
    Ok(())
}

fn run_verify(ctx: &CliContext) -> Result<()> {
    let (total, errors) = audit_log::verify_chain(&ctx.paths)?;

    if total == 0 {
        println!("No audit entries to verify.");
        return Ok(());
    }

    for err in &errors {
        println!("  [FAIL] {}", err);
    }

    println!();
    if errors.is_empty() {
        println!("Audit chain: {} entries verified, 0 errors", total);
    } else {
        println!("Audit chain: {} entries, {} errors", total, errors.len());
        std::process::exit(1);
    }
    Ok(())
}

fn run_clear(ctx: &CliContext, actor: &AccessKey, args: HistoryClearArgs) -> Result<()> {
    if !args.yes {
        if ctx.non_interactive {
            bail!("--non-interactive requires --yes for history clear");
        }
        let confirmed = Confirm::new()
            .with_prompt("Wipe the entire audit history?")
            .default(false)
            .interact()
            .context("read confirmation")?;
        if !confirmed {
            println!("aborted");
            return Ok(());
        }
    }

    lifecycle::clear_history(&ctx.paths, actor)?;
    println!("audit history cleared");
    Ok(())
}
