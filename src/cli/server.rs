use crate::cli::{require_admin_surface, CliContext};
use crate::core::registry;
use crate::models::key::AccessKey;
use anyhow::Result;
use clap::{Args, Subcommand};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Table};

#[derive(Subcommand, Debug)]
pub enum ServerCommand {
    /// Register a dispatch server template
    Add(ServerAddArgs),
    /// List server templates
    List(ServerListArgs),
    /// Remove a server template
    Remove(ServerRemoveArgs),
}

#[derive(Args, Debug)]
pub struct ServerAddArgs {
    /// Server display name
    pub server_name: String,

    /// Command template dispatched for this server
    pub command_format: String,
}

#[derive(Args, Debug)]
pub struct ServerListArgs {}

#[derive(Args, Debug)]
pub struct ServerRemoveArgs {
    /// Server id or name
    pub target: String,
}

pub fn run(ctx: &CliContext, actor: &AccessKey, cmd: ServerCommand) -> Result<()> {
    require_admin_surface(actor)?;
    match cmd {
        ServerCommand::Add(args) => run_add(ctx, args),
        ServerCommand::List(_) => run_list(ctx),
        ServerCommand::Remove(args) => run_remove(ctx, args),
    }
}

fn run_add(ctx: &CliContext, args: ServerAddArgs) -> Result<()> {
    let server = registry::add_server(&ctx.paths, &args.server_name, &args.command_format)?;
    println!("registered server '{}' (id {})", server.server_name, server.id);
    Ok(())
}

fn run_list(ctx: &CliContext) -> Result<()> {
    let servers = registry::list_servers(&ctx.paths)?;
    if servers.is_empty() {
        println!("No servers registered.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Name").add_attribute(Attribute::Bold),
        Cell::new("Command").add_attribute(Attribute::Bold),
        Cell::new("Id").add_attribute(Attribute::Bold),
    ]);
    for server in &servers {
        table.add_row(vec![
            server.server_name.clone(),
            server.command_format.clone(),
            server.id.clone(),
        ]);
    }

    println!("{}", table);
    println!("\n{} servers.", servers.len());
    Ok(())
}

fn run_remove(ctx: &CliContext, args: ServerRemoveArgs) -> Result<()> {
    let servers = registry::list_servers(&ctx.paths)?;
    let id = servers
        .iter()
        .find(|s| s.id == args.target || s.server_name == args.target)
        .map(|s| s.id.clone())
        .unwrap_or_else(|| args.target.clone());

    if registry::remove_server(&ctx.paths, &id)? {
        println!("removed server '{}'", args.target);
    } else {
        println!("no server '{}', nothing to remove", args.target);
    }
    Ok(())
}
