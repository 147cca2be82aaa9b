//! CLI routing and command dispatch.
//!
//! The CLI is the thin caller layer over the core engine: it resolves the
//! panel root, authenticates the invoking operator, and translates typed
//! engine errors into operator-facing messages. Identity failures
//! (invalid or expired key) and authorization failures (forbidden) read
//! differently on purpose.

use crate::core::auth;
use crate::core::paths::PanelPaths;
use crate::core::store::KeyStore;
use crate::error::PanelError;
use crate::models::config::PanelConfig;
use crate::models::key::AccessKey;
use crate::models::role::Role;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dialoguer::Password;
use std::env;
use std::path::PathBuf;
use zeroize::Zeroizing;

pub mod history;
pub mod init;
pub mod key;
pub mod server;
pub mod settings;

/// Shared context passed to all command handlers.
pub struct CliContext {
    pub paths: PanelPaths,
    pub non_interactive: bool,
    pub config: PanelConfig,
}

impl CliContext {
    /// Authenticate the invoking operator.
    ///
    /// The username comes from `--user` or `KEYDESK_USER`; the secret
    /// from `KEYDESK_KEY` or an interactive prompt.
    pub fn actor(&self, username: Option<&str>, command: &str) -> Result<AccessKey> {
        let Some(username) = username else {
            bail!("'{}' needs --user (or KEYDESK_USER)", command);
        };

        let secret: Zeroizing<String> = match env::var("KEYDESK_KEY") {
            Ok(value) => Zeroizing::new(value),
            Err(_) => {
                if self.non_interactive {
                    bail!("--non-interactive requires KEYDESK_KEY to be set");
                }
                Zeroizing::new(
                    Password::new()
                        .with_prompt(format!("Access key for {}", username))
                        .allow_empty_password(false)
                        .interact()
                        .context("read access key from prompt")?,
                )
            }
        };

        let store = KeyStore::open(&self.paths);
        auth::authenticate(&store, username, &secret)
            .with_context(|| format!("authentication failed for '{}'", username))
    }
}

/// Admin-surface gate shared by the registry and history commands.
/// User-role keys submit dispatch requests; they do not administer.
pub(crate) fn require_admin_surface(actor: &AccessKey) -> Result<(), PanelError> {
    if actor.role == Role::User {
        return Err(PanelError::Forbidden(
            "administration requires an admin role",
        ));
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(
    name = "keydesk",
    version,
    about = "Role-gated access key panel for the dispatch service"
)]
pub struct Cli {
    /// Panel root directory
    #[arg(long, global = true, value_name = "PATH")]
    pub root: Option<PathBuf>,

    /// Username of the invoking operator
    #[arg(long, global = true, env = "KEYDESK_USER")]
    pub user: Option<String>,

    /// Run in non-interactive mode (no prompts, suitable for automation)
    #[arg(long, global = true, env = "KEYDESK_NON_INTERACTIVE")]
    pub non_interactive: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let Cli {
            root,
            user,
            non_interactive,
            command,
        } = self;
        let paths = PanelPaths::resolve(root);

        // Best-effort config load; a broken panel.toml should not brick
        // read-only commands.
        let config = match PanelConfig::load(&paths.panel_toml) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("warning: {:#}", e);
                PanelConfig::default()
            }
        };

        let ctx = CliContext {
            paths,
            non_interactive,
            config,
        };
        let username = user.as_deref();

        match command {
            Commands::Init(args) => init::run(&ctx, args),
            Commands::Add(args) => {
                let actor = ctx.actor(username, "add")?;
                key::run_add(&ctx, &actor, args)
            }
            Commands::Delete(args) => {
                let actor = ctx.actor(username, "delete")?;
                key::run_delete(&ctx, &actor, args)
            }
            Commands::Rotate(args) => {
                let actor = ctx.actor(username, "rotate")?;
                key::run_rotate(&ctx, &actor, args)
            }
            Commands::Show(args) => {
                let actor = ctx.actor(username, "show")?;
                key::run_show(&ctx, &actor, args)
            }
            Commands::List(args) => {
                let actor = ctx.actor(username, "list")?;
                key::run_list(&ctx, &actor, args)
            }
            Commands::History { command } => {
                let actor = ctx.actor(username, "history")?;
                history::run(&ctx, &actor, command)
            }
            Commands::Server { command } => {
                let actor = ctx.actor(username, "server")?;
                server::run(&ctx, &actor, command)
            }
            Commands::Settings { command } => {
                let actor = ctx.actor(username, "settings")?;
                settings::run(&ctx, &actor, command)
            }
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the panel root and optionally seed the first developer key
    Init(init::InitArgs),
    /// Create an access key
    Add(key::AddArgs),
    /// Delete an access key (safe to retry)
    Delete(key::DeleteArgs),
    /// Rotate your own key value
    Rotate(key::RotateArgs),
    /// Reveal a key's secret value
    Show(key::ShowArgs),
    /// List access keys
    List(key::ListArgs),
    /// View or maintain the audit history
    History {
        #[command(subcommand)]
        command: history::HistoryCommand,
    },
    /// Manage dispatch server templates
    Server {
        #[command(subcommand)]
        command: server::ServerCommand,
    },
    /// Show or update dispatch settings
    Settings {
        #[command(subcommand)]
        command: settings::SettingsCommand,
    },
}
