use crate::cli::CliContext;
use crate::constants;
use crate::core::lifecycle::{self, DeleteOutcome};
use crate::core::paths::PanelPaths;
use crate::core::permissions;
use crate::core::store::KeyStore;
use crate::models::key::AccessKey;
use crate::models::role::Role;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Local, Utc};
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Table};
use dialoguer::Password;
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use std::io::Read;
use zeroize::Zeroizing;

fn parse_username(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        return Err("username cannot be empty".into());
    }
    Ok(s.to_string())
}

fn parse_role(s: &str) -> Result<Role, String> {
    Role::from_name(s).ok_or_else(|| {
        format!(
            "invalid role '{}', must be one of: user, admin, creator, developer",
            s
        )
    })
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Username for the new key
    #[arg(value_parser = parse_username)]
    pub username: String,

    /// Role granted to the new key
    #[arg(long, value_parser = parse_role, default_value = "user")]
    pub role: Role,

    /// Auto-generate a random key value
    #[arg(long)]
    pub auto: bool,

    /// Length for the auto-generated value
    #[arg(long, default_value_t = constants::DEFAULT_GENERATED_KEY_LENGTH)]
    pub length: usize,

    /// Read the key value from stdin instead of an interactive prompt
    #[arg(long)]
    pub from_stdin: bool,

    /// Days until the key expires (omit for a non-expiring key)
    #[arg(long, value_name = "DAYS")]
    pub expires_in: Option<i64>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Key id or username
    pub target: String,
}

#[derive(Args, Debug)]
pub struct RotateArgs {
    /// Auto-generate the new value
    #[arg(long)]
    pub auto: bool,

    /// Length for the auto-generated value
    #[arg(long, default_value_t = constants::DEFAULT_GENERATED_KEY_LENGTH)]
    pub length: usize,

    /// Read the new value from stdin instead of an interactive prompt
    #[arg(long)]
    pub from_stdin: bool,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Key id or username
    pub target: String,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output format: table|json
    #[arg(long, default_value = "table")]
    pub format: String,
}

pub fn run_add(ctx: &CliContext, actor: &AccessKey, args: AddArgs) -> Result<()> {
    if ctx.non_interactive && !args.from_stdin && !args.auto {
        bail!("--non-interactive requires --from-stdin or --auto for add");
    }

    let value: Zeroizing<String> = if args.auto {
        Zeroizing::new(generate_secret(args.length))
    } else {
        read_secret(args.from_stdin, &args.username)?
    };

    let expires_at = args
        .expires_in
        .map(|days| Utc::now() + Duration::days(days));
    let key = lifecycle::add_key(
        &ctx.paths,
        actor,
        &args.username,
        &value,
        args.role,
        expires_at,
    )?;

    println!("created {} key '{}' (id {})", key.role, key.username, key.id);
    if args.auto {
        // shown once; recovering it later takes reveal rights
        println!("value: {}", value.as_str());
    }
    Ok(())
}

pub fn run_delete(ctx: &CliContext, actor: &AccessKey, args: DeleteArgs) -> Result<()> {
    let id = resolve_target_id(&ctx.paths, &args.target)?;
    match lifecycle::delete_key(&ctx.paths, actor, &id)? {
        DeleteOutcome::Deleted { username } => println!("deleted key '{}'", username),
        DeleteOutcome::AlreadyGone => {
            println!("no key '{}', nothing to delete", args.target)
        }
    }
    Ok(())
}

pub fn run_rotate(ctx: &CliContext, actor: &AccessKey, args: RotateArgs) -> Result<()> {
    if ctx.non_interactive && !args.from_stdin && !args.auto {
        bail!("--non-interactive requires --from-stdin or --auto for rotate");
    }

    let value: Zeroizing<String> = if args.auto {
        Zeroizing::new(generate_secret(args.length))
    } else {
        read_secret(args.from_stdin, &actor.username)?
    };

    lifecycle::rotate_key(&ctx.paths, actor, &value)?;
    println!(
        "rotated key for '{}'; the old value no longer authenticates",
        actor.username
    );
    if args.auto {
        println!("value: {}", value.as_str());
    }
    Ok(())
}

pub fn run_show(ctx: &CliContext, actor: &AccessKey, args: ShowArgs) -> Result<()> {
    let id = resolve_target_id(&ctx.paths, &args.target)?;
    let value = lifecycle::reveal_key(&ctx.paths, actor, &id)?;
    println!("{}", value);
    Ok(())
}

pub fn run_list(ctx: &CliContext, actor: &AccessKey, args: ListArgs) -> Result<()> {
    if args.format != "table" && args.format != "json" {
        bail!("invalid format: {} (use table|json)", args.format);
    }

    let keys = lifecycle::list_keys(&ctx.paths, actor)?;

    if args.format == "json" {
        let rows: Vec<serde_json::Value> = keys
            .iter()
            .map(|k| {
                serde_json::json!({
                    "id": k.id,
                    "username": k.username,
                    "role": k.role,
                    "value": visible_value(actor, k),
                    "expires_at": k.expires_at,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows).context("serialize key list")?);
        return Ok(());
    }

    if keys.is_empty() {
        println!("No keys found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Username").add_attribute(Attribute::Bold),
        Cell::new("Role").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
        Cell::new("Expires").add_attribute(Attribute::Bold),
        Cell::new("Id").add_attribute(Attribute::Bold),
    ]);

    for key in &keys {
        let expires = match key.expires_at {
            Some(t) => {
                let local: DateTime<Local> = t.into();
                local.format("%Y-%m-%d %H:%M:%S").to_string()
            }
            None => "-".to_string(),
        };
        table.add_row(vec![
            key.username.clone(),
            key.role.to_string(),
            visible_value(actor, key),
            expires,
            key.id.clone(),
        ]);
    }

    println!("{}", table);
    println!("\n{} keys.", keys.len());
    Ok(())
}

/// Accept either a document id or a username. Unknown targets resolve to
/// themselves, so delete stays idempotent and show reports not-found.
fn resolve_target_id(paths: &PanelPaths, target: &str) -> Result<String> {
    let store = KeyStore::open(paths);
    if let Some(key) = store.find_by_id(target)? {
        return Ok(key.id);
    }
    if let Some(key) = store.find_by_username(target)? {
        return Ok(key.id);
    }
    Ok(target.to_string())
}

/// A key's value is printed only when the permission engine lets the
/// actor see it, or when it is the actor's own key.
fn visible_value(actor: &AccessKey, key: &AccessKey) -> String {
    if key.id == actor.id || permissions::can_view(actor.role, key) {
        key.value.clone()
    } else {
        "<hidden>".to_string()
    }
}

fn read_secret(from_stdin: bool, username: &str) -> Result<Zeroizing<String>> {
    let secret = if from_stdin {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read key value from stdin")?;
        Zeroizing::new(buf.trim_end_matches(['\r', '\n']).to_string())
    } else {
        Zeroizing::new(
            Password::new()
                .with_prompt(format!("Key value for {}", username))
                .allow_empty_password(false)
                .interact()
                .context("read key value from prompt")?,
        )
    };
    if secret.len() > constants::MAX_SECRET_SIZE {
        bail!(
            "key value exceeds maximum size ({} bytes, max {} bytes)",
            secret.len(),
            constants::MAX_SECRET_SIZE
        );
    }
    Ok(secret)
}

fn generate_secret(length: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: &str, value: &str, role: Role) -> AccessKey {
        AccessKey {
            id: id.to_string(),
            username: format!("user-{}", id),
            value: value.to_string(),
            role,
            expires_at: None,
        }
    }

    #[test]
    fn test_parse_username_rejects_blank() {
        assert!(parse_username("alice").is_ok());
        assert!(parse_username("Gx 正式").is_ok());
        assert!(parse_username("").is_err());
        assert!(parse_username("   ").is_err());
    }

    #[test]
    fn test_parse_role_names() {
        assert_eq!(parse_role("admin").unwrap(), Role::Admin);
        assert_eq!(parse_role("developer").unwrap(), Role::Developer);
        assert!(parse_role("superuser").is_err());
    }

    #[test]
    fn test_generate_secret_is_alphanumeric() {
        let secret = generate_secret(24);
        assert_eq!(secret.len(), 24);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_visible_value_masks_unless_permitted_or_own() {
        let admin = key("a", "adm1", Role::Admin);
        let user = key("u", "u1", Role::User);
        let peer = key("p", "p1", Role::Admin);

        assert_eq!(visible_value(&admin, &user), "u1");
        assert_eq!(visible_value(&admin, &peer), "<hidden>");
        assert_eq!(visible_value(&admin, &admin), "adm1");
    }
}
