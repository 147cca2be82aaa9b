use crate::cli::CliContext;
use crate::constants;
use crate::core::lifecycle;
use anyhow::{Context, Result};
use clap::Args;
use std::fs;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Seed the first developer key if the key collection is empty
    #[arg(long)]
    pub seed: bool,
}

pub fn run(ctx: &CliContext, args: InitArgs) -> Result<()> {
    let root = &ctx.paths.root;
    fs::create_dir_all(root).with_context(|| format!("create panel root {}", root.display()))?;

    #[cfg(unix)]
    {
        let perm = fs::Permissions::from_mode(constants::PANEL_DIR_MODE);
        fs::set_permissions(root, perm)
            .with_context(|| format!("set permissions on {}", root.display()))?;
    }

    println!("panel initialized at {}", root.display());

    if args.seed {
        match lifecycle::seed(&ctx.paths, &ctx.config)? {
            Some(key) => println!("seeded developer key '{}'", key.username),
            None => println!("key collection not empty; seed skipped"),
        }
    }

    Ok(())
}
