//! # Resham Storefront Entry Point
//!
//! ```text
//! resham-storefront [--config <path>]
//! ```
//!
//! Without `--config` the platform config directory is searched for
//! `storefront.toml`; defaults apply when it is absent. `RESHAM_*`
//! environment variables override both.

use std::path::PathBuf;

use resham_storefront::state::StorefrontConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    resham_storefront::init_tracing();

    let mut config_path: Option<PathBuf> = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                config_path = Some(PathBuf::from(args.next().ok_or("--config needs a path")?));
            }
            "--help" | "-h" => {
                println!("Usage: resham-storefront [--config <path>]");
                return Ok(());
            }
            other => return Err(format!("Unknown argument: {}", other).into()),
        }
    }

    let config = StorefrontConfig::load(config_path)?;
    resham_storefront::run(config).await?;
    Ok(())
}
