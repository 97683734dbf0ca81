//! Server command implementation

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub async fn cmd_serve(
    host: &str,
    port: u16,
    static_dir: Option<&Path>,
    upload_dir: Option<PathBuf>,
    allow_any_origin: bool,
) -> Result<()> {
    let mut config = tally_server::ServerConfig::from_env();
    if let Some(dir) = upload_dir {
        config.upload_dir = dir;
    }
    if allow_any_origin {
        config.allow_any_origin = true;
    }

    println!("🚀 Starting Tally web server...");
    println!("   Listening: http://{}:{}", host, port);
    println!("   Uploads: {}", config.upload_dir.display());
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }
    if config.allow_any_origin {
        println!();
        println!("   ⚠️  CORS allows any origin - do not expose to network!");
    } else if !config.allowed_origins.is_empty() {
        println!(
            "   🌐 Allowed origins: {} (TALLY_ALLOWED_ORIGINS)",
            config.allowed_origins.join(", ")
        );
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let static_dir_str = match static_dir {
        Some(dir) => Some(
            dir.to_str()
                .with_context(|| format!("Static dir is not valid UTF-8: {}", dir.display()))?,
        ),
        None => None,
    };

    tally_server::serve(host, port, static_dir_str, config).await
}
