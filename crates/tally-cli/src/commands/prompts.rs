//! Prompts-related command implementations

use anyhow::Result;
use tally_core::prompts::{default_prompts_dir, PromptId, PromptLibrary};

/// Look up a prompt ID by its string form
pub fn find_prompt_id(name: &str) -> Option<PromptId> {
    PromptId::all().iter().copied().find(|id| id.as_str() == name)
}

/// List all available prompts and their override status
pub fn cmd_prompts_list() -> Result<()> {
    let mut library = PromptLibrary::new();

    println!("Available Prompts:\n");
    println!("{:<30} {:>7}  {}", "ID", "VERSION", "OVERRIDE");
    println!("{}", "-".repeat(55));

    for &id in PromptId::all() {
        let has_override = library.has_override(id);
        let version = library.get(id)?.metadata.version;
        let override_status = if has_override { "✓ Custom" } else { "Default" };

        println!("{:<30} {:>7}  {}", id.as_str(), version, override_status);
    }

    println!();
    println!(
        "Override directory: {}",
        default_prompts_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not available)".to_string())
    );

    println!();
    println!("To customize a prompt:");
    println!("  1. Copy the default to the override directory");
    println!("  2. Edit the file with your changes");
    println!("  3. Restart the server to use the new prompt");

    Ok(())
}

/// Show the content of a specific prompt
pub fn cmd_prompts_show(prompt_id: &str) -> Result<()> {
    let Some(id) = find_prompt_id(prompt_id) else {
        eprintln!("Unknown prompt ID: {}", prompt_id);
        eprintln!();
        eprintln!("Available prompts:");
        for id in PromptId::all() {
            eprintln!("  - {}", id.as_str());
        }
        return Ok(());
    };

    let mut library = PromptLibrary::new();
    let override_path = library
        .override_dir()
        .map(|dir| dir.join(format!("{}.md", id.as_str())));
    let prompt = library.get(id)?;

    println!("Prompt: {}", prompt.metadata.id);
    println!("Version: {}", prompt.metadata.version);
    println!(
        "Source: {}",
        if prompt.is_override {
            "Override"
        } else {
            "Default"
        }
    );

    if prompt.is_override {
        if let Some(path) = override_path {
            println!("Override Path: {}", path.display());
        }
    }

    println!();
    println!("--- Content ---");
    println!("{}", prompt.content);

    Ok(())
}

/// Show the path where prompt overrides should be placed
pub fn cmd_prompts_path() -> Result<()> {
    match default_prompts_dir() {
        Some(path) => {
            println!("{}", path.display());

            if !path.exists() {
                eprintln!();
                eprintln!("Note: This directory does not exist yet.");
                eprintln!("Create it to start adding custom prompts.");
            }
        }
        None => {
            eprintln!("Could not determine prompts directory.");
            eprintln!("The data directory is not available on this system.");
        }
    }

    Ok(())
}
