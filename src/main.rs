//! storycheck CLI - review packaged source archives against a user story
//!
//! Usage: storycheck <COMMAND>
//!
//! Commands:
//!   review  Upload archives, compose the prompt, request a review
//!   list    List files currently stored remotely
//!   purge   Delete all remotely stored files, then list what's left

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use is_terminal::IsTerminal;

use storycheck::cli::{Cli, Commands};
use storycheck::session::{ReviewSession, SessionEvent, SessionOptions};
use storycheck::upload::UploadEvent;
use storycheck::{AssetRegistry, Config, GeminiClient, RemoteFile, ReviewFocus};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let (config, warnings) = Config::load_or_default();
    if !cli.json {
        for warning in &warnings {
            eprintln!(
                "⚠ Unknown config key '{}' in {}",
                warning.key,
                warning.file.display()
            );
        }
    }

    match cli.command {
        Commands::Review {
            archives,
            story,
            criteria,
            template,
            output,
            show_feedback,
            show_prompt,
            save_prompt,
            keep_files,
            in_progress,
        } => {
            let options = SessionOptions {
                archives,
                story,
                criteria,
                template,
                output,
                save_prompt,
                show_prompt,
                show_feedback,
                keep_uploads: keep_files,
                focus: if in_progress {
                    ReviewFocus::InProgress
                } else {
                    ReviewFocus::Completed
                },
            };
            cmd_review(options, &config, cli.json, cli.verbose)
        }
        Commands::List => cmd_list(&config, cli.json),
        Commands::Purge => cmd_purge(&config, cli.json),
    }
}

/// Resolve an input path to absolute form, failing early when it is missing
fn resolve_input(path: &Path) -> Result<PathBuf> {
    path.canonicalize()
        .with_context(|| format!("cannot resolve path: {}", path.display()))
}

fn cmd_review(mut options: SessionOptions, config: &Config, json: bool, verbose: u8) -> Result<()> {
    options.archives = options
        .archives
        .iter()
        .map(|p| resolve_input(p))
        .collect::<Result<Vec<_>>>()?;
    options.story = resolve_input(&options.story)?;
    if let Some(criteria) = options.criteria.take() {
        options.criteria = Some(resolve_input(&criteria)?);
    }
    if let Some(template) = options.template.take() {
        options.template = Some(resolve_input(&template)?);
    }

    if !json {
        println!("📦 storycheck review");
        for archive in &options.archives {
            println!("Archive: {}", archive.display());
        }
        println!("Story: {}", options.story.display());
        if let Some(criteria) = &options.criteria {
            println!("Criteria: {}", criteria.display());
        }
        if let Some(template) = &options.template {
            println!("Template: {}", template.display());
        }
        println!();
    }

    let client = GeminiClient::new(config)?;
    let session = ReviewSession::new(&client, &client, config);
    let on_event = |event: &SessionEvent| {
        if json {
            println!("{}", event.to_json());
        } else {
            render_event(event, verbose);
        }
    };
    session.run(&options, &on_event)?;
    Ok(())
}

fn cmd_list(config: &Config, json: bool) -> Result<()> {
    let client = GeminiClient::new(config)?;
    let registry = AssetRegistry::new(&client);
    let files = registry.list_all()?;

    if json {
        println!("{}", SessionEvent::StoredFiles { files }.to_json());
    } else {
        render_listing(&files);
    }
    Ok(())
}

fn cmd_purge(config: &Config, json: bool) -> Result<()> {
    let client = GeminiClient::new(config)?;
    let registry = AssetRegistry::new(&client);

    if !json {
        println!("🧹 Cleaning up all stored files ...");
    }
    let report = registry.delete_all()?;

    if json {
        println!("{}", SessionEvent::CleanupComplete { report }.to_json());
        let files = registry.list_all()?;
        println!("{}", SessionEvent::StoredFiles { files }.to_json());
    } else {
        println!(
            "  Deleted {} file{}.",
            report.deleted.len(),
            if report.deleted.len() == 1 { "" } else { "s" }
        );
        for (name, reason) in &report.failed {
            eprintln!("  ✗ Could not delete {name}: {reason}");
        }
        let files = registry.list_all()?;
        render_listing(&files);
    }
    Ok(())
}

/// Human rendering of session progress
fn render_event(event: &SessionEvent, verbose: u8) {
    match event {
        SessionEvent::Upload(upload) => render_upload_event(upload, verbose),
        SessionEvent::PromptComposed { bytes } => {
            if verbose > 0 {
                println!("✓ Prompt composed ({bytes} bytes)");
            }
        }
        SessionEvent::PromptPreview { text } => {
            println!("\n--- Prompt ---\n\n{text}\n\n--- End Prompt ---");
        }
        SessionEvent::PromptSaved { path } => {
            println!("✓ Prompt saved to: {}", path.display());
        }
        SessionEvent::Generating { model } => {
            println!("\n🔎 Sending request to {model} ...");
        }
        SessionEvent::FeedbackSaved { path } => {
            println!("\n✓ Feedback saved to: {}", path.display());
        }
        SessionEvent::Feedback { text } => {
            if std::io::stdout().is_terminal() {
                println!("\n--- Feedback ---\n\n{text}\n\n--- End Feedback ---");
            } else {
                println!("{text}");
            }
        }
        SessionEvent::CleanupSkipped => {
            println!("\nKeeping uploaded files (--keep-files).");
        }
        SessionEvent::CleanupComplete { report } => {
            println!(
                "\n🧹 Cleanup: deleted {} file{}.",
                report.deleted.len(),
                if report.deleted.len() == 1 { "" } else { "s" }
            );
            for (name, reason) in &report.failed {
                eprintln!("  ✗ Could not delete {name}: {reason}");
            }
        }
        SessionEvent::StoredFiles { files } => render_listing(files),
        SessionEvent::ListingFailed { reason } => {
            eprintln!("✗ Error listing stored files: {reason}");
        }
    }
}

fn render_upload_event(event: &UploadEvent, verbose: u8) {
    match event {
        UploadEvent::Submitted { name, id } => println!("⬆ Uploading {name} ({id}) ..."),
        UploadEvent::Polled {
            name,
            state,
            attempt,
        } => {
            if verbose > 0 {
                println!("  {name} state={state}; poll {attempt}");
            }
        }
        UploadEvent::Activated { name, uri } => println!("  ✓ {name} is ACTIVE (URI: {uri})"),
        UploadEvent::ChecksumMismatch {
            name,
            local,
            remote,
        } => {
            eprintln!("  ⚠ Checksum mismatch for {name}: local {local}, remote {remote}");
        }
        UploadEvent::Failed { name } => eprintln!("  ✗ {name} failed remotely"),
        UploadEvent::TimedOut { name, attempts } => {
            eprintln!("  ✗ {name} still not ready after {attempts} polls");
        }
    }
}

/// Listing of what the remote store currently holds
fn render_listing(files: &[RemoteFile]) {
    println!("\nCurrently stored files in the remote store:");
    if files.is_empty() {
        println!("  (none)");
        return;
    }
    for file in files {
        let mut line = format!("  • {} (state={}", file.id, file.state);
        if let Some(name) = &file.display_name {
            line.push_str(&format!(", name={name}"));
        }
        if let Some(size) = file.size_bytes {
            line.push_str(&format!(", {size} bytes"));
        }
        if let Some(expires) = file.expire_time {
            line.push_str(&format!(", expires {}", expires.format("%Y-%m-%d %H:%M UTC")));
        }
        line.push(')');
        println!("{line}");
    }
}
