//! Command-line interface definitions
//!
//! Commands:
//!   review  Review archives against a user story
//!   list    List files currently stored remotely
//!   purge   Delete all remotely stored files, then list what's left

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// storycheck - review packaged source archives against a user story
#[derive(Parser, Debug)]
#[command(name = "storycheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output NDJSON events for CI
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Review one or more source archives against a user story
    Review {
        /// Path to a source archive (repeatable; order defines the
        /// 1-based placeholder indices)
        #[arg(short = 'z', long = "archive", required = true)]
        archives: Vec<PathBuf>,

        /// Path to the user story document
        #[arg(short, long)]
        story: PathBuf,

        /// Path to the acceptance criteria document
        #[arg(short, long)]
        criteria: Option<PathBuf>,

        /// Path to a custom prompt template
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Path to save the feedback report (printed to the console when
        /// omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also print the feedback to the console
        #[arg(long)]
        show_feedback: bool,

        /// Print the composed prompt before sending it
        #[arg(long)]
        show_prompt: bool,

        /// Save the composed prompt for inspection
        #[arg(long, value_name = "PATH")]
        save_prompt: Option<PathBuf>,

        /// Keep this session's uploads in the remote store
        #[arg(long)]
        keep_files: bool,

        /// Review work in progress instead of a finished change
        #[arg(long)]
        in_progress: bool,
    },

    /// List files currently stored in the remote store
    List,

    /// Delete every remotely stored file, then list what's left
    Purge,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_review_minimal() {
        let cli = Cli::try_parse_from([
            "storycheck",
            "review",
            "-z",
            "project.zip",
            "-s",
            "story.txt",
        ])
        .unwrap();
        if let Commands::Review {
            archives,
            story,
            criteria,
            output,
            keep_files,
            ..
        } = cli.command
        {
            assert_eq!(archives, vec![PathBuf::from("project.zip")]);
            assert_eq!(story, PathBuf::from("story.txt"));
            assert!(criteria.is_none());
            assert!(output.is_none());
            assert!(!keep_files);
        } else {
            panic!("Expected Review command");
        }
    }

    #[test]
    fn test_cli_parse_review_multiple_archives_in_order() {
        let cli = Cli::try_parse_from([
            "storycheck",
            "review",
            "-z",
            "a.zip",
            "--archive",
            "b.zip",
            "-z",
            "c.zip",
            "-s",
            "story.txt",
        ])
        .unwrap();
        if let Commands::Review { archives, .. } = cli.command {
            assert_eq!(
                archives,
                vec![
                    PathBuf::from("a.zip"),
                    PathBuf::from("b.zip"),
                    PathBuf::from("c.zip")
                ]
            );
        } else {
            panic!("Expected Review command");
        }
    }

    #[test]
    fn test_cli_parse_review_full() {
        let cli = Cli::try_parse_from([
            "storycheck",
            "review",
            "-z",
            "a.zip",
            "-s",
            "story.txt",
            "-c",
            "criteria.txt",
            "-t",
            "template.txt",
            "-o",
            "feedback.md",
            "--show-feedback",
            "--show-prompt",
            "--save-prompt",
            "prompt.txt",
            "--keep-files",
            "--in-progress",
        ])
        .unwrap();
        if let Commands::Review {
            criteria,
            template,
            output,
            show_feedback,
            show_prompt,
            save_prompt,
            keep_files,
            in_progress,
            ..
        } = cli.command
        {
            assert_eq!(criteria, Some(PathBuf::from("criteria.txt")));
            assert_eq!(template, Some(PathBuf::from("template.txt")));
            assert_eq!(output, Some(PathBuf::from("feedback.md")));
            assert!(show_feedback);
            assert!(show_prompt);
            assert_eq!(save_prompt, Some(PathBuf::from("prompt.txt")));
            assert!(keep_files);
            assert!(in_progress);
        } else {
            panic!("Expected Review command");
        }
    }

    #[test]
    fn test_cli_review_requires_archive_and_story() {
        assert!(Cli::try_parse_from(["storycheck", "review", "-s", "story.txt"]).is_err());
        assert!(Cli::try_parse_from(["storycheck", "review", "-z", "a.zip"]).is_err());
    }

    #[test]
    fn test_cli_parse_list() {
        let cli = Cli::try_parse_from(["storycheck", "list"]).unwrap();
        assert!(matches!(cli.command, Commands::List));
    }

    #[test]
    fn test_cli_parse_purge() {
        let cli = Cli::try_parse_from(["storycheck", "purge"]).unwrap();
        assert!(matches!(cli.command, Commands::Purge));
    }

    #[test]
    fn test_cli_json_flag_is_global() {
        let cli = Cli::try_parse_from(["storycheck", "list", "--json"]).unwrap();
        assert!(cli.json);
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["storycheck", "-vv", "list"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
