//! Pathfinder CLI: career guidance from the terminal.
//!
//! Commands:
//! - `ask`     Send one message and print the reply
//! - `chat`    Interactive conversation
//! - `status`  Show configuration and connectivity
//! - `onboard` Write a default config file
//! - `assess`  Score a career interest assessment

use clap::{Args, Parser, Subcommand};
use pathfinder_core::message::{ConversationContext, EducationLevel};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "pathfinder",
    about = "Pathfinder — career guidance assistant with offline fallback",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Who is asking.
#[derive(Args, Debug, Clone)]
pub struct StudentArgs {
    /// Student's display name
    #[arg(long, default_value = "")]
    name: String,

    /// pre-high-school (class 10) or pre-college (class 12)
    #[arg(long, default_value = "pre-college")]
    level: EducationLevel,

    /// Home region, used to suggest nearby institutions
    #[arg(long, default_value = "")]
    region: String,

    /// An interest; repeat for several
    #[arg(long = "interest")]
    interests: Vec<String>,

    /// Answer from local rules only
    #[arg(long)]
    offline: bool,
}

impl StudentArgs {
    pub fn context(&self) -> ConversationContext {
        ConversationContext::new(&self.name, self.level, &self.region)
            .with_interests(self.interests.clone())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question
    Ask {
        /// The message to send
        #[arg(short, long)]
        message: String,

        #[command(flatten)]
        student: StudentArgs,

        /// Print the reply as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start an interactive conversation
    Chat {
        #[command(flatten)]
        student: StudentArgs,
    },

    /// Show configuration and connectivity
    Status,

    /// Write a default configuration file
    Onboard,

    /// Score a career interest assessment
    Assess {
        /// JSON answers file; asks interactively when omitted
        #[arg(short, long)]
        answers: Option<PathBuf>,

        /// JSON question catalogue; the built-in one is used when omitted
        #[arg(short, long)]
        catalogue: Option<PathBuf>,

        /// Print the scores as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Ask {
            message,
            student,
            json,
        } => commands::ask::run(&message, &student, json).await?,
        Commands::Chat { student } => commands::chat::run(&student).await?,
        Commands::Status => commands::status::run().await?,
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Assess {
            answers,
            catalogue,
            json,
        } => commands::assess::run(answers.as_deref(), catalogue.as_deref(), json).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn ask_parses_student_flags() {
        let cli = Cli::try_parse_from([
            "pathfinder",
            "ask",
            "-m",
            "Tell me about engineering",
            "--name",
            "Aisha Khan",
            "--level",
            "12th",
            "--region",
            "Srinagar",
            "--interest",
            "robotics",
            "--interest",
            "maths",
        ])
        .unwrap();

        let Commands::Ask { message, student, json } = cli.command else {
            panic!("expected ask");
        };
        assert_eq!(message, "Tell me about engineering");
        assert!(!json);
        let ctx = student.context();
        assert_eq!(ctx.first_name(), "Aisha");
        assert_eq!(ctx.education_level, EducationLevel::PreCollege);
        assert_eq!(ctx.interests, vec!["robotics", "maths"]);
    }

    #[test]
    fn unknown_level_is_rejected() {
        assert!(Cli::try_parse_from(["pathfinder", "ask", "-m", "hi", "--level", "phd"]).is_err());
    }
}
