pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};

use crate::auth::Role;

#[derive(Parser)]
#[command(name = "registrar")]
#[command(about = "Registrar admin CLI - schema, fixtures, tokens and transcripts")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create the registrar tables in DATABASE_URL")]
    Migrate,

    #[command(about = "Load a YAML fixture into DATABASE_URL")]
    Seed {
        #[arg(help = "Path to the fixture file")]
        fixture: String,
    },

    #[command(about = "Mint a bearer token with the configured secret")]
    Token {
        #[arg(long, help = "Subject: student id, instructor id or admin user")]
        sub: String,
        #[arg(long, value_parser = parse_role, help = "student, instructor or admin")]
        role: Role,
    },

    #[command(about = "Print a bcrypt hash for fixtures or ADMIN_PASSWORD_HASH")]
    HashPassword {
        #[arg(help = "Plain-text password")]
        password: String,
        #[arg(long, default_value_t = crate::auth::DEFAULT_COST, help = "bcrypt cost (4-31)")]
        cost: u32,
    },

    #[command(about = "Print a student's transcript from DATABASE_URL")]
    Transcript {
        #[arg(help = "Student id")]
        student_id: String,
    },
}

fn parse_role(value: &str) -> Result<Role, String> {
    value.parse()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Migrate => commands::database::migrate(output_format).await,
        Commands::Seed { fixture } => commands::database::seed(&fixture, output_format).await,
        Commands::Token { sub, role } => commands::auth::token(&sub, role, output_format),
        Commands::HashPassword { password, cost } => commands::auth::hash_password(&password, cost, output_format),
        Commands::Transcript { student_id } => commands::transcript::show(&student_id, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_token_command() {
        let cli = Cli::try_parse_from(["registrar", "token", "--sub", "10101", "--role", "instructor"]).unwrap();
        match cli.command {
            Commands::Token { sub, role } => {
                assert_eq!(sub, "10101");
                assert_eq!(role, Role::Instructor);
            }
            _ => panic!("expected token command"),
        }
    }

    #[test]
    fn json_flag_is_global() {
        let cli = Cli::try_parse_from(["registrar", "transcript", "00128", "--json"]).unwrap();
        assert_eq!(OutputFormat::from_cli(&cli), OutputFormat::Json);
    }

    #[test]
    fn rejects_unknown_roles() {
        assert!(Cli::try_parse_from(["registrar", "token", "--sub", "x", "--role", "dean"]).is_err());
    }

    #[test]
    fn hash_password_cost_defaults_to_bcrypt_default() {
        let cli = Cli::try_parse_from(["registrar", "hash-password", "pass128"]).unwrap();
        match cli.command {
            Commands::HashPassword { password, cost } => {
                assert_eq!(password, "pass128");
                assert_eq!(cost, crate::auth::DEFAULT_COST);
            }
            _ => panic!("expected hash-password command"),
        }

        let cli = Cli::try_parse_from(["registrar", "hash-password", "pass128", "--cost", "4"]).unwrap();
        assert!(matches!(cli.command, Commands::HashPassword { cost: 4, .. }));
    }
}
