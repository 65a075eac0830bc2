use clap::{Parser, Subcommand};

const HELP_EPILOG: &str = r#"Server options can also be provided via environment variables:
  CONFIG_PATH (default: ./config.yaml)
  DB_PATH     (default: data/app.db)
  PORT        (default: 8080 or config.listen_port)
  RUST_LOG    (default: info)
"#;

#[derive(Debug, Parser)]
#[command(
    name = "birdie-server",
    version,
    about = "Birdie school register server",
    long_about = None,
    after_long_help = HELP_EPILOG,
)]
pub struct Cli {
    /// Optional subcommand. Without one, runs the server.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Mint an HS256 ID token signed with the configured identity secret
    IssueToken {
        /// Email claim; selects the user row the token maps to
        #[arg(long)]
        email: String,
        /// Subject claim; used as full name when the user is first seen
        #[arg(long)]
        uid: String,
        /// Token lifetime
        #[arg(long, default_value_t = 24)]
        ttl_hours: i64,
    },
}
