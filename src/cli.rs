//! Command line interface definition

use std::path::PathBuf;

use clap::Parser;

/// Print direct download links for MSIXVC packages
#[derive(Parser, Debug)]
#[command(name = "msixvc-dl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Print direct download links for MSIXVC packages from Xbox Live")]
#[command(
    after_help = "Without a content id the tool runs interactively and asks for ids on standard input.\n\
                  The first run requires signing in to Xbox Live through your browser."
)]
pub struct Cli {
    /// Content id (GUID) of the package; prints bare URLs and exits
    #[arg(value_name = "CONTENT_ID")]
    pub content_id: Option<String>,

    /// Use alternate settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Credential file (default: token.json next to the executable)
    #[arg(long, value_name = "PATH")]
    pub token_file: Option<PathBuf>,

    /// File holding the sign-in redirect URL instead of reading it from stdin
    #[arg(long, value_name = "PATH")]
    pub auth_url_file: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// How the shell consumes content ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Interactive,
    Single(String),
}

impl Cli {
    /// `help` as the only argument behaves like `--help`
    pub fn wants_help(&self) -> bool {
        self.content_id.as_deref() == Some("help")
    }

    pub fn mode(&self) -> Mode {
        match &self.content_id {
            Some(id) => Mode::Single(id.clone()),
            None => Mode::Interactive,
        }
    }
}
