mod cli;
mod prompt;
mod settings;
mod shell;

use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use mx_auth::{CredentialStore, FileCredentialStore, IdentityContext, XblAuthClient};
use mx_package::{ContentId, PackageClient};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Mode};
use crate::prompt::ConsoleSignInPrompt;
use crate::settings::Settings;
use crate::shell::{diagnostic, Shell};

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "warn,msixvc_dl=debug,mx_auth=debug,mx_package=debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.wants_help() {
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    }

    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mode = cli.mode();
    let interactive = mode == Mode::Interactive;

    // Reject a malformed id before asking anyone to sign in
    if let Mode::Single(content_id) = &mode
        && let Err(e) = content_id.parse::<ContentId>()
    {
        eprintln!("{}", diagnostic(&e));
        return Ok(ExitCode::FAILURE);
    }

    if interactive {
        println!("Initializing...");
    }

    let settings = Settings::load(cli.config.as_deref())?;
    let auth_client = XblAuthClient::new(settings.auth_config()?)?;
    let package_client = PackageClient::new(settings.package_config()?)?;

    let token_path = match cli.token_file {
        Some(path) => path,
        None => FileCredentialStore::default_path()?,
    };
    let store = Arc::new(FileCredentialStore::new(token_path));
    if interactive && store.load().await.is_some_and(|bundle| !bundle.is_usable()) {
        println!("Token expired, please reauthenticate!");
    }

    let prompt = Arc::new(ConsoleSignInPrompt::new(cli.auth_url_file, interactive));
    let identity = IdentityContext::new(auth_client, store, prompt);

    if let Err(e) = identity.initialize().await {
        eprintln!("Authentication failed: {e}");
        return Ok(ExitCode::FAILURE);
    }

    if interactive {
        println!("Initialization finished!");
    }

    let shell = Shell::new(identity, package_client);
    match mode {
        Mode::Single(content_id) => match shell.run_single(&content_id).await {
            Ok(()) => Ok(ExitCode::SUCCESS),
            Err(e) => {
                eprintln!("{}", diagnostic(&e));
                Ok(ExitCode::FAILURE)
            }
        },
        Mode::Interactive => {
            shell.run_interactive().await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
