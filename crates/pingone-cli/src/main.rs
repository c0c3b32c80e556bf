use clap::Parser;

mod cli;
pub mod exit_codes;

use cli::args::Cli;
use cli::commands::{dispatch, load_settings};
use pingone_cache::{Redactor, SecretRedactor};

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = Cli::parse();

    let settings = match load_settings(&cli.global) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {}", SecretRedactor::new().redact(&format!("{e:#}")));
            std::process::exit(exit_codes::for_error(&e));
        }
    };
    let redactor = settings
        .log_settings()
        .secrets
        .into_iter()
        .fold(SecretRedactor::new(), SecretRedactor::with_secret);

    let code = match dispatch(cli, &settings).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", redactor.redact(&format!("{e:#}")));
            exit_codes::for_error(&e)
        }
    };
    std::process::exit(code);
}
