use clap::Parser;
use nu_ansi_term::Color;
use tracing_subscriber::EnvFilter;

use docsync::Client;
use docsync_cli::{commands, Args};

fn main() {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&args) {
        eprintln!("{} {}", Color::Red.bold().paint("error:"), e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), commands::CommandError> {
    let client = Client::new(args.config()?)?;
    if let Some(token) = &args.session_token {
        client.session().set_session_token(Some(token.clone()));
    }

    let output = commands::execute(&client, &args.command)?;
    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", output),
    }
    Ok(())
}
