use std::{
    io::{stderr, stdin, stdout, Write},
    path::PathBuf,
    process::ExitCode,
};

use clap::{error::ErrorKind, Parser};
use errors::{EX_NOINPUT, EX_USAGE};
use session::{Options, Session};

/// Evaluates expressions from a script, or interactively when no script is given.
#[derive(clap::Parser)]
#[command(version)]
struct Args {
    script: Option<PathBuf>,

    /// Print every scanned token before evaluating
    #[arg(long)]
    tokens: bool,

    /// Print every parsed expression in prefix form before evaluating it
    #[arg(long)]
    ast: bool,
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(code as u8)
}

fn run_file(path: PathBuf, session: &mut Session) -> anyhow::Result<ExitCode> {
    let source = match std::fs::read_to_string(&path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Failed to open file {}: {e}", path.display());
            return Ok(exit_code(EX_NOINPUT));
        }
    };

    session.run_source(&source, &mut stdout(), &mut stderr())?;
    Ok(exit_code(session.diagnostics().exit_code()))
}

fn run_prompt(session: &mut Session) -> anyhow::Result<ExitCode> {
    loop {
        print!("> ");
        stdout().flush()?;

        let mut line = String::new();
        if stdin().read_line(&mut line)? == 0 {
            println!();
            return Ok(ExitCode::SUCCESS);
        }

        let line = line.trim_end_matches(&['\n', '\r'][..]);
        session.run_source(line, &mut stdout(), &mut stderr())?;
        // A malformed line must not poison the following ones
        session.diagnostics_mut().reset_compile_errors();
    }
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            e.print()?;
            return Ok(match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => exit_code(EX_USAGE),
            });
        }
    };

    let mut session = Session::with_options(Options { print_tokens: args.tokens, print_ast: args.ast });
    log::debug!("Starting with {:?}", args.script);

    match args.script {
        Some(script) => run_file(script, &mut session),
        None => run_prompt(&mut session),
    }
}
