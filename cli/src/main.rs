#![forbid(unsafe_code)]

use std::io::IsTerminal;
use std::process::ExitCode;

use anstyle::{AnsiColor, Color, Style};
use camino::Utf8PathBuf;
use clap::builder::Styles;
use clap::{ArgAction, ArgGroup, Parser, ValueHint};
use emu8086::constants::DEFAULT_STEP_LIMIT;
use emu8086::{LoadError, Outcome, ProcessorError};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;

mod completion;
mod run;

use crate::completion::ShellKind;

const STYLES: Styles = Styles::styled()
    .header(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Yellow))))
    .usage(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Yellow))))
    .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
    .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))));

#[derive(Parser)]
#[clap(version, about, styles = STYLES, group = ArgGroup::new("format"))]
struct Opt {
    /// Flat binary program, loaded at offset 0x100
    #[clap(value_hint = ValueHint::FilePath, required_unless_present = "completions")]
    input: Option<Utf8PathBuf>,

    /// Increase the level of verbosity. Can be used multiple times.
    #[clap(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Force colored output. Default is to check if the output is a tty
    #[clap(short = 'c', long, group = "format")]
    color: bool,

    /// Force non-colored output. Default is to check if the output is a tty
    #[clap(short = 'C', long, group = "format")]
    no_color: bool,

    /// Use JSON output for log messages
    #[clap(short, long, group = "format")]
    json: bool,

    /// Stop after this many instructions
    #[clap(long, value_name = "N", default_value_t = DEFAULT_STEP_LIMIT)]
    max_steps: usize,

    /// Exit with the return code the program passed to `INT 21h/AH=4Ch`
    #[clap(long)]
    exit_code: bool,

    /// Print a completion script for the given shell and exit
    #[clap(long, value_enum, value_name = "SHELL", exclusive = true)]
    completions: Option<ShellKind>,
}

impl Opt {
    const fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "emu8086=debug,emu8086_cli=debug,info",
            2 => "emu8086=trace,emu8086_cli=trace,info",
            3..=u8::MAX => "trace",
        }
    }

    fn should_use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color {
            false
        } else {
            std::io::stdout().is_terminal()
        }
    }

    fn filter_layer(&self) -> EnvFilter {
        // Parse log level from env
        EnvFilter::try_from_default_env()
            // or infer from args
            .unwrap_or_else(|_| EnvFilter::new(self.log_filter()))
    }

    /// Process exit code for a finished run
    fn exit_status(&self, outcome: Outcome) -> ExitCode {
        match outcome {
            Outcome::Halted { code } if self.exit_code => ExitCode::from(code),
            Outcome::Halted { .. } | Outcome::StepLimit | Outcome::EndOfMemory => {
                ExitCode::SUCCESS
            }
        }
    }
}

/// Print a fatal error on stderr
fn report(err: anyhow::Error) {
    let err = match err.downcast::<ProcessorError>() {
        Ok(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            return;
        }
        Err(err) => err,
    };

    match err.downcast::<LoadError>() {
        Ok(e) => eprintln!("{:?}", miette::Report::new(e)),
        Err(err) => eprintln!("error: {err:?}"),
    }
}

fn main() -> ExitCode {
    // First, parse the arguments
    let opt = Opt::parse();

    if let Some(shell) = opt.completions {
        completion::print(shell);
        return ExitCode::SUCCESS;
    }

    // Then, setup the tracing formatter for logging and instrumentation
    let registry = tracing_subscriber::Registry::default().with(opt.filter_layer());

    if opt.json {
        let json_layer = tracing_subscriber::fmt::layer().json();
        registry.with(json_layer).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .without_time()
            .with_ansi(opt.should_use_colors())
            .with_target(false);
        registry.with(fmt_layer).init();
    }

    let Some(input) = opt.input.as_deref() else {
        // clap requires the input when no completion is requested
        return ExitCode::FAILURE;
    };

    // And run the program
    match run::exec(input, opt.max_steps) {
        Ok(outcome) => opt.exit_status(outcome),
        Err(e) => {
            report(e);
            ExitCode::FAILURE
        }
    }
}
