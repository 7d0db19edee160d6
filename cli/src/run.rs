use camino::Utf8Path;
use emu8086::runtime::StdConsole;
use emu8086::{load, Computer, Outcome};
use tracing::{debug, info};

/// Load the program at `input` and run it on the process console
pub fn exec(input: &Utf8Path, max_steps: usize) -> anyhow::Result<Outcome> {
    info!(path = %input, "Reading program");
    let program = load(input)?;
    let name = input.file_name().unwrap_or(input.as_str());

    debug!(max_steps, "Building computer");
    let mut computer = Computer::with_program(name, &program, StdConsole)?;

    info!("Running program");
    let outcome = computer.run(max_steps)?;

    info!(
        %outcome,
        steps = computer.steps,
        registers = %computer.registers,
        "End of program"
    );

    Ok(outcome)
}
