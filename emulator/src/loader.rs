use camino::{Utf8Path, Utf8PathBuf};
use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error("failed to load {path}")]
    #[diagnostic(code(emu8086::load))]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("program size {size} too big (at most {max} bytes)")]
    #[diagnostic(code(emu8086::program_too_large))]
    TooLarge { size: usize, max: usize },
}

/// Read a flat program image
///
/// # Errors
///
/// Fails if the file can not be read.
pub fn load(path: &Utf8Path) -> Result<Vec<u8>, LoadError> {
    let program = std::fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_owned(),
        source,
    })?;
    debug!(%path, size = program.len(), "Read program image");
    Ok(program)
}
