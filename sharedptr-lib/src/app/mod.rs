mod scenario;

use io_trait::Io;
use log::info;
use std::io::{self, Error};

pub use self::scenario::{execute, ScenarioError, ScenarioErrorKind};

/// `<program> <input> <output>`: runs the script in `input` and writes the report to `output`.
pub fn run(io: &impl Io) -> io::Result<()> {
    let mut a = io.args();
    a.next();
    let input = a.next().ok_or_else(|| Error::other("missing input path"))?;
    let output = a.next().ok_or_else(|| Error::other("missing output path"))?;
    let script = io.read_to_string(input.as_str())?;
    let report = execute(&script).map_err(Error::other)?;
    io.write(output.as_str(), report.as_bytes())?;
    info!("{input}: report written to {output}");
    Ok(())
}
