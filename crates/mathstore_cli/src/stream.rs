//! Reading command input and writing command output.

use std::io::{self, Read, Write};
use std::path::Path;

/// Reads all bytes from `input`, where `-` means stdin.
pub fn read_input(input: &str) -> io::Result<Vec<u8>> {
    if input == "-" {
        let mut buf = Vec::new();
        io::stdin().lock().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read(Path::new(input))
    }
}

/// Writes `data` to `output`, or to stdout when no path is given.
pub fn write_output(output: Option<&str>, data: &[u8]) -> io::Result<()> {
    match output {
        Some(path) => std::fs::write(Path::new(path), data),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(data)?;
            stdout.flush()
        }
    }
}
