use std::{
    fs::File,
    io::{self, BufRead, BufReader, ErrorKind},
    path::Path,
};

use crate::error::{CutError, Result};

/// Read buffer used for both passes over a trace.
pub const READ_BUFFER_CAPACITY: usize = 1 << 20;

/// Counts the records in the file at `path` with a single streaming pass.
pub fn count_lines(path: impl AsRef<Path>) -> Result<u64> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| CutError::io(path, e))?;
    count_records(BufReader::with_capacity(READ_BUFFER_CAPACITY, file))
        .map_err(|e| CutError::io(path, e))
}

/// Counts `\n`-terminated records in `reader`.
///
/// A trailing record without a terminator still counts. Memory use is bounded
/// by the reader's buffer, never by the length of a line.
pub fn count_records<R: BufRead>(mut reader: R) -> io::Result<u64> {
    let mut lines = 0_u64;
    let mut unterminated = false;
    loop {
        let chunk = match reader.fill_buf() {
            Ok(chunk) => chunk,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if chunk.is_empty() {
            break;
        }
        lines += chunk.iter().filter(|&&b| b == b'\n').count() as u64;
        unterminated = chunk.last() != Some(&b'\n');
        let len = chunk.len();
        reader.consume(len);
    }
    if unterminated {
        lines += 1;
    }
    Ok(lines)
}
