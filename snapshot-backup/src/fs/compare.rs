//! Byte-exact content comparison.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

const COMPARE_BUFFER_SIZE: usize = 64 * 1024;

/// Compare two files by full content.
///
/// Differing lengths short-circuit; otherwise both files are read to the end.
pub fn files_identical(left: &Path, right: &Path) -> io::Result<bool> {
    let left_file = File::open(left)?;
    let right_file = File::open(right)?;

    if left_file.metadata()?.len() != right_file.metadata()?.len() {
        return Ok(false);
    }

    readers_identical(
        BufReader::with_capacity(COMPARE_BUFFER_SIZE, left_file),
        BufReader::with_capacity(COMPARE_BUFFER_SIZE, right_file),
    )
}

fn readers_identical<L: Read, R: Read>(mut left: L, mut right: R) -> io::Result<bool> {
    let mut left_buf = vec![0u8; COMPARE_BUFFER_SIZE];
    let mut right_buf = vec![0u8; COMPARE_BUFFER_SIZE];

    loop {
        let read = fill(&mut left, &mut left_buf)?;
        let right_read = fill(&mut right, &mut right_buf)?;

        if read != right_read || left_buf[..read] != right_buf[..read] {
            return Ok(false);
        }
        if read == 0 {
            return Ok(true);
        }
    }
}

/// Read until the buffer is full or the reader is exhausted.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
