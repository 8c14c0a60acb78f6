use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::{LogError, Result};

/// Whether the path names a zstd-compressed file.
pub fn is_zstd(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zst"))
}

/// File name with any `.zst` suffix removed.
///
/// Format detection looks at this name, so `trace.bin.zst` is still a binary trace.
pub fn logical_name(path: &Path) -> String {
    let name = if is_zstd(path) {
        path.file_stem()
    } else {
        path.file_name()
    };
    name.and_then(|n| n.to_str()).unwrap_or("").to_string()
}

/// Open a log or trace for buffered reading, decompressing `.zst` inputs on the fly.
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).map_err(|e| LogError::io(path, e))?;
    if is_zstd(path) {
        let decoder = zstd::stream::read::Decoder::new(file).map_err(|e| LogError::io(path, e))?;
        Ok(Box::new(BufReader::new(decoder)))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Iterate over the lines of a reader without failing on invalid UTF-8.
///
/// Simulator logs occasionally carry raw console bytes; those lines are decoded
/// lossily and then rejected by the grammar like any other chatter.
pub(crate) struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> LossyLines<R> {
    pub(crate) const fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = std::io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => Some(Ok(String::from_utf8_lossy(&self.buf).into_owned())),
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn test_logical_name_strips_zst() {
        assert_eq!(logical_name(Path::new("/tmp/trace.bin.zst")), "trace.bin");
        assert_eq!(logical_name(Path::new("spike.log")), "spike.log");
        assert_eq!(logical_name(Path::new("trace.bin.ZST")), "trace.bin");
        assert!(is_zstd(Path::new("a/b/debug.txt.ZST")));
        assert!(!is_zstd(Path::new("debug.txt")));
    }

    #[test]
    fn test_lossy_lines_tolerates_invalid_utf8() {
        let data: &[u8] = b"first\n\xff\xfe garbage\nlast";
        let lines: Vec<String> = LossyLines::new(Cursor::new(data))
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "first\n");
        assert!(lines[1].ends_with("garbage\n"));
        assert_eq!(lines[2], "last");
    }

    #[test]
    fn test_open_input_decompresses_zstd() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spike.log.zst");
        let compressed = zstd::encode_all(&b"hello\nworld\n"[..], 3).unwrap();
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&compressed)
            .unwrap();

        let lines: Vec<String> = open_input(&path)
            .unwrap()
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines, vec!["hello", "world"]);
    }

    #[test]
    fn test_open_input_missing_file() {
        let err = open_input(Path::new("/nonexistent/spike.log")).err().unwrap();
        assert!(err.to_string().contains("/nonexistent/spike.log"));
    }
}
