//! Source file encoding detection, per the two-line encoding declaration convention (PEPs 263
//! and 3120).
//!
//! A source file may declare its encoding in a comment on either of its first two lines, matching
//! `coding[:=]\s*([-\w.]+)`. Files without a declaration are UTF-8. Lines may end in `\n`, `\r`
//! or `\r\n`.

use std::{
	fs,
	io::{self, BufRead, BufReader},
	path::Path,
};

use once_cell::sync::Lazy;
use regex::bytes::Regex;

use cyutils_base::SourceEncoding;

use crate::paths::decode_filename;

mod source_reader;
pub use source_reader::SourceReader;

/// Encoding assumed when a file doesn't declare one.
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// Number of lines searched for an encoding declaration.
pub const DECLARATION_LINES: usize = 2;

// ASCII-only \w and \s
static ENCODING_DECLARATION: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"(?-u)coding[:=]\s*([-\w.]+)").expect("encoding declaration pattern is valid")
});

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("io error: {0}")]
	Io(#[source] io::Error),
	#[error("unknown encoding '{0}'")]
	UnknownEncoding(String),
	#[error("input is not valid {encoding} (malformed sequence at byte {offset})")]
	MalformedInput { encoding: &'static str, offset: u64 },
}

impl From<io::Error> for Error {
	fn from(e: io::Error) -> Self {
		// unwrap decode failures that `SourceReader` had to smuggle through `io::Read`
		match e.get_ref().and_then(|inner| inner.downcast_ref::<Error>()) {
			Some(&Error::MalformedInput { encoding, offset })
				=> Error::MalformedInput { encoding, offset },
			_ => Error::Io(e),
		}
	}
}

/// Finds the encoding declared in the first [`DECLARATION_LINES`] lines of `src`.
///
/// `src` must already yield UTF-8. Returns [`DEFAULT_ENCODING`] if there's no declaration.
pub fn detect_encoding<R: BufRead + ?Sized>(src: &mut R) -> Result<String, Error> {
	let mut line = Vec::new();
	for _ in 0..DECLARATION_LINES {
		// the `\n` of a `\r\n` is part of the line before
		if line.last() == Some(&b'\r') && src.fill_buf()?.first() == Some(&b'\n') {
			src.consume(1);
		}
		line.clear();
		if read_line_any_ending(src, &mut line)? == 0 {
			break;
		}
		if let Some(name) = ENCODING_DECLARATION.captures(&line).and_then(|c| c.get(1)) {
			// only ASCII can match
			return Ok(String::from_utf8_lossy(name.as_bytes()).into_owned());
		}
	}
	Ok(DEFAULT_ENCODING.to_owned())
}

/// Appends bytes up to and including the next `\n` or `\r` to `line`.
///
/// Never reads past the terminator. Returns how many bytes were appended.
fn read_line_any_ending<R: BufRead + ?Sized>(src: &mut R, line: &mut Vec<u8>)
-> io::Result<usize> {
	let mut total = 0;
	loop {
		let available = src.fill_buf()?;
		if available.is_empty() {
			return Ok(total);
		}
		let (used, ended) = match available.iter().position(|&b| b == b'\n' || b == b'\r') {
			Some(end) => (end + 1, true),
			None => (available.len(), false),
		};
		line.extend_from_slice(&available[..used]);
		src.consume(used);
		total += used;
		if ended {
			return Ok(total);
		}
	}
}

/// Finds the encoding declared by a source file.
///
/// The file is read as UTF-8, but only as far as the end of its second line.
pub fn detect_file_encoding(path: impl AsRef<Path>) -> Result<String, Error> {
	let path = path.as_ref();
	let file = fs::File::open(path)?;
	let mut reader = BufReader::new(SourceReader::new(file, SourceEncoding::utf8()));
	let encoding = detect_encoding(&mut reader)?;
	log::debug!("{} is encoded as {}", decode_filename(path), encoding);
	Ok(encoding)
}

/// Opens a source file, decoding it with its declared encoding.
pub fn open_source_file(path: impl AsRef<Path>) -> Result<SourceReader<fs::File>, Error> {
	let path = path.as_ref();
	let label = detect_file_encoding(path)?;
	let encoding = SourceEncoding::for_label(&label)
		.ok_or(Error::UnknownEncoding(label))?;
	Ok(SourceReader::new(fs::File::open(path)?, encoding))
}
