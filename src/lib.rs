//! Odds and ends for a compiler toolchain that emits C: output file housekeeping, source encoding
//! detection, and C string literal escaping.

pub mod support;
pub mod paths;
pub mod files;
pub mod encoding;
pub mod escape;

pub use cyutils_base::{
	char_from_escape_sequence,
	EncodedString,
	EncodeError,
	SourceEncoding,
};

pub use paths::{decode_filename, replace_suffix, Filename};
pub use files::{
	castrate_file,
	file_newer_than,
	modification_time,
	open_new_file,
	FileStat,
	FAILED_OUTPUT_SENTINEL,
};
pub use encoding::{detect_file_encoding, open_source_file, SourceReader, DEFAULT_ENCODING};
pub use escape::{escape_byte_string, long_literal, to_escape_sequence, LiteralValue};
