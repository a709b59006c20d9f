//! Streaming decode of source files into UTF-8.

use std::{
	io::{self, Read},
	num::NonZeroUsize,
};

use encoding_rs::{mem, Decoder, DecoderResult};
use nonzero_ext::nonzero;

use cyutils_base::{Codec, EncodedString, SourceEncoding};

use super::Error;

/// Decodes a byte stream in some source encoding into UTF-8.
///
/// Decoding happens lazily, a buffer at a time: bytes beyond what the consumer has asked for are
/// never inspected. Malformed input is reported as an [`io::ErrorKind::InvalidData`] error wrapping
/// [`Error::MalformedInput`], but only once everything decoded before it has been handed out.
pub struct SourceReader<R> {
	src: R,
	encoding: SourceEncoding,
	transcoder: Transcoder,
	in_buf: Box<[u8]>,
	in_pos: usize,
	in_len: usize,
	out_buf: Box<[u8]>,
	out_pos: usize,
	out_len: usize,
	src_pos: u64, // bytes of `src` fed to the decoder
	eof: bool,
	finished: bool,
	pending_error: Option<Error>,
}

enum Transcoder {
	Decoder(Decoder),
	// encoding_rs only decodes latin-1 as windows-1252
	Latin1,
}

impl<R: Read> SourceReader<R> {
	pub const DEFAULT_CAPACITY: NonZeroUsize = nonzero!(1usize<<13);

	/// Constructs a new reader with the default buffer capacity.
	#[inline]
	pub fn new(src: R, encoding: SourceEncoding) -> Self {
		Self::with_capacity(src, encoding, Self::DEFAULT_CAPACITY)
	}

	/// Constructs a new reader with a specific buffer capacity.
	///
	/// The output buffer will always be at least 16 bytes in size, so that the decoder can always
	/// make progress.
	pub fn with_capacity(src: R, encoding: SourceEncoding, capacity: NonZeroUsize) -> Self {
		let out_capacity = capacity.max(nonzero!(16usize)).get();
		let capacity = capacity.get();
		let transcoder = match encoding.codec() {
			Codec::Whatwg(codec) => Transcoder::Decoder(codec.new_decoder_with_bom_removal()),
			Codec::Latin1 => Transcoder::Latin1,
		};
		Self {
			src,
			encoding,
			transcoder,
			in_buf: vec![0u8; capacity].into_boxed_slice(),
			in_pos: 0,
			in_len: 0,
			out_buf: vec![0u8; out_capacity].into_boxed_slice(),
			out_pos: 0,
			out_len: 0,
			src_pos: 0,
			eof: false,
			finished: false,
			pending_error: None,
		}
	}

	/// The encoding being decoded from.
	#[inline]
	pub fn encoding(&self) -> &SourceEncoding {
		&self.encoding
	}

	/// Reads everything that's left.
	///
	/// The result is untagged: once decoded, source text is unicode.
	pub fn read_to_encoded_string(&mut self) -> Result<EncodedString, Error> {
		let mut text = String::new();
		self.read_to_string(&mut text)?;
		Ok(EncodedString::new(text))
	}

	fn decode_more(&mut self) -> io::Result<()> {
		if self.in_pos == self.in_len && !self.eof {
			let read_size = self.src.read(&mut self.in_buf)?;
			debug_assert!(read_size <= self.in_buf.len());
			self.in_pos = 0;
			self.in_len = read_size;
			self.eof = read_size == 0;
		}

		let input = &self.in_buf[self.in_pos..self.in_len];
		let (result, read, written) = match self.transcoder {
			Transcoder::Decoder(ref mut decoder) => decoder.decode_to_utf8_without_replacement(
				input,
				&mut self.out_buf,
				self.eof),
			Transcoder::Latin1 => {
				let (read, written) = mem::convert_latin1_to_utf8_partial(input, &mut self.out_buf);
				let result = match read == input.len() {
					true => DecoderResult::InputEmpty,
					false => DecoderResult::OutputFull,
				};
				(result, read, written)
			},
		};
		self.in_pos += read;
		self.src_pos += read as u64;
		self.out_pos = 0;
		self.out_len = written;

		match result {
			DecoderResult::InputEmpty if self.eof => self.finished = true,
			DecoderResult::InputEmpty | DecoderResult::OutputFull => {},
			DecoderResult::Malformed(bad_len, extra_len) => {
				self.finished = true;
				self.pending_error = Some(Error::MalformedInput {
					encoding: self.encoding.codec().name(),
					offset: self.src_pos - u64::from(bad_len) - u64::from(extra_len),
				});
			},
		};
		Ok(())
	}
}

impl<R: Read> Read for SourceReader<R> {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		if buf.is_empty() {
			return Ok(0);
		}

		loop {
			if self.out_pos < self.out_len {
				let available = &self.out_buf[self.out_pos..self.out_len];
				let n = available.len().min(buf.len());
				buf[..n].copy_from_slice(&available[..n]);
				self.out_pos += n;
				return Ok(n);
			}

			if let Some(e) = self.pending_error.take() {
				return Err(io::Error::new(io::ErrorKind::InvalidData, e));
			}
			if self.finished {
				return Ok(0);
			}

			self.decode_more()?;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn decode(input: &[u8], label: &str, capacity: usize) -> Result<String, Error> {
		let encoding = SourceEncoding::for_label(label).unwrap();
		let mut sut = SourceReader::with_capacity(io::Cursor::new(input), encoding,
			NonZeroUsize::new(capacity).unwrap());
		let mut out = String::new();
		sut.read_to_string(&mut out)?;
		Ok(out)
	}

	#[test]
	fn empty() {
		assert_eq!("", decode(b"", "utf-8", 16).unwrap());
	}

	#[test]
	fn ascii() {
		assert_eq!("def f(): pass\n", decode(b"def f(): pass\n", "utf-8", 16).unwrap());
	}

	#[test]
	fn latin1() {
		assert_eq!("fianc\u{e9}e", decode(b"fianc\xe9e", "latin-1", 16).unwrap());
	}

	#[test]
	fn latin1_c1_controls() {
		assert_eq!("s = '\u{80}\u{85}'", decode(b"s = '\x80\x85'", "latin-1", 16).unwrap());
		let all: String = (0u8..=0xff).map(char::from).collect();
		let raw: Vec<u8> = (0u8..=0xff).collect();
		for size in [1, 3, 16, 4096] {
			assert_eq!(all, decode(&raw, "ISO-8859-1", size).unwrap());
		}
	}

	#[test]
	fn utf8_bom_removed() {
		assert_eq!("x = 1", decode(b"\xef\xbb\xbfx = 1", "utf-8", 16).unwrap());
	}

	#[test]
	fn stupidly_small_buffer() {
		let text = "fun\u{a9}tion \u{1fbc0} \u{2401}\u{2402}";
		for size in 1..=8 {
			assert_eq!(text, decode(text.as_bytes(), "utf-8", size).unwrap());
		}
	}

	#[test]
	fn catch_trailing_failures() {
		match decode(b"ABC\xe0", "utf-8", 16) {
			Err(Error::MalformedInput { encoding: "UTF-8", offset: 3 }) => {},
			other => panic!("unexpected result {:?}", other),
		}
	}

	#[test]
	fn catch_middle_failures() {
		match decode(b"ABCDEFGH\xffIJ", "utf-8", 4) {
			Err(Error::MalformedInput { encoding: "UTF-8", offset: 8 }) => {},
			other => panic!("unexpected result {:?}", other),
		}
	}

	#[test]
	fn good_prefix_is_delivered_first() {
		let encoding = SourceEncoding::utf8();
		let mut sut = SourceReader::new(io::Cursor::new(&b"ok\n\xff"[..]), encoding);
		let mut buf = [0u8; 16];
		assert_eq!(3, sut.read(&mut buf).unwrap());
		assert_eq!(b"ok\n", &buf[..3]);
		assert_eq!(io::ErrorKind::InvalidData, sut.read(&mut buf).unwrap_err().kind());
	}

	#[test]
	fn encoded_string_is_untagged() {
		let encoding = SourceEncoding::for_label("latin-1").unwrap();
		let mut sut = SourceReader::new(io::Cursor::new(&b"caf\xe9"[..]), encoding);
		assert_eq!("latin-1", sut.encoding().label());
		let s = sut.read_to_encoded_string().unwrap();
		assert!(s.is_unicode());
		assert_eq!(s, "caf\u{e9}");
	}
}
