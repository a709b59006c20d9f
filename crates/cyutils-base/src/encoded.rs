//! Strings that remember the source encoding they were decoded from.

use std::{borrow::Cow, fmt, hash, ops::Deref};

use encoding_rs::{mem, Encoding, UTF_16BE, UTF_16LE, UTF_8};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
	#[error("string has no source encoding to re-encode with")]
	NotEncoded,
	#[error("string was decoded from {0}, so it is not a unicode string")]
	NotUnicode(String),
	#[error("character {ch:?} cannot be represented in {encoding}")]
	Unmappable { ch: char, encoding: String },
}

/// Python-style encoding names (after normalisation) that have no WHATWG label of their own.
static PYTHON_ALIASES: [(&str, &str); 6] = [
	("utf-8-sig", "utf-8"),
	("utf8-sig", "utf-8"),
	("u8", "utf-8"),
	("cp65001", "utf-8"),
	("utf-16-le", "utf-16le"),
	("utf-16-be", "utf-16be"),
];

/// Names (after normalisation) of true ISO-8859-1. WHATWG reads several of these as windows-1252,
/// so they're matched before any label lookup.
static LATIN_1_NAMES: [&str; 10] = [
	"latin-1", "latin1", "latin", "l1", "iso-8859-1", "iso8859-1", "iso-ir-100", "8859", "cp819",
	"ibm819",
];

/// The codec behind a [`SourceEncoding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
	/// Anything `encoding_rs` knows by a WHATWG label.
	Whatwg(&'static Encoding),
	/// ISO-8859-1: every byte is the code point of the same value.
	Latin1,
}

impl Codec {
	/// Canonical name of the codec, for diagnostics.
	pub fn name(self) -> &'static str {
		match self {
			Codec::Whatwg(encoding) => encoding.name(),
			Codec::Latin1 => "ISO-8859-1",
		}
	}
}

/// An encoding as declared by a source file: the name as written, plus the codec it resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEncoding {
	label: Box<str>,
	codec: Codec,
}

impl SourceEncoding {
	/// Resolves a declared encoding name.
	///
	/// Accepts WHATWG labels, plus the common Python spellings (case-insensitive, with `_` and `-`
	/// interchangeable). Returns `None` for names that don't map to a usable codec.
	pub fn for_label(label: &str) -> Option<Self> {
		let normalised = label.trim().to_ascii_lowercase().replace('_', "-");
		let codec = if LATIN_1_NAMES.contains(&normalised.as_str()) {
			Codec::Latin1
		} else {
			let whatwg = PYTHON_ALIASES.iter()
				.find(|&&(py, _)| py == normalised)
				.map_or(normalised.as_str(), |&(_, whatwg)| whatwg);
			Encoding::for_label_no_replacement(label.as_bytes())
				.or_else(|| Encoding::for_label_no_replacement(whatwg.as_bytes()))
				.map(Codec::Whatwg)?
		};
		Some(Self {
			label: label.into(),
			codec,
		})
	}

	/// The default source encoding.
	pub fn utf8() -> Self {
		Self {
			label: "UTF-8".into(),
			codec: Codec::Whatwg(UTF_8),
		}
	}

	/// The name exactly as it was declared.
	#[inline]
	pub fn label(&self) -> &str {
		&self.label
	}

	#[inline]
	pub fn codec(&self) -> Codec {
		self.codec
	}

	/// Encodes `text` into this encoding, failing on the first character it can't represent.
	pub fn encode<'a>(&self, text: &'a str) -> Result<Cow<'a, [u8]>, EncodeError> {
		let codec = match self.codec {
			Codec::Latin1 => return match text.chars().find(|&ch| u32::from(ch) > 0xff) {
				Some(ch) => Err(self.unmappable(ch)),
				None => Ok(mem::encode_latin1_lossy(text)),
			},
			Codec::Whatwg(codec) => codec,
		};

		// encoding_rs only ever emits UTF-8 when asked for UTF-16
		if codec == UTF_16LE || codec == UTF_16BE {
			let big_endian = codec == UTF_16BE;
			return Ok(Cow::Owned(text.encode_utf16()
				.flat_map(|unit| if big_endian { unit.to_be_bytes() } else { unit.to_le_bytes() })
				.collect()));
		}

		let (bytes, _, had_errors) = codec.encode(text);
		if had_errors {
			let mut buf = [0u8; 4];
			let ch = text.chars()
				.find(|ch| codec.encode(ch.encode_utf8(&mut buf)).2)
				.unwrap_or(char::REPLACEMENT_CHARACTER);
			return Err(self.unmappable(ch));
		}
		Ok(bytes)
	}

	fn unmappable(&self, ch: char) -> EncodeError {
		EncodeError::Unmappable { ch, encoding: self.label.to_string() }
	}
}

impl fmt::Display for SourceEncoding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.label)
	}
}

/// A string value, tagged with the encoding it was decoded from.
///
/// An untagged string is plain unicode text. A tagged one came from a byte string in the source,
/// and can be turned back into those bytes with [`byte_encode`](Self::byte_encode). The tag is
/// fixed at construction.
///
/// Equality and hashing only look at the text, never the tag.
#[derive(Clone, Default)]
pub struct EncodedString {
	value: String,
	encoding: Option<SourceEncoding>,
}

impl EncodedString {
	/// Creates an untagged (unicode) string.
	pub fn new(value: impl Into<String>) -> Self {
		Self {
			value: value.into(),
			encoding: None,
		}
	}

	/// Creates a string that was decoded from `encoding`.
	pub fn with_encoding(value: impl Into<String>, encoding: SourceEncoding) -> Self {
		Self {
			value: value.into(),
			encoding: Some(encoding),
		}
	}

	#[inline]
	pub fn encoding(&self) -> Option<&SourceEncoding> {
		self.encoding.as_ref()
	}

	#[inline]
	pub fn as_str(&self) -> &str {
		&self.value
	}

	pub fn into_string(self) -> String {
		self.value
	}

	/// Re-encodes the text with its source encoding.
	///
	/// Fails with [`EncodeError::NotEncoded`] on a unicode string.
	pub fn byte_encode(&self) -> Result<Cow<'_, [u8]>, EncodeError> {
		self.encoding.as_ref()
			.ok_or(EncodeError::NotEncoded)?
			.encode(&self.value)
	}

	/// Gets the UTF-8 bytes of a unicode string.
	///
	/// Fails with [`EncodeError::NotUnicode`] if the string carries a source encoding.
	pub fn utf8_encode(&self) -> Result<&[u8], EncodeError> {
		match self.encoding {
			None => Ok(self.value.as_bytes()),
			Some(ref enc) => Err(EncodeError::NotUnicode(enc.label().to_owned())),
		}
	}

	#[inline]
	pub fn is_unicode(&self) -> bool {
		self.encoding.is_none()
	}
}

impl Deref for EncodedString {
	type Target = str;

	fn deref(&self) -> &str {
		&self.value
	}
}

impl fmt::Debug for EncodedString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.encoding {
			Some(ref enc) => write!(f, "EncodedString({:?}, {})", self.value, enc),
			None => write!(f, "EncodedString({:?})", self.value),
		}
	}
}

impl fmt::Display for EncodedString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.value)
	}
}

impl PartialEq for EncodedString {
	fn eq(&self, other: &Self) -> bool {
		self.value == other.value
	}
}

impl Eq for EncodedString { }

impl PartialEq<str> for EncodedString {
	fn eq(&self, other: &str) -> bool {
		self.value == other
	}
}

impl<'a> PartialEq<&'a str> for EncodedString {
	fn eq(&self, other: &&'a str) -> bool {
		self.value == *other
	}
}

impl hash::Hash for EncodedString {
	fn hash<H: hash::Hasher>(&self, state: &mut H) {
		self.value.hash(state)
	}
}

impl From<String> for EncodedString {
	fn from(src: String) -> Self {
		Self::new(src)
	}
}

impl<'a> From<&'a str> for EncodedString {
	fn from(src: &'a str) -> Self {
		Self::new(src)
	}
}
