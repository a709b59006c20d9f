//! Escaping byte strings into C string literals, and sizing integer literals.
//!
//! Octal escapes are used throughout in place of hex ones: a C hex escape swallows every hex
//! digit after it, so `\x41` followed by a literal `B` would be read as one character.

use std::num::IntErrorKind;

use ascii::{AsciiChar, AsciiString};
use once_cell::sync::Lazy;

use cyutils_base::{has_specials, C_SPECIAL};

include!(concat!(env!("OUT_DIR"), "/escape_data.rs"));


/// Each entry of [`C_SPECIAL`], paired with what it's replaced by.
static C_SPECIAL_REPLACEMENTS: Lazy<Vec<(&'static [u8], AsciiString)>> = Lazy::new(|| {
	C_SPECIAL.iter()
		.map(|&special| (special, to_escape_sequence(special)))
		.collect()
});

/// Escapes one special character (or short sequence) for use in a C string literal.
///
/// Newline, carriage return, tab and `"` get their short spellings. Anything else is written out
/// as one 3-digit octal escape per byte.
pub fn to_escape_sequence(seq: &[u8]) -> AsciiString {
	let marker = match seq {
		b"\n" => Some(AsciiChar::n),
		b"\r" => Some(AsciiChar::r),
		b"\t" => Some(AsciiChar::t),
		b"\"" => Some(AsciiChar::Quotation),
		_ => None,
	};

	let mut escaped = AsciiString::with_capacity(seq.len() * 4);
	match marker {
		Some(marker) => {
			escaped.push(AsciiChar::BackSlash);
			escaped.push(marker);
		},
		None => for &b in seq {
			escaped.push_str(OCTAL_ESCAPES[b as usize]);
		},
	};
	escaped
}

/// Escapes a byte string so that it can be embedded between the quotes of a C string literal.
///
/// Backslashes are doubled, and every sequence in [`C_SPECIAL`] is replaced by its
/// [`to_escape_sequence`] spelling. Bytes with the high bit set become octal escapes; all other
/// bytes pass through unchanged.
pub fn escape_byte_string(s: &[u8]) -> AsciiString {
	let mut escaped = replace_all(s, b"\\", b"\\\\");
	if has_specials(&escaped) {
		for (special, replacement) in C_SPECIAL_REPLACEMENTS.iter() {
			escaped = replace_all(&escaped, special, replacement.as_bytes());
		}
	}

	match AsciiString::from_ascii(escaped) {
		Ok(ascii) => ascii,
		Err(e) => escape_high_bytes(&e.into_source()),
	}
}

fn escape_high_bytes(s: &[u8]) -> AsciiString {
	let mut escaped = AsciiString::with_capacity(s.len() * 2);
	for &b in s {
		match AsciiChar::from_ascii(b) {
			Ok(ch) => escaped.push(ch),
			Err(_) => escaped.push_str(OCTAL_ESCAPES[b as usize]),
		}
	}
	escaped
}

/// Replaces every non-overlapping occurrence of `needle`, scanning left to right.
fn replace_all(haystack: &[u8], needle: &[u8], replacement: &[u8]) -> Vec<u8> {
	debug_assert!(!needle.is_empty());

	let mut replaced = Vec::with_capacity(haystack.len());
	let mut rest = haystack;
	while let [first, tail @ ..] = rest {
		if rest.starts_with(needle) {
			replaced.extend_from_slice(replacement);
			rest = &rest[needle.len()..];
		} else {
			replaced.push(*first);
			rest = tail;
		}
	}
	replaced
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiteralError {
	#[error("'{text}' is not a valid base-{radix} integer literal")]
	Invalid { text: String, radix: u32 },
}

/// An integer literal, either as written in source or as an already-known value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralValue<'a> {
	Text(&'a str),
	Int(i128),
}

impl<'a> From<&'a str> for LiteralValue<'a> {
	fn from(src: &'a str) -> Self {
		LiteralValue::Text(src)
	}
}

macro_rules! literal_from_int {
	($($t:ty),*) => {$(
		impl From<$t> for LiteralValue<'_> {
			fn from(src: $t) -> Self {
				LiteralValue::Int(src.into())
			}
		}
	)*};
}

literal_from_int!(i8, i16, i32, i64, i128, u8, u16, u32, u64);

/// Checks whether an integer literal falls outside the signed 32-bit range, and so needs a
/// `long` (or wider) representation.
///
/// Text is parsed as hexadecimal after a `0x`/`0X` prefix, as octal if it has a leading `0` and
/// more than one digit, and as decimal otherwise. A sign and surrounding whitespace are allowed.
pub fn long_literal<'a>(value: impl Into<LiteralValue<'a>>) -> Result<bool, LiteralError> {
	let value = match value.into() {
		LiteralValue::Int(v) => v,
		LiteralValue::Text(text) => match parse_int_literal(text)? {
			Some(v) => v,
			None => return Ok(true), // too big for i128, so certainly too big for i32
		},
	};
	Ok(i32::try_from(value).is_err())
}

/// Parses an integer literal, giving `None` if its magnitude overflows.
fn parse_int_literal(text: &str) -> Result<Option<i128>, LiteralError> {
	let trimmed = text.trim();
	let (negative, unsigned) = match trimmed.as_bytes().first() {
		Some(b'-') => (true, &trimmed[1..]),
		Some(b'+') => (false, &trimmed[1..]),
		_ => (false, trimmed),
	};

	let (radix, digits) = if let Some(hex) = unsigned.strip_prefix("0x")
		.or_else(|| unsigned.strip_prefix("0X"))
	{
		(16, hex)
	} else if unsigned.len() >= 2 && unsigned.starts_with('0') {
		(8, &unsigned[1..])
	} else {
		(10, unsigned)
	};

	let invalid = || LiteralError::Invalid { text: text.to_owned(), radix };

	// `from_str_radix` takes a sign of its own, but we've already had ours
	if digits.starts_with(['+', '-']) {
		return Err(invalid());
	}

	match i128::from_str_radix(digits, radix) {
		Ok(v) => Ok(Some(if negative { -v } else { v })),
		Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(None),
		Err(_) => Err(invalid()),
	}
}
