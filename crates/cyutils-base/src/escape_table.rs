//! Process-wide escape tables for C string literals.

/// Two-character escape spellings, and the characters they stand for.
pub static ESCAPE_SEQUENCES: [(&str, char); 7] = [
	(r"\a", '\u{07}'),
	(r"\b", '\u{08}'),
	(r"\f", '\u{0c}'),
	(r"\n", '\n'),
	(r"\r", '\r'),
	(r"\t", '\t'),
	(r"\v", '\u{0b}'),
];

/// Byte sequences that must always be escaped inside a C string literal.
///
/// `??` is listed because it can open a trigraph.
pub static C_SPECIAL: [&[u8]; 6] = [b"\0", b"\n", b"\r", b"\t", b"??", b"\""];

/// Looks up the character that a two-character escape spelling (such as `\n`) stands for.
pub fn char_from_escape_sequence(seq: &str) -> Option<char> {
	ESCAPE_SEQUENCES.iter()
		.find(|&&(spelling, _)| spelling == seq)
		.map(|&(_, ch)| ch)
}

/// Checks whether any sequence from [`C_SPECIAL`] occurs in `s`.
pub fn has_specials(s: &[u8]) -> bool {
	C_SPECIAL.iter().any(|special| s.windows(special.len()).any(|w| w == *special))
}
