use core::fmt;
use std::{fmt::Write, io};

pub type IoSink<'a> = &'a mut dyn io::Write;

/// Formats a byte slice as a list of hex bytes, for diagnostics.
pub struct HexArray<'a>(pub &'a [u8]);

impl<'a> fmt::Debug for HexArray<'a> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_char('[')?;
		let mut show_comma = false;
		for &b in self.0 {
			if show_comma {
				f.write_str(", ")?;
			}
			show_comma = true;
			write!(f, "{:02x}", b)?;
		}
		f.write_char(']')
	}
}

impl<'a> fmt::Display for HexArray<'a> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		<Self as fmt::Debug>::fmt(self, f)
	}
}

#[cfg(test)]
mod tests {
	use super::HexArray;

	#[test]
	fn formatting() {
		assert_eq!("[]", HexArray(&[]).to_string());
		assert_eq!("[0a]", HexArray(&[0x0a]).to_string());
		assert_eq!("[22, e9, ff]", format!("{:?}", HexArray(b"\"\xe9\xff")));
	}
}
