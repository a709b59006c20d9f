//! Path manipulation for output files.

use std::{
	ffi::{OsStr, OsString},
	fmt,
	path::{Path, PathBuf},
};

/// Replaces the final extension of `path` with `new_suffix`.
///
/// `new_suffix` should include its leading separator (e.g. `".c"`). A path without an extension
/// just gets the suffix appended. Leading dots on a file name don't start an extension, so
/// `.pyxdep` becomes `.pyxdep.c` and `...` becomes `....c`. A path ending in a separator names no
/// file, so `dir/x.c/` becomes `dir/x.c/.h`.
pub fn replace_suffix(path: impl AsRef<Path>, new_suffix: impl AsRef<OsStr>) -> PathBuf {
	let path = path.as_ref();
	let mut replaced: OsString = match strip_extension(path) {
		Some(stem) => stem.into_os_string(),
		None => path.as_os_str().to_owned(),
	};
	replaced.push(new_suffix);
	PathBuf::from(replaced)
}

fn strip_extension(path: &Path) -> Option<PathBuf> {
	// `Path` would otherwise look through a trailing separator
	if path.as_os_str().to_string_lossy().ends_with(std::path::is_separator) {
		return None;
	}
	let name = path.file_name()?;
	let stem = match name.to_str() {
		Some(name) => {
			let leading_dots = name.len() - name.trim_start_matches('.').len();
			let dot = name[leading_dots..].rfind('.')?;
			OsStr::new(&name[..leading_dots + dot])
		},
		None => {
			path.extension()?;
			path.file_stem()?
		},
	};
	Some(path.with_file_name(stem))
}

/// A file name, decoded to text where possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filename<'a> {
	/// The name is valid unicode.
	Decoded(&'a str),
	/// The name couldn't be decoded, and is kept as-is.
	Raw(&'a OsStr),
}

impl<'a> Filename<'a> {
	pub fn as_os_str(&self) -> &'a OsStr {
		match *self {
			Filename::Decoded(s) => OsStr::new(s),
			Filename::Raw(s) => s,
		}
	}
}

impl fmt::Display for Filename<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match *self {
			Filename::Decoded(s) => f.write_str(s),
			Filename::Raw(s) => f.write_str(&s.to_string_lossy()),
		}
	}
}

/// Decodes a file name into text, keeping the raw OS string if that isn't possible.
pub fn decode_filename(path: &Path) -> Filename<'_> {
	match path.to_str() {
		Some(s) => Filename::Decoded(s),
		None => Filename::Raw(path.as_os_str()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn with_extension() {
		assert_eq!(PathBuf::from("spam.c"), replace_suffix("spam.pyx", ".c"));
		assert_eq!(PathBuf::from("dir/spam.cpp"), replace_suffix("dir/spam.pyx", ".cpp"));
		assert_eq!(PathBuf::from("a.b.h"), replace_suffix("a.b.c", ".h"));
	}

	#[test]
	fn without_extension() {
		assert_eq!(PathBuf::from("spam.c"), replace_suffix("spam", ".c"));
		assert_eq!(PathBuf::from("dir.d/spam.c"), replace_suffix("dir.d/spam", ".c"));
	}

	#[test]
	fn dotfiles() {
		assert_eq!(PathBuf::from(".pyxdep.c"), replace_suffix(".pyxdep", ".c"));
		assert_eq!(PathBuf::from("dir/.hidden.c"), replace_suffix("dir/.hidden.pyx", ".c"));
	}

	#[test]
	fn leading_dot_runs() {
		assert_eq!(PathBuf::from("....c"), replace_suffix("...", ".c"));
		assert_eq!(PathBuf::from("..x.c"), replace_suffix("..x", ".c"));
		assert_eq!(PathBuf::from("..x.c"), replace_suffix("..x.pyx", ".c"));
		assert_eq!(PathBuf::from("x.c"), replace_suffix("x.", ".c"));
	}

	#[test]
	fn trailing_separator() {
		assert_eq!(PathBuf::from("dir/x.c/.h"), replace_suffix("dir/x.c/", ".h"));
	}

	#[test]
	fn suffix_property() {
		for (path, suffix) in [("x.pyx", ".c"), ("x", ".h"), ("d/x.tar.gz", ".zip")] {
			let original = Path::new(path);
			let replaced = replace_suffix(original, suffix);
			assert_eq!(Some(OsStr::new(&suffix[1..])), replaced.extension());
			assert_eq!(original.file_stem(), replaced.file_stem());
			assert_eq!(original.parent(), replaced.parent());
		}
	}

	#[test]
	fn decodes_unicode_names() {
		let path = Path::new("caf\u{e9}.pyx");
		assert_eq!(Filename::Decoded("caf\u{e9}.pyx"), decode_filename(path));
		assert_eq!("caf\u{e9}.pyx", decode_filename(path).to_string());
	}

	#[cfg(unix)]
	#[test]
	fn keeps_raw_names() {
		use std::os::unix::ffi::OsStrExt;

		let raw = OsStr::from_bytes(b"caf\xe9.pyx");
		let name = decode_filename(Path::new(raw));
		assert_eq!(Filename::Raw(raw), name);
		assert_eq!(raw, name.as_os_str());
		assert_eq!("caf\u{fffd}.pyx", name.to_string());
	}
}
