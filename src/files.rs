//! Lifecycle helpers for generated output files.

use std::{
	fs,
	io::{self, Seek, SeekFrom, Write},
	path::Path,
	time::{Duration, SystemTime},
};

use filetime::FileTime;

use crate::paths::decode_filename;

/// Written over an output file whose compilation failed.
pub const FAILED_OUTPUT_SENTINEL: &str =
	"#error Do not use this file, it is the result of a failed Cython compilation.\n";

/// How far a castrated file is backdated relative to its snapshot.
pub const STALE_OFFSET: Duration = Duration::from_secs(1);

/// Access and modification times of a file, captured at some earlier point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
	pub accessed: SystemTime,
	pub modified: SystemTime,
}

impl FileStat {
	pub fn of(path: impl AsRef<Path>) -> io::Result<Self> {
		Self::from_metadata(&fs::metadata(path)?)
	}

	pub fn from_metadata(meta: &fs::Metadata) -> io::Result<Self> {
		Ok(Self {
			accessed: meta.accessed()?,
			modified: meta.modified()?,
		})
	}
}

/// Opens a file for reading and writing, truncating anything already there.
///
/// An existing file is truncated rather than replaced, so it keeps its metadata.
pub fn open_new_file(path: impl AsRef<Path>) -> io::Result<fs::File> {
	fs::File::options()
		.read(true)
		.write(true)
		.create(true)
		.truncate(true)
		.open(path)
}

/// Blanks out an output file after a failed compilation, leaving only [`FAILED_OUTPUT_SENTINEL`].
///
/// If `stat` is given, the file's access time is set back to the snapshot's, and its modification
/// time to [`STALE_OFFSET`] before the snapshot's, so that anything checking freshness sees it as
/// out of date.
///
/// Returns `Ok(false)` without touching anything if there's no regular file at `path`, or it can't
/// be opened for writing. Whether it can is up to the OS, not the permission bits, so a privileged
/// user will castrate a read-only file.
pub fn castrate_file(path: impl AsRef<Path>, stat: Option<&FileStat>) -> io::Result<bool> {
	let path = path.as_ref();

	let Some(mut file) = open_writable_file(path)? else {
		log::debug!("nothing to castrate at {}", decode_filename(path));
		return Ok(false);
	};

	file.seek(SeekFrom::Start(0))?;
	file.set_len(0)?;
	file.write_all(FAILED_OUTPUT_SENTINEL.as_bytes())?;
	drop(file);

	if let Some(stat) = stat {
		let modified = stat.modified.checked_sub(STALE_OFFSET).unwrap_or(stat.modified);
		filetime::set_file_times(path,
			FileTime::from_system_time(stat.accessed),
			FileTime::from_system_time(modified))?;
	}

	log::info!("castrated {}", decode_filename(path));
	Ok(true)
}

/// Opens an existing regular file for update, or gives `None` if that's not possible.
fn open_writable_file(path: &Path) -> io::Result<Option<fs::File>> {
	match fs::metadata(path) {
		Ok(meta) if meta.is_file() => {},
		_ => return Ok(None),
	}
	match fs::File::options().read(true).write(true).open(path) {
		Ok(file) => Ok(Some(file)),
		Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied)
			=> Ok(None),
		Err(e) => Err(e),
	}
}

/// Gets the last-modified time of a file.
pub fn modification_time(path: impl AsRef<Path>) -> io::Result<SystemTime> {
	fs::metadata(path)?.modified()
}

/// Checks whether a file was modified strictly after `time`.
pub fn file_newer_than(path: impl AsRef<Path>, time: SystemTime) -> io::Result<bool> {
	Ok(modification_time(path)? > time)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn backdate(path: &Path, secs: u64) -> SystemTime {
		let then = SystemTime::now() - Duration::from_secs(secs);
		filetime::set_file_times(path, FileTime::from_system_time(then),
			FileTime::from_system_time(then)).unwrap();
		modification_time(path).unwrap()
	}

	#[test]
	fn open_new_truncates() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("out.c");
		fs::write(&path, "old contents").unwrap();

		let mut file = open_new_file(&path).unwrap();
		file.write_all(b"new").unwrap();
		drop(file);
		assert_eq!("new", fs::read_to_string(&path).unwrap());
	}

	#[test]
	fn open_new_creates() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("fresh.c");

		open_new_file(&path).unwrap();
		assert_eq!(0, fs::metadata(&path).unwrap().len());
	}

	#[test]
	fn castrate_missing_is_noop() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("never-written.c");

		assert!(!castrate_file(&path, None).unwrap());
		assert!(!path.exists());
	}

	#[test]
	fn castrate_directory_is_noop() {
		let dir = tempfile::tempdir().unwrap();
		assert!(!castrate_file(dir.path(), None).unwrap());
	}

	#[test]
	fn castrate_read_only_if_the_os_allows() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("locked.c");
		fs::write(&path, "/* generated */\n").unwrap();
		let mut perms = fs::metadata(&path).unwrap().permissions();
		perms.set_readonly(true);
		fs::set_permissions(&path, perms).unwrap();

		// root (or an admin) can still write to it
		let writable = fs::File::options().write(true).open(&path).is_ok();
		assert_eq!(writable, castrate_file(&path, None).unwrap());
		let expected = if writable { FAILED_OUTPUT_SENTINEL } else { "/* generated */\n" };
		assert_eq!(expected, fs::read_to_string(&path).unwrap());

		let mut perms = fs::metadata(&path).unwrap().permissions();
		perms.set_readonly(false);
		fs::set_permissions(&path, perms).unwrap();
	}

	#[test]
	fn castrate_replaces_contents() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("spam.c");
		fs::write(&path, "int main(void) { return 0; }\n".repeat(50)).unwrap();

		assert!(castrate_file(&path, None).unwrap());
		assert_eq!(FAILED_OUTPUT_SENTINEL, fs::read_to_string(&path).unwrap());
	}

	#[test]
	fn castrate_backdates() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("spam.c");
		fs::write(&path, "/* generated */\n").unwrap();
		backdate(&path, 3600);
		let stat = FileStat::of(&path).unwrap();

		assert!(castrate_file(&path, Some(&stat)).unwrap());
		assert_eq!(FAILED_OUTPUT_SENTINEL, fs::read_to_string(&path).unwrap());
		assert_eq!(stat.modified - STALE_OFFSET, modification_time(&path).unwrap());
	}

	#[test]
	fn newer_than() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("spam.pyx");
		fs::write(&path, "").unwrap();
		let mtime = backdate(&path, 60);

		assert!(file_newer_than(&path, mtime - Duration::from_secs(1)).unwrap());
		assert!(!file_newer_than(&path, mtime).unwrap()); // equal is not newer
		assert!(!file_newer_than(&path, mtime + Duration::from_secs(1)).unwrap());
	}

	#[test]
	fn missing_file_has_no_mtime() {
		let dir = tempfile::tempdir().unwrap();
		let err = modification_time(dir.path().join("nope")).unwrap_err();
		assert_eq!(io::ErrorKind::NotFound, err.kind());
	}
}
