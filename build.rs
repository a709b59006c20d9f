use std::{
	fs,
	io,
	io::Write,
	path::Path,
};

fn main() -> io::Result<()> {
	println!("cargo:rerun-if-changed=build.rs");

	// OUT_DIR
	let out_dir = std::env::var_os("OUT_DIR")
		.ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "OUT_DIR is not set"))?;
	let out_dir = Path::new(&out_dir);

	// make the file
	let mut gen_escape_data = fs::File::create(out_dir.join("escape_data.rs"))?;

	gen_escape_data.write_all(br#"// auto-generated

type ByteEscapeMap = [&'static ::ascii::AsciiStr; 256];

"#)?;

	_write_octal_array(&mut gen_escape_data, "OCTAL_ESCAPES")?;

	gen_escape_data.sync_all()?;
	return Ok(());

	fn _write_octal_array(file: &mut fs::File, name: &'static str) -> io::Result<()> {
		writeln!(file, "pub(crate) static {}: ByteEscapeMap = [", name)?;
		for byte in 0u8..=255 {
			// one backslash, three digits; the generated source needs the backslash escaped
			let spelling = format!("\\\\{:03o}", byte);
			writeln!(file, "\tunsafe {{
\t\t//SAFETY: this is transmuted from a fixed, all-ASCII byte string
\t\t// (and we can't use an AsciiStr ctor in a const context)
\t\t::core::mem::transmute::<&'static str, &'static ::ascii::AsciiStr>(\"{}\")
\t}},", spelling)?;
		}
		writeln!(file, "];\n")
	}
}
