use std::borrow::Cow;
use std::fs;
use std::io::{self, BufReader, BufWriter, Read as _, Write as _};

use gumdrop::Options;

use cyutils::{
	encoding::{self, detect_encoding},
	escape::{self, escape_byte_string, long_literal},
	files::{castrate_file, file_newer_than, modification_time, FileStat},
	paths::replace_suffix,
	support::{HexArray, IoSink},
	SourceEncoding,
	SourceReader,
};

#[derive(Debug, Options)]
enum Command {

	#[options(help = "replace the extension of a path")]
	Suffix(SuffixArgs),

	#[options(help = "blank out an output file left by a failed compilation")]
	Castrate(CastrateArgs),

	#[options(help = "check whether a file was modified after another")]
	Newer(NewerArgs),

	#[options(help = "print the encoding declared by a source file")]
	Detect(DetectArgs),

	#[options(help = "convert a source file to UTF-8, using its declared encoding")]
	Decode(DecodeArgs),

	#[options(help = "escape a file's bytes as a C string literal")]
	Escape(EscapeArgs),

	#[options(help = "check whether an integer literal needs more than 32 bits")]
	LongLiteral(LongLiteralArgs),
}

#[derive(Debug, Options)]
struct SuffixArgs {

	#[options(help = "path to change", required)]
	path: String,

	#[options(help = "new suffix, including its leading dot", required)]
	new_suffix: String,

	#[options(help = "show help for this command")]
	help: bool,
}

#[derive(Debug, Options)]
struct CastrateArgs {

	#[options(help = "output file to blank out", required)]
	file: String,

	#[options(help = "backdate the file to just before its current modification time")]
	keep_times: bool,

	#[options(help = "show help for this command")]
	help: bool,
}

#[derive(Debug, Options)]
struct NewerArgs {

	#[options(help = "file to check", required)]
	file: String,

	#[options(help = "file to compare against", required)]
	than: String,

	#[options(help = "show help for this command")]
	help: bool,
}

#[derive(Debug, Options)]
struct DetectArgs {

	#[options(help = "source file to inspect", required)]
	input_file: String,

	#[options(help = "show help for this command")]
	help: bool,
}

#[derive(Debug, Options)]
struct DecodeArgs {

	#[options(help = "source file to decode", required)]
	input_file: String,

	#[options(help = "output UTF-8 file", required)]
	output_file: String,

	#[options(help = "show help for this command")]
	help: bool,
}

#[derive(Debug, Options)]
struct EscapeArgs {

	#[options(help = "file holding the raw bytes", required)]
	input_file: String,

	#[options(help = "output file for the quoted C literal", required)]
	output_file: String,

	#[options(help = "show help for this command")]
	help: bool,
}

#[derive(Debug, Options)]
struct LongLiteralArgs {

	#[options(help = "integer literal, as written in source", required)]
	value: String,

	#[options(help = "show help for this command")]
	help: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
	#[error("{}", .0)]
	Encoding(#[from] encoding::Error),
	#[error("{}", .0)]
	Literal(#[from] escape::LiteralError),
	#[error("io error: {0}")]
	Io(#[from] io::Error),
}

impl CliError {
	fn exit_code(&self) -> ExitCode {
		match *self {
			CliError::Io(_) | CliError::Encoding(encoding::Error::Io(_)) => ExitCode::IoError,
			CliError::Encoding(_) | CliError::Literal(_) => ExitCode::InvalidData,
		}
	}
}

impl Command {
	fn user_wants_help(&self) -> bool {
		match *self {
			Command::Suffix(ref c) => c.help,
			Command::Castrate(ref c) => c.help,
			Command::Newer(ref c) => c.help,
			Command::Detect(ref c) => c.help,
			Command::Decode(ref c) => c.help,
			Command::Escape(ref c) => c.help,
			Command::LongLiteral(ref c) => c.help,
		}
	}

	fn print_usage_and_exit(process_name: &str, command_name: Option<&'static str>) -> ! {
		let to_print = command_name.and_then(Command::command_usage)
			.unwrap_or_else(Command::usage);
		eprintln!("{}", to_print);
		eprintln!("\nRun '{} `subcommand` --help' for more guidance", process_name);
		std::process::exit(ExitCode::Success.into());
	}
}

#[repr(i32)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum ExitCode {
	Success = 0,
	IoError = 2,
	CliArgError = 3,
	InvalidData = 4,
	/// The command ran fine, but its answer was "no".
	Negative = 5,
}

impl From<ExitCode> for i32 {
	fn from(src: ExitCode) -> Self {
		src as i32
	}
}


trait HelpExt: Eq + PartialEq<str> {
	fn is_help(&self) -> bool {
		["help", "-h", "--help", "-help"].into_iter().any(|help| self == help)
	}
}
impl HelpExt for str {}


fn main() {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

	let (process, args_str) = {
		let mut iter = std::env::args();
		let process = iter.next().map(Cow::Owned).unwrap_or(
			Cow::Borrowed(env!("CARGO_PKG_NAME"))
		);
		(process, iter.collect::<Vec<_>>())
	};
	if matches!(*args_str, [ref s] if s.is_help()) {
		Command::print_usage_and_exit(&process, None);
	}
	let args = match Command::parse_args_default(&args_str) {
		Ok(a) if a.user_wants_help() => Command::print_usage_and_exit(&process, a.command_name()),
		Ok(a) => a,
		Err(e) => {
			eprintln!("argument error: {}", e);
			eprintln!("run `{} help` for usage guidelines", process);
			std::process::exit(ExitCode::CliArgError.into());
		}
	};
	log::debug!("running {:?}", args);

	let result = match args {
		Command::Suffix(args) => run_suffix(args),
		Command::Castrate(args) => run_castrate(args),
		Command::Newer(args) => run_newer(args),
		Command::Detect(args) => run_detect(args),
		Command::Decode(args) => run_decode(args),
		Command::Escape(args) => run_escape(args),
		Command::LongLiteral(args) => run_long_literal(args),
	};

	std::process::exit(match result {
		Ok(code) => code.into(),
		Err(e) => {
			eprintln!("error: {}", e);
			e.exit_code().into()
		},
	});
}

fn open_input(path: &str) -> io::Result<Box<dyn io::Read>> {
	let input: Box<dyn io::Read> = match path {
		"-" => Box::new(io::stdin().lock()),
		path => Box::new(BufReader::new(fs::File::open(path)?)),
	};
	Ok(input)
}

fn open_output(path: &str) -> io::Result<Box<dyn io::Write>> {
	let output: Box<dyn io::Write> = match path {
		"-" => Box::new(io::stdout().lock()),
		path => Box::new(fs::File::create(path)?),
	};
	Ok(output)
}

fn run_suffix(args: SuffixArgs) -> Result<ExitCode, CliError> {
	println!("{}", replace_suffix(&args.path, &args.new_suffix).display());
	Ok(ExitCode::Success)
}

fn run_castrate(args: CastrateArgs) -> Result<ExitCode, CliError> {
	let stat = match args.keep_times {
		true => match FileStat::of(&args.file) {
			Ok(stat) => Some(stat),
			// nothing there to castrate either
			Err(e) if e.kind() == io::ErrorKind::NotFound => None,
			Err(e) => return Err(e.into()),
		},
		false => None,
	};

	if !castrate_file(&args.file, stat.as_ref())? {
		log::warn!("{} is not a writable file; left alone", args.file);
	}
	Ok(ExitCode::Success)
}

fn run_newer(args: NewerArgs) -> Result<ExitCode, CliError> {
	let threshold = modification_time(&args.than)?;
	let newer = file_newer_than(&args.file, threshold)?;
	println!("{}", newer);
	Ok(if newer { ExitCode::Success } else { ExitCode::Negative })
}

fn run_detect(args: DetectArgs) -> Result<ExitCode, CliError> {
	let encoding = match &*args.input_file {
		"-" => {
			let stdin = io::stdin().lock();
			detect_encoding(&mut BufReader::new(SourceReader::new(stdin, SourceEncoding::utf8())))?
		},
		path => cyutils::detect_file_encoding(path)?,
	};
	println!("{}", encoding);
	Ok(ExitCode::Success)
}

fn run_decode(args: DecodeArgs) -> Result<ExitCode, CliError> {
	let mut output = BufWriter::new(open_output(&args.output_file)?);

	match &*args.input_file {
		"-" => {
			// stdin can't be reopened after detection, so hold onto all of it
			let mut raw = Vec::new();
			io::stdin().lock().read_to_end(&mut raw)?;
			let label = detect_encoding(&mut BufReader::new(
				SourceReader::new(&raw[..], SourceEncoding::utf8())))?;
			let source_encoding = SourceEncoding::for_label(&label)
				.ok_or(encoding::Error::UnknownEncoding(label))?;
			copy_decoded(&mut SourceReader::new(&raw[..], source_encoding), &mut output)?;
		},
		path => {
			copy_decoded(&mut cyutils::open_source_file(path)?, &mut output)?;
		},
	};

	output.flush()?;
	Ok(ExitCode::Success)
}

fn copy_decoded<R: io::Read>(src: &mut SourceReader<R>, output: IoSink<'_>)
-> Result<u64, encoding::Error> {
	log::info!("decoding as {}", src.encoding());
	Ok(io::copy(src, output)?)
}

fn run_escape(args: EscapeArgs) -> Result<ExitCode, CliError> {
	let mut raw = Vec::new();
	open_input(&args.input_file)?.read_to_end(&mut raw)?;
	log::debug!("escaping {} bytes, starting {}", raw.len(), HexArray(&raw[..raw.len().min(16)]));

	let mut output = BufWriter::new(open_output(&args.output_file)?);
	writeln!(output, "\"{}\"", escape_byte_string(&raw))?;
	output.flush()?;
	Ok(ExitCode::Success)
}

fn run_long_literal(args: LongLiteralArgs) -> Result<ExitCode, CliError> {
	let is_long = long_literal(args.value.as_str())?;
	println!("{}", if is_long { "long" } else { "int" });
	Ok(ExitCode::Success)
}
