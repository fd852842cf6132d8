use compress_js::minify;
use compress_js::CompressOptions;
use compress_js::Level;
use compress_js::MinifyOptions;
use compress_js::TopLevelMode;
use std::fs;
use std::fs::File;
use std::io::stdin;
use std::io::stdout;
use std::io::BufWriter;
use std::io::Read;
use std::io::Write;
use std::path::PathBuf;
use std::process::exit;
use structopt::StructOpt;
use tracing::error;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(StructOpt)]
#[structopt(name = "compress-js", about = "Optimizing JavaScript compressor")]
struct Cli {
  /// File to compress; omit for stdin.
  #[structopt(parse(from_os_str))]
  input: Option<PathBuf>,

  /// Output destination; omit for stdout.
  #[structopt(short, long, parse(from_os_str))]
  output: Option<PathBuf>,

  /// JSON file of compressor options. Unknown keys are rejected.
  #[structopt(short, long, parse(from_os_str))]
  config: Option<PathBuf>,

  /// Override the number of compressor passes.
  #[structopt(long)]
  passes: Option<usize>,

  /// Parse the input as an ES module instead of a global script.
  #[structopt(long)]
  module: bool,

  /// Allow dropping and inlining top-level declarations.
  #[structopt(long)]
  toplevel: bool,

  /// Only reprint the input without compressing it.
  #[structopt(long)]
  no_compress: bool,

  /// Exit with an error if the compressor emitted any warning.
  #[structopt(long)]
  deny_warnings: bool,

  /// Log more; repeat for more detail.
  #[structopt(short, long, parse(from_occurrences))]
  verbose: u8,
}

fn init_logging(verbose: u8) {
  let default = match verbose {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}

fn compress_options(args: &Cli) -> Result<CompressOptions, String> {
  let mut options = match &args.config {
    Some(path) => {
      let json = fs::read_to_string(path).map_err(|e| format!("read {}: {}", path.display(), e))?;
      CompressOptions::from_json(&json).map_err(|e| e.to_string())?
    }
    None => CompressOptions::default(),
  };
  if let Some(passes) = args.passes {
    options.passes = passes;
  };
  if args.module {
    options.module = true;
  };
  if args.toplevel {
    options.toplevel.funcs = true;
    options.toplevel.vars = true;
  };
  Ok(options)
}

fn run(args: &Cli) -> Result<(), String> {
  let compress = if args.no_compress {
    None
  } else {
    Some(compress_options(args)?)
  };
  let options = MinifyOptions {
    mode: if args.module {
      TopLevelMode::Module
    } else {
      TopLevelMode::Global
    },
    compress,
    deny_warnings: args.deny_warnings,
  };

  let mut input = Vec::new();
  let mut input_file: Box<dyn Read> = match &args.input {
    Some(p) => Box::new(File::open(p).map_err(|e| format!("open {}: {}", p.display(), e))?),
    None => Box::new(stdin()),
  };
  input_file
    .read_to_end(&mut input)
    .map_err(|e| format!("read input: {}", e))?;

  // Compress into memory first so a failed run leaves an existing output file untouched.
  let mut buf = Vec::new();
  let diagnostics = minify(&options, input, &mut buf).map_err(|e| e.to_string())?;
  let warnings = diagnostics.iter().filter(|d| d.level == Level::Warn).count();
  if warnings > 0 {
    warn!(warnings, "compressed with warnings");
  };

  let out_file: Box<dyn Write> = match &args.output {
    Some(p) => Box::new(File::create(p).map_err(|e| format!("create {}: {}", p.display(), e))?),
    None => Box::new(stdout()),
  };
  let mut output = BufWriter::new(out_file);
  output
    .write_all(&buf)
    .and_then(|_| output.flush())
    .map_err(|e| format!("write output: {}", e))?;
  Ok(())
}

fn main() {
  let args = Cli::from_args();
  init_logging(args.verbose);
  if let Err(e) = run(&args) {
    error!("{}", e);
    exit(1);
  };
}
