use std::path::{Path, PathBuf};

use anyhow::Context as _;
use colored::Colorize as _;

use crate::{compiler, interpreter, io::StdPrint, parser, parser::RuleNode, toolchain};

/// The command-line arguments for the PoiBoi compiler.
#[derive(clap::Parser)]
pub struct CompilerArguments {
	/// The input `.poiboi` files (or directories of them), followed by the output C++ file as the last argument.
	pub paths: Vec<String>,

	/// Also compile the emitted C++ into a native executable next to it (requires clang++ or g++).
	#[arg(long)]
	pub build: bool,

	/// Suppress progress output.
	#[arg(long)]
	pub quiet: bool,
}

impl CompilerArguments {
	/// Runs the compiler driver: parse every input, transpile, and only then write the output file — an error anywhere means
	/// nothing is written.
	pub fn execute(self) -> anyhow::Result<()> {
		if self.paths.len() < 2 {
			println!(
				"{}",
				unindent::unindent(
					"
                    The last argument is the output C++ file. The preceding arguments are input
                    PoiBoi source code:

                        poiboi_compiler <in1.poiboi> [in2.poiboi ...] <out.cc>
                    ",
				)
			);
			return Ok(());
		}
		let Some((output, inputs)) = self.paths.split_last() else {
			unreachable!("two or more paths were just checked for");
		};
		if output.ends_with(".poiboi") {
			anyhow::bail!("The last argument should be an output C++ file, not an input PoiBoi file");
		}

		let modules = parse_files(inputs, self.quiet)?;
		step(self.quiet, "Compiling", "program");
		let code = compiler::compile_modules(&modules)?;
		std::fs::write(output, code).with_context(|| format!("couldn't write {output}"))?;

		if self.build {
			let executable = Path::new(output).with_extension("");
			step(self.quiet, "Building", &executable.display().to_string());
			toolchain::compile_cpp_to(Path::new(output), &executable)?;
		}
		Ok(())
	}
}

/// The command-line arguments for the PoiBoi interpreter.
#[derive(clap::Parser)]
pub struct InterpreterArguments {
	/// The input `.poiboi` files (or directories of them). All of their function definitions are unioned before `Main` runs.
	pub paths: Vec<String>,

	/// The string passed to `Main` when it takes one parameter.
	#[arg(long)]
	pub input: Option<String>,

	/// Suppress progress output.
	#[arg(long)]
	pub quiet: bool,
}

impl InterpreterArguments {
	/// Runs the interpreter driver.
	pub fn execute(self) -> anyhow::Result<()> {
		if self.paths.is_empty() {
			println!("Pass one or more PoiBoi source files to run.");
			return Ok(());
		}
		let modules = parse_files(&self.paths, self.quiet)?;
		step(self.quiet, "Running", "Main");
		let _returned = interpreter::interpret_modules(&modules, self.input.as_deref(), &mut StdPrint)?;
		Ok(())
	}
}

/// Prints one bold green progress line, the way every step of the pipeline announces itself.
fn step(quiet: bool, action: &str, object: &str) {
	if !quiet {
		println!("{} {object}", action.bold().green());
	}
}

/// Reads and parses every input into a module, expanding directories first.
fn parse_files(inputs: &[String], quiet: bool) -> anyhow::Result<Vec<RuleNode>> {
	let mut modules = Vec::new();
	for path in collect_source_paths(inputs) {
		let name = path.display().to_string();
		step(quiet, "Parsing", &name);
		let source = std::fs::read_to_string(&path).with_context(|| format!("couldn't read {name}"))?;
		modules.push(parser::parse_source(&source).with_context(|| format!("in {name}"))?);
	}
	Ok(modules)
}

/// Expands each input path: a directory becomes its `.poiboi` files (recursively, sorted); anything else is taken as given and
/// allowed to fail at read time with a proper error.
fn collect_source_paths(inputs: &[String]) -> Vec<PathBuf> {
	let mut paths = Vec::new();
	for input in inputs {
		let path = PathBuf::from(input);
		if path.is_dir() {
			let mut found: Vec<PathBuf> = walkdir::WalkDir::new(&path)
				.into_iter()
				.filter_map(Result::ok)
				.filter(|entry| entry.file_type().is_file() && entry.path().extension().is_some_and(|extension| extension == "poiboi"))
				.map(walkdir::DirEntry::into_path)
				.collect();
			found.sort();
			paths.append(&mut found);
		} else {
			paths.push(path);
		}
	}
	paths
}
