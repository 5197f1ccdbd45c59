use std::{
	path::Path,
	process::{Command, Output, Stdio},
};

/// The C++ compilers we can drive, in order of preference. These are iterated over and checked for installation; emitted code is
/// standard C++17 and compiles the same under either.
static COMPILERS: &[&str] = &["clang++", "g++"];

/// Returns the command name of a C++ compiler installed on this system, or `None` if there is none. This is the command name
/// (`g++`), not a human-readable name.
#[must_use]
pub fn find_cpp_compiler() -> Option<&'static str> {
	COMPILERS.iter().find(|compiler| which::which(compiler).is_ok()).copied()
}

/// Compiles an emitted C++ file into a native executable at `output_path`.
///
/// # Errors
/// When no C++ compiler is installed, the compiler can't be spawned, or compilation fails — in which case the compiler's stderr is
/// included in the error.
pub fn compile_cpp_to(file_to_compile: &Path, output_path: &Path) -> anyhow::Result<()> {
	let compiler = find_cpp_compiler().ok_or_else(|| anyhow::anyhow!("No C++ compiler found!"))?;
	let output = Command::new(compiler)
		.arg("-std=c++17")
		.arg("-O2")
		.arg("-w")
		.arg("-o")
		.arg(output_path)
		.arg(file_to_compile)
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.output()
		.map_err(|error| anyhow::anyhow!("Error during C++ compilation: unable to spawn {compiler}: {error}"))?;
	if !output.status.success() {
		anyhow::bail!(
			"Error during C++ compilation: {compiler} failed with {}.\n{}",
			output.status,
			String::from_utf8_lossy(&output.stderr)
		);
	}
	Ok(())
}

/// Runs a native executable produced by [`compile_cpp_to`], capturing its output.
///
/// # Errors
/// When the file can't be spawned.
pub fn run_native_executable(file_path: &Path) -> anyhow::Result<Output> {
	Command::new(file_path)
		.output()
		.map_err(|error| anyhow::anyhow!("Error while attempting to run native executable: {error}"))
}
