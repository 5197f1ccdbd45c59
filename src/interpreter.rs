use crate::{
	evaluator::Globals,
	function::{self, FunctionTable},
	io::PrintWriter,
	parser::{self, RuleNode},
};

/// Runs a program given as parsed modules: unions every module's function definitions and invokes `Main`.
///
/// `Main` may take zero parameters, or exactly one, in which case it receives `command_input` (defaulting to `""`). A program without
/// a `Main` runs nothing and yields `""`.
///
/// # Returns
/// The value `Main` returned.
///
/// # Errors
/// A redefinition error from the union, a `Main` with more than one parameter, or any evaluation error, all fatal.
pub fn interpret_modules(modules: &[RuleNode], command_input: Option<&str>, out: &mut dyn PrintWriter) -> anyhow::Result<String> {
	let functions = function::collect_functions(modules)?;
	interpret_functions(&functions, command_input, out)
}

fn interpret_functions(functions: &FunctionTable, command_input: Option<&str>, out: &mut dyn PrintWriter) -> anyhow::Result<String> {
	let Some(main) = functions.get("Main") else {
		return Ok(String::new());
	};
	if main.parameters.len() > 1 {
		anyhow::bail!("Requires either 0 or 1 argument to Main, got {}", main.parameters.len());
	}
	let arguments = if main.parameters.len() == 1 {
		vec![command_input.unwrap_or_default().to_owned()]
	} else {
		Vec::new()
	};
	let mut globals = Globals::new();
	main.call(arguments, &mut globals, functions, out)
}

/// Parses and runs a single source string. The convenience entry point the scenario tests are built on.
pub fn interpret_str(source: &str, command_input: Option<&str>, out: &mut dyn PrintWriter) -> anyhow::Result<String> {
	let module = parser::parse_source(source)?;
	interpret_modules(&[module], command_input, out)
}
