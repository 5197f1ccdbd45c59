// Brings the `write!()` and `writeln!()` macros into scope, which allows appending to a string. This is more efficient than
// `string = format!("{string}...")`, because it avoids an extra allocation.
use std::fmt::Write as _;

use crate::{
	evaluator::GlobalRegistry,
	function::{self, FunctionTable},
	parser::{self, RuleNode},
};

/// The bundled C++ runtime header, inlined verbatim near the top of every emitted translation unit.
pub const POIBOI_STRING_HEADER: &str = include_str!("../runtime/poiboi_string.h");

/// The bundled C++ runtime implementation, inlined directly after its header. It skips its own `#include` when the
/// `POIBOI_EXECUTABLE_` flag defined at the top of the emitted file is present.
pub const POIBOI_STRING_SOURCE: &str = include_str!("../runtime/poiboi_string.cc");

/// Transpiles parsed modules into a single self-contained C++17 translation unit that, compiled against nothing but itself,
/// reproduces the interpreter's behavior. Layout, in order: the compile-time flags, the inlined runtime pair, one forward declaration
/// per function, one definition per referenced global, the function bodies in definition order, and `main`.
///
/// # Errors
/// A redefinition error from the union, any transpile error (unknown call, arity mismatch, `BREAK` outside a loop), or a `Main`
/// declared with more than one parameter.
pub fn compile_modules(modules: &[RuleNode]) -> anyhow::Result<String> {
	let functions = function::collect_functions(modules)?;
	compile_functions(&functions)
}

/// Parses and transpiles a single source string.
pub fn compile_str(source: &str) -> anyhow::Result<String> {
	let module = parser::parse_source(source)?;
	compile_modules(&[module])
}

fn compile_functions(functions: &FunctionTable) -> anyhow::Result<String> {
	// Two emission passes. The first only discovers which names are assigned globally; without it, a function that reads a global
	// before the function that assigns it has been emitted would read a default-constructed PBString and disagree with the
	// interpreter. The second pass emits every body against the full registry.
	let mut globals = GlobalRegistry::new();
	for function in functions.values() {
		let _discovery = function.to_cpp(&mut globals, functions)?;
	}
	let mut bodies = Vec::with_capacity(functions.len());
	for function in functions.values() {
		bodies.push(function.to_cpp(&mut globals, functions)?);
	}

	let mut code = String::new();
	code.push_str("#define POIBOI_EXECUTABLE_\n");
	code.push_str("#define POIBOI_INCLUDE_ASSERT_\n\n");
	code.push_str(POIBOI_STRING_HEADER);
	code.push('\n');
	code.push_str(POIBOI_STRING_SOURCE);
	code.push('\n');

	for function in functions.values() {
		writeln!(code, "{};", function.declaration())?;
	}
	code.push('\n');

	for global in &globals {
		writeln!(code, "PBString {global}_global_poiboivar;")?;
	}
	code.push('\n');

	for body in bodies {
		code.push_str(&body);
		code.push('\n');
	}

	code.push_str(&main_definition(functions)?);
	Ok(code)
}

/// Emits `main`. A program without `Main` still compiles to a runnable (do-nothing) executable. `Main` taking one parameter receives
/// an empty `PBString`; wiring real command input through `main` stays with the interpreter driver.
fn main_definition(functions: &FunctionTable) -> anyhow::Result<String> {
	let Some(main) = functions.get("Main") else {
		return Ok("int main() {\n\treturn 0;\n}\n".to_owned());
	};
	match main.parameters.len() {
		0 => Ok("int main() {\n\tMain_poiboi_fn();\n\treturn 0;\n}\n".to_owned()),
		1 => Ok("int main() {\n\tMain_poiboi_fn(PBString());\n\treturn 0;\n}\n".to_owned()),
		more => anyhow::bail!("Requires either 0 or 1 argument to Main, got {more}"),
	}
}
