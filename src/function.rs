use indexmap::IndexMap;

use crate::{
	evaluator::{indent, Evaluate as _, GlobalRegistry, Globals, Signal, StatementsEvaluator, TranspileToCpp as _},
	grammar::Rule,
	io::PrintWriter,
	parser::RuleNode,
	scope::ScopeStack,
};

/// Every function in the program, keyed by name. An `IndexMap` rather than a plain map so the transpiler emits bodies in definition
/// order, deterministically, while calls still look functions up by name.
pub type FunctionTable = IndexMap<String, Function>;

/// A top-level function definition. Created once when the front end finishes and immutable afterwards.
#[derive(Debug, Clone)]
pub struct Function {
	/// The function's capitalized name, globally unique across all parsed modules.
	pub name: String,
	/// The parameter names, in order. Arity is this list's length; there are no defaults or variadics.
	pub parameters: Vec<String>,
	body: StatementsEvaluator,
}

impl Function {
	/// Folds a `FunctionDefinition` rule node.
	pub fn lower(node: &RuleNode) -> Self {
		debug_assert_eq!(node.rule, Rule::FunctionDefinition);
		Self {
			name: node.children[0].token().value.clone(),
			parameters: parameters_from_list(node.children[2].rule()),
			body: StatementsEvaluator::from_code_block(node.children[4].rule()),
		}
	}

	/// Calls this function: checks arity, binds each parameter to the corresponding argument in a fresh scope stack, and runs the body.
	/// The function's value is the payload of a `RETURN`, or `""` when the body completes without one.
	///
	/// # Errors
	/// An arity mismatch, or any evaluation error from the body, propagated unchanged.
	pub fn call(&self, arguments: Vec<String>, globals: &mut Globals, functions: &FunctionTable, out: &mut dyn PrintWriter) -> anyhow::Result<String> {
		if arguments.len() != self.parameters.len() {
			anyhow::bail!(
				"Can't call function {}; expected {} arguments, got {}",
				self.name,
				self.parameters.len(),
				arguments.len()
			);
		}
		let mut locals = ScopeStack::with_bindings(self.parameters.iter().cloned().zip(arguments));
		match self.body.evaluate(&mut locals, globals, functions, out, false)? {
			Signal::Return(value) => Ok(value),
			Signal::Continue => Ok(String::new()),
			// A BREAK already errors where it is evaluated when no loop encloses it, so a Break signal never actually
			// reaches a function boundary.
			Signal::Break => anyhow::bail!("Cannot have BREAK statement outside loop"),
		}
	}

	/// The C++ signature of this function, used both for the forward declaration and the definition:
	/// `PBString <Name>_poiboi_fn(PBString <a>_local_poiboivar, …)`.
	#[must_use]
	pub fn declaration(&self) -> String {
		let parameters = self
			.parameters
			.iter()
			.map(|parameter| format!("PBString {parameter}_local_poiboivar"))
			.collect::<Vec<_>>()
			.join(", ");
		format!("PBString {}_poiboi_fn({parameters})", self.name)
	}

	/// Emits this function's C++ definition. The body ends with an inserted `return PBString();` so a body that falls off the end
	/// returns `""`, matching the interpreter.
	pub fn to_cpp(&self, globals: &mut GlobalRegistry, functions: &FunctionTable) -> anyhow::Result<String> {
		let mut locals = ScopeStack::with_bindings(self.parameters.iter().cloned().zip(std::iter::repeat(())));
		let body = self.body.to_cpp(&mut locals, globals, functions, false)?;
		Ok(format!("{} {{\n{}\treturn PBString();\n}}\n", self.declaration(), indent(&body)))
	}
}

/// Folds a `VariablesList` rule node (and its right-recursive expansion chain) into a flat parameter-name vector.
fn parameters_from_list(node: &RuleNode) -> Vec<String> {
	debug_assert_eq!(node.rule, Rule::VariablesList);
	let mut parameters = Vec::new();
	let [variable, rest] = node.children.as_slice() else {
		return parameters;
	};
	parameters.push(variable.token().value.clone());
	let mut expansion = rest.rule();
	while let [_comma, variable, rest] = expansion.children.as_slice() {
		parameters.push(variable.token().value.clone());
		expansion = rest.rule();
	}
	parameters
}

/// Collects every function defined across the given modules into one table, in definition order.
///
/// # Errors
/// A redefinition error when two functions (possibly in different modules) share a name.
pub fn collect_functions(modules: &[RuleNode]) -> anyhow::Result<FunctionTable> {
	let mut functions = FunctionTable::new();
	for module in modules {
		debug_assert_eq!(module.rule, Rule::Module);
		let mut current = module;
		loop {
			match current.children.as_slice() {
				[_end_of_file] => break,
				[definition, rest] => {
					let function = Function::lower(definition.rule());
					if functions.contains_key(&function.name) {
						anyhow::bail!("Multiple definitions of function: {}", function.name);
					}
					let _slot = functions.insert(function.name.clone(), function);
					current = rest.rule();
				},
				other => unreachable!("a module node never has {} children", other.len()),
			}
		}
	}
	Ok(functions)
}

#[cfg(test)]
mod tests {
	use super::collect_functions;
	use crate::parser::parse_source;

	#[test]
	fn functions_are_collected_in_definition_order() {
		let module = parse_source("Foo() {} Bar(a, b) {} Main() {}").unwrap();
		let functions = collect_functions(&[module]).unwrap();
		let names: Vec<&str> = functions.keys().map(String::as_str).collect();
		assert_eq!(names, vec!["Foo", "Bar", "Main"]);
		assert_eq!(functions["Bar"].parameters, vec!["a", "b"]);
	}

	#[test]
	fn redefinition_across_modules_is_an_error() {
		let first = parse_source("Foo() {}").unwrap();
		let second = parse_source("Foo(a) {}").unwrap();
		let error = collect_functions(&[first, second]).unwrap_err();
		assert!(error.to_string().contains("Foo"), "{error}");
	}

	#[test]
	fn call_with_wrong_arity_is_an_error() {
		let module = parse_source("Greet(name) { PRINT(name); }").unwrap();
		let functions = collect_functions(&[module]).unwrap();
		let mut globals = crate::evaluator::Globals::new();
		let error = functions["Greet"].call(Vec::new(), &mut globals, &functions, &mut String::new()).unwrap_err();
		let message = error.to_string();
		assert!(message.contains("Greet"), "{message}");
		assert!(message.contains("expected 1"), "{message}");
	}

	#[test]
	fn body_without_return_yields_the_empty_string() {
		let module = parse_source("Noop() { x = \"ignored\"; }").unwrap();
		let functions = collect_functions(&[module]).unwrap();
		let mut globals = crate::evaluator::Globals::new();
		let result = functions["Noop"].call(Vec::new(), &mut globals, &functions, &mut String::new()).unwrap();
		assert_eq!(result, "");
	}

	#[test]
	fn declaration_names_every_parameter() {
		let module = parse_source("Join(a, b) { RETURN CONCAT(a, b); }").unwrap();
		let functions = collect_functions(&[module]).unwrap();
		assert_eq!(
			functions["Join"].declaration(),
			"PBString Join_poiboi_fn(PBString a_local_poiboivar, PBString b_local_poiboivar)"
		);
	}
}
