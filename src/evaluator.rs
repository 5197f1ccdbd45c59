use std::collections::{BTreeSet, HashMap};

use enum_dispatch::enum_dispatch;

use crate::{
	builtins::{self, is_true},
	function::FunctionTable,
	grammar::Rule,
	io::PrintWriter,
	lexer::TokenType,
	parser::{CstNode, RuleNode},
	scope::ScopeStack,
};

/// The process-level global variables of a running program. Globals come into existence on first assignment; reading a name that was
/// never assigned anywhere is not an error, it yields `""`.
pub type Globals = HashMap<String, String>;

/// The transpiler's record of every global the program assigns. Kept sorted so the emitted `PBString <name>_global_poiboivar;`
/// definitions come out in a deterministic order.
pub type GlobalRegistry = BTreeSet<String>;

/// What a statement's evaluation tells its enclosing block to do next. Errors are not a variant; they propagate as `anyhow` errors via
/// `?`, unchanged, all the way to the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
	/// Carry on with the next statement.
	Continue,
	/// Unwind to the nearest enclosing function call, which returns the payload to its caller.
	Return(String),
	/// Unwind to the nearest enclosing `WHILE`, which converts this back to `Continue`. Reaching a function boundary instead is a
	/// control-flow error, enforced where the `BREAK` is evaluated via the `is_in_loop` flag.
	Break,
}

/// Direct execution of an AST node. One of the two back ends; implementations must agree with [`TranspileToCpp`] on scoping, control
/// flow, and builtin semantics.
#[enum_dispatch]
pub trait Evaluate {
	/// Evaluates this node.
	///
	/// # Parameters
	/// - `locals` - The scope chain of the enclosing function call.
	/// - `globals` - The process-level globals.
	/// - `functions` - Every function in the program, for calls.
	/// - `out` - Where `PRINT` writes.
	/// - `is_in_loop` - Whether a `WHILE` encloses this statement within the current function; a `BREAK` evaluated with this false is
	///   an error.
	fn evaluate(
		&self,
		locals: &mut ScopeStack<String>,
		globals: &mut Globals,
		functions: &FunctionTable,
		out: &mut dyn PrintWriter,
		is_in_loop: bool,
	) -> anyhow::Result<Signal>;
}

/// Emission of C++ statement text for an AST node. The other back end; the emitted code, compiled against the bundled `PBString`
/// runtime, must reproduce exactly what [`Evaluate`] does.
#[enum_dispatch]
pub trait TranspileToCpp {
	/// Emits this node as C++ statement text (no trailing newline). `locals` tracks which names are declared in which block so
	/// assignments know whether to emit a declaration; `globals` registers every global assignment so the compiler can define them at
	/// the top level.
	fn to_cpp(&self, locals: &mut ScopeStack<()>, globals: &mut GlobalRegistry, functions: &FunctionTable, is_in_loop: bool) -> anyhow::Result<String>;
}

/// One statement of a function body.
#[enum_dispatch(Evaluate, TranspileToCpp)]
#[derive(Debug, Clone)]
pub enum Statement {
	Assignment(VariableAssigner),
	Call(FunctionCaller),
	While(WhileEvaluator),
	If(IfEvaluator),
	Break(BreakEvaluator),
	Return(ReturnEvaluator),
}

impl Statement {
	/// Folds one `Statement` rule node into its typed form, dispatching on the node's first child the same way the grammar did.
	fn lower(node: &RuleNode) -> Self {
		debug_assert_eq!(node.rule, Rule::Statement);
		match &node.children[0] {
			CstNode::Rule(child) if child.rule == Rule::VariableAssignment => Self::Assignment(VariableAssigner::lower(child)),
			CstNode::Rule(child) if child.rule == Rule::FunctionCall => Self::Call(FunctionCaller::lower(child)),
			CstNode::Rule(child) => unreachable!("a statement never starts with a {:?} node", child.rule),
			CstNode::Token(token) => match token.token_type {
				TokenType::KeywordWhile => Self::While(WhileEvaluator {
					condition: RValueEvaluator::from_conditional(node.children[1].rule()),
					body: StatementsEvaluator::from_code_block(node.children[2].rule()),
				}),
				TokenType::KeywordIf => IfEvaluator::lower(node.children[1].rule(), node.children[2].rule(), node.children[3].rule()).into(),
				TokenType::KeywordReturn => Self::Return(ReturnEvaluator {
					value: RValueEvaluator::lower(node.children[1].rule()),
				}),
				TokenType::KeywordBreak => Self::Break(BreakEvaluator),
				other => unreachable!("a statement never starts with a {other:?} token"),
			},
		}
	}
}

/// An ordered run of statements: a function body or the inside of a block. Statements evaluate strictly in textual order; the first
/// non-`Continue` signal stops the run and escalates.
#[derive(Debug, Clone)]
pub struct StatementsEvaluator {
	statements: Vec<Statement>,
}

impl StatementsEvaluator {
	/// Folds a `StatementList` rule node (a right-recursive chain in the concrete tree) into a flat statement vector.
	pub fn from_statement_list(node: &RuleNode) -> Self {
		debug_assert_eq!(node.rule, Rule::StatementList);
		let mut statements = Vec::new();
		let mut list = node;
		while let [statement, rest] = list.children.as_slice() {
			statements.push(Statement::lower(statement.rule()));
			list = rest.rule();
		}
		Self { statements }
	}

	/// Folds a `CodeBlock` rule node (braces around a statement list) into its statements.
	pub fn from_code_block(node: &RuleNode) -> Self {
		debug_assert_eq!(node.rule, Rule::CodeBlock);
		Self::from_statement_list(node.children[1].rule())
	}
}

impl Evaluate for StatementsEvaluator {
	fn evaluate(
		&self,
		locals: &mut ScopeStack<String>,
		globals: &mut Globals,
		functions: &FunctionTable,
		out: &mut dyn PrintWriter,
		is_in_loop: bool,
	) -> anyhow::Result<Signal> {
		for statement in &self.statements {
			match statement.evaluate(locals, globals, functions, out, is_in_loop)? {
				Signal::Continue => {},
				escalated => return Ok(escalated),
			}
		}
		Ok(Signal::Continue)
	}
}

impl TranspileToCpp for StatementsEvaluator {
	fn to_cpp(&self, locals: &mut ScopeStack<()>, globals: &mut GlobalRegistry, functions: &FunctionTable, is_in_loop: bool) -> anyhow::Result<String> {
		let mut code = String::new();
		for statement in &self.statements {
			code.push_str(&statement.to_cpp(locals, globals, functions, is_in_loop)?);
			// A call used as a statement is emitted as a bare expression; terminate it.
			if matches!(statement, Statement::Call(_)) {
				code.push(';');
			}
			code.push('\n');
		}
		Ok(code)
	}
}

/// An expression yielding a string: a literal, a variable read, or a call.
#[derive(Debug, Clone)]
pub enum RValueEvaluator {
	/// A string literal, stored exactly as written, quotes and escapes included. The interpreter decodes it on evaluation; the
	/// transpiler re-emits it verbatim and lets the C++ compiler apply the escapes.
	StringLiteral(String),
	/// A variable read: innermost frame outward, then the globals, then `""`.
	Variable(String),
	/// A function or builtin call.
	Call(FunctionCaller),
}

impl RValueEvaluator {
	/// Folds an `RValue` rule node.
	pub fn lower(node: &RuleNode) -> Self {
		debug_assert_eq!(node.rule, Rule::RValue);
		match &node.children[0] {
			CstNode::Token(token) if token.token_type == TokenType::String => Self::StringLiteral(token.value.clone()),
			CstNode::Token(token) => {
				debug_assert_eq!(token.token_type, TokenType::Variable);
				Self::Variable(token.value.clone())
			},
			CstNode::Rule(call) => Self::Call(FunctionCaller::lower(call)),
		}
	}

	/// Folds a `ConditionalEvaluator` rule node (an rvalue in brackets).
	pub fn from_conditional(node: &RuleNode) -> Self {
		debug_assert_eq!(node.rule, Rule::ConditionalEvaluator);
		Self::lower(node.children[1].rule())
	}

	/// Evaluates this rvalue to its string value. Reads don't mutate the scope chain, but a call inside the expression may assign
	/// globals or print.
	pub fn evaluate(
		&self,
		locals: &ScopeStack<String>,
		globals: &mut Globals,
		functions: &FunctionTable,
		out: &mut dyn PrintWriter,
	) -> anyhow::Result<String> {
		match self {
			Self::StringLiteral(raw) => Ok(unquote(raw)),
			Self::Variable(name) => Ok(locals.get(name).or_else(|| globals.get(name)).cloned().unwrap_or_default()),
			Self::Call(caller) => caller.evaluate_call(locals, globals, functions, out),
		}
	}

	/// Emits this rvalue as a C++ expression. A name bound on the scope chain reads the local; a registered global reads the global;
	/// anything else is a read of a never-assigned name and emits a default-constructed (empty) `PBString`, matching the
	/// interpreter's `""`.
	pub fn to_cpp(&self, locals: &ScopeStack<()>, globals: &GlobalRegistry, functions: &FunctionTable) -> anyhow::Result<String> {
		match self {
			Self::StringLiteral(raw) => Ok(format!("PBString::NewStaticString({raw})")),
			Self::Variable(name) => Ok(if locals.is_bound(name) {
				format!("{name}_local_poiboivar")
			} else if globals.contains(name) {
				format!("{name}_global_poiboivar")
			} else {
				"PBString()".to_owned()
			}),
			Self::Call(caller) => caller.to_cpp_expression(locals, globals, functions),
		}
	}
}

/// Decodes a scanned string literal: strips the quotes of each adjacent run (concatenating the runs), and applies the common escapes
/// (`\"`, `\\`, `\n`, `\t`). An unrecognized escape passes through backslash and all, which is also what the emitted C++ compiles to
/// for the escapes the language actually promises.
fn unquote(raw: &str) -> String {
	let mut decoded = String::with_capacity(raw.len());
	let mut characters = raw.chars();
	let mut inside = false;
	while let Some(character) = characters.next() {
		if !inside {
			if character == '"' {
				inside = true;
			}
			continue;
		}
		match character {
			'"' => inside = false,
			'\\' => match characters.next() {
				Some('n') => decoded.push('\n'),
				Some('t') => decoded.push('\t'),
				Some('"') => decoded.push('"'),
				Some('\\') => decoded.push('\\'),
				Some(other) => {
					decoded.push('\\');
					decoded.push(other);
				},
				None => decoded.push('\\'),
			},
			other => decoded.push(other),
		}
	}
	decoded
}

/// Prefixes every line of a block with one tab, so nested emitted C++ reads like hand-written code.
pub(crate) fn indent(code: &str) -> String {
	code.lines().fold(String::new(), |mut indented, line| {
		indented.push('\t');
		indented.push_str(line);
		indented.push('\n');
		indented
	})
}

/// A call of a user function or builtin: the callee name plus one rvalue per argument. Arguments evaluate left to right, fully,
/// before the callee runs — `AND`/`OR` included.
#[derive(Debug, Clone)]
pub struct FunctionCaller {
	name: String,
	is_builtin: bool,
	arguments: Vec<RValueEvaluator>,
}

impl FunctionCaller {
	/// Folds a `FunctionCall` rule node. Whether the callee is a builtin was already decided by the scanner (builtin names are all
	/// uppercase), so the token type is all we need here.
	pub fn lower(node: &RuleNode) -> Self {
		debug_assert_eq!(node.rule, Rule::FunctionCall);
		let callee = node.children[0].token();
		Self {
			name: callee.value.clone(),
			is_builtin: callee.token_type == TokenType::Builtin,
			arguments: rvalues_from_list(node.children[2].rule()),
		}
	}

	/// Evaluates the arguments left to right, then dispatches to the builtin catalog or the function table. The result is the call's
	/// value; as a statement it is discarded.
	pub fn evaluate_call(
		&self,
		locals: &ScopeStack<String>,
		globals: &mut Globals,
		functions: &FunctionTable,
		out: &mut dyn PrintWriter,
	) -> anyhow::Result<String> {
		let mut call_values = Vec::with_capacity(self.arguments.len());
		for argument in &self.arguments {
			call_values.push(argument.evaluate(locals, globals, functions, out)?);
		}
		if self.is_builtin {
			return builtins::evaluate_builtin(&self.name, &call_values, out);
		}
		let Some(function) = functions.get(&self.name) else {
			anyhow::bail!("Function {} not defined", self.name);
		};
		function.call(call_values, globals, functions, out)
	}

	/// Emits the C++ call expression. User-function arity is checked here at compile time, mirroring the runtime check in
	/// `Function::call`; builtin arity is checked by the catalog.
	pub fn to_cpp_expression(&self, locals: &ScopeStack<()>, globals: &GlobalRegistry, functions: &FunctionTable) -> anyhow::Result<String> {
		let mut argument_code = Vec::with_capacity(self.arguments.len());
		for argument in &self.arguments {
			argument_code.push(argument.to_cpp(locals, globals, functions)?);
		}
		if self.is_builtin {
			return builtins::transpile_builtin(&self.name, &argument_code);
		}
		let Some(function) = functions.get(&self.name) else {
			anyhow::bail!("Function {} not defined", self.name);
		};
		if argument_code.len() != function.parameters.len() {
			anyhow::bail!(
				"Calling function {} with {} args, expected {}",
				self.name,
				argument_code.len(),
				function.parameters.len()
			);
		}
		Ok(format!("{}_poiboi_fn({})", self.name, argument_code.join(", ")))
	}
}

impl Evaluate for FunctionCaller {
	fn evaluate(
		&self,
		locals: &mut ScopeStack<String>,
		globals: &mut Globals,
		functions: &FunctionTable,
		out: &mut dyn PrintWriter,
		_is_in_loop: bool,
	) -> anyhow::Result<Signal> {
		let _discarded = self.evaluate_call(locals, globals, functions, out)?;
		Ok(Signal::Continue)
	}
}

impl TranspileToCpp for FunctionCaller {
	fn to_cpp(&self, locals: &mut ScopeStack<()>, globals: &mut GlobalRegistry, functions: &FunctionTable, _is_in_loop: bool) -> anyhow::Result<String> {
		self.to_cpp_expression(locals, globals, functions)
	}
}

/// Folds an `RValueList` rule node (and its right-recursive expansion chain) into a flat argument vector.
fn rvalues_from_list(node: &RuleNode) -> Vec<RValueEvaluator> {
	debug_assert_eq!(node.rule, Rule::RValueList);
	let mut rvalues = Vec::new();
	let [rvalue, rest] = node.children.as_slice() else {
		return rvalues;
	};
	rvalues.push(RValueEvaluator::lower(rvalue.rule()));
	let mut expansion = rest.rule();
	while let [_comma, rvalue, rest] = expansion.children.as_slice() {
		rvalues.push(RValueEvaluator::lower(rvalue.rule()));
		expansion = rest.rule();
	}
	rvalues
}

/// An assignment of an rvalue to a variable. Where the value lands:
///
/// - `name = …` with `name` bound somewhere on the chain updates the innermost frame that binds it, in place — with or without
///   `LOCAL`, so a `LOCAL` in a nested block of a name an outer frame binds writes through and the value survives the block.
/// - `LOCAL name = …` with `name` bound nowhere creates the binding in the innermost frame, released when the block exits.
/// - `name = …` with `name` bound nowhere assigns the process-level global.
///
/// The rvalue is evaluated before the store, so `a = CONCAT(a, "!")` reads the prior value.
#[derive(Debug, Clone)]
pub struct VariableAssigner {
	name: String,
	is_local: bool,
	value: RValueEvaluator,
}

impl VariableAssigner {
	/// Folds a `VariableAssignment` rule node; the `LOCAL` keyword shows up as a fourth (leading) child.
	pub fn lower(node: &RuleNode) -> Self {
		debug_assert_eq!(node.rule, Rule::VariableAssignment);
		let is_local = node.children.len() == 4;
		let offset = usize::from(is_local);
		Self {
			name: node.children[offset].token().value.clone(),
			is_local,
			value: RValueEvaluator::lower(node.children[offset + 2].rule()),
		}
	}
}

impl Evaluate for VariableAssigner {
	fn evaluate(
		&self,
		locals: &mut ScopeStack<String>,
		globals: &mut Globals,
		functions: &FunctionTable,
		out: &mut dyn PrintWriter,
		_is_in_loop: bool,
	) -> anyhow::Result<Signal> {
		let value = self.value.evaluate(locals, globals, functions, out)?;
		if self.is_local {
			locals.set_value(&self.name, value);
		} else if !locals.update(&self.name, value.clone()) {
			let _previous = globals.insert(self.name.clone(), value);
		}
		Ok(Signal::Continue)
	}
}

impl TranspileToCpp for VariableAssigner {
	fn to_cpp(&self, locals: &mut ScopeStack<()>, globals: &mut GlobalRegistry, functions: &FunctionTable, _is_in_loop: bool) -> anyhow::Result<String> {
		let expression = self.value.to_cpp(locals, globals, functions)?;
		if locals.is_bound(&self.name) {
			// A store, not a declaration: C++ resolves the name to the block that declared it, so a LOCAL in a nested
			// block writes through to the owning block exactly like the interpreter.
			Ok(format!("{}_local_poiboivar = {expression};", self.name))
		} else if self.is_local {
			locals.set_value(&self.name, ());
			Ok(format!("PBString {}_local_poiboivar = {expression};", self.name))
		} else {
			let _newly_registered = globals.insert(self.name.clone());
			Ok(format!("{}_global_poiboivar = {expression};", self.name))
		}
	}
}

/// What follows the then-block of an `IF`: either a plain `ELSE` body or another conditional for `ELIF`, which may itself chain
/// further.
#[derive(Debug, Clone)]
pub enum ElseBranch {
	Statements(StatementsEvaluator),
	If(Box<IfEvaluator>),
}

/// An `IF`/`ELIF`/`ELSE` chain. The taken branch runs in a fresh frame; a condition holds iff its value is exactly `TRUE`.
#[derive(Debug, Clone)]
pub struct IfEvaluator {
	condition: RValueEvaluator,
	then_body: StatementsEvaluator,
	else_branch: Option<ElseBranch>,
}

impl IfEvaluator {
	/// Folds the three trailing children of an `IF` statement. `ELIF` chains fold recursively into nested `IfEvaluator`s.
	fn lower(condition: &RuleNode, block: &RuleNode, else_node: &RuleNode) -> Self {
		debug_assert_eq!(else_node.rule, Rule::ElseStatement);
		let else_branch = match else_node.children.as_slice() {
			[] => None,
			[keyword, block] if keyword.token().token_type == TokenType::KeywordElse => {
				Some(ElseBranch::Statements(StatementsEvaluator::from_code_block(block.rule())))
			},
			[_elif, condition, block, chained] => Some(ElseBranch::If(Box::new(Self::lower(condition.rule(), block.rule(), chained.rule())))),
			other => unreachable!("an else statement never has {} children", other.len()),
		};
		Self {
			condition: RValueEvaluator::from_conditional(condition),
			then_body: StatementsEvaluator::from_code_block(block),
			else_branch,
		}
	}
}

impl Evaluate for IfEvaluator {
	fn evaluate(
		&self,
		locals: &mut ScopeStack<String>,
		globals: &mut Globals,
		functions: &FunctionTable,
		out: &mut dyn PrintWriter,
		is_in_loop: bool,
	) -> anyhow::Result<Signal> {
		let condition_value = self.condition.evaluate(locals, globals, functions, out)?;
		locals.push_frame();
		let result = if is_true(&condition_value) {
			self.then_body.evaluate(locals, globals, functions, out, is_in_loop)
		} else {
			match &self.else_branch {
				None => Ok(Signal::Continue),
				Some(ElseBranch::Statements(statements)) => statements.evaluate(locals, globals, functions, out, is_in_loop),
				Some(ElseBranch::If(chained)) => chained.evaluate(locals, globals, functions, out, is_in_loop),
			}
		};
		locals.pop_frame();
		result
	}
}

impl TranspileToCpp for IfEvaluator {
	fn to_cpp(&self, locals: &mut ScopeStack<()>, globals: &mut GlobalRegistry, functions: &FunctionTable, is_in_loop: bool) -> anyhow::Result<String> {
		let condition = self.condition.to_cpp(locals, globals, functions)?;

		locals.push_frame();
		let then_code = self.then_body.to_cpp(locals, globals, functions, is_in_loop);
		locals.pop_frame();
		let mut code = format!("if ({condition}) {{\n{}}}", indent(&then_code?));

		if let Some(else_branch) = &self.else_branch {
			locals.push_frame();
			let else_code = match else_branch {
				ElseBranch::Statements(statements) => statements.to_cpp(locals, globals, functions, is_in_loop),
				// A chained ELIF emits as a nested `else { if … }`, which compiles identically to `else if`.
				ElseBranch::If(chained) => chained.to_cpp(locals, globals, functions, is_in_loop),
			};
			locals.pop_frame();
			code.push_str(&format!(" else {{\n{}}}", indent(&else_code?)));
		}
		Ok(code)
	}
}

/// A `WHILE` loop: re-evaluate the condition, exit on non-`TRUE`, run the body in a fresh frame each iteration. A `Break` from the
/// body exits cleanly; a `Return` keeps unwinding.
#[derive(Debug, Clone)]
pub struct WhileEvaluator {
	condition: RValueEvaluator,
	body: StatementsEvaluator,
}

impl Evaluate for WhileEvaluator {
	fn evaluate(
		&self,
		locals: &mut ScopeStack<String>,
		globals: &mut Globals,
		functions: &FunctionTable,
		out: &mut dyn PrintWriter,
		_is_in_loop: bool,
	) -> anyhow::Result<Signal> {
		loop {
			let condition_value = self.condition.evaluate(locals, globals, functions, out)?;
			if !is_true(&condition_value) {
				return Ok(Signal::Continue);
			}
			locals.push_frame();
			let result = self.body.evaluate(locals, globals, functions, out, true);
			locals.pop_frame();
			match result? {
				Signal::Continue => {},
				Signal::Break => return Ok(Signal::Continue),
				Signal::Return(value) => return Ok(Signal::Return(value)),
			}
		}
	}
}

impl TranspileToCpp for WhileEvaluator {
	fn to_cpp(&self, locals: &mut ScopeStack<()>, globals: &mut GlobalRegistry, functions: &FunctionTable, _is_in_loop: bool) -> anyhow::Result<String> {
		let condition = self.condition.to_cpp(locals, globals, functions)?;
		locals.push_frame();
		let body_code = self.body.to_cpp(locals, globals, functions, true);
		locals.pop_frame();
		Ok(format!("while ({condition}) {{\n{}}}", indent(&body_code?)))
	}
}

/// A `BREAK` statement. Legal only under a `WHILE` within the same function; both back ends reject it anywhere else.
#[derive(Debug, Clone)]
pub struct BreakEvaluator;

impl Evaluate for BreakEvaluator {
	fn evaluate(
		&self,
		_locals: &mut ScopeStack<String>,
		_globals: &mut Globals,
		_functions: &FunctionTable,
		_out: &mut dyn PrintWriter,
		is_in_loop: bool,
	) -> anyhow::Result<Signal> {
		if !is_in_loop {
			anyhow::bail!("Cannot have BREAK statement outside loop");
		}
		Ok(Signal::Break)
	}
}

impl TranspileToCpp for BreakEvaluator {
	fn to_cpp(&self, _locals: &mut ScopeStack<()>, _globals: &mut GlobalRegistry, _functions: &FunctionTable, is_in_loop: bool) -> anyhow::Result<String> {
		if !is_in_loop {
			anyhow::bail!("Cannot have BREAK statement outside loop");
		}
		Ok("break;".to_owned())
	}
}

/// A `RETURN` statement: evaluate the rvalue, then unwind to the enclosing function call.
#[derive(Debug, Clone)]
pub struct ReturnEvaluator {
	value: RValueEvaluator,
}

impl Evaluate for ReturnEvaluator {
	fn evaluate(
		&self,
		locals: &mut ScopeStack<String>,
		globals: &mut Globals,
		functions: &FunctionTable,
		out: &mut dyn PrintWriter,
		_is_in_loop: bool,
	) -> anyhow::Result<Signal> {
		let value = self.value.evaluate(locals, globals, functions, out)?;
		Ok(Signal::Return(value))
	}
}

impl TranspileToCpp for ReturnEvaluator {
	fn to_cpp(&self, locals: &mut ScopeStack<()>, globals: &mut GlobalRegistry, functions: &FunctionTable, _is_in_loop: bool) -> anyhow::Result<String> {
		Ok(format!("return {};", self.value.to_cpp(locals, globals, functions)?))
	}
}
