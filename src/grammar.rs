use crate::lexer::TokenType;

/// The empty expansion. A rule that lists this among its alternatives may match zero tokens.
const EMPTY: &[GrammarItem] = &[];

/// A nonterminal of the PoiBoi grammar. The grammar is data, not code: each rule publishes its alternative right-hand sides through
/// [`Rule::expansions`], and a single generic parser drives itself off those tables. Adding syntax to the language means adding a row
/// here, not writing a new parse function.
#[derive(strum_macros::EnumIter, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
	/// A whole source file: a run of function definitions terminated by end-of-file.
	Module,
	/// A function definition: name, parameter list, and the code block that defines it.
	FunctionDefinition,
	/// A parameter list: empty, or one variable followed by an expansion.
	VariablesList,
	/// The tail of a parameter list: zero or more `, variable` pairs.
	VariablesListExpansion,
	/// All valid code surrounded by braces.
	CodeBlock,
	/// A run of statements, possibly empty.
	StatementList,
	/// One statement: an assignment, a call, a loop, a conditional, a return, or a break.
	Statement,
	/// An assignment of an rvalue to a (possibly `LOCAL`) variable.
	VariableAssignment,
	/// A call of a function or builtin with arguments surrounded by parentheses.
	FunctionCall,
	/// The bracketed condition of an `IF`, `ELIF`, or `WHILE`.
	ConditionalEvaluator,
	/// What may follow an `IF` block: nothing, an `ELSE` block, or an `ELIF` chain.
	ElseStatement,
	/// Something which yields a string: a literal, a variable read, or a call.
	RValue,
	/// An argument list: empty, or one rvalue followed by an expansion.
	RValueList,
	/// The tail of an argument list: zero or more `, rvalue` pairs.
	RValueListExpansion,
}

/// One element of a right-hand side: either a concrete token kind or another rule to expand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarItem {
	/// A terminal; the parser must find exactly this token kind next.
	Token(TokenType),
	/// A nonterminal; the parser recurses into its expansions.
	Rule(Rule),
}

impl GrammarItem {
	/// Whether this item can start with a token of the given kind. For a terminal that is plain equality; for a rule it asks whether any
	/// of the rule's expansions accepts the kind (an ε alternative accepts anything, by matching nothing).
	pub fn accepts(self, token_type: TokenType) -> bool {
		match self {
			Self::Token(expected) => expected == token_type,
			Self::Rule(rule) => rule.select_expansion(token_type).is_some(),
		}
	}
}

impl Rule {
	/// The alternative right-hand sides of this nonterminal, in the order they are probed. These tables are the whole grammar; the parser
	/// in `parser.rs` contains no production-specific code.
	pub fn expansions(self) -> &'static [&'static [GrammarItem]] {
		use crate::lexer::TokenType as Tt;
		use GrammarItem::{Rule as R, Token as T};
		match self {
			Self::Module => &[&[T(Tt::EndOfFile)], &[R(Self::FunctionDefinition), R(Self::Module)]],
			Self::FunctionDefinition => &[&[
				T(Tt::FunctionName),
				T(Tt::LeftParenthesis),
				R(Self::VariablesList),
				T(Tt::RightParenthesis),
				R(Self::CodeBlock),
			]],
			Self::VariablesList => &[&[T(Tt::Variable), R(Self::VariablesListExpansion)], EMPTY],
			Self::VariablesListExpansion => &[&[T(Tt::Comma), T(Tt::Variable), R(Self::VariablesListExpansion)], EMPTY],
			Self::CodeBlock => &[&[T(Tt::LeftBrace), R(Self::StatementList), T(Tt::RightBrace)]],
			Self::StatementList => &[&[R(Self::Statement), R(Self::StatementList)], EMPTY],
			Self::Statement => &[
				&[R(Self::VariableAssignment), T(Tt::Semicolon)],
				&[R(Self::FunctionCall), T(Tt::Semicolon)],
				&[T(Tt::KeywordWhile), R(Self::ConditionalEvaluator), R(Self::CodeBlock)],
				&[T(Tt::KeywordIf), R(Self::ConditionalEvaluator), R(Self::CodeBlock), R(Self::ElseStatement)],
				&[T(Tt::KeywordReturn), R(Self::RValue), T(Tt::Semicolon)],
				&[T(Tt::KeywordBreak), T(Tt::Semicolon)],
			],
			Self::VariableAssignment => &[
				&[T(Tt::KeywordLocal), T(Tt::Variable), T(Tt::Equal), R(Self::RValue)],
				&[T(Tt::Variable), T(Tt::Equal), R(Self::RValue)],
			],
			Self::FunctionCall => &[
				&[T(Tt::FunctionName), T(Tt::LeftParenthesis), R(Self::RValueList), T(Tt::RightParenthesis)],
				&[T(Tt::Builtin), T(Tt::LeftParenthesis), R(Self::RValueList), T(Tt::RightParenthesis)],
			],
			Self::ConditionalEvaluator => &[&[T(Tt::LeftBracket), R(Self::RValue), T(Tt::RightBracket)]],
			Self::ElseStatement => &[
				&[T(Tt::KeywordElse), R(Self::CodeBlock)],
				&[T(Tt::KeywordElif), R(Self::ConditionalEvaluator), R(Self::CodeBlock), R(Self::ElseStatement)],
				EMPTY,
			],
			Self::RValue => &[&[T(Tt::String)], &[T(Tt::Variable)], &[R(Self::FunctionCall)]],
			Self::RValueList => &[&[R(Self::RValue), R(Self::RValueListExpansion)], EMPTY],
			Self::RValueListExpansion => &[&[T(Tt::Comma), R(Self::RValue), R(Self::RValueListExpansion)], EMPTY],
		}
	}

	/// A human-readable description of what this rule looks like in source code, used in parse errors.
	pub fn description(self) -> &'static str {
		match self {
			Self::Module => "a series of function definitions, like: `SayHello() { PRINT(\"hello\"); }`",
			Self::FunctionDefinition => "a function definition, like: `SayHello() { PRINT(\"hello\"); }`",
			Self::VariablesList | Self::VariablesListExpansion => "a parameter list, like: `a, b, c`",
			Self::CodeBlock => "a code block, like: `{ RETURN \"foobar\"; }`",
			Self::StatementList => "a list of statements, like: `foo = \"bar\"; baz = \"bing\";`",
			Self::Statement => "a statement, like: `foo = \"bar\";`",
			Self::VariableAssignment => "a variable assignment, like: `foo = \"bar\"`",
			Self::FunctionCall => "a function or builtin call, like: `PRINT(\"foobar\")`",
			Self::ConditionalEvaluator => "a bracketed condition, like: `[\"TRUE\"]`",
			Self::ElseStatement => "an else branch, like: `ELIF [\"TRUE\"] {}`",
			Self::RValue => "a string, a variable, or a function call, like: `\"TRUE\"`",
			Self::RValueList | Self::RValueListExpansion => "an argument list, like: `\"TRUE\", EQUAL(\"1\", \"2\"), foo`",
		}
	}

	/// Picks the unique expansion of this rule whose first item accepts the given token kind. The ε alternative is chosen only when no
	/// non-empty alternative accepts, and `None` means the rule cannot start with this token at all — a parse error at the call site.
	///
	/// Two accepting alternatives would make predictive parsing impossible; that is a bug in the tables above, not in user code, so it
	/// is enforced with an assertion (and exhaustively, for every rule/token pair, in the tests below).
	pub fn select_expansion(self, token_type: TokenType) -> Option<&'static [GrammarItem]> {
		let mut allows_empty = false;
		let mut selected = None;
		for expansion in self.expansions() {
			let Some(first) = expansion.first() else {
				allows_empty = true;
				continue;
			};
			if first.accepts(token_type) {
				assert!(
					selected.is_none(),
					"ambiguous grammar: two expansions of {self:?} accept a leading {token_type:?}",
				);
				selected = Some(*expansion);
			}
		}
		selected.or_else(|| allows_empty.then_some(EMPTY))
	}
}
