use std::collections::VecDeque;

// Bring the `Casing` trait into scope, which allows us to use `.to_case()` on strings. This is used to convert `TokenType` enum variant names into Title Case,
// which is useful for outputting human-readable errors. We assign this to `as _` to indicate clearly that the trait is not referenced directly and only used
// to bring its methods into scope to be called.
use convert_case::Casing as _;
// Bring the `IntoEnumIterator` trait into scope, which allows us to use `::iter()` on enums that `#[derive(strum_macros::EnumIter)]`. Specifically here, this is
// used on `TokenType` to iterate over the values of the enum to test which one matches a specific piece of PoiBoi code.
use strum::IntoEnumIterator as _;

/// A type of token in PoiBoi source code. The first step of both back ends is scanning, which splits a raw string of source code into tokens that each have a
/// "type" representing the kind of token and a "value" holding the matched text. Tokens themselves are stored in the separate `Token` struct, which has a
/// `token_type: TokenType` field; keeping the type as a fieldless enum lets us iterate over all kinds with `strum`.
///
/// # Conventions
///
/// Token types are named by what the token itself appears as, not by its usage in the language: the `{` token is `LeftBrace`, not "block opening".
///
/// **The declaration order of these variants is the scanner's priority order.** The scanner tries each kind in order and takes the first match, so
/// overlapping lexemes are disambiguated purely by position in this enum: keywords must come before `Builtin` (or `RETURN` would scan as a builtin name),
/// and `Builtin` must come before `FunctionName`. Please be careful moving variants around.
#[derive(strum_macros::EnumIter, PartialEq, Eq, Debug, Clone, Copy)]
pub enum TokenType {
	/// The left brace token type, which opens the code block of a function definition, `IF`/`ELIF`/`ELSE` branch, or `WHILE` body.
	LeftBrace,

	/// The right brace token type, which closes a code block.
	RightBrace,

	/// The semicolon token type. PoiBoi is not whitespace-sensitive; every simple statement is terminated by one of these.
	Semicolon,

	/// The left parenthesis token type, which opens a parameter list (in a definition) or an argument list (in a call).
	LeftParenthesis,

	/// The right parenthesis token type, which closes a parameter or argument list.
	RightParenthesis,

	/// The comma token type, which separates parameters and arguments.
	Comma,

	/// The left bracket token type, which opens the condition of an `IF`, `ELIF`, or `WHILE`.
	LeftBracket,

	/// The right bracket token type, which closes a condition.
	RightBracket,

	/// The equal token type, used for variable assignment. PoiBoi has no comparison operator tokens; comparison is the `EQUAL` builtin.
	Equal,

	/// The `LOCAL` keyword token type, which prefixes an assignment to bind the name in the innermost frame instead of walking outward.
	///
	/// Keywords are matched by prefix with no word-boundary check, exactly like the structural tokens: `LOCALE` scans as `LOCAL` followed by a
	/// variable `e`. That quirk is part of the language surface.
	///
	/// Like all keywords, this variant must be declared before `Builtin`; an all-uppercase keyword would otherwise be scanned as a builtin name.
	KeywordLocal,

	/// The `WHILE` keyword token type, which starts a loop statement.
	///
	/// Like all keywords, this variant must be declared before `Builtin`.
	KeywordWhile,

	/// The `IF` keyword token type, which starts a conditional statement.
	///
	/// Like all keywords, this variant must be declared before `Builtin`.
	KeywordIf,

	/// The `ELSE` keyword token type, which introduces the fallback branch of a conditional.
	///
	/// Like all keywords, this variant must be declared before `Builtin`.
	KeywordElse,

	/// The `ELIF` keyword token type, which chains another condition onto a conditional.
	///
	/// Like all keywords, this variant must be declared before `Builtin`.
	KeywordElif,

	/// The `RETURN` keyword token type, which exits the enclosing function with a value.
	///
	/// Like all keywords, this variant must be declared before `Builtin`.
	KeywordReturn,

	/// The `BREAK` keyword token type, which exits the nearest enclosing `WHILE` loop.
	///
	/// Like all keywords, this variant must be declared before `Builtin`.
	KeywordBreak,

	/// The string token type: one or more adjacent double-quoted runs, scanned as a single token. A quote preceded by a backslash does not terminate
	/// a run. The quotes (and any escapes) are kept verbatim in the token value; the interpreter decodes them and the transpiler re-emits them as
	/// written, letting the C++ compiler apply the same escapes.
	String,

	/// The variable token type: a leading lowercase letter followed by letters, like `foo` or `fooBar`.
	Variable,

	/// The builtin token type: two or more consecutive uppercase letters, like `PRINT`. Keywords take precedence because they are declared earlier.
	Builtin,

	/// The function name token type: a leading uppercase letter with at least one lowercase letter somewhere after it, like `Main` or `DoThing`.
	/// This must be declared after `Builtin`: a name like `ABc` scans as the builtin `AB` followed by the variable `c`.
	FunctionName,

	/// The comment token type: `#...#` on a single line, matched lazily to the first closing `#`. Comments are scanned but never emitted to the
	/// token stream.
	Comment,

	/// The whitespace token type: a run of spacing characters. Scanned but never emitted; newlines in it still advance the line counter.
	Whitespace,

	/// The end-of-file token type. This has no recognizer; the scanner appends exactly one of these after consuming all input, and the grammar's
	/// `Module` rule terminates on it.
	EndOfFile,
}

impl TokenType {
	/// Returns the regular expression pattern that recognizes this token type at the start of a string, or `None` for `EndOfFile`, which is
	/// synthesized rather than matched. The returned value is a lazily-evaluated static, so there is no cost to calling this repeatedly.
	fn pattern(self) -> Option<&'static regex_macro::Regex> {
		Some(match self {
			// Single-character structural tokens
			Self::LeftBrace => regex_macro::regex!(r"^\{"),
			Self::RightBrace => regex_macro::regex!(r"^\}"),
			Self::Semicolon => regex_macro::regex!("^;"),
			Self::LeftParenthesis => regex_macro::regex!(r"^\("),
			Self::RightParenthesis => regex_macro::regex!(r"^\)"),
			Self::Comma => regex_macro::regex!("^,"),
			Self::LeftBracket => regex_macro::regex!(r"^\["),
			Self::RightBracket => regex_macro::regex!(r"^\]"),
			Self::Equal => regex_macro::regex!("^="),

			// Keywords, matched by prefix
			Self::KeywordLocal => regex_macro::regex!("^LOCAL"),
			Self::KeywordWhile => regex_macro::regex!("^WHILE"),
			Self::KeywordIf => regex_macro::regex!("^IF"),
			Self::KeywordElse => regex_macro::regex!("^ELSE"),
			Self::KeywordElif => regex_macro::regex!("^ELIF"),
			Self::KeywordReturn => regex_macro::regex!("^RETURN"),
			Self::KeywordBreak => regex_macro::regex!("^BREAK"),

			// Lexemes
			Self::String => regex_macro::regex!(r#"^(?:"(?:\\"|[^"])*")+"#),
			Self::Variable => regex_macro::regex!("^[a-z][a-zA-Z]*"),
			Self::Builtin => regex_macro::regex!("^[A-Z][A-Z]+"),
			Self::FunctionName => regex_macro::regex!("^[A-Z][a-zA-Z]*[a-z]+[a-zA-Z]*"),

			// Ignored tokens
			Self::Comment => regex_macro::regex!("^#.*?#"),
			Self::Whitespace => regex_macro::regex!(r"^\s+"),

			Self::EndOfFile => return None,
		})
	}

	/// Returns the text this token type matches at the start of `code`, or `None` if it doesn't match there. Even if this token type occurs later
	/// in `code`, this returns `None`; the scanner only ever consumes from the front.
	#[must_use]
	pub fn get_match(self, code: &str) -> Option<&str> {
		self.pattern().and_then(|pattern| pattern.find(code)).map(|regex_match| regex_match.as_str())
	}

	/// Finds the first token type (in declaration order, which is priority order) that matches the start of the given code, along with the
	/// matched text.
	fn find_match(code: &str) -> Option<(Self, &str)> {
		Self::iter().find_map(|token_type| token_type.get_match(code).map(|matched| (token_type, matched)))
	}
}

impl std::fmt::Display for TokenType {
	fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(formatter, "{}", format!("{self:?}").to_case(convert_case::Case::Title))
	}
}

/// A token in source code.
#[derive(Debug, Clone)]
pub struct Token {
	/// The type of the token.
	pub token_type: TokenType,
	/// The matched text, exactly as it appears in the source. Strings retain their quotes and escapes.
	pub value: String,
	/// The 1-based line the token starts on. A multi-line token carries the line it starts on.
	pub line: usize,
}

/// Scans a string of PoiBoi source code into a sequence of tokens ending in an `EndOfFile` token. Whitespace and comments are consumed but never
/// emitted. This is the first step of both the interpreter and the compiler; the returned queue is handed to the parser.
///
/// # Errors
/// If a position is reached where no token type matches, a lex error is returned naming the line number and echoing the offending source line.
pub fn tokenize(code: &str) -> anyhow::Result<VecDeque<Token>> {
	let mut tokens = VecDeque::new();
	let mut line = 1;
	let mut rest = code;

	while !rest.is_empty() {
		let Some((token_type, value)) = TokenType::find_match(rest) else {
			anyhow::bail!("Lex error: no token matches on line {line}:\n\t{}", code.lines().nth(line - 1).unwrap_or_default());
		};

		if token_type != TokenType::Whitespace && token_type != TokenType::Comment {
			tokens.push_back(Token {
				token_type,
				value: value.to_owned(),
				line,
			});
		}

		line += value.matches('\n').count();
		rest = &rest[value.len()..];
	}

	tokens.push_back(Token {
		token_type: TokenType::EndOfFile,
		value: String::new(),
		line,
	});
	Ok(tokens)
}

#[cfg(test)]
mod tests {
	use super::{tokenize, TokenType};

	fn kinds(code: &str) -> Vec<TokenType> {
		tokenize(code).unwrap().into_iter().map(|token| token.token_type).collect()
	}

	#[test]
	fn hello_world_token_sequence() {
		use TokenType::{EndOfFile, Equal, FunctionName, LeftBrace, LeftParenthesis, RightBrace, RightParenthesis, Semicolon, String, Variable};
		assert_eq!(
			kinds("Main(){ hello=\"Hello World!\"; }"),
			vec![
				FunctionName,
				LeftParenthesis,
				RightParenthesis,
				LeftBrace,
				Variable,
				Equal,
				String,
				Semicolon,
				RightBrace,
				EndOfFile,
			]
		);
	}

	#[test]
	fn keywords_win_over_builtins() {
		assert_eq!(
			kinds("RETURN BREAK;"),
			vec![TokenType::KeywordReturn, TokenType::KeywordBreak, TokenType::Semicolon, TokenType::EndOfFile]
		);
		// Prefix matching: `IFFY` is the keyword `IF` followed by the builtin `FY`.
		assert_eq!(kinds("IFFY"), vec![TokenType::KeywordIf, TokenType::Builtin, TokenType::EndOfFile]);
	}

	#[test]
	fn builtin_wins_over_function_name() {
		// `ABc` has two leading uppercase letters, so the builtin `AB` matches first and `c` is left as a variable.
		assert_eq!(kinds("ABc"), vec![TokenType::Builtin, TokenType::Variable, TokenType::EndOfFile]);
		assert_eq!(kinds("Ab"), vec![TokenType::FunctionName, TokenType::EndOfFile]);
	}

	#[test]
	fn comments_and_whitespace_are_dropped() {
		assert_eq!(
			kinds("foo # this is ignored # = \"bar\";"),
			vec![TokenType::Variable, TokenType::Equal, TokenType::String, TokenType::Semicolon, TokenType::EndOfFile]
		);
	}

	#[test]
	fn comment_is_lazy() {
		// The comment closes at the first `#`, leaving the rest to scan normally.
		let tokens = tokenize("#a# foo #b#").unwrap();
		assert_eq!(tokens[0].token_type, TokenType::Variable);
		assert_eq!(tokens[0].value, "foo");
	}

	#[test]
	fn adjacent_string_runs_are_one_token() {
		let tokens = tokenize("\"foo\"\"bar\"").unwrap();
		assert_eq!(tokens[0].token_type, TokenType::String);
		assert_eq!(tokens[0].value, "\"foo\"\"bar\"");
		assert_eq!(tokens[1].token_type, TokenType::EndOfFile);
	}

	#[test]
	fn escaped_quote_does_not_terminate() {
		let tokens = tokenize(r#""say \"hi\"""#).unwrap();
		assert_eq!(tokens[0].token_type, TokenType::String);
		assert_eq!(tokens[0].value, r#""say \"hi\"""#);
	}

	#[test]
	fn line_numbers_advance_through_discarded_tokens() {
		let tokens = tokenize("Main()\n{\n# note #\nfoo = \"bar\";\n}").unwrap();
		let foo = tokens.iter().find(|token| token.value == "foo").unwrap();
		assert_eq!(foo.line, 4);
		let close = tokens.iter().find(|token| token.token_type == TokenType::RightBrace).unwrap();
		assert_eq!(close.line, 5);
	}

	#[test]
	fn end_of_file_is_always_appended() {
		let tokens = tokenize("").unwrap();
		assert_eq!(tokens.len(), 1);
		assert_eq!(tokens[0].token_type, TokenType::EndOfFile);
	}

	#[test]
	fn unrecognized_character_is_a_lex_error() {
		let error = tokenize("Main() {\n  @;\n}").unwrap_err();
		assert!(error.to_string().contains("line 2"), "{error}");
	}
}
