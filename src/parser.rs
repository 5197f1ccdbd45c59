use std::collections::VecDeque;

use colored::Colorize as _;

use crate::{
	grammar::{GrammarItem, Rule},
	lexer::{self, Token, TokenType},
};

/// One node of the concrete syntax tree: either a consumed token or an expanded rule.
#[derive(Debug, Clone)]
pub enum CstNode {
	/// A terminal, carrying the matched text and line number.
	Token(Token),
	/// A nonterminal with its children.
	Rule(RuleNode),
}

impl CstNode {
	/// The token held by this node. The parser only ever builds children matching the grammar tables, so lowering code that has matched
	/// on a rule may use this on positions the grammar says are terminals.
	pub fn token(&self) -> &Token {
		match self {
			Self::Token(token) => token,
			Self::Rule(node) => unreachable!("expected a token, found a {:?} node", node.rule),
		}
	}

	/// The rule node held by this node. See [`Self::token`] for why this is infallible after parsing.
	pub fn rule(&self) -> &RuleNode {
		match self {
			Self::Rule(node) => node,
			Self::Token(token) => unreachable!("expected a rule, found the token {:?}", token.token_type),
		}
	}
}

/// A nonterminal node of the concrete syntax tree. Its children follow exactly one of the rule's expansions, in order.
#[derive(Debug, Clone)]
pub struct RuleNode {
	/// The nonterminal this node is an instance of.
	pub rule: Rule,
	/// The node's children: one entry per item of the selected expansion. Empty when the ε alternative was selected.
	pub children: Vec<CstNode>,
}

/// The predictive parser. This is the grammar's only driver: it peeks one token, asks the current rule for the unique expansion that
/// accepts it, and then consumes the expansion's items left to right, recursing into nonterminals. There is no production-specific
/// parsing code anywhere in the crate.
struct Parser<'src> {
	tokens: VecDeque<Token>,
	source: &'src str,
}

impl Parser<'_> {
	fn parse_rule(&mut self, rule: Rule) -> anyhow::Result<RuleNode> {
		let expansion = match self.tokens.front() {
			Some(next) => rule.select_expansion(next.token_type).ok_or_else(|| self.mismatch_error(rule, next))?,
			None => anyhow::bail!("Parse error: expected {} but reached the end of the input", rule.description()),
		};

		let mut children = Vec::with_capacity(expansion.len());
		for item in expansion {
			match item {
				GrammarItem::Token(token_type) => children.push(CstNode::Token(self.expect(*token_type)?)),
				GrammarItem::Rule(inner) => children.push(CstNode::Rule(self.parse_rule(*inner)?)),
			}
		}
		Ok(RuleNode { rule, children })
	}

	/// Consumes the next token, which must be of the given type. The grammar probe already vetted the *first* token of an expansion, so
	/// a failure here means a later item didn't follow — a genuine syntax error in the input.
	fn expect(&mut self, token_type: TokenType) -> anyhow::Result<Token> {
		let Some(token) = self.tokens.pop_front() else {
			anyhow::bail!("Parse error: expected {} but reached the end of the input", format!("{token_type}").bold().cyan());
		};
		if token.token_type != token_type {
			if token.token_type == TokenType::EndOfFile {
				anyhow::bail!("Parse error: expected {} but found the end of the file", format!("{token_type}").bold().cyan());
			}
			anyhow::bail!(
				"Parse error on line {}: expected {} but found {} ({}):\n\t{}",
				token.line,
				format!("{token_type}").bold().cyan(),
				format!("{}", token.token_type).bold().cyan(),
				token.value.bold(),
				self.source_line(token.line),
			);
		}
		Ok(token)
	}

	fn mismatch_error(&self, rule: Rule, token: &Token) -> anyhow::Error {
		let found = if token.token_type == TokenType::EndOfFile {
			"the end of the file".to_owned()
		} else {
			format!("{}", token.value.bold())
		};
		anyhow::anyhow!(
			"Parse error on line {}: expected {} but found {found}:\n\t{}",
			token.line,
			rule.description(),
			self.source_line(token.line),
		)
	}

	fn source_line(&self, line: usize) -> &str {
		self.source.lines().nth(line - 1).unwrap_or_default()
	}
}

/// Parses a token stream into a concrete syntax tree rooted at [`Rule::Module`].
///
/// # Parameters
/// - `tokens` - The scanned token stream, ending in an `EndOfFile` token.
/// - `source` - The original source code, used to echo the offending line in errors.
///
/// # Errors
/// A parse error naming the expected grammar item, the offending token, its line number, and the source line.
pub fn parse(tokens: VecDeque<Token>, source: &str) -> anyhow::Result<RuleNode> {
	let mut parser = Parser { tokens, source };
	let module = parser.parse_rule(Rule::Module)?;
	debug_assert!(parser.tokens.is_empty(), "the Module rule consumes every token up to and including EndOfFile");
	Ok(module)
}

/// Scans and parses a string of PoiBoi source code into a `Module` tree. This is the whole front end; both back ends start from the
/// tree this returns.
pub fn parse_source(source: &str) -> anyhow::Result<RuleNode> {
	parse(lexer::tokenize(source)?, source)
}

#[cfg(test)]
mod tests {
	use super::parse_source;
	use crate::grammar::Rule;

	#[test]
	fn empty_source_is_a_valid_module() {
		let module = parse_source("").unwrap();
		assert_eq!(module.rule, Rule::Module);
		assert_eq!(module.children.len(), 1);
	}

	#[test]
	fn hello_world_parses_into_a_function_definition() {
		let module = parse_source("Main() { hello = \"Hello World!\"; PRINT(hello); }").unwrap();
		let definition = module.children[0].rule();
		assert_eq!(definition.rule, Rule::FunctionDefinition);
		assert_eq!(definition.children[0].token().value, "Main");

		// The trailing Module child terminates with EndOfFile.
		let rest = module.children[1].rule();
		assert_eq!(rest.rule, Rule::Module);
		assert_eq!(rest.children.len(), 1);
	}

	#[test]
	fn nested_control_flow_parses() {
		parse_source(
			"Main() {
				WHILE [\"TRUE\"] {
					IF [EQUAL(a, \"x\")] {
						BREAK;
					} ELIF [\"TRUE\"] {
						RETURN \"done\";
					} ELSE {
						a = CONCAT(a, \"x\");
					}
				}
			}",
		)
		.unwrap();
	}

	#[test]
	fn missing_semicolon_is_reported_with_its_line() {
		let error = parse_source("Main() {\n\tfoo = \"bar\"\n}").unwrap_err();
		assert!(error.to_string().contains("line 3"), "{error}");
	}

	#[test]
	fn statement_in_module_position_is_rejected() {
		let error = parse_source("foo = \"bar\";").unwrap_err();
		assert!(error.to_string().contains("function definition"), "{error}");
	}

	#[test]
	fn unclosed_block_is_reported() {
		let error = parse_source("Main() { PRINT(\"hi\");").unwrap_err();
		assert!(error.to_string().contains("end of the file") || error.to_string().contains("statement"), "{error}");
	}
}
