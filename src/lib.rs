//! # PoiBoi
//!
//! A tiny, string-only imperative toy language with a dual back end: a tree-walking interpreter and a source-to-source transpiler
//! that emits a self-contained C++17 translation unit linking against the bundled `PBString` runtime.
//!
//! The pipeline, leaves first: [`lexer`] scans source text into tokens, [`grammar`] publishes the nonterminals and their expansions
//! as static data, [`parser`] is a single generic predictive driver over those tables, [`evaluator`] folds the concrete tree into
//! typed nodes that both back ends consume through the `Evaluate` and `TranspileToCpp` traits, and [`interpreter`] / [`compiler`]
//! are the two back-end drivers. Both must agree exactly on scoping, control flow, and builtin semantics; the builtin catalog in
//! [`builtins`] is the single source of truth for names and arities.

/// The scanner module, which turns source code into a stream of tokens.
pub mod lexer;

/// The grammar module: every nonterminal and its alternative expansions, published as static data.
pub mod grammar;

/// The parser module, which drives the grammar tables over a token stream to build a concrete syntax tree.
pub mod parser;

/// The evaluator module: the typed AST, lowering from the concrete tree, and the two back-end traits.
pub mod evaluator;

/// The scope module, which manages the frame chain of local variables.
pub mod scope;

/// The function module: the function table and calling/emitting whole functions.
pub mod function;

/// The builtins module: the closed catalog of primitive operations shared by both back ends.
pub mod builtins;

/// The io module: where `PRINT` output goes.
pub mod io;

/// The interpreter back end, which executes the AST directly.
pub mod interpreter;

/// The compiler back end, which emits a single C++ translation unit reproducing interpreter semantics.
pub mod compiler;

/// The toolchain module, which locates and drives a C++ compiler over emitted code.
pub mod toolchain;

/// The CLI module: the argument structs and drivers behind the two binaries.
pub mod cli;
