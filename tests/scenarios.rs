//! End-to-end interpreter scenarios: each program is run in-process with a capturing print sink and its full stdout is compared
//! against the expected transcript.

use pretty_assertions::assert_eq;
use unindent::unindent;

use poiboi::interpreter::interpret_str;

/// The demo programs double as the test corpus; embedding them keeps the tests independent of the working directory.
const HELLO: &str = include_str!("../demos/hello.poiboi");
const SIMPLEBRANCHING: &str = include_str!("../demos/simplebranching.poiboi");
const SIMPLELOOPS: &str = include_str!("../demos/simpleloops.poiboi");
const SIMPLEFUNCTIONS: &str = include_str!("../demos/simplefunctions.poiboi");
const SIMPLEVARS: &str = include_str!("../demos/simplevars.poiboi");
const BREAKS: &str = include_str!("../demos/breaks.poiboi");

fn run(source: &str) -> String {
	let mut out = String::new();
	interpret_str(source, None, &mut out).unwrap();
	out
}

#[test]
fn hello_world() {
	assert_eq!(run(HELLO), "Hello World!\n");
}

#[test]
fn branching_takes_exactly_one_arm_per_chain() {
	assert_eq!(run(SIMPLEBRANCHING), "aba equals ABA\nbaba = BABA: TRUE\nTRUEFALSE\n");
}

#[test]
fn loop_with_mutation_terminates() {
	assert_eq!(run(SIMPLELOOPS), "foo\nbar\nblaz\ndone.\n");
}

#[test]
fn nested_breaks_exit_exactly_one_loop() {
	let output = run(BREAKS);
	assert_eq!(output, "YO\nONE\nTWO\nHEYO\nSUP\nBalderdash\nSUP\n");
	assert!(!output.contains("HOWDY"));
	assert!(!output.contains("UNREACHABLE"));
}

#[test]
fn function_returns_and_fallthrough() {
	let expected = "Hello\nDidn't return early!\n\nfoo\nDidn't return early!\n\nHello\nHello\nDidn't return early!\n\nDidn't return early!\n\nDidn't return early!\n\n";
	assert_eq!(run(SIMPLEFUNCTIONS), expected);
}

#[test]
fn scope_semantics_globals_locals_and_write_through() {
	// In order: Foo sees the unset global (blank line), then the two global stores; Main's LOCAL never leaks into Foo;
	// Main's plain `a = "bing"` updates its local, not the global; Bar's inner-block `LOCAL a` writes through to Bar's
	// own binding, so the post-block print still shows the ketchup; and `b` has died with that block by the final print
	// (blank line).
	let expected = "\nbar\nbarbar\nbarbar\nbaz\nbarbar\nHeinz Tomato Ketchup.\nWorchestershire Sauce.\nHeinz Tomato Ketchup.\n\n";
	assert_eq!(run(SIMPLEVARS), expected);
}

#[test]
fn truthiness_only_the_exact_string_true_enters_the_then_branch() {
	let program = r#"Main(x) { IF [x] { PRINT("then"); } ELSE { PRINT("else"); } }"#;
	for falsy in ["true", "1", "", "FALSE", "TRUE "] {
		let mut out = String::new();
		interpret_str(program, Some(falsy), &mut out).unwrap();
		assert_eq!(out, "else\n", "{falsy:?} should not be truthy");
	}
	let mut out = String::new();
	interpret_str(program, Some("TRUE"), &mut out).unwrap();
	assert_eq!(out, "then\n");
}

#[test]
fn and_and_or_evaluate_both_arguments() {
	// Both operands append to a global before returning FALSE, so the log observes every evaluation even though the results
	// alone could have been produced lazily.
	let program = unindent(
		r#"
		Mark(tag) {
			log = CONCAT(log, tag);
			RETURN "FALSE";
		}

		Main() {
			both = AND(Mark("a"), Mark("b"));
			either = OR(Mark("c"), Mark("d"));
			PRINT(log);
		}
		"#,
	);
	assert_eq!(run(&program), "abcd\n");
}

#[test]
fn substring_clamping_through_the_language() {
	let program = unindent(
		r#"
		Main() {
			PRINT(SUBSTRING("abcdef", "2", "100"));
			PRINT(SUBSTRING("abc", "-5", "2"));
			PRINT(SUBSTRING("abc", "x", "y"));
			PRINT(STRLEN(SUBSTRING("abc", "2", "1")));
		}
		"#,
	);
	assert_eq!(run(&program), "cdef\nab\nabc\n0\n");
}

#[test]
fn undefined_variable_reads_yield_the_empty_string() {
	let program = r#"Main() { PRINT(CONCAT("[", CONCAT(neverAssigned, "]"))); }"#;
	assert_eq!(run(program), "[]\n");
}

#[test]
fn break_inside_an_if_still_exits_the_loop() {
	let program = unindent(
		r#"
		Main() {
			WHILE ["TRUE"] {
				PRINT("once");
				IF ["TRUE"] {
					BREAK;
				}
				PRINT("never");
			}
			PRINT("out");
		}
		"#,
	);
	assert_eq!(run(&program), "once\nout\n");
}

#[test]
fn break_outside_a_loop_is_a_control_flow_error() {
	let error = interpret_str("Main() { BREAK; }", None, &mut String::new()).unwrap_err();
	assert!(error.to_string().contains("BREAK"), "{error}");
}

#[test]
fn break_does_not_leak_into_a_called_function() {
	// Foo's own loop contains the BREAK, so calling it from inside Main's loop is fine; but a BREAK in a function called
	// from a loop must not see that loop.
	let program = unindent(
		r#"
		Breaker() {
			BREAK;
		}

		Main() {
			WHILE ["TRUE"] {
				Breaker();
			}
		}
		"#,
	);
	let error = interpret_str(&program, None, &mut String::new()).unwrap_err();
	assert!(error.to_string().contains("BREAK"), "{error}");
}

#[test]
fn arguments_evaluate_left_to_right_before_the_callee() {
	let program = unindent(
		r#"
		Note(tag) {
			log = CONCAT(log, tag);
			RETURN tag;
		}

		Join(first, second) {
			RETURN CONCAT(first, second);
		}

		Main() {
			joined = Join(Note("1"), Note("2"));
			PRINT(log);
			PRINT(joined);
		}
		"#,
	);
	assert_eq!(run(&program), "12\n12\n");
}

#[test]
fn functions_across_modules_are_unioned() {
	let helpers = "Greet(name) { RETURN CONCAT(\"hi \", name); }";
	let main = "Main() { PRINT(Greet(\"you\")); }";
	let modules = [poiboi::parser::parse_source(helpers).unwrap(), poiboi::parser::parse_source(main).unwrap()];
	let mut out = String::new();
	poiboi::interpreter::interpret_modules(&modules, None, &mut out).unwrap();
	assert_eq!(out, "hi you\n");
}
