use crate::io::PrintWriter;

/// The string encoding truth. A condition holds iff its value is byte-equal to this; everything else, including `"true"` and `""`, is
/// false.
pub const TRUE: &str = "TRUE";
/// The canonical false value produced by the logical builtins. Note that *any* non-`TRUE` string is already false; this is just what
/// the builtins return.
pub const FALSE: &str = "FALSE";

/// Whether a condition value holds.
#[must_use]
pub fn is_true(value: &str) -> bool {
	value == TRUE
}

fn bool_string(value: bool) -> String {
	if value { TRUE } else { FALSE }.to_owned()
}

/// A builtin function of the language. Builtins are primitives that cannot be expressed in PoiBoi code itself; they have a fixed arity
/// and two behaviors that must agree: `evaluate` runs the operation in the interpreter, and `cpp_name` names the C++ runtime function
/// the transpiler emits a call to. Keeping both in one struct makes this map the single source of truth for names and arities across
/// the two back ends.
pub struct Builtin {
	/// The exact number of arguments the builtin takes. Checked by both back ends before dispatch.
	pub arity: usize,
	/// The function in `runtime/poiboi_string.cc` that implements the same semantics.
	pub cpp_name: &'static str,
	/// Runs the builtin on already-evaluated argument strings. Infallible: every builtin is total once its arity is satisfied.
	pub evaluate: fn(&[String], &mut dyn PrintWriter) -> String,
}

/// The closed builtin catalog, addressed by the all-uppercase name as written in source code.
pub static BUILTINS: phf::Map<&'static str, Builtin> = phf::phf_map! {
	"EQUAL" => Builtin {
		arity: 2,
		cpp_name: "Builtin_Equal",
		evaluate: |arguments, _out| bool_string(arguments[0] == arguments[1]),
	},
	"PRINT" => Builtin {
		arity: 1,
		cpp_name: "Builtin_Print",
		evaluate: |arguments, out| {
			out.print_line(&arguments[0]);
			arguments[0].clone()
		},
	},
	"CONCAT" => Builtin {
		arity: 2,
		cpp_name: "Builtin_Concat",
		evaluate: |arguments, _out| format!("{}{}", arguments[0], arguments[1]),
	},
	"NOT" => Builtin {
		arity: 1,
		cpp_name: "Builtin_Not",
		evaluate: |arguments, _out| bool_string(!is_true(&arguments[0])),
	},
	"AND" => Builtin {
		arity: 2,
		cpp_name: "Builtin_And",
		// Both arguments were already evaluated by the caller; there is deliberately no short circuit in this language.
		evaluate: |arguments, _out| bool_string(is_true(&arguments[0]) && is_true(&arguments[1])),
	},
	"OR" => Builtin {
		arity: 2,
		cpp_name: "Builtin_Or",
		evaluate: |arguments, _out| bool_string(is_true(&arguments[0]) || is_true(&arguments[1])),
	},
	"STRLEN" => Builtin {
		arity: 1,
		cpp_name: "Builtin_Strlen",
		evaluate: |arguments, _out| arguments[0].len().to_string(),
	},
	"SUBSTRING" => Builtin {
		arity: 3,
		cpp_name: "Builtin_Substring",
		evaluate: |arguments, _out| substring(arguments),
	},
};

/// `s[start:end]` over bytes, clamped rather than erroring: a non-integer start means 0, a non-integer end means the length, a negative
/// start is raised to 0, an end past the length is lowered to it, and a start at or past the end yields the empty string. "Integer"
/// means an optional sign followed by digits, consuming the whole argument and fitting in an `i64` — the C++ runtime applies the
/// identical rule so compiled programs clamp the same way.
fn substring(arguments: &[String]) -> String {
	let text = &arguments[0];
	let length = text.len() as i64;
	let start = arguments[1].parse::<i64>().unwrap_or(0).max(0);
	let end = arguments[2].parse::<i64>().unwrap_or(length).min(length);
	if start >= end {
		return String::new();
	}
	String::from_utf8_lossy(&text.as_bytes()[start as usize..end as usize]).into_owned()
}

fn arity_checked(name: &str, argument_count: usize) -> anyhow::Result<&'static Builtin> {
	let Some(builtin) = BUILTINS.get(name) else {
		anyhow::bail!("No builtin named {name}");
	};
	if argument_count != builtin.arity {
		anyhow::bail!("Wrong number of arguments for {name}; expected {}, got {argument_count}", builtin.arity);
	}
	Ok(builtin)
}

/// Runs the named builtin on already-evaluated arguments.
///
/// # Errors
/// An evaluation error for an unknown builtin name or an arity mismatch.
pub fn evaluate_builtin(name: &str, arguments: &[String], out: &mut dyn PrintWriter) -> anyhow::Result<String> {
	let builtin = arity_checked(name, arguments.len())?;
	Ok((builtin.evaluate)(arguments, out))
}

/// Emits the C++ call expression for the named builtin over already-emitted argument expressions.
///
/// # Errors
/// The same unknown-name and arity errors as [`evaluate_builtin`], surfaced at compile time.
pub fn transpile_builtin(name: &str, arguments: &[String]) -> anyhow::Result<String> {
	let builtin = arity_checked(name, arguments.len())?;
	Ok(format!("{}({})", builtin.cpp_name, arguments.join(", ")))
}

#[cfg(test)]
mod tests {
	use super::{evaluate_builtin, transpile_builtin};

	fn run(name: &str, arguments: &[&str]) -> String {
		let arguments: Vec<String> = arguments.iter().map(|&argument| argument.to_owned()).collect();
		let mut out = String::new();
		evaluate_builtin(name, &arguments, &mut out).unwrap()
	}

	#[test]
	fn logical_builtins() {
		assert_eq!(run("EQUAL", &["aba", "aba"]), "TRUE");
		assert_eq!(run("EQUAL", &["aba", "ABA"]), "FALSE");
		assert_eq!(run("NOT", &["TRUE"]), "FALSE");
		assert_eq!(run("NOT", &["anything else"]), "TRUE");
		assert_eq!(run("AND", &["TRUE", "TRUE"]), "TRUE");
		assert_eq!(run("AND", &["TRUE", "true"]), "FALSE");
		assert_eq!(run("OR", &["FALSE", "TRUE"]), "TRUE");
		assert_eq!(run("OR", &["FALSE", ""]), "FALSE");
	}

	#[test]
	fn concat_and_strlen() {
		assert_eq!(run("CONCAT", &["foo", "bar"]), "foobar");
		assert_eq!(run("STRLEN", &[""]), "0");
		assert_eq!(run("STRLEN", &["abcdef"]), "6");
	}

	#[test]
	fn substring_clamps_every_malformed_bound() {
		assert_eq!(run("SUBSTRING", &["abcdef", "2", "100"]), "cdef");
		assert_eq!(run("SUBSTRING", &["abc", "-5", "2"]), "ab");
		assert_eq!(run("SUBSTRING", &["abc", "x", "y"]), "abc");
		assert_eq!(run("SUBSTRING", &["abc", "2", "1"]), "");
		assert_eq!(run("SUBSTRING", &["abc", "2.0", "1.5"]), "abc");
		assert_eq!(run("SUBSTRING", &["abc", "0", "-1"]), "");
		assert_eq!(run("SUBSTRING", &["abc", " 1", "2"]), "ab");
	}

	#[test]
	fn print_writes_to_the_sink_and_returns_its_argument() {
		let arguments = vec!["hello".to_owned()];
		let mut out = String::new();
		let result = evaluate_builtin("PRINT", &arguments, &mut out).unwrap();
		assert_eq!(result, "hello");
		assert_eq!(out, "hello\n");
	}

	#[test]
	fn arity_mismatch_names_the_builtin_and_both_counts() {
		let arguments = vec!["only one".to_owned()];
		let error = evaluate_builtin("EQUAL", &arguments, &mut String::new()).unwrap_err();
		let message = error.to_string();
		assert!(message.contains("EQUAL"), "{message}");
		assert!(message.contains("expected 2"), "{message}");
		assert!(message.contains("got 1"), "{message}");
	}

	#[test]
	fn unknown_builtin_is_an_error() {
		let error = evaluate_builtin("FROBNICATE", &[], &mut String::new()).unwrap_err();
		assert!(error.to_string().contains("FROBNICATE"));
	}

	#[test]
	fn transpile_emits_the_cpp_call() {
		let arguments = vec!["a_local_poiboivar".to_owned(), "PBString::NewStaticString(\"x\")".to_owned()];
		assert_eq!(
			transpile_builtin("CONCAT", &arguments).unwrap(),
			"Builtin_Concat(a_local_poiboivar, PBString::NewStaticString(\"x\"))"
		);
	}

	#[test]
	fn transpile_checks_arity_too() {
		assert!(transpile_builtin("PRINT", &[]).is_err());
	}
}
