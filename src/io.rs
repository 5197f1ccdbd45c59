/// Where `PRINT` output goes. The interpreter threads one of these through every evaluation so that the drivers can print straight to
/// the terminal while tests capture output in a `String` and compare it against expected stdout.
pub trait PrintWriter {
	/// Writes one printed value, newline-terminated.
	fn print_line(&mut self, line: &str);
}

/// The standard sink: each printed value goes to stdout.
pub struct StdPrint;

impl PrintWriter for StdPrint {
	fn print_line(&mut self, line: &str) {
		println!("{line}");
	}
}

/// Capture sink for tests: printed values accumulate newline-terminated.
impl PrintWriter for String {
	fn print_line(&mut self, line: &str) {
		self.push_str(line);
		self.push('\n');
	}
}
