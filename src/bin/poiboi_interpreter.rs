// Bring the `Parser` trait into scope from `clap`, which allows parsing argument structs from the command line. We assign it to
// underscore to indicate clearly that it's not used outside of bringing its trait methods into scope.
use clap::Parser as _;

/// The entry point of the PoiBoi interpreter: parse the command-line arguments and hand off to the driver.
fn main() -> anyhow::Result<()> {
	poiboi::cli::InterpreterArguments::parse().execute()
}
