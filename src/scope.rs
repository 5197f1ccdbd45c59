use std::collections::HashMap;

/// A stack of local-variable frames, innermost frame last. A fresh stack is created for every function call; a frame is pushed on entry to
/// every `IF`/`ELIF`/`ELSE` branch and every `WHILE` iteration and popped on exit, so a binding first made in a block dies with the block.
/// Stores to a name an outer frame already binds write through to that frame instead, and survive the block.
///
/// Building the scope chain as a flat `Vec` rather than parent-linked frames keeps the borrow checker out of the picture: a frame is
/// always older than its children and frames are only ever pushed and popped at the end, which is exactly stack discipline.
///
/// The value type is generic because both back ends track scopes: the interpreter stores actual string values (`ScopeStack<String>`),
/// while the transpiler only needs to know *which names are declared where* to decide between emitting a C++ declaration and a plain
/// store (`ScopeStack<()>`).
#[derive(Debug)]
pub struct ScopeStack<V> {
	frames: Vec<HashMap<String, V>>,
}

impl<V> ScopeStack<V> {
	/// A scope stack holding a single empty base frame.
	#[must_use]
	pub fn new() -> Self {
		Self { frames: vec![HashMap::new()] }
	}

	/// A scope stack whose base frame holds the given bindings. Used at function entry to bind parameters to arguments.
	#[must_use]
	pub fn with_bindings(bindings: impl IntoIterator<Item = (String, V)>) -> Self {
		Self {
			frames: vec![bindings.into_iter().collect()],
		}
	}

	/// Enters a nested block.
	pub fn push_frame(&mut self) {
		self.frames.push(HashMap::new());
	}

	/// Leaves a nested block, releasing every binding made in it.
	pub fn pop_frame(&mut self) {
		assert!(self.frames.len() > 1, "the base frame is never popped");
		let _dropped = self.frames.pop();
	}

	/// Looks `name` up through the chain, innermost frame first. Returns `None` if no frame binds it; the caller then consults the
	/// globals (and after that defaults to the empty string — an unbound read is not an error in this language).
	#[must_use]
	pub fn get(&self, name: &str) -> Option<&V> {
		self.frames.iter().rev().find_map(|frame| frame.get(name))
	}

	/// Whether any frame on the chain binds `name`.
	#[must_use]
	pub fn is_bound(&self, name: &str) -> bool {
		self.get(name).is_some()
	}

	/// Stores `name` the way a `LOCAL` assignment does: into the innermost frame that already binds it — writing through to the
	/// owning frame, where the value survives the current block — or, when no frame binds it, as a fresh binding in the innermost
	/// frame, released when the block exits.
	pub fn set_value(&mut self, name: &str, value: V) {
		for frame in self.frames.iter_mut().rev() {
			if let Some(slot) = frame.get_mut(name) {
				*slot = value;
				return;
			}
		}
		let _previous = self.innermost_mut().insert(name.to_owned(), value);
	}

	/// Stores into the innermost frame that already binds `name`. Returns `false`, storing nothing, when no frame binds it — the
	/// caller then treats the assignment as global. This is the semantics of an assignment without `LOCAL`.
	pub fn update(&mut self, name: &str, value: V) -> bool {
		for frame in self.frames.iter_mut().rev() {
			if let Some(slot) = frame.get_mut(name) {
				*slot = value;
				return true;
			}
		}
		false
	}

	fn innermost_mut(&mut self) -> &mut HashMap<String, V> {
		self.frames.last_mut().expect("a scope stack always holds at least its base frame")
	}
}

impl<V> Default for ScopeStack<V> {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::ScopeStack;

	#[test]
	fn reads_walk_outward_through_frames() {
		let mut scope = ScopeStack::with_bindings([("a".to_owned(), "outer".to_owned())]);
		scope.push_frame();
		assert_eq!(scope.get("a").map(String::as_str), Some("outer"));
		assert_eq!(scope.get("missing"), None);
	}

	#[test]
	fn set_value_of_a_bound_name_writes_through_to_the_owning_frame() {
		let mut scope = ScopeStack::with_bindings([("a".to_owned(), "outer".to_owned())]);
		scope.push_frame();
		scope.set_value("a", "inner".to_owned());
		assert_eq!(scope.get("a").map(String::as_str), Some("inner"));
		// The store went to the owning frame, so it survives the block.
		scope.pop_frame();
		assert_eq!(scope.get("a").map(String::as_str), Some("inner"));
	}

	#[test]
	fn set_value_of_an_unbound_name_binds_the_innermost_frame() {
		let mut scope: ScopeStack<String> = ScopeStack::new();
		scope.push_frame();
		scope.set_value("b", "blockScoped".to_owned());
		assert_eq!(scope.get("b").map(String::as_str), Some("blockScoped"));
		scope.pop_frame();
		assert!(!scope.is_bound("b"));
	}

	#[test]
	fn update_writes_through_to_the_binding_frame() {
		let mut scope = ScopeStack::with_bindings([("a".to_owned(), "old".to_owned())]);
		scope.push_frame();
		assert!(scope.update("a", "new".to_owned()));
		scope.pop_frame();
		assert_eq!(scope.get("a").map(String::as_str), Some("new"));
	}

	#[test]
	fn update_of_an_unbound_name_reports_global() {
		let mut scope: ScopeStack<String> = ScopeStack::new();
		assert!(!scope.update("a", "value".to_owned()));
		assert!(!scope.is_bound("a"));
	}

	#[test]
	fn set_value_in_the_binding_frame_updates_in_place() {
		let mut scope = ScopeStack::with_bindings([("a".to_owned(), "old".to_owned())]);
		scope.set_value("a", "new".to_owned());
		assert_eq!(scope.get("a").map(String::as_str), Some("new"));
	}
}
