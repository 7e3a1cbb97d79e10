use log::debug;
use std::collections::BTreeMap;

use super::{ModuleNodeId, TreeBuilder, TreeError};
use crate::facts::{SignalId, TerminalFacts};

impl<'a> TreeBuilder<'a> {
	/// Determines signal directions of a terminal node from its usage facts
	///
	/// Names only read become inputs, names only written become outputs and
	/// names both read and written are deferred as possible outputs.
	/// Sensitivity list signals are forced into the inputs under the name the
	/// parent's dictionary knows them by.
	pub(crate) fn classify_terminal(
		&mut self,
		node: ModuleNodeId,
		record: &TerminalFacts,
		parent_sigdict: &BTreeMap<String, SignalId>,
	) -> Result<(), TreeError> {
		let mut inputs = BTreeMap::new();
		let mut outputs = BTreeMap::new();
		let mut possible_outputs = BTreeMap::new();

		for name in &record.reads {
			if !record.writes.contains(name) {
				inputs.insert(name.clone(), self.dict_signal(node, record, name)?);
			}
		}

		for name in &record.writes {
			let signal = self.dict_signal(node, record, name)?;
			if record.reads.contains(name) {
				// Could be a register never consumed elsewhere or a true
				// output fed back internally - the parent decides
				possible_outputs.insert(name.clone(), signal);
			} else {
				outputs.insert(name.clone(), signal);
			}
		}

		for item in &record.senslist {
			let signal = item.signal();
			let name = parent_sigdict
				.iter()
				.find(|(_, sig)| **sig == signal)
				.map(|(name, _)| name.clone())
				.ok_or_else(|| TreeError::SignalNameUnresolved {
					module: self.node(node).name.clone(),
					signal,
				})?;
			inputs.insert(name, signal);
		}

		debug!(
			"Terminal '{}': {} inputs, {} outputs, {} possible outputs",
			self.node(node).name,
			inputs.len(),
			outputs.len(),
			possible_outputs.len()
		);

		let node = self.node_mut(node);
		node.inputs = inputs;
		node.outputs = outputs;
		node.possible_outputs = possible_outputs;
		Ok(())
	}

	fn dict_signal(
		&self,
		node: ModuleNodeId,
		record: &TerminalFacts,
		name: &str,
	) -> Result<SignalId, TreeError> {
		record
			.sigdict
			.get(name)
			.copied()
			.ok_or_else(|| TreeError::SignalNotInDictionary {
				module: self.node(node).name.clone(),
				name: name.to_string(),
			})
	}

	/// Determines signal directions of a composite node from its already
	/// classified children
	pub(crate) fn classify_composite(&mut self, node: ModuleNodeId) {
		self.resolve_possible_outputs(node);
		self.classify_own_signals(node);
	}

	/// Promotes children's possible outputs consumed by a sibling into
	/// confirmed outputs
	///
	/// Entries never promoted stay unexposed. That is defined behavior, not
	/// an error.
	fn resolve_possible_outputs(&mut self, node: ModuleNodeId) {
		let children = self.node(node).children.clone();
		let mut promotions = Vec::new();

		for &child_a in &children {
			for (name, &signal) in &self.node(child_a).possible_outputs {
				let consumed = children.iter().any(|&child_b| {
					child_b != child_a
						&& self.node(child_b).inputs.values().any(|&input| input == signal)
				});
				if consumed {
					promotions.push((child_a, name.clone(), signal));
				}
			}
		}

		for (child, name, signal) in promotions {
			debug!(
				"Promoting possible output '{}' of '{}'",
				name,
				self.node(child).name
			);
			self.node_mut(child).outputs.insert(name, signal);
		}
	}

	/// Classifies the composite's own dictionary against its children's ports
	///
	/// A match in any child's inputs disqualifies the signal as this module's
	/// output and vice versa. Signals disqualified both ways or matching no
	/// child at all stay internal to this scope.
	fn classify_own_signals(&mut self, node: ModuleNodeId) {
		let children = self.node(node).children.clone();
		let sigdict = self.node(node).sigdict.clone();

		let mut inputs = BTreeMap::new();
		let mut outputs = BTreeMap::new();
		let mut internal = BTreeMap::new();

		for (name, signal) in sigdict {
			let mut could_be_input = true;
			let mut could_be_output = true;

			for &child in &children {
				if self.node(child).inputs.values().any(|&sig| sig == signal) {
					could_be_output = false;
				}
				if self.node(child).outputs.values().any(|&sig| sig == signal) {
					could_be_input = false;
				}
			}

			if could_be_input && !could_be_output {
				inputs.insert(name, signal);
			} else if could_be_output && !could_be_input {
				outputs.insert(name, signal);
			} else {
				internal.insert(name, signal);
			}
		}

		debug!(
			"Composite '{}': {} inputs, {} outputs, {} internal signals",
			self.node(node).name,
			inputs.len(),
			outputs.len(),
			internal.len()
		);

		let node = self.node_mut(node);
		node.inputs = inputs;
		node.outputs = outputs;
		node.internal_signals = internal;
	}
}
