use std::collections::{BTreeMap, BTreeSet};

/// References a signal identity in a fact table
///
/// Two references denote the same wire iff their IDs are equal. Names are
/// scope-local labels and never part of a signal's identity.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct SignalId {
	pub(crate) id: usize,
}

impl SignalId {
	/// Checks if the reference is valid
	pub fn is_null(&self) -> bool {
		self.id == 0
	}
}

/// References an instance object in a fact table
#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
pub struct InstanceId {
	pub(crate) id: usize,
}

impl InstanceId {
	/// Checks if the reference is valid
	pub fn is_null(&self) -> bool {
		self.id == 0
	}
}

/// Sensitivity list entry of a terminal block
#[derive(Clone, Copy, Debug)]
pub enum SensItem {
	/// Level sensitivity - the block reacts to any change of the signal
	Level(SignalId),

	/// Edge sensitivity qualifier on a signal
	Edge { signal: SignalId, rising: bool },
}

impl SensItem {
	/// Returns the signal this entry is sensitive to
	pub fn signal(&self) -> SignalId {
		match self {
			SensItem::Level(signal) => *signal,
			SensItem::Edge { signal, .. } => *signal,
		}
	}
}

/// Hierarchy facts describing a composite instance
#[derive(Clone, Debug, Default)]
pub struct CompositeFacts {
	/// Declared name of the instance
	pub name: String,

	/// Local signal name dictionary
	pub sigdict: BTreeMap<String, SignalId>,

	/// Child instances in declaration order
	pub children: Vec<InstanceId>,

	/// Named sub-instance pairs used to resolve terminal child names.
	/// Names must be unique among siblings.
	pub subs: Vec<(String, InstanceId)>,
}

/// Usage facts describing a terminal instance
#[derive(Clone, Debug, Default)]
pub struct TerminalFacts {
	/// Names of signals read by the block
	pub reads: BTreeSet<String>,

	/// Names of signals written by the block
	pub writes: BTreeSet<String>,

	/// Sensitivity list of the block
	pub senslist: Vec<SensItem>,

	/// Local signal name dictionary
	pub sigdict: BTreeMap<String, SignalId>,
}

/// Facts about a single hierarchy instance
#[derive(Clone, Debug)]
pub enum InstanceFacts {
	Composite(CompositeFacts),
	Terminal(TerminalFacts),
}

/// Fact table describing a design hierarchy and per-leaf signal usage
///
/// This is the input contract of the analysis. An upstream extractor fills
/// the table; the tree builder only ever reads it.
#[derive(Clone, Debug, Default)]
pub struct DesignFacts {
	instances: Vec<InstanceFacts>,
	next_signal_id: usize,
	top: Option<InstanceId>,
}

impl DesignFacts {
	/// Creates an empty fact table
	pub fn new() -> Self {
		Self::default()
	}

	/// Mints a new signal identity
	pub fn new_signal(&mut self) -> SignalId {
		self.next_signal_id += 1;
		SignalId {
			id: self.next_signal_id,
		}
	}

	/// Adds a composite instance record to the table
	pub fn add_composite(&mut self, facts: CompositeFacts) -> InstanceId {
		self.instances.push(InstanceFacts::Composite(facts));
		InstanceId {
			id: self.instances.len(),
		}
	}

	/// Adds a terminal instance record to the table
	pub fn add_terminal(&mut self, facts: TerminalFacts) -> InstanceId {
		self.instances.push(InstanceFacts::Terminal(facts));
		InstanceId {
			id: self.instances.len(),
		}
	}

	/// Starts building a composite instance record
	pub fn composite(&mut self, name: &str) -> CompositeBuilder {
		CompositeBuilder::new(self, name)
	}

	/// Starts building a terminal instance record
	pub fn terminal(&mut self) -> TerminalBuilder {
		TerminalBuilder::new(self)
	}

	/// Designates the top instance of the hierarchy
	pub fn set_top(&mut self, top: InstanceId) {
		self.top = Some(top);
	}

	/// Returns the designated top instance
	pub fn top(&self) -> Option<InstanceId> {
		self.top
	}

	/// Returns facts about the given instance
	pub fn get(&self, instance: InstanceId) -> Option<&InstanceFacts> {
		self.instances.get(instance.id.wrapping_sub(1))
	}

	/// Returns facts about the given instance if it is composite
	pub fn get_composite(&self, instance: InstanceId) -> Option<&CompositeFacts> {
		match self.get(instance) {
			Some(InstanceFacts::Composite(facts)) => Some(facts),
			_ => None,
		}
	}

	/// Returns facts about the given instance if it is terminal
	pub fn get_terminal(&self, instance: InstanceId) -> Option<&TerminalFacts> {
		match self.get(instance) {
			Some(InstanceFacts::Terminal(facts)) => Some(facts),
			_ => None,
		}
	}
}

/// Composite instance record builder
pub struct CompositeBuilder<'a> {
	facts: &'a mut DesignFacts,
	record: CompositeFacts,
}

impl<'a> CompositeBuilder<'a> {
	fn new(facts: &'a mut DesignFacts, name: &str) -> Self {
		Self {
			facts,
			record: CompositeFacts {
				name: name.into(),
				..Default::default()
			},
		}
	}

	/// Adds an entry to the local signal dictionary
	pub fn signal(mut self, name: &str, signal: SignalId) -> Self {
		self.record.sigdict.insert(name.into(), signal);
		self
	}

	/// Adds a named child instance
	pub fn sub(mut self, name: &str, instance: InstanceId) -> Self {
		self.record.children.push(instance);
		self.record.subs.push((name.into(), instance));
		self
	}

	/// Adds the record to the fact table and returns its instance ID
	pub fn add(self) -> InstanceId {
		self.facts.add_composite(self.record)
	}
}

/// Terminal instance record builder
pub struct TerminalBuilder<'a> {
	facts: &'a mut DesignFacts,
	record: TerminalFacts,
}

impl<'a> TerminalBuilder<'a> {
	fn new(facts: &'a mut DesignFacts) -> Self {
		Self {
			facts,
			record: TerminalFacts::default(),
		}
	}

	/// Records a read of the named signal
	pub fn reads(mut self, name: &str, signal: SignalId) -> Self {
		self.record.reads.insert(name.into());
		self.record.sigdict.insert(name.into(), signal);
		self
	}

	/// Records a write of the named signal
	pub fn writes(mut self, name: &str, signal: SignalId) -> Self {
		self.record.writes.insert(name.into());
		self.record.sigdict.insert(name.into(), signal);
		self
	}

	/// Appends a level entry to the sensitivity list
	pub fn level(mut self, signal: SignalId) -> Self {
		self.record.senslist.push(SensItem::Level(signal));
		self
	}

	/// Appends an edge entry to the sensitivity list
	pub fn edge(mut self, signal: SignalId, rising: bool) -> Self {
		self.record.senslist.push(SensItem::Edge { signal, rising });
		self
	}

	/// Adds the record to the fact table and returns its instance ID
	pub fn add(self) -> InstanceId {
		self.facts.add_terminal(self.record)
	}
}
