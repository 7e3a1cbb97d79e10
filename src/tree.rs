mod classify;
pub mod graph;

pub use graph::{BlockGraph, BlockNode, Connection, GraphConfig, EDGE_COLORS};

use log::{debug, info};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::facts::{CompositeFacts, DesignFacts, InstanceFacts, InstanceId, SignalId, TerminalFacts};

/// References a node in a module tree
#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
pub struct ModuleNodeId {
	pub(crate) id: usize,
}

impl ModuleNodeId {
	/// Checks if the reference is valid
	pub fn is_null(&self) -> bool {
		self.id == 0
	}
}

/// Represents an error that can occur during module tree construction.
///
/// All variants are internal-consistency faults of the fact table. None of
/// them is recoverable - the build aborts on the first one.
#[derive(Clone, Debug, Error)]
pub enum TreeError {
	#[error("Terminal instance not present in its parent's sub-instance list")]
	UnresolvedInstance { instance: InstanceId },

	#[error("Sensitivity list signal of '{module}' has no identity match in the parent's dictionary")]
	SignalNameUnresolved { module: String, signal: SignalId },

	#[error("Name '{name}' used by '{module}' is missing from its dictionary")]
	SignalNotInDictionary { module: String, name: String },

	#[error("Instance has no record in the fact table")]
	UnknownInstance(InstanceId),

	#[error("Fact table does not designate a top instance")]
	NoTopInstance,
}

/// One module instance in the analyzed hierarchy
///
/// Terminal nodes carry `possible_outputs`; composite nodes carry
/// `internal_signals` and a connectivity graph. All maps are finalized once
/// the owning tree is built.
pub struct ModuleNode {
	/// Self-reference
	pub(crate) id: ModuleNodeId,

	/// Parent node, used for lookup only (absent for the root)
	parent: Option<ModuleNodeId>,

	/// Fact table instance this node was built from
	instance: InstanceId,

	/// Name of the module instance
	name: String,

	/// Child nodes in declaration order (empty for terminal nodes)
	children: Vec<ModuleNodeId>,

	/// Local signal name dictionary (composite nodes only)
	sigdict: BTreeMap<String, SignalId>,

	/// Signals entering the module
	inputs: BTreeMap<String, SignalId>,

	/// Signals leaving the module
	outputs: BTreeMap<String, SignalId>,

	/// Signals both read and written within the leaf, direction deferred
	/// to the parent (terminal nodes only)
	possible_outputs: BTreeMap<String, SignalId>,

	/// Signals connecting only this node's children, never exposed upward
	/// (composite nodes only)
	internal_signals: BTreeMap<String, SignalId>,

	/// Submodule connectivity graph (composite nodes only)
	graph: Option<BlockGraph>,
}

impl ModuleNode {
	/// Returns the ID of this node
	pub fn id(&self) -> ModuleNodeId {
		self.id
	}

	/// Returns the parent node ID (None for the root)
	pub fn parent(&self) -> Option<ModuleNodeId> {
		self.parent
	}

	/// Returns the fact table instance this node was built from
	pub fn instance(&self) -> InstanceId {
		self.instance
	}

	/// Returns the name of the module instance
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Returns child node IDs in declaration order
	pub fn children(&self) -> &[ModuleNodeId] {
		&self.children
	}

	/// Checks if the node is terminal
	pub fn is_terminal(&self) -> bool {
		self.children.is_empty()
	}

	/// Returns the module's input signals
	pub fn inputs(&self) -> &BTreeMap<String, SignalId> {
		&self.inputs
	}

	/// Returns the module's output signals
	pub fn outputs(&self) -> &BTreeMap<String, SignalId> {
		&self.outputs
	}

	/// Returns the signals whose direction was deferred to the parent
	pub fn possible_outputs(&self) -> &BTreeMap<String, SignalId> {
		&self.possible_outputs
	}

	/// Returns the signals internal to this module
	pub fn internal_signals(&self) -> &BTreeMap<String, SignalId> {
		&self.internal_signals
	}

	/// Returns the submodule connectivity graph (None for terminal nodes)
	pub fn graph(&self) -> Option<&BlockGraph> {
		self.graph.as_ref()
	}
}

/// Module hierarchy with inferred signal directions and connectivity graphs
///
/// Nodes are owned by the tree and refer to each other by ID. The tree is
/// read-only once built.
pub struct ModuleTree {
	nodes: Vec<ModuleNode>,
	root: ModuleNodeId,
}

impl ModuleTree {
	/// Builds a module tree from a fact table using default graph settings
	pub fn build(facts: &DesignFacts) -> Result<Self, TreeError> {
		Self::build_with_config(facts, GraphConfig::default())
	}

	/// Builds a module tree from a fact table
	///
	/// Runs a single post-order traversal: every node is classified right
	/// after all of its children are.
	pub fn build_with_config(facts: &DesignFacts, config: GraphConfig) -> Result<Self, TreeError> {
		let top = facts.top().ok_or(TreeError::NoTopInstance)?;
		info!("Building module tree from top instance {:?}", top);

		let mut builder = TreeBuilder {
			facts,
			config,
			nodes: Vec::new(),
		};
		let root = builder.build_instance(top, None)?;

		info!("Module tree complete ({} nodes)", builder.nodes.len());
		Ok(Self {
			nodes: builder.nodes,
			root,
		})
	}

	/// Returns the root node
	pub fn root(&self) -> &ModuleNode {
		self.get(self.root).unwrap()
	}

	/// Returns the node with the given ID
	pub fn get(&self, node: ModuleNodeId) -> Option<&ModuleNode> {
		self.nodes.get(node.id.wrapping_sub(1))
	}

	/// Returns the number of nodes in the tree
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// Checks if the tree is empty (never true for a built tree)
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Iterates over all nodes, each parent before its children
	pub fn iter(&self) -> PreOrderIter<'_> {
		PreOrderIter {
			tree: self,
			stack: vec![self.root],
		}
	}
}

/// Pre-order iterator over a module tree
pub struct PreOrderIter<'a> {
	tree: &'a ModuleTree,
	stack: Vec<ModuleNodeId>,
}

impl<'a> Iterator for PreOrderIter<'a> {
	type Item = &'a ModuleNode;

	fn next(&mut self) -> Option<Self::Item> {
		let node = self.tree.get(self.stack.pop()?)?;
		for child in node.children.iter().rev() {
			self.stack.push(*child);
		}
		Some(node)
	}
}

/// Transient state of a single tree build
pub(crate) struct TreeBuilder<'a> {
	pub(crate) facts: &'a DesignFacts,
	pub(crate) config: GraphConfig,
	pub(crate) nodes: Vec<ModuleNode>,
}

impl<'a> TreeBuilder<'a> {
	pub(crate) fn node(&self, id: ModuleNodeId) -> &ModuleNode {
		&self.nodes[id.id - 1]
	}

	pub(crate) fn node_mut(&mut self, id: ModuleNodeId) -> &mut ModuleNode {
		&mut self.nodes[id.id - 1]
	}

	fn alloc_node(
		&mut self,
		parent: Option<ModuleNodeId>,
		instance: InstanceId,
		name: String,
		sigdict: BTreeMap<String, SignalId>,
	) -> ModuleNodeId {
		let id = ModuleNodeId {
			id: self.nodes.len() + 1,
		};
		self.nodes.push(ModuleNode {
			id,
			parent,
			instance,
			name,
			children: Vec::new(),
			sigdict,
			inputs: BTreeMap::new(),
			outputs: BTreeMap::new(),
			possible_outputs: BTreeMap::new(),
			internal_signals: BTreeMap::new(),
			graph: None,
		});
		id
	}

	fn build_instance(
		&mut self,
		instance: InstanceId,
		parent: Option<ModuleNodeId>,
	) -> Result<ModuleNodeId, TreeError> {
		let facts = self.facts;
		match facts.get(instance).ok_or(TreeError::UnknownInstance(instance))? {
			InstanceFacts::Composite(record) => self.build_composite(instance, record, parent),
			InstanceFacts::Terminal(record) => self.build_terminal(instance, record, parent),
		}
	}

	fn build_composite(
		&mut self,
		instance: InstanceId,
		record: &'a CompositeFacts,
		parent: Option<ModuleNodeId>,
	) -> Result<ModuleNodeId, TreeError> {
		debug!("Building composite module '{}'", record.name);
		let id = self.alloc_node(parent, instance, record.name.clone(), record.sigdict.clone());

		for &child in &record.children {
			let child_id = self.build_instance(child, Some(id))?;
			self.node_mut(id).children.push(child_id);
		}

		// Children are fully classified at this point
		self.classify_composite(id);
		let graph = self.build_block_graph(id);
		self.node_mut(id).graph = Some(graph);
		Ok(id)
	}

	fn build_terminal(
		&mut self,
		instance: InstanceId,
		record: &'a TerminalFacts,
		parent: Option<ModuleNodeId>,
	) -> Result<ModuleNodeId, TreeError> {
		// The terminal's name lives in the parent's sub-instance list
		let parent_id = parent.ok_or(TreeError::UnresolvedInstance { instance })?;
		let parent_instance = self.node(parent_id).instance;
		let facts = self.facts;
		let parent_record = facts
			.get_composite(parent_instance)
			.ok_or(TreeError::UnknownInstance(parent_instance))?;
		let name = parent_record
			.subs
			.iter()
			.find(|(_, sub)| *sub == instance)
			.map(|(name, _)| name.clone())
			.ok_or(TreeError::UnresolvedInstance { instance })?;

		debug!("Building terminal module '{}'", name);
		let id = self.alloc_node(parent, instance, name, BTreeMap::new());
		self.classify_terminal(id, record, &parent_record.sigdict)?;
		Ok(id)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::facts::DesignFacts;

	fn two_level_facts() -> DesignFacts {
		let mut facts = DesignFacts::new();
		let a = facts.new_signal();
		let q = facts.new_signal();
		let leaf = facts.terminal().reads("a", a).writes("q", q).add();
		let top = facts
			.composite("top")
			.signal("a", a)
			.signal("q", q)
			.sub("leaf", leaf)
			.add();
		facts.set_top(top);
		facts
	}

	#[test]
	fn builds_tree_shape() {
		let facts = two_level_facts();
		let tree = ModuleTree::build(&facts).unwrap();

		assert_eq!(tree.len(), 2);
		let root = tree.root();
		assert_eq!(root.name(), "top");
		assert!(root.parent().is_none());
		assert!(!root.is_terminal());
		assert_eq!(root.children().len(), 1);

		let leaf = tree.get(root.children()[0]).unwrap();
		assert_eq!(leaf.name(), "leaf");
		assert!(leaf.is_terminal());
		assert_eq!(leaf.parent(), Some(root.id()));
		assert!(leaf.graph().is_none());
		assert!(root.graph().is_some());
	}

	#[test]
	fn iterates_parents_before_children() {
		let facts = two_level_facts();
		let tree = ModuleTree::build(&facts).unwrap();
		let names: Vec<_> = tree.iter().map(|node| node.name().to_string()).collect();
		assert_eq!(names, vec!["top", "leaf"]);
	}

	#[test]
	fn missing_top_is_an_error() {
		let facts = DesignFacts::new();
		assert!(matches!(ModuleTree::build(&facts), Err(TreeError::NoTopInstance)));
	}

	#[test]
	fn terminal_top_cannot_be_named() {
		let mut facts = DesignFacts::new();
		let q = facts.new_signal();
		let leaf = facts.terminal().writes("q", q).add();
		facts.set_top(leaf);

		assert!(matches!(
			ModuleTree::build(&facts),
			Err(TreeError::UnresolvedInstance { .. })
		));
	}

	#[test]
	fn unlisted_terminal_is_unresolved() {
		let mut facts = DesignFacts::new();
		let q = facts.new_signal();
		let leaf = facts.terminal().writes("q", q).add();

		// Child present in the instance list but absent from the named subs
		let mut record = crate::facts::CompositeFacts {
			name: "top".into(),
			..Default::default()
		};
		record.sigdict.insert("q".into(), q);
		record.children.push(leaf);
		let top = facts.add_composite(record);
		facts.set_top(top);

		assert!(matches!(
			ModuleTree::build(&facts),
			Err(TreeError::UnresolvedInstance { instance }) if instance == leaf
		));
	}
}
