use log::debug;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::{ModuleNodeId, TreeBuilder};
use crate::facts::SignalId;

/// Cosmetic edge color palette
pub const EDGE_COLORS: [&str; 10] = [
	"blue", "red", "yellow", "green", "orange", "cyan", "magenta", "pink", "purple", "brown",
];

/// Stateless edge color selection function
///
/// Arguments are the tail block label, tail port, head block label and head
/// port. The choice is purely cosmetic and must never affect classification.
pub type EdgeColorFn = fn(&str, &str, &str, &str) -> &'static str;

/// Picks a palette color by hashing the edge endpoints and port labels
pub fn default_edge_color(tail: &str, tail_port: &str, head: &str, head_port: &str) -> &'static str {
	let mut hasher = DefaultHasher::new();
	(tail, tail_port, head, head_port).hash(&mut hasher);
	EDGE_COLORS[(hasher.finish() % EDGE_COLORS.len() as u64) as usize]
}

/// Settings for connectivity graph construction
#[derive(Clone, Copy)]
pub struct GraphConfig {
	/// Edge color selection
	pub edge_color: EdgeColorFn,
}

impl Default for GraphConfig {
	fn default() -> Self {
		GraphConfig {
			edge_color: default_edge_color,
		}
	}
}

/// Node of a composite module's connectivity graph
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlockNode {
	/// Boundary node representing the module's own inputs
	Input,

	/// Boundary node representing the module's own outputs
	Output,

	/// A child submodule, by sibling-unique name
	Child(String),
}

impl fmt::Display for BlockNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			BlockNode::Input => write!(f, "IN"),
			BlockNode::Output => write!(f, "OUT"),
			BlockNode::Child(name) => write!(f, "{}", name),
		}
	}
}

/// A directed, labeled connection between two blocks
#[derive(Clone, Debug)]
pub struct Connection {
	/// The shared wire
	pub signal: SignalId,

	/// Signal name in the source block's namespace
	pub tail_port: String,

	/// Signal name in the destination block's namespace
	pub head_port: String,

	/// Cosmetic color drawn from [`EDGE_COLORS`]
	pub color: &'static str,
}

/// Connectivity graph between a composite module's submodules
///
/// Parallel edges are allowed - one per shared wire between a pair of
/// blocks.
pub struct BlockGraph {
	graph: DiGraph<BlockNode, Connection>,
	input: NodeIndex,
	output: NodeIndex,
	children: HashMap<String, NodeIndex>,
}

impl BlockGraph {
	/// Returns the underlying directed graph
	pub fn graph(&self) -> &DiGraph<BlockNode, Connection> {
		&self.graph
	}

	/// Returns the IN boundary node
	pub fn input_node(&self) -> NodeIndex {
		self.input
	}

	/// Returns the OUT boundary node
	pub fn output_node(&self) -> NodeIndex {
		self.output
	}

	/// Returns the node of the child with the given name
	pub fn child_node(&self, name: &str) -> Option<NodeIndex> {
		self.children.get(name).copied()
	}

	/// Iterates over all connections together with their endpoint blocks
	pub fn connections(&self) -> impl Iterator<Item = (&BlockNode, &BlockNode, &Connection)> {
		self.graph
			.edge_references()
			.map(|edge| (&self.graph[edge.source()], &self.graph[edge.target()], edge.weight()))
	}
}

impl<'a> TreeBuilder<'a> {
	/// Builds the submodule connectivity graph of a classified composite node
	pub(crate) fn build_block_graph(&self, node: ModuleNodeId) -> BlockGraph {
		let this = self.node(node);
		let pick_color = self.config.edge_color;

		let mut graph = DiGraph::new();
		let input = graph.add_node(BlockNode::Input);
		let output = graph.add_node(BlockNode::Output);

		let mut children = HashMap::new();
		for &child_id in &this.children {
			let name = self.node(child_id).name.clone();
			let index = graph.add_node(BlockNode::Child(name.clone()));
			children.insert(name, index);
		}

		// Connections from the module's own inputs
		for (name, &signal) in &this.inputs {
			for &child_id in &this.children {
				let child = self.node(child_id);
				for (child_name, &child_signal) in &child.inputs {
					if signal == child_signal {
						let color = pick_color("IN", name, &child.name, child_name);
						graph.add_edge(
							input,
							children[&child.name],
							Connection {
								signal,
								tail_port: name.clone(),
								head_port: child_name.clone(),
								color,
							},
						);
					}
				}
			}
		}

		// Connections between submodules
		for &tail_id in &this.children {
			let tail = self.node(tail_id);
			for (tail_port, &tail_signal) in &tail.outputs {
				for &head_id in &this.children {
					if head_id == tail_id {
						continue;
					}
					let head = self.node(head_id);
					for (head_port, &head_signal) in &head.inputs {
						if tail_signal == head_signal {
							let color = pick_color(&tail.name, tail_port, &head.name, head_port);
							graph.add_edge(
								children[&tail.name],
								children[&head.name],
								Connection {
									signal: tail_signal,
									tail_port: tail_port.clone(),
									head_port: head_port.clone(),
									color,
								},
							);
						}
					}
				}
			}
		}

		// Connections to the module's own outputs
		for (name, &signal) in &this.outputs {
			for &child_id in &this.children {
				let child = self.node(child_id);
				for (child_name, &child_signal) in &child.outputs {
					if signal == child_signal {
						let color = pick_color(&child.name, child_name, "OUT", name);
						graph.add_edge(
							children[&child.name],
							output,
							Connection {
								signal,
								tail_port: child_name.clone(),
								head_port: name.clone(),
								color,
							},
						);
					}
				}
			}
		}

		debug!(
			"Graph of '{}': {} nodes, {} edges",
			this.name,
			graph.node_count(),
			graph.edge_count()
		);

		BlockGraph {
			graph,
			input,
			output,
			children,
		}
	}
}
