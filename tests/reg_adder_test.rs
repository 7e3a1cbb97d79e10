//! End-to-end scenario: a combinational adder feeding a clocked register
//! through a wire local to the enclosing module.

use hdldoc::{DesignFacts, ModuleNode, ModuleTree, SignalId};
use std::collections::BTreeSet;

fn reg_adder_facts() -> DesignFacts {
	let mut facts = DesignFacts::new();
	let clk = facts.new_signal();
	let rst = facts.new_signal();
	let ce = facts.new_signal();
	let a = facts.new_signal();
	let b = facts.new_signal();
	let q = facts.new_signal();
	let s = facts.new_signal();

	let adder = facts
		.terminal()
		.reads("a_i", a)
		.reads("b_i", b)
		.writes("s_aux", s)
		.level(a)
		.level(b)
		.add();

	let rtl = facts
		.terminal()
		.reads("rst_i", rst)
		.reads("ce_i", ce)
		.reads("d_i", s)
		.writes("q_o", q)
		.edge(clk, true)
		.edge(rst, true)
		.add();

	let reg = facts
		.composite("reg_s")
		.signal("clk_i", clk)
		.signal("rst_i", rst)
		.signal("ce_i", ce)
		.signal("d_i", s)
		.signal("q_o", q)
		.sub("rtl", rtl)
		.add();

	let top = facts
		.composite("reg_adder")
		.signal("clk_i", clk)
		.signal("rst_i", rst)
		.signal("ce_i", ce)
		.signal("a_i", a)
		.signal("b_i", b)
		.signal("q_o", q)
		.signal("s_aux", s)
		.sub("adder", adder)
		.sub("reg_s", reg)
		.add();
	facts.set_top(top);
	facts
}

fn find<'a>(tree: &'a ModuleTree, name: &str) -> &'a ModuleNode {
	tree.iter().find(|node| node.name() == name).unwrap()
}

fn key_names(map: &std::collections::BTreeMap<String, SignalId>) -> Vec<String> {
	map.keys().cloned().collect()
}

/// Edge set with everything except the cosmetic color
fn edge_set(tree: &ModuleTree, module: &str) -> BTreeSet<(String, String, String, String, SignalId)> {
	find(tree, module)
		.graph()
		.unwrap()
		.connections()
		.map(|(tail, head, conn)| {
			(
				tail.to_string(),
				head.to_string(),
				conn.tail_port.clone(),
				conn.head_port.clone(),
				conn.signal,
			)
		})
		.collect()
}

#[test]
fn directions_of_all_modules() {
	let facts = reg_adder_facts();
	let tree = ModuleTree::build(&facts).unwrap();

	let adder = find(&tree, "adder");
	assert_eq!(key_names(adder.inputs()), ["a_i", "b_i"]);
	assert_eq!(key_names(adder.outputs()), ["s_aux"]);

	let rtl = find(&tree, "rtl");
	assert_eq!(key_names(rtl.inputs()), ["ce_i", "clk_i", "d_i", "rst_i"]);
	assert_eq!(key_names(rtl.outputs()), ["q_o"]);

	let reg = find(&tree, "reg_s");
	assert_eq!(key_names(reg.inputs()), ["ce_i", "clk_i", "d_i", "rst_i"]);
	assert_eq!(key_names(reg.outputs()), ["q_o"]);
	assert!(reg.internal_signals().is_empty());

	let top = tree.root();
	assert_eq!(key_names(top.inputs()), ["a_i", "b_i", "ce_i", "clk_i", "rst_i"]);
	assert_eq!(key_names(top.outputs()), ["q_o"]);
	// The adder-to-register wire is local to the top module
	assert_eq!(key_names(top.internal_signals()), ["s_aux"]);
}

#[test]
fn adder_feeds_register() {
	let facts = reg_adder_facts();
	let tree = ModuleTree::build(&facts).unwrap();
	let edges = edge_set(&tree, "reg_adder");

	let fold_edge = edges
		.iter()
		.find(|(tail, head, ..)| tail == "adder" && head == "reg_s")
		.unwrap();
	assert_eq!(fold_edge.2, "s_aux");
	assert_eq!(fold_edge.3, "d_i");

	let top = tree.root();
	assert!(!top.inputs().contains_key("s_aux"));
	assert!(!top.outputs().contains_key("s_aux"));
}

#[test]
fn boundary_edge_completeness() {
	let facts = reg_adder_facts();
	let tree = ModuleTree::build(&facts).unwrap();

	for node in [tree.root(), find(&tree, "reg_s")] {
		let edges = edge_set(&tree, node.name());
		for &signal in node.inputs().values() {
			assert!(
				edges.iter().any(|(tail, _, _, _, sig)| tail == "IN" && *sig == signal),
				"input signal {:?} of '{}' has no IN edge",
				signal,
				node.name()
			);
		}
		for &signal in node.outputs().values() {
			assert!(
				edges.iter().any(|(_, head, _, _, sig)| head == "OUT" && *sig == signal),
				"output signal {:?} of '{}' has no OUT edge",
				signal,
				node.name()
			);
		}
	}
}

#[test]
fn full_edge_set_of_top_graph() {
	let facts = reg_adder_facts();
	let tree = ModuleTree::build(&facts).unwrap();
	let edges = edge_set(&tree, "reg_adder");
	assert_eq!(edges.len(), 7);

	let labels: BTreeSet<_> = edges
		.iter()
		.map(|(tail, head, tail_port, head_port, _)| {
			(tail.as_str(), head.as_str(), tail_port.as_str(), head_port.as_str())
		})
		.collect();
	let expected: BTreeSet<_> = [
		("IN", "adder", "a_i", "a_i"),
		("IN", "adder", "b_i", "b_i"),
		("IN", "reg_s", "clk_i", "clk_i"),
		("IN", "reg_s", "rst_i", "rst_i"),
		("IN", "reg_s", "ce_i", "ce_i"),
		("adder", "reg_s", "s_aux", "d_i"),
		("reg_s", "OUT", "q_o", "q_o"),
	]
	.into_iter()
	.collect();
	assert_eq!(labels, expected);
}

#[test]
fn identical_facts_build_identical_trees() {
	let tree_a = ModuleTree::build(&reg_adder_facts()).unwrap();
	let tree_b = ModuleTree::build(&reg_adder_facts()).unwrap();

	for (node_a, node_b) in tree_a.iter().zip(tree_b.iter()) {
		assert_eq!(node_a.name(), node_b.name());
		assert_eq!(node_a.inputs(), node_b.inputs());
		assert_eq!(node_a.outputs(), node_b.outputs());
		assert_eq!(node_a.possible_outputs(), node_b.possible_outputs());
		assert_eq!(node_a.internal_signals(), node_b.internal_signals());
	}

	assert_eq!(edge_set(&tree_a, "reg_adder"), edge_set(&tree_b, "reg_adder"));
	assert_eq!(edge_set(&tree_a, "reg_s"), edge_set(&tree_b, "reg_s"));
}
