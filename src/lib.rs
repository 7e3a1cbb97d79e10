pub mod facts;
pub mod tree;

pub use facts::{CompositeFacts, DesignFacts, InstanceFacts, InstanceId, SensItem, SignalId, TerminalFacts};
pub use tree::{BlockGraph, BlockNode, Connection, GraphConfig, ModuleNode, ModuleNodeId, ModuleTree, TreeError};
