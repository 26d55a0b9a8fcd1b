//! Shell node tree.
//!
//! The navigation tree is built once at startup from a fluent builder and
//! flattened into an arena: nodes refer to their children and parent by
//! id, and the navigation stack is a stack of ids. Leaf nodes may carry a
//! module, which contributes the fixed `info`/`set`/`reset`/`execute`
//! contract. Global command inheritance is static composition: flattening
//! gives every node a merged table of its ancestors' commands, so dispatch
//! never walks the tree.

use indexmap::IndexMap;
use std::sync::Arc;

use crate::modules::Module;
use crate::shell::command::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(usize);

/// Fluent construction of a node and its subtree.
pub struct NodeBuilder {
    name: String,
    description: String,
    commands: IndexMap<String, Arc<dyn Command>>,
    children: Vec<NodeBuilder>,
    module: Option<Box<dyn Module>>,
}

impl NodeBuilder {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            commands: IndexMap::new(),
            children: Vec::new(),
            module: None,
        }
    }

    /// Leaf node backed by a module; name and description come from the
    /// module itself.
    pub fn for_module(module: Box<dyn Module>) -> Self {
        let mut builder = Self::new(module.name(), module.description());
        builder.module = Some(module);
        builder
    }

    pub fn command(mut self, command: Arc<dyn Command>) -> Self {
        self.commands.insert(command.name().to_string(), command);
        self
    }

    pub fn child(mut self, child: NodeBuilder) -> Self {
        self.children.push(child);
        self
    }
}

pub struct ShellNode {
    name: String,
    description: String,
    commands: IndexMap<String, Arc<dyn Command>>,
    children: IndexMap<String, NodeId>,
    module: Option<Box<dyn Module>>,
    inherited: IndexMap<String, Arc<dyn Command>>,
    parent: Option<NodeId>,
}

impl ShellNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn commands(&self) -> &IndexMap<String, Arc<dyn Command>> {
        &self.commands
    }

    pub fn children(&self) -> &IndexMap<String, NodeId> {
        &self.children
    }

    /// Ancestor commands materialized at construction.
    pub fn inherited(&self) -> &IndexMap<String, Arc<dyn Command>> {
        &self.inherited
    }

    pub fn module(&self) -> Option<&dyn Module> {
        self.module.as_deref()
    }

    pub(crate) fn module_mut(&mut self) -> Option<&mut Box<dyn Module>> {
        self.module.as_mut()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Resolve an action command: own table first, then inherited.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(name).or_else(|| self.inherited.get(name)).cloned()
    }
}

/// Arena of shell nodes; index 0 is the root.
pub struct ShellTree {
    nodes: Vec<ShellNode>,
}

impl ShellTree {
    pub const ROOT: NodeId = NodeId(0);

    pub fn build(root: NodeBuilder) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.flatten(root, None, IndexMap::new());
        tree
    }

    fn flatten(
        &mut self,
        builder: NodeBuilder,
        parent: Option<NodeId>,
        inherited: IndexMap<String, Arc<dyn Command>>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());

        // Children inherit everything visible here plus this node's own
        // commands; the root's own commands are the global set.
        let mut passed_down = inherited.clone();
        for (name, command) in &builder.commands {
            passed_down.insert(name.clone(), command.clone());
        }

        self.nodes.push(ShellNode {
            name: builder.name,
            description: builder.description,
            commands: builder.commands,
            children: IndexMap::new(),
            module: builder.module,
            inherited,
            parent,
        });

        for child in builder.children {
            let child_name = child.name.clone();
            let child_id = self.flatten(child, Some(id), passed_down.clone());
            self.nodes[id.0].children.insert(child_name, child_id);
        }

        id
    }

    pub fn node(&self, id: NodeId) -> &ShellNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut ShellNode {
        &mut self.nodes[id.0]
    }

    pub fn root(&self) -> &ShellNode {
        self.node(Self::ROOT)
    }
}
