use std::collections::HashMap;

use formloom_core::{AppError, AppResult, ModuleName, NonEmptyString};

use crate::field::FieldDefinition;
use crate::field_option::{FieldOption, resolve_options};

/// Separator between identifiers in a node path.
pub const PATH_SEPARATOR: &str = ".";

/// Stable address of a node inside one [`ModuleHierarchy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(usize);

/// Runtime wrapper around a field definition with its tree links.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldNode {
    definition: FieldDefinition,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
    resolved_options: Option<Vec<FieldOption>>,
}

impl FieldNode {
    /// Returns the wrapped definition.
    #[must_use]
    pub fn definition(&self) -> &FieldDefinition {
        &self.definition
    }

    /// Returns the field identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        self.definition.id()
    }

    /// Returns the navigational parent.
    #[must_use]
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Returns children ordered by `(order, id)`.
    #[must_use]
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    /// Returns options cached from a CodeSet provider.
    #[must_use]
    pub fn resolved_options(&self) -> Option<&[FieldOption]> {
        self.resolved_options.as_deref()
    }

    /// Returns the options a user can select for this field.
    #[must_use]
    pub fn effective_options(&self) -> &[FieldOption] {
        resolve_options(&self.definition, self.resolved_options())
    }
}

/// Arena of all field nodes of one module.
///
/// Nodes are never removed. Parent links are keys and each node owns the ordered
/// list of its children's keys. Keys outside the arena resolve to nothing. Depth and path are derived from the parent chain
/// on every read. [`ModuleHierarchy::attach`] refuses links that would make a
/// node its own ancestor, so the arena is always a forest.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleHierarchy {
    module_name: ModuleName,
    nodes: Vec<FieldNode>,
    index: HashMap<String, NodeKey>,
    roots: Vec<NodeKey>,
}

impl ModuleHierarchy {
    /// Creates an empty hierarchy.
    #[must_use]
    pub fn new(module_name: ModuleName) -> Self {
        Self {
            module_name,
            nodes: Vec::new(),
            index: HashMap::new(),
            roots: Vec::new(),
        }
    }

    /// Returns the owning module name.
    #[must_use]
    pub fn module_name(&self) -> &ModuleName {
        &self.module_name
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the hierarchy has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns whether a field identifier exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Looks up the key of a field identifier.
    #[must_use]
    pub fn key_of(&self, id: &str) -> Option<NodeKey> {
        self.index.get(id).copied()
    }

    /// Looks up a node by field identifier.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&FieldNode> {
        self.key_of(id).and_then(|key| self.node(key))
    }

    /// Returns a node by key.
    #[must_use]
    pub fn node(&self, key: NodeKey) -> Option<&FieldNode> {
        self.nodes.get(key.0)
    }

    /// Returns the navigational parent of a node.
    #[must_use]
    pub fn parent_of(&self, key: NodeKey) -> Option<NodeKey> {
        self.node(key).and_then(FieldNode::parent)
    }

    /// Returns the ordered children of a node.
    #[must_use]
    pub fn children_of(&self, key: NodeKey) -> &[NodeKey] {
        self.node(key).map(FieldNode::children).unwrap_or_default()
    }

    /// Returns root nodes ordered by `(order, id)`.
    #[must_use]
    pub fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    /// Iterates over every key in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = NodeKey> + use<> {
        (0..self.nodes.len()).map(NodeKey)
    }

    /// Iterates over every node in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &FieldNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(position, node)| (NodeKey(position), node))
    }

    /// Adds a detached field as a root.
    ///
    /// The stored parent identifier is kept untouched until the node is attached
    /// or detached.
    pub fn insert(&mut self, definition: FieldDefinition) -> AppResult<NodeKey> {
        if self.index.contains_key(definition.id()) {
            return Err(AppError::Conflict(format!(
                "field '{}' already exists in module '{}'",
                definition.id(),
                self.module_name
            )));
        }

        let key = NodeKey(self.nodes.len());
        self.index.insert(definition.id().to_owned(), key);
        self.nodes.push(FieldNode {
            definition,
            parent: None,
            children: Vec::new(),
            resolved_options: None,
        });
        self.insert_sorted(None, key);

        Ok(key)
    }

    /// Moves `child` under `parent`, updating the stored parent identifier.
    pub fn attach(&mut self, child: NodeKey, parent: NodeKey) -> AppResult<()> {
        let (Some(child_node), Some(parent_node)) = (self.node(child), self.node(parent)) else {
            return Err(AppError::NotFound(format!(
                "node is not part of module '{}'",
                self.module_name
            )));
        };
        if child == parent || self.is_ancestor(child, parent) {
            return Err(AppError::Conflict(format!(
                "attaching '{}' under '{}' would create a circular reference",
                child_node.id(),
                parent_node.id()
            )));
        }

        let parent_id = NonEmptyString::new(parent_node.id())?;
        self.unlink(child);
        let node = &mut self.nodes[child.0];
        node.parent = Some(parent);
        node.definition = node.definition.with_parent_id(Some(parent_id));
        self.insert_sorted(Some(parent), child);

        Ok(())
    }

    /// Makes `child` a root, clearing the stored parent identifier.
    ///
    /// Keys outside the arena are ignored.
    pub fn detach(&mut self, child: NodeKey) {
        if self.node(child).is_none() {
            return;
        }
        self.unlink(child);
        let node = &mut self.nodes[child.0];
        node.parent = None;
        node.definition = node.definition.with_parent_id(None);
        self.insert_sorted(None, child);
    }

    /// Swaps the definition of an existing field without rewiring the tree.
    ///
    /// A changed parent identifier is not applied to the navigation links; the
    /// hierarchy reports it as stale until it is rebuilt.
    pub fn replace_definition(&mut self, definition: FieldDefinition) -> AppResult<()> {
        let key = self.key_of(definition.id()).ok_or_else(|| {
            AppError::NotFound(format!(
                "field '{}' does not exist in module '{}'",
                definition.id(),
                self.module_name
            ))
        })?;

        let reorder = self.slot(key).definition.order() != definition.order();
        self.nodes[key.0].definition = definition;
        if reorder {
            let parent = self.slot(key).parent;
            self.unlink(key);
            self.insert_sorted(parent, key);
        }

        Ok(())
    }

    /// Caches options resolved from a CodeSet on a node.
    pub fn set_resolved_options(&mut self, key: NodeKey, options: Option<Vec<FieldOption>>) {
        if let Some(node) = self.nodes.get_mut(key.0) {
            node.resolved_options = options;
        }
    }

    /// Returns the number of ancestors of a node.
    #[must_use]
    pub fn depth(&self, key: NodeKey) -> usize {
        self.ancestors(key).len()
    }

    /// Returns the dot-joined identifiers from the root down to the node.
    #[must_use]
    pub fn path(&self, key: NodeKey) -> String {
        let Some(node) = self.node(key) else {
            return String::new();
        };
        let mut segments: Vec<&str> = self
            .ancestors(key)
            .into_iter()
            .map(|ancestor| self.slot(ancestor).id())
            .collect();
        segments.reverse();
        segments.push(node.id());
        segments.join(PATH_SEPARATOR)
    }

    /// Returns ancestors from the direct parent up to the root.
    #[must_use]
    pub fn ancestors(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut ancestors = Vec::new();
        let mut current = self.parent_of(key);
        while let Some(parent) = current {
            if ancestors.len() >= self.nodes.len() {
                break;
            }
            ancestors.push(parent);
            current = self.slot(parent).parent;
        }
        ancestors
    }

    /// Returns whether `ancestor` appears on the parent chain of `key`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeKey, key: NodeKey) -> bool {
        self.ancestors(key).contains(&ancestor)
    }

    /// Returns all descendants in pre-order.
    #[must_use]
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut descendants = Vec::new();
        let mut stack: Vec<NodeKey> = self.children_of(key).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            descendants.push(current);
            stack.extend(self.slot(current).children.iter().rev().copied());
        }
        descendants
    }

    /// Returns the other children of the node's parent, or the other roots.
    #[must_use]
    pub fn siblings(&self, key: NodeKey) -> Vec<NodeKey> {
        let Some(node) = self.node(key) else {
            return Vec::new();
        };
        self.sibling_list(node.parent)
            .iter()
            .copied()
            .filter(|sibling| *sibling != key)
            .collect()
    }

    /// Returns the number of levels below the node, zero for a leaf.
    #[must_use]
    pub fn subtree_height(&self, key: NodeKey) -> usize {
        let base = self.depth(key);
        self.descendants(key)
            .into_iter()
            .map(|descendant| self.depth(descendant) - base)
            .max()
            .unwrap_or(0)
    }

    /// Resolves a dot-joined path starting at a root.
    #[must_use]
    pub fn find_by_path(&self, path: &str) -> Option<NodeKey> {
        let mut segments = path.split(PATH_SEPARATOR);
        let first = segments.next()?;
        let mut current = self
            .roots
            .iter()
            .copied()
            .find(|root| self.slot(*root).id() == first)?;

        for segment in segments {
            current = self
                .slot(current)
                .children
                .iter()
                .copied()
                .find(|child| self.slot(*child).id() == segment)?;
        }

        Some(current)
    }

    /// Returns the deepest node depth, zero when empty.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.keys().map(|key| self.depth(key)).max().unwrap_or(0)
    }

    /// Returns every key in pre-order: roots in order, each followed by its subtree.
    #[must_use]
    pub fn pre_order(&self) -> Vec<NodeKey> {
        let mut ordered = Vec::with_capacity(self.nodes.len());
        for root in &self.roots {
            ordered.push(*root);
            ordered.extend(self.descendants(*root));
        }
        ordered
    }

    /// Converts the tree back to its flat storage form in pre-order.
    #[must_use]
    pub fn flatten(&self) -> Vec<FieldDefinition> {
        self.pre_order()
            .into_iter()
            .map(|key| self.slot(key).definition.clone())
            .collect()
    }

    // Keys held in the arena's own links always resolve.
    fn slot(&self, key: NodeKey) -> &FieldNode {
        &self.nodes[key.0]
    }

    fn sibling_list(&self, parent: Option<NodeKey>) -> &[NodeKey] {
        match parent {
            Some(parent) => &self.slot(parent).children,
            None => &self.roots,
        }
    }

    fn sibling_list_mut(&mut self, parent: Option<NodeKey>) -> &mut Vec<NodeKey> {
        match parent {
            Some(parent) => &mut self.nodes[parent.0].children,
            None => &mut self.roots,
        }
    }

    fn sort_key(&self, key: NodeKey) -> (i32, &str) {
        let definition = &self.slot(key).definition;
        (definition.order(), definition.id())
    }

    fn unlink(&mut self, key: NodeKey) {
        let parent = self.slot(key).parent;
        self.sibling_list_mut(parent).retain(|sibling| *sibling != key);
    }

    fn insert_sorted(&mut self, parent: Option<NodeKey>, key: NodeKey) {
        let position = self
            .sibling_list(parent)
            .partition_point(|sibling| self.sort_key(*sibling) < self.sort_key(key));
        self.sibling_list_mut(parent).insert(position, key);
    }
}
