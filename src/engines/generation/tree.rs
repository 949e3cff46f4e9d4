use crate::error::{Result, SymregError};
use crate::types::{FunctionSymbol, Terminal};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a node within its owning tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Node payload: a function application with fixed-arity child slots, or a
/// terminal. Slots are `None` only while a tree is under construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Func {
        symbol: FunctionSymbol,
        children: Vec<Option<NodeId>>,
    },
    Term(Terminal),
}

/// A single tree node. `parent`/`nth_child` form a non-owning back-reference:
/// for every non-root node, `tree[parent].children[nth_child]` points back at
/// it. Only [`Tree`] methods may alter links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub nth_child: usize,
}

const NO_CHILDREN: &[Option<NodeId>] = &[];

impl Node {
    pub fn func(symbol: FunctionSymbol) -> Self {
        Self {
            kind: NodeKind::Func {
                symbol,
                children: vec![None; symbol.arity()],
            },
            parent: None,
            nth_child: 0,
        }
    }

    pub fn terminal(term: Terminal) -> Self {
        Self {
            kind: NodeKind::Term(term),
            parent: None,
            nth_child: 0,
        }
    }

    pub fn constant(value: f64) -> Self {
        Self::terminal(Terminal::Constant(value))
    }

    pub fn input(name: impl Into<String>) -> Self {
        Self::terminal(Terminal::Input(name.into()))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, NodeKind::Term(_))
    }

    pub fn symbol(&self) -> Option<FunctionSymbol> {
        match &self.kind {
            NodeKind::Func { symbol, .. } => Some(*symbol),
            NodeKind::Term(_) => None,
        }
    }

    /// Child-slot count; zero for terminals.
    pub fn arity(&self) -> usize {
        match &self.kind {
            NodeKind::Func { children, .. } => children.len(),
            NodeKind::Term(_) => 0,
        }
    }

    pub fn child_slots(&self) -> &[Option<NodeId>] {
        match &self.kind {
            NodeKind::Func { children, .. } => children,
            NodeKind::Term(_) => NO_CHILDREN,
        }
    }

    fn set_child(&mut self, index: usize, id: NodeId) {
        if let NodeKind::Func { children, .. } = &mut self.kind {
            children[index] = Some(id);
        }
    }

    fn clear_children(&mut self) {
        if let NodeKind::Func { children, .. } = &mut self.kind {
            children.iter_mut().for_each(|slot| *slot = None);
        }
    }

    fn shift_children(&mut self, offset: usize) {
        if let NodeKind::Func { children, .. } = &mut self.kind {
            for slot in children.iter_mut() {
                if let Some(id) = slot {
                    *slot = Some(NodeId(id.0 + offset));
                }
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Func { symbol, children } => {
                write!(f, "func: {}\tarity: {}", symbol, children.len())
            }
            NodeKind::Term(term) => write!(f, "data: {}", term),
        }
    }
}

/// Detached subtree in local pre-order, produced and consumed by crossover.
#[derive(Debug, Clone)]
pub(crate) struct Fragment {
    nodes: Vec<Node>,
}

/// Expression tree backed by a node arena.
///
/// `size` and `depth` are maintained during construction and go stale under
/// crossover; [`Tree::refresh`] recomputes them (and compacts the arena).
/// `error`/`score` hold the last RMSE written by the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
    pub size: usize,
    pub depth: usize,
    pub error: f64,
    pub score: f64,
}

impl Tree {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            size: 0,
            depth: 0,
            error: 0.0,
            score: 0.0,
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Installs the root of an empty tree.
    pub fn set_root(&mut self, node: Node) -> Result<NodeId> {
        if self.root.is_some() {
            return Err(SymregError::Precondition(
                "tree already has a root".to_string(),
            ));
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.root = Some(id);
        self.size += 1;
        self.depth = 1;
        Ok(id)
    }

    /// Attaches `node` as the `index`-th child of `parent`, wiring the
    /// back-reference. This and [`Tree::set_root`] are the only ways to grow
    /// a tree.
    pub fn attach(&mut self, parent: NodeId, index: usize, mut node: Node) -> Result<NodeId> {
        let arity = self
            .nodes
            .get(parent.0)
            .map(Node::arity)
            .ok_or_else(|| SymregError::Precondition("parent id out of range".to_string()))?;
        if arity == 0 {
            return Err(SymregError::Precondition(
                "cannot attach a child to a terminal node".to_string(),
            ));
        }
        if index >= arity {
            return Err(SymregError::Precondition(format!(
                "child index {} out of range for arity {}",
                index, arity
            )));
        }
        if self.nodes[parent.0].child_slots()[index].is_some() {
            return Err(SymregError::Precondition(format!(
                "child slot {} already occupied",
                index
            )));
        }
        node.parent = Some(parent);
        node.nth_child = index;
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.nodes[parent.0].set_child(index, id);
        self.size += 1;
        Ok(id)
    }

    /// Pre-order linearization: root first, children left-to-right.
    /// Deterministic for an unmutated tree; indexed node access and the
    /// genetic operators both address nodes through this order.
    pub fn linearize(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut pending = Vec::new();
        if let Some(root) = self.root {
            pending.push(root);
        }
        while let Some(id) = pending.pop() {
            order.push(id);
            for slot in self.nodes[id.0].child_slots().iter().rev() {
                if let Some(child) = slot {
                    pending.push(*child);
                }
            }
        }
        order
    }

    /// Node at position `index` of the linearization (0 = root).
    pub fn node_at(&self, index: usize) -> Option<&Node> {
        self.linearize().get(index).map(|id| self.node(*id))
    }

    /// Recomputes `size` and `depth` from the live topology and compacts the
    /// arena, dropping nodes orphaned by crossover. `depth` follows the
    /// construction convention: a lone root counts 1, and the terminal rank
    /// added at the depth limit is not counted.
    pub fn refresh(&mut self) {
        let Some(root) = self.root else {
            self.nodes.clear();
            self.size = 0;
            self.depth = 0;
            return;
        };
        let mut nodes: Vec<Node> = Vec::with_capacity(self.nodes.len());
        let mut max_level = 0usize;
        let mut pending: Vec<(NodeId, Option<NodeId>, usize, usize)> = vec![(root, None, 0, 1)];
        while let Some((old, parent, nth, level)) = pending.pop() {
            let new_id = NodeId(nodes.len());
            let mut node = self.nodes[old.0].clone();
            node.parent = parent;
            node.nth_child = nth;
            node.clear_children();
            nodes.push(node);
            if let Some(p) = parent {
                nodes[p.0].set_child(nth, new_id);
            }
            max_level = max_level.max(level);
            for (i, slot) in self.nodes[old.0].child_slots().iter().enumerate().rev() {
                if let Some(child) = slot {
                    pending.push((*child, Some(new_id), i, level + 1));
                }
            }
        }
        self.nodes = nodes;
        self.root = Some(NodeId(0));
        self.size = self.nodes.len();
        self.depth = max_level.saturating_sub(1).max(1);
    }

    /// Checks the parent/position invariant for every reachable node.
    pub fn validate(&self) -> Result<()> {
        let Some(root) = self.root else {
            return Ok(());
        };
        if self.nodes[root.0].parent.is_some() {
            return Err(SymregError::Precondition(
                "root node has a parent".to_string(),
            ));
        }
        for id in self.linearize() {
            let node = &self.nodes[id.0];
            if let Some(parent) = node.parent {
                let slot = self.nodes[parent.0]
                    .child_slots()
                    .get(node.nth_child)
                    .copied()
                    .flatten();
                if slot != Some(id) {
                    return Err(SymregError::Precondition(format!(
                        "node {} back-reference does not match its parent slot",
                        id.0
                    )));
                }
            } else if id != root {
                return Err(SymregError::Precondition(format!(
                    "non-root node {} has no parent",
                    id.0
                )));
            }
            for (i, slot) in node.child_slots().iter().enumerate() {
                if let Some(child) = slot {
                    let child_node = &self.nodes[child.0];
                    if child_node.parent != Some(id) || child_node.nth_child != i {
                        return Err(SymregError::Precondition(format!(
                            "child {} of node {} carries a stale back-reference",
                            i, id.0
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Prefix-notation rendering, e.g. `ADD 1 x`.
    pub fn equation(&self) -> String {
        let tokens: Vec<String> = self
            .linearize()
            .into_iter()
            .map(|id| match &self.nodes[id.0].kind {
                NodeKind::Func { symbol, .. } => symbol.to_string(),
                NodeKind::Term(term) => term.to_string(),
            })
            .collect();
        tokens.join(" ")
    }

    /// Copies the subtree rooted at `id` out into a standalone fragment.
    pub(crate) fn extract_fragment(&self, id: NodeId) -> Fragment {
        let mut nodes = Vec::new();
        self.copy_subtree(id, None, 0, &mut nodes);
        Fragment { nodes }
    }

    fn copy_subtree(
        &self,
        id: NodeId,
        parent: Option<NodeId>,
        nth: usize,
        out: &mut Vec<Node>,
    ) -> NodeId {
        let new_id = NodeId(out.len());
        let mut node = self.nodes[id.0].clone();
        node.parent = parent;
        node.nth_child = nth;
        node.clear_children();
        out.push(node);
        for (i, slot) in self.nodes[id.0].child_slots().iter().enumerate() {
            if let Some(child) = slot {
                let new_child = self.copy_subtree(*child, Some(new_id), i, out);
                out[new_id.0].set_child(i, new_child);
            }
        }
        new_id
    }

    /// Splices a fragment into the given child slot, overwriting it. The
    /// previous occupant becomes unreachable until [`Tree::refresh`] compacts
    /// the arena; `size`/`depth` are left stale on purpose.
    pub(crate) fn graft(
        &mut self,
        parent: NodeId,
        index: usize,
        fragment: Fragment,
    ) -> Result<NodeId> {
        let arity = self
            .nodes
            .get(parent.0)
            .map(Node::arity)
            .ok_or_else(|| SymregError::Precondition("parent id out of range".to_string()))?;
        if index >= arity {
            return Err(SymregError::Precondition(format!(
                "child index {} out of range for arity {}",
                index, arity
            )));
        }
        if fragment.nodes.is_empty() {
            return Err(SymregError::Precondition(
                "cannot graft an empty fragment".to_string(),
            ));
        }
        let offset = self.nodes.len();
        for mut node in fragment.nodes {
            node.parent = node.parent.map(|p| NodeId(p.0 + offset));
            node.shift_children(offset);
            self.nodes.push(node);
        }
        let new_root = NodeId(offset);
        self.nodes[new_root.0].parent = Some(parent);
        self.nodes[new_root.0].nth_child = index;
        self.nodes[parent.0].set_child(index, new_root);
        Ok(new_root)
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.equation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_const_input() -> Tree {
        let mut tree = Tree::new();
        let root = tree.set_root(Node::func(FunctionSymbol::Add)).unwrap();
        tree.attach(root, 0, Node::constant(1.0)).unwrap();
        tree.attach(root, 1, Node::input("x")).unwrap();
        tree
    }

    #[test]
    fn attach_maintains_back_references() {
        let tree = add_const_input();
        assert_eq!(tree.size, 3);
        tree.validate().unwrap();
        let root = tree.root().unwrap();
        for (i, slot) in tree.node(root).child_slots().iter().enumerate() {
            let child = tree.node(slot.unwrap());
            assert_eq!(child.parent, Some(root));
            assert_eq!(child.nth_child, i);
        }
    }

    #[test]
    fn attach_rejects_out_of_range_slot() {
        let mut tree = Tree::new();
        let root = tree.set_root(Node::func(FunctionSymbol::Exp)).unwrap();
        assert!(tree.attach(root, 1, Node::constant(0.0)).is_err());
    }

    #[test]
    fn attach_rejects_occupied_slot() {
        let mut tree = Tree::new();
        let root = tree.set_root(Node::func(FunctionSymbol::Exp)).unwrap();
        tree.attach(root, 0, Node::constant(0.0)).unwrap();
        assert!(tree.attach(root, 0, Node::constant(1.0)).is_err());
    }

    #[test]
    fn attach_rejects_terminal_parent() {
        let mut tree = Tree::new();
        let root = tree.set_root(Node::constant(1.0)).unwrap();
        assert!(tree.attach(root, 0, Node::constant(0.0)).is_err());
    }

    #[test]
    fn linearization_is_pre_order_and_stable() {
        let tree = add_const_input();
        let order = tree.linearize();
        assert_eq!(order.len(), tree.size);
        assert_eq!(order[0], tree.root().unwrap());
        assert!(tree.node(order[0]).symbol().is_some());
        assert_eq!(tree.node(order[1]).kind, NodeKind::Term(Terminal::Constant(1.0)));
        assert_eq!(
            tree.node(order[2]).kind,
            NodeKind::Term(Terminal::Input("x".to_string()))
        );
        assert_eq!(order, tree.linearize());
        assert_eq!(tree.node_at(0).unwrap().symbol(), Some(FunctionSymbol::Add));
        assert!(tree.node_at(3).is_none());
    }

    #[test]
    fn equation_renders_prefix_notation() {
        let tree = add_const_input();
        assert_eq!(tree.equation(), "ADD 1 x");
    }

    #[test]
    fn refresh_recomputes_size_and_depth() {
        // EXP(ADD(1, x)): levels root=1, ADD=2, terminals=3 -> depth 2
        let mut tree = Tree::new();
        let root = tree.set_root(Node::func(FunctionSymbol::Exp)).unwrap();
        let add = tree.attach(root, 0, Node::func(FunctionSymbol::Add)).unwrap();
        tree.attach(add, 0, Node::constant(1.0)).unwrap();
        tree.attach(add, 1, Node::input("x")).unwrap();
        tree.size = 0;
        tree.depth = 0;
        tree.refresh();
        assert_eq!(tree.size, 4);
        assert_eq!(tree.depth, 2);
        tree.validate().unwrap();
    }

    #[test]
    fn graft_transfers_fragment_and_refresh_compacts() {
        let mut a = add_const_input();
        let mut b = Tree::new();
        let b_root = b.set_root(Node::func(FunctionSymbol::Exp)).unwrap();
        b.attach(b_root, 0, Node::constant(5.0)).unwrap();

        // Replace a's second child with b's whole EXP subtree.
        let fragment = b.extract_fragment(b.root().unwrap());
        let a_root = a.root().unwrap();
        a.graft(a_root, 1, fragment).unwrap();
        a.refresh();
        a.validate().unwrap();
        assert_eq!(a.equation(), "ADD 1 EXP 5");
        assert_eq!(a.size, 4);
    }
}
