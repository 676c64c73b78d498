//! Lazily expanded call hierarchy trees.
//!
//! Nodes live in an arena and refer to their children by handle, so a
//! node's children are written exactly once, when its expansion resolves,
//! and nothing ever holds a back-reference. Each new root gather starts a
//! new generation; handles from an older tree no longer resolve.

use futures::future::join_all;
use lsp_types::{CallHierarchyItem, Range};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::GatherError;
use crate::lsp::types::url_to_display_path;

use super::dispatch::{Dispatcher, call_params};
use super::item::{Item, ItemData, NavigationTarget, call_site_display};
use super::method::Method;
use super::normalize::{self, CallSite};

/// Stable handle of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    generation: u64,
    index: usize,
}

/// Expansion state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    /// Children never requested.
    Unexpanded,
    /// Requested, none found.
    Leaf,
    /// Requested, children attached.
    Branch,
}

/// One node of the tree.
#[derive(Debug, Clone)]
pub struct CallNode {
    /// The protocol item children are requested for.
    pub item: CallHierarchyItem,
    /// Call site this node was reached through; `None` for roots.
    pub call_site: Option<Range>,
    /// `/root/child/...`
    pub tree_path: String,
    /// Child handles, in response order.
    pub children: Vec<NodeId>,
    /// Expansion state.
    pub expansion: Expansion,
}

impl CallNode {
    fn to_item(&self, id: NodeId) -> Item {
        let path = url_to_display_path(&self.item.uri);
        let (display, range) = match &self.call_site {
            Some(site) => (Some(call_site_display(&self.item.name, site)), *site),
            None => (None, self.item.selection_range),
        };
        Item {
            word: self.item.name.clone(),
            display,
            action: NavigationTarget::Location { path, range },
            tree_path: Some(self.tree_path.clone()),
            is_tree: Some(self.expansion == Expansion::Branch),
            node: Some(id),
            data: ItemData::Call(self.item.clone()),
        }
    }
}

/// Arena holding one call hierarchy.
#[derive(Debug)]
pub struct CallTree {
    generation: u64,
    direction: Method,
    nodes: Vec<CallNode>,
}

impl CallTree {
    /// Creates an empty tree expanding along `direction`
    /// (incoming or outgoing calls).
    pub fn new(generation: u64, direction: Method) -> Self {
        debug_assert!(direction.is_call_hierarchy());
        Self {
            generation,
            direction,
            nodes: Vec::new(),
        }
    }

    /// Generation of this tree.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Incoming or outgoing calls.
    pub fn direction(&self) -> Method {
        self.direction
    }

    /// Looks a node up; stale handles resolve to `None`.
    pub fn node(&self, id: NodeId) -> Option<&CallNode> {
        if id.generation != self.generation {
            return None;
        }
        self.nodes.get(id.index)
    }

    fn push(&mut self, node: CallNode) -> NodeId {
        let id = NodeId {
            generation: self.generation,
            index: self.nodes.len(),
        };
        self.nodes.push(node);
        id
    }

    /// Adds a root with path `/{name}`.
    pub fn add_root(&mut self, item: CallHierarchyItem) -> NodeId {
        self.push(CallNode {
            tree_path: format!("/{}", item.name),
            item,
            call_site: None,
            children: Vec::new(),
            expansion: Expansion::Unexpanded,
        })
    }

    /// Records the outcome of expanding `id`.
    ///
    /// Only an unexpanded node is written; later calls are ignored.
    pub fn attach(&mut self, id: NodeId, sites: Vec<CallSite>) {
        let Some(parent) = self.node(id) else {
            return;
        };
        if parent.expansion != Expansion::Unexpanded {
            debug!(tree_path = %parent.tree_path, "node already expanded");
            return;
        }
        let parent_path = parent.tree_path.clone();

        let children: Vec<NodeId> = sites
            .into_iter()
            .map(|site| {
                self.push(CallNode {
                    tree_path: format!("{parent_path}/{}", site.item.name),
                    item: site.item,
                    call_site: Some(site.range),
                    children: Vec::new(),
                    expansion: Expansion::Unexpanded,
                })
            })
            .collect();

        let parent = &mut self.nodes[id.index];
        parent.expansion = if children.is_empty() {
            Expansion::Leaf
        } else {
            Expansion::Branch
        };
        parent.children = children;
    }

    /// Renders a node as an item.
    pub fn item(&self, id: NodeId) -> Option<Item> {
        self.node(id).map(|node| node.to_item(id))
    }
}

/// Expands every node of `ids` one level and returns them as items, in
/// the order given.
///
/// Children of unexpanded nodes are requested concurrently and the tree
/// is only touched once every request has resolved. Nodes that are
/// already expanded are returned as they are.
pub async fn expand(
    tree: &Mutex<CallTree>,
    dispatcher: Dispatcher<'_>,
    ids: &[NodeId],
) -> Vec<Item> {
    let (direction, pending) = {
        let tree = tree.lock().await;
        let pending: Vec<(NodeId, CallHierarchyItem)> = ids
            .iter()
            .filter_map(|&id| {
                let node = tree.node(id)?;
                (node.expansion == Expansion::Unexpanded).then(|| (id, node.item.clone()))
            })
            .collect();
        (tree.direction(), pending)
    };

    let resolved = join_all(pending.into_iter().map(|(id, item)| async move {
        match dispatcher.send(direction.into(), call_params(&item)).await {
            Ok(response) => Some((id, normalize::calls(response))),
            Err(GatherError::EmptyResult) => Some((id, Vec::new())),
            Err(e) => {
                e.log(direction.as_str());
                None
            }
        }
    }))
    .await;

    let mut tree = tree.lock().await;
    for (id, sites) in resolved.into_iter().flatten() {
        tree.attach(id, sites);
    }
    ids.iter().filter_map(|&id| tree.item(id)).collect()
}

/// Handles of a node's children; empty for leaves and stale handles.
pub async fn children(tree: &Mutex<CallTree>, id: NodeId) -> Option<Vec<NodeId>> {
    let tree = tree.lock().await;
    tree.node(id).map(|node| node.children.clone())
}
