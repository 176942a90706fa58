//! Dependency tree construction and printing.
//!
//! Dependencies that are themselves recipes in the repository are configured
//! and expanded recursively; everything else is a leaf showing the merged
//! constraint placed on it.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use fxpkg_core::dependency::{UsageType, VariantRequirement};
use fxpkg_core::host::HostFacts;
use fxpkg_core::recipe::Recipe;
use fxpkg_core::repository::Repository;
use fxpkg_core::request::Request;
use fxpkg_util::errors::{FxError, FxResult};

use crate::constraint::DependencyConstraint;
use crate::resolver::configure;

/// A node in the dependency tree.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct TreeNode {
    pub name: String,
    /// The pinned request for recipes, the merged spec for leaves.
    pub label: String,
    pub recipe: bool,
}

impl TreeNode {
    /// Recipes appear once per tree; leaves once per distinct constraint.
    fn key(&self) -> String {
        if self.recipe {
            self.name.clone()
        } else {
            self.label.clone()
        }
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Edge label: how the parent uses the child.
#[derive(Debug, Clone)]
pub struct TreeEdge {
    pub usage: BTreeSet<UsageType>,
}

impl fmt::Display for TreeEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let usage: Vec<String> = self.usage.iter().map(|u| u.to_string()).collect();
        write!(f, "[{}]", usage.join(","))
    }
}

/// A dependency tree backed by petgraph.
pub struct DependencyTree {
    graph: DiGraph<TreeNode, TreeEdge>,
    index: HashMap<String, NodeIndex>,
    pub root: Option<NodeIndex>,
}

impl DependencyTree {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            root: None,
        }
    }

    /// Add or retrieve a node. Returns the index and whether it is new.
    pub fn add_node(&mut self, node: TreeNode) -> (NodeIndex, bool) {
        let key = node.key();
        if let Some(&idx) = self.index.get(&key) {
            return (idx, false);
        }
        let idx = self.graph.add_node(node);
        self.index.insert(key, idx);
        (idx, true)
    }

    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, edge: TreeEdge) {
        if !self.graph.edges(from).any(|e| e.target() == to) {
            self.graph.add_edge(from, to, edge);
        }
    }

    /// Look up a recipe node by package name, or a leaf by its label.
    pub fn find(&self, key: &str) -> Option<NodeIndex> {
        self.index.get(key).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &TreeNode {
        &self.graph[idx]
    }

    /// Direct dependencies of a node, in insertion order.
    pub fn dependencies_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, &TreeEdge)> {
        let mut deps: Vec<(NodeIndex, &TreeEdge)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.target(), e.weight()))
            .collect();
        // petgraph yields outgoing edges newest first
        deps.reverse();
        deps
    }

    /// Print the tree, optionally cut off below `max_depth`.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = String::new();
        let Some(root) = self.root else {
            return output;
        };
        output.push_str(&format!("{}\n", self.graph[root]));

        let mut visited = HashSet::new();
        visited.insert(root);
        let deps = self.dependencies_of(root);
        let count = deps.len();
        for (i, (idx, edge)) in deps.iter().enumerate() {
            let is_last = i == count - 1;
            self.print_subtree(&mut output, *idx, edge, "", is_last, 1, max_depth, &mut visited);
        }
        output
    }

    #[allow(clippy::too_many_arguments)]
    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        edge: &TreeEdge,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let node = &self.graph[idx];
        output.push_str(&format!("{prefix}{connector}{node} {edge}\n"));

        if max_depth.is_some_and(|max| depth >= max) {
            return;
        }
        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let deps = self.dependencies_of(idx);
        let count = deps.len();
        for (i, (child, child_edge)) in deps.iter().enumerate() {
            let is_last = i == count - 1;
            self.print_subtree(
                output,
                *child,
                child_edge,
                &child_prefix,
                is_last,
                depth + 1,
                max_depth,
                visited,
            );
        }

        visited.remove(&idx);
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

impl Default for DependencyTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Configure `request` and expand every dependency that has a recipe in
/// `repo`, breadth first. Each recipe is configured once.
pub fn build_tree(
    repo: &Repository,
    request: &Request,
    host: &HostFacts,
) -> FxResult<DependencyTree> {
    let mut tree = DependencyTree::new();
    let mut queue: VecDeque<(NodeIndex, Request)> = VecDeque::new();

    let recipe = repo.get(&request.name)?;
    let configured = configure(recipe, request, host)?;
    let pinned = request
        .clone()
        .version(configured.config.version.version.clone());
    let (root, _) = tree.add_node(recipe_node(&pinned));
    tree.root = Some(root);
    expand(repo, host, &mut tree, &mut queue, root, &configured.dependencies)?;

    while let Some((parent, child_request)) = queue.pop_front() {
        let recipe = repo.get(&child_request.name)?;
        let configured = configure(recipe, &child_request, host)?;
        tracing::debug!("expanded {}", configured.config.spec());
        expand(repo, host, &mut tree, &mut queue, parent, &configured.dependencies)?;
    }
    Ok(tree)
}

fn expand(
    repo: &Repository,
    host: &HostFacts,
    tree: &mut DependencyTree,
    queue: &mut VecDeque<(NodeIndex, Request)>,
    parent: NodeIndex,
    dependencies: &[DependencyConstraint],
) -> FxResult<()> {
    for constraint in dependencies {
        let edge = TreeEdge {
            usage: constraint.usage.clone(),
        };
        match repo.find(&constraint.name) {
            Some(recipe) => {
                let request = child_request(recipe, constraint, host)?;
                let (idx, new) = tree.add_node(recipe_node(&request));
                tree.add_edge(parent, idx, edge);
                if new {
                    queue.push_back((idx, request));
                }
            }
            None => {
                let (idx, _) = tree.add_node(leaf_node(constraint));
                tree.add_edge(parent, idx, edge);
            }
        }
    }
    Ok(())
}

/// The request that configures a dependency recipe under `constraint`.
///
/// An installed version reported by the host wins when the recipe declares
/// it; otherwise the best declared version inside the constraint is used.
fn child_request(
    recipe: &Recipe,
    constraint: &DependencyConstraint,
    host: &HostFacts,
) -> FxResult<Request> {
    let installed = host
        .dependency(&constraint.name)
        .and_then(|facts| facts.version.as_ref())
        .and_then(|v| recipe.find_version(v));
    let decl = installed
        .or_else(|| recipe.best_version(&constraint.versions))
        .ok_or_else(|| FxError::UnsatisfiableConstraint {
            dependency: constraint.name.clone(),
            message: format!(
                "no declared version satisfies '{}' (declared: {})",
                constraint.versions,
                recipe.declared_versions()
            ),
        })?;

    let mut request = Request::new(&recipe.name).version(decl.version.clone());
    for (name, requirement) in &constraint.variants {
        request = match requirement {
            VariantRequirement::Flag(enabled) => request.flag(name, *enabled),
            VariantRequirement::Values { include, .. } if !include.is_empty() => {
                let values: Vec<&str> = include.iter().map(String::as_str).collect();
                request.value(name, &values)
            }
            VariantRequirement::Values { .. } => request,
        };
    }
    Ok(request)
}

fn recipe_node(request: &Request) -> TreeNode {
    TreeNode {
        name: request.name.clone(),
        label: request.to_string(),
        recipe: true,
    }
}

fn leaf_node(constraint: &DependencyConstraint) -> TreeNode {
    TreeNode {
        name: constraint.name.clone(),
        label: constraint.spec(),
        recipe: false,
    }
}
