// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Dependency graph construction and graph views
//!
//! The builder is a single pass over the inventory: every package contributes
//! its regular links (declared dependencies replayed through the resolution
//! table) followed by its peer links, and every local package additionally
//! hangs off the synthetic `root` node.

use crate::error::GraphError;
use crate::manifest::ManifestStore;
use crate::resolution::{DuplicatePolicy, ResolutionIndex};
use crate::types::{
    Graph, GraphLink, LinkKind, Locality, NodeId, PackageLocation, PackageName, PackageRecord,
    PackageUniqKey, ResolutionRecord,
};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// An inventory entry with identity and locality derived at ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Node key `name@version`
    pub key: PackageUniqKey,
    /// Manifest location
    pub location: PackageLocation,
    /// Workspace member or installed dependency
    pub locality: Locality,
}

impl Package {
    /// Derive key and locality for one inventory record
    #[must_use]
    pub fn ingest(record: &PackageRecord, workspace_root: &str) -> Self {
        Self {
            key: record.uniq_key(),
            location: record.location.clone(),
            locality: Locality::of(&record.location, workspace_root),
        }
    }
}

/// Replays a resolution table over an inventory to produce a [`Graph`]
pub struct GraphBuilder<'a, S: ManifestStore + ?Sized> {
    resolutions: &'a ResolutionIndex,
    manifests: &'a S,
    workspace_root: String,
}

impl<'a, S: ManifestStore + ?Sized> GraphBuilder<'a, S> {
    /// Create a builder over a resolution index and a manifest source
    pub fn new(
        resolutions: &'a ResolutionIndex,
        manifests: &'a S,
        workspace_root: impl Into<String>,
    ) -> Self {
        Self {
            resolutions,
            manifests,
            workspace_root: workspace_root.into(),
        }
    }

    /// Derive identity and locality for every record, in inventory order
    #[must_use]
    pub fn ingest(&self, inventory: &[PackageRecord]) -> Vec<Package> {
        inventory
            .iter()
            .map(|record| Package::ingest(record, &self.workspace_root))
            .collect()
    }

    /// Outgoing links of one package: regular links first, then peer links
    pub fn package_links(&self, package: &Package) -> Result<Vec<GraphLink>, GraphError> {
        let manifest = self.manifests.load(&package.location)?;
        let source = NodeId::Package(package.key.clone());

        let dependencies = manifest.declared_dependencies(package.locality);
        let peers = manifest.declared_peer_names(package.locality);
        let mut links = Vec::with_capacity(dependencies.len() + peers.len());

        for (name, range) in &dependencies {
            let target = self.resolutions.resolve(name, range)?;
            links.push(GraphLink::Regular {
                source: source.clone(),
                target: target.into(),
            });
        }

        for name in peers {
            links.push(GraphLink::Peer {
                source: source.clone(),
                target: name,
            });
        }

        debug!(
            "{}: {} regular, {} peer",
            package.key,
            dependencies.len(),
            links.len() - dependencies.len()
        );

        Ok(links)
    }

    /// `root -> package` links for every local package, in inventory order
    #[must_use]
    pub fn root_links(packages: &[Package]) -> Vec<GraphLink> {
        packages
            .iter()
            .filter(|p| p.locality.is_local())
            .map(|p| GraphLink::Regular {
                source: NodeId::Root,
                target: NodeId::Package(p.key.clone()),
            })
            .collect()
    }

    /// Build the full graph; the first failure aborts the whole build
    pub fn build(&self, inventory: &[PackageRecord]) -> Result<Graph, GraphError> {
        let packages = self.ingest(inventory);

        let mut links = Vec::new();
        for package in &packages {
            links.extend(self.package_links(package)?);
        }
        links.extend(Self::root_links(&packages));

        let nodes: Vec<NodeId> = packages
            .into_iter()
            .map(|p| NodeId::Package(p.key))
            .chain(std::iter::once(NodeId::Root))
            .collect();

        info!("Built graph with {} nodes and {} links", nodes.len(), links.len());

        Ok(Graph { nodes, links })
    }
}

/// Index the resolution table and build the graph in one call
pub fn build_graph<S: ManifestStore + ?Sized>(
    inventory: &[PackageRecord],
    resolutions: &[ResolutionRecord],
    policy: DuplicatePolicy,
    manifests: &S,
    workspace_root: &str,
) -> Result<Graph, GraphError> {
    let index = ResolutionIndex::from_records(resolutions, policy)?;
    GraphBuilder::new(&index, manifests, workspace_root).build(inventory)
}

// =============================================================================
// Graph Views
// =============================================================================

/// A vertex of the petgraph view
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Vertex {
    /// A node id (package or root)
    Node(NodeId),
    /// A bare name referenced by peer links
    NameRef(PackageName),
}

impl Vertex {
    /// Display label
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Node(id) => id.as_str(),
            Self::NameRef(name) => name.as_str(),
        }
    }
}

impl Graph {
    /// Number of entries in `nodes`, duplicates included
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of links
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Links leaving a node, in output order
    #[must_use]
    pub fn links_from(&self, id: &NodeId) -> Vec<&GraphLink> {
        self.links.iter().filter(|l| l.source() == id).collect()
    }

    /// Peer targets that name no package in `nodes`, first-seen order.
    ///
    /// These are expected and not an error.
    #[must_use]
    pub fn dangling_peer_targets(&self) -> Vec<&PackageName> {
        let node_ids: HashSet<&str> = self.nodes.iter().map(NodeId::as_str).collect();
        let mut seen = HashSet::new();

        self.links
            .iter()
            .filter_map(|link| match link {
                GraphLink::Peer { target, .. } => Some(target),
                GraphLink::Regular { .. } => None,
            })
            .filter(|name| !node_ids.contains(name.as_str()) && seen.insert(name.as_str()))
            .collect()
    }

    /// Directed petgraph view with one vertex per distinct id or name
    #[must_use]
    pub fn to_digraph(&self) -> DiGraph<Vertex, LinkKind> {
        let mut graph = DiGraph::new();
        let mut indices: HashMap<Vertex, NodeIndex> = HashMap::new();

        let mut vertex = |graph: &mut DiGraph<Vertex, LinkKind>, v: Vertex| -> NodeIndex {
            *indices
                .entry(v.clone())
                .or_insert_with(|| graph.add_node(v))
        };

        for id in &self.nodes {
            vertex(&mut graph, Vertex::Node(id.clone()));
        }

        for link in &self.links {
            let from = vertex(&mut graph, Vertex::Node(link.source().clone()));
            let to = match link {
                GraphLink::Regular { target, .. } => {
                    vertex(&mut graph, Vertex::Node(target.clone()))
                }
                GraphLink::Peer { target, .. } => {
                    vertex(&mut graph, Vertex::NameRef(target.clone()))
                }
            };
            graph.add_edge(from, to, link.kind());
        }

        graph
    }

    /// Export to DOT format for Graphviz
    #[must_use]
    pub fn to_dot(&self) -> String {
        let view = self.to_digraph();

        let mut dot = String::from("digraph dependencies {\n");
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [shape=box, style=rounded];\n\n");

        for index in view.node_indices() {
            let vertex = &view[index];
            let attrs = match vertex {
                Vertex::Node(NodeId::Root) => " [shape=doublecircle]",
                Vertex::Node(NodeId::Package(_)) => "",
                Vertex::NameRef(_) => " [style=dashed]",
            };
            dot.push_str(&format!("  \"{}\"{};\n", escape(vertex.label()), attrs));
        }

        dot.push('\n');

        for edge in view.edge_references() {
            let attrs = match edge.weight() {
                LinkKind::Regular => "",
                LinkKind::Peer => " [style=dashed]",
            };
            dot.push_str(&format!(
                "  \"{}\" -> \"{}\"{};\n",
                escape(view[edge.source()].label()),
                escape(view[edge.target()].label()),
                attrs
            ));
        }

        dot.push_str("}\n");
        dot
    }

    /// Export to pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
