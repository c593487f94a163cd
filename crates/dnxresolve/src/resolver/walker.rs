// dnx: Dependency resolution and framework compatibility for DNX projects.
// Copyright (C) 2024 International Digital Economy Academy
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//
// For inquiries, you can contact us via e-mail at jichuruanjian@idea.edu.cn.

//! Walks the dependency graph of a root library, asking the providers for
//! each request and settling version disputes between branches.
//!
//! The walk happens in three steps:
//!
//! 1. Build a graph breadth-first from the root. A request for a name that
//!    already appears among the requester's ancestors is a cycle. A request
//!    for a name that a nearer ancestor already asks for is eclipsed and
//!    dropped. Requests that resolve to a library already in the graph share
//!    its node, so each library is expanded once, in the context of the
//!    first path that reached it.
//! 2. Mark every node accepted or rejected. Names requested at more than one
//!    version are disputed; the highest resolved version wins, and anything
//!    only reachable through a rejected node is rejected with it. This
//!    repeats until no node is left undecided.
//! 3. Collect the accepted nodes, one library per name, in the order they
//!    were reached.
//!
//! Libraries are told apart by name alone. A package and an assembly of the
//! same name are one library, and whichever the walk reaches first wins.

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use dnxutil::{
    FrameworkName, LibraryDependencyType, LibraryDescription, LibraryIdentity, LibraryRange,
    LibraryType, SemanticVersion, VersionRange,
};

use super::{
    ResolverError,
    result::{ResolvedLibrary, UnresolvedDependency, WalkResult, WalkResultBuilder},
};
use crate::provider::ProviderList;

pub struct DependencyWalker<'a> {
    providers: ProviderList<'a>,
    runtime_identifier: Option<String>,
}

impl<'a> DependencyWalker<'a> {
    pub fn new(providers: ProviderList<'a>) -> Self {
        Self {
            providers,
            runtime_identifier: None,
        }
    }

    /// The runtime identifier handed to providers once a walk completes.
    pub fn with_runtime_identifier(mut self, runtime_identifier: impl Into<String>) -> Self {
        self.runtime_identifier = Some(runtime_identifier.into());
        self
    }

    pub fn providers(&self) -> &ProviderList<'a> {
        &self.providers
    }

    /// Walks from `name`, at exactly `version` when one is given.
    pub fn walk(
        &mut self,
        name: &str,
        version: Option<SemanticVersion>,
        framework: &FrameworkName,
    ) -> Result<WalkResult, ResolverError> {
        let root = LibraryRange::new(name, version.map(VersionRange::exact));
        self.walk_range(root, framework)
    }

    pub fn walk_range(
        &mut self,
        root: LibraryRange,
        framework: &FrameworkName,
    ) -> Result<WalkResult, ResolverError> {
        let start = Instant::now();
        log::debug!("Walking {} for {}", root, framework);

        let result = {
            let mut walk = Walk::new(&self.providers, framework);
            let root = walk.build_graph(root)?;
            log::debug!(
                "Built graph of {} nodes from {} descriptions in {:?}",
                walk.nodes.len(),
                walk.items.len(),
                start.elapsed()
            );
            let rounds = walk.resolve_conflicts(root);
            log::debug!("Settled {} nodes in {} rounds", walk.nodes.len(), rounds);
            walk.populate(root)
        };

        for (index, provider) in self.providers.iter_mut().enumerate() {
            let supplied: Vec<LibraryDescription> = result
                .libraries()
                .filter(|(_, lib)| lib.provider_index == Some(index))
                .map(|(_, lib)| lib.description.clone())
                .collect();
            provider.initialize(&supplied, framework, self.runtime_identifier.as_deref());
        }

        log::debug!(
            "Resolved {} libraries in {:?}",
            result.len(),
            start.elapsed()
        );
        Ok(result)
    }
}

type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Acceptable,
    Rejected,
    Accepted,
}

/// What the conflict tracker compares. An unresolved entry sorts below every
/// resolved one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct TrackedVersion {
    resolved: bool,
    version: Option<SemanticVersion>,
}

struct Node {
    range: LibraryRange,
    /// Lowercase name
    name: String,
    dependency_type: LibraryDependencyType,
    /// The node whose request created this one.
    outer: Option<NodeId>,
    /// Every node requesting this one, `outer` included.
    dependents: Vec<NodeId>,
    inner: Vec<NodeId>,
    item: usize,
    tracked: TrackedVersion,
    disposition: Disposition,
}

struct Item {
    description: LibraryDescription,
    provider: Option<usize>,
}

type CacheKey = (String, LibraryType, Option<VersionRange>);

/// Nodes are shared per resolved identity; unresolved placeholders never
/// share with a real library.
type NodeKey = (LibraryIdentity, bool);

struct Walk<'w, 'a> {
    providers: &'w ProviderList<'a>,
    framework: &'w FrameworkName,
    nodes: Vec<Node>,
    items: Vec<Item>,
    cache: HashMap<CacheKey, usize>,
    shared: HashMap<NodeKey, NodeId>,
}

impl<'w, 'a> Walk<'w, 'a> {
    fn new(providers: &'w ProviderList<'a>, framework: &'w FrameworkName) -> Self {
        Self {
            providers,
            framework,
            nodes: Vec::new(),
            items: Vec::new(),
            cache: HashMap::new(),
            shared: HashMap::new(),
        }
    }

    fn build_graph(&mut self, root: LibraryRange) -> Result<NodeId, ResolverError> {
        let item = self.resolve(&root)?;
        let root = self.add_node(root, LibraryDependencyType::DEFAULT, item, None);
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            let dependencies = self.items[self.nodes[id].item]
                .description
                .dependencies
                .clone();
            for dependency in dependencies {
                if let Some(nearer) = self.find_nearer(id, dependency.name())? {
                    log::debug!(
                        "{} requested by {} is eclipsed by {}",
                        dependency.range,
                        self.nodes[id].range,
                        self.nodes[nearer].range
                    );
                    continue;
                }
                let item = self.resolve(&dependency.range)?;
                let key = self.node_key(item);
                if let Some(&existing) = self.shared.get(&key) {
                    self.link(id, existing);
                    continue;
                }
                let child =
                    self.add_node(dependency.range, dependency.dependency_type, item, Some(id));
                queue.push_back(child);
            }
        }
        self.check_shared_cycles()?;
        Ok(root)
    }

    /// Looks from `from` up to the root for another request of `name`.
    ///
    /// A request among the ancestors themselves is a cycle. One among their
    /// children is nearer to the root and wins.
    fn find_nearer(&self, from: NodeId, name: &str) -> Result<Option<NodeId>, ResolverError> {
        let mut scan = Some(from);
        while let Some(id) = scan {
            let node = &self.nodes[id];
            if node.range.is_named(name) {
                let mut path = self.chain(from);
                path.push(name.to_string());
                return Err(ResolverError::CyclicDependency { path });
            }
            if let Some(&side) = node
                .inner
                .iter()
                .find(|&&side| self.nodes[side].range.is_named(name))
            {
                return Ok(Some(side));
            }
            scan = node.outer;
        }
        Ok(None)
    }

    /// A shared node has ancestors beyond the path that created it, so a
    /// request it makes can close a cycle that [`Walk::find_nearer`] took
    /// for an eclipse.
    fn check_shared_cycles(&self) -> Result<(), ResolverError> {
        for id in 0..self.nodes.len() {
            // ancestor -> the next node on the way back down to `id`
            let mut towards: HashMap<NodeId, NodeId> = HashMap::new();
            let mut ancestors = vec![id];
            let mut queue = VecDeque::from([id]);
            while let Some(at) = queue.pop_front() {
                for &dependent in &self.nodes[at].dependents {
                    if dependent != id && !towards.contains_key(&dependent) {
                        towards.insert(dependent, at);
                        ancestors.push(dependent);
                        queue.push_back(dependent);
                    }
                }
            }

            let description = &self.items[self.nodes[id].item].description;
            for dependency in &description.dependencies {
                let Some(&ancestor) = ancestors
                    .iter()
                    .find(|&&ancestor| self.nodes[ancestor].range.is_named(dependency.name()))
                else {
                    continue;
                };
                let mut path = self.chain(ancestor);
                let mut at = ancestor;
                while let Some(&next) = towards.get(&at) {
                    path.push(self.nodes[next].range.name.clone());
                    at = next;
                }
                path.push(dependency.name().to_string());
                return Err(ResolverError::CyclicDependency { path });
            }
        }
        Ok(())
    }

    /// Names from the root down to `to` along the creating requests.
    fn chain(&self, to: NodeId) -> Vec<String> {
        let mut path = Vec::new();
        let mut scan = Some(to);
        while let Some(id) = scan {
            path.push(self.nodes[id].range.name.clone());
            scan = self.nodes[id].outer;
        }
        path.reverse();
        path
    }

    fn node_key(&self, item: usize) -> NodeKey {
        let description = &self.items[item].description;
        (description.identity.clone(), description.resolved)
    }

    fn add_node(
        &mut self,
        range: LibraryRange,
        dependency_type: LibraryDependencyType,
        item: usize,
        outer: Option<NodeId>,
    ) -> NodeId {
        let description = &self.items[item].description;
        let tracked = TrackedVersion {
            resolved: description.resolved,
            version: description.identity.version.clone(),
        };
        let id = self.nodes.len();
        self.nodes.push(Node {
            name: range.name.to_ascii_lowercase(),
            range,
            dependency_type,
            outer,
            dependents: Vec::new(),
            inner: Vec::new(),
            item,
            tracked,
            disposition: Disposition::Acceptable,
        });
        let key = self.node_key(item);
        self.shared.insert(key, id);
        if let Some(outer) = outer {
            self.link(outer, id);
        }
        id
    }

    fn link(&mut self, from: NodeId, to: NodeId) {
        self.nodes[from].inner.push(to);
        self.nodes[to].dependents.push(from);
    }

    /// Asks each provider in turn, memoized per walk.
    fn resolve(&mut self, range: &LibraryRange) -> Result<usize, ResolverError> {
        let key = (
            range.name.to_ascii_lowercase(),
            range.library_type,
            range.version_range.clone(),
        );
        if let Some(&item) = self.cache.get(&key) {
            return Ok(item);
        }

        let mut found = None;
        for (index, provider) in self.providers.iter().enumerate() {
            if !provider.supports(range.library_type) {
                continue;
            }
            let description = provider
                .get_description(range, self.framework)
                .map_err(|source| ResolverError::Provider {
                    provider: provider.name().to_string(),
                    range: range.to_string(),
                    source,
                })?;
            match description {
                Some(description) if range.is_satisfied_by(&description.identity) => {
                    log::debug!("{} resolved {} to {}", provider.name(), range, description.identity);
                    found = Some(Item {
                        description,
                        provider: Some(index),
                    });
                    break;
                }
                Some(description) => log::debug!(
                    "{} offered {} which does not satisfy {}",
                    provider.name(),
                    description.identity,
                    range
                ),
                None => {}
            }
        }

        let item = found.unwrap_or_else(|| Item {
            description: LibraryDescription::unresolved(range.clone()),
            provider: None,
        });
        self.items.push(item);
        let index = self.items.len() - 1;
        self.cache.insert(key, index);
        Ok(index)
    }

    /// Settles every node as accepted or rejected and returns the number of
    /// rounds it took.
    ///
    /// A node is decided once its name is no longer ambiguous, that is, once
    /// no version of the name hangs below an undecided dispute. Two disputes
    /// hanging below each other never clear on their own; when a round
    /// decides nothing, one waiting node is settled directly.
    fn resolve_conflicts(&mut self, root: NodeId) -> usize {
        let mut round = 0;
        loop {
            round += 1;
            let mut changed = false;
            let mut tracker = Tracker::default();

            let live = self.reach(root, |node| node.disposition != Disposition::Rejected, |_| true);
            for (node, live) in self.nodes.iter_mut().zip(&live) {
                if *live {
                    let accepted = node.disposition == Disposition::Accepted;
                    tracker.track(&node.name, &node.tracked, accepted);
                } else if node.disposition != Disposition::Rejected {
                    node.disposition = Disposition::Rejected;
                    changed = true;
                }
            }

            let certain = self.reach(
                root,
                |node| node.disposition != Disposition::Rejected,
                |node| {
                    node.disposition != Disposition::Acceptable || !tracker.is_disputed(&node.name)
                },
            );
            for ((node, live), certain) in self.nodes.iter().zip(&live).zip(&certain) {
                if *live && !*certain {
                    tracker.mark_ambiguous(&node.name);
                }
            }

            let mut waiting = Vec::new();
            if self.nodes[root].disposition == Disposition::Acceptable {
                tracker.settle(&mut self.nodes[root]);
                changed = true;
            }
            let mut seen = vec![false; self.nodes.len()];
            seen[root] = true;
            let mut queue = VecDeque::new();
            if self.nodes[root].disposition == Disposition::Accepted {
                queue.push_back(root);
            }
            while let Some(id) = queue.pop_front() {
                for index in 0..self.nodes[id].inner.len() {
                    let child = self.nodes[id].inner[index];
                    if std::mem::replace(&mut seen[child], true) {
                        continue;
                    }
                    let node = &mut self.nodes[child];
                    match node.disposition {
                        Disposition::Rejected => {}
                        Disposition::Accepted => queue.push_back(child),
                        Disposition::Acceptable if tracker.is_ambiguous(&node.name) => {
                            waiting.push(child)
                        }
                        Disposition::Acceptable => {
                            changed = true;
                            if tracker.settle(node) {
                                queue.push_back(child);
                            }
                        }
                    }
                }
            }

            if !self
                .nodes
                .iter()
                .any(|node| node.disposition == Disposition::Acceptable)
            {
                return round;
            }
            if !changed {
                // Prefer a node whose outcome no later round could overturn.
                let stuck = waiting
                    .iter()
                    .copied()
                    .find(|&id| tracker.is_final(&self.nodes[id].name, &self.nodes[id].tracked))
                    .or_else(|| waiting.first().copied())
                    .or_else(|| {
                        self.nodes
                            .iter()
                            .position(|node| node.disposition == Disposition::Acceptable)
                    });
                if let Some(id) = stuck {
                    log::debug!(
                        "Disputes on {} wait on each other, settling it first",
                        self.nodes[id].range
                    );
                    tracker.settle(&mut self.nodes[id]);
                }
            }
        }
    }

    /// Marks the nodes reachable from `root` through nodes `enter` admits,
    /// continuing past only those `expand` admits.
    fn reach(
        &self,
        root: NodeId,
        enter: impl Fn(&Node) -> bool,
        expand: impl Fn(&Node) -> bool,
    ) -> Vec<bool> {
        let mut reached = vec![false; self.nodes.len()];
        if !enter(&self.nodes[root]) {
            return reached;
        }
        reached[root] = true;
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            let node = &self.nodes[id];
            if !expand(node) {
                continue;
            }
            for &child in &node.inner {
                if !reached[child] && enter(&self.nodes[child]) {
                    reached[child] = true;
                    queue.push_back(child);
                }
            }
        }
        reached
    }

    fn populate(&self, root: NodeId) -> WalkResult {
        let mut builder = WalkResultBuilder::new(self.framework.clone());
        let mut seen = vec![false; self.nodes.len()];
        seen[root] = true;
        let mut queue = VecDeque::from([(root, None)]);
        while let Some((id, parent)) = queue.pop_front() {
            let node = &self.nodes[id];
            if node.disposition != Disposition::Accepted {
                continue;
            }
            for &child in &node.inner {
                if !std::mem::replace(&mut seen[child], true) {
                    queue.push_back((child, Some(id)));
                }
            }
            if builder.contains(&node.name) {
                continue;
            }

            let item = &self.items[node.item];
            let parent = parent.map(|parent: NodeId| {
                self.items[self.nodes[parent].item]
                    .description
                    .identity
                    .clone()
            });
            if !item.description.resolved {
                let unresolved = UnresolvedDependency {
                    range: node.range.clone(),
                    parent,
                    attempted_paths: self
                        .providers
                        .attempted_paths(node.range.library_type, self.framework),
                };
                log::warn!("{}", unresolved);
                builder.add_unresolved(unresolved);
            }
            builder.add_library(
                &node.name,
                ResolvedLibrary {
                    description: item.description.clone(),
                    dependency_type: node.dependency_type,
                    provider: item
                        .provider
                        .and_then(|index| self.providers.get(index))
                        .map(|provider| provider.name().to_string()),
                    provider_index: item.provider,
                },
            );
        }
        builder.build()
    }
}

#[derive(Default)]
struct Tracker {
    entries: HashMap<String, TrackerEntry>,
}

#[derive(Default)]
struct TrackerEntry {
    versions: Vec<TrackedVersion>,
    ambiguous: bool,
    accepted: bool,
}

impl Tracker {
    fn track(&mut self, name: &str, version: &TrackedVersion, accepted: bool) {
        let entry = self.entries.entry(name.to_string()).or_default();
        if !entry.versions.contains(version) {
            entry.versions.push(version.clone());
        }
        entry.accepted |= accepted;
    }

    fn is_disputed(&self, name: &str) -> bool {
        self.entries
            .get(name)
            .is_some_and(|entry| entry.versions.len() > 1)
    }

    fn mark_ambiguous(&mut self, name: &str) {
        self.entries.entry(name.to_string()).or_default().ambiguous = true;
    }

    fn is_ambiguous(&self, name: &str) -> bool {
        self.entries.get(name).is_some_and(|entry| entry.ambiguous)
    }

    fn is_best_version(&self, name: &str, version: &TrackedVersion) -> bool {
        self.entries
            .get(name)
            .is_none_or(|entry| entry.versions.iter().all(|other| other <= version))
    }

    /// Whether settling a node now gives the answer it would get once every
    /// dispute above it cleared: it is the best version, or the name already
    /// has an accepted node to lose against.
    fn is_final(&self, name: &str, version: &TrackedVersion) -> bool {
        self.is_best_version(name, version)
            || self.entries.get(name).is_some_and(|entry| entry.accepted)
    }

    /// Accepts `node` if it carries the best version of its name, rejects it
    /// otherwise. Returns whether it was accepted.
    fn settle(&self, node: &mut Node) -> bool {
        let accepted = self.is_best_version(&node.name, &node.tracked);
        if accepted {
            if self.is_disputed(&node.name) {
                log::debug!("{} is disputed, {:?} wins", node.name, node.tracked.version);
            }
            node.disposition = Disposition::Accepted;
        } else {
            node.disposition = Disposition::Rejected;
        }
        accepted
    }
}
