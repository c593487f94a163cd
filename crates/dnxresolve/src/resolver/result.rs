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

use std::fmt;

use dnxutil::{
    FrameworkName, LibraryDependency, LibraryDependencyType, LibraryDescription, LibraryIdentity,
    LibraryRange,
};
use indexmap::IndexSet;
use petgraph::graphmap::DiGraphMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LibraryIndex(u32);

impl LibraryIndex {
    pub fn new_usize(id: usize) -> Self {
        Self(id as u32)
    }

    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

/// A library the walk settled on.
#[derive(Debug, Clone)]
pub struct ResolvedLibrary {
    /// The provider's description, with every dependency tagged with the
    /// identity it finally resolved to.
    pub description: LibraryDescription,
    /// How the nearest accepted request asked for this library.
    pub dependency_type: LibraryDependencyType,
    /// The provider that supplied the description, `None` when unresolved.
    pub provider: Option<String>,
    pub(crate) provider_index: Option<usize>,
}

impl ResolvedLibrary {
    pub fn identity(&self) -> &LibraryIdentity {
        &self.description.identity
    }

    pub fn is_resolved(&self) -> bool {
        self.description.resolved
    }
}

/// A library no provider could locate.
#[derive(Debug, Clone)]
pub struct UnresolvedDependency {
    pub range: LibraryRange,
    /// The library that asked for it; `None` for the root.
    pub parent: Option<LibraryIdentity>,
    pub attempted_paths: Vec<String>,
}

impl fmt::Display for UnresolvedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unable to locate {}", self.range)?;
        if let Some(parent) = &self.parent {
            write!(f, ", required by {parent}")?;
        }
        Ok(())
    }
}

/// The outcome of a walk: one library per distinct name, in the order the
/// walk first reached them, with the root first.
#[derive(Debug, Clone)]
pub struct WalkResult {
    framework: FrameworkName,
    /// Lowercase library names, positioned by [`LibraryIndex`].
    mapping: IndexSet<String>,
    libraries: Vec<ResolvedLibrary>,
    dep_graph: DiGraphMap<LibraryIndex, ()>,
    unresolved: Vec<UnresolvedDependency>,
}

impl WalkResult {
    pub fn framework(&self) -> &FrameworkName {
        &self.framework
    }

    pub fn root(&self) -> LibraryIndex {
        LibraryIndex::new_usize(0)
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    pub fn library(&self, id: LibraryIndex) -> &ResolvedLibrary {
        &self.libraries[id.as_usize()]
    }

    pub fn libraries(&self) -> impl Iterator<Item = (LibraryIndex, &ResolvedLibrary)> {
        self.libraries
            .iter()
            .enumerate()
            .map(|(id, lib)| (LibraryIndex::new_usize(id), lib))
    }

    pub fn find(&self, name: &str) -> Option<LibraryIndex> {
        self.mapping
            .get_index_of(&name.to_ascii_lowercase())
            .map(LibraryIndex::new_usize)
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedLibrary> {
        self.find(name).map(|id| self.library(id))
    }

    pub fn graph(&self) -> &DiGraphMap<LibraryIndex, ()> {
        &self.dep_graph
    }

    /// Get all resolved dependencies of a library
    pub fn deps(&self, id: LibraryIndex) -> impl Iterator<Item = LibraryIndex> + '_ {
        self.dep_graph
            .neighbors_directed(id, petgraph::Direction::Outgoing)
    }

    /// Every library as a dependency edge tagged with the identity it
    /// resolved to, in visitation order. Unresolved libraries carry no
    /// identity.
    pub fn dependencies(&self) -> Vec<LibraryDependency> {
        self.libraries
            .iter()
            .map(|lib| LibraryDependency {
                range: lib.description.requested_range.clone(),
                dependency_type: lib.dependency_type,
                resolved_identity: lib.is_resolved().then(|| lib.identity().clone()),
            })
            .collect()
    }

    pub fn unresolved(&self) -> &[UnresolvedDependency] {
        &self.unresolved
    }

    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

pub(crate) struct WalkResultBuilder {
    result: WalkResult,
}

impl WalkResultBuilder {
    pub fn new(framework: FrameworkName) -> Self {
        Self {
            result: WalkResult {
                framework,
                mapping: IndexSet::new(),
                libraries: Vec::new(),
                dep_graph: DiGraphMap::new(),
                unresolved: Vec::new(),
            },
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.result.find(name).is_some()
    }

    pub fn add_library(&mut self, name: &str, library: ResolvedLibrary) -> LibraryIndex {
        let id = LibraryIndex::new_usize(self.result.mapping.len());
        self.result.mapping.insert(name.to_ascii_lowercase());
        self.result.libraries.push(library);
        self.result.dep_graph.add_node(id);
        assert_eq!(self.result.mapping.len(), self.result.libraries.len());
        id
    }

    pub fn add_unresolved(&mut self, unresolved: UnresolvedDependency) {
        self.result.unresolved.push(unresolved);
    }

    /// Tags each library's dependencies with their final identities and
    /// records the edges between libraries.
    pub fn build(mut self) -> WalkResult {
        let result = &mut self.result;
        for from in 0..result.libraries.len() {
            let mut dependencies = std::mem::take(&mut result.libraries[from].description.dependencies);
            for dependency in dependencies.iter_mut() {
                let Some(to) = result.find(dependency.name()) else {
                    continue;
                };
                let target = result.library(to);
                dependency.resolved_identity = target.is_resolved().then(|| target.identity().clone());
                result
                    .dep_graph
                    .add_edge(LibraryIndex::new_usize(from), to, ());
            }
            result.libraries[from].description.dependencies = dependencies;
        }
        self.result
    }
}
