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

#[cfg(test)]
pub mod mock;
pub mod catalog;
pub mod reference;

use dnxutil::{FrameworkName, LibraryDescription, LibraryRange, LibraryType};

pub use catalog::CatalogProvider;
pub use reference::ReferenceAssemblyProvider;

/// A source of library descriptions.
pub trait DependencyProvider {
    /// A short name used in logs and errors.
    fn name(&self) -> &str;

    /// Whether this provider answers requests for libraries of this type.
    fn supports(&self, library_type: LibraryType) -> bool {
        let _ = library_type;
        true
    }

    /// Describes the library satisfying `range` for `framework`.
    ///
    /// `Ok(None)` means this provider does not know the library. An `Err`
    /// aborts the whole walk.
    fn get_description(
        &self,
        range: &LibraryRange,
        framework: &FrameworkName,
    ) -> anyhow::Result<Option<LibraryDescription>>;

    /// Where this provider looked, for diagnostics.
    fn get_attempted_paths(&self, framework: &FrameworkName) -> Vec<String> {
        let _ = framework;
        Vec::new()
    }

    /// Called once a walk completes with the libraries this provider
    /// supplied, in visitation order.
    fn initialize(
        &mut self,
        packages: &[LibraryDescription],
        framework: &FrameworkName,
        runtime_identifier: Option<&str>,
    ) {
        let _ = (packages, framework, runtime_identifier);
    }
}

impl<P> DependencyProvider for &mut P
where
    P: DependencyProvider,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn supports(&self, library_type: LibraryType) -> bool {
        (**self).supports(library_type)
    }

    fn get_description(
        &self,
        range: &LibraryRange,
        framework: &FrameworkName,
    ) -> anyhow::Result<Option<LibraryDescription>> {
        (**self).get_description(range, framework)
    }

    fn get_attempted_paths(&self, framework: &FrameworkName) -> Vec<String> {
        (**self).get_attempted_paths(framework)
    }

    fn initialize(
        &mut self,
        packages: &[LibraryDescription],
        framework: &FrameworkName,
        runtime_identifier: Option<&str>,
    ) {
        (**self).initialize(packages, framework, runtime_identifier)
    }
}

/// Providers in the order they are consulted.
#[derive(Default)]
pub struct ProviderList<'a> {
    providers: Vec<Box<dyn DependencyProvider + 'a>>,
}

impl<'a> ProviderList<'a> {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    pub fn with_provider(provider: impl DependencyProvider + 'a) -> Self {
        let mut list = Self::new();
        list.push(provider);
        list
    }

    pub fn push(&mut self, provider: impl DependencyProvider + 'a) -> &mut Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&dyn DependencyProvider> {
        self.providers.get(index).map(|refbox| &**refbox)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn DependencyProvider> {
        self.providers.iter().map(|refbox| &**refbox as &dyn DependencyProvider)
    }

    pub(crate) fn iter_mut(
        &mut self,
    ) -> impl Iterator<Item = &mut Box<dyn DependencyProvider + 'a>> {
        self.providers.iter_mut()
    }

    /// Every provider's attempted paths for libraries of this type.
    pub fn attempted_paths(&self, library_type: LibraryType, framework: &FrameworkName) -> Vec<String> {
        self.iter()
            .filter(|p| p.supports(library_type))
            .flat_map(|p| p.get_attempted_paths(framework))
            .collect()
    }
}
