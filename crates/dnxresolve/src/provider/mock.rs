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

use std::collections::HashMap;

use dnxutil::{
    FrameworkName, LibraryDependency, LibraryDescription, LibraryIdentity, LibraryRange,
    LibraryType, SemanticVersion, VersionRange, version_range::should_use_considering,
};

use super::DependencyProvider;

/// One recorded call to [`DependencyProvider::initialize`].
#[derive(Debug, Clone)]
pub struct InitializeCall {
    pub packages: Vec<String>,
    pub framework: FrameworkName,
    pub runtime_identifier: Option<String>,
}

pub struct MockProvider {
    name: String,
    library_type: LibraryType,
    /// Lowercase name -> versions in insertion order
    libraries: HashMap<String, Vec<LibraryDescription>>,
    initialized: Vec<InitializeCall>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::named("mock")
    }

    pub fn named(name: &str) -> Self {
        MockProvider {
            name: name.to_string(),
            library_type: LibraryType::Package,
            libraries: HashMap::new(),
            initialized: Vec::new(),
        }
    }

    pub fn with_library_type(mut self, library_type: LibraryType) -> Self {
        self.library_type = library_type;
        self
    }

    /// Adds `name@version` depending on each `(name, range)`. An empty range
    /// means any version.
    pub fn add_library<'a>(
        &mut self,
        name: &'a str,
        version: &'a str,
        deps: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> &mut Self {
        let version: SemanticVersion = version.parse().unwrap();
        let identity = LibraryIdentity::new(name, Some(version.clone()), self.library_type);
        let dependencies = deps
            .into_iter()
            .map(|(dep, range)| {
                let range = if range.is_empty() {
                    None
                } else {
                    Some(range.parse::<VersionRange>().unwrap())
                };
                LibraryDependency::new(LibraryRange::new(dep, range))
            })
            .collect();
        let requested = LibraryRange::new(name, Some(VersionRange::exact(version)));
        let description = LibraryDescription::new(identity, requested).with_dependencies(dependencies);
        self.libraries
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(description);
        self
    }

    /// Adds a description as is, for dependencies `add_library` cannot
    /// express.
    pub fn add_description(&mut self, description: LibraryDescription) -> &mut Self {
        self.libraries
            .entry(description.name().to_ascii_lowercase())
            .or_default()
            .push(description);
        self
    }

    pub fn initialized(&self) -> &[InitializeCall] {
        &self.initialized
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, library_type: LibraryType) -> bool {
        library_type == LibraryType::Unspecified || library_type == self.library_type
    }

    fn get_description(
        &self,
        range: &LibraryRange,
        _framework: &FrameworkName,
    ) -> anyhow::Result<Option<LibraryDescription>> {
        let Some(candidates) = self.libraries.get(&range.name.to_ascii_lowercase()) else {
            return Ok(None);
        };
        let mut best: Option<&LibraryDescription> = None;
        for candidate in candidates {
            let Some(version) = &candidate.identity.version else {
                continue;
            };
            let current = best.and_then(|b| b.identity.version.as_ref());
            let better = match &range.version_range {
                Some(ideal) => should_use_considering(current, version, ideal),
                None => current.is_none_or(|c| c < version),
            };
            if better {
                best = Some(candidate);
            }
        }
        Ok(best.map(|b| {
            let mut description = b.clone();
            description.requested_range = range.clone();
            description
        }))
    }

    fn get_attempted_paths(&self, _framework: &FrameworkName) -> Vec<String> {
        vec![format!("<{}>", self.name)]
    }

    fn initialize(
        &mut self,
        packages: &[LibraryDescription],
        framework: &FrameworkName,
        runtime_identifier: Option<&str>,
    ) {
        self.initialized.push(InitializeCall {
            packages: packages.iter().map(|p| p.identity.to_string()).collect(),
            framework: framework.clone(),
            runtime_identifier: runtime_identifier.map(str::to_string),
        });
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mock_provider_picks_lowest_matching() {
        let mut provider = MockProvider::new();
        provider
            .add_library("foo", "2.0", [])
            .add_library("foo", "1.0", [])
            .add_library("foo", "1.5", []);
        let net45 = FrameworkName::parse("net45");
        let get = |range: Option<&str>| {
            let range = LibraryRange::new("FOO", range.map(|r| r.parse().unwrap()));
            provider
                .get_description(&range, &net45)
                .unwrap()
                .map(|d| d.identity.to_string())
        };
        assert_eq!(get(Some("1.2")).as_deref(), Some("foo 1.5"));
        assert_eq!(get(Some("1.0")).as_deref(), Some("foo 1.0"));
        assert_eq!(get(None).as_deref(), Some("foo 2.0"));
        assert_eq!(get(Some("3.0")), None);
        assert!(provider
            .get_description(&LibraryRange::new("bar", None), &net45)
            .unwrap()
            .is_none());
    }
}
