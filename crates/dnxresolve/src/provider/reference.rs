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

//! Framework reference assemblies, such as `System` or `System.Xml`.

use dnxutil::{
    FrameworkName, LibraryDescription, LibraryIdentity, LibraryRange, LibraryType,
    catalog::{Catalog, ReferenceAssembly},
    framework::FrameworkReducer,
};
use indexmap::IndexMap;

use super::DependencyProvider;

pub struct ReferenceAssemblyProvider {
    references: IndexMap<FrameworkName, Vec<ReferenceAssembly>>,
    reducer: FrameworkReducer,
}

impl ReferenceAssemblyProvider {
    pub fn new() -> Self {
        ReferenceAssemblyProvider {
            references: IndexMap::new(),
            reducer: FrameworkReducer::default(),
        }
    }

    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut provider = Self::new();
        for framework in catalog.reference_frameworks() {
            provider
                .references
                .insert(framework.clone(), catalog.references(framework).to_vec());
        }
        provider
    }

    pub fn add_reference(&mut self, framework: FrameworkName, assembly: ReferenceAssembly) -> &mut Self {
        self.references.entry(framework).or_default().push(assembly);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

impl Default for ReferenceAssemblyProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyProvider for ReferenceAssemblyProvider {
    fn name(&self) -> &str {
        "reference assemblies"
    }

    fn supports(&self, library_type: LibraryType) -> bool {
        matches!(
            library_type,
            LibraryType::Assembly | LibraryType::ReferenceAssembly
        )
    }

    fn get_description(
        &self,
        range: &LibraryRange,
        framework: &FrameworkName,
    ) -> anyhow::Result<Option<LibraryDescription>> {
        let frameworks: Vec<FrameworkName> = self.references.keys().cloned().collect();
        let Some(nearest) = self.reducer.get_nearest(framework, &frameworks) else {
            return Ok(None);
        };
        let Some(assembly) = self
            .references
            .get(nearest)
            .and_then(|list| list.iter().find(|a| a.name.eq_ignore_ascii_case(&range.name)))
        else {
            return Ok(None);
        };

        let identity = LibraryIdentity::new(
            assembly.name.clone(),
            Some(assembly.version.clone()),
            LibraryType::ReferenceAssembly,
        );
        let mut description = LibraryDescription::new(identity, range.clone());
        description.framework = Some(nearest.clone());
        Ok(Some(description))
    }

    fn get_attempted_paths(&self, framework: &FrameworkName) -> Vec<String> {
        vec![format!(
            "reference assemblies for {}",
            framework.short_folder_name()
        )]
    }
}

#[cfg(test)]
mod test {
    use dnxutil::catalog::parse_catalog;

    use super::*;

    #[test]
    fn resolves_from_nearest_framework() {
        let catalog = parse_catalog(
            r#"{ "references": {
                "net40": { "System": "4.0.0.0", "System.Core": "4.0.0.0" },
                "net45": { "System": "4.5.0.0" }
            } }"#,
        )
        .unwrap();
        let provider = ReferenceAssemblyProvider::from_catalog(&catalog);
        let get = |name: &str, framework: &str| {
            let range = LibraryRange::new(name, None).with_type(LibraryType::ReferenceAssembly);
            provider
                .get_description(&range, &FrameworkName::parse(framework))
                .unwrap()
                .map(|d| d.identity.to_string())
        };
        assert_eq!(get("system", "net451").as_deref(), Some("System 4.5.0.0"));
        assert_eq!(get("System", "net40").as_deref(), Some("System 4.0.0.0"));
        // Only the nearest framework's list is consulted.
        assert_eq!(get("System.Core", "net45"), None);
        assert_eq!(get("System", "net35"), None);
        assert!(!provider.supports(LibraryType::Package));
    }
}
