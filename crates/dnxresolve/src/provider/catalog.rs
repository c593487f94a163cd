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

//! Packages from a catalog file.

use std::path::{Path, PathBuf};

use dnxutil::{
    FrameworkName, LibraryDescription, LibraryIdentity, LibraryRange, LibraryType,
    catalog::{Catalog, CatalogFormatError, CatalogPackage, read_catalog_from_json},
    framework::FrameworkReducer,
    version_range::should_use_considering,
};

use super::DependencyProvider;

pub struct CatalogProvider {
    catalog: Catalog,
    path: Option<PathBuf>,
    reducer: FrameworkReducer,
    used: Vec<LibraryDescription>,
}

impl CatalogProvider {
    pub fn new(catalog: Catalog) -> Self {
        CatalogProvider {
            catalog,
            path: None,
            reducer: FrameworkReducer::default(),
            used: Vec::new(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogFormatError> {
        let catalog = read_catalog_from_json(path)?;
        let mut provider = Self::new(catalog);
        provider.path = Some(path.to_path_buf());
        Ok(provider)
    }

    pub fn with_reducer(mut self, reducer: FrameworkReducer) -> Self {
        self.reducer = reducer;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The packages handed over by the last completed walk.
    pub fn used_packages(&self) -> &[LibraryDescription] {
        &self.used
    }

    /// Folds the available versions with the range's selection policy.
    /// Without a range the highest version wins.
    fn find_best(&self, range: &LibraryRange) -> Option<&CatalogPackage> {
        let mut best: Option<&CatalogPackage> = None;
        for package in self.catalog.versions(&range.name) {
            let current = best.map(|b| &b.version);
            let better = match &range.version_range {
                Some(ideal) => should_use_considering(current, &package.version, ideal),
                None => current.is_none_or(|c| *c < package.version),
            };
            if better {
                best = Some(package);
            }
        }
        best
    }
}

impl DependencyProvider for CatalogProvider {
    fn name(&self) -> &str {
        "catalog"
    }

    fn supports(&self, library_type: LibraryType) -> bool {
        matches!(library_type, LibraryType::Unspecified | LibraryType::Package)
    }

    fn get_description(
        &self,
        range: &LibraryRange,
        framework: &FrameworkName,
    ) -> anyhow::Result<Option<LibraryDescription>> {
        let Some(package) = self.find_best(range) else {
            return Ok(None);
        };

        let identity = LibraryIdentity::new(
            package.name.clone(),
            Some(package.version.clone()),
            LibraryType::Package,
        );
        let mut description = LibraryDescription::new(identity, range.clone());
        description.path = package.path.clone();

        if !package.dependency_groups.is_empty() {
            let frameworks = package.group_frameworks();
            match self.reducer.get_nearest(framework, &frameworks) {
                Some(nearest) => {
                    if let Some(group) = package
                        .dependency_groups
                        .iter()
                        .find(|g| &g.framework == nearest)
                    {
                        description.dependencies = group.dependencies.clone();
                    }
                    description.framework = Some(nearest.clone());
                }
                None => {
                    log::debug!(
                        "{} {} has nothing for {}",
                        package.name,
                        package.version,
                        framework.short_folder_name()
                    );
                    description.compatible = false;
                }
            }
        }

        Ok(Some(description))
    }

    fn get_attempted_paths(&self, _framework: &FrameworkName) -> Vec<String> {
        self.path
            .iter()
            .map(|p| p.display().to_string())
            .collect()
    }

    fn initialize(
        &mut self,
        packages: &[LibraryDescription],
        framework: &FrameworkName,
        _runtime_identifier: Option<&str>,
    ) {
        log::debug!(
            "catalog supplied {} packages for {}",
            packages.len(),
            framework.short_folder_name()
        );
        self.used = packages.to_vec();
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use dnxutil::catalog::{CATALOG_JSON, parse_catalog};
    use expect_test::expect;

    use super::*;

    const CATALOG: &str = r#"{
        "packages": {
            "Json": {
                "1.0": {},
                "1.1": {},
                "2.0": {},
                "2.1-beta": {}
            },
            "Http": {
                "3.0": {
                    "path": "packages/Http/3.0",
                    "frameworks": {
                        "": { "Json": "1.0" },
                        "net45": { "Json": "2.0" },
                        "dnxcore50": { "Json": "2.0", "System.Runtime": "4.0" }
                    }
                }
            },
            "WinOnly": {
                "1.0": { "frameworks": { "win8": {} } }
            }
        }
    }"#;

    fn provider() -> CatalogProvider {
        CatalogProvider::new(parse_catalog(CATALOG).unwrap())
    }

    fn describe(provider: &CatalogProvider, name: &str, range: Option<&str>, framework: &str) -> Option<LibraryDescription> {
        let range = LibraryRange::new(name, range.map(|r| r.parse().unwrap()));
        provider
            .get_description(&range, &FrameworkName::parse(framework))
            .unwrap()
    }

    fn version_of(d: Option<LibraryDescription>) -> Option<String> {
        d.map(|d| d.identity.to_string())
    }

    #[test]
    fn version_selection() {
        let p = provider();
        assert_eq!(version_of(describe(&p, "json", Some("1.0"), "net45")).as_deref(), Some("Json 1.0"));
        assert_eq!(version_of(describe(&p, "json", Some("1.0.5"), "net45")).as_deref(), Some("Json 1.1"));
        assert_eq!(version_of(describe(&p, "json", Some("[1.0, 2.0)"), "net45")).as_deref(), Some("Json 1.0"));
        assert_eq!(version_of(describe(&p, "json", None, "net45")).as_deref(), Some("Json 2.1-beta"));
        assert_eq!(version_of(describe(&p, "json", Some("2.1-*"), "net45")).as_deref(), Some("Json 2.1-beta"));
        assert_eq!(version_of(describe(&p, "json", Some("3.0"), "net45")), None);
        assert_eq!(version_of(describe(&p, "xml", None, "net45")), None);
    }

    #[test]
    fn dependency_group_selection() {
        let p = provider();
        let deps = |framework: &str| -> String {
            let d = describe(&p, "Http", None, framework).unwrap();
            let deps: Vec<String> = d.dependencies.iter().map(|d| d.to_string()).collect();
            format!(
                "{} => {}",
                d.framework.map(|f| f.short_folder_name()).unwrap_or_default(),
                deps.join(", ")
            )
        };
        expect!["net45 => Json 2.0"].assert_eq(&deps("net451"));
        expect!["dnxcore50 => Json 2.0, System.Runtime 4.0"].assert_eq(&deps("dnxcore50"));
        expect!["any => Json 1.0"].assert_eq(&deps("sl5"));
        expect!["net45 => Json 2.0"].assert_eq(&deps("dnx451"));

        let d = describe(&p, "Http", None, "net45").unwrap();
        assert_eq!(d.path.as_deref(), Some(Path::new("packages/Http/3.0")));
        assert!(d.compatible);
    }

    #[test]
    fn incompatible_package_is_still_described() {
        let p = provider();
        let d = describe(&p, "WinOnly", None, "net45").unwrap();
        assert!(d.resolved);
        assert!(!d.compatible);
        assert!(d.dependencies.is_empty());
        assert!(describe(&p, "WinOnly", None, "win81").unwrap().compatible);
    }

    #[test]
    fn supports_packages_only() {
        let p = provider();
        assert!(p.supports(LibraryType::Package));
        assert!(p.supports(LibraryType::Unspecified));
        assert!(!p.supports(LibraryType::ReferenceAssembly));
        assert!(!p.supports(LibraryType::Project));
    }

    #[test]
    fn from_path_reports_attempted_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CATALOG_JSON);
        std::fs::File::create(&path)
            .unwrap()
            .write_all(CATALOG.as_bytes())
            .unwrap();
        let p = CatalogProvider::from_path(&path).unwrap();
        assert_eq!(
            p.get_attempted_paths(&FrameworkName::parse("net45")),
            vec![path.display().to_string()]
        );
        assert!(provider().get_attempted_paths(&FrameworkName::any()).is_empty());
        assert!(CatalogProvider::from_path(&dir.path().join("nope.json")).is_err());
    }
}
