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

//! A package catalog: the packages a source offers, their versions, and the
//! dependencies each version declares per target framework.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    framework::FrameworkName,
    library::{
        DependencyTypeError, LibraryDependency, LibraryDependencyType, LibraryRange,
        LibraryType, LibraryTypeError,
    },
    version::{SemanticVersion, SemanticVersionError},
    version_range::{VersionRange, VersionRangeError},
};

pub const CATALOG_JSON: &str = "catalog.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogJSON {
    /// name -> version -> package
    #[serde(default)]
    pub packages: IndexMap<String, IndexMap<String, PackageJSON>>,
    /// framework -> assembly -> version
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub references: IndexMap<String, IndexMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageJSON {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// framework short name (empty for any framework) -> dependency name -> info
    #[serde(default)]
    pub frameworks: IndexMap<String, IndexMap<String, DependencyJSON>>,
}

/// Either a bare version range or a detailed record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyJSON {
    Simple(String),
    Detailed(DetailedDependencyJSON),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailedDependencyJSON {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub dependency_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("failed to load `{}`", path.display())]
pub struct CatalogFormatError {
    path: Box<Path>,
    #[source]
    kind: CatalogFormatErrorKind,
}

impl CatalogFormatError {
    pub fn kind(&self) -> &CatalogFormatErrorKind {
        &self.kind
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogFormatErrorKind {
    #[error("I/O error")]
    IO(#[from] std::io::Error),
    #[error("Parse error")]
    Parse(#[from] serde_json_lenient::Error),
    #[error("`{0}` has a bad version")]
    Version(String, #[source] SemanticVersionError),
    #[error("dependency `{0}` has a bad version range")]
    Range(String, #[source] VersionRangeError),
    #[error("dependency `{0}` has a bad type")]
    DependencyType(String, #[source] DependencyTypeError),
    #[error("dependency `{0}` has a bad target")]
    Target(String, #[source] LibraryTypeError),
}

/// The dependencies a package version declares for one framework.
#[derive(Debug, Clone)]
pub struct DependencyGroup {
    pub framework: FrameworkName,
    pub dependencies: Vec<LibraryDependency>,
}

#[derive(Debug, Clone)]
pub struct CatalogPackage {
    pub name: String,
    pub version: SemanticVersion,
    pub path: Option<PathBuf>,
    pub dependency_groups: Vec<DependencyGroup>,
}

impl CatalogPackage {
    pub fn new(name: impl Into<String>, version: SemanticVersion) -> Self {
        CatalogPackage {
            name: name.into(),
            version,
            path: None,
            dependency_groups: Vec::new(),
        }
    }

    pub fn with_group(mut self, framework: FrameworkName, dependencies: Vec<LibraryDependency>) -> Self {
        self.dependency_groups.push(DependencyGroup {
            framework,
            dependencies,
        });
        self
    }

    pub fn group_frameworks(&self) -> Vec<FrameworkName> {
        self.dependency_groups
            .iter()
            .map(|g| g.framework.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceAssembly {
    pub name: String,
    pub version: SemanticVersion,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Keyed by lowercase package name, versions in file order.
    packages: IndexMap<String, Vec<CatalogPackage>>,
    references: IndexMap<FrameworkName, Vec<ReferenceAssembly>>,
}

impl Catalog {
    pub fn add_package(&mut self, package: CatalogPackage) {
        self.packages
            .entry(package.name.to_ascii_lowercase())
            .or_default()
            .push(package);
    }

    pub fn add_reference(&mut self, framework: FrameworkName, assembly: ReferenceAssembly) {
        self.references.entry(framework).or_default().push(assembly);
    }

    /// Every version of `name`, ignoring case.
    pub fn versions(&self, name: &str) -> &[CatalogPackage] {
        self.packages
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn references(&self, framework: &FrameworkName) -> &[ReferenceAssembly] {
        self.references
            .get(framework)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn reference_frameworks(&self) -> impl Iterator<Item = &FrameworkName> {
        self.references.keys()
    }

    pub fn package_count(&self) -> usize {
        self.packages.values().map(Vec::len).sum()
    }
}

/// A group key of `""` applies to any framework.
fn parse_group_framework(key: &str) -> FrameworkName {
    if key.trim().is_empty() {
        FrameworkName::any()
    } else {
        FrameworkName::parse(key)
    }
}

fn convert_dependency(
    name: &str,
    json: DependencyJSON,
) -> Result<LibraryDependency, CatalogFormatErrorKind> {
    let (version, dependency_type, target) = match json {
        DependencyJSON::Simple(v) => (Some(v), None, None),
        DependencyJSON::Detailed(d) => (d.version, d.dependency_type, d.target),
    };

    let version_range = match version.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(v) => Some(
            v.parse::<VersionRange>()
                .map_err(|e| CatalogFormatErrorKind::Range(name.to_string(), e))?,
        ),
    };
    let library_type = match target {
        Some(t) => t
            .parse::<LibraryType>()
            .map_err(|e| CatalogFormatErrorKind::Target(name.to_string(), e))?,
        None => LibraryType::Unspecified,
    };
    let dependency_type = match dependency_type {
        Some(t) => t
            .parse::<LibraryDependencyType>()
            .map_err(|e| CatalogFormatErrorKind::DependencyType(name.to_string(), e))?,
        None => LibraryDependencyType::DEFAULT,
    };

    Ok(
        LibraryDependency::new(LibraryRange::new(name, version_range).with_type(library_type))
            .with_type(dependency_type),
    )
}

impl TryFrom<CatalogJSON> for Catalog {
    type Error = CatalogFormatErrorKind;

    fn try_from(j: CatalogJSON) -> Result<Self, Self::Error> {
        let mut catalog = Catalog::default();

        for (name, versions) in j.packages {
            for (version, package) in versions {
                let version = version
                    .parse::<SemanticVersion>()
                    .map_err(|e| CatalogFormatErrorKind::Version(format!("{name} {version}"), e))?;
                let mut p = CatalogPackage::new(name.clone(), version);
                p.path = package.path.map(PathBuf::from);
                for (framework, deps) in package.frameworks {
                    let dependencies = deps
                        .into_iter()
                        .map(|(dep, info)| convert_dependency(&dep, info))
                        .collect::<Result<Vec<_>, _>>()?;
                    p = p.with_group(parse_group_framework(&framework), dependencies);
                }
                catalog.add_package(p);
            }
        }

        for (framework, assemblies) in j.references {
            let framework = FrameworkName::parse(&framework);
            for (name, version) in assemblies {
                let version = version
                    .parse::<SemanticVersion>()
                    .map_err(|e| CatalogFormatErrorKind::Version(name.clone(), e))?;
                catalog.add_reference(framework.clone(), ReferenceAssembly { name, version });
            }
        }

        Ok(catalog)
    }
}

pub fn parse_catalog(s: &str) -> Result<Catalog, CatalogFormatErrorKind> {
    let j: CatalogJSON = serde_json_lenient::from_str(s)?;
    j.try_into()
}

pub fn read_catalog_from_json(path: &Path) -> Result<Catalog, CatalogFormatError> {
    let file = File::open(path).map_err(|e| CatalogFormatError {
        path: path.into(),
        kind: CatalogFormatErrorKind::IO(e),
    })?;
    let reader = BufReader::new(file);
    let j: CatalogJSON =
        serde_json_lenient::from_reader(reader).map_err(|e| CatalogFormatError {
            path: path.into(),
            kind: CatalogFormatErrorKind::Parse(e),
        })?;
    let catalog: Catalog = j.try_into().map_err(|kind| CatalogFormatError {
        path: path.into(),
        kind,
    })?;
    log::debug!(
        "loaded {} package versions from {}",
        catalog.package_count(),
        path.display()
    );
    Ok(catalog)
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use expect_test::expect;

    use super::*;

    const SAMPLE: &str = r#"{
        "packages": {
            "Newtonsoft.Json": {
                "6.0.4": { "path": "packages/Newtonsoft.Json/6.0.4" },
                "6.0.6": {}
            },
            "App": {
                "1.0.0": {
                    "frameworks": {
                        "": { "Newtonsoft.Json": "6.0.4" },
                        "dnxcore50": {
                            "System.Runtime": { "version": "[4.0.20, 5.0)", "type": "build", "target": "referenceAssembly" },
                            "Tooling": { "type": "dev" }
                        }
                    }
                }
            }
        },
        "references": {
            "net45": { "System": "4.0.0.0" }
        }
    }"#;

    #[test]
    fn parse_sample() {
        let catalog = parse_catalog(SAMPLE).unwrap();
        assert_eq!(catalog.package_count(), 3);
        let json = catalog.versions("newtonsoft.json");
        assert_eq!(json.len(), 2);
        assert_eq!(
            json[0].path.as_deref(),
            Some(Path::new("packages/Newtonsoft.Json/6.0.4"))
        );

        let app = &catalog.versions("App")[0];
        let groups: Vec<String> = app
            .dependency_groups
            .iter()
            .map(|g| {
                let deps: Vec<String> = g
                    .dependencies
                    .iter()
                    .map(|d| format!("{d} [{}]", d.range.library_type))
                    .collect();
                format!("{}: {}", g.framework.short_folder_name(), deps.join("; "))
            })
            .collect();
        expect![[r#"
            [
                "any: Newtonsoft.Json 6.0.4 [unspecified]",
                "dnxcore50: System.Runtime [4.0.20, 5.0) (build) [referenceAssembly]; Tooling (dev) [unspecified]",
            ]
        "#]]
        .assert_debug_eq(&groups);

        let net45 = FrameworkName::parse("net45");
        assert_eq!(catalog.references(&net45)[0].name, "System");
        assert!(catalog.references(&FrameworkName::parse("net40")).is_empty());
    }

    #[test]
    fn bad_catalogs() {
        let err = |s: &str| parse_catalog(s).unwrap_err().to_string();
        expect!["`a x` has a bad version"]
            .assert_eq(&err(r#"{ "packages": { "a": { "x": {} } } }"#));
        expect!["dependency `b` has a bad version range"].assert_eq(&err(
            r#"{ "packages": { "a": { "1.0": { "frameworks": { "": { "b": "[1.0" } } } } } }"#
        ));
        expect!["dependency `b` has a bad type"].assert_eq(&err(
            r#"{ "packages": { "a": { "1.0": { "frameworks": { "": { "b": { "type": "weird" } } } } } } }"#
        ));
        expect!["Parse error"].assert_eq(&err("{"));
    }

    #[test]
    fn read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CATALOG_JSON);
        std::fs::File::create(&path)
            .unwrap()
            .write_all(SAMPLE.as_bytes())
            .unwrap();
        let catalog = read_catalog_from_json(&path).unwrap();
        assert_eq!(catalog.versions("App").len(), 1);

        let missing = read_catalog_from_json(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing.kind(), CatalogFormatErrorKind::IO(_)));
        assert!(missing.to_string().starts_with("failed to load"));
    }
}
