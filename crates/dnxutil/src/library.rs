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

//! Requested and resolved libraries, and the edges between them.

use std::{
    fmt,
    hash::{Hash, Hasher},
    path::PathBuf,
    str::FromStr,
};

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{framework::FrameworkName, version::SemanticVersion, version_range::VersionRange};

/// What kind of thing a library is. Providers only answer for the kinds they
/// support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LibraryType {
    #[default]
    Unspecified,
    Project,
    Package,
    Assembly,
    ReferenceAssembly,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown library type `{0}`")]
pub struct LibraryTypeError(String);

impl fmt::Display for LibraryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LibraryType::Unspecified => "unspecified",
            LibraryType::Project => "project",
            LibraryType::Package => "package",
            LibraryType::Assembly => "assembly",
            LibraryType::ReferenceAssembly => "referenceAssembly",
        };
        f.write_str(s)
    }
}

impl FromStr for LibraryType {
    type Err = LibraryTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "unspecified" => Ok(LibraryType::Unspecified),
            "project" => Ok(LibraryType::Project),
            "package" => Ok(LibraryType::Package),
            "assembly" => Ok(LibraryType::Assembly),
            "referenceassembly" => Ok(LibraryType::ReferenceAssembly),
            _ => Err(LibraryTypeError(s.to_string())),
        }
    }
}

/// A request for a library, before any provider has answered it.
///
/// Two ranges are equal when they name the same library (ignoring case) with
/// the same type; the version constraint does not take part.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryRange {
    pub name: String,
    #[serde(rename = "type")]
    pub library_type: LibraryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_range: Option<VersionRange>,
}

impl LibraryRange {
    pub fn new(name: impl Into<String>, version_range: Option<VersionRange>) -> Self {
        LibraryRange {
            name: name.into(),
            library_type: LibraryType::Unspecified,
            version_range,
        }
    }

    pub fn with_type(mut self, library_type: LibraryType) -> Self {
        self.library_type = library_type;
        self
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Whether a provider's answer fits this request.
    pub fn is_satisfied_by(&self, identity: &LibraryIdentity) -> bool {
        match (&self.version_range, &identity.version) {
            (None, _) => true,
            (Some(range), Some(version)) => range.contains(version),
            (Some(_), None) => false,
        }
    }
}

impl PartialEq for LibraryRange {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name) && self.library_type == other.library_type
    }
}

impl Eq for LibraryRange {}

impl Hash for LibraryRange {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.to_ascii_lowercase().hash(state);
        self.library_type.hash(state);
    }
}

impl fmt::Display for LibraryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(range) = &self.version_range {
            write!(f, " {range}")?;
        }
        Ok(())
    }
}

impl From<&LibraryIdentity> for LibraryRange {
    fn from(identity: &LibraryIdentity) -> Self {
        LibraryRange {
            name: identity.name.clone(),
            library_type: identity.library_type,
            version_range: identity.version.clone().map(VersionRange::at_least),
        }
    }
}

/// A library as a provider resolved it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryIdentity {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<SemanticVersion>,
    #[serde(rename = "type")]
    pub library_type: LibraryType,
}

impl LibraryIdentity {
    pub fn new(
        name: impl Into<String>,
        version: Option<SemanticVersion>,
        library_type: LibraryType,
    ) -> Self {
        LibraryIdentity {
            name: name.into(),
            version,
            library_type,
        }
    }
}

impl PartialEq for LibraryIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
            && self.version == other.version
            && self.library_type == other.library_type
    }
}

impl Eq for LibraryIdentity {}

impl Hash for LibraryIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.to_ascii_lowercase().hash(state);
        self.version.hash(state);
        self.library_type.hash(state);
    }
}

impl fmt::Display for LibraryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{} {}", self.name, v),
            None => write!(f, "{}", self.name),
        }
    }
}

bitflags! {
    /// Why a dependency exists, and where it flows.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LibraryDependencyType: u32 {
        const MAIN_REFERENCE = 1;
        const MAIN_SOURCE = 1 << 1;
        const MAIN_EXPORT = 1 << 2;
        const PREPROCESS_REFERENCE = 1 << 3;
        const RUNTIME_COMPONENT = 1 << 4;
        const DEV_COMPONENT = 1 << 5;
        const PREPROCESS_COMPONENT = 1 << 6;
        const BECOMES_NUPKG_DEPENDENCY = 1 << 7;
    }
}

const FLAG_NAMES: [(&str, LibraryDependencyType); 8] = [
    ("MainReference", LibraryDependencyType::MAIN_REFERENCE),
    ("MainSource", LibraryDependencyType::MAIN_SOURCE),
    ("MainExport", LibraryDependencyType::MAIN_EXPORT),
    ("PreprocessReference", LibraryDependencyType::PREPROCESS_REFERENCE),
    ("RuntimeComponent", LibraryDependencyType::RUNTIME_COMPONENT),
    ("DevComponent", LibraryDependencyType::DEV_COMPONENT),
    ("PreprocessComponent", LibraryDependencyType::PREPROCESS_COMPONENT),
    ("BecomesNupkgDependency", LibraryDependencyType::BECOMES_NUPKG_DEPENDENCY),
];

const KEYWORDS: [(&str, LibraryDependencyType); 5] = [
    ("default", LibraryDependencyType::DEFAULT),
    ("build", LibraryDependencyType::BUILD),
    ("preprocess", LibraryDependencyType::PREPROCESS),
    ("private", LibraryDependencyType::PRIVATE),
    ("dev", LibraryDependencyType::DEV),
];

#[derive(Debug, thiserror::Error)]
#[error("unknown dependency type `{0}`")]
pub struct DependencyTypeError(String);

impl LibraryDependencyType {
    pub const DEFAULT: Self = Self::MAIN_REFERENCE
        .union(Self::MAIN_SOURCE)
        .union(Self::MAIN_EXPORT)
        .union(Self::RUNTIME_COMPONENT)
        .union(Self::BECOMES_NUPKG_DEPENDENCY);
    pub const BUILD: Self = Self::MAIN_SOURCE.union(Self::PREPROCESS_COMPONENT);
    pub const PREPROCESS: Self = Self::PREPROCESS_REFERENCE;
    pub const PRIVATE: Self = Self::MAIN_REFERENCE
        .union(Self::MAIN_SOURCE)
        .union(Self::RUNTIME_COMPONENT);
    pub const DEV: Self = Self::DEV_COMPONENT;

    fn lookup(name: &str) -> Option<Self> {
        KEYWORDS
            .iter()
            .chain(FLAG_NAMES.iter())
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, flags)| *flags)
    }

    /// Parses keywords and `+flag` / `-flag` adjustments separated by commas
    /// or whitespace, applied left to right. An empty list means `default`.
    pub fn parse_keywords(s: &str) -> Result<Self, DependencyTypeError> {
        let tokens: Vec<&str> = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() {
            return Ok(Self::DEFAULT);
        }

        let mut flags = Self::empty();
        for token in tokens {
            let unknown = || DependencyTypeError(token.to_string());
            if let Some(name) = token.strip_prefix('+') {
                flags |= Self::lookup(name).ok_or_else(unknown)?;
            } else if let Some(name) = token.strip_prefix('-') {
                flags -= Self::lookup(name).ok_or_else(unknown)?;
            } else {
                flags |= Self::lookup(token).ok_or_else(unknown)?;
            }
        }
        Ok(flags)
    }

    /// Whether this dependency is listed in an emitted package's metadata.
    pub fn becomes_package_dependency(&self) -> bool {
        self.contains(Self::BECOMES_NUPKG_DEPENDENCY)
    }
}

impl Default for LibraryDependencyType {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for LibraryDependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some((keyword, _)) = KEYWORDS.iter().find(|(_, flags)| flags == self) {
            return f.write_str(keyword);
        }
        let names: Vec<&str> = FLAG_NAMES
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
            .collect();
        f.write_str(&names.join(","))
    }
}

impl FromStr for LibraryDependencyType {
    type Err = DependencyTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_keywords(s)
    }
}

impl Serialize for LibraryDependencyType {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LibraryDependencyType {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An edge from a library to one of its dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryDependency {
    pub range: LibraryRange,
    #[serde(rename = "type")]
    pub dependency_type: LibraryDependencyType,
    /// Filled in once the walk has settled on a version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_identity: Option<LibraryIdentity>,
}

impl LibraryDependency {
    pub fn new(range: LibraryRange) -> Self {
        LibraryDependency {
            range,
            dependency_type: LibraryDependencyType::DEFAULT,
            resolved_identity: None,
        }
    }

    pub fn with_type(mut self, dependency_type: LibraryDependencyType) -> Self {
        self.dependency_type = dependency_type;
        self
    }

    pub fn name(&self) -> &str {
        &self.range.name
    }
}

impl fmt::Display for LibraryDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.range)?;
        if self.dependency_type != LibraryDependencyType::DEFAULT {
            write!(f, " ({})", self.dependency_type)?;
        }
        Ok(())
    }
}

/// A node of the dependency graph as a provider describes it.
#[derive(Debug, Clone)]
pub struct LibraryDescription {
    pub identity: LibraryIdentity,
    pub requested_range: LibraryRange,
    pub dependencies: Vec<LibraryDependency>,
    /// `false` when no provider could locate the library.
    pub resolved: bool,
    /// `false` when the library has nothing for the target framework.
    pub compatible: bool,
    pub path: Option<PathBuf>,
    /// The framework whose assets were selected.
    pub framework: Option<FrameworkName>,
}

impl LibraryDescription {
    pub fn new(identity: LibraryIdentity, requested_range: LibraryRange) -> Self {
        LibraryDescription {
            identity,
            requested_range,
            dependencies: Vec::new(),
            resolved: true,
            compatible: true,
            path: None,
            framework: None,
        }
    }

    /// A placeholder for a request nothing could satisfy.
    pub fn unresolved(range: LibraryRange) -> Self {
        let identity = LibraryIdentity::new(
            range.name.clone(),
            range
                .version_range
                .as_ref()
                .and_then(|r| r.min_version.clone()),
            range.library_type,
        );
        LibraryDescription {
            identity,
            requested_range: range,
            dependencies: Vec::new(),
            resolved: false,
            compatible: false,
            path: None,
            framework: None,
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<LibraryDependency>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }
}

#[cfg(test)]
mod test {
    use expect_test::expect;

    use super::*;

    fn range(name: &str, range: &str) -> LibraryRange {
        LibraryRange::new(name, Some(range.parse().unwrap()))
    }

    #[test]
    fn range_identity_ignores_version_and_case() {
        assert_eq!(range("Foo", "1.0"), range("foo", "2.0"));
        assert_ne!(
            range("foo", "1.0"),
            range("foo", "1.0").with_type(LibraryType::Package)
        );
    }

    #[test]
    fn range_from_identity_pins_minimum() {
        let identity = LibraryIdentity::new("a", Some("1.2".parse().unwrap()), LibraryType::Package);
        let range = LibraryRange::from(&identity);
        expect!["a 1.2"].assert_eq(&range.to_string());
        assert!(range.is_satisfied_by(&identity));
        assert_eq!(range.library_type, LibraryType::Package);
    }

    #[test]
    fn satisfied_by() {
        let identity = |v: &str| LibraryIdentity::new("a", Some(v.parse().unwrap()), LibraryType::Package);
        assert!(range("a", "[1.0, 2.0)").is_satisfied_by(&identity("1.5")));
        assert!(!range("a", "[1.0, 2.0)").is_satisfied_by(&identity("2.0")));
        assert!(LibraryRange::new("a", None).is_satisfied_by(&identity("0.1")));
        assert!(!range("a", "1.0").is_satisfied_by(&LibraryIdentity::new("a", None, LibraryType::Package)));
    }

    #[test]
    fn dependency_type_keywords() {
        let parse = |s: &str| s.parse::<LibraryDependencyType>().unwrap().to_string();
        expect!["default"].assert_eq(&parse(""));
        expect!["build"].assert_eq(&parse("build"));
        expect!["private"].assert_eq(&parse("default,-MainExport,-BecomesNupkgDependency"));
        expect!["MainSource,DevComponent,PreprocessComponent"].assert_eq(&parse("build +dev"));
        expect!["MainReference,MainSource,MainExport,RuntimeComponent"].assert_eq(&parse("DEFAULT -becomesnupkgdependency"));
        assert!("bogus".parse::<LibraryDependencyType>().is_err());
        assert!("+bogus".parse::<LibraryDependencyType>().is_err());
        assert!(!LibraryDependencyType::BUILD.becomes_package_dependency());
        assert!(LibraryDependencyType::default().becomes_package_dependency());
    }

    #[test]
    fn library_type_parse() {
        assert_eq!("Package".parse::<LibraryType>().unwrap(), LibraryType::Package);
        assert_eq!("referenceAssembly".parse::<LibraryType>().unwrap(), LibraryType::ReferenceAssembly);
        assert_eq!("".parse::<LibraryType>().unwrap(), LibraryType::Unspecified);
        assert!("gem".parse::<LibraryType>().is_err());
    }

    #[test]
    fn unresolved_description() {
        let d = LibraryDescription::unresolved(range("x", "[1.0, 2.0)"));
        assert!(!d.resolved);
        expect!["x 1.0"].assert_eq(&d.identity.to_string());
        assert!(d.dependencies.is_empty());
    }
}
