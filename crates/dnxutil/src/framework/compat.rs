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

use std::sync::Arc;

use super::{FrameworkExpander, FrameworkMappings, FrameworkName, FrameworkVersion};

const VERSION_WEIGHTS: [i64; 4] = [255 * 255 * 255, 255 * 255, 255, 1];
const BASE_SCORE: i64 = 1 << 37;
const SAME_IDENTIFIER_BONUS: i64 = 10 * (1 << 32);

/// Decides whether a project targeting one framework may consume an asset
/// built for another, and ranks compatible candidates.
#[derive(Debug, Clone)]
pub struct CompatibilityProvider {
    mappings: Arc<FrameworkMappings>,
    expander: FrameworkExpander,
}

impl Default for CompatibilityProvider {
    fn default() -> Self {
        Self::new(FrameworkMappings::shared())
    }
}

impl CompatibilityProvider {
    pub fn new(mappings: Arc<FrameworkMappings>) -> Self {
        CompatibilityProvider {
            expander: FrameworkExpander::new(Arc::clone(&mappings)),
            mappings,
        }
    }

    pub fn mappings(&self) -> &FrameworkMappings {
        &self.mappings
    }

    pub fn expander(&self) -> &FrameworkExpander {
        &self.expander
    }

    /// Whether `project` can consume `candidate`. Not symmetric.
    pub fn is_compatible(&self, project: &FrameworkName, candidate: &FrameworkName) -> bool {
        if project == candidate {
            return true;
        }
        if project.is_any() || candidate.is_any() {
            return true;
        }
        if project.is_unsupported() {
            return false;
        }
        if candidate.is_agnostic() {
            return true;
        }
        if candidate.is_unsupported() || project.is_agnostic() {
            return false;
        }
        if project.is_portable() || candidate.is_portable() {
            return self.is_portable_compatible(project, candidate);
        }
        self.framework_compare(project, candidate)
    }

    fn is_portable_compatible(&self, project: &FrameworkName, candidate: &FrameworkName) -> bool {
        let project_members = project.portable_frameworks(&self.mappings);
        let candidate_members = candidate.portable_frameworks(&self.mappings);
        match (project_members, candidate_members) {
            (None, Some(candidate_members)) if !project.is_portable() => candidate_members
                .iter()
                .any(|c| self.is_compatible(project, c)),
            (Some(project_members), None) if !candidate.is_portable() => project_members
                .iter()
                .all(|p| self.is_compatible(p, candidate)),
            (Some(project_members), Some(candidate_members)) => {
                project_members.len() >= candidate_members.len()
                    && candidate_members
                        .iter()
                        .all(|c| project_members.iter().any(|p| self.is_compatible(p, c)))
            }
            // A portable profile we know nothing about.
            _ => false,
        }
    }

    /// Checks the project framework and each of its expansions against the
    /// candidate.
    fn framework_compare(&self, project: &FrameworkName, candidate: &FrameworkName) -> bool {
        std::iter::once(project.clone())
            .chain(self.expander.expand(project))
            .any(|p| self.is_compatible_with_equivalents(&p, candidate, &mut Vec::new()))
    }

    /// Identifier, version, platform and profile rules. When identifiers
    /// differ the project is translated through the equivalent project
    /// framework table and rechecked.
    fn is_compatible_with_equivalents(
        &self,
        project: &FrameworkName,
        candidate: &FrameworkName,
        visited: &mut Vec<String>,
    ) -> bool {
        if project.is_framework(candidate.framework()) {
            return candidate.version() <= project.version()
                && self.platforms_compatible(project, candidate)
                && self.profiles_compatible(project.framework(), project.profile(), candidate.profile());
        }

        visited.push(project.framework().to_ascii_lowercase());
        for mapping in &self.mappings.equivalent_project_frameworks {
            if !project.is_framework(&mapping.identifier)
                || visited.contains(&mapping.equivalent.to_ascii_lowercase())
            {
                continue;
            }
            let equivalent = project
                .clone()
                .with_framework(mapping.equivalent.clone())
                .with_version(mapping.version.unwrap_or(project.version()));
            if self.is_compatible_with_equivalents(&equivalent, candidate, visited) {
                return true;
            }
        }
        false
    }

    fn platforms_compatible(&self, project: &FrameworkName, candidate: &FrameworkName) -> bool {
        candidate.platform().is_empty()
            || (candidate.platform().eq_ignore_ascii_case(project.platform())
                && candidate.platform_version() <= project.platform_version())
    }

    fn profiles_compatible(&self, identifier: &str, project: &str, candidate: &str) -> bool {
        project.eq_ignore_ascii_case(candidate)
            || self.mappings.profile_compatibility.iter().any(|p| {
                p.identifier.eq_ignore_ascii_case(identifier)
                    && p.candidate_profile.eq_ignore_ascii_case(candidate)
                    && p.project_profiles.iter().any(|pp| pp.eq_ignore_ascii_case(project))
            })
    }

    /// Ranks `candidate` for `project`; higher is better. Incompatible pairs
    /// score `i64::MIN`.
    pub fn profile_compatibility(&self, project: &FrameworkName, candidate: &FrameworkName) -> i64 {
        if !self.is_compatible(project, candidate) {
            return i64::MIN;
        }

        if candidate.is_portable() {
            let Some(candidate_members) = candidate.portable_frameworks(&self.mappings) else {
                return i64::MIN;
            };
            return match project.portable_frameworks(&self.mappings) {
                Some(project_members) => {
                    portable_score(self, &project_members, &candidate_members)
                }
                // Prefer a specific asset over a portable one.
                None => {
                    candidate_members
                        .iter()
                        .map(|c| self.profile_compatibility(project, c))
                        .filter(|&s| s != i64::MIN)
                        .max()
                        .unwrap_or(i64::MIN)
                        / 2
                }
            };
        }

        let mut score = BASE_SCORE - version_distance(project.version(), candidate.version());
        if project.profile().eq_ignore_ascii_case(candidate.profile()) {
            score += 1;
        }
        if project.is_framework(candidate.framework()) {
            score += SAME_IDENTIFIER_BONUS;
        }
        score
    }
}

fn version_distance(a: FrameworkVersion, b: FrameworkVersion) -> i64 {
    a.components()
        .iter()
        .zip(b.components())
        .zip(VERSION_WEIGHTS)
        .map(|((&x, y), weight)| (x as i64 - y as i64).abs() * weight)
        .sum()
}

/// Penalises candidate members whose closest project match is a higher
/// version, then prefers profiles listing fewer frameworks.
fn portable_score(
    provider: &CompatibilityProvider,
    project_members: &[FrameworkName],
    candidate_members: &[FrameworkName],
) -> i64 {
    let mut penalty = 0i64;
    for candidate in candidate_members {
        let closest = project_members
            .iter()
            .filter(|p| provider.is_compatible(p, candidate))
            .max_by_key(|p| provider.profile_compatibility(p, candidate));
        if closest.is_some_and(|p| p.version() > candidate.version()) {
            penalty += 1;
        }
    }
    -(penalty * 50 + candidate_members.len() as i64)
}

#[cfg(test)]
mod test {
    use super::*;

    fn compat(project: &str, candidate: &str) -> bool {
        CompatibilityProvider::default()
            .is_compatible(&FrameworkName::parse(project), &FrameworkName::parse(candidate))
    }

    fn score(project: &str, candidate: &str) -> i64 {
        CompatibilityProvider::default()
            .profile_compatibility(&FrameworkName::parse(project), &FrameworkName::parse(candidate))
    }

    #[test]
    fn exact_and_version() {
        assert!(compat("net45", "net45"));
        assert!(compat("net45", "net40"));
        assert!(compat("net451", "net45"));
        assert!(!compat("net40", "net45"));
        assert!(compat("net45", ".NETFramework,Version=v4.5.0.0"));
    }

    #[test]
    fn sentinels() {
        assert!(compat("any", "net45"));
        assert!(compat("net45", "any"));
        assert!(compat("net45", "agnostic"));
        assert!(!compat("unsupported", "net45"));
        assert!(!compat("unsupported", "agnostic"));
        assert!(!compat("net45", "unsupported"));
        assert!(!compat("agnostic", "net45"));
        assert!(compat("agnostic", "agnostic"));
    }

    #[test]
    fn project_equivalents_are_one_way() {
        assert!(compat("dnx451", "aspnet50"));
        assert!(!compat("aspnet50", "dnx451"));
        assert!(compat("dnxcore50", "aspnetcore50"));
        assert!(!compat("aspnetcore50", "dnxcore50"));
        assert!(compat("aspnet50", "net45"));
    }

    #[test]
    fn expansions() {
        assert!(compat("dnx451", "net45"));
        assert!(compat("dnx451", "net451"));
        assert!(compat("win81", "netcore45"));
        assert!(compat("win8", "netcore45"));
        assert!(compat("uap10.0", "win81"));
        assert!(compat("uap10.0", "wpa81"));
        assert!(!compat("win81", "uap10.0"));
        assert!(compat("net46", "dotnet54"));
        assert!(!compat("net45", "dotnet53"));
        assert!(compat("dnxcore50", "dotnet55"));
        assert!(!compat("dnxcore50", "net45"));
    }

    #[test]
    fn profiles() {
        assert!(compat("net40-client", "net40"));
        assert!(compat("net40", "net40-client"));
        assert!(compat("sl4-wp71", "sl3-wp"));
        assert!(!compat("net40", "net40-cf"));
    }

    #[test]
    fn portable() {
        // A portable candidate serves any of its members.
        assert!(compat("net45", "portable-net45+win8"));
        assert!(compat("win81", "portable-net45+win8"));
        assert!(!compat("sl5", "portable-net45+win8"));
        assert!(compat("net45", "portable-Profile7"));

        assert!(compat("portable-net45+win8+wp8", "portable-net45+win8"));
        assert!(!compat("portable-net45+win8", "portable-net45+win8+wp8"));
        assert!(compat("portable-net45+win8", "portable-net40+win8"));
        assert!(!compat("portable-net40+win8", "portable-net45+win8"));

        // A portable project needs a candidate every member can use.
        assert!(compat("portable-net45+win8", "dotnet50"));
        assert!(!compat("portable-net45+win8", "net45"));
    }

    #[test]
    fn scores_prefer_closest() {
        assert_eq!(score("net40", "net45"), i64::MIN);
        assert!(score("net45", "net45") > score("net45", "net40"));
        assert!(score("net451", "net45") > score("net451", "net40"));
        assert!(score("dnx451", "dnx451") > score("dnx451", "net451"));
        assert!(score("net40-client", "net40-client") > score("net40-client", "net40"));
        assert!(score("net45", "net45") > score("net45", "portable-net45+win8"));
    }

    #[test]
    fn portable_scores_prefer_fewer_members() {
        let project = "portable-net45+win8+wp8";
        assert!(score(project, "portable-net45+win8") > score(project, "portable-net45+win8+wp8"));
        assert!(score(project, "portable-net45+win8") > score(project, "portable-net40+win8"));
    }
}
