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

use std::{
    collections::{HashSet, VecDeque},
    sync::Arc,
};

use super::{FrameworkMappings, FrameworkName, FrameworkVersion, mappings::FrameworkRange};

/// Derives every framework reachable from a framework through the
/// equivalence, subset, one-way compatibility and profile tables.
#[derive(Debug, Clone)]
pub struct FrameworkExpander {
    mappings: Arc<FrameworkMappings>,
}

impl Default for FrameworkExpander {
    fn default() -> Self {
        Self::new(FrameworkMappings::shared())
    }
}

impl FrameworkExpander {
    pub fn new(mappings: Arc<FrameworkMappings>) -> Self {
        FrameworkExpander { mappings }
    }

    /// Breadth-first closure over the direct expansions of `framework`. The
    /// framework itself is not yielded. Calling this again restarts the walk.
    pub fn expand(&self, framework: &FrameworkName) -> Expansion<'_> {
        let mut seen = HashSet::new();
        seen.insert(framework.clone());
        Expansion {
            mappings: &self.mappings,
            queue: self.direct(framework).into_iter().collect(),
            seen,
        }
    }

    fn direct(&self, framework: &FrameworkName) -> Vec<FrameworkName> {
        direct_expansions(&self.mappings, framework)
    }
}

#[derive(Debug, Clone)]
pub struct Expansion<'a> {
    mappings: &'a FrameworkMappings,
    queue: VecDeque<FrameworkName>,
    seen: HashSet<FrameworkName>,
}

impl Iterator for Expansion<'_> {
    type Item = FrameworkName;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(framework) = self.queue.pop_front() {
            if !self.seen.insert(framework.clone()) {
                continue;
            }
            for next in direct_expansions(self.mappings, &framework) {
                if !self.seen.contains(&next) {
                    self.queue.push_back(next);
                }
            }
            return Some(framework);
        }
        None
    }
}

fn direct_expansions(mappings: &FrameworkMappings, framework: &FrameworkName) -> Vec<FrameworkName> {
    let mut out = Vec::new();

    for (a, b) in &mappings.equivalent_frameworks {
        if a == framework {
            out.push(b.clone());
        } else if b == framework {
            out.push(a.clone());
        }
    }

    // Equivalents of any earlier version of the same framework.
    let lower = FrameworkRange::new(
        framework.clone().with_version(FrameworkVersion::EMPTY),
        framework.clone(),
    );
    for (a, b) in &mappings.equivalent_frameworks {
        if lower.satisfies(a) {
            out.push(b.clone());
        }
        if lower.satisfies(b) {
            out.push(a.clone());
        }
    }

    if !framework.has_profile() {
        for (subset, superset) in &mappings.subset_frameworks {
            if framework.is_framework(superset) {
                out.push(FrameworkName::new(subset.clone(), framework.version()));
            }
        }
    }

    for mapping in &mappings.compatibility_mappings {
        if mapping.target.satisfies(framework) {
            out.push(mapping.supported.min.clone());
            out.push(mapping.supported.max.clone());
        }
    }

    for p in &mappings.equivalent_profiles {
        if !framework.is_framework(&p.identifier) {
            continue;
        }
        if framework.profile().eq_ignore_ascii_case(&p.profile) {
            out.push(framework.clone().with_profile(p.equivalent.clone()));
        } else if framework.profile().eq_ignore_ascii_case(&p.equivalent) {
            out.push(framework.clone().with_profile(p.profile.clone()));
        }
    }

    out.retain(|f| f != framework);
    out
}

#[cfg(test)]
mod test {
    use expect_test::expect;

    use super::*;

    fn expand(s: &str) -> Vec<String> {
        FrameworkExpander::default()
            .expand(&FrameworkName::parse(s))
            .map(|f| f.short_folder_name())
            .collect()
    }

    #[test]
    fn expand_phone_app() {
        expect![[r#"
            [
                "wpa",
                "dotnet50",
                "dotnet53",
                "dotnet",
            ]
        "#]]
        .assert_debug_eq(&expand("wpa81"));
    }

    #[test]
    fn expand_dnx() {
        let expanded = expand("dnx451");
        for name in ["dnx45", "dnx", "net451", "net45", "net451-client", "dotnet53"] {
            assert!(expanded.iter().any(|e| e == name), "missing {name}");
        }
        assert!(!expanded.iter().any(|e| e == "aspnet50"));
        assert!(!expanded.iter().any(|e| e == "dnx451"));
    }

    #[test]
    fn expand_windows() {
        let expanded = expand("win81");
        for name in ["win8", "netcore451", "netcore45", "dotnet53"] {
            assert!(expanded.iter().any(|e| e == name), "missing {name}");
        }
    }

    #[test]
    fn expansion_is_restartable() {
        let expander = FrameworkExpander::default();
        let framework = FrameworkName::parse("uap10.0");
        let first: Vec<_> = expander.expand(&framework).collect();
        let second: Vec<_> = expander.expand(&framework).collect();
        assert_eq!(first, second);
        assert!(first.contains(&FrameworkName::parse("win81")));
        assert!(first.contains(&FrameworkName::parse("wpa81")));
        assert!(!first.contains(&framework));
    }

    #[test]
    fn sentinels_do_not_expand() {
        assert!(expand("any").is_empty());
        assert!(expand("unsupported").is_empty());
    }
}
