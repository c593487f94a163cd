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

use super::{CompatibilityProvider, FrameworkName};

/// Picks the best framework among candidates and collapses candidate sets.
#[derive(Debug, Clone, Default)]
pub struct FrameworkReducer {
    provider: CompatibilityProvider,
}

impl FrameworkReducer {
    pub fn new(provider: CompatibilityProvider) -> Self {
        FrameworkReducer { provider }
    }

    pub fn provider(&self) -> &CompatibilityProvider {
        &self.provider
    }

    /// The candidate a project targeting `framework` should use, if any.
    ///
    /// An exact match wins outright. Otherwise the compatible candidates are
    /// reduced upwards and the one with the best profile compatibility score
    /// is taken; the earliest candidate wins ties.
    pub fn get_nearest<'a>(
        &self,
        framework: &FrameworkName,
        candidates: &'a [FrameworkName],
    ) -> Option<&'a FrameworkName> {
        if let Some(exact) = candidates.iter().find(|c| *c == framework) {
            return Some(exact);
        }

        let compatible: Vec<&FrameworkName> = candidates
            .iter()
            .filter(|c| self.provider.is_compatible(framework, c))
            .collect();
        let reduced = self.reduce_upwards_refs(&compatible);

        let mut best: Option<(&FrameworkName, i64)> = None;
        for candidate in reduced {
            let score = self.provider.profile_compatibility(framework, candidate);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((candidate, score));
            }
        }
        best.map(|(c, _)| c)
    }

    /// Drops frameworks that are equivalent to an earlier one in the list.
    pub fn reduce_equivalent(&self, frameworks: &[FrameworkName]) -> Vec<FrameworkName> {
        let refs: Vec<&FrameworkName> = frameworks.iter().collect();
        self.reduce_equivalent_refs(&refs).into_iter().cloned().collect()
    }

    /// Keeps the highest frameworks: anything another member can consume is
    /// removed.
    pub fn reduce_upwards(&self, frameworks: &[FrameworkName]) -> Vec<FrameworkName> {
        let refs: Vec<&FrameworkName> = frameworks.iter().collect();
        self.reduce_upwards_refs(&refs).into_iter().cloned().collect()
    }

    /// Keeps the lowest frameworks: anything that can consume another member
    /// is removed.
    pub fn reduce_downwards(&self, frameworks: &[FrameworkName]) -> Vec<FrameworkName> {
        let refs: Vec<&FrameworkName> = frameworks.iter().collect();
        self.reduce_core(&refs, |x, y| self.provider.is_compatible(x, y))
            .into_iter()
            .cloned()
            .collect()
    }

    fn reduce_upwards_refs<'a>(&self, frameworks: &[&'a FrameworkName]) -> Vec<&'a FrameworkName> {
        self.reduce_core(frameworks, |x, y| self.provider.is_compatible(y, x))
    }

    fn reduce_equivalent_refs<'a>(&self, frameworks: &[&'a FrameworkName]) -> Vec<&'a FrameworkName> {
        let mut kept: Vec<&FrameworkName> = Vec::new();
        for &framework in frameworks {
            let duplicate = kept.iter().any(|k| {
                *k == framework
                    || (k.is_specific()
                        && framework.is_specific()
                        && self.provider.is_compatible(k, framework)
                        && self.provider.is_compatible(framework, k))
            });
            if !duplicate {
                kept.push(framework);
            }
        }
        kept
    }

    /// Removes every `x` for which some other `y` makes `redundant(x, y)`
    /// true. `Any` is dropped unless it is all that is left.
    fn reduce_core<'a>(
        &self,
        frameworks: &[&'a FrameworkName],
        redundant: impl Fn(&FrameworkName, &FrameworkName) -> bool,
    ) -> Vec<&'a FrameworkName> {
        let mut input = frameworks.to_vec();
        if input.iter().any(|f| !f.is_any()) {
            input.retain(|f| !f.is_any());
        }
        let input = self.reduce_equivalent_refs(&input);
        if input.len() <= 1 {
            return input;
        }

        let mut result: Vec<&FrameworkName> = input
            .iter()
            .copied()
            .filter(|x| !input.iter().any(|y| y != x && redundant(x, y)))
            .collect();
        result.sort_by(|a, b| {
            a.framework()
                .to_ascii_lowercase()
                .cmp(&b.framework().to_ascii_lowercase())
                .then(a.version().cmp(&b.version()))
                .then(a.profile().to_ascii_lowercase().cmp(&b.profile().to_ascii_lowercase()))
        });
        result
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse_all(names: &[&str]) -> Vec<FrameworkName> {
        names.iter().map(|n| FrameworkName::parse(n)).collect()
    }

    fn short_names(frameworks: &[FrameworkName]) -> Vec<String> {
        frameworks.iter().map(FrameworkName::short_folder_name).collect()
    }

    fn nearest(project: &str, candidates: &[&str]) -> Option<String> {
        let candidates = parse_all(candidates);
        FrameworkReducer::default()
            .get_nearest(&FrameworkName::parse(project), &candidates)
            .map(FrameworkName::short_folder_name)
    }

    #[test]
    fn nearest_prefers_exact_then_highest_compatible() {
        assert_eq!(nearest("net45", &["net40", "net45", "net20"]).as_deref(), Some("net45"));
        assert_eq!(nearest("net451", &["net40", "net45", "net20"]).as_deref(), Some("net45"));
        assert_eq!(nearest("net35", &["net40", "net45"]), None);
        assert_eq!(nearest("dnx451", &["net40", "dnx451"]).as_deref(), Some("dnx451"));
        assert_eq!(nearest("dnx451", &["net40", "aspnet50"]).as_deref(), Some("aspnet50"));
    }

    #[test]
    fn nearest_prefers_specific_over_portable() {
        assert_eq!(
            nearest("net45", &["portable-net45+win8", "net40"]).as_deref(),
            Some("net40")
        );
        assert_eq!(
            nearest("win81", &["portable-net45+win8", "net40"]).as_deref(),
            Some("portable-net45+win8")
        );
    }

    #[test]
    fn nearest_with_any() {
        assert_eq!(nearest("net45", &["any"]).as_deref(), Some("any"));
        assert_eq!(nearest("net45", &["any", "net40"]).as_deref(), Some("net40"));
    }

    #[test]
    fn reduce() {
        let reducer = FrameworkReducer::default();
        let set = parse_all(&["net45", "net40", "win8", "net451", "any"]);
        assert_eq!(short_names(&reducer.reduce_upwards(&set)), ["net451", "win8"]);
        assert_eq!(short_names(&reducer.reduce_downwards(&set)), ["net40", "win8"]);

        let equivalent = parse_all(&["win8", "netcore45", "win", "net45"]);
        assert_eq!(short_names(&reducer.reduce_equivalent(&equivalent)), ["win8", "net45"]);
    }
}
