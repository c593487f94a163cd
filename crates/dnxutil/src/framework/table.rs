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

use indexmap::IndexMap;

use super::{CompatibilityProvider, FrameworkName, FrameworkReducer};

/// Pairwise compatibility over a fixed set of frameworks, typically the ones
/// a single project or package declares.
#[derive(Debug, Clone)]
pub struct CompatibilityTable {
    table: IndexMap<FrameworkName, Vec<FrameworkName>>,
    reducer: FrameworkReducer,
}

impl CompatibilityTable {
    pub fn new(frameworks: impl IntoIterator<Item = FrameworkName>) -> Self {
        Self::with_provider(frameworks, CompatibilityProvider::default())
    }

    pub fn with_provider(
        frameworks: impl IntoIterator<Item = FrameworkName>,
        provider: CompatibilityProvider,
    ) -> Self {
        let mut universe: Vec<FrameworkName> = Vec::new();
        for framework in frameworks {
            if framework.is_specific() && !universe.contains(&framework) {
                universe.push(framework);
            }
        }

        let table = universe
            .iter()
            .map(|project| {
                let compatible = universe
                    .iter()
                    .filter(|candidate| provider.is_compatible(project, candidate))
                    .cloned()
                    .collect();
                (project.clone(), compatible)
            })
            .collect();

        CompatibilityTable {
            table,
            reducer: FrameworkReducer::new(provider),
        }
    }

    pub fn has_framework(&self, framework: &FrameworkName) -> bool {
        self.table.contains_key(framework)
    }

    pub fn frameworks(&self) -> impl Iterator<Item = &FrameworkName> {
        self.table.keys()
    }

    /// The members of the table a member framework can consume, itself
    /// included.
    pub fn try_get_compatible(&self, framework: &FrameworkName) -> Option<&[FrameworkName]> {
        self.table.get(framework).map(Vec::as_slice)
    }

    /// The smallest set of table members that covers everything `framework`
    /// can consume from the table.
    pub fn get_nearest(&self, framework: &FrameworkName) -> Vec<FrameworkName> {
        let compatible: Vec<FrameworkName> = self
            .table
            .keys()
            .filter(|candidate| self.reducer.provider().is_compatible(framework, candidate))
            .cloned()
            .collect();
        self.reducer.reduce_upwards(&compatible)
    }
}

#[cfg(test)]
mod test {
    use expect_test::expect;

    use super::*;

    fn table(names: &[&str]) -> CompatibilityTable {
        CompatibilityTable::new(names.iter().map(|n| FrameworkName::parse(n)))
    }

    #[test]
    fn builds_pairwise_table() {
        let table = table(&["net40", "net45", "dnx451", "any", "win8"]);
        assert!(!table.has_framework(&FrameworkName::any()));
        let compatible: Vec<String> = table
            .try_get_compatible(&FrameworkName::parse("dnx451"))
            .unwrap()
            .iter()
            .map(FrameworkName::short_folder_name)
            .collect();
        expect![[r#"
            [
                "net40",
                "net45",
                "dnx451",
            ]
        "#]]
        .assert_debug_eq(&compatible);
        assert!(table.try_get_compatible(&FrameworkName::parse("net46")).is_none());
    }

    #[test]
    fn nearest_covering_set() {
        let table = table(&["net40", "net45", "win8", "portable-net45+win8"]);
        let names = |f: &str| -> Vec<String> {
            table
                .get_nearest(&FrameworkName::parse(f))
                .iter()
                .map(FrameworkName::short_folder_name)
                .collect()
        };
        assert_eq!(names("net451"), ["net45"]);
        assert_eq!(names("win81"), ["win8"]);
        assert_eq!(names("sl5"), Vec::<String>::new());
        assert_eq!(names("portable-net45+win8"), ["portable-net45+win8"]);
    }
}
