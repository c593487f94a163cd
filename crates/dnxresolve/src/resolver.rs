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

pub mod result;
pub mod walker;

use thiserror::Error;

pub use result::{LibraryIndex, ResolvedLibrary, UnresolvedDependency, WalkResult};
pub use walker::DependencyWalker;

/// Errors that abort a walk. Missing libraries are not errors; they are
/// reported through [`WalkResult::unresolved`].
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("Cyclic dependency detected: {}", path.join(" -> "))]
    CyclicDependency { path: Vec<String> },
    #[error("Provider `{provider}` failed while resolving {range}")]
    Provider {
        provider: String,
        range: String,
        #[source]
        source: anyhow::Error,
    },
}
