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

pub mod catalog;
pub mod cli;
pub mod framework;
pub mod library;
pub mod version;
pub mod version_range;

pub use framework::{FrameworkName, FrameworkVersion};
pub use library::{
    LibraryDependency, LibraryDependencyType, LibraryDescription, LibraryIdentity, LibraryRange,
    LibraryType,
};
pub use version::SemanticVersion;
pub use version_range::{FloatBehavior, VersionRange};
