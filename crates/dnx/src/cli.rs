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

pub mod compat;
pub mod expand;
pub mod nearest;
pub mod resolve;

pub use compat::*;
pub use expand::*;
pub use nearest::*;
pub use resolve::*;

use anyhow::bail;
use dnxutil::{FrameworkName, cli::UniversalFlags};

#[derive(Debug, clap::Parser)]
#[clap(
    name = "dnx",
    about = "Dependency resolution and framework compatibility for DNX projects."
)]
pub struct DnxCli {
    #[clap(subcommand)]
    pub subcommand: DnxSubcommands,

    #[clap(flatten)]
    pub flags: UniversalFlags,
}

#[derive(Debug, clap::Parser)]
pub enum DnxSubcommands {
    Resolve(ResolveSubcommand),

    // Frameworks
    Compat(CompatSubcommand),
    Nearest(NearestSubcommand),
    Expand(ExpandSubcommand),
}

/// Parses a framework that must be recognized, such as a build target.
pub fn parse_target_framework(s: &str) -> anyhow::Result<FrameworkName> {
    let framework = FrameworkName::parse(s);
    if framework.is_unsupported() {
        bail!("unrecognized framework `{}`", s);
    }
    Ok(framework)
}
