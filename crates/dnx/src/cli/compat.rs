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

use dnxutil::{FrameworkName, cli::UniversalFlags, framework::CompatibilityProvider};

/// Check whether a project framework can consume a candidate framework
#[derive(Debug, clap::Parser)]
pub struct CompatSubcommand {
    /// The framework of the consuming project, e.g. `dnx451`
    pub project: String,

    /// The framework an asset was built for, e.g. `net45`
    pub candidate: String,
}

pub fn run_compat(cli: &UniversalFlags, cmd: CompatSubcommand) -> anyhow::Result<i32> {
    let project = FrameworkName::parse(&cmd.project);
    let candidate = FrameworkName::parse(&cmd.candidate);
    let provider = CompatibilityProvider::default();

    let compatible = provider.is_compatible(&project, &candidate);
    println!("{}", if compatible { "compatible" } else { "incompatible" });
    if !cli.quiet {
        println!(
            "score: {}",
            provider.profile_compatibility(&project, &candidate)
        );
    }
    Ok(0)
}
