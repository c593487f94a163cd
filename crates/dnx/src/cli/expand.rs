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

use dnxutil::{FrameworkName, cli::UniversalFlags, framework::FrameworkExpander};

use super::parse_target_framework;

/// List the frameworks a framework is equivalent to or can consume
#[derive(Debug, clap::Parser)]
pub struct ExpandSubcommand {
    pub framework: String,
}

pub fn run_expand(_cli: &UniversalFlags, cmd: ExpandSubcommand) -> anyhow::Result<i32> {
    let framework: FrameworkName = parse_target_framework(&cmd.framework)?;
    let expander = FrameworkExpander::default();
    for expansion in expander.expand(&framework) {
        println!("{}", expansion.short_folder_name());
    }
    Ok(0)
}
