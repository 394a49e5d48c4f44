// Copyright 2025 The pgmesh Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Terminal output formatting.

use owo_colors::OwoColorize;

use crate::executor::ExecutionResult;
use crate::mesh::ConnectivityRecord;

pub struct OutputFormatter;

impl OutputFormatter {
    pub fn format_command_header(command: &str, node_count: usize) -> String {
        format!(
            "\n{} {} on {} {}:\n{}\n",
            "►".cyan().bold(),
            "Executing".cyan(),
            node_count.to_string().bold(),
            if node_count == 1 { "node" } else { "nodes" },
            format!("  {command}").dimmed()
        )
    }

    pub fn format_node_result(result: &ExecutionResult) -> String {
        let node_str = result.node.to_string();
        if result.is_success() {
            let mut output = format!("{} {}", "●".green(), node_str.bold());
            if !result.text.is_empty() {
                output.push_str(&format!("\n    {}", result.text));
            }
            output.push('\n');
            output
        } else {
            format!(
                "{} {}\n    {}\n",
                "●".red(),
                node_str.bold(),
                result.text.red()
            )
        }
    }

    pub fn format_summary(total: usize, success: usize, failed: usize) -> String {
        let mut parts = Vec::new();

        parts.push(format!("{} commands", total.to_string().bold()));

        if success > 0 {
            parts.push(format!(
                "{} {}",
                success.to_string().green().bold(),
                "successful".green()
            ));
        }

        if failed > 0 {
            parts.push(format!(
                "{} {}",
                failed.to_string().red().bold(),
                "failed".red()
            ));
        }

        format!("\n{}\n", parts.join(" • "))
    }

    pub fn format_connectivity_record(record: &ConnectivityRecord) -> String {
        let verdict = match record.reachable {
            Some(true) => "reachable".green().to_string(),
            Some(false) => "unreachable".red().to_string(),
            None => "unknown".yellow().to_string(),
        };
        format!(
            "  {} {} {} — {}",
            record.source.to_string().bold(),
            "→".dimmed(),
            record.target.to_string().bold(),
            verdict
        )
    }

    pub fn format_mesh_summary(records: &[ConnectivityRecord]) -> String {
        let reachable = records
            .iter()
            .filter(|r| r.reachable == Some(true))
            .count();
        let unreachable = records
            .iter()
            .filter(|r| r.reachable == Some(false))
            .count();
        let unknown = records.iter().filter(|r| r.reachable.is_none()).count();

        let mut parts = vec![format!("{} pairs", records.len().to_string().bold())];
        if reachable > 0 {
            parts.push(format!("{} {}", reachable.to_string().green().bold(), "reachable".green()));
        }
        if unreachable > 0 {
            parts.push(format!(
                "{} {}",
                unreachable.to_string().red().bold(),
                "unreachable".red()
            ));
        }
        if unknown > 0 {
            parts.push(format!(
                "{} {}",
                unknown.to_string().yellow().bold(),
                "unknown".yellow()
            ));
        }

        format!("\n{}\n", parts.join(" • "))
    }
}
