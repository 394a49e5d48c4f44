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

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pgmesh",
    version,
    about = "Parallel SQL execution and connectivity probing across PostgreSQL cluster nodes",
    long_about = "pgmesh runs arbitrary SQL commands on a set of PostgreSQL cluster nodes, either\none at a time or concurrently over a single-task polling loop, and reports a\nuniform per-node success/failure record even when individual nodes are\nunreachable or slow. It can also probe full node-to-node reachability by asking\nevery node to check connectivity to every other node.",
    after_help = "EXAMPLES:\n  Run a query on hosts:       pgmesh -H db1,db2:6432 exec \"SELECT version()\"\n  Use a configured cluster:   pgmesh -c production exec \"SELECT 1\"\n  Run sequentially:           pgmesh -c production --sequential exec \"VACUUM\"\n  Check one node:             pgmesh check db1:5432\n  Probe the full mesh:        pgmesh -c production mesh"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(
        short = 'H',
        long,
        value_delimiter = ',',
        help = "Comma-separated list of nodes in hostname[:port] format"
    )]
    pub hosts: Option<Vec<String>>,

    #[arg(short = 'c', long, help = "Cluster name from configuration file")]
    pub cluster: Option<String>,

    #[arg(
        long,
        default_value = "~/.config/pgmesh/config.yaml",
        help = "Configuration file path [default: ~/.config/pgmesh/config.yaml]"
    )]
    pub config: PathBuf,

    #[arg(short = 'u', long, help = "Database user for connections")]
    pub user: Option<String>,

    #[arg(short = 'd', long, help = "Database name to connect to")]
    pub database: Option<String>,

    #[arg(
        long,
        help = "Run commands one at a time instead of in parallel"
    )]
    pub sequential: bool,

    #[arg(long, help = "Connection handshake timeout in seconds")]
    pub connect_timeout: Option<u64>,

    #[arg(
        long,
        help = "Sleep between parallel drain sweeps, in milliseconds"
    )]
    pub poll_interval: Option<u64>,

    #[arg(
        short = 'v',
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Execute a SQL command on the target nodes")]
    Exec {
        #[arg(trailing_var_arg = true, required = true, help = "SQL command to execute")]
        command: Vec<String>,
    },

    #[command(about = "Check connectivity to a single node with a trivial round-trip query")]
    Check {
        #[arg(help = "Node to check, in hostname[:port] format")]
        node: String,
    },

    #[command(
        about = "Probe node-to-node reachability across the whole cluster",
        long_about = "Opens a connection to every node in the cluster and asks it to check\nconnectivity to every node in the list, itself included. Reachability is\nthree-valued: reachable, unreachable, or unknown when the probing connection\nto the source node could not be established at all."
    )]
    Mesh,

    #[command(about = "List configured clusters")]
    List,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exec_with_hosts() {
        let cli = Cli::parse_from(["pgmesh", "-H", "db1,db2:6432", "exec", "SELECT 1"]);
        assert_eq!(
            cli.hosts,
            Some(vec!["db1".to_string(), "db2:6432".to_string()])
        );
        match cli.command {
            Some(Commands::Exec { command }) => assert_eq!(command, vec!["SELECT 1"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_sequential_flag() {
        let cli = Cli::parse_from(["pgmesh", "-c", "prod", "--sequential", "exec", "VACUUM"]);
        assert!(cli.sequential);
        assert_eq!(cli.cluster.as_deref(), Some("prod"));
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::parse_from(["pgmesh", "check", "db1:5432"]);
        match cli.command {
            Some(Commands::Check { node }) => assert_eq!(node, "db1:5432"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_verbosity_count() {
        let cli = Cli::parse_from(["pgmesh", "-vv", "mesh"]);
        assert_eq!(cli.verbose, 2);
    }
}
