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

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use pgmesh::{
    cli::{Cli, Commands},
    commands::{
        check::check_node,
        exec::{execute_command, ExecuteCommandParams},
        list::list_clusters,
        mesh::probe_mesh,
    },
    config::Config,
    executor::DEFAULT_POLL_INTERVAL,
    node::NodeAddress,
    topology::StaticTopology,
    utils::init_logging,
    wire::PgConnector,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = Config::load_with_priority(&cli.config).await?;

    // Handle list command first (doesn't need nodes or a connector)
    if matches!(cli.command, Some(Commands::List)) {
        list_clusters(&config);
        return Ok(());
    }

    // A Ctrl-C cancels the in-flight batch; executors close every open
    // connection before acknowledging the abort.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, cancelling");
                cancel.cancel();
            }
        });
    }

    let connector = build_connector(&cli, &config);

    let all_ok = match &cli.command {
        Some(Commands::Exec { command }) => {
            let nodes = resolve_nodes(&cli, &config)?;
            if nodes.is_empty() {
                anyhow::bail!(
                    "No hosts specified. Please use one of the following options:\n  -H <hosts>    Specify comma-separated hosts (e.g., -H db1,db2:6432)\n  -c <cluster>  Use a cluster from your configuration file"
                );
            }

            let command = command.join(" ");
            let params = ExecuteCommandParams {
                nodes,
                command: &command,
                sequential: cli.sequential,
                poll_interval: resolve_poll_interval(&cli, &config),
            };
            execute_command(&connector, params, &cancel).await?
        }
        Some(Commands::Check { node }) => {
            let node = NodeAddress::parse(node, config.defaults.port)
                .with_context(|| format!("Invalid node address: {node:?}"))?;
            check_node(&connector, &node).await?
        }
        Some(Commands::Mesh) => {
            let nodes = resolve_nodes(&cli, &config)?;
            if nodes.is_empty() {
                anyhow::bail!("No nodes to probe. Use -H <hosts> or -c <cluster>.");
            }
            let topology = StaticTopology::new(nodes);
            probe_mesh(&connector, &topology, &config.check_function(), &cancel).await?
        }
        Some(Commands::List) | None => {
            anyhow::bail!("No command specified. Try 'pgmesh --help'.")
        }
    };

    if !all_ok {
        std::process::exit(1);
    }

    Ok(())
}

/// Determine target nodes: explicit -H hosts take precedence over the
/// configured cluster.
fn resolve_nodes(cli: &Cli, config: &Config) -> Result<Vec<NodeAddress>> {
    if let Some(hosts) = &cli.hosts {
        return hosts
            .iter()
            .map(|host| {
                NodeAddress::parse(host, config.defaults.port)
                    .with_context(|| format!("Invalid host: {host:?}"))
            })
            .collect();
    }

    if let Some(cluster) = &cli.cluster {
        return config.cluster_nodes(cluster);
    }

    Ok(Vec::new())
}

fn build_connector(cli: &Cli, config: &Config) -> PgConnector {
    let cluster = cli.cluster.as_deref();

    let user = cli
        .user
        .clone()
        .or_else(|| config.user(cluster))
        .unwrap_or_else(|| std::env::var("USER").unwrap_or_else(|_| "postgres".to_string()));
    let database = cli
        .database
        .clone()
        .or_else(|| config.database(cluster))
        .unwrap_or_else(|| user.clone());
    let connect_timeout = cli
        .connect_timeout
        .or_else(|| config.connect_timeout(cluster))
        .unwrap_or(10);

    PgConnector::new(user, database)
        .with_password(config.password(cluster))
        .with_connect_timeout(Duration::from_secs(connect_timeout))
}

fn resolve_poll_interval(cli: &Cli, config: &Config) -> Duration {
    cli.poll_interval
        .or_else(|| config.poll_interval_ms(cli.cluster.as_deref()))
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_POLL_INTERVAL)
}
