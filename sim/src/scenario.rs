//! The whole deployment in one process over an in-memory network.

use anyhow::{Context, Result};
use codec::{ObjectId, Vec3};
use net::{Node, NodeConfig};
use serde::Serialize;
use transport::{format_address, MemoryNetwork, MemoryTransport};

use crate::config::SimConfig;
use crate::host::{ClientHost, ServerHost, Tally};
use crate::world::{methods, Walkers};

/// Ids handed out by each server start this far apart.
const ID_STRIDE: u32 = 1_000_000;

#[derive(Debug, Clone, Copy)]
pub struct ScenarioParams {
    pub clients: u32,
    pub duration_ms: u64,
    pub step_ms: u64,
    pub speed: f32,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub servers: usize,
    pub clients: usize,
    pub duration_ms: u64,
    pub step_ms: u64,
    pub tally: Tally,
    pub walkers: Vec<WalkerSummary>,
    pub players: Vec<PlayerSummary>,
}

#[derive(Debug, Serialize)]
pub struct WalkerSummary {
    pub object: u32,
    pub name: String,
    pub position: Vec3,
    /// Server authoring the walker at the end of the run.
    pub server: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlayerSummary {
    pub name: String,
    pub servers: Vec<String>,
    pub targets: Vec<(u32, String)>,
    pub visible: usize,
    pub syncs: u64,
}

struct Deployment {
    servers: Vec<ServerHost<MemoryTransport>>,
    clients: Vec<ClientHost<MemoryTransport>>,
    world: Walkers,
    tally: Tally,
}

pub fn run(config: &SimConfig, params: ScenarioParams) -> Result<Summary> {
    anyhow::ensure!(params.step_ms > 0, "step must be at least 1 ms");
    let network = MemoryNetwork::new();
    let mut deployment = Deployment::new(&network, config, params)?;
    let bounds = config.layout.bounds();

    let mut now = 0;
    while now < params.duration_ms {
        now += params.step_ms;
        deployment.step(now, params.step_ms, bounds)?;
    }
    log::info!(
        "{} handoffs, {} rollbacks after {now} ms",
        deployment.tally.handoffs,
        deployment.tally.rollbacks
    );
    Ok(deployment.summary(params))
}

impl Deployment {
    fn new(network: &MemoryNetwork, config: &SimConfig, params: ScenarioParams) -> Result<Self> {
        let mut servers: Vec<ServerHost<MemoryTransport>> = Vec::new();
        for index in 0..config.layout.zones {
            let mut node_config = config.node.clone().authority();
            node_config.object_id_base = config
                .node
                .object_id_base
                .saturating_add(index.saturating_mul(ID_STRIDE));
            let node = bind(network, config, node_config)?;
            let host = match servers.first() {
                None => ServerHost::authority(node, config)?,
                Some(authority) => {
                    ServerHost::joining(node, config, authority.node.local_addr())?
                }
            };
            servers.push(host);
        }
        let entry = servers
            .first()
            .map(|host| host.node.local_addr())
            .context("layout has no zones")?;

        let mut clients = Vec::new();
        for index in 0..params.clients {
            let mut node_config = config.node.clone();
            node_config.protocol_authority = false;
            let node = bind(network, config, node_config)?;
            let start = Vec3::new(index as f32 * 2.0 - 5.0, 0.0, 0.0);
            let name = format!("player-{index}");
            clients.push(ClientHost::new(node, entry, &name, start)?);
        }

        Ok(Self {
            servers,
            clients,
            world: Walkers::new(params.speed),
            tally: Tally::default(),
        })
    }

    fn step(&mut self, now: u64, dt_ms: u64, bounds: (f32, f32)) -> Result<()> {
        let servers = &self.servers;
        self.world.advance(dt_ms, bounds, |object| {
            servers.iter().any(|server| server.authors(object))
        });
        for server in &mut self.servers {
            server.step(&mut self.world, now, &mut self.tally);
        }
        for client in &mut self.clients {
            client.step(now, &mut self.tally)?;
        }
        Ok(())
    }

    fn author_of(&self, object: ObjectId) -> Option<String> {
        self.servers
            .iter()
            .find(|server| server.authors(object))
            .map(|server| format_address(server.node.local_addr()))
    }

    fn summary(self, params: ScenarioParams) -> Summary {
        let walkers = self
            .world
            .iter()
            .map(|(object, walker)| WalkerSummary {
                object: object.raw(),
                name: walker.name.clone(),
                position: walker.position,
                server: self.author_of(object),
            })
            .collect();
        let players = self
            .clients
            .iter()
            .map(|client| PlayerSummary {
                name: client.name().to_owned(),
                servers: client.servers.iter().copied().map(format_address).collect(),
                targets: client
                    .zone
                    .targets()
                    .map(|(object, server)| (object.raw(), format_address(server)))
                    .collect(),
                visible: client.sightings.visible.len(),
                syncs: client.sightings.syncs,
            })
            .collect();
        Summary {
            servers: self.servers.len(),
            clients: self.clients.len(),
            duration_ms: params.duration_ms,
            step_ms: params.step_ms,
            tally: self.tally,
            walkers,
            players,
        }
    }
}

fn bind(
    network: &MemoryNetwork,
    config: &SimConfig,
    node_config: NodeConfig,
) -> Result<Node<MemoryTransport>> {
    let transport = network.bind(None, &config.transport)?;
    let node = Node::new(transport, node_config, methods()?, codec::TypeRegistry::new())?;
    Ok(node)
}
