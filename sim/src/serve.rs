//! One node of a deployment over real UDP.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::ValueEnum;
use codec::{TypeRegistry, Vec3};
use net::Node;
use transport::{format_address, parse_address, UdpTransport};

use crate::config::SimConfig;
use crate::host::{ClientHost, ServerHost, Tally};
use crate::world::{methods, Walkers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Role {
    /// Zone authority, simulating zone 0 itself.
    Authority,
    /// Zone server joining an authority.
    Server,
    /// Player spawning one walker.
    Client,
}

#[derive(Debug, clap::Args)]
pub struct ServeArgs {
    #[arg(long, value_enum, default_value_t = Role::Authority)]
    role: Role,
    /// Local address; the port may move up if taken.
    #[arg(long)]
    bind: Option<String>,
    /// Authority to join (server) or server to enter through (client).
    #[arg(long)]
    connect: Option<String>,
    /// Stop after this long; 0 runs until killed.
    #[arg(long, default_value_t = 0)]
    duration_ms: u64,
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,
    /// First object id this server hands out.
    #[arg(long)]
    object_id_base: Option<u32>,
    #[arg(long, default_value = "player")]
    name: String,
    /// Walker speed in units per second.
    #[arg(long, default_value_t = 8.0)]
    speed: f32,
}

pub fn run(config: &SimConfig, args: &ServeArgs) -> Result<()> {
    let bind = args.bind.as_deref().map(parse_address).transpose()?;
    let transport = UdpTransport::start(bind, &config.transport).context("start udp transport")?;
    let mut node_config = config.node.clone();
    node_config.protocol_authority = args.role != Role::Client;
    if let Some(base) = args.object_id_base {
        node_config.object_id_base = base;
    }
    let node = Node::new(transport, node_config, methods()?, TypeRegistry::new())?;
    log::info!(
        "{:?} listening on {}",
        args.role,
        format_address(node.local_addr())
    );

    let mut tally = Tally::default();
    match args.role {
        Role::Authority | Role::Server => {
            let mut host = if args.role == Role::Authority {
                ServerHost::authority(node, config)?
            } else {
                ServerHost::joining(node, config, remote(args)?)?
            };
            let mut world = Walkers::new(args.speed);
            let bounds = config.layout.bounds();
            drive(args, |now, dt_ms| {
                world.advance(dt_ms, bounds, |object| host.authors(object));
                host.step(&mut world, now, &mut tally);
                Ok(())
            })?;
        }
        Role::Client => {
            let mut host = ClientHost::new(node, remote(args)?, &args.name, Vec3::ZERO)?;
            drive(args, |now, _| host.step(now, &mut tally))?;
        }
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&tally).context("serialize tally")?
    );
    Ok(())
}

fn remote(args: &ServeArgs) -> Result<std::net::SocketAddr> {
    let address = args
        .connect
        .as_deref()
        .with_context(|| format!("--connect is required for {:?}", args.role))?;
    Ok(parse_address(address)?)
}

/// Calls `step(now, dt)` every tick against a monotonic millisecond clock.
fn drive(args: &ServeArgs, mut step: impl FnMut(u64, u64) -> Result<()>) -> Result<()> {
    let started = Instant::now();
    let tick = Duration::from_millis(args.tick_ms.max(1));
    let mut last = 0;
    loop {
        let now = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        step(now, now - last)?;
        last = now;
        if args.duration_ms > 0 && now >= args.duration_ms {
            return Ok(());
        }
        thread::sleep(tick);
    }
}
