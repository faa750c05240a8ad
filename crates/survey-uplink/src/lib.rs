pub mod doctor;

use anyhow::{Context, Result};
use bytes::BytesMut;
use std::time::{Duration, Instant};
use survey_proto::frame;
use survey_proto::wire::{RpcCommand, RpcReply};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    sync::mpsc,
    task::JoinHandle,
    time::timeout,
};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct LinkHealth {
    pub rtt_ms: Option<u32>,
    pub quality: u8,           // 0-100
    pub consecutive_failures: u32,
}

impl Default for LinkHealth {
    fn default() -> Self {
        Self {
            rtt_ms: None,
            quality: 100,
            consecutive_failures: 0,
        }
    }
}

/// Outcome of one command batch.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub sent_unix_ms: i64,
    pub replies: Vec<RpcReply>,
}

/// `tcp://host:port` -> `host:port`
pub fn parse_endpoint(endpoint: &str) -> Result<String> {
    let ep = endpoint.strip_prefix("tcp://").context("endpoint must start with tcp://")?;
    let (host, port) = ep.rsplit_once(':').context("missing port")?;
    anyhow::ensure!(!host.is_empty(), "missing host");
    let port: u16 = port.parse().with_context(|| format!("bad port: {}", port))?;
    Ok(format!("{}:{}", host, port))
}

/// Client for the vehicle-side mission RPC.
pub struct Uplink {
    addr: String,
    timeout: Duration,
    health: LinkHealth,
}

impl Uplink {
    pub fn new(endpoint: &str, timeout_ms: u64) -> Result<Self> {
        Ok(Self {
            addr: parse_endpoint(endpoint)?,
            timeout: Duration::from_millis(timeout_ms),
            health: LinkHealth::default(),
        })
    }

    pub fn link_health(&self) -> &LinkHealth {
        &self.health
    }

    /// Sends `cmds` in order over one connection, waiting for each reply.
    /// Stops at the first refused command. Nothing is retried.
    pub async fn deliver(&mut self, cmds: &[RpcCommand]) -> Result<Delivery> {
        let start = Instant::now();
        let sent_unix_ms = (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;

        let result = timeout(self.timeout, exchange(&self.addr, cmds))
            .await
            .context("uplink timed out")
            .and_then(|r| r);

        match result {
            Ok(replies) => {
                let rtt = start.elapsed().as_millis() as u32;
                self.health.rtt_ms = Some(rtt);
                self.health.consecutive_failures = 0;
                self.health.quality = (self.health.quality + 10).min(100);
                info!("uplink: {} commands acknowledged (RTT: {}ms)", replies.len(), rtt);
                Ok(Delivery { sent_unix_ms, replies })
            }
            Err(e) => {
                self.health.consecutive_failures += 1;
                self.health.quality = self.health.quality.saturating_sub(20);
                warn!("uplink: delivery failed (failures: {}, quality: {}%): {:#}",
                      self.health.consecutive_failures, self.health.quality, e);
                Err(e)
            }
        }
    }
}

async fn exchange(addr: &str, cmds: &[RpcCommand]) -> Result<Vec<RpcReply>> {
    let mut tcp = TcpStream::connect(addr).await.with_context(|| format!("connect {}", addr))?;
    let mut buf = BytesMut::with_capacity(4096);
    let mut replies = Vec::with_capacity(cmds.len());

    for cmd in cmds {
        tcp.write_all(&frame::encode(cmd)?).await?;
        tcp.flush().await?;

        let reply: RpcReply = loop {
            if let Some(r) = frame::decode(&mut buf)? {
                break r;
            }
            let n = tcp.read_buf(&mut buf).await?;
            anyhow::ensure!(n > 0, "connection closed before reply");
        };
        anyhow::ensure!(reply.ok, "remote refused {:?}: {}", cmd, reply.message);
        replies.push(reply);
    }
    Ok(replies)
}

/// Runs `uplink` on a background task. Each batch received on the
/// returned sender is delivered in arrival order; failures are logged and
/// dropped.
pub fn spawn(mut uplink: Uplink) -> (mpsc::Sender<Vec<RpcCommand>>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<Vec<RpcCommand>>(16);
    let handle = tokio::spawn(async move {
        while let Some(cmds) = rx.recv().await {
            if let Err(e) = uplink.deliver(&cmds).await {
                warn!("uplink: batch of {} commands not delivered: {:#}", cmds.len(), e);
            }
        }
    });
    (tx, handle)
}
