use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info, warn};

use survey_plan::canvas::{MapCanvas, MarkerStyle, NullCanvas};
use survey_plan::model::{MarkerRef, Waypoint};
use survey_plan::overlay::Overlay;
use survey_plan::{doctor as plan_doctor, MapEvent, MissionEvent, Pattern, PatternController, PlannerConfig};
use survey_proto::wire::RpcCommand;
use survey_uplink::{doctor as uplink_doctor, Uplink};
use tokio::sync::mpsc::{self, error::TrySendError};

#[derive(Debug, Parser)]
#[command(name = "survey", version, about = "Survey - mission pattern planner")]
struct Cli {
    #[arg(long)]
    config: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Doctor,
    /// Replay map events and print every overlay redraw as a JSON line.
    Plan { events: String },
    /// Replay map events and send begun missions to the vehicle.
    Run { events: String },
}

#[derive(Debug, serde::Deserialize)]
struct Config {
    #[serde(default)]
    planner: PlannerConfig,
    uplink: UplinkCfg,
}

#[derive(Debug, serde::Deserialize)]
struct UplinkCfg {
    enable: bool,
    endpoint: String,
    #[serde(default = "default_timeout_ms")]
    timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    2000
}

fn load_config(path: &str) -> Result<Config> {
    let s = std::fs::read_to_string(path).context("read config")?;
    Ok(toml::from_str(&s).context("parse config toml")?)
}

/// Newline-delimited JSON `MapEvent`s; blank lines and `#` comments are skipped.
async fn load_events(path: &str) -> Result<Vec<MapEvent>> {
    let s = tokio::fs::read_to_string(path).await.with_context(|| format!("read events {}", path))?;
    let mut out = Vec::new();
    for (i, line) in s.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let ev = serde_json::from_str(line).with_context(|| format!("{}:{}: bad event", path, i + 1))?;
        out.push(ev);
    }
    Ok(out)
}

#[derive(Serialize)]
struct Frame<'a> {
    pattern: Pattern,
    #[serde(skip_serializing_if = "Option::is_none")]
    markers: Option<Vec<[f64; 3]>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<MarkerStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    overlay: Option<&'a Overlay>,
}

/// Canvas that prints what it is asked to draw.
struct JsonLines;

impl JsonLines {
    fn emit(&self, frame: &Frame<'_>) {
        match serde_json::to_string(frame) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("plan: cannot render frame: {:#}", e),
        }
    }
}

impl MapCanvas for JsonLines {
    fn show_markers(&mut self, pattern: Pattern, markers: &[(MarkerRef, Waypoint)], style: MarkerStyle) {
        let markers = markers.iter().map(|(_, wp)| wp.to_wire()).collect();
        self.emit(&Frame { pattern, markers: Some(markers), style: Some(style), overlay: None });
    }

    fn hide_markers(&mut self, pattern: Pattern) {
        self.emit(&Frame { pattern, markers: Some(Vec::new()), style: None, overlay: None });
    }

    fn draw_overlay(&mut self, pattern: Pattern, overlay: &Overlay) {
        self.emit(&Frame { pattern, markers: None, style: None, overlay: Some(overlay) });
    }

    fn clear_overlay(&mut self, pattern: Pattern) {
        self.emit(&Frame { pattern, markers: None, style: None, overlay: Some(&Overlay::Empty) });
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    match cli.cmd {
        Command::Doctor => doctor(&cfg)?,
        Command::Plan { events } => plan(&cfg, &events).await?,
        Command::Run { events } => run(&cfg, &events).await?,
    }
    Ok(())
}

fn doctor(cfg: &Config) -> Result<()> {
    info!("doctor: starting");

    plan_doctor::check_planner(&cfg.planner)?;
    if cfg.uplink.enable {
        uplink_doctor::check_endpoint(&cfg.uplink.endpoint, cfg.uplink.timeout_ms)?;
    } else {
        warn!("doctor: uplink disabled, missions will not leave this host");
    }

    info!("doctor: OK");
    Ok(())
}

async fn plan(cfg: &Config, path: &str) -> Result<()> {
    let events = load_events(path).await?;
    info!("plan: replaying {} events", events.len());

    let mut ctl = controller(&cfg.planner, JsonLines)?;
    for ev in events {
        ctl.handle(ev);
        for out in ctl.take_events() {
            debug!("plan: mission event {:?}", out);
        }
    }
    Ok(())
}

/// Controller over a validated `[planner]` section.
fn controller<C: MapCanvas>(planner: &PlannerConfig, canvas: C) -> Result<PatternController<C>> {
    plan_doctor::check_planner(planner).context("[planner] config")?;
    Ok(PatternController::new(planner.clone(), canvas))
}

/// Hands `cmds` to the uplink worker without waiting; a full queue drops them.
fn forward(tx: &mpsc::Sender<Vec<RpcCommand>>, cmds: Vec<RpcCommand>) {
    match tx.try_send(cmds) {
        Ok(()) => {}
        Err(TrySendError::Full(cmds)) => warn!("run: uplink busy; dropped {} commands", cmds.len()),
        Err(TrySendError::Closed(cmds)) => warn!("run: uplink worker gone; dropped {} commands", cmds.len()),
    }
}

async fn run(cfg: &Config, path: &str) -> Result<()> {
    info!("run: starting");
    let events = load_events(path).await?;
    let mut ctl = controller(&cfg.planner, NullCanvas)?;

    let worker = if cfg.uplink.enable {
        Some(survey_uplink::spawn(Uplink::new(&cfg.uplink.endpoint, cfg.uplink.timeout_ms)?))
    } else {
        warn!("run: uplink disabled; commands are only logged");
        None
    };

    for ev in events {
        ctl.handle(ev);
        for out in ctl.take_events() {
            if let MissionEvent::Submit(sub) = &out {
                info!("run: submitting mode {} with {} waypoints", sub.mode.code(), sub.waypoints.len());
            }
            let cmds = out.rpc_commands();
            if cmds.is_empty() {
                continue;
            }
            match &worker {
                Some((tx, _)) => forward(tx, cmds),
                None => info!("run: would send {:?}", cmds),
            }
        }
    }

    if let Some((tx, handle)) = worker {
        drop(tx);
        handle.await.context("uplink worker")?;
    }
    info!("run: done");
    Ok(())
}
