//! End-to-end tests for the full labrackd stack.
//!
//! Each test builds the rack from a TOML document through the same code path
//! as the daemon, pointing the devices at local fake instruments that speak
//! the bench supply line protocol over real TCP sockets.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use labrack_app::ports::RackPower;
use labrack_app::scheduler::PowerScheduler;
use labrack_domain::rack::{PowerAction, RackState};
use labrackd::config::Config;
use labrackd::rack;
use labrackd::runner::{self, Request};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// A bench supply with three outputs, all on at start.
#[derive(Clone)]
struct FakeSupply {
    port: u16,
    outputs: Arc<Mutex<[bool; 3]>>,
}

impl FakeSupply {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let supply = Self {
            port: listener.local_addr().unwrap().port(),
            outputs: Arc::new(Mutex::new([true; 3])),
        };
        let outputs = Arc::clone(&supply.outputs);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, Arc::clone(&outputs)));
            }
        });
        supply
    }

    fn outputs(&self) -> [bool; 3] {
        *self.outputs.lock().unwrap()
    }
}

async fn serve(stream: tokio::net::TcpStream, outputs: Arc<Mutex<[bool; 3]>>) {
    let mut stream = BufReader::new(stream);
    let mut line = String::new();
    while stream.read_line(&mut line).await.unwrap_or(0) > 0 {
        let reply = answer(line.trim(), &outputs);
        line.clear();
        if let Some(reply) = reply {
            if stream.get_mut().write_all(reply.as_bytes()).await.is_err() {
                return;
            }
        }
    }
}

fn answer(command: &str, outputs: &Mutex<[bool; 3]>) -> Option<String> {
    let mut outputs = outputs.lock().unwrap();
    if command == "*IDN?" {
        return Some("THURLBY THANDAR, MX180TP, 000000, 1.00\r\n".to_string());
    }
    if let Some(value) = command.strip_prefix("OPALL ") {
        *outputs = [value == "1"; 3];
        return None;
    }
    let rest = command.strip_prefix("OP")?;
    let index = usize::from(rest.as_bytes()[0] - b'1');
    match &rest[1..] {
        "?" => Some(format!("{}\r\n", u8::from(outputs[index]))),
        value => {
            outputs[index] = value.trim() == "1";
            None
        }
    }
}

async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

fn config(psu_a: u16, psu_b: u16, relay: u16) -> Config {
    Config::from_toml(&format!(
        r#"
[schedule]
poll_interval_ms = 10

[switch]
max_attempts = 4
attempt_timeout_ms = 1000

[adapters.line_tcp]
timeout_ms = 200
settle_ms = 0

[adapters.digest_http]
request_timeout_ms = 500

[[devices]]
name = "relay"
host = "127.0.0.1"
port = {relay}
protocol = "digest-http"
user = "admin"
password = "admin"

[[devices]]
name = "psu-a"
host = "127.0.0.1"
port = {psu_a}
protocol = "line-tcp"

[[devices]]
name = "psu-b"
host = "127.0.0.1"
port = {psu_b}
protocol = "line-tcp"

[plan]
power_on = [
    {{ device = "relay", channels = [0] }},
    {{ device = "psu-a", channels = [1] }},
    {{ device = "psu-b", channels = [1, 2] }},
]
power_off = [
    {{ device = "psu-b", channels = [1, 2] }},
    {{ device = "psu-a", channels = [1] }},
    {{ device = "relay", channels = [0] }},
]
"#
    ))
    .unwrap()
}

fn monday_at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 3)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_switch_only_planned_channels() {
    let (psu_a, psu_b) = (FakeSupply::start().await, FakeSupply::start().await);
    let mut rack = rack::build(&config(psu_a.port, psu_b.port, closed_port().await)).unwrap();

    let report = rack.power_off().await;

    assert_eq!(report.steps.len(), 3);
    assert_eq!(psu_a.outputs(), [false, true, true]);
    assert_eq!(psu_b.outputs(), [false, false, true]);
}

#[tokio::test]
async fn should_keep_going_when_a_device_is_unreachable() {
    let (psu_a, psu_b) = (FakeSupply::start().await, FakeSupply::start().await);
    let mut rack = rack::build(&config(psu_a.port, psu_b.port, closed_port().await)).unwrap();

    let report = rack.power_off().await;

    assert!(!report.is_complete());
    assert_eq!(report.failed_devices().collect::<Vec<_>>(), ["relay"]);
    assert!(report.steps[0].is_complete());
    assert!(report.steps[1].is_complete());
}

#[tokio::test]
async fn should_switch_back_on_in_plan_order() {
    let (psu_a, psu_b) = (FakeSupply::start().await, FakeSupply::start().await);
    let mut rack = rack::build(&config(psu_a.port, psu_b.port, closed_port().await)).unwrap();

    rack.power_off().await;
    let report = rack.power_on().await;

    let devices: Vec<_> = report.steps.iter().map(|step| step.device.as_str()).collect();
    assert_eq!(devices, ["relay", "psu-a", "psu-b"]);
    assert_eq!(psu_a.outputs(), [true; 3]);
    assert_eq!(psu_b.outputs(), [true; 3]);
}

// ---------------------------------------------------------------------------
// Schedule loop
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_power_off_at_evening_trigger() {
    let (psu_a, psu_b) = (FakeSupply::start().await, FakeSupply::start().await);
    let config = config(psu_a.port, psu_b.port, closed_port().await);
    let rack = rack::build(&config).unwrap();
    let mut scheduler = PowerScheduler::new(config.weekly_schedule().unwrap(), rack);
    let (tx, rx) = mpsc::channel(4);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        let _ = tx.send(Request::Shutdown).await;
    });

    runner::run(&mut scheduler, config.poll_interval(), || monday_at(18, 0), rx).await;

    assert_eq!(scheduler.state(), RackState::Unpowered);
    assert_eq!(psu_a.outputs(), [false, true, true]);
    assert_eq!(psu_b.outputs(), [false, false, true]);
}

#[tokio::test]
async fn should_apply_operator_overrides() {
    let (psu_a, psu_b) = (FakeSupply::start().await, FakeSupply::start().await);
    let config = config(psu_a.port, psu_b.port, closed_port().await);
    let rack = rack::build(&config).unwrap();
    let mut scheduler = PowerScheduler::new(config.weekly_schedule().unwrap(), rack);
    let (tx, rx) = mpsc::channel(4);
    tx.send(Request::Override(PowerAction::PowerOff)).await.unwrap();
    drop(tx);

    runner::run(&mut scheduler, config.poll_interval(), || monday_at(12, 0), rx).await;

    assert_eq!(scheduler.state(), RackState::Unpowered);
    assert_eq!(psu_a.outputs(), [false, true, true]);
}
