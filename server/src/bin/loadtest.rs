//! Load test for the knitting server.
//!
//! Spawns multiple fake WebSocket clients that:
//! - Connect and join with a generated name
//! - Steer in slow circles so trails close and crafts happen
//! - Receive and count players_state / territory_update / crafted broadcasts
//!
//! Usage: cargo run --bin loadtest -- [OPTIONS]
//!
//! Options:
//!   --clients N      Number of clients to spawn (default: 100)
//!   --duration S     Test duration in seconds (default: 30)
//!   --input-rate R   Move messages per second per client (default: 20)
//!   --url URL        Server URL (default: ws://127.0.0.1:3000/ws)

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// players_state broadcasts per second with the default server config
const EXPECTED_BROADCAST_HZ: f64 = 60.0;

// === Protocol types (minimal subset) ===

#[derive(Serialize)]
#[serde(tag = "type")]
enum ClientMsg {
    #[serde(rename = "join")]
    Join { name: String, color: String },
    #[serde(rename = "move")]
    Move { dx: f64, dz: f64 },
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ServerMsg {
    #[serde(rename = "welcome")]
    Welcome {},
    #[serde(rename = "players_state")]
    PlayersState { players: Vec<serde_json::Value> },
    #[serde(rename = "territory_update")]
    TerritoryUpdate { cells: Vec<serde_json::Value> },
    #[serde(rename = "team_score")]
    TeamScore {},
    #[serde(rename = "crafted")]
    Crafted {},
}

// === Metrics ===

struct Metrics {
    connected: AtomicU64,
    messages_received: AtomicU64,
    players_states_received: AtomicU64,
    territory_updates_received: AtomicU64,
    cells_changed: AtomicU64,
    team_scores_received: AtomicU64,
    crafts_seen: AtomicU64,
    moves_sent: AtomicU64,
    errors: AtomicU64,
    total_players_seen: AtomicU64,
    latency_sum_ms: AtomicU64,
    latency_count: AtomicU64,
}

impl Metrics {
    fn new() -> Self {
        Self {
            connected: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            players_states_received: AtomicU64::new(0),
            territory_updates_received: AtomicU64::new(0),
            cells_changed: AtomicU64::new(0),
            team_scores_received: AtomicU64::new(0),
            crafts_seen: AtomicU64::new(0),
            moves_sent: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            total_players_seen: AtomicU64::new(0),
            latency_sum_ms: AtomicU64::new(0),
            latency_count: AtomicU64::new(0),
        }
    }
}

fn encode(msg: &ClientMsg) -> Option<Message> {
    serde_json::to_string(msg)
        .ok()
        .map(|json| Message::Text(json.into()))
}

// === Client task ===

async fn run_client(
    client_id: u32,
    url: String,
    input_rate: f64,
    duration: Duration,
    metrics: Arc<Metrics>,
) {
    let connect_start = Instant::now();

    let (mut ws, _) = match connect_async(&url).await {
        Ok(conn) => {
            if client_id < 3 {
                eprintln!("Client {} connected", client_id);
            }
            conn
        }
        Err(e) => {
            if client_id < 5 {
                eprintln!("Client {} failed to connect: {}", client_id, e);
            }
            metrics.errors.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };

    let connect_latency = connect_start.elapsed();
    metrics
        .latency_sum_ms
        .fetch_add(connect_latency.as_millis() as u64, Ordering::Relaxed);
    metrics.latency_count.fetch_add(1, Ordering::Relaxed);
    metrics.connected.fetch_add(1, Ordering::Relaxed);

    let join = ClientMsg::Join {
        name: format!("Load-{}", client_id),
        color: format!("#{:06x}", (client_id.wrapping_mul(2_654_435_761)) & 0xFF_FFFF),
    };
    let sent = match encode(&join) {
        Some(msg) => ws.send(msg).await.is_ok(),
        None => false,
    };
    if !sent {
        metrics.errors.fetch_add(1, Ordering::Relaxed);
        metrics.connected.fetch_sub(1, Ordering::Relaxed);
        return;
    }

    // Wait for welcome before steering
    let welcome_timeout = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(msg) = ws.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    metrics.messages_received.fetch_add(1, Ordering::Relaxed);
                    if matches!(
                        serde_json::from_str::<ServerMsg>(&text),
                        Ok(ServerMsg::Welcome {})
                    ) {
                        return true;
                    }
                }
                Ok(Message::Close(frame)) => {
                    if client_id < 3 {
                        eprintln!("Client {} closed during welcome: {:?}", client_id, frame);
                    }
                    return false;
                }
                Err(e) => {
                    if client_id < 3 {
                        eprintln!("Client {} error during welcome: {}", client_id, e);
                    }
                    return false;
                }
                _ => {}
            }
        }
        false
    })
    .await;

    if !matches!(welcome_timeout, Ok(true)) {
        if client_id < 3 {
            eprintln!("Client {} did not get a welcome", client_id);
        }
        metrics.errors.fetch_add(1, Ordering::Relaxed);
        metrics.connected.fetch_sub(1, Ordering::Relaxed);
        return;
    }

    let input_interval = if input_rate > 0.0 {
        Duration::from_secs_f64(1.0 / input_rate)
    } else {
        Duration::from_secs(3600) // Effectively never
    };

    let mut input_timer = tokio::time::interval(input_interval);
    input_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    // One full turn every few seconds, direction alternating per client
    let turn_secs = 3.0 + (client_id % 5) as f64;
    let winding = if client_id % 2 == 0 { 1.0 } else { -1.0 };
    let start = Instant::now();
    let test_end = start + duration;

    loop {
        if Instant::now() >= test_end {
            break;
        }

        tokio::select! {
            _ = input_timer.tick() => {
                let angle = winding * TAU * start.elapsed().as_secs_f64() / turn_secs;
                let Some(msg) = encode(&ClientMsg::Move { dx: angle.cos(), dz: angle.sin() }) else {
                    continue;
                };
                if ws.send(msg).await.is_ok() {
                    metrics.moves_sent.fetch_add(1, Ordering::Relaxed);
                } else {
                    metrics.errors.fetch_add(1, Ordering::Relaxed);
                    break;
                }
            }

            msg = ws.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        metrics.messages_received.fetch_add(1, Ordering::Relaxed);
                        match serde_json::from_str::<ServerMsg>(&text) {
                            Ok(ServerMsg::PlayersState { players }) => {
                                metrics.players_states_received.fetch_add(1, Ordering::Relaxed);
                                metrics
                                    .total_players_seen
                                    .fetch_add(players.len() as u64, Ordering::Relaxed);
                            }
                            Ok(ServerMsg::TerritoryUpdate { cells }) => {
                                metrics.territory_updates_received.fetch_add(1, Ordering::Relaxed);
                                metrics
                                    .cells_changed
                                    .fetch_add(cells.len() as u64, Ordering::Relaxed);
                            }
                            Ok(ServerMsg::TeamScore {}) => {
                                metrics.team_scores_received.fetch_add(1, Ordering::Relaxed);
                            }
                            Ok(ServerMsg::Crafted {}) => {
                                metrics.crafts_seen.fetch_add(1, Ordering::Relaxed);
                            }
                            Ok(ServerMsg::Welcome {}) | Err(_) => {}
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        if client_id < 3 {
                            eprintln!("Client {} got Close: {:?}", client_id, frame);
                        }
                        break;
                    }
                    None => {
                        if client_id < 3 {
                            eprintln!("Client {} stream ended", client_id);
                        }
                        break;
                    }
                    Some(Err(e)) => {
                        if client_id < 3 {
                            eprintln!("Client {} error: {}", client_id, e);
                        }
                        metrics.errors.fetch_add(1, Ordering::Relaxed);
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    let _ = ws.close(None).await;
    metrics.connected.fetch_sub(1, Ordering::Relaxed);
}

// === Main ===

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut num_clients: u32 = 100;
    let mut duration_secs: u64 = 30;
    let mut input_rate: f64 = 20.0;
    let mut url = "ws://127.0.0.1:3000/ws".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--clients" => {
                i += 1;
                num_clients = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(100);
            }
            "--duration" => {
                i += 1;
                duration_secs = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(30);
            }
            "--input-rate" => {
                i += 1;
                input_rate = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(20.0);
            }
            "--url" => {
                i += 1;
                url = args.get(i).cloned().unwrap_or(url);
            }
            _ => {}
        }
        i += 1;
    }

    println!("=== Knitting Server Load Test ===");
    println!("Clients: {}", num_clients);
    println!("Duration: {}s", duration_secs);
    println!("Input rate: {}/s per client", input_rate);
    println!("URL: {}", url);
    println!();

    let metrics = Arc::new(Metrics::new());
    let duration = Duration::from_secs(duration_secs);

    let mut handles = Vec::with_capacity(num_clients as usize);

    println!("Spawning {} clients...", num_clients);
    let spawn_start = Instant::now();

    for client_id in 0..num_clients {
        let url = url.clone();
        let metrics = Arc::clone(&metrics);

        handles.push(tokio::spawn(async move {
            run_client(client_id, url, input_rate, duration, metrics).await;
        }));

        // Stagger spawns slightly to avoid thundering herd
        if client_id % 50 == 49 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    println!("All clients spawned in {:?}", spawn_start.elapsed());
    println!();

    let metrics_clone = Arc::clone(&metrics);
    let stats_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));
        let start = Instant::now();

        loop {
            interval.tick().await;
            let elapsed = start.elapsed().as_secs();
            if elapsed >= duration_secs + 5 {
                break;
            }

            let connected = metrics_clone.connected.load(Ordering::Relaxed);
            let msgs = metrics_clone.messages_received.load(Ordering::Relaxed);
            let states = metrics_clone.players_states_received.load(Ordering::Relaxed);
            let updates = metrics_clone.territory_updates_received.load(Ordering::Relaxed);
            let crafts = metrics_clone.crafts_seen.load(Ordering::Relaxed);
            let moves = metrics_clone.moves_sent.load(Ordering::Relaxed);
            let errors = metrics_clone.errors.load(Ordering::Relaxed);

            println!(
                "[{:3}s] connected={}, msgs={}, players_states={}, territory_updates={}, crafts={}, moves={}, errors={}",
                elapsed, connected, msgs, states, updates, crafts, moves, errors
            );
        }
    });

    for handle in handles {
        let _ = handle.await;
    }

    stats_handle.abort();

    println!();
    println!("=== Final Results ===");
    let msgs = metrics.messages_received.load(Ordering::Relaxed);
    let states = metrics.players_states_received.load(Ordering::Relaxed);
    let updates = metrics.territory_updates_received.load(Ordering::Relaxed);
    let cells = metrics.cells_changed.load(Ordering::Relaxed);
    let scores = metrics.team_scores_received.load(Ordering::Relaxed);
    let crafts = metrics.crafts_seen.load(Ordering::Relaxed);
    let moves = metrics.moves_sent.load(Ordering::Relaxed);
    let errors = metrics.errors.load(Ordering::Relaxed);
    let players = metrics.total_players_seen.load(Ordering::Relaxed);
    let latency_sum = metrics.latency_sum_ms.load(Ordering::Relaxed);
    let latency_count = metrics.latency_count.load(Ordering::Relaxed);

    println!("Total messages received: {}", msgs);
    println!("Total players_state messages: {}", states);
    println!("Total territory_update messages: {} ({} cells)", updates, cells);
    println!("Total team_score messages: {}", scores);
    println!("Total crafted messages: {}", crafts);
    println!("Total move sent: {}", moves);
    println!("Total errors: {}", errors);
    println!(
        "Average players per snapshot: {}",
        if states > 0 { players / states } else { 0 }
    );

    if latency_count > 0 {
        println!("Average connect latency: {}ms", latency_sum / latency_count);
    }

    let msgs_per_sec = msgs as f64 / duration_secs.max(1) as f64;
    let states_per_client = states as f64 / num_clients.max(1) as f64;
    let expected = duration_secs as f64 * EXPECTED_BROADCAST_HZ;

    println!();
    println!("Messages/sec (total): {:.0}", msgs_per_sec);
    println!("Players states per client: {:.1}", states_per_client);
    println!("Expected players states per client: {:.1}", expected);
    if expected > 0.0 {
        println!("Delivery rate: {:.1}%", states_per_client / expected * 100.0);
    }
}
