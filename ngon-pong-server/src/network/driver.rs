//! Session Driving Loop
//!
//! Fixed-rate timer that steps one session and hands its board to the
//! fan-out task.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::game::body::PlayerId;
use crate::game::events::GameEventData;
use crate::network::protocol::ServerMessage;
use crate::network::registry::{SessionId, SessionRegistry};

/// A message addressed to a set of players.
#[derive(Debug, Clone)]
pub struct Outbound {
    /// Players that should receive the message
    pub recipients: Vec<PlayerId>,
    /// The message
    pub message: ServerMessage,
}

/// Step session `id` at `tick_rate` Hz until it leaves the registry, the
/// outbound channel closes, or `stop` fires.
///
/// Every tick simulates exactly `1 / tick_rate` seconds; ticks the timer
/// misses are skipped rather than replayed.
pub async fn run_session_loop(
    registry: Arc<SessionRegistry>,
    id: SessionId,
    tick_rate: u32,
    outbound: mpsc::Sender<Outbound>,
    mut stop: broadcast::Receiver<()>,
) {
    let tick_rate = tick_rate.max(1);
    let delta_time = 1.0 / f64::from(tick_rate);
    let mut ticker = interval(Duration::from_secs_f64(delta_time));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Session {} loop started at {} Hz", id, tick_rate);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = stop.recv() => {
                debug!("Session {} loop stopped by shutdown", id);
                break;
            }
        }

        let session = match registry.get(id).await {
            Ok(session) => session,
            Err(_) => break,
        };

        // Step and snapshot under one lock; send after releasing it.
        let (recipients, messages) = {
            let mut session = session.lock().await;
            let report = session.play_simulation(delta_time);

            let mut messages = Vec::with_capacity(1 + report.events.len());
            for event in &report.events {
                if let GameEventData::BallScored { ball_id, conceded_by } = event.data {
                    messages.push(ServerMessage::Scored {
                        game_id: id,
                        ball_id,
                        conceded_by,
                    });
                }
            }
            messages.push(ServerMessage::Board {
                game_id: id,
                tick: session.tick(),
                state_hash: hex::encode(session.state_hash()),
                board: session.fetch_board_json(),
            });

            (session.get_players(), messages)
        };

        for message in messages {
            let delivery = Outbound {
                recipients: recipients.clone(),
                message,
            };
            if outbound.send(delivery).await.is_err() {
                warn!("Outbound channel closed, stopping session {}", id);
                return;
            }
        }
    }

    info!("Session {} loop finished", id);
}
