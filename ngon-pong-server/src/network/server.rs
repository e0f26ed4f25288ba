//! WebSocket Game Server
//!
//! Async WebSocket server for multiplayer connections.
//! Routes client messages to the session registry and fans session output
//! out to connected players.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, error, info, instrument, warn};

use crate::game::body::PlayerId;
use crate::game::config::GameConfig;
use crate::game::snapshot::score_map;
use crate::network::driver::{run_session_loop, Outbound};
use crate::network::protocol::{ClientMessage, ErrorCode, ServerMessage};
use crate::network::registry::{RegistryError, SessionId, SessionRegistry};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Tick rate for game simulation (Hz).
    pub tick_rate: u32,
    /// Capacity of the session output channel.
    pub outbound_capacity: usize,
    /// Capacity of each connection's send queue.
    pub client_queue: usize,
    /// Options for sessions started without overrides.
    pub game: GameConfig,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            tick_rate: crate::TICK_RATE,
            outbound_capacity: 1024,
            client_queue: 64,
            game: GameConfig::default(),
            version: crate::VERSION.to_string(),
        }
    }
}

impl ServerConfig {
    /// Read `PONG_BIND_ADDR` and `PONG_TICK_RATE`, keeping defaults for
    /// anything absent or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: env_or("PONG_BIND_ADDR", std::env::var("PONG_BIND_ADDR").ok(), defaults.bind_addr),
            tick_rate: env_or("PONG_TICK_RATE", std::env::var("PONG_TICK_RATE").ok(), defaults.tick_rate)
                .max(1),
            ..defaults
        }
    }
}

fn env_or<T: FromStr + std::fmt::Debug>(name: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring invalid {}={:?}, using {:?}", name, raw, default);
                default
            }
        },
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Registry rejected the request.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl GameServerError {
    fn code(&self) -> ErrorCode {
        match self {
            GameServerError::Registry(RegistryError::UnknownSession(_)) => ErrorCode::GameNotFound,
            GameServerError::Registry(RegistryError::Config(_)) => ErrorCode::InvalidConfig,
            _ => ErrorCode::InternalError,
        }
    }
}

type ClientMap = Arc<RwLock<BTreeMap<PlayerId, mpsc::Sender<ServerMessage>>>>;

/// Shared state handed to every connection task.
#[derive(Clone)]
struct ServerContext {
    config: ServerConfig,
    registry: Arc<SessionRegistry>,
    clients: ClientMap,
    outbound: mpsc::Sender<Outbound>,
    shutdown_tx: broadcast::Sender<()>,
}

/// The game server.
pub struct GameServer {
    ctx: ServerContext,
    outbound_rx: std::sync::Mutex<Option<mpsc::Receiver<Outbound>>>,
}

impl GameServer {
    /// Create a new game server.
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let (outbound, outbound_rx) = mpsc::channel(config.outbound_capacity.max(1));

        Self {
            ctx: ServerContext {
                config,
                registry: Arc::new(SessionRegistry::new()),
                clients: Arc::new(RwLock::new(BTreeMap::new())),
                outbound,
                shutdown_tx,
            },
            outbound_rx: std::sync::Mutex::new(Some(outbound_rx)),
        }
    }

    /// Session registry behind this server.
    pub fn registry(&self) -> Arc<SessionRegistry> {
        self.ctx.registry.clone()
    }

    /// Stop accepting connections and stop every session loop.
    pub fn shutdown(&self) {
        let _ = self.ctx.shutdown_tx.send(());
    }

    /// Bind the configured address and serve until shutdown.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.ctx.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until shutdown.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GameServerError> {
        info!("Game server listening on {}", listener.local_addr()?);

        let outbound_rx = self
            .outbound_rx
            .lock()
            .ok()
            .and_then(|mut rx| rx.take());
        let fanout_handle = outbound_rx.map(|rx| {
            let clients = self.ctx.clients.clone();
            tokio::spawn(Self::run_fanout(rx, clients))
        });

        let mut shutdown_rx = self.ctx.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        if let Some(handle) = fanout_handle {
            handle.abort();
        }

        Ok(())
    }

    /// Deliver session output to each recipient's connection.
    async fn run_fanout(mut rx: mpsc::Receiver<Outbound>, clients: ClientMap) {
        while let Some(Outbound { recipients, message }) = rx.recv().await {
            let clients = clients.read().await;
            for player in recipients {
                if let Some(sender) = clients.get(&player) {
                    if sender.try_send(message.clone()).is_err() {
                        debug!("Dropped message for slow or closed client {}", player);
                    }
                }
            }
        }
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let ctx = self.ctx.clone();

        tokio::spawn(async move {
            if let Err(e) = Self::serve_connection(ctx, stream, addr).await {
                warn!("Connection {} ended with error: {}", addr, e);
            }
        });
    }

    async fn serve_connection(
        ctx: ServerContext,
        stream: TcpStream,
        addr: SocketAddr,
    ) -> Result<(), GameServerError> {
        let ws_stream = accept_async(stream).await?;
        let (mut ws_sender, mut ws_receiver) = ws_stream.split();
        let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(ctx.config.client_queue.max(1));
        let mut shutdown_rx = ctx.shutdown_tx.subscribe();

        // Spawn message sender task
        let sender_task = tokio::spawn(async move {
            while let Some(msg) = msg_rx.recv().await {
                let text = match msg.to_json() {
                    Ok(t) => t,
                    Err(e) => {
                        error!("Failed to serialize message: {}", e);
                        continue;
                    }
                };
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        });

        let mut player: Option<PlayerId> = None;
        let mut result = Ok(());

        loop {
            tokio::select! {
                msg = ws_receiver.next() => {
                    let decoded = match msg {
                        Some(Ok(Message::Text(text))) => ClientMessage::decode_frame(Some(text.as_str()), &[]),
                        Some(Ok(Message::Binary(data))) => ClientMessage::decode_frame(None, &data),
                        Some(Ok(Message::Close(_))) | None => {
                            debug!("Client {} disconnected", addr);
                            break;
                        }
                        Some(Err(e)) => {
                            result = Err(e.into());
                            break;
                        }
                        _ => continue,
                    };

                    match decoded {
                        Ok(client_msg) => {
                            Self::handle_client_message(&ctx, &mut player, client_msg, &msg_tx).await;
                        }
                        Err(e) => {
                            debug!("Invalid message from {}: {}", addr, e);
                            let _ = msg_tx
                                .send(ServerMessage::error(ErrorCode::InvalidInput, "Invalid message format"))
                                .await;
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    break;
                }
            }
        }

        sender_task.abort();

        if let Some(player_id) = player {
            Self::disconnect_player(&ctx, player_id, &msg_tx).await;
        }

        info!("Client {} cleaned up", addr);
        result
    }

    /// Handle a client message.
    async fn handle_client_message(
        ctx: &ServerContext,
        player: &mut Option<PlayerId>,
        msg: ClientMessage,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        if let ClientMessage::Ping { timestamp } = msg {
            let _ = sender
                .send(ServerMessage::Pong {
                    timestamp,
                    server_time: std::time::SystemTime::now()
                        .duration_since(std::time::UNIX_EPOCH)
                        .unwrap_or_default()
                        .as_millis() as u64,
                })
                .await;
            return;
        }

        if let ClientMessage::Hello { player_id } = msg {
            Self::handle_hello(ctx, player, player_id, sender).await;
            return;
        }

        let Some(player_id) = *player else {
            let _ = sender
                .send(ServerMessage::error(ErrorCode::NotIntroduced, "Send hello first"))
                .await;
            return;
        };

        let outcome = match msg {
            ClientMessage::StartGame { players, options } => {
                Self::handle_start_game(ctx, player_id, players, options).await
            }
            ClientMessage::MovePaddle { game_id, intent } => {
                match ctx.registry.queue_intent(game_id, player_id, intent).await {
                    Ok(true) => Ok(()),
                    Ok(false) => {
                        let _ = sender
                            .send(ServerMessage::error(ErrorCode::NotInGame, "No paddle in this game"))
                            .await;
                        Ok(())
                    }
                    Err(e) => Err(e.into()),
                }
            }
            ClientMessage::EndGame { game_id } => Self::handle_end_game(ctx, game_id).await,
            ClientMessage::Hello { .. } | ClientMessage::Ping { .. } => Ok(()),
        };

        if let Err(e) = outcome {
            debug!("Request from player {} failed: {}", player_id, e);
            let _ = sender.send(ServerMessage::error(e.code(), e.to_string())).await;
        }
    }

    /// Bind a connection to a player id.
    async fn handle_hello(
        ctx: &ServerContext,
        player: &mut Option<PlayerId>,
        player_id: PlayerId,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        {
            let mut clients = ctx.clients.write().await;
            if let Some(previous) = player.replace(player_id) {
                clients.remove(&previous);
            }
            if clients.insert(player_id, sender.clone()).is_some() {
                debug!("Player {} reconnected, replacing old connection", player_id);
            }
        }

        let _ = sender
            .send(ServerMessage::Welcome {
                player_id,
                server_version: ctx.config.version.clone(),
            })
            .await;
        debug!("Connection bound to player {}", player_id);
    }

    /// Create a session and start its driving loop.
    async fn handle_start_game(
        ctx: &ServerContext,
        requested_by: PlayerId,
        players: Vec<PlayerId>,
        options: Option<GameConfig>,
    ) -> Result<(), GameServerError> {
        let config = options.unwrap_or_else(|| ctx.config.game.clone());
        let (game_id, session) = ctx.registry.create(&players, config).await?;
        let seed = session.lock().await.seed();
        info!("Player {} started game {} with {:?}", requested_by, game_id, players);

        let mut recipients = players.clone();
        if !recipients.contains(&requested_by) {
            recipients.push(requested_by);
        }
        let _ = ctx
            .outbound
            .send(Outbound {
                recipients,
                message: ServerMessage::GameCreated { game_id, players, seed },
            })
            .await;

        tokio::spawn(run_session_loop(
            ctx.registry.clone(),
            game_id,
            ctx.config.tick_rate,
            ctx.outbound.clone(),
            ctx.shutdown_tx.subscribe(),
        ));
        Ok(())
    }

    /// Remove a session and announce the final score.
    async fn handle_end_game(ctx: &ServerContext, game_id: SessionId) -> Result<(), GameServerError> {
        let session = ctx.registry.remove(game_id).await?;
        let (players, score) = {
            let session = session.lock().await;
            let players = session.get_players();
            let score = score_map(&players, session.concedes());
            (players, score)
        };

        let _ = ctx
            .outbound
            .send(Outbound {
                recipients: players,
                message: ServerMessage::GameEnded { game_id, score },
            })
            .await;
        Ok(())
    }

    /// Drop a player's connection and retire their paddles.
    async fn disconnect_player(
        ctx: &ServerContext,
        player_id: PlayerId,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        {
            let mut clients = ctx.clients.write().await;
            // A newer connection for the same player keeps its entry.
            if clients.get(&player_id).is_some_and(|s| s.same_channel(sender)) {
                clients.remove(&player_id);
            } else {
                return;
            }
        }

        for (game_id, session) in ctx.registry.sessions_with_player(player_id).await {
            if session.lock().await.remove_player(player_id).is_some() {
                info!("Player {} left game {}", player_id, game_id);
            }
        }
    }
}
