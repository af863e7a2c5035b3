//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::{net::TcpListener, sync::watch};
use tower_http::trace::TraceLayer;

use stmsh_shared::time::{Clock, SystemClock};

use crate::{
    config::ServerConfig,
    domain::RoomRepository,
    infrastructure::{connection::ConnectionRegistry, repository::InMemoryRoomRepository},
    usecase::{
        CleanupRoomsUseCase, ConnectClientUseCase, CreateRoomUseCase, DisconnectClientUseCase,
        GetRoomDetailUseCase, GetRoomsUseCase, LeaveRoomUseCase, TickRoomTimersUseCase,
        room_dispatcher,
    },
};

use super::{
    handler::{create_room, get_room_detail, get_rooms, health_check, websocket_handler},
    scheduler::{spawn_cleanup_loop, spawn_timer_loop},
    signal::shutdown_signal,
    state::AppState,
};

/// Voting room server
///
/// Owns the Room Store and the Connection Registry and wires every use case
/// on top of them.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(ServerConfig::default());
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    config: ServerConfig,
    /// Room Store
    repository: Arc<dyn RoomRepository>,
    registry: Arc<ConnectionRegistry>,
    clock: Arc<dyn Clock>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: ServerConfig, clock: Arc<dyn Clock>) -> Self {
        let repository: Arc<dyn RoomRepository> = Arc::new(InMemoryRoomRepository::new());
        let leave_handler = Arc::new(LeaveRoomUseCase::new(repository.clone()));
        let registry = Arc::new(ConnectionRegistry::new(leave_handler));
        Self {
            config,
            repository,
            registry,
            clock,
        }
    }

    fn router(&self, shutdown: watch::Receiver<bool>) -> Router {
        let repository = &self.repository;
        let registry = &self.registry;

        let app_state = Arc::new(AppState {
            config: self.config.clone(),
            dispatcher: room_dispatcher(repository.clone(), registry.clone()),
            connect_client_usecase: Arc::new(ConnectClientUseCase::new(
                registry.clone(),
                self.clock.clone(),
                self.config.outbox_capacity,
            )),
            disconnect_client_usecase: Arc::new(DisconnectClientUseCase::new(registry.clone())),
            create_room_usecase: Arc::new(CreateRoomUseCase::new(
                repository.clone(),
                self.clock.clone(),
            )),
            get_rooms_usecase: Arc::new(GetRoomsUseCase::new(repository.clone())),
            get_room_detail_usecase: Arc::new(GetRoomDetailUseCase::new(
                repository.clone(),
                registry.clone(),
            )),
            shutdown,
        });

        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms).post(create_room))
            .route("/api/rooms/{room_id}", get(get_room_detail))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// The schedulers and every open socket are stopped when `shutdown` fires.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let timer = spawn_timer_loop(
            Arc::new(TickRoomTimersUseCase::new(
                self.repository.clone(),
                self.registry.clone(),
            )),
            self.config.timer_tick,
            shutdown_rx.clone(),
        );
        let cleanup = spawn_cleanup_loop(
            Arc::new(CleanupRoomsUseCase::new(
                self.repository.clone(),
                self.registry.clone(),
            )),
            self.config.cleanup_interval,
            shutdown_rx.clone(),
        );

        let app = self.router(shutdown_rx);
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                let _ = shutdown_tx.send(true);
            })
            .await;

        for handle in [timer, cleanup] {
            if let Err(e) = handle.await {
                tracing::error!("Scheduler task failed: {}", e);
            }
        }
        tracing::info!("Server shutdown complete");

        result
    }

    /// Run the voting room server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Voting room server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        Ok(())
    }
}
