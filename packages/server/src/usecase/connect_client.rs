//! UseCase: WebSocket クライアントの接続と切断
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectClientUseCase::execute()（重複接続の拒否）
//! - DisconnectClientUseCase::execute()（冪等な切断）

use std::sync::Arc;

use tokio::sync::mpsc;

use stmsh_shared::time::Clock;

use crate::{
    domain::ClientId,
    infrastructure::{
        connection::{Connection, ConnectionRegistry, RegistryError},
        dto::websocket::ServerEvent,
    },
};

/// クライアント接続のユースケース
pub struct ConnectClientUseCase {
    registry: Arc<ConnectionRegistry>,
    clock: Arc<dyn Clock>,
    /// 送信キューの容量
    outbox_capacity: usize,
}

impl ConnectClientUseCase {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        clock: Arc<dyn Clock>,
        outbox_capacity: usize,
    ) -> Self {
        Self {
            registry,
            clock,
            outbox_capacity,
        }
    }

    /// 接続を作成してレジストリに登録する
    ///
    /// # Returns
    ///
    /// * `Ok((Connection, Receiver))` - 登録済みの接続と、write pump が読む送信キュー
    /// * `Err(RegistryError::DuplicateClientId)` - 同じ ID の接続が既に存在する
    pub fn execute(
        &self,
        client_id: ClientId,
    ) -> Result<(Arc<Connection>, mpsc::Receiver<ServerEvent>), RegistryError> {
        let (conn, rx) = Connection::new(client_id, self.outbox_capacity, self.clock.now_millis());
        self.registry.add_connection(conn.clone())?;
        Ok((conn, rx))
    }
}

/// クライアント切断のユースケース
pub struct DisconnectClientUseCase {
    registry: Arc<ConnectionRegistry>,
}

impl DisconnectClientUseCase {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 切断を実行する。2 回目以降は `false`
    pub fn execute(&self, conn: &Arc<Connection>) -> bool {
        self.registry.remove_connection(conn)
    }
}
