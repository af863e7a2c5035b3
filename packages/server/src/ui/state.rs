//! Shared application state.

use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    config::ServerConfig,
    usecase::{
        ConnectClientUseCase, CreateRoomUseCase, DisconnectClientUseCase, EventDispatcher,
        GetRoomDetailUseCase, GetRoomsUseCase,
    },
};

pub struct AppState {
    pub config: ServerConfig,
    /// 受信メッセージの振り分け
    pub dispatcher: EventDispatcher,
    pub connect_client_usecase: Arc<ConnectClientUseCase>,
    pub disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    pub create_room_usecase: Arc<CreateRoomUseCase>,
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    /// `true` になったら全接続を閉じる
    pub shutdown: watch::Receiver<bool>,
}
