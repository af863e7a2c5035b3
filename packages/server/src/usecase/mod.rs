//! UseCase 層
//!
//! - WebSocket メッセージハンドラー（`MessageHandler` 実装）
//! - 退出ハンドラー（`LeaveHandler` 実装）
//! - バックグラウンドスケジューラーの 1 回分の処理
//! - HTTP API のユースケース

pub mod change_stage;
pub mod cleanup_rooms;
pub mod connect_client;
pub mod create_room;
pub mod dispatcher;
pub mod error;
pub mod get_room_detail;
pub mod get_rooms;
pub mod join_room;
pub mod leave_room;
pub mod manage_list;
pub mod set_timer;
pub mod tick_room_timers;
pub mod toggle_ready;
pub mod vote;

use std::sync::Arc;

pub use change_stage::ChangeStageUseCase;
pub use cleanup_rooms::CleanupRoomsUseCase;
pub use connect_client::{ConnectClientUseCase, DisconnectClientUseCase};
pub use create_room::CreateRoomUseCase;
pub use dispatcher::{EventDispatcher, MessageHandler, RequireRoom};
pub use error::QueryError;
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use join_room::JoinRoomUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use manage_list::{ListAddUseCase, ListRemoveUseCase};
pub use set_timer::SetTimerUseCase;
pub use tick_room_timers::TickRoomTimersUseCase;
pub use toggle_ready::ToggleReadyUseCase;
pub use vote::VoteUseCase;

use crate::{
    domain::{Room, RoomError, RoomId, RoomRepository},
    infrastructure::{connection::ConnectionRegistry, dto::websocket::message_type},
};

/// 全メッセージタグを登録済みの Dispatcher を作る
///
/// `join` 以外はルーム参加済みの接続からしか受け付けません。
pub fn room_dispatcher(
    repository: Arc<dyn RoomRepository>,
    registry: Arc<ConnectionRegistry>,
) -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(
        message_type::JOIN,
        Arc::new(JoinRoomUseCase::new(repository.clone(), registry.clone())),
    );
    dispatcher.register(
        message_type::READY,
        Arc::new(RequireRoom::new(ToggleReadyUseCase::new(
            repository.clone(),
            registry.clone(),
        ))),
    );
    dispatcher.register(
        message_type::NEXT_STAGE,
        Arc::new(RequireRoom::new(ChangeStageUseCase::new(
            repository.clone(),
            registry.clone(),
        ))),
    );
    dispatcher.register(
        message_type::SET_TIMER,
        Arc::new(RequireRoom::new(SetTimerUseCase::new(
            repository.clone(),
            registry.clone(),
        ))),
    );
    dispatcher.register(
        message_type::LIST_ADD,
        Arc::new(RequireRoom::new(ListAddUseCase::new(repository.clone()))),
    );
    dispatcher.register(
        message_type::LIST_REMOVE,
        Arc::new(RequireRoom::new(ListRemoveUseCase::new(repository.clone()))),
    );
    dispatcher.register(
        message_type::VOTE,
        Arc::new(RequireRoom::new(VoteUseCase::new(repository, registry))),
    );
    dispatcher
}

/// Room を更新し、更新結果から組み立てたイベントを Room Store のロック内で送る
///
/// `f` が `Err` を返すと何も保存されず、`notify` も呼ばれない。`f` が成功したら
/// `notify` に結果を渡し、そのまま保存を確定する。同じルームのイベントは更新と
/// 同じ順序で各接続のキューに積まれる。
pub(crate) fn update_room<T, R>(
    repository: &dyn RoomRepository,
    room_id: &RoomId,
    mut f: impl FnMut(&mut Room) -> Result<T, RoomError>,
    notify: impl FnOnce(T) -> R,
) -> Result<R, RoomError> {
    let mut notify = Some(notify);
    let mut output = None;
    repository.update(room_id, &mut |room| {
        let value = f(room)?;
        output = notify.take().map(|notify| notify(value));
        Ok(())
    })?;
    output.ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))
}
