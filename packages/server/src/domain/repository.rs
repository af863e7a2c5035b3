//! Room Store trait 定義
//!
//! ドメイン層が必要とする Room の保存先インターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## ロックの規約
//!
//! - 実装は単一のロックで全 Room を保護する
//! - `update` に渡すクロージャはロック内で同期的に実行される
//! - クロージャ内で Connection Registry の broadcast/send を呼んでよい
//!   （Registry は Room Store を呼び返さないため、ロック順序は Store -> Registry で固定）

use super::{Room, RoomError, RoomId};

/// Room Store trait
///
/// Room の唯一の所有者。外部コードは `update` の呼び出し中以外に
/// Room への参照を持たない。
pub trait RoomRepository: Send + Sync {
    /// 新しく作成した Room を登録
    fn add(&self, room: Room);

    /// Room のスナップショットを取得（変更しても保存されない）
    fn find(&self, id: &RoomId) -> Option<Room>;

    /// Room を排他的に読み書きする唯一の変更経路
    ///
    /// `f` が `Ok` を返した場合のみ変更が保存される。`Err` の場合は何も保存されず、
    /// エラーがそのまま呼び出し元へ返る。Room が存在しない場合は `RoomNotFound`。
    fn update(
        &self,
        id: &RoomId,
        f: &mut dyn FnMut(&mut Room) -> Result<(), RoomError>,
    ) -> Result<(), RoomError>;

    /// Room を削除
    fn delete(&self, id: &RoomId);

    /// 全 Room のスナップショットを取得
    fn list(&self) -> Vec<Room>;

    /// 動作中の全カウントダウンを 1 秒進める
    ///
    /// 減算したルームごとに `on_tick(room_id, 残り秒数)` をロック内で呼び、
    /// 減算したルームの数を返す。
    fn tick_timers(&self, on_tick: &mut dyn FnMut(&RoomId, u64)) -> usize;

    /// 削除予定の Room をまとめて取り除き、その ID を返す
    fn take_scheduled_for_deletion(&self) -> Vec<RoomId>;
}
