//! Outbound serializers.
//!
//! A serializer turns one `ServerEvent` into zero or more wire frames. The
//! write pump is the only caller; which serializer a connection uses is
//! chosen at upgrade time.

use std::sync::Arc;

use serde::Serialize;
use stmsh_shared::time::format_countdown;

use super::dto::websocket::ServerEvent;

/// A single outbound wire payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

pub trait Serializer: Send + Sync {
    fn name(&self) -> &'static str;

    fn serialize(&self, event: &ServerEvent) -> Vec<Frame>;
}

/// Pick a serializer from the `format` query parameter. Unknown formats fall
/// back to JSON.
pub fn serializer_for(format: Option<&str>) -> Arc<dyn Serializer> {
    match format {
        Some("fragments") => Arc::new(FragmentSerializer),
        Some("json") | None => Arc::new(JsonSerializer),
        Some(other) => {
            tracing::debug!("Unknown serializer format '{}', using json", other);
            Arc::new(JsonSerializer)
        }
    }
}

/// One text frame per event: the event itself as JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn name(&self) -> &'static str {
        "json"
    }

    fn serialize(&self, event: &ServerEvent) -> Vec<Frame> {
        match serde_json::to_string(event) {
            Ok(json) => vec![Frame::Text(json)],
            Err(e) => {
                tracing::error!("Failed to serialize '{}' event: {}", event.kind(), e);
                Vec::new()
            }
        }
    }
}

/// One text frame per UI fragment, `{"fragment": <name>, "data": <value>}`.
///
/// Lets a page swap independent regions (timer, user card, player list, ...)
/// without knowing the event vocabulary.
#[derive(Debug, Default, Clone, Copy)]
pub struct FragmentSerializer;

#[derive(Serialize)]
struct Fragment<'a, T: Serialize> {
    fragment: &'a str,
    data: T,
}

impl FragmentSerializer {
    fn push<T: Serialize>(frames: &mut Vec<Frame>, name: &str, data: T) {
        match serde_json::to_string(&Fragment {
            fragment: name,
            data,
        }) {
            Ok(json) => frames.push(Frame::Text(json)),
            Err(e) => tracing::error!("Failed to render fragment '{}': {}", name, e),
        }
    }
}

impl Serializer for FragmentSerializer {
    fn name(&self) -> &'static str {
        "fragments"
    }

    fn serialize(&self, event: &ServerEvent) -> Vec<Frame> {
        let mut frames = Vec::new();

        match event {
            ServerEvent::RoomInit(init) => {
                Self::push(&mut frames, "time", format_countdown(init.time));
                Self::push(&mut frames, "user", &init.user);
                if init.stage == "results" {
                    Self::push(&mut frames, "actions_results", &init.user);
                    Self::push(&mut frames, "stage_results", init);
                    Self::push(&mut frames, "results_winners", &init.winners);
                    Self::push(&mut frames, "results_others", &init.others);
                } else {
                    Self::push(&mut frames, "actions", &init.user);
                    Self::push(&mut frames, &format!("stage_{}", init.stage), init);
                }
            }
            ServerEvent::PlayersChanged(changed) => {
                Self::push(&mut frames, "players", changed);
            }
            ServerEvent::PlayerUpdated(player) => {
                Self::push(&mut frames, "user", player);
                Self::push(&mut frames, "actions", player);
            }
            ServerEvent::StageVoting(voting) => {
                Self::push(&mut frames, "stage_voting", voting);
            }
            ServerEvent::VoteRegistered(left) => {
                Self::push(&mut frames, "candidates", &left.candidates);
            }
            ServerEvent::RoomTime(time) | ServerEvent::TimerSet(time) => {
                Self::push(&mut frames, "time", format_countdown(time.time));
            }
            ServerEvent::ListChanged(changed) => {
                Self::push(&mut frames, "list", &changed.list);
            }
            ServerEvent::StageResults(results) => {
                Self::push(&mut frames, "actions_results", ());
                Self::push(&mut frames, "stage_results", results);
                Self::push(&mut frames, "results_winners", &results.winners);
                Self::push(&mut frames, "results_others", &results.others);
            }
            ServerEvent::Error(error) => {
                Self::push(&mut frames, "error", &error.message);
            }
            // Covered by the players fragment that always follows.
            ServerEvent::PlayerJoined(_) | ServerEvent::HostChanged(_) => {}
        }

        frames
    }
}
