//! Room aggregate.
//!
//! A `Room` owns its players, their submitted lists and, once voting starts,
//! the candidates. All state transitions go through the methods below so the
//! invariants hold no matter which handler drives them:
//!
//! - the host is either `None` or one of the current players
//! - the stage only moves `Lobby -> Voting -> Results`
//! - the deletion flag is raised when the last player leaves and cleared on join
//! - a voter votes on a given candidate at most once

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDate;

use super::{ClientId, RoomError, RoomId};

/// Stage of a room. Linear, terminal at `Results`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Lobby,
    Voting,
    Results,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Lobby => "lobby",
            Stage::Voting => "voting",
            Stage::Results => "results",
        }
    }

    /// The stage that follows this one, if any.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Lobby => Some(Stage::Voting),
            Stage::Voting => Some(Stage::Results),
            Stage::Results => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: ClientId,
    pub name: String,
    pub ready: bool,
}

/// An item a player put on their list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub id: String,
    pub title: String,
    pub overview: String,
    pub rating: f32,
    pub release_date: Option<NaiveDate>,
    pub poster_path: String,
}

/// A list item nominated for group voting.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub item: ListItem,
    pub suggested_by: ClientId,
    pub score: i64,
    voters: BTreeSet<ClientId>,
}

impl Candidate {
    pub fn new(item: ListItem, suggested_by: ClientId) -> Self {
        Self {
            item,
            suggested_by,
            score: 0,
            voters: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.item.id
    }

    pub fn has_voted(&self, voter: &ClientId) -> bool {
        self.voters.contains(voter)
    }

    pub fn voters(&self) -> impl Iterator<Item = &ClientId> {
        self.voters.iter()
    }
}

/// Candidates partitioned by score: every winner holds the top score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Results {
    pub winners: Vec<Candidate>,
    pub others: Vec<Candidate>,
}

/// What happened when a player left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub removed: Option<Player>,
    /// Set when the departing player was the host and somebody took over.
    pub new_host: Option<ClientId>,
    pub scheduled_for_deletion: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteOutcome {
    pub candidates_left: usize,
    /// The vote was the voter's last one and flipped them to ready.
    pub became_ready: bool,
}

#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    /// Unix timestamp in milliseconds
    pub created_at: i64,
    stage: Stage,
    host_id: Option<ClientId>,
    time: u64,
    scheduled_for_deletion: bool,
    /// Join order; the first entry is next in line for host.
    players: Vec<Player>,
    lists: BTreeMap<ClientId, Vec<ListItem>>,
    candidates: Vec<Candidate>,
}

impl Room {
    pub fn new(id: RoomId, created_at: i64) -> Self {
        Self {
            id,
            created_at,
            stage: Stage::Lobby,
            host_id: None,
            time: 0,
            scheduled_for_deletion: false,
            players: Vec::new(),
            lists: BTreeMap::new(),
            candidates: Vec::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn host_id(&self) -> Option<&ClientId> {
        self.host_id.as_ref()
    }

    pub fn host(&self) -> Option<&Player> {
        self.host_id.as_ref().and_then(|id| self.player(id))
    }

    pub fn is_host(&self, id: &ClientId) -> bool {
        self.host_id.as_ref() == Some(id)
    }

    /// Remaining countdown, in seconds.
    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn is_scheduled_for_deletion(&self) -> bool {
        self.scheduled_for_deletion
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: &ClientId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn ready_count(&self) -> usize {
        self.players.iter().filter(|p| p.ready).count()
    }

    pub fn list_of(&self, id: &ClientId) -> &[ListItem] {
        self.lists.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Add a player, or refresh the name of one rejoining with the same id.
    ///
    /// The first player of an empty room becomes host. Joining always clears
    /// the deletion flag.
    pub fn join(&mut self, id: ClientId, name: String) -> &Player {
        self.scheduled_for_deletion = false;

        let index = match self.players.iter().position(|p| p.id == id) {
            Some(index) => {
                self.players[index].name = name;
                index
            }
            None => {
                self.players.push(Player {
                    id: id.clone(),
                    name,
                    ready: false,
                });
                self.players.len() - 1
            }
        };

        if self.host_id.is_none() {
            self.host_id = Some(id);
        }

        &self.players[index]
    }

    /// Remove a player. Hands the host role to the earliest-joined remaining
    /// player; an emptied room loses its host and is flagged for deletion.
    ///
    /// The player's list is kept so a reconnect with the same id gets it back.
    pub fn remove_player(&mut self, id: &ClientId) -> Departure {
        let position = self.players.iter().position(|p| &p.id == id);
        let removed = position.map(|index| self.players.remove(index));

        let mut new_host = None;
        if self.is_host(id) {
            self.host_id = self.players.first().map(|p| p.id.clone());
            new_host = self.host_id.clone();
        }

        if removed.is_some() && self.players.is_empty() {
            self.host_id = None;
            self.scheduled_for_deletion = true;
        }

        Departure {
            removed,
            new_host,
            scheduled_for_deletion: self.scheduled_for_deletion,
        }
    }

    pub fn set_ready(&mut self, id: &ClientId, ready: bool) -> Result<&Player, RoomError> {
        let player = self
            .players
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or(RoomError::NotInRoom)?;
        player.ready = ready;
        Ok(&*player)
    }

    /// Move to the next stage. Host only.
    ///
    /// Clears every ready flag. Entering `Voting` computes the candidates.
    pub fn advance_stage(&mut self, sender: &ClientId) -> Result<Stage, RoomError> {
        if !self.is_host(sender) {
            return Err(RoomError::NotHost);
        }
        let next = self.stage.next().ok_or(RoomError::FinalStageReached)?;

        self.stage = next;
        for player in &mut self.players {
            player.ready = false;
        }
        if next == Stage::Voting {
            self.candidates = self.collect_candidates();
        }

        Ok(next)
    }

    /// Set the countdown. Host only.
    pub fn set_timer(&mut self, sender: &ClientId, seconds: u64) -> Result<u64, RoomError> {
        if !self.is_host(sender) {
            return Err(RoomError::NotHost);
        }
        self.time = seconds;
        Ok(self.time)
    }

    /// Decrement a running countdown by one second.
    ///
    /// Returns the new value, or `None` when the countdown is not running.
    pub fn tick_timer(&mut self) -> Option<u64> {
        if self.time == 0 {
            return None;
        }
        self.time -= 1;
        Some(self.time)
    }

    pub fn add_list_item(
        &mut self,
        player: &ClientId,
        item: ListItem,
    ) -> Result<&[ListItem], RoomError> {
        if self.player(player).is_none() {
            return Err(RoomError::NotInRoom);
        }

        let list = self.lists.entry(player.clone()).or_default();
        if list.iter().any(|existing| existing.id == item.id) {
            return Err(RoomError::ItemAlreadyListed(item.id));
        }
        list.push(item);

        Ok(list.as_slice())
    }

    pub fn remove_list_item(
        &mut self,
        player: &ClientId,
        item_id: &str,
    ) -> Result<&[ListItem], RoomError> {
        if self.player(player).is_none() {
            return Err(RoomError::NotInRoom);
        }

        let list = self.lists.entry(player.clone()).or_default();
        list.retain(|item| item.id != item_id);

        Ok(list.as_slice())
    }

    /// Register a vote: `approve` adds one to the score, otherwise subtracts one.
    ///
    /// A voter who has now voted on every candidate is marked ready.
    pub fn vote(
        &mut self,
        voter: &ClientId,
        candidate_id: &str,
        approve: bool,
    ) -> Result<VoteOutcome, RoomError> {
        if self.stage != Stage::Voting {
            return Err(RoomError::NotVotingStage);
        }
        if self.player(voter).is_none() {
            return Err(RoomError::NotInRoom);
        }

        let candidate = self
            .candidates
            .iter_mut()
            .find(|c| c.id() == candidate_id)
            .ok_or_else(|| RoomError::CandidateNotFound(candidate_id.to_string()))?;
        if candidate.has_voted(voter) {
            return Err(RoomError::AlreadyVoted(candidate_id.to_string()));
        }

        candidate.voters.insert(voter.clone());
        candidate.score += if approve { 1 } else { -1 };

        let candidates_left = self.candidates_left_for(voter).len();
        let mut became_ready = false;
        if candidates_left == 0 {
            if let Some(player) = self.players.iter_mut().find(|p| &p.id == voter) {
                became_ready = !player.ready;
                player.ready = true;
            }
        }

        Ok(VoteOutcome {
            candidates_left,
            became_ready,
        })
    }

    /// Candidates the voter has not voted on yet, in candidate order.
    pub fn candidates_left_for(&self, voter: &ClientId) -> Vec<&Candidate> {
        self.candidates
            .iter()
            .filter(|c| !c.has_voted(voter))
            .collect()
    }

    /// Candidates sorted by score, highest first, split into the top-score
    /// winners and everybody else. Ties at the top are all winners.
    pub fn results(&self) -> Results {
        let mut sorted = self.candidates.clone();
        sorted.sort_by(|a, b| b.score.cmp(&a.score));

        let Some(max) = sorted.first().map(|c| c.score) else {
            return Results::default();
        };
        let (winners, others): (Vec<_>, Vec<_>) = sorted.into_iter().partition(|c| c.score == max);

        Results { winners, others }
    }

    /// Union of the current players' lists, deduplicated by item id.
    ///
    /// Lists are visited in client-id order, so the first contributor of an
    /// item becomes its `suggested_by`.
    fn collect_candidates(&self) -> Vec<Candidate> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for (owner, list) in &self.lists {
            if self.player(owner).is_none() {
                continue;
            }
            for item in list {
                if seen.insert(item.id.clone()) {
                    candidates.push(Candidate::new(item.clone(), owner.clone()));
                }
            }
        }

        candidates
    }
}
