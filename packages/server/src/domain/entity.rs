//! エンティティ定義
//!
//! ## Room
//!
//! 投票ラウンドの単位となる部屋。参加者のマップと、ラウンドの状態を持つ。
//! ラウンドの状態遷移は `Open -> Completed` の一方向のみで、
//! `Completed` から `Open` に戻すには明示的なリセット（`reset_round`）が必要。
//!
//! ## Participant
//!
//! Room に接続しているクライアント。送信用チャンネルを排他的に所有する。

use std::collections::{HashMap, HashSet};

use super::{
    message_pusher::{PusherChannel, Recipient},
    value_object::{ConnectionId, ParticipantId, RequiredCount, RoomKey, Timestamp},
};

/// Room に接続している参加者
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: ParticipantId,
    /// 表示名（初期値は id）
    pub user_name: String,
    /// 最後に提出した選択。空なら未提出
    pub selections: Vec<String>,
    pub connection_id: ConnectionId,
    pub connected_at: Timestamp,
    /// 送信用チャンネル（この参加者が排他的に所有する）
    pub channel: PusherChannel,
}

impl Participant {
    pub fn new(
        id: ParticipantId,
        channel: PusherChannel,
        connection_id: ConnectionId,
        connected_at: Timestamp,
    ) -> Self {
        Self {
            user_name: id.as_str().to_string(),
            id,
            selections: Vec::new(),
            connection_id,
            connected_at,
            channel,
        }
    }

    pub fn has_submitted(&self) -> bool {
        !self.selections.is_empty()
    }

    pub fn status(&self) -> ParticipantStatus {
        ParticipantStatus {
            id: self.id.clone(),
            user_name: self.user_name.clone(),
            submitted: self.selections.len(),
            connected_at: self.connected_at,
        }
    }

    pub fn recipient(&self) -> Recipient {
        Recipient {
            id: self.id.clone(),
            channel: self.channel.clone(),
        }
    }

    /// 結果ログの 1 行（例: `aliceは「1」と「3」を指定しました。`）
    fn summary_line(&self) -> String {
        let selections = self
            .selections
            .iter()
            .map(|selection| format!("「{}」", selection))
            .collect::<Vec<_>>()
            .join("と");
        format!("{}は{}を指定しました。", self.user_name, selections)
    }
}

/// 参加者の状態（ロスター配信・一覧表示用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantStatus {
    pub id: ParticipantId,
    pub user_name: String,
    /// 提出済みの選択数
    pub submitted: usize,
    pub connected_at: Timestamp,
}

/// ラウンドの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    /// ラウンド進行中
    Open,
    /// このラウンドの結果配信が完了した
    Completed,
}

impl RoundState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundState::Open => "open",
            RoundState::Completed => "completed",
        }
    }
}

/// ラウンド完了時の集計結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundResult {
    /// 全参加者の選択の和集合（重複なし）
    pub cards: Vec<String>,
    /// 参加者ごとの「誰が何を選んだか」（ID 順）
    ///
    /// 選択を提出していない参加者の行は含めない。
    pub logs: Vec<String>,
}

/// Room の読み取り専用スナップショット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub key: RoomKey,
    pub required_count: RequiredCount,
    pub round_state: RoundState,
    pub created_at: Timestamp,
    pub participants: Vec<ParticipantStatus>,
}

/// 投票ラウンドの単位となる部屋
#[derive(Debug)]
pub struct Room {
    pub key: RoomKey,
    pub required_count: RequiredCount,
    pub round_state: RoundState,
    pub created_at: Timestamp,
    participants: HashMap<ParticipantId, Participant>,
}

impl Room {
    pub fn new(key: RoomKey, required_count: RequiredCount, created_at: Timestamp) -> Self {
        Self {
            key,
            required_count,
            round_state: RoundState::Open,
            created_at,
            participants: HashMap::new(),
        }
    }

    /// 参加者を追加する。同じ ID の参加者がいれば置き換え、置き換えた参加者を返す
    pub fn insert_participant(&mut self, participant: Participant) -> Option<Participant> {
        self.participants.insert(participant.id.clone(), participant)
    }

    pub fn remove_participant(&mut self, id: &ParticipantId) -> Option<Participant> {
        self.participants.remove(id)
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.participants.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// 参加者一覧（ID 順）
    pub fn participants(&self) -> Vec<&Participant> {
        let mut participants: Vec<&Participant> = self.participants.values().collect();
        participants.sort_by(|a, b| a.id.cmp(&b.id));
        participants
    }

    /// 選択を提出済みの参加者数
    pub fn submitted_count(&self) -> usize {
        self.participants
            .values()
            .filter(|participant| participant.has_submitted())
            .count()
    }

    /// 参加者の選択を丸ごと置き換える。参加者がいなければ false
    pub fn submit_selections(&mut self, id: &ParticipantId, selections: Vec<String>) -> bool {
        match self.participants.get_mut(id) {
            Some(participant) => {
                participant.selections = selections;
                true
            }
            None => false,
        }
    }

    /// 参加者の表示名を変更する。参加者がいなければ false
    pub fn rename_participant(&mut self, id: &ParticipantId, user_name: String) -> bool {
        match self.participants.get_mut(id) {
            Some(participant) => {
                participant.user_name = user_name;
                true
            }
            None => false,
        }
    }

    /// ラウンドが完了条件を満たしていれば `Completed` に遷移し、集計結果を返す
    ///
    /// 既に `Completed` の場合は何もしない（1 ラウンドにつき 1 回のみ発火）。
    pub fn try_complete_round(&mut self) -> Option<RoundResult> {
        if self.round_state == RoundState::Completed
            || self.submitted_count() != self.required_count.value()
        {
            return None;
        }
        self.round_state = RoundState::Completed;
        Some(self.round_result())
    }

    /// 全参加者の選択をクリアし、新しいラウンドを開始する
    pub fn reset_round(&mut self) {
        for participant in self.participants.values_mut() {
            participant.selections.clear();
        }
        self.round_state = RoundState::Open;
    }

    /// 集計結果を作る
    ///
    /// `cards` は参加者を ID 順に見たときの初出順で重複を除いたもの。
    /// 未提出の参加者はログに含めない。
    pub fn round_result(&self) -> RoundResult {
        let mut seen = HashSet::new();
        let mut cards = Vec::new();
        let mut logs = Vec::new();

        for participant in self.participants() {
            if !participant.has_submitted() {
                continue;
            }
            logs.push(participant.summary_line());
            for selection in &participant.selections {
                if seen.insert(selection.as_str()) {
                    cards.push(selection.clone());
                }
            }
        }

        RoundResult { cards, logs }
    }

    /// ロスター（ID 順）
    pub fn roster(&self) -> Vec<ParticipantStatus> {
        self.participants()
            .into_iter()
            .map(Participant::status)
            .collect()
    }

    /// ブロードキャスト対象（ID 順）
    pub fn recipients(&self) -> Vec<Recipient> {
        self.participants()
            .into_iter()
            .map(Participant::recipient)
            .collect()
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            key: self.key.clone(),
            required_count: self.required_count,
            round_state: self.round_state,
            created_at: self.created_at,
            participants: self.roster(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn create_room(required: usize) -> Room {
        Room::new(
            RoomKey::new("room-1".to_string()).unwrap(),
            RequiredCount::new(required).unwrap(),
            Timestamp::new(1000),
        )
    }

    fn create_participant(id: &str) -> Participant {
        let (tx, _rx) = mpsc::unbounded_channel();
        Participant::new(
            ParticipantId::new(id.to_string()).unwrap(),
            tx,
            ConnectionId::generate(),
            Timestamp::new(2000),
        )
    }

    fn pid(id: &str) -> ParticipantId {
        ParticipantId::new(id.to_string()).unwrap()
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn test_new_participant_defaults() {
        // テスト項目: 新規参加者の表示名は ID、選択は空
        // given / when:
        let participant = create_participant("alice");

        // then (期待する結果):
        assert_eq!(participant.user_name, "alice");
        assert!(participant.selections.is_empty());
        assert!(!participant.has_submitted());
    }

    #[test]
    fn test_insert_participant_replaces_same_id() {
        // テスト項目: 同じ ID の参加者を追加すると置き換えられる
        // given (前提条件):
        let mut room = create_room(2);
        let first = create_participant("alice");
        let first_connection = first.connection_id;
        room.insert_participant(first);
        room.submit_selections(&pid("alice"), strings(&["1"]));

        // when (操作):
        let replaced = room.insert_participant(create_participant("alice"));

        // then (期待する結果): 置き換え前の参加者が返され、状態は初期化されている
        assert_eq!(replaced.unwrap().connection_id, first_connection);
        assert_eq!(room.len(), 1);
        assert!(!room.participant(&pid("alice")).unwrap().has_submitted());
    }

    #[test]
    fn test_roster_sorted_by_id() {
        // テスト項目: ロスターは ID 順で、提出数が反映される
        // given (前提条件):
        let mut room = create_room(3);
        for id in ["charlie", "alice", "bob"] {
            room.insert_participant(create_participant(id));
        }
        room.submit_selections(&pid("bob"), strings(&["1", "2"]));

        // when (操作):
        let roster = room.roster();

        // then (期待する結果):
        let ids: Vec<&str> = roster.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob", "charlie"]);
        let submitted: Vec<usize> = roster.iter().map(|p| p.submitted).collect();
        assert_eq!(submitted, vec![0, 2, 0]);
    }

    #[test]
    fn test_try_complete_round_fires_once() {
        // テスト項目: 必要人数に達したときに 1 回だけ完了する
        // given (前提条件):
        let mut room = create_room(2);
        for id in ["alice", "bob", "charlie"] {
            room.insert_participant(create_participant(id));
        }

        // when (操作): alice, bob の順に提出
        room.submit_selections(&pid("alice"), strings(&["x"]));
        let after_alice = room.try_complete_round();
        room.submit_selections(&pid("bob"), strings(&["y"]));
        let after_bob = room.try_complete_round();

        // then (期待する結果):
        assert!(after_alice.is_none());
        assert!(after_bob.is_some());
        assert_eq!(room.round_state, RoundState::Completed);

        // when (操作): 完了後に alice が再提出しても再発火しない
        room.submit_selections(&pid("alice"), strings(&["z"]));
        assert!(room.try_complete_round().is_none());

        // when (操作): charlie が提出しても再発火しない
        room.submit_selections(&pid("charlie"), strings(&["w"]));
        assert!(room.try_complete_round().is_none());
    }

    #[test]
    fn test_round_result_deduplicates_cards() {
        // テスト項目: cards は選択の和集合で、重複が除かれる
        // given (前提条件):
        let mut room = create_room(2);
        room.insert_participant(create_participant("alice"));
        room.insert_participant(create_participant("bob"));
        room.submit_selections(&pid("alice"), strings(&["x", "y"]));
        room.submit_selections(&pid("bob"), strings(&["y", "z"]));

        // when (操作):
        let result = room.try_complete_round().unwrap();

        // then (期待する結果):
        assert_eq!(result.cards, strings(&["x", "y", "z"]));
        assert_eq!(
            result.logs,
            strings(&[
                "aliceは「x」と「y」を指定しました。",
                "bobは「y」と「z」を指定しました。",
            ])
        );
    }

    #[test]
    fn test_round_result_uses_user_name_and_skips_unsubmitted() {
        // テスト項目: ログには表示名が使われ、未提出者は含まれない
        // given (前提条件):
        let mut room = create_room(1);
        room.insert_participant(create_participant("alice"));
        room.insert_participant(create_participant("bob"));
        room.rename_participant(&pid("alice"), "アリス".to_string());
        room.submit_selections(&pid("alice"), strings(&["5"]));

        // when (操作):
        let result = room.try_complete_round().unwrap();

        // then (期待する結果):
        assert_eq!(result.cards, strings(&["5"]));
        assert_eq!(result.logs, strings(&["アリスは「5」を指定しました。"]));
    }

    #[test]
    fn test_reset_round_reopens() {
        // テスト項目: リセットすると選択がクリアされ、次のラウンドが完了できる
        // given (前提条件):
        let mut room = create_room(1);
        room.insert_participant(create_participant("alice"));
        room.submit_selections(&pid("alice"), strings(&["1"]));
        room.try_complete_round().unwrap();

        // when (操作):
        room.reset_round();

        // then (期待する結果):
        assert_eq!(room.round_state, RoundState::Open);
        assert_eq!(room.submitted_count(), 0);
        room.submit_selections(&pid("alice"), strings(&["2"]));
        assert_eq!(room.try_complete_round().unwrap().cards, strings(&["2"]));
    }

    #[test]
    fn test_empty_submission_counts_as_not_submitted() {
        // テスト項目: 空の選択を提出すると未提出扱いに戻る
        // given (前提条件):
        let mut room = create_room(2);
        room.insert_participant(create_participant("alice"));
        room.submit_selections(&pid("alice"), strings(&["1"]));

        // when (操作):
        room.submit_selections(&pid("alice"), Vec::new());

        // then (期待する結果):
        assert_eq!(room.submitted_count(), 0);
    }

    #[test]
    fn test_mutations_on_unknown_participant() {
        // テスト項目: 存在しない参加者への操作は false を返す
        // given (前提条件):
        let mut room = create_room(2);

        // when / then:
        assert!(!room.submit_selections(&pid("ghost"), strings(&["1"])));
        assert!(!room.rename_participant(&pid("ghost"), "Ghost".to_string()));
        assert!(room.remove_participant(&pid("ghost")).is_none());
    }
}
