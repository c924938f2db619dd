use serde::{Deserialize, Serialize};

use super::config::GameMode;
use super::deck::{Card, CardState};
use super::resolution::{PairOutcome, ResolutionTicket};
use super::score::{GameSummary, ScoreTally};
use super::token::Token;

/// 回合状态机：`Idle → OneSelected → Resolving → Idle`。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum TurnState {
    #[default]
    Idle,
    OneSelected {
        first: usize,
    },
    Resolving {
        first: usize,
        second: usize,
        ticket: ResolutionTicket,
        outcome: PairOutcome,
        next_step: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        machine_pick: Option<[usize; 2]>,
    },
}

impl TurnState {
    pub fn is_locked(&self) -> bool {
        matches!(self, TurnState::Resolving { .. })
    }

    pub fn selected(&self) -> Vec<usize> {
        match self {
            TurnState::Idle => Vec::new(),
            TurnState::OneSelected { first } => vec![*first],
            TurnState::Resolving { first, second, .. } => vec![*first, *second],
        }
    }
}

/// 游戏事件流。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    DeckDealt {
        epoch: u64,
        cards: usize,
    },
    CardRevealed {
        index: usize,
        token: Token,
    },
    PairSelected {
        first: usize,
        second: usize,
        outcome: PairOutcome,
    },
    CardsShaken {
        indices: [usize; 2],
    },
    CardsHidden {
        indices: [usize; 2],
    },
    PairMatched {
        token: Token,
        indices: [usize; 2],
        #[serde(skip_serializing_if = "Option::is_none")]
        reward: Option<i32>,
    },
    MachinePicked {
        token: Token,
        indices: [usize; 2],
        points: i32,
    },
    PairRemoved {
        token: Token,
        indices: [usize; 2],
    },
    ScoreChanged {
        scores: ScoreTally,
    },
    RoundCompleted {
        round: u32,
    },
    GameFinished {
        summary: GameSummary,
    },
}

/// 一局游戏的完整状态。重开时整体替换，`epoch` 加一。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameState {
    pub epoch: u64,
    pub mode: GameMode,
    pub cards: Vec<Card>,
    #[serde(default)]
    pub turn: TurnState,
    pub round: u32,
    pub matched_pairs: usize,
    #[serde(default)]
    pub scores: ScoreTally,
    pub started_at_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_log: Vec<GameEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<GameSummary>,
}

impl GameState {
    pub fn new(epoch: u64, mode: GameMode, cards: Vec<Card>, started_at_ms: u64) -> Self {
        let mut state = Self {
            epoch,
            mode,
            cards,
            turn: TurnState::Idle,
            round: 1,
            matched_pairs: 0,
            scores: ScoreTally::default(),
            started_at_ms,
            event_log: Vec::new(),
            summary: None,
        };
        state.record_event(GameEvent::DeckDealt {
            epoch,
            cards: state.cards.len(),
        });
        state
    }

    pub fn record_event(&mut self, event: GameEvent) {
        self.event_log.push(event);
    }

    pub fn pair_count(&self) -> usize {
        self.cards.len() / 2
    }

    pub fn card(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    pub fn live_cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter().filter(|card| card.state.is_live())
    }

    pub fn live_count(&self) -> usize {
        self.live_cards().count()
    }

    /// 某个 token 仍在场上的两张牌。
    pub fn live_pair(&self, token: &Token) -> Option<[usize; 2]> {
        let mut indices = self
            .live_cards()
            .filter(|card| &card.token == token)
            .map(|card| card.index);
        Some([indices.next()?, indices.next()?])
    }

    pub fn set_card_state(&mut self, indices: [usize; 2], state: CardState) {
        for index in indices {
            if let Some(card) = self.cards.get_mut(index) {
                card.state = state;
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.summary.is_some()
    }

    pub fn is_terminal(&self) -> bool {
        match self.mode {
            GameMode::Single => self.matched_pairs == self.pair_count(),
            GameMode::Versus => self.live_count() == 0,
        }
    }

    /// 单人模式的尝试次数。
    pub fn attempts(&self) -> u32 {
        self.round.saturating_sub(1)
    }

    pub fn elapsed_secs(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.started_at_ms) / 1000
    }
}
