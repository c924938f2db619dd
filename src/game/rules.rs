use serde::{Deserialize, Serialize};

use crate::ai::MachineOpponent;

use super::{
    config::{GameConfig, GameMode, Timings},
    deck::CardState,
    resolution::{
        schedule_for, PairOutcome, PendingResolution, ResolutionStep, ResolutionTicket,
    },
    score::{GameSummary, ScoringRules},
    state::{GameEvent, GameState, TurnState},
};

/// 被忽略的选牌。这些都不是错误，只是不改变任何状态。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    GameFinished,
    Locked,
    OutOfRange,
    SameCard,
    NotSelectable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Ignored(IgnoreReason),
    Revealed {
        events: Vec<GameEvent>,
    },
    Resolving {
        events: Vec<GameEvent>,
        pending: PendingResolution,
    },
}

impl Selection {
    pub fn events(&self) -> &[GameEvent] {
        match self {
            Selection::Ignored(_) => &[],
            Selection::Revealed { events } | Selection::Resolving { events, .. } => events,
        }
    }

    pub fn pending(&self) -> Option<&PendingResolution> {
        match self {
            Selection::Resolving { pending, .. } => Some(pending),
            _ => None,
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, Selection::Ignored(_))
    }
}

/// 回合控制与配对结算。
pub struct RuleEngine {
    timings: Timings,
    scoring: ScoringRules,
    machine: MachineOpponent,
}

impl RuleEngine {
    pub fn new(config: &GameConfig) -> Self {
        let machine = match config.seed {
            Some(seed) => MachineOpponent::with_seed(seed.wrapping_add(0x9E37_79B9_7F4A_7C15)),
            None => MachineOpponent::new(),
        };
        Self::with_machine(config, machine)
    }

    pub fn with_machine(config: &GameConfig, machine: MachineOpponent) -> Self {
        Self {
            timings: config.timings,
            scoring: config.scoring,
            machine,
        }
    }

    fn check_selectable(state: &GameState, index: usize) -> Result<(), IgnoreReason> {
        if state.is_finished() {
            return Err(IgnoreReason::GameFinished);
        }
        if state.turn.is_locked() {
            return Err(IgnoreReason::Locked);
        }
        if let TurnState::OneSelected { first } = state.turn {
            if first == index {
                return Err(IgnoreReason::SameCard);
            }
        }
        let card = state.card(index).ok_or(IgnoreReason::OutOfRange)?;
        if !card.is_selectable() {
            return Err(IgnoreReason::NotSelectable);
        }
        Ok(())
    }

    fn record(state: &mut GameState, events: &mut Vec<GameEvent>, event: GameEvent) {
        state.record_event(event.clone());
        events.push(event);
    }

    pub fn select(&mut self, state: &mut GameState, index: usize) -> Selection {
        if let Err(reason) = Self::check_selectable(state, index) {
            crate::console_log!("selection of card {index} ignored: {reason:?}");
            return Selection::Ignored(reason);
        }

        let mut events = Vec::new();
        state.cards[index].state = CardState::Revealed;
        let token = state.cards[index].token.clone();
        Self::record(state, &mut events, GameEvent::CardRevealed { index, token });

        let first = match state.turn {
            TurnState::OneSelected { first } => first,
            _ => {
                state.turn = TurnState::OneSelected { first: index };
                return Selection::Revealed { events };
            }
        };

        let second = index;
        let outcome = if state.cards[first].token == state.cards[second].token {
            PairOutcome::Match
        } else {
            PairOutcome::Mismatch
        };
        let ticket = ResolutionTicket {
            epoch: state.epoch,
            round: state.round,
        };
        state.turn = TurnState::Resolving {
            first,
            second,
            ticket,
            outcome,
            next_step: 0,
            machine_pick: None,
        };
        Self::record(
            state,
            &mut events,
            GameEvent::PairSelected {
                first,
                second,
                outcome,
            },
        );

        let pending = PendingResolution {
            ticket,
            first,
            second,
            outcome,
            schedule: schedule_for(state.mode, outcome, &self.timings),
        };
        Selection::Resolving { events, pending }
    }

    /// 执行计划中的下一步。票据过期或当前没有结算时返回 `None`。
    pub fn advance(
        &mut self,
        state: &mut GameState,
        ticket: &ResolutionTicket,
        now_ms: u64,
    ) -> Option<Vec<GameEvent>> {
        let (first, second, outcome, next_step) = match &state.turn {
            TurnState::Resolving {
                first,
                second,
                ticket: live,
                outcome,
                next_step,
                ..
            } if live == ticket => (*first, *second, *outcome, *next_step),
            _ => {
                crate::console_log!(
                    "stale resolution step ignored (epoch {}, round {})",
                    ticket.epoch,
                    ticket.round
                );
                return None;
            }
        };

        let schedule = schedule_for(state.mode, outcome, &self.timings);
        let step = schedule.get(next_step)?.step;
        let pair = [first, second];
        let mut events = Vec::new();

        match step {
            ResolutionStep::Shake => {
                Self::record(state, &mut events, GameEvent::CardsShaken { indices: pair });
            }
            ResolutionStep::Hide => self.hide_pair(state, &mut events, pair),
            ResolutionStep::MachineReveal => self.machine_reveal(state, &mut events),
            ResolutionStep::Finish => {
                self.finish(state, &mut events, pair, outcome, now_ms);
                return Some(events);
            }
        }

        if let TurnState::Resolving { next_step, .. } = &mut state.turn {
            *next_step += 1;
        }
        Some(events)
    }

    fn hide_pair(&self, state: &mut GameState, events: &mut Vec<GameEvent>, pair: [usize; 2]) {
        let mut hidden = false;
        for index in pair {
            if let Some(card) = state.cards.get_mut(index) {
                if card.state == CardState::Revealed {
                    card.state = CardState::Hidden;
                    hidden = true;
                }
            }
        }
        if hidden {
            Self::record(state, events, GameEvent::CardsHidden { indices: pair });
        }
    }

    fn machine_reveal(&mut self, state: &mut GameState, events: &mut Vec<GameEvent>) {
        let Some(pick) = self.machine.pick(state) else {
            return;
        };
        state.set_card_state(pick.indices, CardState::Revealed);
        let points = self.scoring.machine_reward;
        state.scores.machine += points;
        if let TurnState::Resolving { machine_pick, .. } = &mut state.turn {
            *machine_pick = Some(pick.indices);
        }
        Self::record(
            state,
            events,
            GameEvent::MachinePicked {
                token: pick.token,
                indices: pick.indices,
                points,
            },
        );
        let scores = state.scores;
        Self::record(state, events, GameEvent::ScoreChanged { scores });
    }

    fn finish(
        &mut self,
        state: &mut GameState,
        events: &mut Vec<GameEvent>,
        pair: [usize; 2],
        outcome: PairOutcome,
        now_ms: u64,
    ) {
        match outcome {
            PairOutcome::Match => self.commit_match(state, events, pair),
            PairOutcome::Mismatch => {
                let pick = match &state.turn {
                    TurnState::Resolving { machine_pick, .. } => *machine_pick,
                    _ => None,
                };
                if let Some(indices) = pick {
                    let token = state.cards[indices[0]].token.clone();
                    state.set_card_state(indices, CardState::Removed);
                    Self::record(state, events, GameEvent::PairRemoved { token, indices });
                }
                self.hide_pair(state, events, pair);
            }
        }

        state.turn = TurnState::Idle;
        state.round += 1;
        let round = state.round;
        Self::record(state, events, GameEvent::RoundCompleted { round });

        if state.is_terminal() {
            let elapsed = state.elapsed_secs(now_ms);
            let summary = match state.mode {
                GameMode::Single => GameSummary::single(state.attempts(), elapsed),
                GameMode::Versus => {
                    GameSummary::versus(state.scores, state.attempts(), elapsed)
                }
            };
            state.summary = Some(summary.clone());
            Self::record(state, events, GameEvent::GameFinished { summary });
        }
    }

    fn commit_match(&self, state: &mut GameState, events: &mut Vec<GameEvent>, pair: [usize; 2]) {
        state.set_card_state(pair, CardState::Matched);
        state.matched_pairs += 1;
        let token = state.cards[pair[0]].token.clone();

        let reward = match state.mode {
            GameMode::Single => None,
            GameMode::Versus => Some(self.scoring.match_reward(state.round)),
        };
        if let Some(points) = reward {
            state.scores.player += points;
        }
        Self::record(
            state,
            events,
            GameEvent::PairMatched {
                token,
                indices: pair,
                reward,
            },
        );
        if reward.is_some() {
            let scores = state.scores;
            Self::record(state, events, GameEvent::ScoreChanged { scores });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Card, GameMode, Token};

    /// 固定牌序：0/2 为 "025"，1/3 为 "133"，4/5 为 "007"。
    fn fixed_state(mode: GameMode) -> GameState {
        let tokens = ["025", "133", "025", "133", "007", "007"];
        let cards = tokens
            .iter()
            .enumerate()
            .map(|(index, token)| Card::new(index, Token::new(*token)))
            .collect();
        GameState::new(0, mode, cards, 0)
    }

    fn engine(mode: GameMode) -> RuleEngine {
        let config = GameConfig::from_mode(mode).with_seed(5);
        RuleEngine::new(&config)
    }

    fn resolve(engine: &mut RuleEngine, state: &mut GameState, pending: &PendingResolution) {
        for _ in &pending.schedule {
            engine
                .advance(state, &pending.ticket, 0)
                .expect("live ticket should advance");
        }
    }

    fn pick_pair(
        engine: &mut RuleEngine,
        state: &mut GameState,
        first: usize,
        second: usize,
    ) -> PendingResolution {
        assert!(matches!(engine.select(state, first), Selection::Revealed { .. }));
        engine
            .select(state, second)
            .pending()
            .cloned()
            .expect("second selection should start resolving")
    }

    #[test]
    fn first_selection_reveals_card() {
        let mut engine = engine(GameMode::Single);
        let mut state = fixed_state(GameMode::Single);

        let selection = engine.select(&mut state, 0);
        assert_eq!(
            selection.events(),
            &[GameEvent::CardRevealed {
                index: 0,
                token: Token::new("025")
            }]
        );
        assert_eq!(state.turn, TurnState::OneSelected { first: 0 });
        assert_eq!(state.cards[0].state, CardState::Revealed);
    }

    #[test]
    fn reselecting_same_card_is_ignored() {
        let mut engine = engine(GameMode::Single);
        let mut state = fixed_state(GameMode::Single);

        engine.select(&mut state, 0);
        let before = state.clone();
        assert_eq!(
            engine.select(&mut state, 0),
            Selection::Ignored(IgnoreReason::SameCard)
        );
        assert_eq!(state, before);
    }

    #[test]
    fn input_is_locked_while_resolving() {
        let mut engine = engine(GameMode::Single);
        let mut state = fixed_state(GameMode::Single);

        pick_pair(&mut engine, &mut state, 0, 1);
        assert!(state.turn.is_locked());
        assert_eq!(
            engine.select(&mut state, 4),
            Selection::Ignored(IgnoreReason::Locked)
        );
        assert_eq!(state.cards[4].state, CardState::Hidden);
    }

    #[test]
    fn out_of_range_and_resolved_cards_are_ignored() {
        let mut engine = engine(GameMode::Single);
        let mut state = fixed_state(GameMode::Single);

        assert_eq!(
            engine.select(&mut state, 99),
            Selection::Ignored(IgnoreReason::OutOfRange)
        );
        let pending = pick_pair(&mut engine, &mut state, 0, 2);
        resolve(&mut engine, &mut state, &pending);
        assert_eq!(
            engine.select(&mut state, 2),
            Selection::Ignored(IgnoreReason::NotSelectable)
        );
        assert_eq!(state.round, 2, "ignored selections never advance the round");
    }

    #[test]
    fn single_match_marks_pair_and_releases_lock() {
        let mut engine = engine(GameMode::Single);
        let mut state = fixed_state(GameMode::Single);

        let pending = pick_pair(&mut engine, &mut state, 0, 2);
        assert_eq!(pending.outcome, PairOutcome::Match);
        resolve(&mut engine, &mut state, &pending);

        assert_eq!(state.cards[0].state, CardState::Matched);
        assert_eq!(state.cards[2].state, CardState::Matched);
        assert_eq!(state.matched_pairs, 1);
        assert_eq!(state.turn, TurnState::Idle);
        assert!(state.turn.selected().is_empty());
        assert_eq!(state.round, 2);
        assert_eq!(state.scores.player, 0, "single mode keeps no score");
    }

    #[test]
    fn single_mismatch_shakes_then_hides() {
        let mut engine = engine(GameMode::Single);
        let mut state = fixed_state(GameMode::Single);

        let pending = pick_pair(&mut engine, &mut state, 0, 1);
        let shake = engine
            .advance(&mut state, &pending.ticket, 0)
            .expect("shake step");
        assert_eq!(shake, vec![GameEvent::CardsShaken { indices: [0, 1] }]);
        assert!(state.turn.is_locked(), "lock holds until the final step");

        let finish = engine
            .advance(&mut state, &pending.ticket, 0)
            .expect("finish step");
        assert_eq!(finish[0], GameEvent::CardsHidden { indices: [0, 1] });
        assert_eq!(state.cards[0].state, CardState::Hidden);
        assert_eq!(state.cards[1].state, CardState::Hidden);
        assert_eq!(state.turn, TurnState::Idle);
        assert_eq!(state.round, 2);
    }

    #[test]
    fn completed_ticket_becomes_stale() {
        let mut engine = engine(GameMode::Single);
        let mut state = fixed_state(GameMode::Single);

        let pending = pick_pair(&mut engine, &mut state, 0, 2);
        resolve(&mut engine, &mut state, &pending);
        let snapshot = state.clone();
        assert_eq!(engine.advance(&mut state, &pending.ticket, 0), None);
        assert_eq!(state, snapshot);
    }

    #[test]
    fn ticket_from_other_epoch_is_ignored() {
        let mut engine = engine(GameMode::Single);
        let mut state = fixed_state(GameMode::Single);

        let pending = pick_pair(&mut engine, &mut state, 0, 1);
        let stale = ResolutionTicket {
            epoch: pending.ticket.epoch + 1,
            round: pending.ticket.round,
        };
        assert_eq!(engine.advance(&mut state, &stale, 0), None);
        assert!(state.turn.is_locked());
    }

    #[test]
    fn single_game_finishes_with_summary() {
        let mut engine = engine(GameMode::Single);
        let mut state = fixed_state(GameMode::Single);

        for (first, second) in [(0, 1), (0, 2), (1, 3), (4, 5)] {
            let pending = pick_pair(&mut engine, &mut state, first, second);
            for _ in &pending.schedule {
                engine.advance(&mut state, &pending.ticket, 75_000);
            }
        }

        assert!(state.is_finished());
        assert_eq!(state.attempts(), 4);
        match state.summary.as_ref().expect("summary present") {
            GameSummary::Single {
                attempts, elapsed, ..
            } => {
                assert_eq!(*attempts, 4);
                assert_eq!(elapsed, "01:15");
            }
            other => panic!("unexpected summary {other:?}"),
        }
        assert_eq!(
            engine.select(&mut state, 0),
            Selection::Ignored(IgnoreReason::GameFinished)
        );
    }

    #[test]
    fn versus_match_awards_thirteen_minus_round() {
        let mut engine = engine(GameMode::Versus);
        let mut state = fixed_state(GameMode::Versus);
        state.round = 4;

        let pending = pick_pair(&mut engine, &mut state, 1, 3);
        let events = engine
            .advance(&mut state, &pending.ticket, 0)
            .expect("finish step");

        assert_eq!(state.scores.player, 9);
        assert!(events.contains(&GameEvent::PairMatched {
            token: Token::new("133"),
            indices: [1, 3],
            reward: Some(9),
        }));
        assert_eq!(state.live_count(), 4);
    }

    #[test]
    fn versus_reward_goes_negative_without_floor() {
        let mut engine = engine(GameMode::Versus);
        let mut state = fixed_state(GameMode::Versus);
        state.round = 20;

        let pending = pick_pair(&mut engine, &mut state, 4, 5);
        resolve(&mut engine, &mut state, &pending);
        assert_eq!(state.scores.player, -7);
    }

    #[test]
    fn versus_mismatch_machine_scores_and_removes_a_pair() {
        let mut engine = engine(GameMode::Versus);
        let mut state = fixed_state(GameMode::Versus);

        let pending = pick_pair(&mut engine, &mut state, 0, 1);
        assert_eq!(pending.schedule.len(), 4);
        let mut events = Vec::new();
        for _ in &pending.schedule {
            events.extend(
                engine
                    .advance(&mut state, &pending.ticket, 0)
                    .expect("live ticket"),
            );
        }

        assert_eq!(state.scores.machine, 1);
        assert_eq!(state.scores.player, 0);
        assert_eq!(state.live_count(), 4, "exactly one pair leaves play");
        let removed: Vec<_> = state
            .cards
            .iter()
            .filter(|card| card.state == CardState::Removed)
            .collect();
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[0].token, removed[1].token);
        assert!(events
            .iter()
            .any(|event| matches!(event, GameEvent::MachinePicked { points: 1, .. })));
        assert_eq!(state.turn, TurnState::Idle);
        assert_eq!(state.round, 2);
    }

    #[test]
    fn versus_ends_when_live_deck_is_empty() {
        let mut engine = engine(GameMode::Versus);
        let mut state = fixed_state(GameMode::Versus);

        while !state.is_finished() {
            let live: Vec<usize> = state.live_cards().map(|card| card.index).collect();
            let pending = pick_pair(&mut engine, &mut state, live[0], live[1]);
            resolve(&mut engine, &mut state, &pending);
        }

        assert_eq!(state.live_count(), 0);
        assert!(matches!(
            state.summary,
            Some(GameSummary::Versus { .. })
        ));
        assert!(state
            .event_log
            .iter()
            .any(|event| matches!(event, GameEvent::GameFinished { .. })));
    }
}
