//! 表现层协作接口。核心只产出事件，这里把事件翻译成渲染调用。

use serde::{Deserialize, Serialize};

use crate::game::{format_time, Card, GameEvent, GameMode, GameState, GameSummary, ScoreTally};

/// 单张卡牌的视觉状态，对应前端的 CSS class。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CardVisual {
    Hidden,
    Flipped,
    Shake,
    Matched,
    Removed,
}

impl CardVisual {
    pub fn as_str(self) -> &'static str {
        match self {
            CardVisual::Hidden => "hidden",
            CardVisual::Flipped => "flipped",
            CardVisual::Shake => "shake",
            CardVisual::Matched => "matched",
            CardVisual::Removed => "removed",
        }
    }
}

/// 回合数 / 计时 / 比分面板。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusView {
    pub round: u32,
    pub elapsed: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<ScoreTally>,
}

impl StatusView {
    pub fn from_state(state: &GameState, now_ms: u64) -> Self {
        Self {
            round: state.round,
            elapsed: format_time(state.elapsed_secs(now_ms)),
            scores: match state.mode {
                GameMode::Single => None,
                GameMode::Versus => Some(state.scores),
            },
        }
    }
}

pub trait Presenter {
    fn render_cards(&mut self, cards: &[Card]);
    fn set_card_visual(&mut self, index: usize, visual: CardVisual);
    fn render_status(&mut self, status: &StatusView);
    fn render_summary(&mut self, summary: &GameSummary);
    fn notify(&mut self, message: &str);
}

/// 一次待执行的渲染调用。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterCall {
    RenderCards(Vec<Card>),
    SetCardVisual(usize, CardVisual),
    RenderStatus(StatusView),
    RenderSummary(GameSummary),
    Notify(String),
}

impl PresenterCall {
    pub fn replay<P: Presenter + ?Sized>(self, presenter: &mut P) {
        match self {
            PresenterCall::RenderCards(cards) => presenter.render_cards(&cards),
            PresenterCall::SetCardVisual(index, visual) => presenter.set_card_visual(index, visual),
            PresenterCall::RenderStatus(status) => presenter.render_status(&status),
            PresenterCall::RenderSummary(summary) => presenter.render_summary(&summary),
            PresenterCall::Notify(message) => presenter.notify(&message),
        }
    }
}

/// 先缓存渲染调用，由宿主在释放会话借用后再统一回放。
/// 前端回调里可以再次调用游戏对象而不会重入。
#[derive(Debug, Default)]
pub struct BufferedPresenter {
    calls: Vec<PresenterCall>,
}

impl BufferedPresenter {
    pub fn take_calls(&mut self) -> Vec<PresenterCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

impl Presenter for BufferedPresenter {
    fn render_cards(&mut self, cards: &[Card]) {
        self.calls.push(PresenterCall::RenderCards(cards.to_vec()));
    }

    fn set_card_visual(&mut self, index: usize, visual: CardVisual) {
        self.calls.push(PresenterCall::SetCardVisual(index, visual));
    }

    fn render_status(&mut self, status: &StatusView) {
        self.calls.push(PresenterCall::RenderStatus(status.clone()));
    }

    fn render_summary(&mut self, summary: &GameSummary) {
        self.calls.push(PresenterCall::RenderSummary(summary.clone()));
    }

    fn notify(&mut self, message: &str) {
        self.calls.push(PresenterCall::Notify(message.to_string()));
    }
}

pub fn machine_notice(token: &str) -> String {
    format!("A máquina removeu o par do Pokémon #{token}!")
}

pub fn present<P: Presenter + ?Sized>(
    presenter: &mut P,
    events: &[GameEvent],
    state: &GameState,
    now_ms: u64,
) {
    let mut status_dirty = false;
    for event in events {
        match event {
            GameEvent::DeckDealt { .. } => {
                presenter.render_cards(&state.cards);
                status_dirty = true;
            }
            GameEvent::CardRevealed { index, .. } => {
                presenter.set_card_visual(*index, CardVisual::Flipped);
            }
            GameEvent::PairSelected { .. } => {}
            GameEvent::CardsShaken { indices } => {
                for index in indices {
                    presenter.set_card_visual(*index, CardVisual::Shake);
                }
            }
            GameEvent::CardsHidden { indices } => {
                for index in indices {
                    if state.cards.get(*index).is_some_and(|card| card.state.is_live()) {
                        presenter.set_card_visual(*index, CardVisual::Hidden);
                    }
                }
            }
            GameEvent::PairMatched { indices, .. } => {
                for index in indices {
                    presenter.set_card_visual(*index, CardVisual::Matched);
                }
            }
            GameEvent::MachinePicked { token, indices, .. } => {
                for index in indices {
                    presenter.set_card_visual(*index, CardVisual::Flipped);
                }
                presenter.notify(&machine_notice(token.as_str()));
            }
            GameEvent::PairRemoved { indices, .. } => {
                for index in indices {
                    presenter.set_card_visual(*index, CardVisual::Removed);
                }
            }
            GameEvent::ScoreChanged { .. } | GameEvent::RoundCompleted { .. } => {
                status_dirty = true;
            }
            GameEvent::GameFinished { summary } => {
                presenter.render_summary(summary);
            }
        }
    }
    if status_dirty {
        presenter.render_status(&StatusView::from_state(state, now_ms));
    }
}
