//! 游戏核心逻辑模块（牌组、回合状态机、结算与计分）。

pub mod config;
pub mod deck;
pub mod resolution;
pub mod rules;
pub mod score;
pub mod state;
pub mod token;

pub use config::{GameConfig, GameError, GameMode, Timings};
pub use deck::{build_deck, deal, Card, CardState};
pub use resolution::{
    PairOutcome, PendingResolution, ResolutionStep, ResolutionTicket, ScheduledStep,
};
pub use rules::{IgnoreReason, RuleEngine, Selection};
pub use score::{format_time, GameSummary, RankTier, ScoreTally, ScoringRules, VersusOutcome};
pub use state::{GameEvent, GameState, TurnState};
pub use token::{Token, TokenSet, DEFAULT_TOKEN_IDS};
