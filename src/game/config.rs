use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::score::ScoringRules;
use super::token::{Token, TokenSet};

/// 游戏模式。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// 单人计时、按尝试次数评级。
    #[default]
    #[serde(alias = "solo", alias = "ranked")]
    Single,
    /// 玩家对战电脑。
    #[serde(alias = "vs", alias = "machine", alias = "competitive")]
    Versus,
}

impl FromStr for GameMode {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" | "solo" | "ranked" => Ok(GameMode::Single),
            "versus" | "vs" | "machine" | "competitive" => Ok(GameMode::Versus),
            _ => Err(GameError::UnknownMode { mode: s.to_string() }),
        }
    }
}

/// 结算动画节奏（毫秒）。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Timings {
    pub pair_delay_ms: u32,
    pub mismatch_delay_ms: u32,
    pub shake_ms: u32,
    pub machine_step_ms: u32,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            pair_delay_ms: 1000,
            mismatch_delay_ms: 800,
            shake_ms: 300,
            machine_step_ms: 700,
        }
    }
}

impl Timings {
    /// 测试与无动画宿主使用的零延迟节奏。
    pub fn instant() -> Self {
        Self {
            pair_delay_ms: 0,
            mismatch_delay_ms: 0,
            shake_ms: 0,
            machine_step_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct GameConfig {
    pub mode: GameMode,
    pub tokens: TokenSet,
    pub timings: Timings,
    pub scoring: ScoringRules,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl GameConfig {
    pub fn from_mode(mode: GameMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, GameError> {
        serde_json::from_str(json).map_err(|error| GameError::InvalidConfig {
            message: error.to_string(),
        })
    }

    pub fn with_mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_tokens<I, T>(mut self, tokens: I) -> Result<Self, GameError>
    where
        I: IntoIterator<Item = T>,
        T: Into<Token>,
    {
        self.tokens = TokenSet::new(tokens.into_iter().map(Into::into).collect())?;
        Ok(self)
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

}

/// 构造阶段的错误。游戏中的无效点击不会产生错误，只会被忽略。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameError {
    EmptyTokenSet,
    DuplicateToken { token: String },
    UnknownMode { mode: String },
    InvalidConfig { message: String },
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::EmptyTokenSet => f.write_str("token set must not be empty"),
            GameError::DuplicateToken { token } => write!(f, "token {token} appears more than once"),
            GameError::UnknownMode { mode } => write!(f, "unknown game mode `{mode}`"),
            GameError::InvalidConfig { message } => write!(f, "invalid game config: {message}"),
        }
    }
}

impl std::error::Error for GameError {}
