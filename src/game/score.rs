use serde::{Deserialize, Serialize};

/// 对战模式计分规则：第 `round` 回合配对成功得 `base - round` 分。
///
/// `floor` 为空时不设下限，回合数超过 `base` 后得分为负。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScoringRules {
    pub base: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
    pub machine_reward: i32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            base: 13,
            floor: None,
            machine_reward: 1,
        }
    }
}

impl ScoringRules {
    pub fn with_floor(mut self, floor: i32) -> Self {
        self.floor = Some(floor);
        self
    }

    pub fn match_reward(&self, round: u32) -> i32 {
        let round = i32::try_from(round).unwrap_or(i32::MAX);
        let reward = self.base.saturating_sub(round);
        match self.floor {
            Some(floor) => reward.max(floor),
            None => reward,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ScoreTally {
    pub player: i32,
    pub machine: i32,
}

/// 单人模式的五档评级。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RankTier {
    Brilliant,
    Sharp,
    Standard,
    NeedsPractice,
    NeedsRest,
}

impl RankTier {
    pub fn for_attempts(attempts: u32) -> Self {
        match attempts {
            0..=28 => RankTier::Brilliant,
            29..=34 => RankTier::Sharp,
            35..=42 => RankTier::Standard,
            43..=50 => RankTier::NeedsPractice,
            _ => RankTier::NeedsRest,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            RankTier::Brilliant => "🧠✨ Mente Incrível!",
            RankTier::Sharp => "🧠 Muito Boa Memória",
            RankTier::Standard => "📚 Memória Padrão",
            RankTier::NeedsPractice => "🤔 Precisa Treinar",
            RankTier::NeedsRest => "🧑‍⚕️😵‍💫 Precisa de um Descanso",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            RankTier::Brilliant => "Você tem uma memória fora do comum!",
            RankTier::Sharp => "Sua memória está afiada!",
            RankTier::Standard => "Nada mal!",
            RankTier::NeedsPractice => "Pode melhorar com prática.",
            RankTier::NeedsRest => "Recomenda-se dar uma pausa e tentar de novo depois.",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VersusOutcome {
    Win,
    Lose,
    Draw,
}

impl VersusOutcome {
    pub fn from_scores(scores: ScoreTally) -> Self {
        match scores.player.cmp(&scores.machine) {
            std::cmp::Ordering::Greater => VersusOutcome::Win,
            std::cmp::Ordering::Less => VersusOutcome::Lose,
            std::cmp::Ordering::Equal => VersusOutcome::Draw,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            VersusOutcome::Win => "🏆 Você venceu!",
            VersusOutcome::Lose => "🤖 A máquina venceu!",
            VersusOutcome::Draw => "🤝 Empate!",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            VersusOutcome::Win => "Sua memória superou a máquina.",
            VersusOutcome::Lose => "Tente de novo e recupere a vantagem.",
            VersusOutcome::Draw => "Ninguém levou a melhor desta vez.",
        }
    }
}

/// 结束面板需要的全部信息。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum GameSummary {
    Single {
        tier: RankTier,
        title: String,
        message: String,
        attempts: u32,
        elapsed_secs: u64,
        elapsed: String,
    },
    Versus {
        outcome: VersusOutcome,
        title: String,
        message: String,
        scores: ScoreTally,
        rounds: u32,
        elapsed_secs: u64,
        elapsed: String,
    },
}

impl GameSummary {
    pub fn single(attempts: u32, elapsed_secs: u64) -> Self {
        let tier = RankTier::for_attempts(attempts);
        GameSummary::Single {
            tier,
            title: tier.title().to_string(),
            message: tier.message().to_string(),
            attempts,
            elapsed_secs,
            elapsed: format_time(elapsed_secs),
        }
    }

    pub fn versus(scores: ScoreTally, rounds: u32, elapsed_secs: u64) -> Self {
        let outcome = VersusOutcome::from_scores(scores);
        GameSummary::Versus {
            outcome,
            title: outcome.title().to_string(),
            message: outcome.message().to_string(),
            scores,
            rounds,
            elapsed_secs,
            elapsed: format_time(elapsed_secs),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            GameSummary::Single { title, .. } | GameSummary::Versus { title, .. } => title,
        }
    }
}

/// `mm:ss`，分钟不截断。
pub fn format_time(total_secs: u64) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}
