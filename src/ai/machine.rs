use std::collections::BTreeSet;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::game::{GameState, Token};

/// 电脑在一次失配后拿走的那一对牌。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MachineMove {
    pub token: Token,
    pub indices: [usize; 2],
}

/// 每次玩家失配时，从仍在场上的 token 中等概率随机挑一个。
pub struct MachineOpponent {
    rng: SmallRng,
}

impl MachineOpponent {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// 按 token 而不是按卡牌取样，已配对或已移除的牌不参与。
    pub fn pick(&mut self, state: &GameState) -> Option<MachineMove> {
        let live: Vec<&Token> = state
            .live_cards()
            .map(|card| &card.token)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let token = (*live.choose(&mut self.rng)?).clone();
        let indices = state.live_pair(&token)?;
        Some(MachineMove { token, indices })
    }
}

impl Default for MachineOpponent {
    fn default() -> Self {
        Self::new()
    }
}
