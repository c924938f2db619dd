use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::token::{Token, TokenSet};

/// 卡牌在桌面上的状态。`Matched` 与 `Removed` 为终态。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardState {
    #[default]
    Hidden,
    Revealed,
    Matched,
    Removed,
}

impl CardState {
    /// 仍在牌局中（未被玩家配对也未被电脑移除）。
    pub fn is_live(self) -> bool {
        matches!(self, CardState::Hidden | CardState::Revealed)
    }
}

/// 牌组中的一个位置。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub index: usize,
    pub token: Token,
    #[serde(default)]
    pub state: CardState,
}

impl Card {
    pub fn new(index: usize, token: Token) -> Self {
        Self {
            index,
            token,
            state: CardState::Hidden,
        }
    }

    pub fn is_selectable(&self) -> bool {
        self.state == CardState::Hidden
    }
}

/// 将 token 列表翻倍后做一次 Fisher–Yates 洗牌。
pub fn build_deck<R: Rng + ?Sized>(tokens: &TokenSet, rng: &mut R) -> Vec<Token> {
    let mut deck: Vec<Token> = tokens.iter().chain(tokens.iter()).cloned().collect();
    deck.shuffle(rng);
    deck
}

pub fn deal<R: Rng + ?Sized>(tokens: &TokenSet, rng: &mut R) -> Vec<Card> {
    build_deck(tokens, rng)
        .into_iter()
        .enumerate()
        .map(|(index, token)| Card::new(index, token))
        .collect()
}
