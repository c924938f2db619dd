use std::collections::HashSet;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::config::GameError;

const IMAGE_URL_PREFIX: &str =
    "https://www.pokemon.com/static-assets/content-assets/cms2/img/pokedex/full/";

/// 默认卡组使用的宝可梦图鉴编号。
pub const DEFAULT_TOKEN_IDS: [&str; 12] = [
    "004", "007", "001", "025", "039", "052", "066", "092", "133", "147", "152", "155",
];

static DEFAULT_TOKENS: Lazy<TokenSet> = Lazy::new(|| TokenSet {
    tokens: DEFAULT_TOKEN_IDS.iter().map(|id| Token::new(*id)).collect(),
});

/// 配对的最小单位，每个 token 在牌组中恰好出现两次。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn image_url(&self) -> String {
        format!("{IMAGE_URL_PREFIX}{}.png", self.0)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Token::new(value)
    }
}

/// 经过校验的 token 集合：非空且无重复。
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct TokenSet {
    tokens: Vec<Token>,
}

impl TokenSet {
    pub fn new(tokens: Vec<Token>) -> Result<Self, GameError> {
        if tokens.is_empty() {
            return Err(GameError::EmptyTokenSet);
        }
        let mut seen = HashSet::new();
        for token in &tokens {
            if !seen.insert(token) {
                return Err(GameError::DuplicateToken {
                    token: token.to_string(),
                });
            }
        }
        Ok(Self { tokens })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter()
    }

    pub fn image_urls(&self) -> Vec<String> {
        self.tokens.iter().map(Token::image_url).collect()
    }
}

impl Default for TokenSet {
    fn default() -> Self {
        DEFAULT_TOKENS.clone()
    }
}

impl<'de> Deserialize<'de> for TokenSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let tokens = Vec::<Token>::deserialize(deserializer)?;
        TokenSet::new(tokens).map_err(serde::de::Error::custom)
    }
}
