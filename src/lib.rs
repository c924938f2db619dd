pub mod ai;
pub mod game;
pub mod session;
pub mod utils;
pub mod view;
pub mod web;

use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;

use gloo_timers::future::TimeoutFuture;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{MachineMove, MachineOpponent};
pub use game::{
    build_deck, deal, format_time, Card, CardState, GameConfig, GameError, GameEvent, GameMode,
    GameState, GameSummary, IgnoreReason, PairOutcome, PendingResolution, RankTier,
    ResolutionStep, ResolutionTicket, RuleEngine, ScheduledStep, ScoreTally, ScoringRules,
    Selection, Timings, Token, TokenSet, TurnState, VersusOutcome,
};
pub use session::{Clock, GameSession, ManualClock};
pub use view::{BufferedPresenter, CardVisual, Presenter, PresenterCall, StatusView};
pub use web::{BrowserClock, JsPresenter};

#[cfg(all(feature = "wee_alloc", target_arch = "wasm32"))]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}

fn to_js_error(error: GameError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn parse_config(config_json: Option<String>) -> Result<GameConfig, JsValue> {
    match config_json {
        Some(json) => GameConfig::from_json(&json).map_err(to_js_error),
        None => Ok(GameConfig::default()),
    }
}

type SharedSession = Rc<RefCell<GameSession<BufferedPresenter>>>;

/// 取出缓存的渲染调用并转发给前端。取出后借用即释放，回调可以重入 `MemoryGame`。
fn flush(session: &SharedSession, target: &JsValue) {
    let calls = session.borrow_mut().presenter_mut().take_calls();
    let mut presenter = JsPresenter::new(target.clone());
    for call in calls {
        call.replay(&mut presenter);
    }
}

/// 按计划等待并逐步结算。每次 `advance` 前重新借用，await 期间不持有借用。
async fn drive_resolution(session: SharedSession, target: JsValue, pending: PendingResolution) -> bool {
    for scheduled in &pending.schedule {
        if scheduled.delay_ms > 0 {
            TimeoutFuture::new(scheduled.delay_ms).await;
        }
        let advanced = session.borrow_mut().advance(&pending.ticket);
        flush(&session, &target);
        if !advanced {
            return false;
        }
    }
    true
}

/// 渲染回调在会话借用释放后才执行，回调里可以再调用本对象的方法。
#[wasm_bindgen]
pub struct MemoryGame {
    session: SharedSession,
    presenter: JsValue,
}

impl MemoryGame {
    fn flush(&self) {
        flush(&self.session, &self.presenter);
    }

    fn resolve_later(&self, pending: Option<PendingResolution>) -> Promise {
        match pending {
            Some(pending) => {
                let session = Rc::clone(&self.session);
                let target = self.presenter.clone();
                future_to_promise(async move {
                    let completed = drive_resolution(session, target, pending).await;
                    Ok(JsValue::from_bool(completed))
                })
            }
            None => Promise::resolve(&JsValue::FALSE),
        }
    }
}

#[wasm_bindgen]
impl MemoryGame {
    /// `presenter` 为实现渲染回调的 JS 对象；`config_json` 缺省时使用单人模式默认配置。
    #[wasm_bindgen(constructor)]
    pub fn new(presenter: JsValue, config_json: Option<String>) -> Result<MemoryGame, JsValue> {
        let config = parse_config(config_json)?;
        crate::console_log!(
            "new {:?} game with {} pairs",
            config.mode,
            config.tokens.len()
        );
        let mut session = GameSession::new(config, BufferedPresenter::default(), Box::new(BrowserClock));
        session.start();
        let game = MemoryGame {
            session: Rc::new(RefCell::new(session)),
            presenter,
        };
        game.flush();
        Ok(game)
    }

    /// 点击第 `index` 张牌。返回的 Promise 在结算完成时为 `true`，
    /// 无需结算或结算被新一局取代时为 `false`。
    pub fn select(&self, index: usize) -> Promise {
        let pending = self.session.borrow_mut().select(index);
        self.flush();
        self.resolve_later(pending)
    }

    pub fn key(&self, index: usize, key: &str) -> Promise {
        let pending = self.session.borrow_mut().key(index, key);
        self.flush();
        self.resolve_later(pending)
    }

    pub fn restart(&self) {
        self.session.borrow_mut().restart();
        self.flush();
    }

    pub fn tick(&self) {
        self.session.borrow_mut().tick();
        self.flush();
    }

    pub fn is_finished(&self) -> bool {
        self.session.borrow().state().is_finished()
    }

    pub fn config_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.session.borrow().config()).map_err(serde_to_js_error)
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.session.borrow().state()).map_err(serde_to_js_error)
    }

    pub fn status_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.borrow().status()).map_err(serde_to_js_error)
    }

    pub fn summary_json(&self) -> Result<Option<String>, JsValue> {
        let session = self.session.borrow();
        session
            .summary()
            .map(|summary| serde_json::to_string(summary).map_err(serde_to_js_error))
            .transpose()
    }
}

#[derive(Serialize)]
struct RankResponse {
    tier: RankTier,
    title: &'static str,
    message: &'static str,
}

#[wasm_bindgen(js_name = "defaultConfigJson")]
pub fn default_config_json() -> Result<String, JsValue> {
    serde_json::to_string(&GameConfig::default()).map_err(serde_to_js_error)
}

/// 按模式名（`single`/`solo`/`ranked`、`versus`/`vs`/`machine`/`competitive`）生成默认配置。
#[wasm_bindgen(js_name = "configForMode")]
pub fn config_for_mode(mode: &str) -> Result<String, JsValue> {
    let mode = GameMode::from_str(mode).map_err(to_js_error)?;
    serde_json::to_string(&GameConfig::default().with_mode(mode)).map_err(serde_to_js_error)
}

/// 生成一副洗好的牌。`tokens` 为空时使用默认宝可梦列表。
#[wasm_bindgen(js_name = "buildDeck")]
pub fn build_deck_js(tokens: JsValue, seed: Option<u32>) -> Result<JsValue, JsValue> {
    let tokens = if tokens.is_undefined() || tokens.is_null() {
        TokenSet::default()
    } else {
        let ids: Vec<Token> = from_value(tokens).map_err(JsValue::from)?;
        TokenSet::new(ids).map_err(to_js_error)?
    };
    let mut rng = match seed {
        Some(seed) => SmallRng::seed_from_u64(u64::from(seed)),
        None => SmallRng::from_entropy(),
    };
    to_value(&build_deck(&tokens, &mut rng)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "rankForAttempts")]
pub fn rank_for_attempts(attempts: u32) -> Result<JsValue, JsValue> {
    let tier = RankTier::for_attempts(attempts);
    let response = RankResponse {
        tier,
        title: tier.title(),
        message: tier.message(),
    };
    to_value(&response).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "formatTime")]
pub fn format_time_js(seconds: u32) -> String {
    format_time(u64::from(seconds))
}

/// 供前端预加载图片。
#[wasm_bindgen(js_name = "tokenImageUrls")]
pub fn token_image_urls(config_json: Option<String>) -> Result<JsValue, JsValue> {
    let config = parse_config(config_json)?;
    to_value(&config.tokens.image_urls()).map_err(JsValue::from)
}
