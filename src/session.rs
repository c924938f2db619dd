//! 一局游戏会话：配置、状态、随机源、时钟与表现层都挂在同一个对象上。

use std::cell::Cell;
use std::rc::Rc;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::game::{
    deal, GameConfig, GameEvent, GameState, GameSummary, PendingResolution, ResolutionTicket,
    RuleEngine, Selection,
};
use crate::view::{present, Presenter, StatusView};

pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// 手动推进的时钟，测试与无浏览器宿主使用。克隆后共享同一时间。
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

pub struct GameSession<P: Presenter> {
    config: GameConfig,
    engine: RuleEngine,
    state: GameState,
    rng: SmallRng,
    clock: Box<dyn Clock>,
    presenter: P,
}

impl<P: Presenter> GameSession<P> {
    pub fn new(config: GameConfig, presenter: P, clock: Box<dyn Clock>) -> Self {
        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let engine = RuleEngine::new(&config);
        let cards = deal(&config.tokens, &mut rng);
        let state = GameState::new(0, config.mode, cards, clock.now_ms());
        Self {
            config,
            engine,
            state,
            rng,
            clock,
            presenter,
        }
    }

    /// 首次渲染牌面与状态栏。
    pub fn start(&mut self) {
        let events = self.state.event_log.clone();
        self.dispatch(&events);
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn summary(&self) -> Option<&GameSummary> {
        self.state.summary.as_ref()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    fn dispatch(&mut self, events: &[GameEvent]) {
        let now = self.clock.now_ms();
        present(&mut self.presenter, events, &self.state, now);
    }

    /// 点击一张牌。返回需要宿主按计划驱动的结算。
    pub fn select(&mut self, index: usize) -> Option<PendingResolution> {
        let selection = self.engine.select(&mut self.state, index);
        self.dispatch(selection.events());
        match selection {
            Selection::Resolving { pending, .. } => Some(pending),
            Selection::Revealed { .. } | Selection::Ignored(_) => None,
        }
    }

    /// 键盘激活：回车或空格等同于点击。
    pub fn key(&mut self, index: usize, key: &str) -> Option<PendingResolution> {
        match key {
            "Enter" | " " => self.select(index),
            _ => None,
        }
    }

    /// 执行一步结算；过期票据返回 `false`。
    pub fn advance(&mut self, ticket: &ResolutionTicket) -> bool {
        let now = self.clock.now_ms();
        match self.engine.advance(&mut self.state, ticket, now) {
            Some(events) => {
                self.dispatch(&events);
                true
            }
            None => false,
        }
    }

    /// 忽略延迟，一次性跑完整个结算计划。
    pub fn resolve_now(&mut self, pending: &PendingResolution) -> bool {
        pending
            .schedule
            .iter()
            .all(|_| self.advance(&pending.ticket))
    }

    /// 重开：新牌组、回合归一、比分清零，旧票据全部失效。
    pub fn restart(&mut self) {
        let epoch = self.state.epoch + 1;
        let cards = deal(&self.config.tokens, &mut self.rng);
        self.state = GameState::new(epoch, self.config.mode, cards, self.clock.now_ms());
        crate::console_log!("game restarted (epoch {epoch})");
        self.start();
    }

    pub fn status(&self) -> StatusView {
        StatusView::from_state(&self.state, self.clock.now_ms())
    }

    /// 计时器刷新。
    pub fn tick(&mut self) {
        if self.state.is_finished() {
            return;
        }
        let status = self.status();
        self.presenter.render_status(&status);
    }
}
