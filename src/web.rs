//! 浏览器侧的表现层与时钟：把 `Presenter` 调用转发给前端传入的 JS 对象。

use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::js_sys::{Date, Function, Reflect};

use crate::game::{Card, GameSummary};
use crate::session::Clock;
use crate::view::{CardVisual, Presenter, StatusView};

/// `Date.now()`。
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserClock;

impl Clock for BrowserClock {
    fn now_ms(&self) -> u64 {
        Date::now() as u64
    }
}

/// 前端对象需要实现 `renderCards`、`setCardVisual`、`renderStatus`、
/// `renderSummary`、`notify`；缺失的方法只记警告。
pub struct JsPresenter {
    target: JsValue,
}

impl JsPresenter {
    pub fn new(target: JsValue) -> Self {
        Self { target }
    }

    fn method(&self, name: &str) -> Option<Function> {
        let value = Reflect::get(&self.target, &JsValue::from_str(name)).ok()?;
        match value.dyn_into::<Function>() {
            Ok(function) => Some(function),
            Err(_) => {
                crate::console_warn!("presenter has no `{name}` method");
                None
            }
        }
    }

    fn call1(&self, name: &str, arg: &JsValue) {
        if let Some(function) = self.method(name) {
            if let Err(error) = function.call1(&self.target, arg) {
                crate::console_warn!("presenter `{name}` threw: {error:?}");
            }
        }
    }

    fn call2(&self, name: &str, first: &JsValue, second: &JsValue) {
        if let Some(function) = self.method(name) {
            if let Err(error) = function.call2(&self.target, first, second) {
                crate::console_warn!("presenter `{name}` threw: {error:?}");
            }
        }
    }

    fn call_serialized<T: Serialize + ?Sized>(&self, name: &str, value: &T) {
        match serde_wasm_bindgen::to_value(value) {
            Ok(arg) => self.call1(name, &arg),
            Err(error) => crate::console_warn!("could not serialize `{name}` argument: {error}"),
        }
    }
}

impl Presenter for JsPresenter {
    fn render_cards(&mut self, cards: &[Card]) {
        self.call_serialized("renderCards", cards);
    }

    fn set_card_visual(&mut self, index: usize, visual: CardVisual) {
        self.call2(
            "setCardVisual",
            &JsValue::from_f64(index as f64),
            &JsValue::from_str(visual.as_str()),
        );
    }

    fn render_status(&mut self, status: &StatusView) {
        self.call_serialized("renderStatus", status);
    }

    fn render_summary(&mut self, summary: &GameSummary) {
        self.call_serialized("renderSummary", summary);
    }

    fn notify(&mut self, message: &str) {
        self.call1("notify", &JsValue::from_str(message));
    }
}
