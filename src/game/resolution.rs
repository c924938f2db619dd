//! 翻牌结算的调度描述。
//!
//! 结算不再依赖 setTimeout 链，而是返回一份 `(延迟, 步骤)` 计划。宿主按延迟
//! 依次调用 `RuleEngine::advance`，并带上票据 `(epoch, round)`；重开游戏或回合
//! 推进之后，旧票据会被直接忽略。

use serde::{Deserialize, Serialize};

use super::config::{GameMode, Timings};

/// 标识一次结算属于哪一局、哪一回合。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ResolutionTicket {
    pub epoch: u64,
    pub round: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PairOutcome {
    Match,
    Mismatch,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStep {
    /// 失配时的抖动提示。
    Shake,
    /// 对战模式下先把两张牌翻回去，再轮到电脑。
    Hide,
    /// 电脑随机挑一个仍在场上的 token 并亮出两张。
    MachineReveal,
    /// 提交结果、推进回合并检查终局。
    Finish,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduledStep {
    pub delay_ms: u32,
    pub step: ResolutionStep,
}

impl ScheduledStep {
    const fn new(delay_ms: u32, step: ResolutionStep) -> Self {
        Self { delay_ms, step }
    }
}

/// 交给宿主驱动的结算计划。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingResolution {
    pub ticket: ResolutionTicket,
    pub first: usize,
    pub second: usize,
    pub outcome: PairOutcome,
    pub schedule: Vec<ScheduledStep>,
}

pub fn schedule_for(mode: GameMode, outcome: PairOutcome, timings: &Timings) -> Vec<ScheduledStep> {
    use ResolutionStep::*;

    match (outcome, mode) {
        (PairOutcome::Match, _) => vec![ScheduledStep::new(timings.pair_delay_ms, Finish)],
        (PairOutcome::Mismatch, GameMode::Single) => vec![
            ScheduledStep::new(timings.mismatch_delay_ms, Shake),
            ScheduledStep::new(timings.shake_ms, Finish),
        ],
        (PairOutcome::Mismatch, GameMode::Versus) => vec![
            ScheduledStep::new(timings.mismatch_delay_ms, Shake),
            ScheduledStep::new(timings.shake_ms, Hide),
            ScheduledStep::new(timings.machine_step_ms, MachineReveal),
            ScheduledStep::new(timings.machine_step_ms, Finish),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_schedule_ends_with_finish() {
        let timings = Timings::default();
        for mode in [GameMode::Single, GameMode::Versus] {
            for outcome in [PairOutcome::Match, PairOutcome::Mismatch] {
                let schedule = schedule_for(mode, outcome, &timings);
                assert_eq!(
                    schedule.last().map(|scheduled| scheduled.step),
                    Some(ResolutionStep::Finish)
                );
                let finishes = schedule
                    .iter()
                    .filter(|scheduled| scheduled.step == ResolutionStep::Finish)
                    .count();
                assert_eq!(finishes, 1);
            }
        }
    }

    #[test]
    fn single_mismatch_shakes_then_hides_after_delays() {
        let schedule = schedule_for(GameMode::Single, PairOutcome::Mismatch, &Timings::default());
        assert_eq!(
            schedule,
            vec![
                ScheduledStep::new(800, ResolutionStep::Shake),
                ScheduledStep::new(300, ResolutionStep::Finish),
            ]
        );
    }

    #[test]
    fn versus_mismatch_includes_machine_turn() {
        let schedule = schedule_for(GameMode::Versus, PairOutcome::Mismatch, &Timings::default());
        let steps: Vec<_> = schedule.iter().map(|scheduled| scheduled.step).collect();
        assert_eq!(
            steps,
            vec![
                ResolutionStep::Shake,
                ResolutionStep::Hide,
                ResolutionStep::MachineReveal,
                ResolutionStep::Finish,
            ]
        );
    }
}
