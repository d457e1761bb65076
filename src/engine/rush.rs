use crate::rules::RushRule;

/// A timestamp earlier than the previous click counts as a zero gap.
pub(super) fn is_rushed(
    rule: &RushRule,
    last_click_ms: Option<u64>,
    recent_clicks: &[u64],
    now_ms: u64,
) -> bool {
    match *rule {
        RushRule::MinGap { min_gap_ms } => {
            last_click_ms.is_some_and(|last| now_ms.saturating_sub(last) < min_gap_ms)
        }
        RushRule::Window {
            window_ms,
            max_clicks,
        } => {
            let in_window = recent_clicks
                .iter()
                .filter(|at| now_ms.saturating_sub(**at) < window_ms)
                .count();
            in_window + 1 >= max_clicks
        }
    }
}

pub(super) fn record_click(rule: &RushRule, recent_clicks: &mut Vec<u64>, now_ms: u64) {
    match *rule {
        RushRule::MinGap { .. } => recent_clicks.clear(),
        RushRule::Window { window_ms, .. } => {
            recent_clicks.retain(|at| now_ms.saturating_sub(*at) < window_ms);
            recent_clicks.push(now_ms);
        }
    }
}
