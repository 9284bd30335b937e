//! # analytics — Trade Aggregation
//!
//! Pure, single-pass statistics over a trade list that has **already** been
//! scoped (owner + account) and filtered (session, outcome, date range) by
//! the store.  No I/O, no shared state: the same input always yields the
//! same [`TradeSummary`].
//!
//! ```text
//! store.find_trades(query) ──▶ Vec<Trade> ──▶ summarize() ──▶ TradeSummary
//!                                                              ├─ totals / win rate
//!                                                              ├─ largest win / loss
//!                                                              ├─ average win / loss
//!                                                              └─ per-session tallies
//! ```
//!
//! Every ratio with a zero denominator is `0.0`, never `NaN`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{session::UNASSIGNED_SESSION, Outcome, Trade};

// ─── Average Method ───────────────────────────────────────────────────────────

/// How `average_win` / `average_loss` are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AverageMethod {
    /// Arithmetic mean of all winning (resp. losing) profit amounts.
    #[default]
    Mean,
    /// `largest_win / max(wins, 1)` and `|largest_loss| / max(losses, 1)`.
    /// Not a real average; available so figures match older journal exports.
    Largest,
}

impl AverageMethod {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "mean"    => Some(AverageMethod::Mean),
            "largest" => Some(AverageMethod::Largest),
            _         => None,
        }
    }
}

// ─── Output ───────────────────────────────────────────────────────────────────

/// Per-session accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SessionTally {
    pub total_pl: f64,
    pub count:    usize,
    pub wins:     usize,
    pub losses:   usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TradeSummary {
    pub total_trades:    usize,
    pub winning_trades:  usize,
    pub losing_trades:   usize,
    /// Percentage in `[0, 100]`.
    pub win_rate:        f64,
    pub total_profit:    f64,
    pub average_profit:  f64,
    /// Highest profit among winners, `0.0` when there are none.
    pub largest_win:     f64,
    /// Lowest (most negative) profit among losers, `0.0` when there are none.
    pub largest_loss:    f64,
    pub average_win:     f64,
    /// Reported as a positive magnitude.
    pub average_loss:    f64,
    /// Keyed by session name; trades without one land under `"Other"`.
    pub session_summary: BTreeMap<String, SessionTally>,
}

// ─── Aggregation ──────────────────────────────────────────────────────────────

/// `method` only affects `average_win` / `average_loss`.
pub fn summarize(trades: &[Trade], method: AverageMethod) -> TradeSummary {
    let mut summary = TradeSummary::default();
    let mut win_sum  = 0.0_f64;
    let mut loss_sum = 0.0_f64;

    for trade in trades {
        let pl = trade.profit_amount;
        let outcome = trade.outcome();

        summary.total_trades += 1;
        summary.total_profit += pl;

        match outcome {
            Some(Outcome::Wins) => {
                summary.winning_trades += 1;
                win_sum += pl;
                if summary.winning_trades == 1 || pl > summary.largest_win {
                    summary.largest_win = pl;
                }
            }
            Some(Outcome::Losses) => {
                summary.losing_trades += 1;
                loss_sum += pl;
                if summary.losing_trades == 1 || pl < summary.largest_loss {
                    summary.largest_loss = pl;
                }
            }
            None => {}
        }

        let key = trade.session.as_deref().unwrap_or(UNASSIGNED_SESSION);
        let tally = summary.session_summary.entry(key.to_string()).or_default();
        tally.total_pl += pl;
        tally.count += 1;
        match outcome {
            Some(Outcome::Wins)   => tally.wins += 1,
            Some(Outcome::Losses) => tally.losses += 1,
            None                  => {}
        }
    }

    let total = summary.total_trades;
    summary.win_rate       = ratio(summary.winning_trades as f64 * 100.0, total);
    summary.average_profit = ratio(summary.total_profit, total);

    (summary.average_win, summary.average_loss) = match method {
        AverageMethod::Mean => (
            ratio(win_sum, summary.winning_trades),
            ratio(loss_sum, summary.losing_trades).abs(),
        ),
        AverageMethod::Largest => (
            summary.largest_win / summary.winning_trades.max(1) as f64,
            summary.largest_loss.abs() / summary.losing_trades.max(1) as f64,
        ),
    };

    summary
}

#[inline]
fn ratio(numerator: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { numerator / count as f64 }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use crate::models::trade::Position;

    fn trade(profit_amount: f64, session: Option<&str>) -> Trade {
        Trade {
            id:            Uuid::new_v4(),
            account_id:    Uuid::nil(),
            owner:         "trader@example.com".into(),
            market:        "Forex".into(),
            pair:          "EURUSD".into(),
            position:      Position::Buy,
            entry:         1.0,
            exit:          1.0,
            profit_amount,
            risk_reward:   "1:2".into(),
            date:          NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
            hour:          9,
            minute:        0,
            strategy:      String::new(),
            image_url:     None,
            notes:         String::new(),
            session:       session.map(str::to_string),
            session_color: None,
            created_at:    Utc::now(),
        }
    }

    fn summary_of(trades: &[Trade]) -> TradeSummary {
        summarize(trades, AverageMethod::Mean)
    }

    fn amounts(pls: &[f64]) -> Vec<Trade> {
        pls.iter().map(|&pl| trade(pl, Some("London"))).collect()
    }

    #[test]
    fn test_mixed_outcomes() {
        let s = summary_of(&amounts(&[100.0, -50.0, 25.0]));
        assert_eq!(s.total_trades, 3);
        assert_eq!(s.winning_trades, 2);
        assert_eq!(s.losing_trades, 1);
        assert_eq!((s.win_rate * 10.0).round() / 10.0, 66.7);
        assert_eq!(s.total_profit, 75.0);
        assert_eq!(s.average_profit, 25.0);
        assert_eq!(s.largest_win, 100.0);
        assert_eq!(s.largest_loss, -50.0);
    }

    #[test]
    fn test_empty_is_all_zero() {
        let s = summary_of(&[]);
        assert_eq!(s, TradeSummary::default());
        assert_eq!(s.win_rate, 0.0);
        assert!(!s.average_profit.is_nan());
        assert!(s.session_summary.is_empty());
    }

    #[test]
    fn test_break_even_is_neither_win_nor_loss() {
        let s = summary_of(&amounts(&[0.0, 0.0, 10.0]));
        assert_eq!(s.total_trades, 3);
        assert_eq!(s.winning_trades, 1);
        assert_eq!(s.losing_trades, 0);
        assert!(s.winning_trades + s.losing_trades <= s.total_trades);
        assert_eq!(s.largest_loss, 0.0);
        assert_eq!(s.session_summary["London"].wins, 1);
        assert_eq!(s.session_summary["London"].losses, 0);
        assert_eq!(s.session_summary["London"].count, 3);
    }

    #[test]
    fn test_only_losses() {
        let s = summary_of(&amounts(&[-5.0, -20.0]));
        assert_eq!(s.win_rate, 0.0);
        assert_eq!(s.largest_win, 0.0);
        assert_eq!(s.largest_loss, -20.0);
        assert_eq!(s.average_win, 0.0);
        assert_eq!(s.average_loss, 12.5);
    }

    #[test]
    fn test_only_wins_rate_is_hundred() {
        let s = summary_of(&amounts(&[1.0, 2.0, 3.0]));
        assert_eq!(s.win_rate, 100.0);
        assert_eq!(s.largest_win, 3.0);
    }

    #[test]
    fn test_session_tally() {
        let trades = vec![trade(30.0, Some("London")), trade(-10.0, Some("London"))];
        let s = summary_of(&trades);
        assert_eq!(
            s.session_summary["London"],
            SessionTally { total_pl: 20.0, count: 2, wins: 1, losses: 1 }
        );
    }

    #[test]
    fn test_missing_session_goes_to_other() {
        let trades = vec![
            trade(5.0, None),
            trade(-2.0, Some("Asia")),
            trade(1.0, None),
        ];
        let s = summary_of(&trades);
        assert_eq!(s.session_summary.len(), 2);
        assert_eq!(s.session_summary["Other"].count, 2);
        assert_eq!(s.session_summary["Other"].total_pl, 6.0);
        assert_eq!(s.session_summary["Asia"].losses, 1);
    }

    #[test]
    fn test_order_independent_and_idempotent() {
        let mut trades = amounts(&[12.5, -3.25, 7.0, -0.5, 40.0]);
        let first = summary_of(&trades);
        assert_eq!(first, summary_of(&trades));

        trades.reverse();
        let reversed = summary_of(&trades);
        assert_eq!(first.total_profit, reversed.total_profit);
        assert_eq!(first.largest_win, reversed.largest_win);
        assert_eq!(first.largest_loss, reversed.largest_loss);
        assert_eq!(first.session_summary, reversed.session_summary);
    }

    #[test]
    fn test_mean_vs_largest_averages() {
        let trades = amounts(&[100.0, 20.0, -30.0, -10.0]);

        let mean = summarize(&trades, AverageMethod::Mean);
        assert_eq!(mean.average_win, 60.0);
        assert_eq!(mean.average_loss, 20.0);

        let largest = summarize(&trades, AverageMethod::Largest);
        assert_eq!(largest.average_win, 50.0);   // 100 / 2
        assert_eq!(largest.average_loss, 15.0);  // |-30| / 2
    }

    #[test]
    fn test_largest_method_with_no_trades_divides_by_one() {
        let s = summarize(&[], AverageMethod::Largest);
        assert_eq!(s.average_win, 0.0);
        assert_eq!(s.average_loss, 0.0);
    }

    #[test]
    fn test_win_rate_bounds() {
        for pls in [vec![], vec![-1.0], vec![1.0], vec![1.0, -1.0, 0.0]] {
            let s = summary_of(&amounts(&pls));
            assert!((0.0..=100.0).contains(&s.win_rate));
        }
    }

    #[test]
    fn test_average_method_parse() {
        assert_eq!(AverageMethod::parse("Mean"), Some(AverageMethod::Mean));
        assert_eq!(AverageMethod::parse(" largest "), Some(AverageMethod::Largest));
        assert_eq!(AverageMethod::parse("median"), None);
    }
}
