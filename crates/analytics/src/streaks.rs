use core_types::Trade;
use rust_decimal::Decimal;

/// Orders trades oldest first. Equal timestamps fall back to the trade id so
/// the order never depends on how the caller's slice happened to be arranged.
pub fn chronological<'a>(trades: impl IntoIterator<Item = &'a Trade>) -> Vec<&'a Trade> {
    let mut sorted: Vec<&Trade> = trades.into_iter().collect();
    sorted.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    sorted
}

/// Longest runs of consecutive winners and losers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Streaks {
    pub max_winning: usize,
    pub max_losing: usize,
}

/// Scans the trades in chronological order. A breakeven trade ends both runs.
pub fn longest_streaks(trades: &[Trade]) -> Streaks {
    let mut streaks = Streaks::default();
    let mut winning = 0usize;
    let mut losing = 0usize;

    for trade in chronological(trades) {
        if trade.result > Decimal::ZERO {
            winning += 1;
            losing = 0;
            streaks.max_winning = streaks.max_winning.max(winning);
        } else if trade.result < Decimal::ZERO {
            losing += 1;
            winning = 0;
            streaks.max_losing = streaks.max_losing.max(losing);
        } else {
            winning = 0;
            losing = 0;
        }
    }

    streaks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::trade_at;
    use rust_decimal_macros::dec;

    #[test]
    fn mixed_sequence() {
        let trades: Vec<Trade> = [dec!(10), dec!(5), dec!(-3), dec!(-1), dec!(-1), dec!(2)]
            .into_iter()
            .enumerate()
            .map(|(day, result)| trade_at(day as i64, Some("EURUSD"), result))
            .collect();
        let streaks = longest_streaks(&trades);
        assert_eq!(streaks, Streaks { max_winning: 2, max_losing: 3 });
    }

    #[test]
    fn input_order_does_not_matter() {
        let mut trades: Vec<Trade> = [dec!(10), dec!(5), dec!(-3), dec!(-1), dec!(2), dec!(4), dec!(6)]
            .into_iter()
            .enumerate()
            .map(|(day, result)| trade_at(day as i64, None, result))
            .collect();
        let forward = longest_streaks(&trades);
        trades.reverse();
        assert_eq!(longest_streaks(&trades), forward);
        assert_eq!(forward, Streaks { max_winning: 3, max_losing: 2 });
    }

    #[test]
    fn breakeven_resets_both_runs() {
        let trades: Vec<Trade> = [dec!(1), dec!(1), dec!(0), dec!(1), dec!(-1), dec!(0), dec!(-1)]
            .into_iter()
            .enumerate()
            .map(|(day, result)| trade_at(day as i64, None, result))
            .collect();
        assert_eq!(longest_streaks(&trades), Streaks { max_winning: 2, max_losing: 1 });
    }

    #[test]
    fn empty_has_no_streaks() {
        assert_eq!(longest_streaks(&[]), Streaks::default());
    }
}
