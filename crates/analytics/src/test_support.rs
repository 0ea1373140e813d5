use chrono::{DateTime, Duration, TimeZone, Utc};
use core_types::{Trade, TradeRecord};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

/// A trade logged `day` days after 2024-01-01 12:00 UTC with a fixed 50 risk.
pub fn trade_at(day: i64, instrument: Option<&str>, result: Decimal) -> Trade {
    Trade::from(TradeRecord {
        id: Uuid::new_v4(),
        portfolio_id: Uuid::nil(),
        created_at: epoch() + Duration::days(day),
        trade_date: None,
        instrument: instrument.map(str::to_string),
        timeframe: Some("H1".into()),
        direction: None,
        risk_amount: Some(dec!(50)),
        stop_loss_points: Some(dec!(25)),
        lot_size: Some(dec!(0.2)),
        result: Some(result),
        notes: None,
    })
}

pub fn trades(results: &[Decimal]) -> Vec<Trade> {
    results
        .iter()
        .enumerate()
        .map(|(day, result)| trade_at(day as i64, None, *result))
        .collect()
}
