//! Technical indicators over daily bars

use crate::error::{Result, TradingError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use ta::{
    DataItem, Next,
    indicators::{
        AverageTrueRange, BollingerBands, ExponentialMovingAverage, RelativeStrengthIndex,
        SimpleMovingAverage,
    },
};

/// Fewest bars that give a meaningful RSI 14
pub const MIN_BARS: usize = 15;

/// One daily price bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Latest value of each indicator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub date: NaiveDate,
    pub close: f64,
    pub rsi_14: f64,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub ema_12: f64,
    pub ema_26: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub bollinger_upper: Option<f64>,
    pub bollinger_middle: Option<f64>,
    pub bollinger_lower: Option<f64>,
    pub atr_14: f64,
}

fn indicator_error(e: impl std::fmt::Display) -> TradingError {
    TradingError::IndicatorError(e.to_string())
}

/// Compute the indicator set over `bars`, oldest first
pub fn compute_indicators(bars: &[Bar]) -> Result<IndicatorSnapshot> {
    let Some(last) = bars.last() else {
        return Err(TradingError::IndicatorError("no price history".to_string()));
    };
    if bars.len() < MIN_BARS {
        return Err(TradingError::IndicatorError(format!(
            "need at least {MIN_BARS} bars, got {}",
            bars.len()
        )));
    }

    let mut rsi = RelativeStrengthIndex::new(14).map_err(indicator_error)?;
    let mut sma_20 = SimpleMovingAverage::new(20).map_err(indicator_error)?;
    let mut sma_50 = SimpleMovingAverage::new(50).map_err(indicator_error)?;
    let mut ema_12 = ExponentialMovingAverage::new(12).map_err(indicator_error)?;
    let mut ema_26 = ExponentialMovingAverage::new(26).map_err(indicator_error)?;
    let mut macd_signal = ExponentialMovingAverage::new(9).map_err(indicator_error)?;
    let mut bollinger = BollingerBands::new(20, 2.0).map_err(indicator_error)?;
    let mut atr = AverageTrueRange::new(14).map_err(indicator_error)?;

    let mut snapshot = IndicatorSnapshot {
        date: last.date,
        close: last.close,
        rsi_14: 0.0,
        sma_20: None,
        sma_50: None,
        ema_12: 0.0,
        ema_26: 0.0,
        macd: 0.0,
        macd_signal: 0.0,
        macd_histogram: 0.0,
        bollinger_upper: None,
        bollinger_middle: None,
        bollinger_lower: None,
        atr_14: 0.0,
    };

    for (seen, bar) in bars.iter().enumerate().map(|(i, b)| (i + 1, b)) {
        let item = DataItem::builder()
            .open(bar.open)
            .high(bar.high)
            .low(bar.low)
            .close(bar.close)
            .volume(bar.volume as f64)
            .build()
            .map_err(|e| TradingError::IndicatorError(format!("bad bar on {}: {e}", bar.date)))?;

        snapshot.rsi_14 = rsi.next(bar.close);
        let sma20 = sma_20.next(bar.close);
        let sma50 = sma_50.next(bar.close);
        snapshot.ema_12 = ema_12.next(bar.close);
        snapshot.ema_26 = ema_26.next(bar.close);
        snapshot.macd = snapshot.ema_12 - snapshot.ema_26;
        snapshot.macd_signal = macd_signal.next(snapshot.macd);
        let bands = bollinger.next(bar.close);
        snapshot.atr_14 = atr.next(&item);

        if seen >= 20 {
            snapshot.sma_20 = Some(sma20);
            snapshot.bollinger_upper = Some(bands.upper);
            snapshot.bollinger_middle = Some(bands.average);
            snapshot.bollinger_lower = Some(bands.lower);
        }
        if seen >= 50 {
            snapshot.sma_50 = Some(sma50);
        }
    }
    snapshot.macd_histogram = snapshot.macd - snapshot.macd_signal;

    Ok(snapshot)
}

impl IndicatorSnapshot {
    /// Render for a prompt
    pub fn render(&self) -> String {
        let mut out = format!("As of {} (close {:.2})\n", self.date, self.close);
        let _ = writeln!(out, "RSI(14): {:.2}", self.rsi_14);
        let _ = writeln!(out, "SMA(20): {}", optional(self.sma_20));
        let _ = writeln!(out, "SMA(50): {}", optional(self.sma_50));
        let _ = writeln!(out, "EMA(12): {:.2}", self.ema_12);
        let _ = writeln!(out, "EMA(26): {:.2}", self.ema_26);
        let _ = writeln!(
            out,
            "MACD(12,26,9): {:.3} signal {:.3} histogram {:.3}",
            self.macd, self.macd_signal, self.macd_histogram
        );
        let _ = writeln!(
            out,
            "Bollinger(20,2): upper {} middle {} lower {}",
            optional(self.bollinger_upper),
            optional(self.bollinger_middle),
            optional(self.bollinger_lower)
        );
        let _ = write!(out, "ATR(14): {:.3}", self.atr_14);
        out
    }
}

fn optional(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

#[cfg(test)]
pub(crate) fn synthetic_bars(count: usize) -> Vec<Bar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..count)
        .map(|i| {
            let close = 100.0 + i as f64 * 0.5 + if i % 3 == 0 { 1.0 } else { -0.5 };
            Bar {
                date: start + chrono::Days::new(i as u64),
                open: close - 0.3,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000_000 + i as u64 * 1_000,
            }
        })
        .collect()
}
