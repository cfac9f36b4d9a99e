//! Fixed decision table for fixed-form readings.
//!
//! Four guards, checked in order, first match wins:
//!
//! | # | RSI       | MACD pos | Signal  | Histogram | Bollinger                    | Divergence                      | Result                       |
//! |---|-----------|----------|---------|-----------|------------------------------|---------------------------------|------------------------------|
//! | 1 | < 40      | < 3      | a–d     | ( / ;     | überverkauft                 | leicht bullisch … stark bullisch | Kaufen                       |
//! | 2 | 40 – 45   | = 3      | a–d     | ( / ;     | (leicht) überverkauft        | leicht bullisch                 | Kauf in Erwägung ziehen      |
//! | 3 | 65 – 70   | = 6      | g–j     | $ §       | (leicht) überkauft           | leicht bärisch                  | Verkauf in Erwägung ziehen   |
//! | 4 | > 70      | > 6      | g–j     | $ §       | überkauft                    | leicht bärisch … stark bärisch   | Verkaufen                    |
//!
//! Anything else is "Keine Handlung". Unrecognised codes fail every guard.

use std::fmt;

use crate::domain::legend::{
    BollingerState, DivergenceState, HistogramCode, SignalCode,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recommendation {
    Buy,
    ConsiderBuy,
    ConsiderSell,
    Sell,
    NoAction,
}

impl Recommendation {
    pub fn label(self) -> &'static str {
        match self {
            Recommendation::Buy => "Kaufen",
            Recommendation::ConsiderBuy => "Kauf in Erwägung ziehen",
            Recommendation::ConsiderSell => "Verkauf in Erwägung ziehen",
            Recommendation::Sell => "Verkaufen",
            Recommendation::NoAction => "Keine Handlung",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The six inputs of the decision table.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorReading {
    pub rsi: f64,
    pub macd_position: f64,
    pub signal: Option<SignalCode>,
    pub histogram: Option<HistogramCode>,
    pub bollinger: Option<BollingerState>,
    pub divergence: Option<DivergenceState>,
}

impl IndicatorReading {
    /// Builds a reading from raw codes. Unknown codes become `None`.
    pub fn from_codes(
        rsi: f64,
        macd_position: f64,
        signal: &str,
        histogram: &str,
        bollinger: &str,
        divergence: &str,
    ) -> Self {
        Self {
            rsi,
            macd_position,
            signal: SignalCode::from_code(signal),
            histogram: HistogramCode::from_code(histogram),
            bollinger: BollingerState::from_label(bollinger),
            divergence: DivergenceState::from_label(divergence),
        }
    }
}

fn bullish_signal(s: Option<SignalCode>) -> bool {
    use SignalCode::*;
    matches!(s, Some(A | B | C | D))
}

fn bearish_signal(s: Option<SignalCode>) -> bool {
    use SignalCode::*;
    matches!(s, Some(G | H | I | J))
}

fn falling_negative_histogram(h: Option<HistogramCode>) -> bool {
    use HistogramCode::*;
    matches!(
        h,
        Some(StrongFallNegative | SlightFallNegative | SlightFallNearZero)
    )
}

fn falling_positive_histogram(h: Option<HistogramCode>) -> bool {
    use HistogramCode::*;
    matches!(h, Some(StrongFallPositive | SlightFallPositive))
}

pub fn classify(r: &IndicatorReading) -> Recommendation {
    use BollingerState as B;
    use DivergenceState as D;

    if r.rsi < 40.0
        && r.macd_position < 3.0
        && bullish_signal(r.signal)
        && falling_negative_histogram(r.histogram)
        && r.bollinger == Some(B::Oversold)
        && matches!(
            r.divergence,
            Some(D::SlightlyBullish | D::Bullish | D::StronglyBullish)
        )
    {
        return Recommendation::Buy;
    }

    if (40.0..=45.0).contains(&r.rsi)
        && r.macd_position == 3.0
        && bullish_signal(r.signal)
        && falling_negative_histogram(r.histogram)
        && matches!(r.bollinger, Some(B::Oversold | B::SlightlyOversold))
        && r.divergence == Some(D::SlightlyBullish)
    {
        return Recommendation::ConsiderBuy;
    }

    if (65.0..=70.0).contains(&r.rsi)
        && r.macd_position == 6.0
        && bearish_signal(r.signal)
        && falling_positive_histogram(r.histogram)
        && matches!(r.bollinger, Some(B::SlightlyOverbought | B::Overbought))
        && r.divergence == Some(D::SlightlyBearish)
    {
        return Recommendation::ConsiderSell;
    }

    if r.rsi > 70.0
        && r.macd_position > 6.0
        && bearish_signal(r.signal)
        && falling_positive_histogram(r.histogram)
        && r.bollinger == Some(B::Overbought)
        && matches!(
            r.divergence,
            Some(D::SlightlyBearish | D::Bearish | D::StronglyBearish)
        )
    {
        return Recommendation::Sell;
    }

    Recommendation::NoAction
}
