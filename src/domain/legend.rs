//! Code legends for the fixed-form indicator readings.
//!
//! Each discrete indicator state is entered as a short code. The legends map
//! every code to the German description shown to the analyst.

/// MACD line distance from zero, strongest positive first.
pub const MACD_POSITIONS: [(u8, &str); 8] = [
    (8, "Sehr weit über 0"),
    (7, "Weit über 0"),
    (6, "Leicht über 0"),
    (5, "Knapp über 0"),
    (4, "Knapp unter 0"),
    (3, "Leicht unter 0"),
    (2, "Weit unter 0"),
    (1, "Sehr weit unter 0"),
];

/// MACD line relative to its signal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalCode {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
}

impl SignalCode {
    pub const ALL: [SignalCode; 10] = [
        SignalCode::A,
        SignalCode::B,
        SignalCode::C,
        SignalCode::D,
        SignalCode::E,
        SignalCode::F,
        SignalCode::G,
        SignalCode::H,
        SignalCode::I,
        SignalCode::J,
    ];

    pub fn code(self) -> char {
        match self {
            SignalCode::A => 'a',
            SignalCode::B => 'b',
            SignalCode::C => 'c',
            SignalCode::D => 'd',
            SignalCode::E => 'e',
            SignalCode::F => 'f',
            SignalCode::G => 'g',
            SignalCode::H => 'h',
            SignalCode::I => 'i',
            SignalCode::J => 'j',
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SignalCode::A => "Bullisch gekreuzt",
            SignalCode::B => "Knapp bullisch gekreuzt",
            SignalCode::C => "Unmittelbar vor bullischer Kreuzung",
            SignalCode::D => "Kurz vor bullischer Kreuzung",
            SignalCode::E => "Parallel, Abstand weit",
            SignalCode::F => "Parallel, Abstand moderat",
            SignalCode::G => "Kurz vor bärischer Kreuzung",
            SignalCode::H => "Unmittelbar vor bärischer Kreuzung",
            SignalCode::I => "Knapp bärisch gekreuzt",
            SignalCode::J => "Bärisch gekreuzt",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let mut chars = code.trim().chars();
        let ch = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        Self::ALL.into_iter().find(|s| s.code() == ch)
    }
}

/// MACD histogram trend and sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistogramCode {
    StrongRisePositive,
    SlightRisePositive,
    SlightFallPositive,
    StrongFallPositive,
    StrongRiseNegative,
    SlightRiseNegative,
    SlightFallNegative,
    StrongFallNegative,
    StrongRiseNearZero,
    SlightRiseNearZero,
    SlightFallNearZero,
    StrongFallNearZero,
}

impl HistogramCode {
    pub const ALL: [HistogramCode; 12] = [
        HistogramCode::StrongRisePositive,
        HistogramCode::SlightRisePositive,
        HistogramCode::SlightFallPositive,
        HistogramCode::StrongFallPositive,
        HistogramCode::StrongRiseNegative,
        HistogramCode::SlightRiseNegative,
        HistogramCode::SlightFallNegative,
        HistogramCode::StrongFallNegative,
        HistogramCode::StrongRiseNearZero,
        HistogramCode::SlightRiseNearZero,
        HistogramCode::SlightFallNearZero,
        HistogramCode::StrongFallNearZero,
    ];

    pub fn code(self) -> &'static str {
        match self {
            HistogramCode::StrongRisePositive => "!",
            HistogramCode::SlightRisePositive => "„",
            HistogramCode::SlightFallPositive => "§",
            HistogramCode::StrongFallPositive => "$",
            HistogramCode::StrongRiseNegative => "%",
            HistogramCode::SlightRiseNegative => "&",
            HistogramCode::SlightFallNegative => "/",
            HistogramCode::StrongFallNegative => "(",
            HistogramCode::StrongRiseNearZero => ")",
            HistogramCode::SlightRiseNearZero => "?",
            HistogramCode::SlightFallNearZero => ";",
            HistogramCode::StrongFallNearZero => "#",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            HistogramCode::StrongRisePositive => "Stark steigend, positiv",
            HistogramCode::SlightRisePositive => "Leicht steigend, positiv",
            HistogramCode::SlightFallPositive => "Leicht sinkend, positiv",
            HistogramCode::StrongFallPositive => "Stark sinkend, positiv",
            HistogramCode::StrongRiseNegative => "Stark steigend, negativ",
            HistogramCode::SlightRiseNegative => "Leicht steigend, negativ",
            HistogramCode::SlightFallNegative => "Leicht sinkend, negativ",
            HistogramCode::StrongFallNegative => "Stark sinkend, negativ",
            HistogramCode::StrongRiseNearZero => "Stark steigend, fast bei 0",
            HistogramCode::SlightRiseNearZero => "Leicht steigend, fast bei 0",
            HistogramCode::SlightFallNearZero => "Leicht sinkend, fast bei 0",
            HistogramCode::StrongFallNearZero => "Stark sinkend, fast bei 0",
        }
    }

    /// Looks up a code after [`normalize_histogram_code`].
    pub fn from_code(code: &str) -> Option<Self> {
        let code = normalize_histogram_code(code);
        Self::ALL.into_iter().find(|h| h.code() == code)
    }
}

/// Trims the code and maps a plain `"` to the typographic `„` it stands for.
pub fn normalize_histogram_code(code: &str) -> String {
    let code = code.trim();
    if code == "\"" {
        "„".to_string()
    } else {
        code.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BollingerState {
    Oversold,
    SlightlyOversold,
    Neutral,
    SlightlyOverbought,
    Overbought,
}

impl BollingerState {
    pub const ALL: [BollingerState; 5] = [
        BollingerState::Oversold,
        BollingerState::SlightlyOversold,
        BollingerState::Neutral,
        BollingerState::SlightlyOverbought,
        BollingerState::Overbought,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BollingerState::Oversold => "überverkauft",
            BollingerState::SlightlyOversold => "leicht überverkauft",
            BollingerState::Neutral => "neutral",
            BollingerState::SlightlyOverbought => "leicht überkauft",
            BollingerState::Overbought => "überkauft",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|b| b.label() == label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DivergenceState {
    StronglyBullish,
    Bullish,
    SlightlyBullish,
    Neutral,
    SlightlyBearish,
    Bearish,
    StronglyBearish,
}

impl DivergenceState {
    pub const ALL: [DivergenceState; 7] = [
        DivergenceState::StronglyBullish,
        DivergenceState::Bullish,
        DivergenceState::SlightlyBullish,
        DivergenceState::Neutral,
        DivergenceState::SlightlyBearish,
        DivergenceState::Bearish,
        DivergenceState::StronglyBearish,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DivergenceState::StronglyBullish => "stark bullisch",
            DivergenceState::Bullish => "bullisch",
            DivergenceState::SlightlyBullish => "leicht bullisch",
            DivergenceState::Neutral => "neutral",
            DivergenceState::SlightlyBearish => "leicht bärisch",
            DivergenceState::Bearish => "bärisch",
            DivergenceState::StronglyBearish => "stark bärisch",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|d| d.label() == label)
    }
}
