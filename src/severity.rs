//! Presentation tiers for coverage percentages and their changes. These
//! only drive emphasis in the rendered report; pass/fail is decided by
//! [`crate::gate`].

/// Tier of an absolute coverage percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
    /// Nothing to measure (zero total).
    Unknown,
}

/// Tier of a percentage-point change against the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaLevel {
    /// No baseline value; nothing is shown.
    None,
    StrongImprovement,
    Improvement,
    Unchanged,
    Regression,
    StrongRegression,
}

/// Lower bounds are inclusive: 90 is excellent, 89.9 is good.
#[must_use]
pub fn level_for_absolute(pct: f64) -> Level {
    if pct.is_nan() {
        Level::Unknown
    } else if pct >= 90.0 {
        Level::Excellent
    } else if pct >= 75.0 {
        Level::Good
    } else if pct >= 60.0 {
        Level::Fair
    } else if pct >= 50.0 {
        Level::Poor
    } else {
        Level::Critical
    }
}

/// Upper bounds of the improvement tiers and lower bounds of the
/// regression tiers are inclusive: +10 is an improvement, -10 a regression.
#[must_use]
pub fn level_for_delta(delta: Option<f64>) -> DeltaLevel {
    match delta {
        None => DeltaLevel::None,
        Some(d) if d.is_nan() => DeltaLevel::None,
        Some(d) if d > 10.0 => DeltaLevel::StrongImprovement,
        Some(d) if d > 0.0 => DeltaLevel::Improvement,
        Some(d) if d == 0.0 => DeltaLevel::Unchanged,
        Some(d) if d > -10.0 => DeltaLevel::Regression,
        Some(_) => DeltaLevel::StrongRegression,
    }
}

/// Text colors used for emphasis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Default,
    Green,
    Grey,
    LightGreen,
    Orange,
    Red,
    Yellow,
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Default => "default",
            Color::Green => "#26a12b",
            Color::Grey => "grey",
            Color::LightGreen => "#a6ba12",
            Color::Orange => "#FF6600",
            Color::Red => "#CC0000",
            Color::Yellow => "#e0c307",
        }
    }
}

impl Level {
    pub fn color(&self) -> Color {
        match self {
            Level::Excellent => Color::Green,
            Level::Good => Color::LightGreen,
            Level::Fair => Color::Yellow,
            Level::Poor => Color::Orange,
            Level::Critical => Color::Red,
            Level::Unknown => Color::Grey,
        }
    }
}

impl DeltaLevel {
    /// `None` for [`DeltaLevel::None`], which has no visual marker.
    pub fn color(&self) -> Option<Color> {
        match self {
            DeltaLevel::None => None,
            DeltaLevel::StrongImprovement => Some(Color::Green),
            DeltaLevel::Improvement => Some(Color::LightGreen),
            DeltaLevel::Unchanged => Some(Color::Grey),
            DeltaLevel::Regression => Some(Color::Orange),
            DeltaLevel::StrongRegression => Some(Color::Red),
        }
    }
}
