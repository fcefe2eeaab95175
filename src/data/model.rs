use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RawRecord – one disclosure row as published upstream
// ---------------------------------------------------------------------------

/// A single mortgage disclosure record, exactly as read from a slim CSV.
///
/// Every field is kept as the raw string from the source: the upstream data
/// mixes numbers with sentinel values ("Exempt", "NA") and named buckets
/// ("<20%"), so interpretation happens lazily per field. Immutable once read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub activity_year: String,
    #[serde(default)]
    pub state_code: String,
    #[serde(default)]
    pub derived_race: String,
    #[serde(default)]
    pub derived_sex: String,
    #[serde(default)]
    pub derived_ethnicity: String,
    #[serde(default)]
    pub interest_rate: String,
    #[serde(default)]
    pub rate_spread: String,
    #[serde(default)]
    pub income: String,
    #[serde(default)]
    pub loan_amount: String,
    #[serde(default)]
    pub loan_to_value_ratio: String,
    #[serde(default)]
    pub debt_to_income_ratio: String,
    #[serde(default)]
    pub loan_type: String,
    #[serde(default)]
    pub loan_purpose: String,
    #[serde(default)]
    pub occupancy_type: String,
    #[serde(default)]
    pub property_value: String,
    #[serde(default)]
    pub applicant_age: String,
    #[serde(default)]
    pub applicant_credit_score_type: String,
    #[serde(default)]
    pub lien_status: String,
    #[serde(default)]
    pub conforming_loan_limit: String,
    #[serde(default)]
    pub total_units: String,
}

// ---------------------------------------------------------------------------
// Lenient per-field parsing
// ---------------------------------------------------------------------------

/// Sentinel strings the source uses for absent numeric values.
const MISSING_SENTINELS: [&str; 4] = ["", "NA", "N/A", "Exempt"];

/// Parse a numeric field leniently: sentinels and garbage become `None`.
///
/// Partial records are normal in this data, so a failed parse never carries
/// any meaning beyond "this field is absent for this record".
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if MISSING_SENTINELS.contains(&trimmed) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integer parse used where the source publishes whole numbers
/// (income in $1000s, activity year). Rejects decimals outright.
pub fn parse_integer(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

// ---------------------------------------------------------------------------
// RaceGroup – the 4-way demographic key used by the aggregation pipeline
// ---------------------------------------------------------------------------

/// Demographic group for aggregation, mapped from `derived_race` only.
///
/// Hispanic is really an ethnicity axis in the source questionnaire, not a
/// race category; the source nevertheless publishes it inside `derived_race`
/// for some records, and this mapping keeps that conflation as-is. The
/// regression pipeline treats the two axes independently instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RaceGroup {
    White,
    Black,
    Hispanic,
    Asian,
}

impl RaceGroup {
    /// All groups, in publication order.
    pub const ALL: [RaceGroup; 4] = [
        RaceGroup::White,
        RaceGroup::Black,
        RaceGroup::Hispanic,
        RaceGroup::Asian,
    ];

    /// Map the raw `derived_race` field; anything else is outside the
    /// aggregation universe.
    pub fn from_derived_race(raw: &str) -> Option<Self> {
        match raw {
            "White" => Some(RaceGroup::White),
            "Black or African American" => Some(RaceGroup::Black),
            "Hispanic or Latino" => Some(RaceGroup::Hispanic),
            "Asian" => Some(RaceGroup::Asian),
            _ => None,
        }
    }

    /// Lowercase key used in the published documents.
    pub fn key(self) -> &'static str {
        match self {
            RaceGroup::White => "white",
            RaceGroup::Black => "black",
            RaceGroup::Hispanic => "hispanic",
            RaceGroup::Asian => "asian",
        }
    }
}

// ---------------------------------------------------------------------------
// IncomeBracket – half-open income ranges in $1000s
// ---------------------------------------------------------------------------

/// Income bracket, evaluated first-match-wins in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IncomeBracket {
    Under50,
    From50To100,
    From100To150,
    Over150,
}

impl IncomeBracket {
    /// All brackets, in ascending order (also the publication order).
    pub const ALL: [IncomeBracket; 4] = [
        IncomeBracket::Under50,
        IncomeBracket::From50To100,
        IncomeBracket::From100To150,
        IncomeBracket::Over150,
    ];

    /// Bucket an income reported in $1000s.
    pub fn from_thousands(income: i64) -> Self {
        if income < 50 {
            IncomeBracket::Under50
        } else if income < 100 {
            IncomeBracket::From50To100
        } else if income < 150 {
            IncomeBracket::From100To150
        } else {
            IncomeBracket::Over150
        }
    }

    /// Label used in the published documents.
    pub fn label(self) -> &'static str {
        match self {
            IncomeBracket::Under50 => "<50K",
            IncomeBracket::From50To100 => "50-100K",
            IncomeBracket::From100To150 => "100-150K",
            IncomeBracket::Over150 => "150K+",
        }
    }
}

// ---------------------------------------------------------------------------
// LoanType – the 4 recognized loan type codes
// ---------------------------------------------------------------------------

/// Loan type, from the source's numeric code. Unknown codes are excluded
/// from the race×loan-type aggregation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LoanType {
    Conventional,
    Fha,
    Va,
    Usda,
}

impl LoanType {
    /// All recognized types, in code order.
    pub const ALL: [LoanType; 4] = [
        LoanType::Conventional,
        LoanType::Fha,
        LoanType::Va,
        LoanType::Usda,
    ];

    /// Map the raw `loan_type` code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "1" => Some(LoanType::Conventional),
            "2" => Some(LoanType::Fha),
            "3" => Some(LoanType::Va),
            "4" => Some(LoanType::Usda),
            _ => None,
        }
    }

    /// Display name used in the published documents.
    pub fn name(self) -> &'static str {
        match self {
            LoanType::Conventional => "Conventional",
            LoanType::Fha => "FHA",
            LoanType::Va => "VA",
            LoanType::Usda => "USDA",
        }
    }
}
