use super::model::{parse_numeric, RawRecord};

// ---------------------------------------------------------------------------
// Row filter: which records enter the analysis population
// ---------------------------------------------------------------------------

/// Loan purposes kept for analysis: home purchase (1), refinancing (31),
/// cash-out refinancing (32). A closed set; everything else is rejected.
const ACCEPTED_LOAN_PURPOSES: [&str; 3] = ["1", "31", "32"];

/// Occupancy code for a primary residence.
const PRIMARY_RESIDENCE: &str = "1";

/// Races admitted directly. Hispanic borrowers are not listed here because
/// the source reports them on the ethnicity axis; they are admitted through
/// `ACCEPTED_ETHNICITIES` instead.
const ACCEPTED_RACES: [&str; 5] = [
    "White",
    "Black or African American",
    "Asian",
    "Joint",
    "Race Not Available",
];

/// Ethnicity values that admit a record regardless of its race field.
const ACCEPTED_ETHNICITIES: [&str; 2] = ["Hispanic or Latino", "Not Hispanic or Latino"];

/// Row filter applied identically by the aggregation and regression
/// pipelines, so both describe the same underlying population.
///
/// A record is accepted when:
/// * its loan purpose is in the accepted set,
/// * it is a primary residence,
/// * its race is in the allow-list OR its ethnicity is recognized,
/// * its interest rate parses as a finite number (sentinels rejected).
///
/// Pure predicate, no side effects.
pub fn accepts(record: &RawRecord) -> bool {
    if !ACCEPTED_LOAN_PURPOSES.contains(&record.loan_purpose.as_str()) {
        return false;
    }
    if record.occupancy_type != PRIMARY_RESIDENCE {
        return false;
    }
    let race_ok = ACCEPTED_RACES.contains(&record.derived_race.as_str());
    let ethnicity_ok = ACCEPTED_ETHNICITIES.contains(&record.derived_ethnicity.as_str());
    if !race_ok && !ethnicity_ok {
        return false;
    }
    parse_numeric(&record.interest_rate).is_some()
}

/// Keep only records passing [`accepts`].
pub fn filtered(records: Vec<RawRecord>) -> Vec<RawRecord> {
    records.into_iter().filter(accepts).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qualifying_record() -> RawRecord {
        RawRecord {
            loan_purpose: "1".into(),
            occupancy_type: "1".into(),
            derived_race: "White".into(),
            derived_ethnicity: "Not Hispanic or Latino".into(),
            interest_rate: "6.5".into(),
            ..RawRecord::default()
        }
    }

    #[test]
    fn accepts_a_clean_record() {
        assert!(accepts(&qualifying_record()));
    }

    #[test]
    fn rejects_unlisted_loan_purpose() {
        let mut record = qualifying_record();
        record.loan_purpose = "2".into();
        assert!(!accepts(&record));
        record.loan_purpose = "31".into();
        assert!(accepts(&record));
        record.loan_purpose = "32".into();
        assert!(accepts(&record));
    }

    #[test]
    fn rejects_non_primary_residence() {
        let mut record = qualifying_record();
        record.occupancy_type = "2".into();
        assert!(!accepts(&record));
    }

    #[test]
    fn ethnicity_admits_when_race_is_unlisted() {
        let mut record = qualifying_record();
        record.derived_race = "Free Form Text Only".into();
        record.derived_ethnicity = "Hispanic or Latino".into();
        assert!(accepts(&record));

        record.derived_ethnicity = "Ethnicity Not Available".into();
        assert!(!accepts(&record));
    }

    #[test]
    fn rejects_sentinel_interest_rates() {
        for sentinel in ["Exempt", "NA", "", "N/A"] {
            let mut record = qualifying_record();
            record.interest_rate = sentinel.into();
            assert!(!accepts(&record), "{sentinel:?}");
        }
    }

    #[test]
    fn filtered_keeps_only_qualifying_records() {
        let mut rejected = qualifying_record();
        rejected.interest_rate = "Exempt".into();
        let kept = filtered(vec![qualifying_record(), rejected, qualifying_record()]);
        assert_eq!(kept.len(), 2);
    }
}
