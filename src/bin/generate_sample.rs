use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rand_xoshiro::Xoshiro256PlusPlus;

const HEADER: [&str; 20] = [
    "activity_year",
    "state_code",
    "derived_race",
    "derived_sex",
    "derived_ethnicity",
    "interest_rate",
    "rate_spread",
    "income",
    "loan_amount",
    "loan_to_value_ratio",
    "debt_to_income_ratio",
    "loan_type",
    "loan_purpose",
    "occupancy_type",
    "property_value",
    "applicant_age",
    "applicant_credit_score_type",
    "lien_status",
    "conforming_loan_limit",
    "total_units",
];

/// (race label, ethnicity label, rate offset in percentage points)
const PROFILES: [(&str, &str, f64); 5] = [
    ("White", "Not Hispanic or Latino", 0.0),
    ("Black or African American", "Not Hispanic or Latino", 0.35),
    ("Asian", "Not Hispanic or Latino", -0.05),
    ("Race Not Available", "Hispanic or Latino", 0.20),
    ("Joint", "Not Hispanic or Latino", 0.05),
];

const REGIONS: [(&str, usize, f64); 4] =
    [("CA", 4000, 6.4), ("TX", 3000, 6.7), ("VT", 400, 6.2), ("WY", 60, 6.9)];

const YEARS: [&str; 6] = ["2018", "2019", "2020", "2021", "2022", "2023"];

const DTI_BINS: [&str; 6] = ["<20%", "20%-<30%", "30%-<36%", "38", "42", "50%-60%"];

fn main() {
    let out_dir = std::env::args().nth(1).unwrap_or_else(|| "data".into());
    std::fs::create_dir_all(&out_dir).expect("Failed to create output directory");

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
    let noise = Normal::new(0.0, 0.4).unwrap();

    for (code, rows, base_rate) in REGIONS {
        let path = format!("{out_dir}/{code}_slim.csv");
        let mut writer = csv::Writer::from_path(&path).expect("Failed to create output file");
        writer.write_record(HEADER).expect("Failed to write header");

        for i in 0..rows {
            let &(race, ethnicity, offset) = PROFILES.choose(&mut rng).unwrap();
            let income = rng.gen_range(30..250);
            let rate = base_rate + offset + noise.sample(&mut rng);

            // A slice of rows carries the messiness of the real files:
            // exempt rates, withheld fields, non-purchase purposes.
            let rate_field = if i % 40 == 0 {
                "Exempt".to_string()
            } else {
                format!("{rate:.3}")
            };
            let spread_field = if i % 7 == 0 {
                "NA".to_string()
            } else {
                format!("{:.3}", rate - base_rate + 0.5)
            };
            let income_field = if i % 11 == 0 { String::new() } else { income.to_string() };
            let purpose = if i % 25 == 0 { "4" } else { ["1", "31", "32"][i % 3] };

            writer
                .write_record([
                    YEARS[i % YEARS.len()],
                    code,
                    race,
                    ["Male", "Female", "Joint"][i % 3],
                    ethnicity,
                    &rate_field,
                    &spread_field,
                    &income_field,
                    &format!("{}", rng.gen_range(100..800) * 1000),
                    &format!("{:.1}", rng.gen_range(60.0..97.0)),
                    DTI_BINS[i % DTI_BINS.len()],
                    ["1", "1", "1", "2", "3"][i % 5],
                    purpose,
                    "1",
                    &format!("{}", rng.gen_range(150..900) * 1000),
                    ["25-34", "35-44", "45-54", "55-64"][i % 4],
                    "2",
                    "1",
                    "C",
                    "1",
                ])
                .expect("Failed to write row");
        }

        writer.flush().expect("Failed to flush writer");
        println!("Wrote {rows} rows to {path}");
    }
}
