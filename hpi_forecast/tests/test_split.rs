use chrono::{Months, NaiveDate};
use hpi_forecast::{split_at, AnalysisError, Observation, ObservationTable, Subset};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// Monthly table from 2018-01 through 2021-12
fn create_monthly_table() -> ObservationTable {
    let start = date(2018, 1, 1);
    let observations = (0..48)
        .map(|i| Observation::new(start + Months::new(i), "United Kingdom", Some(1000 + i as u64)))
        .collect();
    ObservationTable::new(observations).unwrap()
}

#[test]
fn test_default_cutoff_split() {
    let table = create_monthly_table();
    let split = split_at(&table, date(2019, 12, 31)).unwrap();

    assert_eq!(split.training.len(), 24);
    assert_eq!(split.test.len(), 24);
    assert_eq!(split.training.date_range().unwrap().1, date(2019, 12, 1));
    assert_eq!(split.test.date_range().unwrap().0, date(2020, 1, 1));
    assert!(split.require_non_empty().is_ok());
}

#[test]
fn test_row_on_cutoff_belongs_to_training_only() {
    let table = create_monthly_table();
    let cutoff = date(2020, 1, 1);
    let split = split_at(&table, cutoff).unwrap();

    assert!(split.training.observations().iter().any(|o| o.date == cutoff));
    assert!(split.test.observations().iter().all(|o| o.date > cutoff));
}

#[rstest]
#[case(date(2000, 1, 1))]
#[case(date(2018, 1, 1))]
#[case(date(2019, 6, 15))]
#[case(date(2019, 12, 31))]
#[case(date(2021, 12, 1))]
#[case(date(2030, 1, 1))]
fn test_split_is_total(#[case] cutoff: NaiveDate) {
    let table = create_monthly_table();
    let split = split_at(&table, cutoff).unwrap();

    assert_eq!(split.training.len() + split.test.len(), table.len());

    let mut rejoined: Vec<Observation> = split
        .training
        .observations()
        .iter()
        .chain(split.test.observations())
        .cloned()
        .collect();
    rejoined.sort_by_key(|o| o.date);
    assert_eq!(rejoined, table.sorted_by_date().observations().to_vec());
}

#[test]
fn test_cutoff_outside_data_leaves_one_side_empty() {
    let table = create_monthly_table();
    let split = split_at(&table, date(2030, 1, 1)).unwrap();

    assert!(split.test.is_empty());
    assert_eq!(split.get(Subset::Training).len(), 48);

    let err = split.require_non_empty().unwrap_err();
    assert!(matches!(err, AnalysisError::EmptyResult(ref msg) if msg.contains("test")));
}

#[test]
fn test_empty_input_fails() {
    let err = split_at(&ObservationTable::default(), date(2019, 12, 31)).unwrap_err();
    assert!(matches!(err, AnalysisError::EmptyResult(_)));
}
