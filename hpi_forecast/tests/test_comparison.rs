use chrono::{Months, NaiveDate};
use hpi_forecast::comparison::fit_and_evaluate;
use hpi_forecast::{
    compare_lag_configs, split_at, AnalysisError, BaselineComparator, Observation,
    ObservationTable, Stage, Subset,
};
use pretty_assertions::assert_eq;

// Monthly UK table from 2010-01 through 2022-12 with a seasonal pattern and noise
fn create_monthly_table() -> ObservationTable {
    let start = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
    let mut state: u64 = 2023;
    let observations = (0..156u32)
        .map(|i| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407)
                >> 1;
            let seasonal = [0_i64, -9, -4, 3, 6, 11, 14, 12, 5, 2, -2, -7][(i % 12) as usize];
            let volume = (85_000 + seasonal * 1_000 + (state % 6_000) as i64) as u64;
            Observation::new(start + Months::new(i), "United Kingdom", Some(volume))
        })
        .collect();
    ObservationTable::new(observations).unwrap()
}

fn cutoff() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 12, 31).unwrap()
}

#[test]
fn test_four_runs_on_two_subsets() {
    let split = split_at(&create_monthly_table(), cutoff()).unwrap();
    assert_eq!(split.training.len(), 120);
    assert_eq!(split.test.len(), 36);

    let comparison = compare_lag_configs(&split, 12, 1).unwrap();

    assert_eq!(comparison.primary_lags(), 12);
    assert_eq!(comparison.baseline_lags(), 1);
    assert_eq!(comparison.primary_runs().len(), 2);
    assert_eq!(comparison.baseline_runs().len(), 2);

    let expected_rows = [
        (Subset::Training, 12, 108),
        (Subset::Test, 12, 24),
        (Subset::Training, 1, 119),
        (Subset::Test, 1, 35),
    ];
    for (subset, lags, n_obs) in expected_rows {
        let run = comparison.run(subset, lags).unwrap();
        assert_eq!(run.model.n_obs(), n_obs);
    }
}

#[test]
fn test_every_run_is_evaluated_on_its_own_subset() {
    let split = split_at(&create_monthly_table(), cutoff()).unwrap();
    let comparison = compare_lag_configs(&split, 12, 1).unwrap();

    for run in comparison.primary_runs().iter().chain(comparison.baseline_runs()) {
        assert_eq!(run.evaluation.len(), run.model.n_obs());
        assert_eq!(run.evaluation.lags(), run.lags());

        let subset_table = split.get(run.subset);
        let (first, last) = subset_table.date_range().unwrap();
        for p in run.evaluation.predictions() {
            assert!(p.date >= first && p.date <= last);
        }
    }
}

#[test]
fn test_summary_frame_and_gain() {
    let split = split_at(&create_monthly_table(), cutoff()).unwrap();
    let comparison = compare_lag_configs(&split, 12, 1).unwrap();

    let frame = comparison.summary_frame().unwrap();
    assert_eq!(frame.height(), 4);
    assert_eq!(
        frame.get_column_names(),
        vec![
            "subset",
            "lags",
            "n_obs",
            "r_squared",
            "adj_r_squared",
            "residual_std_error",
            "mae"
        ]
    );

    for subset in Subset::ALL {
        let gain = comparison.r_squared_gain(subset).unwrap();
        let primary = comparison.run(subset, 12).unwrap().model.r_squared();
        let baseline = comparison.run(subset, 1).unwrap().model.r_squared();
        assert_eq!(gain, primary - baseline);
    }

    let text = comparison.to_string();
    assert!(text.contains("R-squared gain of 12 lags over 1 on training"));
}

#[test]
fn test_comparison_is_reproducible() {
    let split = split_at(&create_monthly_table(), cutoff()).unwrap();

    let first = compare_lag_configs(&split, 12, 1).unwrap();
    let second = compare_lag_configs(&split, 12, 1).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_short_test_subset_fails_with_stage_context() {
    // test subset holds only 2022, 12 rows, too few for a 12-lag model
    let split = split_at(
        &create_monthly_table(),
        NaiveDate::from_ymd_opt(2021, 12, 31).unwrap(),
    )
    .unwrap();

    let err = compare_lag_configs(&split, 12, 1).unwrap_err();
    match &err {
        AnalysisError::Stage { stage, subset, .. } => {
            assert_eq!(*stage, Stage::Fit);
            assert_eq!(*subset, Some(Subset::Test));
        }
        other => panic!("Expected stage error, got {:?}", other),
    }
    assert!(matches!(
        err.root_cause(),
        AnalysisError::InsufficientHistory { rows: 0, .. }
    ));
}

#[test]
fn test_baseline_comparator() {
    assert!(BaselineComparator::new(0).is_err());

    let split = split_at(&create_monthly_table(), cutoff()).unwrap();
    let comparator = BaselineComparator::new(2).unwrap();
    assert_eq!(comparator.lags(), 2);

    let err = comparator.compare(&split, Vec::new()).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidParameter(_)));

    let primary = vec![fit_and_evaluate(Subset::Training, &split.training, 6).unwrap()];
    let comparison = comparator.compare(&split, primary).unwrap();
    assert_eq!(comparison.primary_lags(), 6);
    assert_eq!(comparison.baseline_runs().len(), 2);
    assert!(comparison.r_squared_gain(Subset::Test).is_none());
}

#[test]
fn test_baseline_must_differ_from_primary() {
    let split = split_at(&create_monthly_table(), cutoff()).unwrap();

    let err = compare_lag_configs(&split, 12, 12).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidParameter(ref msg) if msg.contains("12")));
}
