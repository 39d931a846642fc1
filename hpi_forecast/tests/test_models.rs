use approx::assert_relative_eq;
use chrono::{Months, NaiveDate};
use hpi_forecast::models::INTERCEPT_TERM;
use hpi_forecast::{
    AnalysisError, FeatureRow, FeatureSet, LagFeatureBuilder, LagRegression, Observation,
    ObservationTable, RowId,
};

fn month(offset: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2010, 1, 1).unwrap() + Months::new(offset)
}

fn table_from(values: &[u64]) -> ObservationTable {
    let observations = values
        .iter()
        .enumerate()
        .map(|(i, &v)| Observation::new(month(i as u32), "United Kingdom", Some(v)))
        .collect();
    ObservationTable::new(observations).unwrap()
}

// Deterministic noisy series around 90k sales a month
fn noisy_series(len: usize) -> ObservationTable {
    let mut state: u64 = 42;
    let values: Vec<u64> = (0..len)
        .map(|i| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407)
                >> 1;
            let seasonal = ((i % 12) as f64 * 0.52).sin() * 8000.0;
            (90_000.0 + seasonal) as u64 + state % 15_000
        })
        .collect();
    table_from(&values)
}

#[test]
fn test_lag_one_fit_recovers_linear_recurrence() {
    // y_t = y_{t-1} + 10
    let values: Vec<u64> = (0..20).map(|i| 100 + 10 * i).collect();
    let features = LagFeatureBuilder::new(1).unwrap().build(&table_from(&values));

    let model = LagRegression::new().fit(&features).unwrap();

    assert_eq!(model.lags(), 1);
    assert_eq!(model.n_obs(), 19);
    assert_relative_eq!(model.intercept().estimate, 10.0, epsilon = 1e-6);
    assert_relative_eq!(model.coefficients()[0].estimate, 1.0, epsilon = 1e-9);
    assert_relative_eq!(model.r_squared(), 1.0, epsilon = 1e-9);
    assert_eq!(model.coefficients()[0].term, "sales_volume_lag_1");
}

#[test]
fn test_twelve_lag_fit_reports_inference_statistics() {
    let features = LagFeatureBuilder::new(12).unwrap().build(&noisy_series(120));
    let model = LagRegression::new().fit(&features).unwrap();

    assert_eq!(model.n_obs(), 108);
    assert_eq!(model.df_residual(), 108 - 13);
    assert_eq!(model.coefficients().len(), 12);
    assert!(model.coefficient(INTERCEPT_TERM).is_some());
    assert!(model.coefficient("sales_volume_lag_12").is_some());

    let r2 = model.r_squared();
    assert!((0.0..=1.0).contains(&r2));
    assert!(model.adj_r_squared().unwrap() <= r2);
    assert!(model.residual_std_error().unwrap() > 0.0);

    for c in model.coefficients() {
        assert!(c.std_error.unwrap() > 0.0);
        let p = c.p_value.unwrap();
        assert!((0.0..=1.0).contains(&p));
    }

    let f = model.f_statistic().unwrap();
    assert_eq!((f.numerator_df, f.denominator_df), (12, 95));
}

#[test]
fn test_too_short_history_is_reported() {
    let values: Vec<u64> = (0..15).map(|i| 100 + 10 * i).collect();
    let features = LagFeatureBuilder::new(12).unwrap().build(&table_from(&values));

    let err = LagRegression::new().fit(&features).unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::InsufficientHistory {
            rows: 3,
            lags: 12,
            required: 13
        }
    ));
}

#[test]
fn test_constant_series_is_rank_deficient() {
    let features = LagFeatureBuilder::new(1)
        .unwrap()
        .build(&table_from(&[500; 10]));

    let err = LagRegression::new().fit(&features).unwrap_err();
    match err {
        AnalysisError::RankDeficient { term } => assert_eq!(term, "sales_volume_lag_1"),
        other => panic!("Expected RankDeficient, got {:?}", other),
    }
}

#[test]
fn test_non_finite_rows_are_dropped_before_fitting() {
    let make_row = |i: u32, target: f64, lag: f64| FeatureRow {
        id: RowId {
            date: month(i),
            region: "United Kingdom".to_string(),
        },
        sales_volume: target,
        lags: vec![lag],
        lag_dates: vec![month(i - 1)],
    };
    let rows = vec![
        make_row(1, 3.0, 1.0),
        make_row(2, 5.0, 2.0),
        make_row(3, f64::NAN, 3.0),
        make_row(4, 9.0, 4.0),
        make_row(5, 11.0, f64::NAN),
    ];
    let features = FeatureSet::from_rows(1, rows).unwrap();

    let model = LagRegression::new().fit(&features).unwrap();

    assert_eq!(model.n_obs(), 3);
    assert_relative_eq!(model.coefficients()[0].estimate, 2.0, epsilon = 1e-9);
    assert_relative_eq!(model.intercept().estimate, 1.0, epsilon = 1e-9);
}

#[test]
fn test_exact_fit_has_no_standard_errors() {
    let features = LagFeatureBuilder::new(1)
        .unwrap()
        .build(&table_from(&[100, 130, 120]));

    let model = LagRegression::new().fit(&features).unwrap();

    assert_eq!(model.df_residual(), 0);
    assert!(model.intercept().std_error.is_none());
    assert!(model.residual_std_error().is_none());
    assert!(model.f_statistic().is_none());
    assert!(model.to_string().contains("NA"));
}

#[test]
fn test_predict_requires_matching_lag_count() {
    let table = noisy_series(60);
    let model = LagRegression::new()
        .fit(&LagFeatureBuilder::new(2).unwrap().build(&table))
        .unwrap();

    let wrong = LagFeatureBuilder::new(3).unwrap().build(&table);
    let err = model.predict(&wrong).unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::LagMismatch {
            expected: 2,
            found: 3
        }
    ));

    let right = LagFeatureBuilder::new(2).unwrap().build(&table);
    let predictions = model.predict(&right).unwrap();
    assert_eq!(predictions.len(), right.len());
    for (p, fitted) in predictions.iter().zip(model.fitted_values()) {
        assert_relative_eq!(*p, *fitted, max_relative = 1e-9);
    }
}

#[test]
fn test_r_squared_is_reproducible_across_runs() {
    let table = noisy_series(96);

    let fit = |lags: usize| {
        let features = LagFeatureBuilder::new(lags).unwrap().build(&table);
        LagRegression::new().fit(&features).unwrap().r_squared()
    };

    assert_eq!(fit(1).to_bits(), fit(1).to_bits());
    assert_eq!(fit(12).to_bits(), fit(12).to_bits());
}

#[test]
fn test_summary_frame_and_display() {
    let features = LagFeatureBuilder::new(3).unwrap().build(&noisy_series(48));
    let model = LagRegression::new().fit(&features).unwrap();

    let frame = model.summary_frame().unwrap();
    assert_eq!(frame.height(), 4);
    assert_eq!(
        frame.get_column_names(),
        vec!["term", "estimate", "std_error", "t_value", "p_value"]
    );

    let text = model.to_string();
    assert!(text.contains("(Intercept)"));
    assert!(text.contains("sales_volume_lag_3"));
    assert!(text.contains("Multiple R-squared"));
}

#[test]
fn test_invalid_tolerance() {
    assert!(LagRegression::with_tolerance(0.0).is_err());
    assert!(LagRegression::with_tolerance(1e-9).is_ok());
}
