use hpi_forecast::error::StageContext;
use hpi_forecast::{AnalysisError, Stage, Subset};
use hpi_math::MathError;
use std::error::Error;

#[test]
fn test_error_messages() {
    let err = AnalysisError::InsufficientHistory {
        rows: 3,
        lags: 12,
        required: 13,
    };
    assert_eq!(
        err.to_string(),
        "Insufficient history: 3 complete rows for a 12-lag model (need 13)"
    );

    let err = AnalysisError::RankDeficient {
        term: "sales_volume_lag_1".to_string(),
    };
    assert!(err.to_string().contains("sales_volume_lag_1"));

    let err = AnalysisError::MissingColumn("SalesVolume".to_string());
    assert_eq!(err.to_string(), "Missing column 'SalesVolume' in source data");
}

#[test]
fn test_stage_context_wraps_and_unwraps() {
    let result: hpi_forecast::error::Result<()> =
        Err(AnalysisError::EmptyResult("no rows for region 'Atlantis'".to_string()));

    let err = result.stage(Stage::Filter, None).unwrap_err();
    assert_eq!(
        err.to_string(),
        "region filter failed: Empty result: no rows for region 'Atlantis'"
    );
    assert!(matches!(err.root_cause(), AnalysisError::EmptyResult(_)));
    assert!(err.source().is_some());
}

#[test]
fn test_stage_context_names_subset() {
    let inner: hpi_forecast::error::Result<()> = Err(AnalysisError::InsufficientHistory {
        rows: 0,
        lags: 12,
        required: 13,
    });

    let err = inner
        .stage(Stage::Fit, Some(Subset::Test))
        .stage(Stage::Baseline, Some(Subset::Test))
        .unwrap_err();

    assert!(err.to_string().starts_with(
        "baseline comparison failed for test subset: model fit failed for test subset"
    ));
    assert!(matches!(
        err.root_cause(),
        AnalysisError::InsufficientHistory { rows: 0, .. }
    ));
}

#[test]
fn test_math_errors_convert() {
    let err: AnalysisError = MathError::InsufficientData("need 2 points".to_string()).into();
    assert!(matches!(err, AnalysisError::MathError(_)));
    assert!(err.to_string().starts_with("Math error:"));
}

#[test]
fn test_io_errors_convert() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: AnalysisError = io.into();
    assert!(matches!(err, AnalysisError::IoError(_)));
}
