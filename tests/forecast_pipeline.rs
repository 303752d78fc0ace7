//! End-to-end checks against the twelve-month reference history.

use bill_forecast::config::{Config, ForecastConfig};
use bill_forecast::import::read_history;
use bill_forecast::{
    Analyzer, ForecastConfidence, ForecastEngine, ForecastError, History, InsightCategory,
    ModelKind, TariffSchedule, Trend,
};
use rstest::rstest;

const SAMPLE_CSV: &str = "\
month,units_consumed,bill_amount
2023-01,177,1511.15
2023-02,161,1367.95
2023-03,148,1251.60
2023-04,257,2227.15
2023-05,202,1734.90
2023-06,202,1734.90
2023-07,259,2245.05
2023-08,234,2021.30
2023-09,195,1672.25
2023-10,145,1224.75
2023-11,167,1426.15
2023-12,134,1133.30
";

#[rstest]
#[case(ModelKind::Linear)]
#[case(ModelKind::Ensemble)]
fn forecast_invariants_hold_for_reference_history(#[case] kind: ModelKind) {
    let sample = History::reference_sample();
    let forecast = ForecastEngine::default()
        .forecast(sample.records(), kind)
        .unwrap();

    assert!(forecast.predicted_units >= 0.0);
    assert!(forecast.predicted_amount >= 0.0);
    assert!(forecast.accuracy_pct <= 100);
    assert!(forecast.min_amount <= forecast.predicted_amount);
    assert!(forecast.predicted_amount <= forecast.max_amount);
    assert_eq!(forecast.model_kind, kind);
}

#[test]
fn linear_forecast_for_reference_history() {
    let sample = History::reference_sample();
    let forecast = ForecastEngine::default()
        .forecast(sample.records(), ModelKind::Linear)
        .unwrap();

    assert_eq!(forecast.predicted_units, 177.0);
    assert_eq!(forecast.predicted_amount, 1510.44);
    assert_eq!(forecast.min_amount, 1146.41);
    assert_eq!(forecast.max_amount, 1874.47);
    assert_eq!(forecast.accuracy_pct, 3);
}

#[test]
fn unseeded_ensemble_stays_near_linear_fit() {
    let sample = History::reference_sample();
    let engine = ForecastEngine::default();
    let linear = engine.forecast(sample.records(), ModelKind::Linear).unwrap();

    for _ in 0..20 {
        let ensemble = engine.forecast(sample.records(), ModelKind::Ensemble).unwrap();
        // Bootstrap lines stay within the observed range of bills.
        assert!(ensemble.predicted_amount <= 2245.05 * 2.0);
        assert!((ensemble.predicted_amount - linear.predicted_amount).abs() < 1500.0);
        // Band width is fixed by the history, not by the model.
        assert!((ensemble.max_amount - ensemble.predicted_amount - 364.03).abs() < 0.02);
    }
}

#[test]
fn seeded_ensemble_is_reproducible_through_config() {
    let cfg = Config {
        forecast: ForecastConfig {
            seed: Some(2023),
            ..ForecastConfig::default()
        },
        ..Config::default()
    };
    let analyzer = Analyzer::from_config(&cfg);
    let sample = History::reference_sample();

    let a = analyzer.analyze(sample.records(), ModelKind::Ensemble, 6).unwrap();
    let b = analyzer.analyze(sample.records(), ModelKind::Ensemble, 6).unwrap();
    assert_eq!(a, b);
}

#[test]
fn full_analysis_from_csv() {
    let history = read_history(SAMPLE_CSV.as_bytes()).unwrap();
    assert_eq!(history, History::reference_sample());

    let analysis = Analyzer::default()
        .analyze(history.records(), ModelKind::Linear, 1)
        .unwrap();

    assert_eq!(analysis.trend, Trend::Increasing);
    assert_eq!(analysis.confidence, ForecastConfidence::Low);
    assert_eq!(analysis.anomalies.len(), 1);
    assert_eq!(analysis.anomalies[0].period.to_string(), "2023-04");

    let categories: Vec<_> = analysis.insights.iter().map(|i| i.category).collect();
    assert_eq!(
        categories,
        vec![InsightCategory::Increase, InsightCategory::LowConfidence]
    );
    assert!(analysis.insights[0].text.contains("20% higher"));

    assert_eq!(analysis.series.labels.last().unwrap(), "January 2024");
    assert_eq!(analysis.seasonal_profile[6], 259.0);
}

#[test]
fn analysis_serializes_to_json() {
    let analysis = Analyzer::default()
        .analyze(History::reference_sample().records(), ModelKind::Linear, 5)
        .unwrap();
    let json = serde_json::to_value(&analysis).unwrap();

    assert_eq!(json["forecast"]["model_kind"], "linear");
    assert_eq!(json["trend"], "increasing");
    assert_eq!(json["anomalies"][0]["direction"], "Spike");
    assert!(json["insights"]
        .as_array()
        .unwrap()
        .iter()
        .any(|i| i["category"] == "peak_season"));
}

#[test]
fn short_history_is_rejected_end_to_end() {
    let history = History::reference_sample();
    let err = Analyzer::default()
        .analyze(history.recent(2), ModelKind::Ensemble, 1)
        .unwrap_err();
    assert_eq!(err, ForecastError::InsufficientHistory { needed: 3, got: 2 });
}

#[test]
fn tariff_prices_the_forecast() {
    let tariff = TariffSchedule::default();
    let forecast = ForecastEngine::default()
        .forecast(History::reference_sample().records(), ModelKind::Linear)
        .unwrap();

    // 177 kWh under the DS-II tariff is the January 2023 bill.
    assert_eq!(tariff.bill(forecast.predicted_units), 1511.15);
}
