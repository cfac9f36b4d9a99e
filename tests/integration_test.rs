//! End-to-end tests of the rule engine and the fixed decision table.
//!
//! Tests cover:
//! - Priority selection across rules, including missing priorities
//! - Latest-only selection with asset/timeframe filters
//! - Identifier resolution against original column labels
//! - Fixed-form classification through the observation log

mod common;

use approx::assert_relative_eq;
use common::*;
use kryptosignal::domain::classifier::Recommendation;
use kryptosignal::domain::observation::{ObservationLog, FIXED_COLUMNS};
use kryptosignal::domain::pipeline::evaluate;
use kryptosignal::domain::rule_set::{Priority, Rule, RuleSet};
use kryptosignal::domain::selector::{KeyColumns, ObservationFilter};
use kryptosignal::domain::value::Value;

fn all() -> ObservationFilter {
    ObservationFilter::default()
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

mod priority_selection {
    use super::*;

    fn single_row() -> Table {
        table(&["Asset", "RSI"], &[&["BTC", "25"]])
    }

    #[test]
    fn smaller_priority_wins() {
        let rules = rule_set(vec![
            rule("RSI < 50", "Verkaufen", 2.0),
            rule("RSI < 30", "Kaufen", 1.0),
        ]);
        let eval = evaluate(&single_row(), &rules, &all(), &KeyColumns::default());
        assert_eq!(eval.records[0].recommendation, "Kaufen");
    }

    #[test]
    fn equal_priority_keeps_first_rule() {
        let rules = rule_set(vec![
            rule("RSI < 50", "Erste", 1.0),
            rule("RSI < 30", "Zweite", 1.0),
        ]);
        let eval = evaluate(&single_row(), &rules, &all(), &KeyColumns::default());
        assert_eq!(eval.records[0].recommendation, "Erste");
    }

    #[test]
    fn missing_priority_never_outranks_a_number() {
        let rules = RuleSet::new(vec![
            Rule::new("RSI < 50", "Ohne", Priority::parse(""), ""),
            rule("RSI < 30", "Hoch", 10_000.0),
        ]);
        let eval = evaluate(&single_row(), &rules, &all(), &KeyColumns::default());
        assert_eq!(eval.records[0].recommendation, "Hoch");
        assert_relative_eq!(eval.records[0].priority.unwrap().as_f64(), 10_000.0);
    }

    #[test]
    fn unparsable_priority_reports_sentinel() {
        let rules = RuleSet::new(vec![Rule::new("RSI < 50", "Kaufen", Priority::parse("hoch"), "")]);
        let eval = evaluate(&single_row(), &rules, &all(), &KeyColumns::default());
        assert_eq!(eval.records[0].priority, Some(Priority::Lowest));
        assert_eq!(eval.records[0].priority.unwrap().to_string(), "9999");
    }

    #[test]
    fn malformed_rule_does_not_block_others() {
        let rules = rule_set(vec![
            rule("RSI <", "Kaputt", 0.0),
            rule("__import__('os')", "Boese", 0.0),
            rule("RSI < 30", "Kaufen", 5.0),
        ]);
        let eval = evaluate(&single_row(), &rules, &all(), &KeyColumns::default());
        assert_eq!(eval.records[0].recommendation, "Kaufen");
    }

    #[test]
    fn no_match_yields_blank_record() {
        let rules = rule_set(vec![rule("RSI > 90", "Verkaufen", 1.0)]);
        let eval = evaluate(&single_row(), &rules, &all(), &KeyColumns::default());
        assert_eq!(eval.records.len(), 1);
        assert_eq!(eval.records[0].asset, text("BTC"));
        assert!(eval.records[0].recommendation.is_empty());
        assert!(eval.records[0].trigger.is_empty());
        assert_eq!(eval.matched(), 0);
    }
}

mod sheets {
    use super::*;

    #[test]
    fn latest_observation_per_asset_and_timeframe() {
        let rules = RuleSet::from_table(&sample_rules());
        let eval = evaluate(&sample_data(), &rules, &ObservationFilter::latest(), &KeyColumns::default());

        assert_eq!(eval.records.len(), 2);
        let btc = &eval.records[0];
        assert_eq!(btc.asset, text("BTC"));
        assert_eq!(btc.timestamp, text("2024-01-02 09:00"));
        assert_eq!(btc.recommendation, "Kaufen");
        assert_eq!(btc.rationale, "überverkauft, Momentum dreht");

        let eth = &eval.records[1];
        assert_eq!(eth.timeframe, text("4H"));
        assert_eq!(eth.recommendation, "Verkaufen");
        assert_eq!(eth.trigger, "RSI > 70");
    }

    #[test]
    fn all_observations_in_input_order() {
        let rules = RuleSet::from_table(&sample_rules());
        let eval = evaluate(&sample_data(), &rules, &all(), &KeyColumns::default());
        let assets: Vec<String> = eval.records.iter().map(|r| r.asset.to_string()).collect();
        assert_eq!(assets, vec!["BTC", "BTC", "ETH"]);
    }

    #[test]
    fn asset_filter_narrows_records() {
        let rules = RuleSet::from_table(&sample_rules());
        let filter = ObservationFilter::latest().with_assets(&["ETH"]);
        let eval = evaluate(&sample_data(), &rules, &filter, &KeyColumns::default());
        assert_eq!(eval.records.len(), 1);
        assert_eq!(eval.records[0].asset, text("ETH"));
    }

    #[test]
    fn timeframe_filter_with_no_hits_is_empty() {
        let rules = RuleSet::from_table(&sample_rules());
        let filter = all().with_timeframes(&["1W"]);
        let eval = evaluate(&sample_data(), &rules, &filter, &KeyColumns::default());
        assert!(eval.records.is_empty());
    }

    #[test]
    fn fallback_rule_without_priority() {
        let data = table(
            &["Asset", "RSI", "MACD Histogramm", "Bollinger"],
            &[&["SOL", "50", "0.1", "überverkauft"]],
        );
        let rules = RuleSet::from_table(&sample_rules());
        let eval = evaluate(&data, &rules, &all(), &KeyColumns::default());
        assert_eq!(eval.records[0].recommendation, "Kauf in Erwägung ziehen");
        assert_eq!(eval.records[0].priority, Some(Priority::Lowest));
    }

    #[test]
    fn unparsable_timestamp_loses_to_real_one() {
        let data = table(
            &["Asset", "Timeframe", "Bewertungszeit", "RSI"],
            &[
                &["BTC", "1D", "2023-01-01", "10"],
                &["BTC", "1D", "not-a-date", "20"],
            ],
        );
        let rules = rule_set(vec![rule("RSI < 50", "Kaufen", 1.0)]);
        let eval = evaluate(&data, &rules, &ObservationFilter::latest(), &KeyColumns::default());
        assert_eq!(eval.records.len(), 1);
        assert_eq!(eval.records[0].timestamp, text("2023-01-01"));
    }

    #[test]
    fn renamed_key_columns() {
        let data = table(
            &["Coin", "TF", "Zeit", "RSI"],
            &[
                &["BTC", "1D", "2024-01-02", "20"],
                &["BTC", "1D", "2024-01-01", "80"],
            ],
        );
        let keys = KeyColumns {
            asset: "Coin".into(),
            timeframe: "TF".into(),
            timestamp: "Zeit".into(),
        };
        let rules = rule_set(vec![rule("RSI < 50", "Kaufen", 1.0)]);
        let eval = evaluate(&data, &rules, &ObservationFilter::latest(), &keys);
        assert_eq!(eval.records.len(), 1);
        assert_eq!(eval.records[0].recommendation, "Kaufen");
        assert_eq!(eval.records[0].asset, text("BTC"));
    }
}

mod identifier_resolution {
    use super::*;

    #[test]
    fn normalized_and_original_names_both_resolve() {
        let data = table(&["RSI", "MACD Histogramm"], &[&["25", "1.2"], &["25", "-1"]]);
        for expr in ["RSI < 30 and MACD_Histogramm > 0", "RSI < 30 and MACD Histogramm > 0"] {
            let rules = rule_set(vec![rule(expr, "Kaufen", 1.0)]);
            let eval = evaluate(&data, &rules, &all(), &KeyColumns::default());
            assert_eq!(eval.records[0].recommendation, "Kaufen", "{expr}");
            assert_eq!(eval.records[1].recommendation, "", "{expr}");
        }
    }

    #[test]
    fn missing_column_never_matches() {
        let data = table(&["RSI"], &[&["25"]]);
        let rules = rule_set(vec![rule("RSI < 30 and MACD_Histogramm > 0", "Kaufen", 1.0)]);
        let eval = evaluate(&data, &rules, &all(), &KeyColumns::default());
        assert_eq!(eval.records[0].recommendation, "");
    }

    #[test]
    fn overlapping_labels_resolve_to_the_longest() {
        let data = table(&["RSI", "RSI 4H"], &[&["80", "20"]]);
        let rules = rule_set(vec![rule("RSI 4H < 30", "Kaufen", 1.0)]);
        let eval = evaluate(&data, &rules, &all(), &KeyColumns::default());
        assert_eq!(eval.records[0].recommendation, "Kaufen");
        assert_eq!(eval.mapping.normalized("RSI 4H"), Some("RSI_4H"));
    }

    #[test]
    fn text_column_compares_as_text() {
        let data = table(&["Divergenz"], &[&["bullisch"], &["bärisch"]]);
        let rules = rule_set(vec![rule("Divergenz == \"bullisch\"", "Kaufen", 1.0)]);
        let eval = evaluate(&data, &rules, &all(), &KeyColumns::default());
        assert_eq!(eval.records[0].recommendation, "Kaufen");
        assert_eq!(eval.records[1].recommendation, "");
    }
}

mod fixed_form {
    use super::*;

    fn fixed_sheet() -> Table {
        table(
            &FIXED_COLUMNS,
            &[
                &["BTC", "42000", "35", "2", "b", "/", "überverkauft", "bullisch", "1D", "2024-01-01 10:00", ""],
                &["ETH", "2500", "75", "7", "h", "$", "überkauft", "bärisch", "4H", "2024-01-01 10:00", ""],
                &["SOL", "100", "50", "4", "f", "?", "neutral", "neutral", "1D", "2024-01-01 10:00", ""],
                &["ADA", "0.5", "42", "3", "c", "\"", "leicht überverkauft", "leicht bullisch", "1D", "", ""],
            ],
        )
    }

    #[test]
    fn decision_table_over_the_log() {
        let mut log = ObservationLog::new();
        assert_eq!(log.extend_from_table(&fixed_sheet()), 4);

        let recs: Vec<Recommendation> = log.recommendations().into_iter().map(|(_, r)| r).collect();
        assert_eq!(
            recs,
            vec![
                Recommendation::Buy,
                Recommendation::Sell,
                Recommendation::NoAction,
                // rising histogram code blocks the consider-buy guard
                Recommendation::NoAction,
            ]
        );
    }

    #[test]
    fn log_only_grows() {
        let mut log = ObservationLog::new();
        log.extend_from_table(&fixed_sheet());
        log.extend_from_table(&fixed_sheet());
        assert_eq!(log.len(), 8);
        assert_eq!(log.entries()[4].asset, "BTC");
        assert_eq!(log.entries()[3].histogram, "„");
    }
}
