use chrono::NaiveDate;
use options_signal_bot::models::{Bar, ContractType, OptionSnapshot, Trend, TrendInfo};
use options_signal_bot::signals::{
    analyze_trend, classify_trend, filter_candidates, pick_option_for_trend, project_return,
};
use options_signal_bot::Settings;
use serde_json::json;

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 86_400_000;
    const EPS: f64 = 1e-9;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn bars_from(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                timestamp: 1_700_000_000_000 + i as i64 * DAY_MS,
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1000.0,
            })
            .collect()
    }

    /// Zig-zag series: `up` on even steps, `down` on odd steps
    fn zigzag(len: usize, start: f64, up: f64, down: f64) -> Vec<f64> {
        let mut closes = vec![start];
        for i in 1..len {
            let prev = closes[i - 1];
            closes.push(if i % 2 == 1 { prev + up } else { prev + down });
        }
        closes
    }

    fn trend_info(trend: Trend, latest_close: Option<f64>) -> TrendInfo {
        TrendInfo {
            trend,
            latest_close,
            sma_short: None,
            sma_long: None,
            ema_short: None,
            rsi: None,
            as_of: None,
        }
    }

    fn contract(
        side: &str,
        expiry: &str,
        delta: Option<f64>,
        open_interest: u64,
        bid: Option<f64>,
        ask: Option<f64>,
    ) -> OptionSnapshot {
        serde_json::from_value(json!({
            "details": {
                "ticker": format!("O:TEST-{}-{}-{:?}", side, expiry, delta),
                "contract_type": side,
                "expiration_date": expiry,
                "strike_price": 210.0
            },
            "greeks": { "delta": delta },
            "open_interest": open_interest,
            "last_quote": { "bid": bid, "ask": ask }
        }))
        .unwrap()
    }

    fn with_underlying(mut snap: OptionSnapshot, price: f64) -> OptionSnapshot {
        snap.underlying_asset = serde_json::from_value(json!({ "last_trade": { "price": price } })).unwrap();
        snap
    }

    // -----------------------------------------------
    // TREND
    // -----------------------------------------------

    #[test]
    fn test_classify_trend_bands() {
        assert_eq!(classify_trend(11.0, 10.0, 55.0), Trend::Bullish);
        assert_eq!(classify_trend(11.0, 10.0, 40.0), Trend::Bullish);
        assert_eq!(classify_trend(11.0, 10.0, 70.0), Trend::Bullish);
        assert_eq!(classify_trend(11.0, 10.0, 75.0), Trend::Neutral);
        assert_eq!(classify_trend(9.0, 10.0, 45.0), Trend::Bearish);
        assert_eq!(classify_trend(9.0, 10.0, 30.0), Trend::Bearish);
        assert_eq!(classify_trend(9.0, 10.0, 65.0), Trend::Neutral);
        assert_eq!(classify_trend(10.0, 10.0, 50.0), Trend::Neutral);
    }

    #[test]
    fn test_rising_zigzag_is_bullish() {
        let bars = bars_from(&zigzag(60, 100.0, 2.0, -1.0));
        let info = analyze_trend(&bars, &Settings::default());

        assert_eq!(info.trend, Trend::Bullish);
        assert!(info.sma_short.unwrap() > info.sma_long.unwrap());
        let rsi = info.rsi.unwrap();
        assert!((60.0..=70.0).contains(&rsi), "rsi {rsi}");
        assert_eq!(info.latest_close, Some(bars.last().unwrap().close));
        assert_eq!(info.as_of, bars.last().unwrap().date());
        assert!(info.ema_short.is_some());
    }

    #[test]
    fn test_falling_zigzag_is_bearish() {
        let bars = bars_from(&zigzag(60, 200.0, -2.0, 1.0));
        let info = analyze_trend(&bars, &Settings::default());

        assert_eq!(info.trend, Trend::Bearish);
        assert!(info.sma_short.unwrap() < info.sma_long.unwrap());
    }

    #[test]
    fn test_straight_rally_is_overbought() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let info = analyze_trend(&bars_from(&closes), &Settings::default());

        assert_eq!(info.rsi, Some(100.0));
        assert_eq!(info.trend, Trend::Neutral);
    }

    #[test]
    fn test_flat_series_is_neutral() {
        let info = analyze_trend(&bars_from(&[50.0; 40]), &Settings::default());
        assert_eq!(info.trend, Trend::Neutral);
        assert_eq!(info.rsi, Some(50.0));
    }

    #[test]
    fn test_short_history_is_no_data() {
        let info = analyze_trend(&bars_from(&[50.0; 10]), &Settings::default());
        assert_eq!(info.trend, Trend::NoData);
        assert!(info.sma_long.is_none());
        assert_eq!(info.latest_close, Some(50.0));

        let empty = analyze_trend(&[], &Settings::default());
        assert_eq!(empty.trend, Trend::NoData);
        assert!(empty.latest_close.is_none());
    }

    // -----------------------------------------------
    // CONTRACT SELECTION
    // -----------------------------------------------

    #[test]
    fn test_filters_drop_unusable_contracts() {
        let chain = vec![
            contract("call", "2025-01-31", Some(0.40), 500, Some(2.0), Some(2.2)), // keep
            contract("call", "2025-01-06", Some(0.35), 500, Some(1.0), Some(1.2)), // dte 5
            contract("call", "2025-03-31", Some(0.35), 500, Some(1.0), Some(1.2)), // dte 89
            contract("call", "2025-01-31", Some(0.35), 50, Some(1.0), Some(1.2)),  // thin OI
            contract("call", "2025-01-31", None, 500, Some(1.0), Some(1.2)),       // no delta
            contract("call", "2025-01-31", Some(0.35), 500, None, None),           // no mark
            contract("put", "2025-01-31", Some(0.35), 500, Some(1.0), Some(1.2)),  // wrong side
        ];

        let kept = filter_candidates(&chain, ContractType::Call, today(), &Settings::default());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].dte, 30);
        assert_eq!(kept[0].contract.delta, Some(0.40));
    }

    #[test]
    fn test_bullish_picks_call_nearest_target_delta() {
        let chain = vec![
            with_underlying(contract("call", "2025-01-31", Some(0.40), 500, Some(2.0), Some(2.2)), 200.0),
            contract("call", "2025-02-14", Some(0.34), 500, Some(1.4), Some(1.6)),
            contract("call", "2025-01-21", Some(0.60), 900, Some(4.0), Some(4.4)),
        ];

        let signal = pick_option_for_trend(
            "TEST",
            &trend_info(Trend::Bullish, Some(190.0)),
            &chain,
            today(),
            &Settings::default(),
        )
        .unwrap();

        assert_eq!(signal.ticker, "TEST");
        assert_eq!(signal.trend, Trend::Bullish);
        assert_eq!(signal.contract_type, ContractType::Call);
        assert_eq!(signal.expiration_date, "2025-02-14");
        assert_eq!(signal.dte, 44);
        assert!((signal.mark - 1.5).abs() < EPS);
        assert_eq!(signal.underlying_price, Some(200.0));

        // 5% of 200 = 10; 0.34 * 10 = 3.4; 3.4 / 1.5
        assert!((signal.projected_underlying_change.unwrap() - 10.0).abs() < EPS);
        assert!((signal.projected_option_change.unwrap() - 3.4).abs() < EPS);
        assert!((signal.projected_return_pct.unwrap() - 3.4 / 1.5 * 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_equal_delta_prefers_nearer_expiry() {
        let chain = vec![
            contract("call", "2025-02-10", Some(0.35), 500, Some(1.0), Some(1.2)),
            contract("call", "2025-01-21", Some(0.35), 500, Some(1.0), Some(1.2)),
        ];

        let signal = pick_option_for_trend(
            "TEST",
            &trend_info(Trend::Bullish, Some(100.0)),
            &chain,
            today(),
            &Settings::default(),
        )
        .unwrap();

        assert_eq!(signal.dte, 20);
    }

    #[test]
    fn test_bearish_picks_put_and_projects_gain() {
        let chain = vec![
            contract("put", "2025-01-31", Some(-0.50), 500, Some(3.0), Some(3.2)),
            contract("put", "2025-01-31", Some(-0.30), 500, Some(1.9), Some(2.1)),
        ];

        // No underlying in the chain: falls back to the latest close
        let signal = pick_option_for_trend(
            "TEST",
            &trend_info(Trend::Bearish, Some(200.0)),
            &chain,
            today(),
            &Settings::default(),
        )
        .unwrap();

        assert_eq!(signal.contract_type, ContractType::Put);
        assert!((signal.delta + 0.30).abs() < EPS);
        assert_eq!(signal.underlying_price, Some(200.0));
        assert!((signal.projected_underlying_change.unwrap() + 10.0).abs() < EPS);
        // -0.30 * -10 = 3.0 on a 2.0 mark
        assert!((signal.projected_return_pct.unwrap() - 150.0).abs() < 1e-6);
    }

    #[test]
    fn test_no_pick_without_direction_or_chain() {
        let chain = vec![contract("call", "2025-01-31", Some(0.35), 500, Some(1.0), Some(1.2))];
        let settings = Settings::default();

        assert!(pick_option_for_trend("T", &trend_info(Trend::Neutral, Some(1.0)), &chain, today(), &settings).is_none());
        assert!(pick_option_for_trend("T", &trend_info(Trend::NoData, None), &chain, today(), &settings).is_none());
        assert!(pick_option_for_trend("T", &trend_info(Trend::Bullish, Some(1.0)), &[], today(), &settings).is_none());
    }

    #[test]
    fn test_no_pick_when_everything_filtered() {
        let chain = vec![contract("call", "2025-01-31", Some(0.35), 10, Some(1.0), Some(1.2))];
        let signal = pick_option_for_trend(
            "T",
            &trend_info(Trend::Bullish, Some(100.0)),
            &chain,
            today(),
            &Settings::default(),
        );
        assert!(signal.is_none());
    }

    #[test]
    fn test_projection_without_underlying() {
        assert!(project_return(Trend::Bullish, None, 0.35, 1.0).is_none());

        let signal = pick_option_for_trend(
            "T",
            &trend_info(Trend::Bullish, None),
            &[contract("call", "2025-01-31", Some(0.35), 500, Some(1.0), Some(1.2))],
            today(),
            &Settings::default(),
        )
        .unwrap();
        assert!(signal.underlying_price.is_none());
        assert!(signal.projected_return_pct.is_none());
    }
}
