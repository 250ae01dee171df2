/// Integration tests for a complete workout session.
/// Feeds realistic interleaved accelerometer and GPS streams through
/// `WorkoutSession` and checks rates, distance and the final summary.

#[cfg(test)]
mod integration_tests {
    use std::io::Cursor;

    use crate::config::SessionConfig;
    use crate::replay::{parse_trace, replay};
    use crate::session::{SessionState, WorkoutSession};
    use crate::types::*;

    /// Meters per degree of latitude on the haversine sphere.
    const M_PER_DEG: f64 = 111_194.93;

    /// Helper: acceleration magnitude with a stroke spike every `period_ms`.
    fn stroke_magnitude(t: u64, period_ms: u64) -> f64 {
        if t > 0 && t % period_ms == 0 {
            16.0
        } else {
            10.0
        }
    }

    /// Helper: boat speed with a surge every third second.
    fn surge_speed(second: u64) -> f64 {
        if second % 3 == 0 {
            5.5
        } else {
            4.0
        }
    }

    /// Helper: 50 Hz accelerometer and 1 Hz GPS for `seconds`, strokes every
    /// 2 s on the accelerometer and a surge every 3 s on the GPS.
    fn row(session: &mut WorkoutSession, seconds: u64) {
        let mut north_m = 0.0;
        let mut t = 0;
        while t <= seconds * 1_000 {
            session.observe_motion(stroke_magnitude(t, 2_000), t);
            if t % 1_000 == 0 {
                let second = t / 1_000;
                if second > 0 {
                    north_m += surge_speed(second);
                }
                session.observe_fix(GpsFix::new(north_m / M_PER_DEG, 0.0, t));
            }
            t += 20;
        }
    }

    // ============================================================================
    // DUAL-SOURCE SESSION
    // ============================================================================

    #[test]
    fn test_two_minute_row_both_sources() {
        let mut session = WorkoutSession::default();
        session.start(0);
        row(&mut session, 120);

        // Motion: 5 spikes in the last 10 s. GPS: 10 peaks spanning 27 s.
        assert_eq!(
            session.current_rate(),
            SelectedRate::Both { motion: 30, gps: 20 }
        );
        assert_eq!(session.motion().strokes_detected(), 60);
        // The surge at 3 s arrives before the baseline has filled.
        assert_eq!(session.gps_peaks().peaks_detected(), 39);

        let summary = session.stop(120_000);
        assert_eq!(summary.method, DetectionMethod::Both);
        assert_eq!(summary.duration_ms, 120_000);
        // 40 surges at 5.5 m plus 80 seconds at 4 m.
        assert!((summary.distance_m - 540.0).abs() < 0.5, "{}", summary.distance_m);
        assert_eq!(summary.avg_split(), "1:51");
        assert_eq!(summary.rejected_samples, 0);
        // Motion ramps 6, 12, 18, 24 then holds 30 (60 records), GPS holds
        // 20 (38 records): 2500 / 98 = 25.5.
        assert_eq!(summary.average_rate_spm, 26);
    }

    #[test]
    fn test_method_switch_changes_display_not_detection() {
        let mut session = WorkoutSession::default();
        session.start(0);
        row(&mut session, 60);

        session.set_method(DetectionMethod::Gps);
        assert_eq!(session.current_rate(), SelectedRate::Single(20));
        session.set_method(DetectionMethod::Motion);
        assert_eq!(session.current_rate(), SelectedRate::Single(30));

        assert_eq!(session.current_rate_for(RateSource::Gps), 20);
        assert_eq!(session.current_rate_for(RateSource::Motion), 30);
    }

    #[test]
    fn test_gps_only_session_ignores_motion_history() {
        let mut config = SessionConfig::default();
        config.method = DetectionMethod::Gps;
        let mut session = WorkoutSession::new(config);
        session.start(0);
        row(&mut session, 60);

        assert_eq!(session.aggregator().record_count(RateSource::Motion), 0);
        assert!(session.aggregator().record_count(RateSource::Gps) > 0);
        assert_eq!(session.stop(60_000).average_rate_spm, 20);
    }

    // ============================================================================
    // DEGRADED CONDITIONS
    // ============================================================================

    #[test]
    fn test_moored_boat_gps_drift() {
        let mut session = WorkoutSession::default();
        session.start(0);
        for s in 0..120u64 {
            // Jitter within a meter of the dock.
            let jitter_m = if s % 2 == 0 { 0.4 } else { -0.4 };
            session.observe_fix(GpsFix::new(45.0 + jitter_m / M_PER_DEG, 7.0, s * 1_000));
            session.observe_motion(9.81, s * 1_000);
        }
        let summary = session.stop(120_000);

        assert_eq!(summary.distance_m, 0.0);
        assert_eq!(summary.avg_speed_mps, None);
        assert_eq!(summary.avg_split(), "--:--");
        assert_eq!(summary.average_rate_spm, 0);
        assert_eq!(session.current_rate(), SelectedRate::Both { motion: 0, gps: 0 });
    }

    #[test]
    fn test_gps_dropout_keeps_last_rate() {
        let mut session = WorkoutSession::default();
        session.start(0);
        row(&mut session, 60);

        // Tunnel under a bridge: motion continues, no fixes.
        let mut t = 60_020;
        while t < 90_000 {
            session.observe_motion(stroke_magnitude(t, 2_000), t);
            t += 20;
        }
        assert_eq!(
            session.current_rate(),
            SelectedRate::Both { motion: 30, gps: 20 }
        );
        assert_eq!(session.duration_ms(), 89_980);
    }

    #[test]
    fn test_unknown_method_from_settings() {
        assert!("paddle".parse::<DetectionMethod>().is_err());
        assert_eq!(
            crate::aggregator::select_by_name("paddle", 30, 20),
            SelectedRate::Single(0)
        );
    }

    // ============================================================================
    // CONFIGURATION AND REPLAY
    // ============================================================================

    #[test]
    fn test_config_file_drives_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(
            &path,
            r#"{ "method": "motion", "motion": { "max_stroke_rate": 20 } }"#,
        )
        .unwrap();

        let config = SessionConfig::from_json(&path).unwrap();
        let mut session = WorkoutSession::try_new(config).unwrap();
        session.start(0);
        row(&mut session, 30);

        assert_eq!(session.method(), DetectionMethod::Motion);
        assert_eq!(session.current_rate(), SelectedRate::Single(20));
    }

    #[test]
    fn test_replay_matches_live_session() {
        let mut trace = String::from("# 40 s on the water\n");
        let mut north_m = 0.0;
        let mut t = 0;
        while t <= 40_000 {
            trace.push_str(&format!("motion,{t},{}\n", stroke_magnitude(t, 2_000)));
            if t % 1_000 == 0 {
                let second = t / 1_000;
                if second > 0 {
                    north_m += surge_speed(second);
                }
                trace.push_str(&format!("gps,{t},{},0\n", north_m / M_PER_DEG));
            }
            t += 20;
        }

        let records = parse_trace(Cursor::new(trace)).unwrap();
        let mut replayed = WorkoutSession::default();
        let replayed_summary = replay(&mut replayed, &records);

        let mut live = WorkoutSession::default();
        live.start(0);
        row(&mut live, 40);
        let live_summary = live.stop(40_000);

        assert_eq!(replayed.state(), SessionState::Stopped);
        assert_eq!(replayed_summary.motion_strokes, live_summary.motion_strokes);
        assert_eq!(replayed_summary.gps_peaks, live_summary.gps_peaks);
        assert_eq!(replayed_summary.average_rate_spm, live_summary.average_rate_spm);
        assert!((replayed_summary.distance_m - live_summary.distance_m).abs() < 1e-6);
    }
}
