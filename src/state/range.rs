//! Range selection and zoom-gesture state machine
//!
//! Translates preset clicks and free-form plot gestures into normalized
//! (endTime, rangeSec, binSec) views. Gestures get sticky snapping back
//! to the active preset span, clamping between the zoom floor and the
//! preset ceiling, no-op suppression, and a debounced commit so a drag
//! does not flood the fetch layer.

use std::time::{Duration, Instant};

use crate::constants::range::{
    ALL_FALLBACK_SPAN_SEC, MIN_ZOOM_SPAN_SEC, NOOP_SUPPRESS_SEC, PRESET_MATCH_TOLERANCE_SEC,
    SNAP_TOLERANCE_FRACTION, SNAP_TOLERANCE_MIN_SEC, ZOOM_DEBOUNCE_MS, ZOOM_IN_DIVISOR,
};
use crate::timeutil;

/// A named, fixed time span offered as a one-click selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Hour,
    Day,
    Week,
    Month,
    All,
}

impl Preset {
    pub const ALL_PRESETS: [Preset; 5] = [
        Preset::Hour,
        Preset::Day,
        Preset::Week,
        Preset::Month,
        Preset::All,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Preset::Hour => "1H",
            Preset::Day => "1D",
            Preset::Week => "7D",
            Preset::Month => "30D",
            Preset::All => "All",
        }
    }

    /// Fixed span; None for All, whose span depends on the server range
    pub fn span_sec(self) -> Option<i64> {
        match self {
            Preset::Hour => Some(3600),
            Preset::Day => Some(86_400),
            Preset::Week => Some(604_800),
            Preset::Month => Some(2_592_000),
            Preset::All => None,
        }
    }
}

/// Selection shown by the preset buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Preset(Preset),
    /// Synthetic selection carrying an arbitrary zoomed span
    Custom { span_sec: i64 },
}

/// A concrete view over the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeView {
    pub end_time_ms: i64,
    pub range_sec: i64,
    pub bin_sec: i64,
}

impl RangeView {
    pub fn start_ms(&self) -> i64 {
        self.end_time_ms - self.range_sec * 1000
    }
}

/// Single-slot delayed commit: submitting a task cancels the pending one
pub struct Debouncer<T> {
    pending: Option<(Instant, T)>,
    delay: Duration,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self { pending: None, delay }
    }

    /// Schedule `task`, replacing whatever was pending
    pub fn submit(&mut self, now: Instant, task: T) {
        self.pending = Some((now + self.delay, task));
    }

    /// Take the task once its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self
            .pending
            .as_ref()
            .is_some_and(|(deadline, _)| now >= *deadline)
        {
            self.pending.take().map(|(_, task)| task)
        } else {
            None
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Deadline of the pending task, for scheduling a wake-up
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }
}

/// State machine over the current chart view
pub struct RangeController {
    view: RangeView,
    /// Span of the last explicitly chosen preset; bounds zoom-out
    zoom_limit_sec: i64,
    selection: Selection,
    debouncer: Debouncer<RangeView>,
    /// Gestures are ignored until the first window has loaded
    has_loaded: bool,
}

impl RangeController {
    /// Start on the 1-day preset ending now
    pub fn new(now_ms: i64) -> Self {
        let preset = Preset::Day;
        let range_sec = preset.span_sec().unwrap_or(ALL_FALLBACK_SPAN_SEC);
        Self {
            view: RangeView {
                end_time_ms: now_ms,
                range_sec,
                bin_sec: timeutil::bin_interval_for(range_sec),
            },
            zoom_limit_sec: range_sec,
            selection: Selection::Preset(preset),
            debouncer: Debouncer::new(Duration::from_millis(ZOOM_DEBOUNCE_MS)),
            has_loaded: false,
        }
    }

    pub fn view(&self) -> RangeView {
        self.view
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn zoom_limit_sec(&self) -> i64 {
        self.zoom_limit_sec
    }

    /// Unblock gesture handling after the first successful load
    pub fn mark_loaded(&mut self) {
        self.has_loaded = true;
    }

    /// Discrete preset transition: immediate, clears any pending gesture
    pub fn select_preset(
        &mut self,
        preset: Preset,
        now_ms: i64,
        available: Option<(i64, i64)>,
    ) -> RangeView {
        let (end_time_ms, span_sec) = match preset.span_sec() {
            Some(span) => (now_ms, span),
            // All: pin to the server's maximum and cover the whole range
            None => match available {
                Some((min, max)) => (max, ((max - min) / 1000).max(MIN_ZOOM_SPAN_SEC)),
                None => (now_ms, ALL_FALLBACK_SPAN_SEC),
            },
        };
        self.selection = Selection::Preset(preset);
        self.zoom_limit_sec = span_sec;
        self.view = RangeView {
            end_time_ms,
            range_sec: span_sec,
            bin_sec: timeutil::bin_interval_for(span_sec),
        };
        self.debouncer.cancel();
        self.view
    }

    /// Feed one raw pan/zoom gesture (a plot-bounds pair, epoch ms).
    ///
    /// The result is scheduled on the debouncer; nothing commits until
    /// `poll` observes the deadline.
    pub fn zoom_gesture(&mut self, a_ms: f64, b_ms: f64, now: Instant) {
        if !self.has_loaded {
            return;
        }

        let (start_ms, end_ms) = timeutil::normalize_range(a_ms, b_ms);
        let raw_span_sec = (end_ms - start_ms) / 1000.0;

        // Sticky snap: pixel jitter near the active preset span lands
        // exactly back on it
        let tolerance =
            SNAP_TOLERANCE_MIN_SEC.max(self.zoom_limit_sec as f64 * SNAP_TOLERANCE_FRACTION);
        let snapped_sec = if (raw_span_sec - self.zoom_limit_sec as f64).abs() <= tolerance {
            self.zoom_limit_sec as f64
        } else {
            raw_span_sec
        };

        let clamped_sec =
            snapped_sec.clamp(self.min_range_sec() as f64, self.zoom_limit_sec as f64);

        // Clamped spans anchor on the gesture start; otherwise the view
        // stays anchored to the pointer's trailing edge
        let new_end_ms = if (clamped_sec - snapped_sec).abs() > f64::EPSILON {
            start_ms + clamped_sec * 1000.0
        } else {
            end_ms
        };

        let end_delta_sec = (new_end_ms - self.view.end_time_ms as f64).abs() / 1000.0;
        let span_delta_sec = (clamped_sec - self.view.range_sec as f64).abs();
        if end_delta_sec < NOOP_SUPPRESS_SEC && span_delta_sec < NOOP_SUPPRESS_SEC {
            return;
        }

        let range_sec = clamped_sec.round() as i64;
        let view = RangeView {
            end_time_ms: new_end_ms.round() as i64,
            range_sec,
            bin_sec: timeutil::bin_interval_for(range_sec),
        };
        self.debouncer.submit(now, view);
    }

    /// Commit a debounced gesture once its deadline passes.
    ///
    /// The selection flips back to a preset when the committed span lands
    /// within tolerance of one, so the buttons highlight correctly.
    pub fn poll(&mut self, now: Instant) -> Option<RangeView> {
        let view = self.debouncer.poll(now)?;
        self.view = view;
        self.selection = match Self::match_preset(view.range_sec) {
            Some(preset) => Selection::Preset(preset),
            None => Selection::Custom {
                span_sec: view.range_sec,
            },
        };
        Some(view)
    }

    /// Deadline of the pending commit, for scheduling a repaint
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    fn match_preset(span_sec: i64) -> Option<Preset> {
        Preset::ALL_PRESETS.iter().copied().find(|preset| {
            preset
                .span_sec()
                .is_some_and(|s| (s - span_sec).abs() <= PRESET_MATCH_TOLERANCE_SEC)
        })
    }

    /// Zoom-in floor: 60s, or one-seventh of the preset span if larger
    fn min_range_sec(&self) -> i64 {
        self.zoom_limit_sec
            .min(MIN_ZOOM_SPAN_SEC.max(self.zoom_limit_sec / ZOOM_IN_DIVISOR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW_MS: i64 = 1_700_000_000_000;

    fn t0() -> Instant {
        Instant::now()
    }

    fn after_debounce(now: Instant) -> Instant {
        now + Duration::from_millis(ZOOM_DEBOUNCE_MS + 10)
    }

    /// Controller on the Week preset with the first load done
    fn week_controller() -> RangeController {
        let mut ctl = RangeController::new(NOW_MS);
        ctl.select_preset(Preset::Week, NOW_MS, None);
        ctl.mark_loaded();
        ctl
    }

    fn gesture_with_span(ctl: &mut RangeController, span_sec: f64, now: Instant) {
        let end = NOW_MS as f64;
        ctl.zoom_gesture(end - span_sec * 1000.0, end, now);
    }

    #[test]
    fn test_gestures_before_first_load_are_ignored() {
        let mut ctl = RangeController::new(NOW_MS);
        let now = t0();
        gesture_with_span(&mut ctl, 7_200.0, now);
        assert!(ctl.poll(after_debounce(now)).is_none());
    }

    #[test]
    fn test_span_near_preset_snaps_exactly() {
        let mut ctl = week_controller();
        let now = t0();

        // Pan back 5s with a span of 604850s: within 1% of the 7d preset
        let end = NOW_MS as f64 - 5_000.0;
        ctl.zoom_gesture(end - 604_850_000.0, end, now);
        let view = ctl.poll(after_debounce(now)).expect("commit");
        assert_eq!(view.range_sec, 604_800);
        assert_eq!(view.end_time_ms, NOW_MS - 5_000);
        assert_eq!(ctl.selection(), Selection::Preset(Preset::Week));
    }

    #[test]
    fn test_zoom_in_clamps_to_floor_and_anchors_on_start() {
        let mut ctl = week_controller();
        let now = t0();
        let min_range = 604_800 / 7; // > 60s floor

        let start = NOW_MS as f64 - 3_600_000.0;
        ctl.zoom_gesture(start, NOW_MS as f64, now);
        let view = ctl.poll(after_debounce(now)).expect("commit");
        assert_eq!(view.range_sec, min_range);
        assert_eq!(view.end_time_ms, (start + min_range as f64 * 1000.0) as i64);
        // 604800 / 7 happens to be exactly one day, so the buttons light up
        assert_eq!(ctl.selection(), Selection::Preset(Preset::Day));
    }

    #[test]
    fn test_zoom_out_clamps_to_preset_span() {
        let mut ctl = week_controller();
        let now = t0();

        let start = NOW_MS as f64 - 2_000_000_000.0; // ~23 days
        ctl.zoom_gesture(start, NOW_MS as f64, now);
        let view = ctl.poll(after_debounce(now)).expect("commit");
        assert_eq!(view.range_sec, 604_800);
        // Ceiling hit: anchored on the gesture's leading edge
        assert_eq!(view.end_time_ms, (start + 604_800_000.0) as i64);
    }

    #[test]
    fn test_sixty_second_floor_binds_for_tiny_limits() {
        let mut ctl = RangeController::new(NOW_MS);
        // All over a 300s available range: 300 / 7 < 60, so the floor is 60s
        ctl.select_preset(Preset::All, NOW_MS, Some((NOW_MS - 300_000, NOW_MS)));
        ctl.mark_loaded();
        let now = t0();

        gesture_with_span(&mut ctl, 10.0, now);
        let view = ctl.poll(after_debounce(now)).expect("commit");
        assert_eq!(view.range_sec, 60);
    }

    #[test]
    fn test_reversed_gesture_is_normalized() {
        let mut ctl = week_controller();
        let now = t0();
        let start = NOW_MS as f64 - 86_400_000.0;

        // Backwards drag: end before start
        ctl.zoom_gesture(NOW_MS as f64, start, now);
        let view = ctl.poll(after_debounce(now)).expect("commit");
        assert_eq!(view.range_sec, 86_400);
        assert_eq!(view.end_time_ms, NOW_MS);
        assert_eq!(ctl.selection(), Selection::Preset(Preset::Day));
    }

    #[test]
    fn test_sub_second_deltas_are_suppressed() {
        let mut ctl = week_controller();
        let now = t0();

        // 400ms pan, span unchanged: below both 1s thresholds
        let end = NOW_MS as f64 + 400.0;
        ctl.zoom_gesture(end - 604_800_000.0, end, now);
        assert!(ctl.poll(after_debounce(now)).is_none());
    }

    #[test]
    fn test_debounce_keeps_only_last_gesture() {
        let mut ctl = week_controller();
        let now = t0();

        gesture_with_span(&mut ctl, 100_000.0, now);
        // A second gesture 100ms later replaces the pending commit
        let later = now + Duration::from_millis(100);
        gesture_with_span(&mut ctl, 200_000.0, later);
        assert!(ctl.next_deadline().is_some());

        // The first deadline passes without firing
        assert!(ctl.poll(now + Duration::from_millis(260)).is_none());
        let view = ctl.poll(after_debounce(later)).expect("commit");
        assert_eq!(view.range_sec, 200_000);
    }

    #[test]
    fn test_preset_selection_is_immediate_and_cancels_gestures() {
        let mut ctl = week_controller();
        let now = t0();
        gesture_with_span(&mut ctl, 100_000.0, now);

        let view = ctl.select_preset(Preset::Day, NOW_MS, None);
        assert_eq!(view.range_sec, 86_400);
        assert_eq!(view.end_time_ms, NOW_MS);
        assert_eq!(ctl.zoom_limit_sec(), 86_400);
        // The pending gesture died with the preset switch
        assert!(ctl.poll(after_debounce(now)).is_none());
    }

    #[test]
    fn test_all_preset_uses_available_range() {
        let mut ctl = RangeController::new(NOW_MS);
        let min = NOW_MS - 90 * 86_400_000;
        let view = ctl.select_preset(Preset::All, NOW_MS, Some((min, NOW_MS)));
        assert_eq!(view.end_time_ms, NOW_MS);
        assert_eq!(view.range_sec, 90 * 86_400);
        assert_eq!(view.bin_sec, 14_400);
    }

    #[test]
    fn test_all_preset_falls_back_without_range() {
        let mut ctl = RangeController::new(NOW_MS);
        let view = ctl.select_preset(Preset::All, NOW_MS, None);
        assert_eq!(view.range_sec, ALL_FALLBACK_SPAN_SEC);
        assert_eq!(view.end_time_ms, NOW_MS);
    }

    #[test]
    fn test_gesture_re_matches_preset_within_tolerance() {
        let mut ctl = week_controller();
        let now = t0();

        // Way off the snap tolerance, but within 1s of the Day preset
        gesture_with_span(&mut ctl, 86_400.6, now);
        let view = ctl.poll(after_debounce(now)).expect("commit");
        assert_eq!(ctl.selection(), Selection::Preset(Preset::Day));
        // Re-matching highlights the button but keeps the zoom limit
        assert_eq!(ctl.zoom_limit_sec(), 604_800);
        assert_eq!(view.range_sec, 86_401);
    }
}
