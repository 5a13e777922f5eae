use crate::presence::domain::presence_state_machine::PresenceEvent;

/// Counters collected by a scheduler over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub ticks: u64,
    pub decode_attempts: u64,
    pub frames_unavailable: u64,
    pub detections: u64,
    pub transient_errors: u64,
    pub late_results_discarded: u64,
    pub activations: u64,
    pub keep_alives: u64,
    pub deactivations: u64,
}

impl ScanStats {
    pub fn record_event(&mut self, event: &PresenceEvent) {
        match event {
            PresenceEvent::Activate(_) => self.activations += 1,
            PresenceEvent::KeepAlive(_) => self.keep_alives += 1,
            PresenceEvent::Deactivate => self.deactivations += 1,
        }
    }

    pub fn events(&self) -> u64 {
        self.activations + self.keep_alives + self.deactivations
    }

    /// Share of decode attempts that produced a payload.
    pub fn detection_rate(&self) -> f64 {
        if self.decode_attempts == 0 {
            0.0
        } else {
            self.detections as f64 / self.decode_attempts as f64
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Scan summary: {} ticks, {} decode attempts ({} frames unavailable, {} errors, {} late results discarded), {} detections ({:.1}%), events: {} activate / {} keep-alive / {} deactivate",
            self.ticks,
            self.decode_attempts,
            self.frames_unavailable,
            self.transient_errors,
            self.late_results_discarded,
            self.detections,
            self.detection_rate() * 100.0,
            self.activations,
            self.keep_alives,
            self.deactivations,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_record_event_counts_by_kind() {
        let mut stats = ScanStats::default();
        stats.record_event(&PresenceEvent::Activate("ID-1".into()));
        stats.record_event(&PresenceEvent::KeepAlive("ID-1".into()));
        stats.record_event(&PresenceEvent::KeepAlive("ID-1".into()));
        stats.record_event(&PresenceEvent::Deactivate);
        assert_eq!(stats.activations, 1);
        assert_eq!(stats.keep_alives, 2);
        assert_eq!(stats.deactivations, 1);
        assert_eq!(stats.events(), 4);
    }

    #[test]
    fn test_detection_rate() {
        let stats = ScanStats {
            decode_attempts: 8,
            detections: 2,
            ..ScanStats::default()
        };
        assert_relative_eq!(stats.detection_rate(), 0.25);
        assert_relative_eq!(ScanStats::default().detection_rate(), 0.0);
    }

    #[test]
    fn test_summary_mentions_counters() {
        let stats = ScanStats {
            ticks: 120,
            decode_attempts: 30,
            detections: 15,
            transient_errors: 1,
            ..ScanStats::default()
        };
        let summary = stats.summary();
        assert!(summary.contains("120 ticks"));
        assert!(summary.contains("30 decode attempts"));
        assert!(summary.contains("1 errors"));
        assert!(summary.contains("(50.0%)"));
    }
}
