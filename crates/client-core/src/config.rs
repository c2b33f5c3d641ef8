use serde::{Deserialize, Serialize};

/// Every tunable numeric default spec.md names, collected into one
/// struct so the external admin surface can load it from file/env and
/// hand it to the core as a value. This crate never reads the file or
/// environment itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub t1_timer_ms: u64,
    pub retx_max: u32,
    pub media_start_port: u16,
    pub media_end_port: u16,
    pub dtmf_packets_count: usize,
    pub answer_delay_ms: u64,
    pub session_drop_delay_sec: u64,
    pub in_dialog_probing_sec: u64,
    pub max_call_duration_sec: u64,
    pub min_max_forwards: u8,
    pub allowed_methods: String,
    pub multipart_boundary: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            t1_timer_ms: 500,
            retx_max: 5,
            media_start_port: 7001,
            media_end_port: 57000,
            dtmf_packets_count: 3,
            answer_delay_ms: 20,
            session_drop_delay_sec: 4,
            in_dialog_probing_sec: 60,
            max_call_duration_sec: 7200,
            min_max_forwards: 0,
            allowed_methods: "INVITE, PRACK, ACK, CANCEL, BYE, OPTIONS, UPDATE, INFO, NOTIFY, MESSAGE".to_string(),
            multipart_boundary: "unique-boundary-1".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_constants() {
        let config = CoreConfig::default();
        assert_eq!(config.t1_timer_ms, 500);
        assert_eq!(config.retx_max, 5);
        assert_eq!(config.media_start_port, 7001);
        assert_eq!(config.media_end_port, 57000);
        assert_eq!(config.max_call_duration_sec, 7200);
    }

    #[test]
    fn round_trips_through_json() {
        let config = CoreConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let restored: CoreConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.media_start_port, config.media_start_port);
    }
}
