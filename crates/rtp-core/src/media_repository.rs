use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;
use ue_codec_core::{encode_from_pcm, AudioCodec};

/// A single named clip: canonical PCM samples plus a lazily-filled,
/// per-codec encoded cache. Loading PCM from disk (wav/mp3 via an
/// external resampler) happens outside this crate; `MediaClip` only
/// holds samples already decoded to PCM.
pub struct MediaClip {
    pcm: Vec<i16>,
    encoded: RwLock<HashMap<AudioCodec, Vec<u8>>>,
}

impl MediaClip {
    pub fn new(pcm: Vec<i16>) -> Self {
        Self { pcm, encoded: RwLock::new(HashMap::new()) }
    }

    pub fn is_empty(&self) -> bool {
        self.pcm.is_empty()
    }

    /// Return this clip's bytes encoded for `codec`, encoding and caching
    /// on first use.
    pub fn encoded_for(&self, codec: AudioCodec) -> Vec<u8> {
        if let Some(bytes) = self.encoded.read().get(&codec) {
            return bytes.clone();
        }
        let mut encoded = self.encoded.write();
        encoded
            .entry(codec)
            .or_insert_with(|| {
                debug!(?codec, "encoding clip on first use");
                encode_from_pcm(codec, &self.pcm).unwrap_or_default()
            })
            .clone()
    }
}

/// A collection of clips keyed by name, scoped to one announcement
/// repository (e.g. one IVR's set of prompts).
pub struct MediaRepository {
    clips: HashMap<String, MediaClip>,
}

impl MediaRepository {
    pub fn new() -> Self {
        Self { clips: HashMap::new() }
    }

    pub fn insert(&mut self, name: impl Into<String>, pcm: Vec<i16>) {
        self.clips.insert(name.into(), MediaClip::new(pcm));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clips.get(name).map(|clip| !clip.is_empty()).unwrap_or(false)
    }

    pub fn get(&self, name: &str) -> Option<&MediaClip> {
        self.clips.get(name)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

impl Default for MediaRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_lazily_and_caches() {
        let mut repo = MediaRepository::new();
        repo.insert("welcome", vec![0i16; 160]);
        assert!(repo.contains("welcome"));

        let clip = repo.get("welcome").unwrap();
        let first = clip.encoded_for(AudioCodec::Pcmu);
        let second = clip.encoded_for(AudioCodec::Pcmu);
        assert_eq!(first, second);
        assert_eq!(first.len(), 160);
    }

    #[test]
    fn missing_clip_is_absent() {
        let repo = MediaRepository::new();
        assert!(!repo.contains("nope"));
        assert!(repo.get("nope").is_none());
    }

    #[test]
    fn empty_pcm_clip_does_not_count_as_present() {
        let mut repo = MediaRepository::new();
        repo.insert("silence", Vec::new());
        assert!(!repo.contains("silence"));
    }
}
