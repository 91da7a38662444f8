//! Last-resort streams used when no provider answers.

use std::collections::HashMap;

use hb_core::{ContentKey, StreamDescriptor};

const SAMPLE_MP4: &str =
    "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4";
const SAMPLE_HLS: &str = "https://test-streams.mux.dev/x36xhzz/x36xhzz.m3u8";

/// Demo streams keyed by raw content id, plus a generic answer for
/// everything else.
#[derive(Debug, Clone)]
pub struct FallbackCatalog {
    demos: HashMap<String, Vec<StreamDescriptor>>,
    generic: Vec<StreamDescriptor>,
}

impl FallbackCatalog {
    pub fn new(demos: HashMap<String, Vec<StreamDescriptor>>, generic: Vec<StreamDescriptor>) -> Self {
        Self { demos, generic }
    }

    /// A catalog that never answers.
    pub fn empty() -> Self {
        Self::new(HashMap::new(), Vec::new())
    }

    pub fn streams_for(&self, key: &ContentKey) -> Vec<StreamDescriptor> {
        self.demos
            .get(&key.id)
            .unwrap_or(&self.generic)
            .clone()
    }
}

impl Default for FallbackCatalog {
    fn default() -> Self {
        let mp4 = StreamDescriptor::new("Hubbio Sample (MP4)", SAMPLE_MP4);
        let hls = StreamDescriptor::new("Hubbio Sample (HLS)", SAMPLE_HLS);
        let demos = HashMap::from([
            ("hubbio:sample-movie".to_owned(), vec![mp4]),
            ("hubbio:sample-hls".to_owned(), vec![hls.clone()]),
        ]);
        Self::new(demos, vec![hls])
    }
}
