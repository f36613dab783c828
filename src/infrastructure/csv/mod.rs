// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// CSV decoding, parsing and column statistics

mod stats_extractor;

pub use stats_extractor::StatsExtractor;
