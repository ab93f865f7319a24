// Core algorithm exports
pub mod audit;
pub mod batch;
pub mod distance;
pub mod geocoder;
pub mod ranker;
pub mod router;
pub mod tier;

pub use audit::{audit, is_empty_value, FilterSchema};
pub use batch::{BatchController, BatchError, BatchStats};
pub use distance::{haversine, passes_prefilter, DEFAULT_PREFILTER_BUFFER};
pub use geocoder::Geocoder;
pub use ranker::{sort_ranked, EngineOptions, EngineStats, FindNearbyError, RankingEngine};
pub use router::{RouteKey, RouteRequest, Router};
pub use tier::{tier_rank, UNRANKED_TIER};
