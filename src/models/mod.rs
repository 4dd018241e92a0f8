pub mod anime;
pub mod jikan;
pub mod recommendation;

pub use anime::AnimeRecord;
pub use jikan::{JikanAnime, JikanListResponse, JikanPagination};
pub use recommendation::{
    CatalogStats, Recommendation, RecommendationOptions, RecommendationRequest,
    RecommendationResponse, RecommendedAnime, SeedSet, TrendingResponse, ValidatedRequest,
};
