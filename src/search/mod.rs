//! Query side of the manual search: indexing structures, synonym expansion,
//! tier blending, deduplication, and the session that ties them together.

pub(crate) mod blend;
pub(crate) mod dedup;
pub(crate) mod index;
pub(crate) mod paginate;
pub(crate) mod session;
pub(crate) mod synonyms;
pub(crate) mod tokenize;

pub use blend::{BlendPolicy, MatchOrigin, MergeKind, ScoreBoard, Tier};
pub use dedup::deduplicate;
pub use index::{Combine, Fuzziness, IndexBuilder, LookupOptions, TextIndex};
pub use paginate::{DEFAULT_PAGE_SIZE, Page, paginate};
pub use session::{FULL_TEXT_THRESHOLD, SearchOptions, SearchOutcome, SearchSession, TierStatus};
pub use synonyms::{Expansion, expand_query};
