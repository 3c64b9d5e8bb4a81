//! fincoach-core: data model, slices and derived views for the finance coach

pub mod aggregation;
pub mod error;
pub mod explore;
pub mod month;
pub mod observer;
pub mod reports;
pub mod state;
pub mod store;
pub mod transaction;

pub use aggregation::{
    CategoryRollup, DerivedViews, MonthRollup, Totals, ViewMemo, available_months,
    category_rollup, filter_by_month, month_rollup, top_spending_categories, totals,
};
pub use error::{CoachError, CoachResult};
pub use explore::{
    CategorySelection, GeoPoint, NearbyPlaces, Place, PlaceCategory, PlaceDisplay, PlaceQuery,
    RawPlace, SEARCH_RADIUS_M, TagCondition, TagPredicate, build_query, normalize_place,
    place_display,
};
pub use month::{MonthFilter, MonthKey};
pub use observer::{ChangeKind, Domain, Observers, Resource, SliceEvent, SubscriptionId};
pub use reports::{
    BudgetItem, DataPresence, DateRange, FeedbackItem, FeedbackKind, FeedbackReport,
    FinancialSnapshot, Forecast, ForecastPoint, Severity, Summary, TrendDirection, TrendRecord,
    TrendsReport, UnusualTransaction, UploadReceipt,
};
pub use state::{CachePayload, DomainState, EmptyResultPolicy, FetchStatus};
pub use store::{
    DomainSlice, ExploreSlice, FeedbackSlice, ResourceCell, Store, TransactionList,
    TransactionsSlice, TrendsSlice,
};
pub use transaction::{Transaction, UNCATEGORIZED};
