//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
///
/// The camelCase names predate this service; the mobile clients wrote
/// these collections directly, so the names are load-bearing.
pub mod collections {
    pub const USERS: &str = "users";
    /// Rolling metric windows (keyed by `{uid}_{metric}`)
    pub const USER_METRICS: &str = "userMetrics";
    /// Challenge run records (keyed by `{uid}_{challenge_id}`)
    pub const CHALLENGE_RUNS: &str = "challengeRuns";
    /// Awarded pets (keyed by `{uid}_{pet_id}`)
    pub const USER_PETS: &str = "userPets";
    pub const STORIES: &str = "stories";
}
