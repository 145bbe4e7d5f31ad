use mongodb::error::Error as MongoError;
use thiserror::Error;

/// Result alias for MongoDB store operations.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures of the MongoDB identity and team store.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// `MONGO_URI` could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// Rejected URI.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The driver refused the client options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The database never answered while connecting.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Pings sent.
        attempts: u32,
        /// Error of the last ping.
        #[source]
        source: MongoError,
    },
    /// A health check ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A unique index could not be created.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection name.
        collection: &'static str,
        /// Index name.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Reading an identity failed.
    #[error("failed to load identity `{handle}`")]
    LoadIdentity {
        /// Messenger handle looked up.
        handle: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Checking a nickname failed.
    #[error("failed to look up nickname `{nickname}`")]
    LookupNickname {
        /// Nickname checked.
        nickname: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Inserting an identity failed.
    #[error("failed to save identity `{handle}`")]
    SaveIdentity {
        /// Messenger handle being registered.
        handle: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A unique index rejected the identity.
    #[error("identity `{handle}` or nickname `{nickname}` already exists")]
    DuplicateIdentity {
        /// Messenger handle being registered.
        handle: String,
        /// Requested nickname.
        nickname: String,
    },
    /// The catalog query failed.
    #[error("failed to query teams")]
    QueryTeams {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Reading a team failed.
    #[error("failed to load team `{id}`")]
    LoadTeam {
        /// Team id.
        id: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A stored document does not map onto the domain model.
    #[error("document `{id}` in `{collection}` is malformed: {reason}")]
    Malformed {
        /// Collection name.
        collection: &'static str,
        /// Document id.
        id: String,
        /// What is wrong with it.
        reason: String,
    },
}
