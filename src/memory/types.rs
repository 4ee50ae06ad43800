//! Core food-memory type definitions.
//!
//! Defines [`MemoryRecord`] (one pinned dish), [`Coordinate`] (where it was
//! eaten), [`Rating`] (1–5 stars), [`ImageRef`] (local photo bytes or an
//! uploaded URL), and [`SyncStatus`] (whether the server knows about it).

use chrono::{DateTime, SubsecRound, Utc};

/// Lowest star rating a memory can carry.
pub const MIN_RATING: u8 = 1;
/// Highest star rating a memory can carry.
pub const MAX_RATING: u8 = 5;
/// Rating given to new memories when the user picks none.
pub const DEFAULT_RATING: u8 = 3;

/// Whether a record has been confirmed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncStatus {
    /// Returned by the server (fetch or add); carries a server-assigned id.
    #[default]
    Synced,
    /// Created locally and not yet accepted by the server.
    PendingAdd,
}

impl SyncStatus {
    /// Wire-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::PendingAdd => "pending_add",
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "synced" => Ok(Self::Synced),
            "pending_add" => Ok(Self::PendingAdd),
            _ => Err(format!("unknown sync status: {s}")),
        }
    }
}

/// A star rating in `[MIN_RATING, MAX_RATING]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rating(u8);

impl Rating {
    /// Returns `None` if `stars` is outside 1–5.
    pub fn new(stars: u8) -> Option<Self> {
        (MIN_RATING..=MAX_RATING).contains(&stars).then_some(Self(stars))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Rating {
    fn default() -> Self {
        Self(DEFAULT_RATING)
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.0, MAX_RATING)
    }
}

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Returns `None` unless latitude is in [-90, 90] and longitude in [-180, 180].
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let coordinate = Self {
            latitude,
            longitude,
        };
        coordinate.is_valid().then_some(coordinate)
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// The photo attached to a memory. At most one form is authoritative at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageRef {
    /// Raw photo bytes held on the device, before upload. Never serialized.
    Local(Vec<u8>),
    /// URL or path assigned by the server after upload.
    Remote(String),
}

impl ImageRef {
    /// The uploaded URL, if this reference has one.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Remote(url) => Some(url),
            Self::Local(_) => None,
        }
    }
}

/// A food memory: one dish, where and when it was eaten, and how it was.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRecord {
    /// Server id, or a client-generated UUID v4 for records not yet synced.
    pub id: String,
    /// Dish name.
    pub name: String,
    /// Creation time, set once.
    pub date_added: DateTime<Utc>,
    /// Free-form notes, empty by default.
    pub notes: String,
    pub rating: Rating,
    pub coordinate: Coordinate,
    pub image: Option<ImageRef>,
    pub sync_status: SyncStatus,
}

impl MemoryRecord {
    /// Create a new local record with a provisional id and the current time.
    ///
    /// The timestamp is truncated to microseconds, the finest precision
    /// the memory server stores.
    pub fn new(name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            date_added: Utc::now().trunc_subsecs(6),
            notes: String::new(),
            rating: Rating::default(),
            coordinate,
            image: None,
            sync_status: SyncStatus::PendingAdd,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_rating(mut self, rating: Rating) -> Self {
        self.rating = rating;
        self
    }

    /// A record is complete once it has a non-blank dish name.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// The uploaded photo URL, if any.
    pub fn image_url(&self) -> Option<&str> {
        self.image.as_ref().and_then(ImageRef::url)
    }

    pub fn is_pending(&self) -> bool {
        self.sync_status == SyncStatus::PendingAdd
    }
}
