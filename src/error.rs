//! Error types for solver input

use thiserror::Error;

/// A layout graph that cannot be solved as given
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("layout graph has no rooms")]
    Empty,

    #[error("duplicate room id '{id}'")]
    DuplicateRoom { id: String },

    #[error("edge {room_a} -- {room_b} references unknown room '{missing}'")]
    UnknownRoom {
        room_a: String,
        room_b: String,
        missing: String,
        suggestions: Vec<String>,
    },

    #[error("anchor room '{id}' is not in the graph")]
    UnknownAnchor { id: String, suggestions: Vec<String> },

    #[error("room '{id}' has an edge to itself")]
    SelfLoop { id: String },

    #[error("room '{id}' has invalid target area {area}")]
    InvalidArea { id: String, area: f64 },

    #[error("room '{id}' has invalid aspect ratio range [{min}, {max}]")]
    InvalidAspectRange { id: String, min: f64, max: f64 },

    #[error("room '{id}' has invalid minimum dimension {value}")]
    InvalidMinDimension { id: String, value: f64 },

    #[error("edge {room_a} -- {room_b} has negative weight {weight}")]
    NegativeWeight {
        room_a: String,
        room_b: String,
        weight: f64,
    },
}

impl GraphError {
    pub fn unknown_room(
        room_a: impl Into<String>,
        room_b: impl Into<String>,
        missing: impl Into<String>,
        suggestions: Vec<String>,
    ) -> Self {
        Self::UnknownRoom {
            room_a: room_a.into(),
            room_b: room_b.into(),
            missing: missing.into(),
            suggestions,
        }
    }

    pub fn invalid_area(id: impl Into<String>, area: f64) -> Self {
        Self::InvalidArea {
            id: id.into(),
            area,
        }
    }

    /// Similar room ids, if the error is a dangling reference
    pub fn suggestions(&self) -> Option<&[String]> {
        match self {
            Self::UnknownRoom { suggestions, .. } => Some(suggestions),
            Self::UnknownAnchor { suggestions, .. } => Some(suggestions),
            _ => None,
        }
    }

    /// Room the error is about, when there is a single one
    pub fn room_id(&self) -> Option<&str> {
        match self {
            Self::Empty | Self::NegativeWeight { .. } => None,
            Self::UnknownRoom { missing, .. } => Some(missing.as_str()),
            Self::DuplicateRoom { id }
            | Self::UnknownAnchor { id, .. }
            | Self::SelfLoop { id }
            | Self::InvalidArea { id, .. }
            | Self::InvalidAspectRange { id, .. }
            | Self::InvalidMinDimension { id, .. } => Some(id.as_str()),
        }
    }
}

/// Errors loading configuration or graph files
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid setting '{key}': {reason}")]
    Invalid { key: String, reason: String },

    #[error("room category '{category}' has a degenerate template")]
    InvalidTemplate { category: String },
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
