use std::{fmt, str::FromStr};

use snafu::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    Track,
    Album,
    Playlist,
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefKind::Track => "track",
            RefKind::Album => "album",
            RefKind::Playlist => "playlist",
        };

        f.write_str(name)
    }
}

#[derive(Snafu, Debug, Clone, PartialEq, Eq)]
pub enum ParseTrackRefError {
    #[snafu(display("'{uri}' is not a <scheme>:<kind>:<id> reference"))]
    Malformed { uri: String },
    #[snafu(display("'{uri}' has an unsupported kind '{kind}'"))]
    UnsupportedKind { uri: String, kind: String },
}

/// A link to something playable: a single track, or an album or playlist
/// that expands into tracks.
///
/// Accepted shapes are `<scheme>:track:<id>`, `<scheme>:album:<id>`,
/// `<scheme>:playlist:<id>` and `<scheme>:user:<name>:playlist:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackRef {
    uri: String,
    kind: RefKind,
}

impl TrackRef {
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn kind(&self) -> RefKind {
        self.kind
    }

    pub fn is_track(&self) -> bool {
        self.kind == RefKind::Track
    }
}

impl FromStr for TrackRef {
    type Err = ParseTrackRefError;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        let uri = uri.trim();
        let parts: Vec<&str> = uri.split(':').collect();

        if parts.len() < 3 || parts.iter().any(|part| part.is_empty()) {
            return MalformedSnafu { uri }.fail();
        }

        let kind = match (parts[1], parts.len()) {
            ("track", 3) => RefKind::Track,
            ("album", 3) => RefKind::Album,
            ("playlist", 3) => RefKind::Playlist,
            ("user", 5) if parts[3] == "playlist" => RefKind::Playlist,
            ("track" | "album" | "playlist" | "user", _) => {
                return MalformedSnafu { uri }.fail();
            }
            (kind, _) => return UnsupportedKindSnafu { uri, kind }.fail(),
        };

        Ok(Self {
            uri: uri.to_string(),
            kind,
        })
    }
}

impl TryFrom<String> for TrackRef {
    type Error = ParseTrackRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TrackRef> for String {
    fn from(value: TrackRef) -> Self {
        value.uri
    }
}

impl fmt::Display for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}
