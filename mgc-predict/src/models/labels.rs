//! Genre label set and output decoding
//!
//! Both classifiers were trained against the same ten classes, in this order.

use crate::error::ModelError;
use serde::{Serialize, Serializer};
use std::fmt;

/// Music genre predicted by the classifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Genre {
    Blues,
    Classical,
    Country,
    Disco,
    HipHop,
    Jazz,
    Metal,
    Pop,
    Reggae,
    Rock,
}

/// Number of genre classes
pub const GENRE_COUNT: usize = 10;

/// Label strings, indexed by class
pub const GENRE_LABELS: [&str; GENRE_COUNT] = [
    "blues",
    "classical",
    "country",
    "disco",
    "hiphop",
    "jazz",
    "metal",
    "pop",
    "reggae",
    "rock",
];

impl Genre {
    /// All genres in class-index order
    pub const ALL: [Genre; GENRE_COUNT] = [
        Genre::Blues,
        Genre::Classical,
        Genre::Country,
        Genre::Disco,
        Genre::HipHop,
        Genre::Jazz,
        Genre::Metal,
        Genre::Pop,
        Genre::Reggae,
        Genre::Rock,
    ];

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        GENRE_LABELS[self.index()]
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Genre {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Map a predicted class index to its genre
pub fn decode_class_index(idx: usize) -> Result<Genre, ModelError> {
    Genre::from_index(idx).ok_or(ModelError::ClassIndexOutOfRange(idx))
}

/// Index of the largest score; the first one wins on ties, NaN is skipped
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &s) in scores.iter().enumerate() {
        if s.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if s <= b => {}
            _ => best = Some((i, s)),
        }
    }
    best.map(|(i, _)| i)
}

/// Decode a vector of per-class scores to the highest-scoring genre
pub fn decode_scores(scores: &[f32]) -> Result<Genre, ModelError> {
    if scores.len() != GENRE_COUNT {
        return Err(ModelError::ScoreCount {
            expected: GENRE_COUNT,
            actual: scores.len(),
        });
    }
    let idx = argmax(scores).ok_or(ModelError::NoFiniteScores)?;
    decode_class_index(idx)
}
