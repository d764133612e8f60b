//! Tracks which fields the user touched last.

use chrono::{DateTime, Utc};

use crate::models::FieldId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct EditStamp {
    at: DateTime<Utc>,
    seq: u64,
}

/// Last-edit stamp per field.
///
/// Stamps are ordered by instant and then by call order, and a recorded
/// instant never moves behind the newest one already held, so every
/// `record_edit` makes its field the most recent even with a coarse clock.
#[derive(Debug, Clone, Default)]
pub struct RecencyTracker {
    stamps: [Option<EditStamp>; 3],
    next_seq: u64,
}

impl RecencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_edit(&mut self, field: FieldId, at: DateTime<Utc>) {
        let at = match self.newest() {
            Some(newest) if newest.at > at => newest.at,
            _ => at,
        };
        self.next_seq += 1;
        self.stamps[field.index()] = Some(EditStamp {
            at,
            seq: self.next_seq,
        });
    }

    /// The two most recently edited fields, newest first.
    ///
    /// `None` until at least two distinct fields have been edited.
    pub fn two_most_recent(&self) -> Option<(FieldId, FieldId)> {
        let mut edited: Vec<(EditStamp, FieldId)> = FieldId::ALL
            .iter()
            .filter_map(|field| self.stamps[field.index()].map(|stamp| (stamp, *field)))
            .collect();
        edited.sort_by(|a, b| b.0.cmp(&a.0));

        match edited.as_slice() {
            [first, second, ..] => Some((first.1, second.1)),
            _ => None,
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn last_edited(&self, field: FieldId) -> Option<DateTime<Utc>> {
        self.stamps[field.index()].map(|stamp| stamp.at)
    }

    fn newest(&self) -> Option<EditStamp> {
        self.stamps.iter().flatten().max().copied()
    }
}
