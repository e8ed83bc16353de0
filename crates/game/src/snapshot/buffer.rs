use super::state::Snapshot;

/// The two most recent accepted samples for one entity. Timestamps are
/// strictly increasing from `previous` to `latest`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SnapshotPair {
    previous: Option<Snapshot>,
    latest: Option<Snapshot>,
}

impl SnapshotPair {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `snapshot` only if it is newer than `latest`. Stale and
    /// duplicate samples are ignored and `false` is returned.
    pub fn push(&mut self, snapshot: Snapshot) -> bool {
        match self.latest {
            None => {
                self.latest = Some(snapshot);
                true
            }
            Some(latest) if snapshot.timestamp_ms > latest.timestamp_ms => {
                self.previous = Some(latest);
                self.latest = Some(snapshot);
                true
            }
            Some(_) => false,
        }
    }

    pub fn previous(&self) -> Option<&Snapshot> {
        self.previous.as_ref()
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.latest.as_ref()
    }

    pub fn interpolation_pair(&self) -> Option<(&Snapshot, &Snapshot)> {
        match (&self.previous, &self.latest) {
            (Some(previous), Some(latest)) => Some((previous, latest)),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.previous = None;
        self.latest = None;
    }

    pub fn len(&self) -> usize {
        self.previous.is_some() as usize + self.latest.is_some() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_none()
    }
}
