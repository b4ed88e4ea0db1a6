// Header row -> semantic column indices.
// A header matches a key when its lowercase form contains the key's alias. Keys are
// tried in a fixed order, so a header maps to at most one key; the first header that
// matches a key wins.

/// Eight semantic columns: four per side of the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKey {
    ActiveDealer,
    ActiveService,
    ActiveUsers,
    ActiveZone,
    ExpiredDealer,
    ExpiredService,
    ExpiredUsers,
    ExpiredZone,
}

impl ColumnKey {
    /// Matching order.
    pub const ALL: [ColumnKey; 8] = [
        ColumnKey::ActiveDealer,
        ColumnKey::ActiveService,
        ColumnKey::ActiveUsers,
        ColumnKey::ActiveZone,
        ColumnKey::ExpiredDealer,
        ColumnKey::ExpiredService,
        ColumnKey::ExpiredUsers,
        ColumnKey::ExpiredZone,
    ];

    pub fn alias(self) -> &'static str {
        match self {
            ColumnKey::ActiveDealer => "a-dealers",
            ColumnKey::ActiveService => "a-service",
            ColumnKey::ActiveUsers => "active users",
            ColumnKey::ActiveZone => "a-zone",
            ColumnKey::ExpiredDealer => "e-dealers",
            ColumnKey::ExpiredService => "e-service",
            ColumnKey::ExpiredUsers => "expired users",
            ColumnKey::ExpiredZone => "e-zone",
        }
    }
}

/// Column positions of one side (dealer, service, zone, count).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideColumns {
    pub dealer: usize,
    pub service: usize,
    pub zone: usize,
    pub count: usize,
}

/// Zero-based index per key; `None` when no header matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnIndices {
    pub active_dealer: Option<usize>,
    pub active_service: Option<usize>,
    pub active_users: Option<usize>,
    pub active_zone: Option<usize>,
    pub expired_dealer: Option<usize>,
    pub expired_service: Option<usize>,
    pub expired_users: Option<usize>,
    pub expired_zone: Option<usize>,
}

impl ColumnIndices {
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        let mut indices = ColumnIndices::default();
        for (index, header) in headers.iter().enumerate() {
            let normalized = header.as_ref().trim().to_lowercase();
            let Some(key) = ColumnKey::ALL
                .into_iter()
                .find(|key| normalized.contains(key.alias()))
            else {
                continue;
            };
            let slot = indices.slot_mut(key);
            if slot.is_none() {
                *slot = Some(index);
            }
        }
        indices
    }

    pub fn get(&self, key: ColumnKey) -> Option<usize> {
        match key {
            ColumnKey::ActiveDealer => self.active_dealer,
            ColumnKey::ActiveService => self.active_service,
            ColumnKey::ActiveUsers => self.active_users,
            ColumnKey::ActiveZone => self.active_zone,
            ColumnKey::ExpiredDealer => self.expired_dealer,
            ColumnKey::ExpiredService => self.expired_service,
            ColumnKey::ExpiredUsers => self.expired_users,
            ColumnKey::ExpiredZone => self.expired_zone,
        }
    }

    fn slot_mut(&mut self, key: ColumnKey) -> &mut Option<usize> {
        match key {
            ColumnKey::ActiveDealer => &mut self.active_dealer,
            ColumnKey::ActiveService => &mut self.active_service,
            ColumnKey::ActiveUsers => &mut self.active_users,
            ColumnKey::ActiveZone => &mut self.active_zone,
            ColumnKey::ExpiredDealer => &mut self.expired_dealer,
            ColumnKey::ExpiredService => &mut self.expired_service,
            ColumnKey::ExpiredUsers => &mut self.expired_users,
            ColumnKey::ExpiredZone => &mut self.expired_zone,
        }
    }

    /// Highest mapped index across all keys; rows shorter than this + 1 are malformed.
    pub fn max_index(&self) -> Option<usize> {
        ColumnKey::ALL.into_iter().filter_map(|k| self.get(k)).max()
    }

    pub fn mapped_count(&self) -> usize {
        ColumnKey::ALL
            .into_iter()
            .filter(|k| self.get(*k).is_some())
            .count()
    }

    /// Active-side columns, if all four are mapped.
    pub fn active_side(&self) -> Option<SideColumns> {
        Some(SideColumns {
            dealer: self.active_dealer?,
            service: self.active_service?,
            zone: self.active_zone?,
            count: self.active_users?,
        })
    }

    /// Expired-side columns, if all four are mapped.
    pub fn expired_side(&self) -> Option<SideColumns> {
        Some(SideColumns {
            dealer: self.expired_dealer?,
            service: self.expired_service?,
            zone: self.expired_zone?,
            count: self.expired_users?,
        })
    }
}
