use crate::editor::Link;
use ahash::AHashMap;
use itertools::Itertools;

/// Index over an editor graph's link table.
///
/// Duplicate link ids are the caller's responsibility; the first entry in
/// table order wins.
pub(super) struct LinkIndex<'a> {
    links: AHashMap<i64, &'a Link>,
}

impl<'a> LinkIndex<'a> {
    pub(super) fn new(table: &'a [Link]) -> Self {
        let duplicates: Vec<i64> = table.iter().map(|l| l.id).duplicates().collect();
        if !duplicates.is_empty() {
            tracing::warn!(
                link_ids = %duplicates.iter().join(", "),
                "Link table contains duplicate ids; using the first entry for each"
            );
        }

        let mut links = AHashMap::with_capacity(table.len());
        for link in table {
            links.entry(link.id).or_insert(link);
        }
        Self { links }
    }

    pub(super) fn resolve(&self, link_id: i64) -> Option<&'a Link> {
        self.links.get(&link_id).copied()
    }
}
