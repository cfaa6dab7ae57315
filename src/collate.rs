use std::cmp::Ordering;

use icu_collator::{Collator, CollatorOptions};
use icu_locid::locale;

/// Locale-aware ordering for gallery and directory names.
///
/// Names are mostly Chinese, so the `zh` tailoring (pinyin order) is used;
/// Latin names still sort alphabetically under it. Ties fall back to byte
/// order so the output is stable.
pub struct NameOrder {
    collator: Option<Collator>,
}

impl NameOrder {
    pub fn zh() -> Self {
        let collator = match Collator::try_new(&locale!("zh").into(), CollatorOptions::new()) {
            Ok(collator) => Some(collator),
            Err(err) => {
                tracing::warn!(%err, "zh collator unavailable; falling back to root collation");
                Collator::try_new(&Default::default(), CollatorOptions::new()).ok()
            }
        };
        Self { collator }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let primary = match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => Ordering::Equal,
        };
        primary.then_with(|| a.cmp(b))
    }

    pub fn sort_by_key<T>(&self, items: &mut [T], key: impl Fn(&T) -> &str) {
        items.sort_by(|a, b| self.compare(key(a), key(b)));
    }
}

impl std::fmt::Debug for NameOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameOrder")
            .field("collator", &self.collator.is_some())
            .finish()
    }
}
