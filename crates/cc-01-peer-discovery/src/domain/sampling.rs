//! Merging and sampling of peer lists returned by `/info/peers`.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;
use shared_types::PeerUrl;
use tracing::debug;

/// Union of several raw peer lists, canonicalized and deduplicated.
/// Entries that do not parse are dropped.
pub fn merge_candidates<I>(lists: I) -> Vec<PeerUrl>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut merged = BTreeSet::new();
    for raw in lists.into_iter().flatten() {
        match PeerUrl::parse(&raw) {
            Ok(url) => {
                merged.insert(url);
            }
            Err(e) => debug!("[cc-01] Dropping unparseable peer address {raw:?}: {e}"),
        }
    }
    merged.into_iter().collect()
}

/// Random subset of at most `size` candidates, without replacement.
pub fn sample_candidates<R>(candidates: &[PeerUrl], size: usize, rng: &mut R) -> Vec<PeerUrl>
where
    R: Rng + ?Sized,
{
    candidates.choose_multiple(rng, size).cloned().collect()
}
