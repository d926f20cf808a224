//! Stable post identity.
//!
//! The fingerprint is the ledger key, so it must obey one law: the same
//! logical post re-parsed from the catalog on any later run hashes to the
//! same value, and different posts practically never collide. It therefore
//! depends only on identity fields — the scheduled slot, the media
//! references and a bounded prefix of the normalized text — and never on
//! wall-clock time.

use courier_core::Post;
use sha2::{Digest, Sha256};

/// How much of the text participates in the identity. Operators routinely
/// fix typos deep in long posts; the leading chunk identifies the post.
const TEXT_HEAD_CHARS: usize = 200;

/// Compute the fingerprint for `post`, or `None` for a malformed row
/// (missing slot or empty body) that can never be published.
pub fn fingerprint(post: &Post) -> Option<String> {
    let scheduled_at = post.scheduled_at?;
    if post.text.trim().is_empty() {
        return None;
    }

    let head: String = post.text.chars().take(TEXT_HEAD_CHARS).collect();

    let mut hasher = Sha256::new();
    for field in [
        scheduled_at.format("%Y-%m-%d").to_string(),
        scheduled_at.format("%H:%M:%S").to_string(),
        post.photo_url.clone().unwrap_or_default(),
        post.video_url.clone().unwrap_or_default(),
        head,
    ] {
        hasher.update(field.as_bytes());
        // NUL keeps field boundaries unambiguous
        hasher.update([0u8]);
    }

    Some(hex::encode(hasher.finalize()))
}
