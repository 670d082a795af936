use log::debug;
use tokio_util::sync::CancellationToken;

use super::Block;
use super::validator::meets_difficulty;

/// Perform Proof-of-Work by finding a nonce that yields a hash
/// starting with `difficulty` leading zeros (in hex).
///
/// The search restarts from nonce 0 and leaves the winning nonce on
/// `block`. The stored `hash` is left alone; the caller decides whether
/// the result gets admitted.
pub fn seal(block: &mut Block, difficulty: u32) -> String {
    block.nonce = 0;
    loop {
        let hash = block.compute_hash();
        if meets_difficulty(&hash, difficulty) {
            return hash;
        }
        block.nonce = block.nonce.wrapping_add(1);
    }
}

/// Same search as [`seal`], but gives up as soon as `cancel` fires.
/// Returns `None` when the search was abandoned.
pub fn seal_cancellable(
    block: &mut Block,
    difficulty: u32,
    cancel: &CancellationToken,
) -> Option<String> {
    block.nonce = 0;
    loop {
        if cancel.is_cancelled() {
            debug!(
                "POW - search for block #{} cancelled at nonce {}",
                block.index, block.nonce
            );
            return None;
        }
        let hash = block.compute_hash();
        if meets_difficulty(&hash, difficulty) {
            return Some(hash);
        }
        block.nonce = block.nonce.wrapping_add(1);
    }
}
