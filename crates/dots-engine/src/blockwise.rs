//! Block-wise transfer bookkeeping (C2, spec §4.2): Block1/Block2 request
//! and response reassembly, the Q-Block2 NON variant used over lossy paths,
//! duplicate-fragment dropping, and the 10-second grace timer a stalled
//! transfer is allowed before the partial state is discarded.

use dots_codec::BlockValue;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long an in-progress block-wise transfer may sit idle before it is
/// abandoned (spec §4.2: "a transfer with no fragment for 10 seconds is
/// dropped").
pub const TRANSFER_GRACE: Duration = Duration::from_secs(10);

/// Identifies one block-wise transfer: the session plus the token (or
/// message id, for a NON-carried Q-Block2 exchange) correlating its
/// fragments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransferKey {
    /// Owning session.
    pub session: u64,
    /// Correlator: the CoAP token for CON-carried Block1/Block2, or the
    /// message id for Q-Block2 over NON.
    pub correlator: Vec<u8>,
}

/// Reassembly state for one in-progress block-wise transfer.
pub struct Transfer {
    /// Fragments received so far, in block order (gaps are not permitted;
    /// out-of-order arrival is rejected rather than buffered — spec §4.2
    /// does not require reordering support).
    pub fragments: Vec<u8>,
    /// Next expected block number.
    pub next_block: u32,
    /// Negotiated block size exponent.
    pub szx: u8,
    /// `true` if this transfer uses the Q-Block2 NON variant rather than
    /// CON-carried Block1/Block2.
    pub q_block: bool,
    /// Last time a fragment was accepted, for grace-timer expiry.
    pub last_seen: Instant,
}

impl Transfer {
    fn new(szx: u8, q_block: bool) -> Self {
        Self {
            fragments: Vec::new(),
            next_block: 0,
            szx,
            q_block,
            last_seen: Instant::now(),
        }
    }

    /// `true` if this transfer has been idle longer than
    /// [`TRANSFER_GRACE`].
    #[must_use]
    pub fn expired(&self, now: Instant) -> bool {
        now.duration_since(self.last_seen) > TRANSFER_GRACE
    }
}

/// Outcome of feeding one fragment into a [`BlockwiseTracker`].
#[derive(Debug, PartialEq, Eq)]
pub enum FragmentOutcome {
    /// More fragments are expected; nothing to hand upstream yet.
    AwaitingMore,
    /// The same block arrived again (a retransmitted CON before its ACK
    /// was received); the fragment is dropped rather than appended twice
    /// (spec §4.2 "duplicate PDUs are dropped").
    Duplicate,
    /// The fragment was out of sequence; the transfer is abandoned so the
    /// peer can restart it.
    OutOfSequence,
    /// The final fragment arrived; reassembly is complete.
    Complete(Vec<u8>),
}

/// Tracks in-progress block-wise transfers across all sessions.
#[derive(Default)]
pub struct BlockwiseTracker {
    transfers: HashMap<TransferKey, Transfer>,
}

impl BlockwiseTracker {
    /// Builds an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one fragment into the transfer identified by `key`, creating
    /// the transfer on its first block.
    pub fn accept_fragment(
        &mut self,
        key: TransferKey,
        block: BlockValue,
        data: &[u8],
        q_block: bool,
    ) -> FragmentOutcome {
        let now = Instant::now();
        let transfer = self
            .transfers
            .entry(key.clone())
            .or_insert_with(|| Transfer::new(block.szx, q_block));

        if block.num + 1 == transfer.next_block {
            // Retransmission of the block we already accepted.
            return FragmentOutcome::Duplicate;
        }
        if block.num != transfer.next_block {
            self.transfers.remove(&key);
            return FragmentOutcome::OutOfSequence;
        }

        transfer.fragments.extend_from_slice(data);
        transfer.next_block += 1;
        transfer.last_seen = now;

        if block.more {
            FragmentOutcome::AwaitingMore
        } else {
            let transfer = self.transfers.remove(&key).expect("just inserted");
            FragmentOutcome::Complete(transfer.fragments)
        }
    }

    /// Removes every transfer that has exceeded [`TRANSFER_GRACE`],
    /// returning the keys dropped so the caller can notify
    /// `XmitBlockFail` upstream.
    pub fn sweep_expired(&mut self) -> Vec<TransferKey> {
        let now = Instant::now();
        let expired: Vec<TransferKey> = self
            .transfers
            .iter()
            .filter(|(_, t)| t.expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            self.transfers.remove(key);
        }
        expired
    }

    /// `true` if `key` names a live, in-progress transfer.
    #[must_use]
    pub fn is_in_progress(&self, key: &TransferKey) -> bool {
        self.transfers.contains_key(key)
    }

    /// Drops a transfer unconditionally, e.g. on session disconnect.
    pub fn abandon(&mut self, key: &TransferKey) {
        self.transfers.remove(key);
    }
}

/// Splits `payload` into a sequence of [`BlockValue`]/byte-slice pairs no
/// larger than [`BlockValue::MAX_BLOCK_SIZE`], for the server side of a
/// Block2 GET response or a client's Block1 PUT body.
#[must_use]
pub fn fragment(payload: &[u8], szx: u8) -> Vec<(BlockValue, Vec<u8>)> {
    let block_size = 1usize << (4 + szx.min(BlockValue::MAX_SZX));
    if payload.is_empty() {
        return vec![(
            BlockValue {
                num: 0,
                more: false,
                szx,
            },
            Vec::new(),
        )];
    }
    payload
        .chunks(block_size)
        .enumerate()
        .map(|(i, chunk)| {
            let num = i as u32;
            let more = (i + 1) * block_size < payload.len();
            (BlockValue { num, more, szx }, chunk.to_vec())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> TransferKey {
        TransferKey {
            session: 1,
            correlator: vec![0xAB],
        }
    }

    #[test]
    fn single_block_transfer_completes_immediately() {
        let mut tracker = BlockwiseTracker::new();
        let block = BlockValue { num: 0, more: false, szx: 2 };
        let outcome = tracker.accept_fragment(key(), block, b"hello", false);
        assert_eq!(outcome, FragmentOutcome::Complete(b"hello".to_vec()));
    }

    #[test]
    fn two_block_transfer_reassembles_in_order() {
        let mut tracker = BlockwiseTracker::new();
        let b0 = BlockValue { num: 0, more: true, szx: 2 };
        let b1 = BlockValue { num: 1, more: false, szx: 2 };
        assert_eq!(
            tracker.accept_fragment(key(), b0, b"abc", false),
            FragmentOutcome::AwaitingMore
        );
        assert_eq!(
            tracker.accept_fragment(key(), b1, b"def", false),
            FragmentOutcome::Complete(b"abcdef".to_vec())
        );
    }

    #[test]
    fn retransmitted_block_is_flagged_duplicate() {
        let mut tracker = BlockwiseTracker::new();
        let b0 = BlockValue { num: 0, more: true, szx: 2 };
        tracker.accept_fragment(key(), b0, b"abc", false);
        assert_eq!(
            tracker.accept_fragment(key(), b0, b"abc", false),
            FragmentOutcome::Duplicate
        );
    }

    #[test]
    fn skipped_block_abandons_the_transfer() {
        let mut tracker = BlockwiseTracker::new();
        let b0 = BlockValue { num: 0, more: true, szx: 2 };
        let b2 = BlockValue { num: 2, more: false, szx: 2 };
        tracker.accept_fragment(key(), b0, b"abc", false);
        let outcome = tracker.accept_fragment(key(), b2, b"xyz", false);
        assert_eq!(outcome, FragmentOutcome::OutOfSequence);
        assert!(!tracker.is_in_progress(&key()));
    }

    #[test]
    fn fragment_splits_payload_into_blocks() {
        let payload = vec![0u8; 40];
        let blocks = fragment(&payload, 0); // szx=0 => 16-byte blocks
        assert_eq!(blocks.len(), 3);
        assert!(blocks[0].0.more);
        assert!(!blocks[2].0.more);
    }
}
