use std::collections::HashMap;
use std::sync::Mutex;
use tonfeed_node_types::{BlockId, ShardIdent};

/// Highest handled block per shard lineage.
///
/// Shard chains split and merge, so lineages come and go. A lineage without a
/// watermark has never been seen and everything in it counts as new. The
/// ancestry walk asks [`observe`](Self::observe) to decide where to stop and
/// [`commit`](Self::commit) moves a watermark once a reported tip is fully
/// queued.
#[derive(Default)]
pub struct ShardTracker {
    watermarks: Mutex<HashMap<ShardIdent, u32>>,
}

impl ShardTracker {
    /// Creates a tracker with no watermarks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id` and everything below it as already handled.
    pub fn seed(&self, id: &BlockId) {
        self.watermarks
            .lock()
            .unwrap()
            .insert(id.lineage(), id.seqno);
    }

    /// Whether `id` sits above the watermark of its lineage. Blocks of
    /// unknown lineages are always new.
    pub fn observe(&self, id: &BlockId) -> bool {
        match self.watermarks.lock().unwrap().get(&id.lineage()) {
            Some(watermark) => id.seqno > *watermark,
            None => true,
        }
    }

    /// Advances the watermark of a lineage. Never moves it backwards.
    pub fn commit(&self, lineage: ShardIdent, seqno: u32) {
        let mut watermarks = self.watermarks.lock().unwrap();
        let watermark = watermarks.entry(lineage).or_insert(seqno);
        if seqno > *watermark {
            *watermark = seqno;
        }
    }

    /// Current watermark of a lineage, if it has one.
    pub fn watermark(&self, lineage: &ShardIdent) -> Option<u32> {
        self.watermarks.lock().unwrap().get(lineage).copied()
    }
}
