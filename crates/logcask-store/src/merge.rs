//! Background Segment Merge
//!
//! Every rotation schedules a merge pass that collapses the sealed
//! segments into segment `0`, keeping only the newest value per key.
//! The pass is best-effort and idempotent: it re-reads the current file
//! set, bails out when there is nothing to compact, and multiple
//! scheduled passes simply serialize on the engine lock.
//!
//! ## Ordering Guarantees
//!
//! The compaction target is written, flushed, and synced *before* any
//! input file is deleted. A merge that dies half-way therefore leaves a
//! superset of the live data on disk - extra files that the next pass
//! will consume - never a hole. Records whose authoritative copy lives
//! in the still-active segment are left alone; only keys owned by the
//! merge set are repointed at segment 0.
//!
//! The scratch map iterates in arbitrary order, so the record order
//! inside segment 0 after a merge is unspecified. Only per-key
//! correctness matters.

use std::collections::HashMap;

use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use logcask_core::{Entry, Result};

use crate::engine::{RecordLocation, StoreInner};
use crate::segment::{FrameScanner, Segment};

/// Collapse all sealed segments into segment 0.
///
/// Holds the engine's exclusive lock for the entire pass, blocking reads
/// and writes; the rate is bounded by the rotation rate.
pub(crate) async fn merge_segments(inner: &StoreInner) -> Result<()> {
    let mut state = inner.state.write().await;

    let segments = Segment::list(&inner.dir, &inner.config.segment_prefix).await?;
    if segments.len() <= 2 {
        debug!(files = segments.len(), "skipping merge, nothing to compact");
        return Ok(());
    }

    let active = state.out_segment;
    let merge_set: Vec<Segment> = segments
        .into_iter()
        .filter(|segment| segment.id != active)
        .collect();

    // Freshest value per key across the merge set; later segments win
    // because the list is ascending by id.
    let mut merged: HashMap<String, Entry> = HashMap::new();
    for segment in &merge_set {
        let mut scanner = FrameScanner::open(segment).await?;
        while let Some((entry, _)) = scanner.next_frame().await? {
            merged.insert(entry.key.clone(), entry);
        }
    }

    let target = Segment::new(&inner.dir, &inner.config.segment_prefix, 0);
    let mut out = target.open_truncate().await?;
    let mut offset = 0u64;
    for entry in merged.values() {
        let frame = entry.encode();
        out.write_all(&frame).await?;
        if let Some(location) = state.index.get_mut(&entry.key) {
            // A key overwritten in the active segment keeps its slot.
            if location.segment != active {
                *location = RecordLocation { segment: 0, offset };
            }
        }
        offset += frame.len() as u64;
    }
    out.flush().await?;
    out.sync_all().await?;

    // The compacted data is durable; only now drop the inputs.
    for segment in &merge_set {
        if segment.id == 0 {
            continue;
        }
        tokio::fs::remove_file(&segment.path).await?;
        debug!(segment = segment.id, "removed merged segment");
    }

    info!(
        inputs = merge_set.len(),
        keys = merged.len(),
        bytes = offset,
        "segment merge complete"
    );
    Ok(())
}
