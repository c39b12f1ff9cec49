//! CSV snapshot persistence.
//!
//! The snapshot is a flat rewrite of the merged timeline:
//! `Height,Id,Timestamp,Reward,Pool,Valid,Miner`. Column order is part of
//! the format. On load it seeds the per-pool stores so a later run only has
//! to fetch down to each pool's previously-known top height.
//!
//! Loading is lenient row by row: legacy files may lack the trailing
//! `Valid`/`Miner` columns, rows for pools that are no longer configured are
//! ignored, and a malformed field drops only its own row (the header row
//! falls out the same way, its `Height` cell does not parse). Writing is
//! strict: a snapshot that cannot be created or flushed is a fatal error in
//! batch mode, so a broken file is never left behind silently.

use std::path::Path;

use crate::block::{normalize_timestamp, Block, BlockId};
use crate::error::Result;
use crate::merge::TimelineBlock;

/// Load snapshot rows, grouped per configured source.
///
/// Returns one bucket per entry in `names`, in the same order. A missing
/// file yields empty buckets, not an error: a first-ever run simply has no
/// history yet.
pub fn load(path: &Path, names: &[String]) -> Result<Vec<Vec<Block>>> {
    let mut buckets: Vec<Vec<Block>> = names.iter().map(|_| Vec::new()).collect();

    if !path.exists() {
        tracing::info!(path = %path.display(), "no snapshot to load");
        return Ok(buckets);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut loaded = 0usize;
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable snapshot row");
                skipped += 1;
                continue;
            }
        };

        if record.len() < 5 {
            skipped += 1;
            continue;
        }

        // Rows for pools no longer configured are dropped without comment;
        // they would have no store to live in.
        let Some(index) = names.iter().position(|n| n == &record[4]) else {
            continue;
        };

        let parsed = (
            record[0].parse::<u64>(),
            record[1].parse::<BlockId>(),
            record[2].parse::<u64>(),
            record[3].parse::<u64>(),
        );
        let (Ok(height), Ok(id), Ok(timestamp), Ok(reward)) = parsed else {
            skipped += 1;
            continue;
        };

        let valid = record.get(5).map_or(true, parse_bool);
        let miner = record.get(6).unwrap_or("").to_string();

        buckets[index].push(Block {
            id,
            height,
            timestamp: normalize_timestamp(timestamp),
            reward,
            valid,
            miner,
        });
        loaded += 1;
    }

    tracing::info!(
        path = %path.display(),
        loaded,
        skipped,
        "snapshot loaded"
    );
    Ok(buckets)
}

/// Write the merged timeline back out, replacing the file.
///
/// With `only_valid` set, orphaned blocks are left out of the file (they
/// stay in memory and will be re-merged on the next run).
pub fn write(path: &Path, timeline: &[TimelineBlock], only_valid: bool) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Height", "Id", "Timestamp", "Reward", "Pool", "Valid", "Miner"])?;

    let mut written = 0usize;
    for entry in timeline {
        if only_valid && !entry.valid {
            continue;
        }
        writer.write_record([
            entry.height.to_string().as_str(),
            entry.id.to_string().as_str(),
            entry.timestamp.to_string().as_str(),
            entry.reward.to_string().as_str(),
            entry.pool.as_str(),
            if entry.valid { "true" } else { "false" },
            entry.miner.as_str(),
        ])?;
        written += 1;
    }
    writer.flush()?;

    tracing::info!(path = %path.display(), written, "snapshot written");
    Ok(())
}

/// Bool parsing matching the snapshot's historical tolerance: the usual
/// one-letter and numeric spellings are accepted, anything else reads as
/// false.
fn parse_bool(s: &str) -> bool {
    matches!(s, "1" | "t" | "T" | "true" | "True" | "TRUE")
}
