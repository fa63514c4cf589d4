// Copyright 2026 SOMAS contributors
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! The CSV pre/post stage: reading a tensor list off disk, deriving the
//! conflict matrix from lifetime intervals, and writing the solved offsets
//! back out. This sits outside the solver core proper, but ships in this
//! crate so the whole pipeline is exercisable end to end.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::common::{LifelongKind, Lifetime, SomasError, TensorDesc, TensorId};
use crate::implementation::conflict::ConflictModel;

#[derive(Debug, Deserialize)]
struct InputRecord {
    id: usize,
    lower: usize,
    upper: usize,
    size: usize,
}

#[derive(Debug, Serialize)]
struct OutputRecord {
    id: usize,
    lower: usize,
    upper: usize,
    size: usize,
    offset: usize,
}

/// Everything `ingest` parses from a CSV file: the tensors, ready for
/// `solve`, and the conflict matrix derived from their lifetime overlaps.
#[derive(Debug)]
pub struct Ingested {
    pub descriptors: HashMap<TensorId, TensorDesc>,
    pub conflicts: ConflictModel,
    pub lifetimes: HashMap<TensorId, Lifetime>,
}

/// Reads `id,lower,upper,size` records from `path`, and builds the
/// conflict matrix by an O(n²) interval-overlap scan: two tensors conflict
/// (cannot share) iff their `[lower, upper)` lifetimes overlap.
pub fn ingest(path: &str) -> Result<Ingested, SomasError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| SomasError::InputIoFailure {
        path: path.to_string(),
        source,
    })?;

    let mut lifetimes: Vec<(TensorId, Lifetime, usize)> = Vec::new();
    for record in reader.deserialize() {
        let record: InputRecord = record.map_err(|source| SomasError::InputIoFailure {
            path: path.to_string(),
            source,
        })?;
        lifetimes.push((
            TensorId(record.id),
            Lifetime { start: record.lower, end: record.upper },
            record.size,
        ));
    }

    let n = lifetimes.iter().map(|(id, _, _)| id.index() + 1).max().unwrap_or(0);
    let mut conflicts = ConflictModel::new(n);
    for &(i, lifetime_i, _) in &lifetimes {
        for &(j, lifetime_j, _) in &lifetimes {
            if i == j {
                continue;
            }
            if !lifetime_i.overlaps(lifetime_j) {
                conflicts.allow_share(i, j);
            }
        }
    }

    let mut descriptors = HashMap::with_capacity(lifetimes.len());
    let mut lifetime_map = HashMap::with_capacity(lifetimes.len());
    for (id, lifetime, size) in lifetimes {
        let mut desc = TensorDesc::new(id, size, LifelongKind::None);
        desc.num_constraints = conflicts.num_constraints(id);
        descriptors.insert(id, desc);
        lifetime_map.insert(id, lifetime);
    }

    Ok(Ingested { descriptors, conflicts, lifetimes: lifetime_map })
}

/// Writes the solved `descriptors` back out as
/// `$CSV_DIR/mindspore-csv-out/$TRACE_NAME-out.csv`. If either environment
/// variable is unset, this does nothing and logs a warning — not an error
///.
pub fn export(descriptors: &HashMap<TensorId, TensorDesc>, lifetimes: &HashMap<TensorId, Lifetime>) {
    let (Ok(csv_dir), Ok(trace_name)) = (env::var("CSV_DIR"), env::var("TRACE_NAME")) else {
        warn!("one or both environment variables not found (CSV_DIR, TRACE_NAME); skipping csv export");
        return;
    };

    if let Err(err) = export_to(&csv_dir, &trace_name, descriptors, lifetimes) {
        warn!("{err}");
    }
}

fn export_to(
    csv_dir: &str,
    trace_name: &str,
    descriptors: &HashMap<TensorId, TensorDesc>,
    lifetimes: &HashMap<TensorId, Lifetime>,
) -> Result<(), SomasError> {
    let mut path = PathBuf::from(csv_dir);
    path.push("mindspore-csv-out");
    std::fs::create_dir_all(&path).map_err(|source| SomasError::OutputIoFailure {
        path: path.display().to_string(),
        source,
    })?;
    path.push(format!("{trace_name}-out.csv"));

    let mut writer = csv::Writer::from_path(&path).map_err(|err| SomasError::OutputIoFailure {
        path: path.display().to_string(),
        source: std::io::Error::other(err.to_string()),
    })?;

    let mut ids: Vec<&TensorId> = descriptors.keys().collect();
    ids.sort_by_key(|id| id.index());
    for id in ids {
        let desc = &descriptors[id];
        let lifetime = lifetimes.get(id).copied().unwrap_or(Lifetime { start: 0, end: 0 });
        writer
            .serialize(OutputRecord {
                id: id.index(),
                lower: lifetime.start,
                upper: lifetime.end,
                size: desc.size,
                offset: desc.offset.unwrap_or(0),
            })
            .map_err(|err| SomasError::OutputIoFailure {
                path: path.display().to_string(),
                source: std::io::Error::other(err.to_string()),
            })?;
    }
    writer.flush().map_err(|source| SomasError::OutputIoFailure {
        path: path.display().to_string(),
        source,
    })
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
