//! Stable parallel LSD radix sort over a key bit range.
//!
//! Each pass partitions on up to eight key bits: workers histogram
//! their chunk, the histograms are prefix-combined digit-major (then
//! worker-major, which is what makes the scatter stable), and each
//! worker scatters its chunk in order through its reserved cursors.
//! Ping-pong between two buffers, one pass per digit.
//!
//! Destination buffers are atomic cells so workers can scatter through
//! shared references; the reserved cursor ranges are disjoint by
//! construction, so relaxed stores suffice.

use crate::policy::ExecutionPolicy;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

const RADIX_BITS: u32 = 8;

pub(crate) fn radix_sort_pairs(
    policy: &ExecutionPolicy,
    keys: &mut [u64],
    values: &mut [u32],
    start_bit: u32,
    end_bit: u32,
) {
    assert_eq!(keys.len(), values.len(), "key and value lengths differ");
    assert!(
        start_bit < end_bit && end_bit <= 64,
        "invalid sort bit range [{start_bit}, {end_bit})"
    );
    let n = keys.len();
    if n <= 1 {
        return;
    }

    let mut src_k: Vec<AtomicU64> = keys.iter().map(|&k| AtomicU64::new(k)).collect();
    let mut src_v: Vec<AtomicU32> = values.iter().map(|&v| AtomicU32::new(v)).collect();
    let mut dst_k: Vec<AtomicU64> = (0..n).map(|_| AtomicU64::new(0)).collect();
    let mut dst_v: Vec<AtomicU32> = (0..n).map(|_| AtomicU32::new(0)).collect();

    let workers = policy.workers_for(n);
    let chunk = n.div_ceil(workers);
    let chunks = n.div_ceil(chunk);

    let mut shift = start_bit;
    while shift < end_bit {
        let digit_bits = RADIX_BITS.min(end_bit - shift);
        let bins = 1usize << digit_bits;
        let mask = (bins - 1) as u64;

        // Per-worker digit histograms.
        let mut histograms = vec![Vec::new(); chunks];
        std::thread::scope(|scope| {
            let (tx, rx) = crossbeam_channel::bounded(chunks);
            for w in 0..chunks {
                let start = w * chunk;
                let end = (start + chunk).min(n);
                let src_k = &src_k;
                let tx = tx.clone();
                scope.spawn(move || {
                    let mut hist = vec![0usize; bins];
                    for cell in &src_k[start..end] {
                        let digit = ((cell.load(Ordering::Relaxed) >> shift) & mask) as usize;
                        hist[digit] += 1;
                    }
                    tx.send((w, hist)).expect("sort coordinator hung up");
                });
            }
            drop(tx);
            for (w, hist) in rx {
                histograms[w] = hist;
            }
        });

        // Digit-major, then worker-major exclusive offsets: all of digit
        // d's output precedes digit d+1, and within a digit the workers
        // scatter in chunk order. That ordering is the stability proof.
        let mut offsets = vec![vec![0usize; bins]; chunks];
        let mut cursor = 0usize;
        for d in 0..bins {
            for w in 0..chunks {
                offsets[w][d] = cursor;
                cursor += histograms[w][d];
            }
        }

        // Stable scatter through per-worker cursors.
        std::thread::scope(|scope| {
            for (w, cursors) in offsets.into_iter().enumerate() {
                let start = w * chunk;
                let end = (start + chunk).min(n);
                let src_k = &src_k;
                let src_v = &src_v;
                let dst_k = &dst_k;
                let dst_v = &dst_v;
                scope.spawn(move || {
                    let mut cursors = cursors;
                    for i in start..end {
                        let key = src_k[i].load(Ordering::Relaxed);
                        let value = src_v[i].load(Ordering::Relaxed);
                        let digit = ((key >> shift) & mask) as usize;
                        let pos = cursors[digit];
                        cursors[digit] += 1;
                        dst_k[pos].store(key, Ordering::Relaxed);
                        dst_v[pos].store(value, Ordering::Relaxed);
                    }
                });
            }
        });

        std::mem::swap(&mut src_k, &mut dst_k);
        std::mem::swap(&mut src_v, &mut dst_v);
        shift += digit_bits;
    }

    for (out, cell) in keys.iter_mut().zip(&src_k) {
        *out = cell.load(Ordering::Relaxed);
    }
    for (out, cell) in values.iter_mut().zip(&src_v) {
        *out = cell.load(Ordering::Relaxed);
    }
}
