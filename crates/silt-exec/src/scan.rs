//! Two-phase parallel scan and reduce.
//!
//! The multi-threaded paths follow the classic shape: each worker
//! combines its own contiguous chunk (phase one), the per-chunk totals
//! are prefix-combined across workers, and each worker then folds its
//! chunk's incoming prefix into its local results (phase two). Worker
//! partials travel back over a channel; the scope join between phases
//! is the completion barrier.

use crate::policy::ExecutionPolicy;

/// Inclusive vs. exclusive prefix semantics.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    Inclusive,
    Exclusive,
}

pub(crate) fn scan<T, F>(
    policy: &ExecutionPolicy,
    input: &[T],
    output: &mut [T],
    identity: T,
    op: F,
    kind: Kind,
) where
    T: Copy + Send + Sync,
    F: Fn(T, T) -> T + Sync,
{
    assert_eq!(
        input.len(),
        output.len(),
        "scan input and output lengths differ"
    );
    let n = input.len();
    if n == 0 {
        return;
    }
    let workers = policy.workers_for(n);
    if workers == 1 {
        scan_serial(input, output, identity, &op, kind);
        return;
    }

    let chunk = n.div_ceil(workers);
    let chunks = n.div_ceil(chunk);
    let mut totals = vec![identity; chunks];

    // Phase one: local scan per worker, totals reported over a channel.
    let op_ref = &op;
    std::thread::scope(|scope| {
        let (tx, rx) = crossbeam_channel::bounded(chunks);
        for (w, (in_chunk, out_chunk)) in input
            .chunks(chunk)
            .zip(output.chunks_mut(chunk))
            .enumerate()
        {
            let tx = tx.clone();
            scope.spawn(move || {
                let mut running = identity;
                match kind {
                    Kind::Inclusive => {
                        for (o, &i) in out_chunk.iter_mut().zip(in_chunk) {
                            running = op_ref(running, i);
                            *o = running;
                        }
                    }
                    Kind::Exclusive => {
                        for (o, &i) in out_chunk.iter_mut().zip(in_chunk) {
                            *o = running;
                            running = op_ref(running, i);
                        }
                    }
                }
                tx.send((w, running)).expect("scan coordinator hung up");
            });
        }
        drop(tx);
        for (w, total) in rx {
            totals[w] = total;
        }
    });

    // Cross-worker prefix over the per-chunk totals.
    let mut offsets = vec![identity; chunks];
    let mut acc = identity;
    for w in 0..chunks {
        offsets[w] = acc;
        acc = op(acc, totals[w]);
    }

    // Phase two: fold each chunk's incoming prefix into its results.
    std::thread::scope(|scope| {
        for (w, out_chunk) in output.chunks_mut(chunk).enumerate() {
            if w == 0 {
                continue;
            }
            let prefix = offsets[w];
            scope.spawn(move || {
                for o in out_chunk.iter_mut() {
                    *o = op_ref(prefix, *o);
                }
            });
        }
    });
}

fn scan_serial<T, F>(input: &[T], output: &mut [T], identity: T, op: &F, kind: Kind)
where
    T: Copy,
    F: Fn(T, T) -> T,
{
    let mut running = identity;
    match kind {
        Kind::Inclusive => {
            for (o, &i) in output.iter_mut().zip(input) {
                running = op(running, i);
                *o = running;
            }
        }
        Kind::Exclusive => {
            for (o, &i) in output.iter_mut().zip(input) {
                *o = running;
                running = op(running, i);
            }
        }
    }
}

pub(crate) fn reduce<T, F>(policy: &ExecutionPolicy, input: &[T], identity: T, op: F) -> T
where
    T: Copy + Send + Sync,
    F: Fn(T, T) -> T + Sync,
{
    let n = input.len();
    if n == 0 {
        return identity;
    }
    let workers = policy.workers_for(n);
    if workers == 1 {
        return input.iter().fold(identity, |acc, &v| op(acc, v));
    }

    let chunk = n.div_ceil(workers);
    let chunks = n.div_ceil(chunk);
    let mut partials = vec![identity; chunks];
    let op_ref = &op;
    std::thread::scope(|scope| {
        let (tx, rx) = crossbeam_channel::bounded(chunks);
        for (w, in_chunk) in input.chunks(chunk).enumerate() {
            let tx = tx.clone();
            scope.spawn(move || {
                let partial = in_chunk.iter().fold(identity, |acc, &v| op_ref(acc, v));
                tx.send((w, partial)).expect("reduce coordinator hung up");
            });
        }
        drop(tx);
        for (w, partial) in rx {
            partials[w] = partial;
        }
    });
    // Fold partials in worker order so non-commutative slip-ups in
    // caller operators still surface deterministically in tests.
    partials.into_iter().fold(identity, |acc, v| op(acc, v))
}
