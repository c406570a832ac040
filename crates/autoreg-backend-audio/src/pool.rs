//! Scoped worker pool for independent batch items.
//!
//! Items are claimed from a shared counter, so the assignment of items to
//! threads varies between runs; results are put back in input order. Work
//! must therefore not depend on which thread runs it.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

/// Number of workers to use when the caller does not specify one.
pub fn default_threads() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Applies `f` to every item on up to `threads` workers.
///
/// Stops claiming new items once any item fails and returns the failure with
/// the lowest index among those that ran.
pub fn try_parallel_map<T, R, E, F>(items: &[T], threads: usize, f: F) -> Result<Vec<R>, E>
where
    T: Sync,
    R: Send,
    E: Send,
    F: Fn(usize, &T) -> Result<R, E> + Sync,
{
    let threads = threads.max(1).min(items.len());
    if threads <= 1 {
        return items.iter().enumerate().map(|(i, item)| f(i, item)).collect();
    }

    let next = AtomicUsize::new(0);
    let failed = AtomicBool::new(false);
    let (tx, rx) = mpsc::channel();

    thread::scope(|scope| {
        for _ in 0..threads {
            let tx = tx.clone();
            let (next, failed, f) = (&next, &failed, &f);
            scope.spawn(move || {
                while !failed.load(Ordering::Relaxed) {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(item) = items.get(index) else {
                        break;
                    };
                    let result = f(index, item);
                    if result.is_err() {
                        failed.store(true, Ordering::Relaxed);
                    }
                    if tx.send((index, result)).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(tx);

    let mut slots: Vec<Option<R>> = (0..items.len()).map(|_| None).collect();
    let mut first_error: Option<(usize, E)> = None;
    for (index, result) in rx {
        match result {
            Ok(value) => slots[index] = Some(value),
            Err(err) => {
                if first_error.as_ref().map_or(true, |(i, _)| index < *i) {
                    first_error = Some((index, err));
                }
            }
        }
    }

    if let Some((_, err)) = first_error {
        return Err(err);
    }
    Ok(slots.into_iter().flatten().collect())
}
