//! Per-kind worker pool

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;

use tracing::{error, info};

use super::{Stage, TransferReport};
use crate::{Error, Kind, Result};

/// What one pool task works on: an entity kind or a record kind.
pub(crate) trait WorkUnit: Copy + Ord + fmt::Display + Send + Sync {
    /// Wrap a failure of this unit's pass.
    fn failed(self, source: Error) -> Error;
}

impl WorkUnit for Kind {
    fn failed(self, source: Error) -> Error {
        Error::KindFailed {
            kind: self,
            source: Box::new(source),
        }
    }
}

type Outcome<K, T> = (K, Result<(usize, T)>);

/// Run `work` once per unit on at most `workers` threads.
///
/// Every unit is attempted. Completion and failure are logged per unit;
/// afterwards the first failure in unit order is returned.
pub(crate) fn run<K, T, F>(
    stage: Stage,
    kinds: &[K],
    workers: usize,
    work: F,
) -> Result<(TransferReport<K>, BTreeMap<K, T>)>
where
    K: WorkUnit,
    T: Send,
    F: Fn(K) -> Result<(usize, T)> + Sync,
{
    let next = AtomicUsize::new(0);
    let outcomes: Mutex<Vec<Outcome<K, T>>> = Mutex::new(Vec::with_capacity(kinds.len()));
    let threads = workers.clamp(1, kinds.len().max(1));

    thread::scope(|scope| {
        for _ in 0..threads {
            scope.spawn(|| {
                loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(&kind) = kinds.get(index) else {
                        break;
                    };
                    let outcome = work(kind);
                    match &outcome {
                        Ok((count, _)) => {
                            info!("{stage} {kind}: finished ({} {count})", stage.verb())
                        }
                        Err(e) => error!("{stage} {kind}: failed: {e}"),
                    }
                    outcomes
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push((kind, outcome));
                }
            });
        }
    });

    let mut outcomes = outcomes.into_inner().unwrap_or_else(PoisonError::into_inner);
    outcomes.sort_by_key(|(kind, _)| *kind);

    let mut report = TransferReport::new(stage);
    let mut values = BTreeMap::new();
    let mut failure = None;
    for (kind, outcome) in outcomes {
        match outcome {
            Ok((count, value)) => {
                report.counts.insert(kind, count);
                values.insert(kind, value);
            }
            Err(source) => {
                failure.get_or_insert_with(|| kind.failed(source));
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok((report, values)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_runs_once() {
        let calls = AtomicUsize::new(0);
        let (report, values) = run(Stage::Export, &Kind::ALL, 4, |kind| {
            calls.fetch_add(1, Ordering::Relaxed);
            Ok((1, kind.folder().len()))
        })
        .unwrap();

        assert_eq!(calls.load(Ordering::Relaxed), Kind::ALL.len());
        assert_eq!(report.total(), Kind::ALL.len());
        assert_eq!(values[&Kind::Viewers], "Viewers".len());
    }

    #[test]
    fn first_failure_in_kind_order_is_returned() {
        let calls = AtomicUsize::new(0);
        let result = run(Stage::Import, &Kind::ALL, 3, |kind| {
            calls.fetch_add(1, Ordering::Relaxed);
            match kind {
                Kind::Viewers | Kind::Dialogs => Err(Error::unsupported(kind, "test")),
                _ => Ok((0, ())),
            }
        });

        assert_eq!(calls.load(Ordering::Relaxed), Kind::ALL.len());
        match result {
            Err(Error::KindFailed { kind, .. }) => assert_eq!(kind, Kind::Dialogs),
            other => panic!("expected kind failure, got {other:?}"),
        }
    }

    #[test]
    fn no_kinds_yields_empty_report() {
        let (report, values) = run(Stage::Delete, &[] as &[Kind], 8, |_| Ok((1, ()))).unwrap();
        assert_eq!(report.total(), 0);
        assert!(values.is_empty());
    }
}
