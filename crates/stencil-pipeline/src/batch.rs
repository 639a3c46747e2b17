//! Batch tracing over multiple images with a shared configuration.
//!
//! Items are independent: each gets its own `Result`, and one failing
//! image never aborts its siblings. Work is distributed over a bounded
//! pool of scoped threads pulling from a shared index, so a batch of
//! mixed canvas sizes stays balanced.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

use crate::types::{RgbaImage, TraceConfig, TraceError, TraceResult};

/// Maximum number of images accepted per batch call. Matches the
/// original service's per-request file limit.
pub const MAX_BATCH_SIZE: usize = 10;

/// Trace a batch of images, returning one outcome per input in order.
///
/// At most `max_workers` threads run concurrently (clamped to
/// `1..=MAX_BATCH_SIZE` and to the batch length). Inputs beyond
/// [`MAX_BATCH_SIZE`] get an individual
/// [`TraceError::BatchExceeded`] outcome while the first
/// [`MAX_BATCH_SIZE`] items still process normally.
#[must_use]
pub fn process_batch(
    images: &[RgbaImage],
    config: &TraceConfig,
    max_workers: usize,
) -> Vec<Result<TraceResult, TraceError>> {
    let accepted = images.len().min(MAX_BATCH_SIZE);
    let workers = max_workers.clamp(1, MAX_BATCH_SIZE).min(accepted.max(1));

    let next = AtomicUsize::new(0);
    let (sender, receiver) = mpsc::channel::<(usize, Result<TraceResult, TraceError>)>();

    std::thread::scope(|scope| {
        for _ in 0..workers {
            let sender = sender.clone();
            let next = &next;
            scope.spawn(move || {
                loop {
                    let i = next.fetch_add(1, Ordering::Relaxed);
                    if i >= accepted {
                        break;
                    }
                    let outcome = crate::process(&images[i], config);
                    if sender.send((i, outcome)).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(sender);

    let mut outcomes: Vec<Option<Result<TraceResult, TraceError>>> =
        (0..images.len()).map(|_| None).collect();
    for (i, outcome) in receiver {
        outcomes[i] = Some(outcome);
    }
    for slot in outcomes.iter_mut().skip(MAX_BATCH_SIZE) {
        *slot = Some(Err(TraceError::BatchExceeded {
            limit: MAX_BATCH_SIZE,
        }));
    }

    outcomes
        .into_iter()
        .map(|slot| slot.unwrap_or(Err(TraceError::BatchWorkerLost)))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Dimensions;

    fn square_image(size: u32) -> RgbaImage {
        RgbaImage::from_fn(size, size, |x, y| {
            let inside = x >= size / 4 && x < 3 * size / 4 && y >= size / 4 && y < 3 * size / 4;
            if inside {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        })
    }

    fn config() -> TraceConfig {
        TraceConfig {
            turdsize: 0,
            opttolerance: 0.0,
            ..TraceConfig::default()
        }
    }

    #[test]
    fn outcomes_keep_input_order() {
        let images = vec![square_image(16), square_image(32), square_image(64)];
        let outcomes = process_batch(&images, &config(), 2);
        assert_eq!(outcomes.len(), 3);
        for (i, expected) in [16, 32, 64].iter().enumerate() {
            let result = outcomes[i].as_ref().unwrap();
            assert_eq!(result.dimensions, Dimensions::new(*expected, *expected));
        }
    }

    #[test]
    fn one_failure_does_not_abort_siblings() {
        let images = vec![square_image(16), RgbaImage::new(0, 0), square_image(16)];
        let outcomes = process_batch(&images, &config(), 3);
        assert!(outcomes[0].is_ok());
        assert_eq!(outcomes[1], Err(TraceError::EmptyCanvas));
        assert!(outcomes[2].is_ok());
    }

    #[test]
    fn empty_batch_is_empty() {
        assert!(process_batch(&[], &config(), 4).is_empty());
    }

    #[test]
    fn items_beyond_the_limit_are_rejected_individually() {
        let images: Vec<RgbaImage> = (0..MAX_BATCH_SIZE + 2).map(|_| square_image(8)).collect();
        let outcomes = process_batch(&images, &config(), 4);
        assert_eq!(outcomes.len(), MAX_BATCH_SIZE + 2);
        assert!(outcomes[..MAX_BATCH_SIZE].iter().all(Result::is_ok));
        for outcome in &outcomes[MAX_BATCH_SIZE..] {
            assert_eq!(
                *outcome,
                Err(TraceError::BatchExceeded {
                    limit: MAX_BATCH_SIZE,
                }),
            );
        }
    }

    #[test]
    fn worker_count_does_not_change_results() {
        let images = vec![square_image(16), square_image(24), square_image(32)];
        let serial = process_batch(&images, &config(), 1);
        let parallel = process_batch(&images, &config(), 8);
        assert_eq!(serial, parallel);
    }
}
