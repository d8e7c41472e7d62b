//! Order book reconstruction from a snapshot followed by sequenced diffs.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use tracing::trace;

use crate::error::ClientError;
use crate::types::{OrderBook, PriceLevel};

/// Side of the book, defining its canonical price order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSide {
    /// Asks, ascending by price.
    Ask,
    /// Bids, descending by price.
    Bid,
}

impl BookSide {
    /// Compare two prices in this side's canonical order.
    pub fn compare(&self, a: &Decimal, b: &Decimal) -> Ordering {
        match self {
            BookSide::Ask => a.cmp(b),
            BookSide::Bid => b.cmp(a),
        }
    }
}

/// Merge a diff into one side of a book.
///
/// `old` must be in canonical order. Diff levels replace levels at the same
/// price; a zero size deletes the level. When a diff names a price twice the
/// later entry wins.
pub fn merge_side(side: BookSide, old: &[PriceLevel], update: &[PriceLevel]) -> Vec<PriceLevel> {
    let mut update = update.to_vec();
    update.sort_by(|a, b| side.compare(&a.price, &b.price));
    update.dedup_by(|later, kept| {
        if later.price == kept.price {
            std::mem::swap(later, kept);
            true
        } else {
            false
        }
    });

    let mut merged = Vec::with_capacity(old.len() + update.len());
    let (mut i, mut j) = (0, 0);
    while i < old.len() && j < update.len() {
        let (current, change) = (&old[i], &update[j]);
        match side.compare(&current.price, &change.price) {
            Ordering::Less => {
                merged.push(current.clone());
                i += 1;
            }
            Ordering::Greater => {
                if !change.size.is_zero() {
                    merged.push(change.clone());
                }
                j += 1;
            }
            Ordering::Equal => {
                if !change.size.is_zero() {
                    merged.push(change.clone());
                }
                i += 1;
                j += 1;
            }
        }
    }
    merged.extend(old[i..].iter().cloned());
    merged.extend(update[j..].iter().filter(|level| !level.size.is_zero()).cloned());
    merged
}

/// Synchronization state of a reconstructed book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookState {
    /// No snapshot yet; diffs are ignored.
    #[default]
    Waiting,
    /// In sync; diffs are applied.
    Updating,
    /// A sequence gap was seen; diffs are ignored until resubscribed.
    Broken,
}

/// Result of feeding a diff to the reconstructor.
#[derive(Debug, PartialEq)]
pub enum DiffOutcome<'a> {
    /// The diff was applied; the updated book.
    Applied(&'a OrderBook),
    /// The reconstructor is not in sync and dropped the diff.
    Ignored,
}

/// Per-feed order book state machine.
#[derive(Debug, Default)]
pub struct OrderBookReconstructor {
    state: BookState,
    book: Option<OrderBook>,
}

impl OrderBookReconstructor {
    /// Create a reconstructor waiting for a snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> BookState {
        self.state
    }

    /// The materialized book, if a snapshot has been applied.
    pub fn book(&self) -> Option<&OrderBook> {
        self.book.as_ref()
    }

    /// Replace the book with `snapshot` and start applying diffs.
    pub fn apply_snapshot(&mut self, snapshot: OrderBook) -> &OrderBook {
        trace!(symbol = %snapshot.symbol, sequence = snapshot.sequence, "Order book snapshot");
        self.state = BookState::Updating;
        self.book.insert(snapshot)
    }

    /// Apply a diff.
    ///
    /// A diff whose sequence does not directly follow the book's breaks the
    /// book and returns [`ClientError::SequenceGap`] without applying it.
    pub fn apply_diff(&mut self, diff: OrderBook) -> Result<DiffOutcome<'_>, ClientError> {
        if self.state != BookState::Updating {
            return Ok(DiffOutcome::Ignored);
        }
        let Some(book) = self.book.as_mut() else {
            return Ok(DiffOutcome::Ignored);
        };

        let expected = book.sequence + 1;
        if diff.sequence != expected {
            self.state = BookState::Broken;
            return Err(ClientError::SequenceGap {
                expected,
                received: diff.sequence,
            });
        }

        book.ask = merge_side(BookSide::Ask, &book.ask, &diff.ask);
        book.bid = merge_side(BookSide::Bid, &book.bid, &diff.bid);
        book.sequence = diff.sequence;
        book.timestamp = diff.timestamp;
        Ok(DiffOutcome::Applied(book))
    }

    /// Note that a fresh subscription was requested after a gap.
    pub fn mark_resubscribed(&mut self) {
        if self.state == BookState::Broken {
            self.state = BookState::Waiting;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use time::OffsetDateTime;
    use time::macros::datetime;

    fn levels(pairs: &[(Decimal, Decimal)]) -> Vec<PriceLevel> {
        pairs.iter().map(|&(p, s)| PriceLevel::new(p, s)).collect()
    }

    fn book(sequence: u64, ask: Vec<PriceLevel>, bid: Vec<PriceLevel>) -> OrderBook {
        OrderBook {
            symbol: "ETHBTC".into(),
            sequence,
            timestamp: datetime!(2024-03-01 10:00 UTC),
            ask,
            bid,
        }
    }

    #[test]
    fn test_merge_bid_side() {
        let old = levels(&[(dec!(10), dec!(1)), (dec!(9), dec!(2)), (dec!(8), dec!(1))]);
        let update = levels(&[(dec!(10), dec!(0)), (dec!(9), dec!(3)), (dec!(7), dec!(5))]);
        assert_eq!(
            merge_side(BookSide::Bid, &old, &update),
            levels(&[(dec!(9), dec!(3)), (dec!(8), dec!(1)), (dec!(7), dec!(5))])
        );
    }

    #[test]
    fn test_merge_ask_side() {
        let old = levels(&[(dec!(1.0), dec!(1)), (dec!(1.2), dec!(2))]);
        let update = levels(&[(dec!(1.1), dec!(4)), (dec!(1.0), dec!(0)), (dec!(1.3), dec!(0))]);
        assert_eq!(
            merge_side(BookSide::Ask, &old, &update),
            levels(&[(dec!(1.1), dec!(4)), (dec!(1.2), dec!(2))])
        );
    }

    #[test]
    fn test_merge_unsorted_and_repeated_diff_levels() {
        let old = levels(&[(dec!(5), dec!(1))]);
        let update = levels(&[(dec!(3), dec!(1)), (dec!(6), dec!(2)), (dec!(3), dec!(7))]);
        assert_eq!(
            merge_side(BookSide::Bid, &old, &update),
            levels(&[(dec!(6), dec!(2)), (dec!(5), dec!(1)), (dec!(3), dec!(7))])
        );
    }

    #[test]
    fn test_merge_compares_decimals_exactly() {
        let old = levels(&[(dec!(0.10), dec!(1))]);
        let update = levels(&[(dec!(0.1), dec!(0))]);
        assert!(merge_side(BookSide::Ask, &old, &update).is_empty());
    }

    #[test]
    fn test_diffs_ignored_before_snapshot() {
        let mut rec = OrderBookReconstructor::new();
        assert_eq!(rec.state(), BookState::Waiting);
        assert_eq!(rec.apply_diff(book(1, vec![], vec![])).unwrap(), DiffOutcome::Ignored);
        assert!(rec.book().is_none());
    }

    #[test]
    fn test_in_order_diff_applied() {
        let mut rec = OrderBookReconstructor::new();
        rec.apply_snapshot(book(
            42,
            levels(&[(dec!(11), dec!(1))]),
            levels(&[(dec!(10), dec!(1))]),
        ));

        let mut diff = book(43, vec![], levels(&[(dec!(10), dec!(0)), (dec!(9), dec!(2))]));
        diff.timestamp = datetime!(2024-03-01 10:00:01 UTC);
        match rec.apply_diff(diff).unwrap() {
            DiffOutcome::Applied(book) => {
                assert_eq!(book.sequence, 43);
                assert_eq!(book.bid, levels(&[(dec!(9), dec!(2))]));
                assert_eq!(book.ask, levels(&[(dec!(11), dec!(1))]));
                assert_eq!(book.timestamp, datetime!(2024-03-01 10:00:01 UTC));
            }
            DiffOutcome::Ignored => panic!("diff should apply"),
        }
    }

    #[test]
    fn test_gap_breaks_until_next_snapshot() {
        let mut rec = OrderBookReconstructor::new();
        let snapshot = book(42, levels(&[(dec!(11), dec!(1))]), vec![]);
        rec.apply_snapshot(snapshot.clone());

        match rec.apply_diff(book(44, levels(&[(dec!(11), dec!(0))]), vec![])) {
            Err(ClientError::SequenceGap { expected, received }) => {
                assert_eq!(expected, 43);
                assert_eq!(received, 44);
            }
            other => panic!("expected gap, got {other:?}"),
        }
        assert_eq!(rec.state(), BookState::Broken);
        assert_eq!(rec.book(), Some(&snapshot));

        assert_eq!(rec.apply_diff(book(43, vec![], vec![])).unwrap(), DiffOutcome::Ignored);

        rec.mark_resubscribed();
        assert_eq!(rec.state(), BookState::Waiting);
        assert_eq!(rec.apply_diff(book(45, vec![], vec![])).unwrap(), DiffOutcome::Ignored);

        rec.apply_snapshot(book(100, vec![], levels(&[(dec!(9), dec!(1))])));
        assert_eq!(rec.state(), BookState::Updating);
        assert!(matches!(
            rec.apply_diff(book(101, vec![], vec![])).unwrap(),
            DiffOutcome::Applied(_)
        ));
    }

    #[test]
    fn test_mark_resubscribed_only_leaves_broken() {
        let mut rec = OrderBookReconstructor::new();
        rec.apply_snapshot(book(1, vec![], vec![]));
        rec.mark_resubscribed();
        assert_eq!(rec.state(), BookState::Updating);
    }

    /// Difference between two canonical sides as a diff.
    fn diff_side(from: &[PriceLevel], to: &[PriceLevel]) -> Vec<PriceLevel> {
        let mut diff: Vec<PriceLevel> = from
            .iter()
            .filter(|old| !to.iter().any(|new| new.price == old.price))
            .map(|old| PriceLevel::new(old.price, Decimal::ZERO))
            .collect();
        diff.extend(to.iter().filter(|new| !from.contains(new)).cloned());
        diff
    }

    /// Deterministic book side from a seed.
    fn generate_side(side: BookSide, seed: &mut u64) -> Vec<PriceLevel> {
        let mut side_levels = Vec::new();
        for tick in 1..=20u32 {
            *seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            if (*seed >> 33) % 3 != 0 {
                let size = Decimal::from((*seed >> 40) % 50 + 1) / dec!(10);
                let price = match side {
                    BookSide::Ask => dec!(100) + Decimal::from(tick) / dec!(100),
                    BookSide::Bid => dec!(100) - Decimal::from(tick) / dec!(100),
                };
                side_levels.push(PriceLevel::new(price, size));
            }
        }
        side_levels.sort_by(|a, b| side.compare(&a.price, &b.price));
        side_levels
    }

    #[test]
    fn test_snapshot_plus_diffs_reproduces_target() {
        let mut seed = 7u64;
        let mut rec = OrderBookReconstructor::new();
        let start = book(
            1,
            generate_side(BookSide::Ask, &mut seed),
            generate_side(BookSide::Bid, &mut seed),
        );
        rec.apply_snapshot(start.clone());

        let mut previous = start;
        for sequence in 2..50u64 {
            let target = OrderBook {
                symbol: "ETHBTC".into(),
                sequence,
                timestamp: OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(sequence as i64),
                ask: generate_side(BookSide::Ask, &mut seed),
                bid: generate_side(BookSide::Bid, &mut seed),
            };
            let diff = OrderBook {
                ask: diff_side(&previous.ask, &target.ask),
                bid: diff_side(&previous.bid, &target.bid),
                ..target.clone()
            };

            match rec.apply_diff(diff).unwrap() {
                DiffOutcome::Applied(book) => assert_eq!(book, &target),
                DiffOutcome::Ignored => panic!("diff {sequence} ignored"),
            }
            previous = target;
        }
    }
}
