// ============================================================
// Layer 4 — Ordered Segment Buffer
// ============================================================
// A Buffer is a list of shared segment handles kept in
// (class, position) order. Everything downstream depends on
// that order: type ids come out contiguous, the query always
// precedes the body, and positions read left to right.
//
// Operations and the order they guarantee:
//
//   insert        one segment into its slot, linear scan from
//                 either end, same result either way
//   merge         two ordered buffers → one, two-pointer, O(n+m)
//   filtered      keeps relative order, shares the records
//   random_sample k of n without replacement, original order
//   concat / +    left then right, NO re-sorting
//
// Example merge (class omitted, all Second):
//   left:   1 4 6
//   right:  2 4 9
//   merged: 1 2 4(left) 4(right) 6 9
//
// Reference: Rust Book §8 (Vectors), §15 (Rc<T> / Arc<T>)

use std::ops::{Add, Index};
use std::sync::Arc;

use rand::Rng;

use crate::domain::segment::Segment;
use crate::error::{PackError, Result};

/// Direction of the linear scan used by [`Buffer::insert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirection {
    /// From the front; cheapest when the segment sorts early
    Forward,
    /// From the back; cheapest when segments arrive in order
    Reverse,
}

#[derive(Debug, Clone, Default)]
pub struct Buffer {
    segments: Vec<Arc<Segment>>,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a buffer from arbitrary segments, sorting them by key.
    /// The sort is stable so equal keys keep their input order.
    pub fn from_segments(mut segments: Vec<Arc<Segment>>) -> Self {
        segments.sort_by_key(|s| s.key());
        Self { segments }
    }

    /// Wrap segments as given, without sorting
    pub fn from_unsorted(segments: Vec<Arc<Segment>>) -> Self {
        Self { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Segment>> {
        self.segments.get(index)
    }

    pub fn segments(&self) -> &[Arc<Segment>] {
        &self.segments
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<Segment>> {
        self.segments.iter()
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    /// Total number of tokens across all segments
    pub fn calc_size(&self) -> usize {
        self.segments.iter().map(|s| s.len()).sum()
    }

    /// Cumulative end offset of every segment in variable layout.
    /// e.g. lengths [3, 5, 2] → [3, 8, 10]
    pub fn block_ends(&self) -> Vec<usize> {
        self.segments
            .iter()
            .scan(0usize, |total, s| {
                *total += s.len();
                Some(*total)
            })
            .collect()
    }

    /// True when no segment sorts before its left neighbour
    pub fn is_sorted(&self) -> bool {
        self.segments.windows(2).all(|w| !w[1].precedes(&w[0]))
    }

    /// Insert one segment, keeping the buffer ordered.
    ///
    /// The segment lands after every segment it does not precede and
    /// before the first one that sorts after it. Both scan directions
    /// pick that same slot.
    pub fn insert(&mut self, segment: Arc<Segment>, direction: ScanDirection) {
        let index = match direction {
            ScanDirection::Forward => {
                let mut i = 0;
                while i < self.segments.len() && !segment.precedes(&self.segments[i]) {
                    i += 1;
                }
                i
            }
            ScanDirection::Reverse => {
                let mut i = self.segments.len();
                while i > 0 && segment.precedes(&self.segments[i - 1]) {
                    i -= 1;
                }
                i
            }
        };
        self.segments.insert(index, segment);
    }

    /// Merge two ordered buffers into a new ordered buffer.
    /// On equal keys the segment from `self` comes first.
    pub fn merge(&self, other: &Buffer) -> Buffer {
        let (left, right) = (&self.segments, &other.segments);
        let mut merged    = Vec::with_capacity(left.len() + right.len());
        let (mut i, mut j) = (0usize, 0usize);

        while i < left.len() && j < right.len() {
            if right[j].precedes(&left[i]) {
                merged.push(Arc::clone(&right[j]));
                j += 1;
            } else {
                merged.push(Arc::clone(&left[i]));
                i += 1;
            }
        }
        merged.extend(left[i..].iter().cloned());
        merged.extend(right[j..].iter().cloned());

        Buffer { segments: merged }
    }

    /// Keep segments for which `predicate(segment, index)` holds.
    pub fn filtered<F>(&self, mut predicate: F) -> Buffer
    where
        F: FnMut(&Segment, usize) -> bool,
    {
        let mut segments = Vec::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if predicate(segment, i) {
                segments.push(Arc::clone(segment));
            }
        }
        Buffer { segments }
    }

    /// Segments carrying a relevance label
    pub fn positives(&self) -> Buffer {
        self.filtered(|s, _| s.is_positive())
    }

    /// Segments without a relevance label
    pub fn negatives(&self) -> Buffer {
        self.filtered(|s, _| !s.is_positive())
    }

    /// Pick `size` distinct segments uniformly at random.
    ///
    /// Indices are drawn first and sorted, so the result keeps the
    /// relative order of `self`.
    pub fn random_sample<R: Rng + ?Sized>(&self, size: usize, rng: &mut R) -> Result<Buffer> {
        if size > self.segments.len() {
            return Err(PackError::ContractViolation(format!(
                "cannot sample {size} segments from a buffer of {}",
                self.segments.len()
            )));
        }

        let mut indices = rand::seq::index::sample(rng, self.segments.len(), size).into_vec();
        indices.sort_unstable();

        let segments = indices
            .into_iter()
            .map(|i| Arc::clone(&self.segments[i]))
            .collect();
        Ok(Buffer { segments })
    }

    /// Left then right, without re-sorting. See [`Buffer::merge`] for
    /// the order-preserving combination.
    pub fn concat(&self, other: &Buffer) -> Buffer {
        let mut segments = Vec::with_capacity(self.len() + other.len());
        segments.extend(self.segments.iter().cloned());
        segments.extend(other.segments.iter().cloned());
        Buffer::from_unsorted(segments)
    }
}

impl Index<usize> for Buffer {
    type Output = Arc<Segment>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.segments[index]
    }
}

impl<'a> IntoIterator for &'a Buffer {
    type Item = &'a Arc<Segment>;
    type IntoIter = std::slice::Iter<'a, Arc<Segment>>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

impl Add<&Buffer> for &Buffer {
    type Output = Buffer;

    fn add(self, rhs: &Buffer) -> Buffer {
        self.concat(rhs)
    }
}

impl Add for Buffer {
    type Output = Buffer;

    fn add(mut self, rhs: Buffer) -> Buffer {
        self.segments.extend(rhs.segments);
        self
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{keys, raw_seg, seg, seg_of_len};
    use crate::domain::segment::SegmentClass::{First, Second};
    use rand::{rngs::StdRng, SeedableRng};

    fn ordered(positions: &[u64]) -> Buffer {
        Buffer::from_segments(positions.iter().map(|&p| seg(p, Second)).collect())
    }

    #[test]
    fn test_insert_forward_and_reverse_agree() {
        let inputs = [(5, Second), (1, First), (3, Second), (3, Second), (0, Second), (7, First)];

        let mut fwd = Buffer::new();
        let mut rev = Buffer::new();
        for &(p, c) in &inputs {
            fwd.insert(seg(p, c), ScanDirection::Forward);
            rev.insert(seg(p, c), ScanDirection::Reverse);
        }

        assert_eq!(keys(&fwd), keys(&rev));
        assert!(fwd.is_sorted());
        assert_eq!(
            keys(&fwd),
            vec![(First, 1), (First, 7), (Second, 0), (Second, 3), (Second, 3), (Second, 5)]
        );
    }

    #[test]
    fn test_insert_places_equal_key_after_existing() {
        let first  = seg(2, Second);
        let second = seg(2, Second);
        for direction in [ScanDirection::Forward, ScanDirection::Reverse] {
            let mut buf = ordered(&[1, 3]);
            buf.insert(Arc::clone(&first), direction);
            buf.insert(Arc::clone(&second), direction);
            assert!(Arc::ptr_eq(&buf[1], &first));
            assert!(Arc::ptr_eq(&buf[2], &second));
        }
    }

    #[test]
    fn test_merge_interleaves_in_order() {
        let merged = ordered(&[1, 4, 6]).merge(&ordered(&[2, 4, 9]));
        let positions: Vec<u64> = merged.iter().map(|s| s.position()).collect();
        assert_eq!(positions, vec![1, 2, 4, 4, 6, 9]);
        assert!(merged.is_sorted());
    }

    #[test]
    fn test_merge_ties_prefer_left() {
        let left  = ordered(&[4]);
        let right = ordered(&[4]);
        let merged = left.merge(&right);
        assert!(Arc::ptr_eq(&merged[0], &left[0]));
        assert!(Arc::ptr_eq(&merged[1], &right[0]));
    }

    #[test]
    fn test_merge_is_symmetric_in_order() {
        let a = Buffer::from_segments(vec![seg(3, First), seg(1, Second), seg(8, Second)]);
        let b = Buffer::from_segments(vec![seg(2, First), seg(5, Second)]);
        let ab = a.merge(&b);
        let ba = b.merge(&a);
        assert_eq!(keys(&ab), keys(&ba));
        assert_eq!(ab.len(), a.len() + b.len());
    }

    #[test]
    fn test_merge_with_empty() {
        let a = ordered(&[1, 2]);
        assert_eq!(keys(&a.merge(&Buffer::new())), keys(&a));
        assert_eq!(keys(&Buffer::new().merge(&a)), keys(&a));
    }

    #[test]
    fn test_filtered_shares_records() {
        let buf  = ordered(&[1, 2, 3, 4]);
        let even = buf.filtered(|_, i| i % 2 == 1);
        assert_eq!(even.len(), 2);
        assert!(Arc::ptr_eq(&even[0], &buf[1]));
        assert!(Arc::ptr_eq(&even[1], &buf[3]));
    }

    #[test]
    fn test_random_sample_keeps_order_and_distinctness() {
        let buf = ordered(&(0..20).collect::<Vec<_>>());
        let mut rng = StdRng::seed_from_u64(7);
        for k in [0, 1, 5, 20] {
            let sample = buf.random_sample(k, &mut rng).unwrap();
            assert_eq!(sample.len(), k);
            assert!(sample.is_sorted());
            let mut positions: Vec<u64> = sample.iter().map(|s| s.position()).collect();
            positions.dedup();
            assert_eq!(positions.len(), k);
        }
    }

    #[test]
    fn test_random_sample_too_many_is_contract_violation() {
        let buf = ordered(&[1, 2, 3]);
        let mut rng = StdRng::seed_from_u64(1);
        let err = buf.random_sample(4, &mut rng).unwrap_err();
        assert!(matches!(err, PackError::ContractViolation(_)));
    }

    #[test]
    fn test_concat_does_not_resort() {
        let joined = &ordered(&[5, 6]) + &ordered(&[1, 2]);
        let positions: Vec<u64> = joined.iter().map(|s| s.position()).collect();
        assert_eq!(positions, vec![5, 6, 1, 2]);
        assert!(!joined.is_sorted());

        let owned = ordered(&[1]) + ordered(&[2]);
        assert_eq!(owned.len(), 2);
    }

    #[test]
    fn test_from_unsorted_keeps_input_order() {
        let input = vec![seg(4, Second), seg(2, First), seg(1, Second)];

        let raw = Buffer::from_unsorted(input.clone());
        assert_eq!(keys(&raw), vec![(Second, 4), (First, 2), (Second, 1)]);
        assert!(!raw.is_sorted());

        let sorted = Buffer::from_segments(input);
        assert_eq!(keys(&sorted), vec![(First, 2), (Second, 1), (Second, 4)]);
        assert!(sorted.is_sorted());
    }

    #[test]
    fn test_sizes_and_block_ends() {
        let buf = Buffer::from_segments(vec![
            seg_of_len(1, Second, 3),
            seg_of_len(2, Second, 5),
            seg_of_len(3, Second, 2),
        ]);
        assert_eq!(buf.calc_size(), 10);
        assert_eq!(buf.block_ends(), vec![3, 8, 10]);
        assert!(Buffer::new().block_ends().is_empty());
    }

    #[test]
    fn test_partition_by_relevance() {
        let labeled = Arc::new(raw_seg(2, Second, 2).with_relevance(1));
        let buf = Buffer::from_segments(vec![seg(1, Second), labeled, seg(3, Second)]);
        assert_eq!(buf.positives().len(), 1);
        assert_eq!(buf.negatives().len(), 2);
    }

    #[test]
    fn test_order_survives_mixed_operations() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut buf = ordered(&[10, 20, 30]);
        buf.insert(seg(15, Second), ScanDirection::Reverse);
        buf.insert(seg(4, First), ScanDirection::Forward);
        let merged  = buf.merge(&ordered(&[1, 25]));
        let sampled = merged.random_sample(4, &mut rng).unwrap();
        let kept    = sampled.filtered(|s, _| s.position() != 20);
        for b in [&buf, &merged, &sampled, &kept] {
            assert!(b.is_sorted());
        }
    }
}
