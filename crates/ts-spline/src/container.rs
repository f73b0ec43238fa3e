//! The ordered, unique-by-time knot container (§4.2).

use ts_core::Time;

use crate::knot::Knot;

/// An ordered container of [`Knot`]s, unique by time.
///
/// Lookups use an interpolation-guided search: a first guess computed by
/// linear interpolation between the first and last knot times, a short
/// bounded probe outward from the guess, and a binary-search fallback if
/// the probe doesn't land on the target range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnotContainer {
    knots: Vec<Knot>,
}

/// How many steps the interpolation-guided probe takes before falling
/// back to binary search (§4.2).
const PROBE_STEPS: usize = 3;

impl KnotContainer {
    /// An empty container.
    pub fn new() -> Self {
        KnotContainer { knots: Vec::new() }
    }

    /// Number of knots.
    pub fn len(&self) -> usize {
        self.knots.len()
    }

    /// `true` if there are no knots.
    pub fn is_empty(&self) -> bool {
        self.knots.is_empty()
    }

    /// Forward iteration, ascending by time.
    pub fn iter(&self) -> std::slice::Iter<'_, Knot> {
        self.knots.iter()
    }

    /// Reverse iteration, descending by time.
    pub fn iter_rev(&self) -> std::iter::Rev<std::slice::Iter<'_, Knot>> {
        self.knots.iter().rev()
    }

    /// The knot at index `i`, ascending by time.
    pub fn get(&self, i: usize) -> Option<&Knot> {
        self.knots.get(i)
    }

    /// Insert a knot, keeping the container ordered by time. Replaces any
    /// existing knot at the same time.
    pub fn insert(&mut self, knot: Knot) {
        match self.index_of(knot.time()) {
            Ok(i) => self.knots[i] = knot,
            Err(i) => self.knots.insert(i, knot),
        }
    }

    /// Remove the knot at `t`, if any. No-op if absent.
    pub fn erase(&mut self, t: Time) {
        if let Ok(i) = self.index_of(t) {
            self.knots.remove(i);
        }
    }

    /// The knot exactly at `t`, if any.
    pub fn find(&self, t: Time) -> Option<&Knot> {
        self.index_of(t).ok().map(|i| &self.knots[i])
    }

    /// The first knot at or after `t` (non-strict successor).
    pub fn lower_bound(&self, t: Time) -> Option<&Knot> {
        let i = self.guided_search(t);
        self.knots[i..].iter().find(|k| k.time() >= t)
    }

    /// The first knot strictly after `t`.
    pub fn upper_bound(&self, t: Time) -> Option<&Knot> {
        let i = self.guided_search(t);
        self.knots[i..].iter().find(|k| k.time() > t)
    }

    /// Index of the first knot at or after `t`, or `len()` if none.
    pub fn lower_bound_index(&self, t: Time) -> usize {
        match self.lower_bound(t) {
            Some(k) => self.index_of(k.time()).unwrap(),
            None => self.knots.len(),
        }
    }

    /// Index of the first knot strictly after `t`, or `len()` if none.
    pub fn upper_bound_index(&self, t: Time) -> usize {
        match self.upper_bound(t) {
            Some(k) => self.index_of(k.time()).unwrap(),
            None => self.knots.len(),
        }
    }

    /// The knot strictly before `t` and the knot strictly after `t`
    /// (excluding any knot exactly at `t`). Used by redundancy (§4.8) to
    /// find a knot's true neighbors regardless of whether the knot
    /// itself is present in the container.
    pub fn strict_neighbors(&self, t: Time) -> (Option<&Knot>, Option<&Knot>) {
        let before = self.knots[..self.lower_bound_index(t)].last();
        let after = self.knots.get(self.upper_bound_index(t));
        (before, after)
    }

    /// The knot whose time is nearest `t` (ties favor the earlier knot).
    pub fn closest_knot(&self, t: Time) -> Option<&Knot> {
        match (self.closest_before(t), self.closest_after(t)) {
            (Some(b), Some(a)) => {
                if (t - b.time()).abs() <= (a.time() - t).abs() {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            (Some(b), None) => Some(b),
            (None, Some(a)) => Some(a),
            (None, None) => None,
        }
    }

    /// The knot at or before `t`, if any.
    pub fn closest_before(&self, t: Time) -> Option<&Knot> {
        match self.find(t) {
            Some(k) => Some(k),
            None => {
                let i = self.upper_bound_index(t);
                if i == 0 {
                    None
                } else {
                    Some(&self.knots[i - 1])
                }
            }
        }
    }

    /// The knot at or after `t`, if any.
    pub fn closest_after(&self, t: Time) -> Option<&Knot> {
        match self.find(t) {
            Some(k) => Some(k),
            None => self.lower_bound(t),
        }
    }

    /// Exact index of the knot at `t` (`Ok`), or the insertion point that
    /// keeps the container ordered (`Err`).
    ///
    /// Uses the interpolation-guided probe (§4.2) to try to land on or
    /// next to the target in `O(1)` before falling back to a full binary
    /// search.
    fn index_of(&self, t: Time) -> Result<usize, usize> {
        if self.knots.is_empty() {
            return Err(0);
        }
        if let Some(i) = self.guided_probe(t) {
            return Ok(i);
        }
        self.knots
            .binary_search_by(|k| k.time().partial_cmp(&t).unwrap())
    }

    /// Interpolation-guided search, per §4.2: compute a linear-
    /// interpolation index guess, probe outward from it up to
    /// [`PROBE_STEPS`] steps. Returns `Some(i)` if a knot at exactly `t`
    /// was found this way; `None` means the caller should fall back to
    /// binary search.
    fn guided_probe(&self, t: Time) -> Option<usize> {
        let n = self.knots.len();
        let first = self.knots[0].time();
        let last = self.knots[n - 1].time();
        if first == last {
            return None;
        }
        let frac = (t - first) / (last - first);
        let guess = frac * n as f64;
        if !guess.is_finite() {
            return None;
        }
        let mut g = (guess.floor() as isize).clamp(0, n as isize - 1) as usize;

        for _ in 0..PROBE_STEPS {
            let kt = self.knots[g].time();
            if kt == t {
                return Some(g);
            }
            if kt < t {
                if g + 1 >= n {
                    return None;
                }
                g += 1;
            } else {
                if g == 0 {
                    return None;
                }
                g -= 1;
            }
        }
        None
    }

    /// First index `i` such that `knots[i].time() >= t`, used to seed
    /// forward scans in [`Self::lower_bound`]/[`Self::upper_bound`]
    /// without re-scanning from the start of the container.
    fn guided_search(&self, t: Time) -> usize {
        if self.knots.is_empty() {
            return 0;
        }
        match self.guided_probe(t) {
            Some(i) => i,
            None => self
                .knots
                .binary_search_by(|k| k.time().partial_cmp(&t).unwrap())
                .unwrap_or_else(|i| i),
        }
    }
}

impl<'a> IntoIterator for &'a KnotContainer {
    type Item = &'a Knot;
    type IntoIter = std::slice::Iter<'a, Knot>;
    fn into_iter(self) -> Self::IntoIter {
        self.knots.iter()
    }
}

impl FromIterator<Knot> for KnotContainer {
    fn from_iter<I: IntoIterator<Item = Knot>>(iter: I) -> Self {
        let mut c = KnotContainer::new();
        for k in iter {
            c.insert(k);
        }
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knot::KnotType;
    use crate::value::Value;

    fn k(t: f64) -> Knot {
        Knot::single(t, KnotType::Linear, Value::Double(t)).unwrap()
    }

    #[test]
    fn insert_keeps_ascending_order() {
        let mut c = KnotContainer::new();
        for t in [5.0, 1.0, 3.0, 2.0, 4.0] {
            c.insert(k(t));
        }
        let times: Vec<f64> = c.iter().map(|k| k.time()).collect();
        assert_eq!(times, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn insert_replaces_existing_time() {
        let mut c = KnotContainer::new();
        c.insert(k(1.0));
        c.insert(Knot::single(1.0, KnotType::Held, Value::Double(9.0)).unwrap());
        assert_eq!(c.len(), 1);
        assert_eq!(c.find(1.0).unwrap().right_value(), &Value::Double(9.0));
    }

    #[test]
    fn erase_is_noop_if_absent() {
        let mut c = KnotContainer::new();
        c.insert(k(1.0));
        c.erase(2.0);
        assert_eq!(c.len(), 1);
        c.erase(1.0);
        assert!(c.is_empty());
    }

    #[test]
    fn lower_upper_bound_semantics() {
        let mut c = KnotContainer::new();
        for t in [1.0, 2.0, 3.0] {
            c.insert(k(t));
        }
        assert_eq!(c.lower_bound(2.0).unwrap().time(), 2.0);
        assert_eq!(c.upper_bound(2.0).unwrap().time(), 3.0);
        assert_eq!(c.lower_bound(0.5).unwrap().time(), 1.0);
        assert!(c.upper_bound(3.0).is_none());
    }

    #[test]
    fn closest_accessors() {
        let mut c = KnotContainer::new();
        for t in [1.0, 5.0, 10.0] {
            c.insert(k(t));
        }
        assert_eq!(c.closest_before(7.0).unwrap().time(), 5.0);
        assert_eq!(c.closest_after(7.0).unwrap().time(), 10.0);
        assert_eq!(c.closest_knot(6.0).unwrap().time(), 5.0);
        assert_eq!(c.closest_knot(8.0).unwrap().time(), 10.0);
        assert_eq!(c.closest_knot(5.0).unwrap().time(), 5.0);
    }

    #[test]
    fn guided_search_finds_correct_knot_on_larger_containers() {
        let mut c = KnotContainer::new();
        for i in 0..200 {
            c.insert(k(i as f64));
        }
        for t in [0.0, 1.0, 50.0, 199.0, 123.0] {
            assert_eq!(c.find(t).unwrap().time(), t);
        }
        assert!(c.find(50.5).is_none());
    }
}
