//! Chronological train/test partition.

use crate::domain::Split;

/// Split `items` into a `floor(n * train_fraction)` prefix and the remaining suffix.
///
/// No shuffling: the test split is always the tail of the input order.
pub fn chronological_split<T>(mut items: Vec<T>, train_fraction: f64) -> Split<T> {
    let n = items.len();
    let fraction = train_fraction.clamp(0.0, 1.0);
    let train_len = ((n as f64 * fraction).floor() as usize).min(n);
    let test = items.split_off(train_len);
    Split { train: items, test }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_follow_floor_of_fraction() {
        for n in 0..40usize {
            let items: Vec<usize> = (0..n).collect();
            let split = chronological_split(items.clone(), 0.8);

            let expected_train = (n as f64 * 0.8).floor() as usize;
            assert_eq!(split.train.len(), expected_train, "n={n}");
            assert_eq!(split.test.len(), n - expected_train, "n={n}");

            let rejoined: Vec<usize> = split.train.iter().chain(split.test.iter()).copied().collect();
            assert_eq!(rejoined, items);
        }
    }

    #[test]
    fn two_windows_split_one_and_one() {
        let split = chronological_split(vec!["first", "second"], 0.8);
        assert_eq!(split.train, vec!["first"]);
        assert_eq!(split.test, vec!["second"]);
    }
}
