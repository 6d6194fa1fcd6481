//! Solved flow conditions and the user's choice among them.
//!
//! A database holds a sparse set of (Mach, Beta, Alpha) combinations. The
//! per-axis lists offered to the user are the distinct values of each axis,
//! so most index triples do not name a solved case.

use adb_io::CaseHeader;
use std::collections::HashMap;
use std::fmt;

/// Values closer than this are the same condition.
const EPSILON: f64 = 1e-6;

#[derive(Clone, Debug, PartialEq)]
pub struct Case {
    pub mach: f64,
    pub beta: f64,
    pub alpha: f64,
    pub comment: String,
}

impl From<&CaseHeader> for Case {
    fn from(header: &CaseHeader) -> Self {
        Self {
            mach: f64::from(header.mach),
            beta: f64::from(header.beta),
            alpha: f64::from(header.alpha),
            comment: header.comment.clone(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    Mach,
    Beta,
    Alpha,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::Mach, Axis::Beta, Axis::Alpha];
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::Mach => "Mach",
            Axis::Beta => "Beta",
            Axis::Alpha => "Alpha",
        })
    }
}

fn distinct(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut values: Vec<f64> = values.collect();
    values.sort_by(f64::total_cmp);
    values.dedup_by(|a, b| (*a - *b).abs() <= EPSILON);
    values
}

fn position(list: &[f64], value: f64) -> Option<usize> {
    list.iter().position(|v| (v - value).abs() <= EPSILON)
}

/// Immutable list of the cases of a database.
#[derive(Clone, Debug, Default)]
pub struct CaseIndex {
    cases: Vec<Case>,
    machs: Vec<f64>,
    betas: Vec<f64>,
    alphas: Vec<f64>,
    lookup: HashMap<[usize; 3], usize>,
}

impl CaseIndex {
    pub fn new(cases: Vec<Case>) -> Self {
        let machs = distinct(cases.iter().map(|c| c.mach));
        let betas = distinct(cases.iter().map(|c| c.beta));
        let alphas = distinct(cases.iter().map(|c| c.alpha));

        let mut lookup = HashMap::with_capacity(cases.len());
        for (i, case) in cases.iter().enumerate() {
            let key = [
                position(&machs, case.mach),
                position(&betas, case.beta),
                position(&alphas, case.alpha),
            ];
            // Every case value made it into the lists above.
            let key = match key {
                [Some(m), Some(b), Some(a)] => [m, b, a],
                _ => continue,
            };
            if let Some(first) = lookup.get(&key) {
                tracing::warn!(case = i, first, "duplicate flow condition ignored");
                continue;
            }
            lookup.insert(key, i);
        }

        Self {
            cases,
            machs,
            betas,
            alphas,
            lookup,
        }
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    pub fn get(&self, index: usize) -> Option<&Case> {
        self.cases.get(index)
    }

    /// Sorted distinct values of an axis.
    pub fn values(&self, axis: Axis) -> &[f64] {
        match axis {
            Axis::Mach => &self.machs,
            Axis::Beta => &self.betas,
            Axis::Alpha => &self.alphas,
        }
    }

    /// Resolves indices into the per-axis lists to a case.
    pub fn select(&self, mach: usize, beta: usize, alpha: usize) -> Option<usize> {
        self.lookup.get(&[mach, beta, alpha]).copied()
    }

    /// Resolves condition values to a case. Values must match a solved case
    /// exactly, up to rounding.
    pub fn resolve(&self, mach: f64, beta: f64, alpha: f64) -> Option<usize> {
        self.select(
            position(&self.machs, mach)?,
            position(&self.betas, beta)?,
            position(&self.alphas, alpha)?,
        )
    }

    /// Per-axis list indices of a case.
    pub fn coordinates(&self, index: usize) -> Option<[usize; 3]> {
        let case = self.cases.get(index)?;
        Some([
            position(&self.machs, case.mach)?,
            position(&self.betas, case.beta)?,
            position(&self.alphas, case.alpha)?,
        ])
    }
}

/// Choice along one axis.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AxisChoice {
    /// Index into the axis list.
    pub index: usize,
    /// Last value typed by the user.
    pub typed: Option<f64>,
    /// Whether `typed` is newer than `index`.
    pub touched: bool,
}

/// The user's current choice of case, axis by axis.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct CaseSelection {
    choices: [AxisChoice; 3],
}

impl CaseSelection {
    pub fn choice(&self, axis: Axis) -> &AxisChoice {
        &self.choices[axis as usize]
    }

    /// The user picked a value from the axis list.
    pub fn pick(&mut self, axis: Axis, index: usize) {
        let choice = &mut self.choices[axis as usize];
        choice.index = index;
        choice.touched = false;
    }

    /// The user typed a value for the axis.
    pub fn type_value(&mut self, axis: Axis, value: f64) {
        let choice = &mut self.choices[axis as usize];
        choice.typed = Some(value);
        choice.touched = true;
    }

    /// Value the next reload will use for an axis: the typed value if it is
    /// the latest input, the picked list value otherwise.
    pub fn value(&self, axis: Axis, index: &CaseIndex) -> Option<f64> {
        let choice = self.choice(axis);
        match choice.typed {
            Some(typed) if choice.touched => Some(typed),
            _ => index.values(axis).get(choice.index).copied(),
        }
    }

    pub fn resolve(&self, index: &CaseIndex) -> Option<usize> {
        index.resolve(
            self.value(Axis::Mach, index)?,
            self.value(Axis::Beta, index)?,
            self.value(Axis::Alpha, index)?,
        )
    }

    /// Aligns the selection with a freshly loaded case.
    pub fn settle(&mut self, index: &CaseIndex, case: usize) {
        let coordinates = match index.coordinates(case) {
            Some(v) => v,
            None => return,
        };
        for (choice, coordinate) in self.choices.iter_mut().zip(coordinates) {
            choice.index = coordinate;
            choice.touched = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn case(mach: f64, beta: f64, alpha: f64) -> Case {
        Case {
            mach,
            beta,
            alpha,
            comment: String::new(),
        }
    }

    fn sparse() -> CaseIndex {
        CaseIndex::new(vec![
            case(0.3, 0.0, 2.0),
            case(0.3, 0.0, 4.0),
            case(0.5, 0.0, 2.0),
            case(0.5, 5.0, 4.0),
        ])
    }

    #[test]
    fn axis_lists() {
        let index = sparse();
        assert_eq!(index.values(Axis::Mach), &[0.3, 0.5]);
        assert_eq!(index.values(Axis::Beta), &[0.0, 5.0]);
        assert_eq!(index.values(Axis::Alpha), &[2.0, 4.0]);
    }

    #[test]
    fn select_and_resolve() {
        let index = sparse();
        assert_eq!(index.select(1, 1, 1), Some(3));
        assert_eq!(index.select(0, 1, 0), None);
        assert_eq!(index.select(7, 0, 0), None);
        assert_eq!(index.resolve(0.5, 0.0, 2.0), Some(2));
        assert_eq!(index.resolve(0.5 + 1e-9, 0.0, 2.0), Some(2));
        assert_eq!(index.resolve(0.5, 0.0, 4.0), None);
        assert_eq!(index.resolve(0.4, 0.0, 2.0), None);
        assert_eq!(index.coordinates(3), Some([1, 1, 1]));
    }

    #[test]
    fn duplicates_keep_the_first_case() {
        let index = CaseIndex::new(vec![case(0.3, 0.0, 2.0), case(0.3, 0.0, 2.0)]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.resolve(0.3, 0.0, 2.0), Some(0));
    }

    #[test]
    fn typed_values_win_until_a_pick() {
        let index = sparse();
        let mut selection = CaseSelection::default();
        assert_eq!(selection.resolve(&index), Some(0));

        selection.pick(Axis::Alpha, 1);
        assert_eq!(selection.resolve(&index), Some(1));

        selection.type_value(Axis::Mach, 0.5);
        selection.type_value(Axis::Beta, 5.0);
        assert_eq!(selection.resolve(&index), Some(3));

        selection.pick(Axis::Beta, 0);
        assert!(!selection.choice(Axis::Beta).touched);
        assert_eq!(selection.resolve(&index), None);

        selection.settle(&index, 2);
        assert_eq!(selection.choice(Axis::Mach).index, 1);
        assert!(!selection.choice(Axis::Mach).touched);
        assert_eq!(selection.resolve(&index), Some(2));
    }

    proptest!(
        /// Resolving never falls back to a neighbouring case.
        #[test]
        fn resolve_is_exact(
            solved in prop::collection::vec((0..4u8, 0..3u8, 0..5u8), 0..20),
            query in (0..4u8, 0..3u8, 0..5u8),
        ) {
            let cases: Vec<Case> = solved
                .iter()
                .map(|(m, b, a)| case(0.1 * *m as f64, *b as f64, 2.0 * *a as f64))
                .collect();
            let index = CaseIndex::new(cases);
            let (m, b, a) = query;
            let (mach, beta, alpha) = (0.1 * m as f64, b as f64, 2.0 * a as f64);
            match index.resolve(mach, beta, alpha) {
                Some(i) => {
                    let found = index.get(i).unwrap();
                    prop_assert!((found.mach - mach).abs() <= EPSILON);
                    prop_assert!((found.beta - beta).abs() <= EPSILON);
                    prop_assert!((found.alpha - alpha).abs() <= EPSILON);
                }
                None => prop_assert!(!solved.contains(&query)),
            }
        }
    );
}
