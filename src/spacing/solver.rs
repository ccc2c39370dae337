//! Spring and rod solver
//!
//! Gaps between consecutive slices behave like springs with quadratic energy
//! `k * (gap - rest)^2 / 2`, stiffness `k = 1 / rest`. A rod demands that the
//! gaps it spans add up to at least its length. Starting from the spring-only
//! solution, rods are activated one per round, always the one whose
//! activation widens the range the most. An active rod is an equality row in
//! the KKT system of the energy, which is solved by Gaussian elimination.

use serde::{Deserialize, Serialize};

/// Span differences below this many pixels are treated as equal
const SPAN_EPSILON: f64 = 1e-4;

const PIVOT_EPSILON: f64 = 1e-12;

/// Minimum combined width of the gaps `first_gap..=last_gap`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Rod {
    pub first_gap: usize,
    pub last_gap: usize,
    pub length: f32,
}

impl Rod {
    pub fn new(first_gap: usize, last_gap: usize, length: f32) -> Self {
        debug_assert!(first_gap <= last_gap, "rod spans no gaps");
        Self { first_gap, last_gap, length }
    }

    pub fn span(&self, gaps: &[f32]) -> f32 {
        gaps[self.first_gap..=self.last_gap].iter().sum()
    }

    /// How far the gaps fall short of the rod, or 0
    pub fn shortfall(&self, gaps: &[f32]) -> f32 {
        (self.length - self.span(gaps)).max(0.0)
    }

    fn is_single_gap(&self) -> bool {
        self.first_gap == self.last_gap
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SpacingProblem {
    /// Rest length of the spring in each gap
    pub springs: Vec<f32>,
    pub rods: Vec<Rod>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SpacingSolution {
    pub gaps: Vec<f32>,

    /// Indices into the problem's rods, in activation order
    pub activated: Vec<usize>,

    pub rounds: usize,
}

impl SpacingSolution {
    /// Whole-pixel gaps that still satisfy every rod
    pub fn to_pixels(&self, rods: &[Rod]) -> Vec<i32> {
        let mut position = 0.0_f32;
        let mut previous = 0;
        let mut pixels: Vec<i32> = self
            .gaps
            .iter()
            .map(|gap| {
                position += gap;
                let rounded = position.round() as i32;
                let pixel = (rounded - previous).max(0);
                previous += pixel;
                pixel
            })
            .collect();
        for rod in rods {
            let span: i32 = pixels[rod.first_gap..=rod.last_gap].iter().sum();
            let length = rod.length.ceil() as i32;
            if span < length {
                pixels[rod.last_gap] += length - span;
            }
        }
        pixels
    }
}

impl SpacingProblem {
    pub fn new(springs: Vec<f32>) -> Self {
        Self { springs, rods: Vec::new() }
    }

    pub fn gap_count(&self) -> usize {
        self.springs.len()
    }

    pub fn add_rod(&mut self, rod: Rod) {
        debug_assert!(rod.last_gap < self.springs.len(), "rod reaches past the last gap");
        self.rods.push(rod);
    }

    pub fn solve(&self, max_rounds: usize) -> SpacingSolution {
        let mut rest: Vec<f64> = self.springs.iter().map(|spring| spring.max(0.0) as f64).collect();
        for rod in self.rods.iter().filter(|rod| rod.is_single_gap()) {
            rest[rod.first_gap] = rest[rod.first_gap].max(rod.length as f64);
        }
        let stiffness: Vec<f64> = rest.iter().map(|rest| 1.0 / rest.max(1.0)).collect();

        let mut candidates = self.distinct_multi_gap_rods();
        let mut active: Vec<usize> = Vec::new();
        let mut gaps = rest.clone();
        let mut span: f64 = gaps.iter().sum();
        let mut rounds = 0;
        while !candidates.is_empty() {
            if rounds == max_rounds {
                log::warn!("Rod activation stopped after {} rounds with {} rods left", rounds, candidates.len());
                break;
            }
            rounds += 1;
            let mut best: Option<(usize, f64, Vec<f64>)> = None;
            for (position, rod) in candidates.iter().enumerate() {
                let mut trial = active.clone();
                trial.push(*rod);
                let Some(trial_gaps) = self.solve_active(&rest, &stiffness, &trial) else { continue };
                let trial_span: f64 = trial_gaps.iter().sum();
                if best.as_ref().map_or(true, |(_, best_span, _)| trial_span > *best_span) {
                    best = Some((position, trial_span, trial_gaps));
                }
            }
            match best {
                Some((position, trial_span, trial_gaps)) if trial_span > span + SPAN_EPSILON => {
                    active.push(candidates.remove(position));
                    gaps = trial_gaps;
                    span = trial_span;
                }
                _ => break,
            }
        }

        // Rods that never widened the range may still be violated
        loop {
            let worst = candidates
                .iter()
                .enumerate()
                .map(|(position, rod)| (position, self.violation(*rod, &gaps)))
                .filter(|(_, violation)| *violation > SPAN_EPSILON)
                .max_by(|a, b| a.1.total_cmp(&b.1));
            let Some((position, _)) = worst else { break };
            let rod = candidates.remove(position);
            let mut trial = active.clone();
            trial.push(rod);
            if let Some(trial_gaps) = self.solve_active(&rest, &stiffness, &trial) {
                active.push(rod);
                gaps = trial_gaps;
            }
        }

        let mut gaps: Vec<f32> = gaps.into_iter().map(|gap| gap.max(0.0) as f32).collect();
        for rod in &self.rods {
            let shortfall = rod.shortfall(&gaps);
            if shortfall > 0.0 {
                gaps[rod.last_gap] += shortfall;
            }
        }
        SpacingSolution { gaps, activated: active, rounds }
    }

    fn violation(&self, rod: usize, gaps: &[f64]) -> f64 {
        let rod = &self.rods[rod];
        rod.length as f64 - gaps[rod.first_gap..=rod.last_gap].iter().sum::<f64>()
    }

    /// Multi-gap rods, keeping only the longest of rods with the same span
    fn distinct_multi_gap_rods(&self) -> Vec<usize> {
        let mut distinct: Vec<usize> = Vec::new();
        for (index, rod) in self.rods.iter().enumerate() {
            if rod.is_single_gap() {
                continue;
            }
            let same_span = distinct.iter().position(|other| {
                let other = &self.rods[*other];
                other.first_gap == rod.first_gap && other.last_gap == rod.last_gap
            });
            match same_span {
                Some(position) if self.rods[distinct[position]].length < rod.length => distinct[position] = index,
                Some(_) => {}
                None => distinct.push(index),
            }
        }
        distinct
    }

    /// Minimum-energy gaps with every rod in `active` held at its length
    fn solve_active(&self, rest: &[f64], stiffness: &[f64], active: &[usize]) -> Option<Vec<f64>> {
        let gap_count = rest.len();
        let size = gap_count + active.len();
        let mut matrix = vec![vec![0.0_f64; size + 1]; size];
        for gap in 0..gap_count {
            matrix[gap][gap] = stiffness[gap];
            matrix[gap][size] = stiffness[gap] * rest[gap];
        }
        for (row, rod) in active.iter().enumerate() {
            let rod = &self.rods[*rod];
            let constraint = gap_count + row;
            for gap in rod.first_gap..=rod.last_gap {
                matrix[gap][constraint] = 1.0;
                matrix[constraint][gap] = 1.0;
            }
            matrix[constraint][size] = rod.length as f64;
        }
        let solution = gaussian_elimination(matrix)?;
        Some(solution[..gap_count].to_vec())
    }
}

/// Solves an augmented `n x (n + 1)` system with partial pivoting
fn gaussian_elimination(mut matrix: Vec<Vec<f64>>) -> Option<Vec<f64>> {
    let size = matrix.len();
    for column in 0..size {
        let pivot = (column..size).max_by(|a, b| matrix[*a][column].abs().total_cmp(&matrix[*b][column].abs()))?;
        if matrix[pivot][column].abs() < PIVOT_EPSILON {
            return None;
        }
        matrix.swap(column, pivot);
        for row in column + 1..size {
            let factor = matrix[row][column] / matrix[column][column];
            if factor == 0.0 {
                continue;
            }
            for entry in column..=size {
                matrix[row][entry] -= factor * matrix[column][entry];
            }
        }
    }
    let mut solution = vec![0.0; size];
    for row in (0..size).rev() {
        let known: f64 = (row + 1..size).map(|column| matrix[row][column] * solution[column]).sum();
        solution[row] = (matrix[row][size] - known) / matrix[row][row];
    }
    Some(solution)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_problem(springs: &[f32], rods: &[(usize, usize, f32)]) -> SpacingProblem {
        let mut problem = SpacingProblem::new(springs.to_vec());
        for (first_gap, last_gap, length) in rods {
            problem.add_rod(Rod::new(*first_gap, *last_gap, *length));
        }
        problem
    }

    fn assert_close(actual: &[f32], expected: &[f32]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-3, "{:?} != {:?}", actual, expected);
        }
    }

    fn assert_feasible(problem: &SpacingProblem, gaps: &[f32]) {
        for rod in &problem.rods {
            assert!(rod.span(gaps) + 1e-3 >= rod.length, "rod {:?} violated by {:?}", rod, gaps);
        }
    }

    #[test]
    fn test_springs_alone_keep_rest_lengths() {
        let problem = create_test_problem(&[10.0, 20.0, 0.0], &[]);
        let solution = problem.solve(64);
        assert_close(&solution.gaps, &[10.0, 20.0, 0.0]);
        assert!(solution.activated.is_empty());
    }

    #[test]
    fn test_single_gap_rod_raises_rest_length() {
        let problem = create_test_problem(&[10.0, 10.0], &[(1, 1, 25.0)]);
        let solution = problem.solve(64);
        assert_close(&solution.gaps, &[10.0, 25.0]);
        assert!(solution.activated.is_empty());
    }

    #[test]
    fn test_rod_spreads_over_equal_springs() {
        let problem = create_test_problem(&[10.0, 10.0, 10.0], &[(0, 1, 40.0)]);
        let solution = problem.solve(64);
        assert_close(&solution.gaps, &[20.0, 20.0, 10.0]);
        assert_eq!(solution.activated, vec![0]);
    }

    #[test]
    fn test_stiffer_springs_stretch_less() {
        let problem = create_test_problem(&[10.0, 40.0], &[(0, 1, 100.0)]);
        let solution = problem.solve(64);
        assert_close(&solution.gaps, &[20.0, 80.0]);
    }

    #[test]
    fn test_most_binding_rod_is_activated_first() {
        let problem = create_test_problem(&[10.0, 10.0, 10.0], &[(1, 2, 30.0), (0, 1, 40.0)]);
        let solution = problem.solve(64);
        assert_eq!(solution.activated, vec![1]);
        assert_feasible(&problem, &solution.gaps);
    }

    #[test]
    fn test_last_activated_rod_is_binding() {
        let problem = create_test_problem(&[10.0, 10.0, 10.0, 10.0], &[(0, 1, 40.0), (2, 3, 40.0)]);
        let solution = problem.solve(64);
        assert_eq!(solution.activated, vec![0, 1]);
        assert_feasible(&problem, &solution.gaps);

        let last = *solution.activated.last().unwrap();
        let mut relaxed = problem.clone();
        let removed = relaxed.rods.remove(last);
        let relaxed_solution = relaxed.solve(64);
        assert!(removed.span(&relaxed_solution.gaps) < removed.length);
    }

    #[test]
    fn test_overlapping_rods_are_tight_and_binding() {
        // the rod over gaps 0 and 1 is already satisfied by the other two
        let problem = create_test_problem(&[10.0, 10.0, 10.0, 10.0], &[(0, 2, 60.0), (1, 3, 66.0), (0, 1, 30.0)]);
        let solution = problem.solve(64);
        assert_eq!(solution.activated, vec![1, 0]);
        assert_close(&solution.gaps, &[13.6, 23.2, 23.2, 19.6]);
        assert_feasible(&problem, &solution.gaps);
        for rod in &solution.activated {
            let rod = &problem.rods[*rod];
            assert!((rod.span(&solution.gaps) - rod.length).abs() < 1e-3, "rod {:?} is not tight", rod);
        }

        let width: f32 = solution.gaps.iter().sum();
        let mut relaxed = problem.clone();
        let removed = relaxed.rods.remove(*solution.activated.last().unwrap());
        let relaxed_solution = relaxed.solve(64);
        let relaxed_width: f32 = relaxed_solution.gaps.iter().sum();
        assert!(relaxed_width + 1.0 < width, "{} is not narrower than {}", relaxed_width, width);
        assert!(removed.span(&relaxed_solution.gaps) < removed.length);
        assert_feasible(&relaxed, &relaxed_solution.gaps);
    }

    #[test]
    fn test_duplicate_spans_keep_longest_rod() {
        let problem = create_test_problem(&[10.0, 10.0], &[(0, 1, 30.0), (0, 1, 50.0)]);
        let solution = problem.solve(64);
        assert_eq!(solution.activated, vec![1]);
        assert_close(&solution.gaps, &[25.0, 25.0]);
    }

    #[test]
    fn test_round_cap_still_satisfies_rods() {
        let problem = create_test_problem(&[10.0, 10.0, 10.0, 10.0], &[(0, 1, 40.0), (2, 3, 60.0), (1, 2, 50.0)]);
        let solution = problem.solve(0);
        assert_eq!(solution.rounds, 0);
        assert_feasible(&problem, &solution.gaps);
        assert!(solution.gaps.iter().all(|gap| *gap >= 0.0));
    }

    #[test]
    fn test_dependent_rods_are_satisfied() {
        let problem = create_test_problem(&[10.0, 10.0, 10.0, 10.0], &[(0, 1, 30.0), (2, 3, 30.0), (0, 3, 90.0)]);
        let solution = problem.solve(64);
        assert_feasible(&problem, &solution.gaps);
    }

    #[test]
    fn test_pixels_round_without_breaking_rods() {
        let problem = create_test_problem(&[3.3, 3.3, 3.3], &[(0, 2, 10.0)]);
        let solution = problem.solve(64);
        let pixels = solution.to_pixels(&problem.rods);
        assert!(pixels.iter().sum::<i32>() >= 10);
        assert!(pixels.iter().all(|pixel| *pixel >= 0));
    }

    #[test]
    fn test_gaussian_elimination_pivots() {
        let matrix = vec![vec![0.0, 1.0, 2.0], vec![1.0, 0.0, 3.0]];
        let solution = gaussian_elimination(matrix).unwrap();
        assert!((solution[0] - 3.0).abs() < 1e-9);
        assert!((solution[1] - 2.0).abs() < 1e-9);
        assert!(gaussian_elimination(vec![vec![1.0, 1.0, 1.0], vec![1.0, 1.0, 2.0]]).is_none());
    }
}
