use crate::types::grid_cell::GridCell;

/// Summary statistics over the valid values of a cell subset.
///
/// Only finite, positive values take part. An empty (or all-invalid) subset
/// yields all zeros rather than NaN.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CellStats {
    pub avg: f64,
    pub max: f64,
    pub min: f64,
    /// Population standard deviation (divides by `n`).
    pub std: f64,
    pub count: usize,
}

impl CellStats {
    pub fn from_cells<'a>(cells: impl IntoIterator<Item = &'a GridCell>) -> Self {
        let values: Vec<f64> = cells
            .into_iter()
            .filter(|cell| cell.is_valid())
            .map(|cell| cell.value)
            .collect();
        Self::from_values(&values)
    }

    fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let avg = values.iter().sum::<f64>() / n;
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let variance = values.iter().map(|v| (v - avg) * (v - avg)).sum::<f64>() / n;

        Self {
            avg,
            max,
            min,
            std: variance.sqrt(),
            count: values.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_subset_is_all_zero() {
        let stats = CellStats::from_cells(&Vec::<GridCell>::new());
        assert_eq!(stats, CellStats::default());
        assert_eq!(stats.avg, 0.0);
        assert_eq!(stats.std, 0.0);
    }

    #[test]
    fn test_invalid_values_are_excluded() {
        let cells = [
            GridCell::new(0.0, 0.0, 2.0),
            GridCell::new(0.0, 0.0, f64::NAN),
            GridCell::new(0.0, 0.0, -1.0),
            GridCell::new(0.0, 0.0, 0.0),
            GridCell::new(0.0, 0.0, f64::INFINITY),
            GridCell::new(0.0, 0.0, 4.0),
        ];
        let stats = CellStats::from_cells(&cells);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.avg, 3.0);
        assert_eq!(stats.max, 4.0);
        assert_eq!(stats.min, 2.0);
        assert_relative_eq!(stats.std, 1.0);
    }

    #[test]
    fn test_all_invalid_is_all_zero() {
        let cells = [GridCell::new(0.0, 0.0, -3.0), GridCell::new(0.0, 0.0, f64::NAN)];
        assert_eq!(CellStats::from_cells(&cells), CellStats::default());
    }

    #[test]
    fn test_population_std() {
        let cells: Vec<GridCell> = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]
            .iter()
            .map(|v| GridCell::new(0.0, 0.0, *v))
            .collect();
        let stats = CellStats::from_cells(&cells);
        assert_relative_eq!(stats.avg, 5.0);
        assert_relative_eq!(stats.std, 2.0);
    }
}
