//! In-memory index over one satellite snapshot.
//!
//! Cells are bulk-loaded into an R-tree over raw `[latitude, longitude]`
//! degrees. Because the flat-earth distance is a scaled Euclidean distance in
//! those same coordinates, the tree answers radius queries directly; the exact
//! `dist <= radius` predicate is re-applied afterwards so boundary cells are
//! decided by the same formula everywhere.

use crate::geodesy::{flat_distance_km, project, KM_PER_DEGREE};
use crate::types::grid_cell::GridCell;
use crate::types::location::Location;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// A cell tagged with its position in the original snapshot, so query results
/// can be returned in snapshot order.
#[derive(Debug, Clone)]
struct IndexedCell {
    index: usize,
    cell: GridCell,
}

impl RTreeObject for IndexedCell {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.cell.latitude, self.cell.longitude])
    }
}

impl PointDistance for IndexedCell {
    /// Squared Euclidean distance in degrees.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.cell.latitude - point[0];
        let dy = self.cell.longitude - point[1];
        dx * dx + dy * dy
    }
}

/// The cells of one snapshot with radius and directional queries.
///
/// Built once per snapshot and dropped once that snapshot's features are
/// extracted.
#[derive(Debug, Clone)]
pub struct GridCellStore {
    cells: Vec<GridCell>,
    rtree: RTree<IndexedCell>,
}

impl GridCellStore {
    pub fn new(cells: Vec<GridCell>) -> Self {
        // Cells with non-finite coordinates can never be within any radius.
        let indexed: Vec<IndexedCell> = cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.latitude.is_finite() && cell.longitude.is_finite())
            .map(|(index, cell)| IndexedCell { index, cell: *cell })
            .collect();

        GridCellStore {
            rtree: RTree::bulk_load(indexed),
            cells,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    /// The cell closest to `target` by flat-earth distance.
    ///
    /// Ties go to the cell that appears first in the snapshot. Returns `None`
    /// for an empty snapshot.
    pub fn nearest(&self, target: Location) -> Option<&GridCell> {
        let mut best: Option<(&GridCell, f64)> = None;
        for cell in &self.cells {
            let dist = flat_distance_km(target, cell.location());
            match best {
                Some((_, best_dist)) if dist >= best_dist => {}
                _ if dist.is_nan() => {}
                _ => best = Some((cell, dist)),
            }
        }
        best.map(|(cell, _)| cell)
    }

    /// All cells whose flat-earth distance to `center` is at most `radius_km`,
    /// in snapshot order.
    pub fn within_radius(&self, center: Location, radius_km: f64) -> Vec<&GridCell> {
        if !(radius_km >= 0.0) {
            return vec![];
        }
        // Slightly widened so rounding in the degree conversion never drops a
        // boundary cell before the exact check.
        let search_radius = radius_km / KM_PER_DEGREE * (1.0 + 1e-9) + 1e-12;

        let mut hits: Vec<&IndexedCell> = self
            .rtree
            .locate_within_distance(center.as_point(), search_radius * search_radius)
            .filter(|entry| flat_distance_km(center, entry.cell.location()) <= radius_km)
            .collect();
        hits.sort_by_key(|entry| entry.index);

        hits.into_iter().map(|entry| &entry.cell).collect()
    }

    /// Cells within `collect_radius_km` of the point `distance_km` away from
    /// `origin` along `bearing_degrees`.
    pub fn around_projected(
        &self,
        origin: Location,
        bearing_degrees: f64,
        distance_km: f64,
        collect_radius_km: f64,
    ) -> Vec<&GridCell> {
        let target = project(origin, bearing_degrees, distance_km);
        self.within_radius(target, collect_radius_km)
    }
}
