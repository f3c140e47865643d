use super::*;
use rustc_hash::FxHashMap as HashMap;
use std::ops::ControlFlow;

/// Which grid cells to look in when searching around a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellSearch {
    /// Only the cell the point falls in.
    ///
    /// Points near a cell edge will miss neighbors that are close by but fall in the adjacent
    /// cell.
    SingleCell,
    /// The cell the point falls in and the 8 cells that surround it.
    ///
    /// As long as the cells are at least as wide as the search radius, this finds every point
    /// within the search radius.
    #[default]
    Neighborhood,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CellKey {
    row: i64,
    col: i64,
}

/// A uniform lat-lon grid over a slice of located items.
///
/// The index only stores positions into the slice, so the items themselves are never moved or
/// copied. Within a cell the items keep the order they had in the slice.
#[derive(Debug)]
pub(crate) struct GridIndex<'a, T> {
    cells: HashMap<CellKey, Vec<usize>>,
    cells_per_degree: f64,
    search: CellSearch,
    data: &'a [T],
}

impl<'a, T: Geo> GridIndex<'a, T> {
    /// Build an index over `data` with square cells `cell_size` degrees on a side.
    pub fn build_for(data: &'a [T], cell_size: f64, search: CellSearch) -> Self {
        debug_assert!(cell_size > 0.0);

        let cells_per_degree = 1.0 / cell_size;

        let mut cells: HashMap<CellKey, Vec<usize>> = HashMap::default();
        for (index, item) in data.iter().enumerate() {
            let key = Self::cell_key(cells_per_degree, item.coord());
            cells.entry(key).or_default().push(index);
        }

        GridIndex {
            cells,
            cells_per_degree,
            search,
            data,
        }
    }

    fn cell_key(cells_per_degree: f64, coord: Coord) -> CellKey {
        CellKey {
            row: (coord.lat * cells_per_degree).floor() as i64,
            col: (coord.lon * cells_per_degree).floor() as i64,
        }
    }

    /// Apply a function to every item in the cells searched around `coord`.
    ///
    /// `user_data` is threaded through the calls like the accumulator of a fold. If `visit`
    /// returns `Break(..)`, no more items are visited.
    pub fn foreach<V, F>(&self, coord: Coord, user_data: V, mut visit: F) -> V
    where
        F: FnMut(&T, usize, V) -> ControlFlow<V, V>,
    {
        let center = Self::cell_key(self.cells_per_degree, coord);

        let reach: i64 = match self.search {
            CellSearch::SingleCell => 0,
            CellSearch::Neighborhood => 1,
        };

        let mut user_data = user_data;
        // Keys saturate for huge cell counts, so the bounds must too.
        let rows = center.row.saturating_sub(reach)..=center.row.saturating_add(reach);
        for row in rows {
            let cols = center.col.saturating_sub(reach)..=center.col.saturating_add(reach);
            for col in cols {
                let indexes = match self.cells.get(&CellKey { row, col }) {
                    Some(indexes) => indexes,
                    None => continue,
                };

                for &index in indexes {
                    match visit(&self.data[index], index, user_data) {
                        ControlFlow::Continue(value) => user_data = value,
                        ControlFlow::Break(value) => return value,
                    }
                }
            }
        }

        user_data
    }

    /// Find the closest item strictly less than `max_distance` degrees from `coord`.
    ///
    /// When several items are the same distance away, the one that comes first in the slice wins.
    pub fn nearest_within(&self, coord: Coord, max_distance: f64) -> Option<usize> {
        let best: Option<(usize, f64)> = self.foreach(coord, None, |item, index, best| {
            let distance = item.coord().degree_distance(&coord);

            if distance >= max_distance {
                return ControlFlow::Continue(best);
            }

            let closer = match best {
                None => true,
                Some((best_index, best_distance)) => {
                    distance < best_distance || (distance == best_distance && index < best_index)
                }
            };

            if closer {
                ControlFlow::Continue(Some((index, distance)))
            } else {
                ControlFlow::Continue(best)
            }
        });

        best.map(|(index, _)| index)
    }

    /// The number of non-empty cells in the grid.
    #[cfg(test)]
    fn num_cells(&self) -> usize {
        self.cells.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Clone, Debug)]
    struct LabeledPoint {
        coord: Coord,
        label: &'static str,
    }

    impl LabeledPoint {
        fn new(lat: f64, lon: f64, label: &'static str) -> Self {
            LabeledPoint {
                coord: Coord { lat, lon },
                label,
            }
        }
    }

    impl Geo for LabeledPoint {
        fn coord(&self) -> Coord {
            self.coord
        }
    }

    #[test]
    fn test_cell_keys() {
        let points = [
            LabeledPoint::new(10.000, 20.000, "a"),
            LabeledPoint::new(10.001, 20.001, "b"),
            LabeledPoint::new(10.011, 20.001, "c"),
            LabeledPoint::new(-0.005, -0.005, "d"),
        ];

        let grid = GridIndex::build_for(&points, 0.01, CellSearch::SingleCell);

        // a and b share a cell.
        assert_eq!(grid.num_cells(), 3);

        let key = GridIndex::<LabeledPoint>::cell_key(100.0, points[3].coord);
        assert_eq!(key, CellKey { row: -1, col: -1 });
    }

    #[test]
    fn test_nearest_picks_closest() {
        let points = [
            LabeledPoint::new(10.004, 20.004, "far"),
            LabeledPoint::new(10.001, 20.001, "near"),
            LabeledPoint::new(10.5, 20.5, "way off"),
        ];

        let grid = GridIndex::build_for(&points, 0.01, CellSearch::Neighborhood);

        let target = Coord {
            lat: 10.0,
            lon: 20.0,
        };
        let found = grid.nearest_within(target, 0.01).unwrap();
        assert_eq!(points[found].label, "near");

        let lonely = Coord {
            lat: 50.0,
            lon: 20.0,
        };
        assert!(grid.nearest_within(lonely, 0.01).is_none());
    }

    #[test]
    fn test_nearest_ties_go_to_first() {
        let same_spot = [
            LabeledPoint::new(10.0, 20.0, "first"),
            LabeledPoint::new(10.0, 20.0, "second"),
        ];
        let grid = GridIndex::build_for(&same_spot, 0.01, CellSearch::Neighborhood);
        let target = Coord {
            lat: 10.001,
            lon: 20.0,
        };

        let found = grid.nearest_within(target, 0.01).unwrap();
        assert_eq!(same_spot[found].label, "first");
    }

    #[test]
    fn test_search_across_cell_edge() {
        // Close together, but on opposite sides of a cell boundary at lat 10.00
        let points = [LabeledPoint::new(9.9995, 20.005, "south of edge")];
        let target = Coord {
            lat: 10.0005,
            lon: 20.005,
        };

        let single = GridIndex::build_for(&points, 0.01, CellSearch::SingleCell);
        assert!(single.nearest_within(target, 0.01).is_none());

        let hood = GridIndex::build_for(&points, 0.01, CellSearch::Neighborhood);
        assert_eq!(hood.nearest_within(target, 0.01), Some(0));
    }

    #[test]
    fn test_tiny_cells_saturate() {
        let points = [
            LabeledPoint::new(45.0, -120.0, "northwest"),
            LabeledPoint::new(-45.0, 120.0, "southeast"),
        ];
        let grid = GridIndex::build_for(&points, 1.0e-300, CellSearch::Neighborhood);

        let key = GridIndex::<LabeledPoint>::cell_key(1.0e300, points[0].coord);
        assert_eq!(
            key,
            CellKey {
                row: i64::MAX,
                col: i64::MIN
            }
        );

        assert_eq!(grid.nearest_within(points[0].coord, 1.0e-300), Some(0));

        let nearby = Coord {
            lat: 45.001,
            lon: -120.0,
        };
        assert_eq!(grid.nearest_within(nearby, 1.0), Some(0));
        assert_eq!(grid.nearest_within(points[1].coord, 1.0), Some(1));
    }

    #[test]
    fn test_distance_is_strict() {
        let points = [LabeledPoint::new(0.0, 20.0, "origin")];
        let grid = GridIndex::build_for(&points, 0.01, CellSearch::Neighborhood);

        let at_threshold = Coord {
            lat: 0.01,
            lon: 20.0,
        };
        assert!(grid.nearest_within(at_threshold, 0.01).is_none());

        let inside = Coord {
            lat: 0.00999,
            lon: 20.0,
        };
        assert_eq!(grid.nearest_within(inside, 0.01), Some(0));
    }

    #[test]
    fn test_foreach_break() {
        let points = [
            LabeledPoint::new(10.001, 20.001, "a"),
            LabeledPoint::new(10.002, 20.002, "b"),
            LabeledPoint::new(10.003, 20.003, "c"),
        ];
        let grid = GridIndex::build_for(&points, 0.01, CellSearch::Neighborhood);
        let target = Coord {
            lat: 10.0,
            lon: 20.0,
        };

        let all = grid.foreach(target, 0, |_, _, count| ControlFlow::Continue(count + 1));
        assert_eq!(all, 3);

        let stopped = grid.foreach(target, 0, |_, _, count| {
            if count == 1 {
                ControlFlow::Break(count)
            } else {
                ControlFlow::Continue(count + 1)
            }
        });
        assert_eq!(stopped, 1);
    }

    #[test]
    fn test_empty_grid() {
        let points: [LabeledPoint; 0] = [];
        let grid = GridIndex::build_for(&points, 0.01, CellSearch::Neighborhood);
        assert_eq!(grid.num_cells(), 0);
        assert!(grid.nearest_within(Coord::default(), 0.01).is_none());
    }
}
