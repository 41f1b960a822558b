use serde::{Deserialize, Serialize};

use crate::dot::{Dot, DotId};
use crate::error::DotsError;

// Keeps a pathological sector size from allocating an unbounded table.
const MAX_SECTORS: usize = 1 << 20;
const LOOKAHEAD_QUARTERS: u8 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Sector {
    pub x: i32,
    pub y: i32,
}

impl Sector {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Fixed table of square sectors covering the area plus one ring below the
/// origin on each axis. Each sector lists the dots registered in it.
#[derive(Debug, Default)]
pub struct SectorIndex {
    sector_size: f32,
    // Sectors span `-1..=max_x` and `-1..=max_y`.
    max_x: i32,
    max_y: i32,
    cols: usize,
    cells: Vec<Vec<DotId>>,
    built: bool,
}

impl SectorIndex {
    pub fn new(width: f32, height: f32, sector_size: f32) -> Result<Self, DotsError> {
        let mut index = Self::default();
        index.build(width, height, sector_size)?;
        Ok(index)
    }

    /// Replaces every sector with an empty one covering `width` x `height`.
    pub fn build(&mut self, width: f32, height: f32, sector_size: f32) -> Result<(), DotsError> {
        if !sector_size.is_finite() || sector_size <= 0.0 {
            return Err(DotsError::InvalidSectorSize(sector_size));
        }
        if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
            return Err(DotsError::InvalidArea { width, height });
        }

        let max_x = (width / sector_size).floor();
        let max_y = (height / sector_size).floor();
        // Checked as floats so huge areas never reach an integer cast.
        if max_x + 2.0 > MAX_SECTORS as f32
            || max_y + 2.0 > MAX_SECTORS as f32
            || (max_x + 2.0) * (max_y + 2.0) > MAX_SECTORS as f32
        {
            return Err(DotsError::TooManySectors {
                cols: (max_x as usize).saturating_add(2),
                rows: (max_y as usize).saturating_add(2),
            });
        }
        let cols = max_x as usize + 2;
        let rows = max_y as usize + 2;

        self.sector_size = sector_size;
        self.max_x = max_x as i32;
        self.max_y = max_y as i32;
        self.cols = cols;
        self.cells.clear();
        self.cells.resize_with(cols * rows, Vec::new);
        self.built = true;
        Ok(())
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn sector_size(&self) -> f32 {
        self.sector_size
    }

    pub fn sector_count(&self) -> usize {
        self.cells.len()
    }

    pub fn cell_of(&self, x: f32, y: f32) -> Sector {
        self.assert_built();
        Sector::new(
            (x / self.sector_size).floor() as i32,
            (y / self.sector_size).floor() as i32,
        )
    }

    /// Moves `dot` from the sectors it was recorded in to the sectors around
    /// its current position and one unit-time step ahead in four headings.
    pub fn register(&mut self, dot: &mut Dot) {
        self.assert_built();
        self.unregister(dot);

        let mut candidates = [self.cell_of(dot.x, dot.y); 1 + LOOKAHEAD_QUARTERS as usize];
        for quarter in 0..LOOKAHEAD_QUARTERS {
            let (x, y) = dot.lookahead(quarter);
            candidates[1 + quarter as usize] = self.cell_of(x, y);
        }

        for sector in candidates {
            if dot.sectors.contains(&sector) {
                continue;
            }
            if let Some(slot) = self.slot(sector) {
                self.cells[slot].push(dot.id);
                dot.sectors.push(sector);
            }
        }
    }

    pub fn unregister(&mut self, dot: &mut Dot) {
        self.assert_built();
        for sector in dot.sectors.drain(..) {
            let Some(slot) = self.slot(sector) else {
                continue;
            };
            let cell = &mut self.cells[slot];
            if let Some(position) = cell.iter().position(|&id| id == dot.id) {
                cell.swap_remove(position);
            }
        }
    }

    /// Distinct ids sharing any sector with `dot`, excluding `dot`, in ascending order.
    pub fn neighbors_near(&self, dot: &Dot) -> Vec<DotId> {
        self.assert_built();
        let mut neighbors = Vec::new();
        for &sector in &dot.sectors {
            if let Some(slot) = self.slot(sector) {
                neighbors.extend(self.cells[slot].iter().copied().filter(|&id| id != dot.id));
            }
        }
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }

    pub fn dots_in(&self, sector: Sector) -> &[DotId] {
        self.assert_built();
        self.slot(sector)
            .map(|slot| self.cells[slot].as_slice())
            .unwrap_or(&[])
    }

    fn slot(&self, sector: Sector) -> Option<usize> {
        if sector.x < -1 || sector.y < -1 || sector.x > self.max_x || sector.y > self.max_y {
            return None;
        }
        Some((sector.y + 1) as usize * self.cols + (sector.x + 1) as usize)
    }

    fn assert_built(&self) {
        assert!(self.built, "sector index used before build");
    }
}

#[cfg(test)]
mod tests {
    use super::{Sector, SectorIndex};
    use crate::dot::{Dot, DotId, DotSpec, FillColor};
    use crate::error::DotsError;

    fn dot(id: u32, x: f32, y: f32, direction: f32, speed: f32) -> Dot {
        Dot::new(
            DotId(id),
            DotSpec {
                x,
                y,
                radius: 5.0,
                direction,
                speed,
                fill: FillColor::default(),
            },
        )
    }

    #[test]
    fn build_covers_area_plus_outer_ring() {
        let index = SectorIndex::new(400.0, 300.0, 100.0).unwrap();
        // x: -1..=4, y: -1..=3
        assert_eq!(index.sector_count(), 6 * 5);
        assert_eq!(index.cell_of(399.0, 0.0), Sector::new(3, 0));
        assert_eq!(index.cell_of(-0.5, 300.0), Sector::new(-1, 3));
        assert!(index.dots_in(Sector::new(5, 0)).is_empty());
        assert!(index.dots_in(Sector::new(-2, 0)).is_empty());
    }

    #[test]
    fn build_rejects_bad_dimensions() {
        let mut index = SectorIndex::default();
        assert_eq!(
            index.build(400.0, 300.0, 0.0),
            Err(DotsError::InvalidSectorSize(0.0))
        );
        assert!(index.build(0.0, 300.0, 100.0).is_err());
        assert!(matches!(
            index.build(1.0e6, 1.0e6, 1.0),
            Err(DotsError::TooManySectors { .. })
        ));
        assert!(!index.is_built());
    }

    #[test]
    fn register_includes_true_sector_and_lookahead() {
        let mut index = SectorIndex::new(400.0, 300.0, 100.0).unwrap();
        let mut fast = dot(1, 95.0, 150.0, 0.0, 10.0);
        index.register(&mut fast);

        assert!(fast.sectors().contains(&Sector::new(0, 1)));
        assert!(fast.sectors().contains(&Sector::new(1, 1)));
        assert_eq!(index.dots_in(Sector::new(1, 1)), &[DotId(1)]);
        assert!(fast.sectors().len() <= 5);
    }

    #[test]
    fn reregistration_purges_old_sectors() {
        let mut index = SectorIndex::new(400.0, 300.0, 100.0).unwrap();
        let mut moving = dot(1, 50.0, 50.0, 0.0, 1.0);
        index.register(&mut moving);
        assert_eq!(index.dots_in(Sector::new(0, 0)), &[DotId(1)]);

        moving.x = 350.0;
        moving.y = 250.0;
        index.register(&mut moving);
        assert!(index.dots_in(Sector::new(0, 0)).is_empty());
        assert_eq!(index.dots_in(Sector::new(3, 2)), &[DotId(1)]);
        assert_eq!(moving.sectors(), &[Sector::new(3, 2)]);
    }

    #[test]
    fn out_of_table_sectors_are_skipped() {
        let mut index = SectorIndex::new(400.0, 300.0, 100.0).unwrap();
        let mut far = dot(1, 1000.0, 1000.0, 0.0, 10.0);
        index.register(&mut far);
        assert!(far.sectors().is_empty());
    }

    #[test]
    fn neighbors_are_distinct_and_exclude_self() {
        let mut index = SectorIndex::new(400.0, 300.0, 100.0).unwrap();
        let mut a = dot(1, 95.0, 150.0, 0.0, 10.0);
        let mut b = dot(2, 98.0, 150.0, 0.0, 10.0);
        let mut c = dot(3, 350.0, 50.0, 0.0, 1.0);
        index.register(&mut a);
        index.register(&mut b);
        index.register(&mut c);

        assert_eq!(index.neighbors_near(&a), vec![DotId(2)]);
        assert_eq!(index.neighbors_near(&b), vec![DotId(1)]);
        assert!(index.neighbors_near(&c).is_empty());

        index.unregister(&mut b);
        assert!(index.neighbors_near(&a).is_empty());
    }

    #[test]
    fn rebuild_clears_previous_memberships() {
        let mut index = SectorIndex::new(400.0, 300.0, 100.0).unwrap();
        let mut a = dot(1, 50.0, 50.0, 0.0, 1.0);
        index.register(&mut a);
        index.build(800.0, 600.0, 100.0).unwrap();
        assert!(index.dots_in(Sector::new(0, 0)).is_empty());

        index.register(&mut a);
        assert_eq!(index.dots_in(Sector::new(0, 0)), &[DotId(1)]);
    }

    #[test]
    fn huge_areas_are_rejected_without_overflow() {
        assert!(matches!(
            SectorIndex::new(1.0e30, 300.0, 1.0),
            Err(DotsError::TooManySectors { .. })
        ));
        assert!(matches!(
            SectorIndex::new(f32::MAX, f32::MAX, 100.0),
            Err(DotsError::TooManySectors { .. })
        ));
        assert!(SectorIndex::new(1000.0, 1000.0, 1.0).is_ok());
    }

    #[test]
    #[should_panic(expected = "sector index used before build")]
    fn unbuilt_index_rejects_cell_lookup() {
        let index = SectorIndex::default();
        let _ = index.cell_of(10.0, 10.0);
    }

    #[test]
    #[should_panic(expected = "sector index used before build")]
    fn unbuilt_index_fails_fast() {
        let index = SectorIndex::default();
        let lone = dot(1, 0.0, 0.0, 0.0, 1.0);
        let _ = index.neighbors_near(&lone);
    }
}
