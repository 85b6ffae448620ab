//! Concentric zones of the grid and the ring-walk used to place pixels inside them.
//!
//! Zone membership is decided on squared integer distances so that boundary pixels classify the
//! same way everywhere.

use derive_enum_all_values::AllValues;
use pixelrts_curve::Coord;
use serde::{Deserialize, Serialize};

/// A concentric ring of the grid, ordered from the centre outwards.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, AllValues,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Zone {
    /// Centre of the grid.
    Hot,
    /// Ring around the centre.
    Warm,
    /// Middle ring.
    Temperate,
    /// Outer ring.
    Cool,
    /// Edges and corners.
    Cold,
}

impl Zone {
    /// Rank of the zone, `0` for [`Zone::Hot`] up to `4` for [`Zone::Cold`].
    #[inline]
    pub const fn rank(self) -> usize {
        self as usize
    }

    /// Outer boundary as a fraction of the maximum radius.
    pub const fn outer_fraction(self) -> f64 {
        self.outer_sixteenths() as f64 / 16.0
    }

    /// Outer boundary in sixteenths of the maximum radius (1, 3, 7, 11, 16).
    const fn outer_sixteenths(self) -> u64 {
        match self {
            Zone::Hot => 1,
            Zone::Warm => 3,
            Zone::Temperate => 7,
            Zone::Cool => 11,
            Zone::Cold => 16,
        }
    }

    /// The next colder zone, if any.
    pub const fn colder(self) -> Option<Zone> {
        match self {
            Zone::Hot => Some(Zone::Warm),
            Zone::Warm => Some(Zone::Temperate),
            Zone::Temperate => Some(Zone::Cool),
            Zone::Cool => Some(Zone::Cold),
            Zone::Cold => None,
        }
    }

    /// The next hotter zone, if any.
    pub const fn hotter(self) -> Option<Zone> {
        match self {
            Zone::Hot => None,
            Zone::Warm => Some(Zone::Hot),
            Zone::Temperate => Some(Zone::Warm),
            Zone::Cool => Some(Zone::Temperate),
            Zone::Cold => Some(Zone::Cool),
        }
    }
}

/// Maps grid coordinates to zones for one grid size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneManager {
    grid_size: u32,
    center: Coord,
    max_radius: u32,
}

impl ZoneManager {
    /// Creates the zone map for a `grid_size × grid_size` grid.
    pub fn new(grid_size: u32) -> Self {
        Self {
            grid_size,
            center: Coord::new(grid_size / 2, grid_size / 2),
            max_radius: (grid_size / 2).max(1),
        }
    }

    /// Side length of the grid.
    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// Centre of the grid.
    pub fn center(&self) -> Coord {
        self.center
    }

    /// Radius that [`Zone::Cold`]'s outer boundary is measured against.
    pub fn max_radius(&self) -> u32 {
        self.max_radius
    }

    /// Zone of `(x, y)`. Points beyond the maximum radius (the grid corners) are [`Zone::Cold`].
    pub fn classify(&self, x: u32, y: u32) -> Zone {
        let distance_sq = self.distance_sq(i64::from(x), i64::from(y));
        Zone::all_values()
            .iter()
            .copied()
            .find(|&zone| distance_sq * 256 <= self.scaled_outer_sq(zone))
            .unwrap_or(Zone::Cold)
    }

    /// Zone of a coordinate.
    #[inline]
    pub fn zone_of(&self, coord: Coord) -> Zone {
        self.classify(coord.x, coord.y)
    }

    /// Inner and outer radius of `zone` in whole pixels, rounded down.
    ///
    /// For reporting only; membership is decided by [`Self::classify`].
    pub fn zone_boundaries(&self, zone: Zone) -> (u32, u32) {
        let radius = u64::from(self.max_radius);
        let inner = zone
            .hotter()
            .map_or(0, |hotter| hotter.outer_sixteenths() * radius / 16);
        let outer = zone.outer_sixteenths() * radius / 16;
        (inner as u32, outer as u32)
    }

    /// Exact number of grid pixels in every zone, indexed by [`Zone::rank`].
    ///
    /// Runs in `O(grid_size)` by counting the chord each zone cuts through every row.
    pub fn pixel_counts(&self) -> [u64; 5] {
        let mut within = [0u64; 5];
        let center = i64::from(self.center.x);
        let grid = i64::from(self.grid_size);
        for y in 0..grid {
            let dy = y - i64::from(self.center.y);
            for zone in Zone::all_values() {
                let room = self.scaled_outer_sq(*zone) - 256 * dy * dy;
                if room < 0 {
                    continue;
                }
                let reach = isqrt((room / 256) as u64) as i64;
                let start = (center - reach).max(0);
                let end = (center + reach).min(grid - 1);
                if end >= start {
                    within[zone.rank()] += (end - start + 1) as u64;
                }
            }
        }

        let total = u64::from(self.grid_size) * u64::from(self.grid_size);
        let mut counts = [0u64; 5];
        let mut inner = 0;
        for zone in Zone::all_values() {
            let outer = if *zone == Zone::Cold { total } else { within[zone.rank()] };
            counts[zone.rank()] = outer - inner;
            inner = outer;
        }
        counts
    }

    /// Walks a square spiral out of the centre and returns up to `count` grid coordinates that
    /// [`Self::classify`] places in `zone`, nearest rings first.
    pub fn allocate_in_zone(&self, zone: Zone, count: usize) -> Vec<Coord> {
        let available = usize::try_from(self.pixel_counts()[zone.rank()]).unwrap_or(usize::MAX);
        let wanted = count.min(available);
        let grid = i64::from(self.grid_size);
        let limit = 2 * grid + 2;

        let mut coords = Vec::with_capacity(wanted);
        let (mut x, mut y) = (i64::from(self.center.x), i64::from(self.center.y));
        let (mut dx, mut dy) = (1i64, 0i64);
        let mut segment_length = 1;
        let mut segment_passed = 0;
        let mut turns = 0;

        while coords.len() < wanted && segment_length <= limit {
            if (0..grid).contains(&x) && (0..grid).contains(&y) {
                let coord = Coord::new(x as u32, y as u32);
                if self.zone_of(coord) == zone {
                    coords.push(coord);
                }
            }

            x += dx;
            y += dy;
            segment_passed += 1;
            if segment_passed == segment_length {
                segment_passed = 0;
                turns += 1;
                (dx, dy) = (-dy, dx);
                if turns % 2 == 0 {
                    segment_length += 1;
                }
            }
        }
        coords
    }

    #[inline]
    fn distance_sq(&self, x: i64, y: i64) -> i64 {
        let dx = x - i64::from(self.center.x);
        let dy = y - i64::from(self.center.y);
        dx * dx + dy * dy
    }

    /// `(outer_sixteenths × max_radius)²`, compared against `256 × distance²`.
    #[inline]
    fn scaled_outer_sq(&self, zone: Zone) -> i64 {
        let scaled = zone.outer_sixteenths() as i64 * i64::from(self.max_radius);
        scaled * scaled
    }
}

/// Integer square root, rounded down.
fn isqrt(value: u64) -> u64 {
    let mut root = (value as f64).sqrt() as u64;
    while root * root > value {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= value {
        root += 1;
    }
    root
}
