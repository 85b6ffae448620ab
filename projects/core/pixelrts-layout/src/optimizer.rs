//! The layout optimizer: files, fragments, defragmentation and export.

use crate::allocator::BlockAllocator;
use crate::block::{AccessFrequency, BlockSize};
use crate::classify::classify_file;
use crate::error::{AllocationError, LayoutResult};
use crate::zone::Zone;
use log::{debug, info, warn};
use pixelrts_common::hash::sha256_hex;
use pixelrts_curve::{Coord, HilbertCurve};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// A file to be placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpec {
    /// Name or path, used for classification.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Zone override. Classified from the name when `None`.
    pub zone: Option<Zone>,
    /// Frequency override. Classified from the name when `None`.
    pub frequency: Option<AccessFrequency>,
}

impl FileSpec {
    /// Describes a file to be classified automatically.
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            zone: None,
            frequency: None,
        }
    }

    /// Forces the file into `zone`.
    pub fn zone(mut self, zone: Zone) -> Self {
        self.zone = Some(zone);
        self
    }

    /// Forces the access frequency.
    pub fn frequency(mut self, frequency: AccessFrequency) -> Self {
        self.frequency = Some(frequency);
        self
    }
}

/// A placed piece of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFragment {
    /// Fragment identifier, unique within the layout.
    pub fragment_id: u64,
    /// Owning file.
    pub file_id: String,
    /// Group holding the fragment.
    pub block_group_id: u32,
    /// Block within the group.
    pub block_id: u32,
    /// Offset of the fragment within the file.
    pub offset: u64,
    /// Fragment length.
    pub size: u64,
    /// Whether this is the fragment at offset 0.
    pub is_primary: bool,
}

/// A file known to the layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Layout-assigned identifier (`file_N`).
    pub file_id: String,
    /// Name the file was added under.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Zone the file was placed in.
    pub zone: Zone,
    /// Access frequency used for sizing.
    pub access_frequency: AccessFrequency,
    /// Recommended block size.
    pub block_size: BlockSize,
    /// Placed fragments, in offset order.
    pub fragments: Vec<FileFragment>,
    /// First 16 hex digits of the SHA-256 of the name.
    pub name_hash: String,
}

impl FileEntry {
    /// Bytes covered by fragments.
    pub fn placed_bytes(&self) -> u64 {
        self.fragments.iter().map(|f| f.size).sum()
    }

    /// Whether every byte of the file was placed.
    pub fn is_complete(&self) -> bool {
        self.placed_bytes() == self.size
    }

    /// Bytes that could not be placed.
    pub fn shortfall_bytes(&self) -> u64 {
        self.size - self.placed_bytes()
    }

    /// Fails with an [`AllocationError`] if the file was only partly placed.
    pub fn check_complete(&self) -> Result<(), AllocationError> {
        if self.is_complete() {
            return Ok(());
        }
        Err(AllocationError {
            zone: self.zone,
            requested_bytes: self.size,
            allocated_bytes: self.placed_bytes(),
        })
    }
}

/// Fragmentation scores around a [`LayoutOptimizer::defragment`] call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DefragmentReport {
    /// Score before the rebuild.
    pub before: f64,
    /// Score after the call (equal to `before` when the rebuild was discarded).
    pub after: f64,
    /// Whether the rebuilt layout was kept.
    pub applied: bool,
    /// Number of files in the layout.
    pub files_processed: usize,
}

impl DefragmentReport {
    /// Reduction of the fragmentation score.
    pub fn improvement(&self) -> f64 {
        self.before - self.after
    }
}

/// Utilization of one block group in a [`LayoutSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSnapshot {
    /// Group identifier.
    pub id: u32,
    /// Zone of the group.
    pub zone: Zone,
    /// Block size in bytes.
    pub block_size: BlockSize,
    /// Fraction of blocks in use.
    pub utilization: f64,
}

/// Read-only JSON export of a layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutSnapshot {
    /// Grid side length.
    pub grid_size: u32,
    /// Files by id.
    pub files: BTreeMap<String, FileEntry>,
    /// Every block group.
    pub block_groups: Vec<GroupSnapshot>,
    /// Fraction of groups mixing free and used blocks.
    pub fragmentation_score: f64,
    /// Inner and outer radius of every zone in pixels.
    pub zone_boundaries: BTreeMap<Zone, (u32, u32)>,
    /// Result of the last defragmentation, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defragmentation: Option<DefragmentReport>,
}

/// Places files into zones and block groups of one grid.
///
/// All mutation goes through `&mut self`; share an optimizer across threads behind a lock.
#[derive(Debug, Clone)]
pub struct LayoutOptimizer {
    grid_size: u32,
    allocator: BlockAllocator,
    files: BTreeMap<String, FileEntry>,
    next_file_id: u64,
    next_fragment_id: u64,
    last_defragment: Option<DefragmentReport>,
}

impl LayoutOptimizer {
    /// Creates an empty layout for a `grid_size × grid_size` grid.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Grid`](crate::LayoutError::Grid) if `grid_size` is not a
    /// supported power of two.
    pub fn new(grid_size: u32) -> LayoutResult<Self> {
        HilbertCurve::from_grid_size(grid_size)?;
        Ok(Self {
            grid_size,
            allocator: BlockAllocator::new(grid_size),
            files: BTreeMap::new(),
            next_file_id: 0,
            next_fragment_id: 0,
            last_defragment: None,
        })
    }

    /// Grid side length.
    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// The underlying block allocator.
    pub fn allocator(&self) -> &BlockAllocator {
        &self.allocator
    }

    /// Files by id.
    pub fn files(&self) -> &BTreeMap<String, FileEntry> {
        &self.files
    }

    /// Looks up a file by id.
    pub fn file(&self, file_id: &str) -> Option<&FileEntry> {
        self.files.get(file_id)
    }

    /// Looks up a file by the name it was added under.
    pub fn file_by_name(&self, name: &str) -> Option<&FileEntry> {
        self.files.values().find(|entry| entry.name == name)
    }

    /// Files that could only be partly placed.
    pub fn incomplete_files(&self) -> impl Iterator<Item = &FileEntry> {
        self.files.values().filter(|entry| !entry.is_complete())
    }

    /// Current fragmentation score.
    pub fn fragmentation_score(&self) -> f64 {
        self.allocator.fragmentation_score()
    }

    /// Classifies and places a file.
    ///
    /// The file is recorded even when its zone runs out of blocks. Check
    /// [`FileEntry::is_complete`] or [`Self::incomplete_files`] to detect shortfalls.
    pub fn add_file(&mut self, spec: FileSpec) -> &FileEntry {
        let file_id = format!("file_{}", self.next_file_id);
        self.next_file_id += 1;
        self.place(file_id, spec)
    }

    /// Removes a file and frees its blocks.
    pub fn remove_file(&mut self, file_id: &str) -> Option<FileEntry> {
        let entry = self.files.remove(file_id)?;
        for fragment in &entry.fragments {
            if let Some(group) = self.allocator.group_mut(fragment.block_group_id) {
                group.free(fragment.block_id);
            }
        }
        Some(entry)
    }

    fn place(&mut self, file_id: String, spec: FileSpec) -> &FileEntry {
        let (zone, frequency) = match (spec.zone, spec.frequency) {
            (Some(zone), Some(frequency)) => (zone, frequency),
            (zone, frequency) => {
                let (auto_zone, auto_frequency) = classify_file(&spec.name, spec.size);
                (zone.unwrap_or(auto_zone), frequency.unwrap_or(auto_frequency))
            }
        };

        let outcome = self.allocator.allocate(spec.size, zone, frequency);
        let mut offset = 0;
        let fragments = outcome
            .allocations
            .iter()
            .map(|allocation| {
                let fragment = FileFragment {
                    fragment_id: self.next_fragment_id,
                    file_id: file_id.clone(),
                    block_group_id: allocation.group_id,
                    block_id: allocation.block_id,
                    offset,
                    size: allocation.size,
                    is_primary: offset == 0,
                };
                self.next_fragment_id += 1;
                offset += allocation.size;
                fragment
            })
            .collect();

        if !outcome.is_complete() {
            warn!(
                "File {} ({file_id}) is missing {} bytes in zone {zone:?}",
                spec.name,
                outcome.shortfall_bytes()
            );
        }

        let mut name_hash = sha256_hex(spec.name.as_bytes());
        name_hash.truncate(16);
        let entry = FileEntry {
            file_id: file_id.clone(),
            name: spec.name,
            size: spec.size,
            zone,
            access_frequency: frequency,
            block_size: BlockAllocator::recommend_block_size(spec.size, frequency),
            fragments,
            name_hash,
        };
        debug!(
            "Placed {} in {zone:?} with {} fragments",
            entry.name,
            entry.fragments.len()
        );
        self.files.insert(file_id.clone(), entry);
        &self.files[&file_id]
    }

    /// Rebuilds every allocation, zone by zone from `HOT` outwards, largest file first.
    ///
    /// The rebuild is discarded, and the previous layout kept, if it would raise the
    /// fragmentation score or place fewer bytes than before.
    pub fn defragment(&mut self) -> DefragmentReport {
        let before = self.fragmentation_score();
        let placed_before: u64 = self.files.values().map(FileEntry::placed_bytes).sum();

        let mut order: Vec<&FileEntry> = self.files.values().collect();
        order.sort_by(|a, b| {
            a.zone
                .cmp(&b.zone)
                .then(b.size.cmp(&a.size))
                .then(a.name.cmp(&b.name))
        });
        let order: Vec<(String, FileSpec)> = order
            .into_iter()
            .map(|entry| {
                let spec = FileSpec::new(entry.name.clone(), entry.size)
                    .zone(entry.zone)
                    .frequency(entry.access_frequency);
                (entry.file_id.clone(), spec)
            })
            .collect();

        let mut rebuilt = Self {
            grid_size: self.grid_size,
            allocator: self.allocator.clone(),
            files: BTreeMap::new(),
            next_file_id: self.next_file_id,
            next_fragment_id: 0,
            last_defragment: None,
        };
        rebuilt.allocator.reset();
        for (file_id, spec) in order {
            rebuilt.place(file_id, spec);
        }

        let after = rebuilt.fragmentation_score();
        let placed_after: u64 = rebuilt.files.values().map(FileEntry::placed_bytes).sum();
        let applied = after <= before && placed_after >= placed_before;
        let report = DefragmentReport {
            before,
            after: if applied { after } else { before },
            applied,
            files_processed: self.files.len(),
        };

        if applied {
            self.allocator = rebuilt.allocator;
            self.files = rebuilt.files;
            self.next_fragment_id = rebuilt.next_fragment_id;
        }
        info!(
            "Defragmented {} files: {before:.4} -> {:.4} (applied: {applied})",
            report.files_processed, report.after
        );
        self.last_defragment = Some(report);
        report
    }

    /// Maps every pixel covered by a fragment to its file id.
    ///
    /// Each zone's groups are laid end to end along the Hilbert curve restricted to that zone.
    /// Fragments that run past the end of their zone are cut off.
    pub fn pixel_mapping(&self) -> HashMap<Coord, String> {
        // Zone-relative pixel ranges per zone: (start, end, file id)
        let mut ranges: [Vec<(u64, u64, &str)>; 5] = Default::default();
        for entry in self.files.values() {
            for fragment in &entry.fragments {
                let Some(group) = self.allocator.group(fragment.block_group_id) else {
                    continue;
                };
                let start = group.block_start_pixel(fragment.block_id);
                let end = start + fragment.size.div_ceil(4);
                ranges[group.zone().rank()].push((start, end, entry.file_id.as_str()));
            }
        }
        for zone_ranges in &mut ranges {
            zone_ranges.sort_unstable();
        }
        let needed: [u64; 5] =
            core::array::from_fn(|rank| ranges[rank].last().map_or(0, |range| range.1));

        let mut mapping = HashMap::new();
        if needed.iter().all(|&end| end == 0) {
            return mapping;
        }
        let Ok(curve) = HilbertCurve::from_grid_size(self.grid_size) else {
            return mapping;
        };

        let zones = self.allocator.zones();
        let mut cursor = [0u64; 5];
        let mut next_range = [0usize; 5];
        for coord in curve.coords() {
            let rank = zones.zone_of(coord).rank();
            let position = cursor[rank];
            cursor[rank] += 1;

            let zone_ranges = &ranges[rank];
            while next_range[rank] < zone_ranges.len()
                && zone_ranges[next_range[rank]].1 <= position
            {
                next_range[rank] += 1;
            }
            if let Some(&(start, end, file_id)) = zone_ranges.get(next_range[rank]) {
                if (start..end).contains(&position) {
                    mapping.insert(coord, file_id.to_string());
                }
            }

            if cursor.iter().zip(&needed).all(|(done, need)| done >= need) {
                break;
            }
        }
        mapping
    }

    /// Captures the layout for export.
    pub fn snapshot(&self) -> LayoutSnapshot {
        let zones = self.allocator.zones();
        LayoutSnapshot {
            grid_size: self.grid_size,
            files: self.files.clone(),
            block_groups: self
                .allocator
                .groups()
                .iter()
                .map(|group| GroupSnapshot {
                    id: group.id(),
                    zone: group.zone(),
                    block_size: group.block_size(),
                    utilization: group.utilization(),
                })
                .collect(),
            fragmentation_score: self.fragmentation_score(),
            zone_boundaries: Zone::all_values()
                .iter()
                .map(|&zone| (zone, zones.zone_boundaries(zone)))
                .collect(),
            defragmentation: self.last_defragment,
        }
    }

    /// Serializes [`Self::snapshot`] as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::Json`](crate::LayoutError::Json) if serialization fails.
    pub fn to_json(&self) -> LayoutResult<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }
}

/// Places `files` on a fresh grid, defragments once and returns the layout with its snapshot.
///
/// # Errors
///
/// Returns [`LayoutError::Grid`](crate::LayoutError::Grid) if `grid_size` is not a supported
/// power of two.
pub fn create_optimized_layout<I>(
    files: I,
    grid_size: u32,
) -> LayoutResult<(LayoutOptimizer, LayoutSnapshot)>
where
    I: IntoIterator<Item = FileSpec>,
{
    let mut optimizer = LayoutOptimizer::new(grid_size)?;
    for file in files {
        optimizer.add_file(file);
    }
    optimizer.defragment();
    let snapshot = optimizer.snapshot();
    Ok((optimizer, snapshot))
}
