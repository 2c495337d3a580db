use super::*;

#[derive(Default)]
struct RecordingIo {
    fills: Vec<(u32, u32)>,
    drains: Vec<(u32, u32, Vec<u8>)>,
    fail_fill: bool,
    fail_drain: bool,
}

impl BlockIo for RecordingIo {
    fn fill_block(&mut self, x: u32, y: u32, buf: &mut [u8]) -> RasterResult<()> {
        self.fills.push((x, y));
        if self.fail_fill {
            return Err(RasterError::io("fill failed"));
        }
        buf.fill((x * 10 + y) as u8);
        Ok(())
    }

    fn drain_block(&mut self, x: u32, y: u32, buf: &[u8]) -> RasterResult<()> {
        if self.fail_drain {
            return Err(RasterError::io("drain failed"));
        }
        self.drains.push((x, y, buf.to_vec()));
        Ok(())
    }
}

fn cache_10x7() -> BlockCache {
    // 10x7 raster in 4x3 tiles -> 3x3 grid with partial edge tiles.
    let grid = TileGrid::new(RasterSize::new(10, 7), BlockSize::new(4, 3).unwrap());
    BlockCache::new(grid, DataType::UInt16)
}

#[test]
fn grid_rounds_up_partial_tiles() {
    let cache = cache_10x7();
    assert_eq!(cache.grid().blocks_per_row(), 3);
    assert_eq!(cache.grid().blocks_per_column(), 3);
    assert_eq!(cache.tile_bytes(), 4 * 3 * 2);
    assert_eq!(cache.grid().tile_window(2, 2), Window::new(8, 6, 2, 1));
}

#[test]
fn acquire_fills_once_per_resident_tile() {
    let mut cache = cache_10x7();
    let mut io = RecordingIo::default();

    let tile = cache.acquire(1, 2, &mut io).unwrap();
    assert_eq!(tile.coords(), (1, 2));
    assert_eq!(tile.data().len(), 24);
    assert!(tile.data().iter().all(|&b| b == 12));

    cache.acquire(1, 2, &mut io).unwrap();
    cache.acquire(1, 2, &mut io).unwrap();
    assert_eq!(io.fills, vec![(1, 2)]);
    assert_eq!(cache.stats().fills, 1);
    assert_eq!(cache.resident_count(), 1);
}

#[test]
fn out_of_grid_coordinates_are_range_errors() {
    let mut cache = cache_10x7();
    let mut io = RecordingIo::default();
    assert!(matches!(
        cache.acquire(3, 0, &mut io),
        Err(RasterError::Range(_))
    ));
    assert!(matches!(
        cache.acquire(0, 3, &mut io),
        Err(RasterError::Range(_))
    ));
    assert!(io.fills.is_empty());
    assert_eq!(cache.resident_count(), 0);
}

#[test]
fn failed_fill_leaves_no_tile() {
    let mut cache = cache_10x7();
    let mut io = RecordingIo {
        fail_fill: true,
        ..RecordingIo::default()
    };
    assert!(matches!(cache.acquire(0, 0, &mut io), Err(RasterError::Io(_))));
    assert!(!cache.is_resident(0, 0));
    assert_eq!(cache.stats().resident_bytes, 0);
}

#[test]
fn flush_drains_only_dirty_tiles_and_empties_cache() {
    let mut cache = cache_10x7();
    let mut io = RecordingIo::default();

    cache.acquire(0, 0, &mut io).unwrap();
    let t = cache.acquire(2, 1, &mut io).unwrap();
    t.data_mut()[0] = 99;
    t.mark_dirty();

    cache.flush(&mut io).unwrap();
    assert_eq!(io.drains.len(), 1);
    assert_eq!((io.drains[0].0, io.drains[0].1), (2, 1));
    assert_eq!(io.drains[0].2[0], 99);
    assert_eq!(cache.resident_count(), 0);
    assert_eq!(cache.stats().resident_tiles, 0);

    // A clean tile produces no drain call.
    cache.acquire(1, 1, &mut io).unwrap();
    cache.flush_tile(1, 1, &mut io).unwrap();
    assert_eq!(io.drains.len(), 1);
}

#[test]
fn failed_drain_keeps_tile_dirty_for_retry() {
    let mut cache = cache_10x7();
    let mut io = RecordingIo::default();
    cache.acquire(0, 1, &mut io).unwrap();
    cache.mark_dirty(0, 1).unwrap();

    io.fail_drain = true;
    assert!(cache.flush(&mut io).is_err());
    assert!(cache.get(0, 1).is_some_and(Tile::is_dirty));

    io.fail_drain = false;
    cache.flush(&mut io).unwrap();
    assert_eq!(io.drains.len(), 1);
    assert!(!cache.is_resident(0, 1));
}

#[test]
fn pinned_tiles_survive_flush() {
    let mut cache = cache_10x7();
    let mut io = RecordingIo::default();
    let t = cache.acquire(0, 0, &mut io).unwrap();
    t.add_lock();
    t.mark_dirty();

    cache.flush(&mut io).unwrap();
    assert_eq!(io.drains.len(), 1);
    let t = cache.get_mut(0, 0).unwrap();
    assert!(!t.is_dirty());
    t.drop_lock();

    cache.flush(&mut io).unwrap();
    assert_eq!(io.drains.len(), 1);
    assert_eq!(cache.resident_count(), 0);
}

#[test]
fn store_bypasses_fill_and_overwrites_in_place() {
    let mut cache = cache_10x7();
    let mut io = RecordingIo::default();

    cache.store(1, 0, vec![5; 24]).unwrap();
    let t = cache.acquire(1, 0, &mut io).unwrap();
    assert!(t.data().iter().all(|&b| b == 5));
    t.add_lock();
    assert!(io.fills.is_empty());

    cache.store(1, 0, vec![6; 24]).unwrap();
    let t = cache.get(1, 0).unwrap();
    assert_eq!(t.data()[0], 6);
    assert_eq!(t.lock_count(), 1);
    assert_eq!(cache.stats().stores, 2);
    assert_eq!(cache.stats().resident_tiles, 1);

    assert!(matches!(
        cache.store(1, 0, vec![0; 3]),
        Err(RasterError::Validation(_))
    ));
}

#[test]
fn mark_dirty_requires_a_resident_tile() {
    let mut cache = cache_10x7();
    assert!(cache.mark_dirty(0, 0).is_err());
    assert!(matches!(cache.mark_dirty(9, 0), Err(RasterError::Range(_))));
}
