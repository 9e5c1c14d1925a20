//! Integration test: allocation scenarios from a caller's point of view.
//!
//! Each test drives a [`Heap`] only through its public API and checks the
//! resulting layout through the read-only views.

use twinheap_arena::{BlockTag, FatalPolicy, Heap, HeapConfig, Pointer, HEADER_SIZE};

fn heap(size: u32) -> Heap {
    let config = HeapConfig::new().with_fatal_policy(FatalPolicy::Report);
    let mut heap = Heap::new(config).unwrap();
    heap.init(size).unwrap();
    heap
}

/// `(offset, size, tag)` for every block in address order.
fn layout(heap: &Heap) -> Vec<(u32, u32, BlockTag)> {
    heap.blocks()
        .unwrap()
        .map(|b| {
            let b = b.unwrap();
            (b.offset, b.size, b.tag)
        })
        .collect()
}

// ── Small arena walk-through ─────────────────────────────────────────

#[test]
fn sixty_four_byte_arena() {
    let mut heap = heap(64);

    let p = heap.allocate(10).unwrap().expect("64 splits once for 26 bytes");
    assert_eq!(p, Pointer(HEADER_SIZE));
    assert_eq!(
        layout(&heap),
        vec![(0, 32, BlockTag::Allocated), (32, 32, BlockTag::Free)]
    );

    // The remaining 32-byte block is alone and cannot be split for 26 bytes.
    assert_eq!(heap.allocate(10).unwrap(), None);
    // 20 + 16 = 36 does not fit 32 at all.
    assert_eq!(heap.allocate(20).unwrap(), None);
    heap.validate().unwrap();

    heap.release(p).unwrap();
    assert_eq!(layout(&heap), vec![(0, 64, BlockTag::Free)]);
    assert_eq!(heap.anchor(), Some(0));
}

#[test]
fn init_rounds_to_power_of_two() {
    let heap = heap(1000);
    assert_eq!(heap.arena_size(), Some(1024));
    assert_eq!(layout(&heap), vec![(0, 1024, BlockTag::Free)]);
}

#[test]
fn tiny_init_still_yields_a_block() {
    let mut heap = heap(0);
    assert_eq!(heap.arena_size(), Some(HEADER_SIZE));
    assert_eq!(heap.allocate(0).unwrap(), None);
    heap.validate().unwrap();
}

// ── Sibling coalescing ───────────────────────────────────────────────

fn siblings(heap: &mut Heap) -> (Pointer, Pointer) {
    let a = heap.allocate(10).unwrap().unwrap();
    let b = heap.allocate(10).unwrap().unwrap();
    assert_eq!(
        layout(heap),
        vec![
            (0, 32, BlockTag::Allocated),
            (32, 32, BlockTag::Allocated),
            (64, 64, BlockTag::Free),
        ]
    );
    (a, b)
}

#[test]
fn siblings_released_left_first_coalesce() {
    let mut heap = heap(128);
    let (a, b) = siblings(&mut heap);
    heap.release(a).unwrap();
    heap.release(b).unwrap();
    assert_eq!(layout(&heap), vec![(0, 128, BlockTag::Free)]);
}

#[test]
fn siblings_released_right_first_coalesce() {
    let mut heap = heap(128);
    let (a, b) = siblings(&mut heap);
    heap.release(b).unwrap();
    assert_eq!(
        layout(&heap),
        vec![
            (0, 32, BlockTag::Allocated),
            (32, 32, BlockTag::Free),
            (64, 64, BlockTag::Free),
        ]
    );
    heap.release(a).unwrap();
    assert_eq!(layout(&heap), vec![(0, 128, BlockTag::Free)]);
}

#[test]
fn non_buddies_stay_apart() {
    let mut heap = heap(256);
    let a = heap.allocate(10).unwrap().unwrap(); // 0..32
    let b = heap.allocate(10).unwrap().unwrap(); // 32..64
    let c = heap.allocate(10).unwrap().unwrap(); // 64..96
    heap.release(b).unwrap();
    heap.release(c).unwrap();
    // 32 and 64 are adjacent and equal-sized but 32 is a right half.
    assert_eq!(
        layout(&heap),
        vec![
            (0, 32, BlockTag::Allocated),
            (32, 32, BlockTag::Free),
            (64, 64, BlockTag::Free),
            (128, 128, BlockTag::Free),
        ]
    );
    heap.release(a).unwrap();
    assert_eq!(layout(&heap), vec![(0, 256, BlockTag::Free)]);
}

// ── Payload access ───────────────────────────────────────────────────

#[test]
fn payloads_are_disjoint() {
    let mut heap = heap(1024);
    let ptrs: Vec<_> = (0..8u8)
        .map(|i| {
            let p = heap.allocate(20).unwrap().unwrap();
            heap.payload_mut(p).unwrap().fill(i);
            p
        })
        .collect();
    for (i, &p) in ptrs.iter().enumerate() {
        assert!(heap.payload(p).unwrap().iter().all(|&b| b == i as u8));
    }
    heap.validate().unwrap();
}

// ── Lifecycle ────────────────────────────────────────────────────────

#[test]
fn shutdown_discards_everything() {
    let mut heap = heap(512);
    let p = heap.allocate(100).unwrap().unwrap();
    heap.shutdown();
    assert!(heap.blocks().is_err());
    assert!(heap.release(p).is_err());

    heap.init(512).unwrap();
    assert_eq!(layout(&heap), vec![(0, 512, BlockTag::Free)]);
}

#[test]
fn fill_then_drain() {
    let mut heap = heap(4096);
    let mut ptrs = Vec::new();
    while let Some(p) = heap.allocate(48).unwrap() {
        ptrs.push(p);
    }
    // 64-byte blocks; the last free 64 is kept because it cannot split.
    assert_eq!(ptrs.len(), 4096 / 64 - 1);
    heap.validate().unwrap();

    for p in ptrs.into_iter().step_by(2) {
        heap.release(p).unwrap();
    }
    heap.validate().unwrap();
    let stats = heap.stats().unwrap();
    assert_eq!(stats.free_bytes + stats.allocated_bytes, 4096);
}
