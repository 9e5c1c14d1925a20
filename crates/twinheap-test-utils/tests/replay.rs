//! Integration test: long seeded workloads against several arena sizes.

use twinheap_test_utils::{Harness, Op, Workload};

#[test]
fn seeded_workloads_hold_invariants() {
    for seed in 0..32 {
        let workload = Workload::generate(seed, 400, 300);
        let mut harness = Harness::new(16 * 1024).unwrap();
        let stats = harness.run(&workload).unwrap();
        assert_eq!(
            stats.allocations + stats.failed_allocations,
            workload.allocations(),
            "seed {seed}"
        );
        harness.drain().unwrap();

        let heap = harness.heap().stats().unwrap();
        assert_eq!(heap.free_blocks, 1, "seed {seed} did not fully coalesce");
        assert_eq!(heap.largest_free, 16 * 1024);
    }
}

#[test]
fn pressure_on_small_arena() {
    // Mostly allocations into 1 KiB: plenty of Ok(None) along the way.
    let workload = Workload::generate_with_ratio(99, 600, 120, 0.8);
    let mut harness = Harness::new(1024).unwrap();
    let stats = harness.run(&workload).unwrap();
    assert!(stats.failed_allocations > 0);
    harness.drain().unwrap();
}

#[test]
fn release_order_does_not_matter() {
    for pick in [0, 1, 7, 1000] {
        let mut harness = Harness::new(4096).unwrap();
        for n in [10, 20, 40, 80, 160, 320, 5, 15] {
            harness.apply(Op::Allocate(n)).unwrap();
        }
        while harness.live().next().is_some() {
            harness.apply(Op::Release(pick)).unwrap();
        }
        assert_eq!(harness.heap().stats().unwrap().free_blocks, 1);
    }
}
