use rand::{Rng, SeedableRng};
use sheet_packer_core::{FreeRect, Heuristic, MaxRectsBinPack, Rect};

fn assert_pruned(free: &[FreeRect]) {
    for (i, a) in free.iter().enumerate() {
        for (j, b) in free.iter().enumerate() {
            if i != j {
                assert!(!b.contains(a), "free rect {i} is inside free rect {j}");
            }
        }
    }
}

#[test]
fn free_list_stays_pruned_under_random_inserts() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(99);
    for heuristic in Heuristic::ALL {
        let mut bin = MaxRectsBinPack::with_bin(256, 256, true);
        for _ in 0..80 {
            let (w, h) = (rng.gen_range(3..=40), rng.gen_range(3..=40));
            if bin.insert(w, h, heuristic).is_none() {
                break;
            }
            assert_pruned(bin.free_rects());
        }
        let used = bin.used_rects();
        for i in 0..used.len() {
            assert!(used[i].far_x() <= 256 && used[i].far_y() <= 256);
            for j in (i + 1)..used.len() {
                assert!(!used[i].intersects(&used[j]), "{heuristic}: {i} and {j} overlap");
            }
            for f in bin.free_rects() {
                assert!(!f.intersects(&used[i]), "{heuristic}: free space overlaps {i}");
            }
        }
    }
}

#[test]
fn batch_insert_is_repeatable() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let rects: Vec<Rect<usize>> = (0..120)
        .map(|i| Rect::sized(rng.gen_range(4..=64), rng.gen_range(4..=64), i))
        .collect();

    let run = |heuristic: Heuristic| {
        let mut bin = MaxRectsBinPack::with_bin(512, 512, true);
        let mut pending = rects.clone();
        let placed = bin.insert_batch(&mut pending, heuristic);
        let layout: Vec<_> = placed
            .iter()
            .map(|r| (*r.item(), r.x(), r.y(), r.rotated()))
            .collect();
        (layout, pending.len())
    };
    for heuristic in [Heuristic::BestAreaFit, Heuristic::BottomLeft] {
        assert_eq!(run(heuristic), run(heuristic));
    }
}

#[test]
fn init_resets_state() {
    let mut bin = MaxRectsBinPack::with_bin(16, 16, false);
    assert!(bin.insert(16, 16, Heuristic::BottomLeft).is_some());
    assert!(bin.insert(1, 1, Heuristic::BottomLeft).is_none());
    bin.init(16, 16, false);
    assert!(bin.used_rects().is_empty());
    assert_eq!(bin.free_rects().len(), 1);
    assert_eq!(bin.bin_size(), (16, 16));
    assert!(bin.insert(1, 1, Heuristic::BottomLeft).is_some());
}
