use rand::{Rng, SeedableRng};
use sheet_packer_core::prelude::*;

fn random_sprites(seed: u64, count: usize) -> Vec<SpriteRect<usize>> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| SpriteRect::new(i, rng.gen_range(4..=48), rng.gen_range(4..=48)))
        .collect()
}

fn check_layout(input: &[SpriteRect<usize>], sheet: &Sheet<usize>) {
    assert_eq!(sheet.placements.len(), input.len());
    for (i, (s, p)) in input.iter().zip(&sheet.placements).enumerate() {
        // input order is preserved
        assert_eq!(p.key, s.key);
        assert!(p.right() <= sheet.width && p.bottom() <= sheet.height, "sprite {i} out of bounds");
        if p.rotated {
            assert_eq!((p.width, p.height), (s.height, s.width));
        } else {
            assert_eq!((p.width, p.height), (s.width, s.height));
        }
    }
    for i in 0..sheet.placements.len() {
        for j in (i + 1)..sheet.placements.len() {
            assert!(
                !sheet.placements[i].overlaps(&sheet.placements[j]),
                "sprites {i} and {j} overlap"
            );
        }
    }
}

#[test]
fn random_inputs_pack_without_overlap() {
    for seed in [1, 7, 42] {
        let input = random_sprites(seed, 30);
        let opts = PackerOptions::builder().max_side(1024).build();
        let sheet = pack_sprites(input.clone(), opts).unwrap();
        check_layout(&input, &sheet);
        let stats = sheet.stats();
        assert!(stats.occupancy > 0.0 && stats.occupancy <= 1.0);
        assert_eq!(stats.used_area + stats.wasted_area(), stats.sheet_area);
    }
}

#[test]
fn repeated_runs_are_identical() {
    // contact point is skipped at this size to keep debug runs quick
    let input = random_sprites(42, 80);
    let opts = PackerOptions::builder()
        .max_side(1024)
        .contact_point_budget(100_000)
        .build();
    let a = pack_sprites(input.clone(), opts.clone()).unwrap();
    let b = pack_sprites(input, opts).unwrap();
    assert_eq!((a.width, a.height), (b.width, b.height));
    assert_eq!(a.heuristic, b.heuristic);
    assert_eq!(a.placements, b.placements);
}

#[test]
fn parallel_and_sequential_agree() {
    let input = random_sprites(3, 24);
    let par = PackerOptions::builder().parallel(true).build();
    let seq = PackerOptions::builder().parallel(false).build();
    let a = pack_sprites(input.clone(), par).unwrap();
    let b = pack_sprites(input, seq).unwrap();
    assert_eq!(a.area(), b.area());
    assert_eq!(a.placements, b.placements);
}

#[test]
fn no_rotation_means_nothing_rotates() {
    let input = random_sprites(11, 30);
    let opts = PackerOptions::builder().allow_rotation(false).build();
    let sheet = pack_sprites(input.clone(), opts).unwrap();
    check_layout(&input, &sheet);
    assert_eq!(sheet.stats().num_rotated, 0);
}

#[test]
fn uniform_grid_input_packs_tightly() {
    let input: Vec<SpriteRect<usize>> = (0..36).map(|i| SpriteRect::new(i, 32, 32)).collect();
    let sheet = pack_sprites(input.clone(), PackerOptions::default()).unwrap();
    check_layout(&input, &sheet);
    assert_eq!(sheet.stats().occupancy, 1.0);
}

#[test]
fn contact_point_budget_does_not_change_validity() {
    let input = random_sprites(5, 30);
    let opts = PackerOptions::builder().contact_point_budget(0).build();
    let sheet = pack_sprites(input.clone(), opts).unwrap();
    check_layout(&input, &sheet);
    assert_ne!(sheet.heuristic, Some(Heuristic::ContactPoint));
}

#[test]
fn zero_time_budget_is_ignored() {
    let input = random_sprites(9, 30);
    let plain = pack_sprites(input.clone(), PackerOptions::default()).unwrap();
    let opts = PackerOptions::builder().time_budget_ms(Some(0)).build();
    let budgeted = pack_sprites(input, opts).unwrap();
    assert_eq!(plain.placements, budgeted.placements);
}

#[test]
fn short_time_budget_keeps_a_valid_layout_or_times_out() {
    let input = random_sprites(17, 100);
    let opts = PackerOptions::builder().time_budget_ms(Some(5)).build();
    match pack_sprites(input.clone(), opts) {
        Ok(sheet) => check_layout(&input, &sheet),
        Err(SheetPackerError::TimedOut) => {}
        Err(other) => panic!("unexpected error: {other}"),
    }
}
