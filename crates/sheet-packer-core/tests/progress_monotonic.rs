use rand::{Rng, SeedableRng};
use sheet_packer_core::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn polled_progress_never_decreases() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(2024);
    let sprites: Vec<SpriteRect<usize>> = (0..30)
        .map(|i| SpriteRect::new(i, rng.gen_range(8..=40), rng.gen_range(8..=40)))
        .collect();
    let progress = Arc::new(PackProgress::new());
    let packager = Packager::new(PackerOptions::default()).with_progress(progress.clone());

    let worker = thread::spawn(move || packager.pack(sprites));
    let mut last = 0.0;
    while !progress.is_done() {
        let now = progress.fraction();
        assert!((0.0..=1.0).contains(&now));
        assert!(now >= last, "progress went from {last} to {now}");
        last = now;
        thread::sleep(Duration::from_millis(1));
    }
    let sheet = worker.join().unwrap().unwrap();
    assert_eq!(sheet.placements.len(), 30);
    assert_eq!(progress.fraction(), 1.0);
}

#[test]
fn progress_is_reset_between_packs() {
    let progress = Arc::new(PackProgress::new());
    let packager = Packager::new(PackerOptions::default()).with_progress(progress.clone());
    packager.pack(vec![SpriteRect::new(0usize, 4, 4)]).unwrap();
    assert!(progress.is_done());

    // an invalid call fails before touching progress
    packager.pack(vec![SpriteRect::new(0usize, 0, 4)]).unwrap_err();
    assert!(progress.is_done());

    packager.pack(Vec::<SpriteRect<usize>>::new()).unwrap();
    assert_eq!(progress.fraction(), 1.0);
}
