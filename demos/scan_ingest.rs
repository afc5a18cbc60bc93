//! Example: Ingest a synthetic scan plus its masks and reconstruct both
//!
//! Run with: cargo run --example scan_ingest

use slicedb::{
    CompressionMethod, SliceKey, SliceKind, SlicePlane, SliceStore, StoreOptions,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("SliceDB Example: Scan Ingestion");
    println!("================================\n");

    let store_path = std::env::temp_dir().join("slicedb-demo");
    let options = StoreOptions::default().with_compression(CompressionMethod::Zstd);
    let mut store = SliceStore::open_with(&store_path, options)?;

    // Synthetic 64x64x40 scan: a bright ellipsoid in a dark field
    let (rows, cols, depth) = (64usize, 64usize, 40u32);
    let lesion = |position: u32, r: usize, c: usize| {
        let dz = (position as f64 - depth as f64 / 2.0) * 2.0;
        let dr = r as f64 - rows as f64 / 2.0;
        let dc = c as f64 - cols as f64 / 2.0;
        (dz * dz + dr * dr + dc * dc).sqrt() < 24.0
    };

    let mut image_key = SliceKey::builder()
        .counter(0)?
        .group_id(1)?
        .kind(SliceKind::Image)
        .plane(SlicePlane::Xy)
        .position(0)?
        .build()?;
    let mut mask_key = image_key;
    mask_key.set_kind(SliceKind::Segmentation);

    for position in 0..depth {
        let pixels: Vec<u8> = (0..rows * cols)
            .map(|i| if lesion(position, i / cols, i % cols) { 200 } else { 30 })
            .collect();
        let mask: Vec<u8> = pixels.iter().map(|&p| (p == 200) as u8).collect();

        image_key.increment_counter()?;
        image_key.set_position(position)?;
        store.add_batch(&image_key, &pixels, cols as u32, rows as u32)?;

        mask_key.increment_counter()?;
        mask_key.set_position(position)?;
        store.add_batch(&mask_key, &mask, cols as u32, rows as u32)?;
    }
    store.write()?;
    println!("Wrote {} image and {} mask slices to {:?}\n", depth, depth, store_path);

    let scan = store.read_volume(&image_key, 0)?;
    println!("Reconstructed image volume: {:?}", scan.shape());

    let masks = store.read_volume(&mask_key, 0)?;
    let labeled = masks
        .as_u8()
        .map(|arr| arr.iter().filter(|&&v| v == 1).count())
        .unwrap_or(0);
    println!("Reconstructed mask volume:  {:?} ({} labeled voxels)", masks.shape(), labeled);

    let dumped = store.dump_image(&image_key, std::env::temp_dir())?;
    println!("\nDumped the last slice to {:?}", dumped);

    Ok(())
}
