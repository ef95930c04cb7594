use burn_dataset::{BurnDatasetError, EvalBatchIter, EvalDataset, IMG_MEAN_BGR};
use data_contracts::IGNORE_LABEL;
use image::{GrayImage, Luma, Rgb, RgbImage};
use std::fs;
use std::path::Path;

type TestBackend = burn_ndarray::NdArray<f32>;

/// Write `count` samples of `w`x`h` plus a list file; returns the list path.
fn synthetic_dataset(root: &Path, count: usize, w: u32, h: u32) -> anyhow::Result<std::path::PathBuf> {
    fs::create_dir_all(root.join("images"))?;
    fs::create_dir_all(root.join("labels"))?;
    let mut list = String::new();
    for i in 0..count {
        let img = RgbImage::from_fn(w, h, |_, _| Rgb([i as u8, 0, 255]));
        img.save(root.join(format!("images/frame_{i}.png")))?;
        // labelId 7 -> road (0), labelId 0 -> ignore.
        let label = GrayImage::from_fn(w, h, |x, _| if x == 0 { Luma([7]) } else { Luma([0]) });
        label.save(root.join(format!("labels/frame_{i}_labelIds.png")))?;
        list.push_str(&format!(
            "images/frame_{i}.png labels/frame_{i}_labelIds.png\n"
        ));
    }
    let list_path = root.join("val.lst");
    fs::write(&list_path, list)?;
    Ok(list_path)
}

#[test]
fn iterates_batches_in_list_order() {
    let tmp = tempfile::tempdir().unwrap();
    let list = synthetic_dataset(tmp.path(), 3, 4, 2).unwrap();
    let dataset = EvalDataset::from_list(tmp.path(), &list).unwrap();
    assert_eq!(dataset.len(), 3);

    let mut iter = EvalBatchIter::new(dataset, 2);
    assert_eq!(iter.len_batches(), 2);
    let device = Default::default();

    let first = iter
        .next_batch::<TestBackend>(&device)
        .unwrap()
        .expect("first batch");
    assert_eq!(first.images.dims(), [2, 3, 2, 4]);
    assert_eq!(
        first.names,
        vec!["frame_0_labelIds".to_string(), "frame_1_labelIds".to_string()]
    );
    let labels = first.sample_labels(1);
    assert_eq!(labels.len(), 8);
    assert_eq!(labels[0], 0);
    assert_eq!(labels[1], IGNORE_LABEL);

    // Blue plane of sample 0 holds 255 - mean.
    let data = first.images.into_data().to_vec::<f32>().unwrap();
    assert!((data[0] - (255.0 - IMG_MEAN_BGR[0])).abs() < 1e-3);

    let second = iter
        .next_batch::<TestBackend>(&device)
        .unwrap()
        .expect("second batch");
    assert_eq!(second.len(), 1);
    assert!(iter.next_batch::<TestBackend>(&device).unwrap().is_none());
}

#[test]
fn rejects_label_with_different_size() {
    let tmp = tempfile::tempdir().unwrap();
    let list = synthetic_dataset(tmp.path(), 1, 4, 2).unwrap();
    GrayImage::new(3, 3)
        .save(tmp.path().join("labels/frame_0_labelIds.png"))
        .unwrap();
    let dataset = EvalDataset::from_list(tmp.path(), &list).unwrap();
    let mut iter = EvalBatchIter::new(dataset, 1);
    let err = iter
        .next_batch::<TestBackend>(&Default::default())
        .err()
        .expect("size mismatch");
    assert!(matches!(err, BurnDatasetError::SizeMismatch { .. }));
}

#[test]
fn batch_mixing_image_sizes_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let list = synthetic_dataset(tmp.path(), 2, 8, 8).unwrap();
    RgbImage::new(16, 8)
        .save(tmp.path().join("images/frame_1.png"))
        .unwrap();
    GrayImage::new(16, 8)
        .save(tmp.path().join("labels/frame_1_labelIds.png"))
        .unwrap();
    let dataset = EvalDataset::from_list(tmp.path(), &list).unwrap();

    let mut iter = EvalBatchIter::new(dataset.clone(), 2);
    let err = iter
        .next_batch::<TestBackend>(&Default::default())
        .err()
        .expect("mixed sizes");
    match err {
        BurnDatasetError::MixedSizes {
            name,
            width,
            height,
            batch_w,
            batch_h,
        } => {
            assert_eq!(name, "frame_1_labelIds");
            assert_eq!((width, height), (16, 8));
            assert_eq!((batch_w, batch_h), (8, 8));
        }
        other => panic!("expected MixedSizes, got {other}"),
    }

    // One sample per batch is fine.
    let mut iter = EvalBatchIter::new(dataset, 1);
    let device = Default::default();
    assert_eq!(iter.next_batch::<TestBackend>(&device).unwrap().unwrap().width, 8);
    assert_eq!(iter.next_batch::<TestBackend>(&device).unwrap().unwrap().width, 16);
}

#[test]
fn missing_list_file_is_an_io_error() {
    let tmp = tempfile::tempdir().unwrap();
    let err = EvalDataset::from_list(tmp.path(), &tmp.path().join("nope.lst")).unwrap_err();
    assert!(matches!(err, BurnDatasetError::Io { .. }));
}
