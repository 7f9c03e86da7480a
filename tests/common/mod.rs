#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

/// Write a prediction directory: one BMP per image name, plus a label file
/// for each `(stem, content)` pair.
///
/// ```text
/// root/
/// ├── <image>.bmp
/// └── labels/<stem>.txt
/// ```
pub fn write_prediction_dir(root: &Path, images: &[&str], labels: &[(&str, &str)]) {
    fs::create_dir_all(root.join("labels")).expect("create labels dir");
    for stem in images {
        write_bmp(&root.join(format!("{stem}.bmp")), 64, 48);
    }
    for (stem, content) in labels {
        fs::write(root.join("labels").join(format!("{stem}.txt")), content)
            .expect("write label file");
    }
}

/// Standard fixture: five images, three labeled, four detections.
pub fn sample_predictions(root: &Path) {
    write_prediction_dir(
        root,
        &["img1", "img2", "img3", "img4", "img5"],
        &[
            ("img1", "36 0.5 0.5 0.2 0.2\n36 0.25 0.25 0.1 0.1\n"),
            ("img2", "23 0.5 0.5 0.3 0.3\n"),
            ("img3", "99 0.4 0.4 0.2 0.2\nbad line\n"),
        ],
    );
}

/// Minimal dataset layout with a `data.yaml` pointing at it.
pub fn write_dataset(root: &Path) -> std::path::PathBuf {
    for dir in ["train/images", "train/labels", "valid/images", "valid/labels"] {
        fs::create_dir_all(root.join("BRSSD").join(dir)).expect("create dataset dir");
    }
    write_bmp(&root.join("BRSSD/train/images/a.bmp"), 8, 8);
    write_bmp(&root.join("BRSSD/valid/images/b.bmp"), 8, 8);

    let yaml = root.join("data.yaml");
    fs::write(&yaml, "path: BRSSD\nnc: 2\nnames: [stop, yield]\n").expect("write data.yaml");
    yaml
}
