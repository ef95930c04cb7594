use serde::Serialize;

/// Number of evaluated Cityscapes classes (train ids 0..19).
pub const NUM_CLASSES: usize = 19;

/// Train id for pixels excluded from metrics.
pub const IGNORE_LABEL: u8 = 255;

/// Color used for train id 19 (void/unlabelled).
pub const VOID_COLOR: [u8; 3] = [81, 0, 81];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassInfo {
    pub train_id: u8,
    pub name: &'static str,
    /// Palette color in RGB order.
    pub color: [u8; 3],
}

pub const CITYSCAPES_CLASSES: [ClassInfo; NUM_CLASSES] = [
    ClassInfo { train_id: 0, name: "road", color: [128, 64, 128] },
    ClassInfo { train_id: 1, name: "sidewalk", color: [244, 35, 232] },
    ClassInfo { train_id: 2, name: "building", color: [70, 70, 70] },
    ClassInfo { train_id: 3, name: "wall", color: [102, 102, 156] },
    ClassInfo { train_id: 4, name: "fence", color: [190, 153, 153] },
    ClassInfo { train_id: 5, name: "pole", color: [153, 153, 153] },
    ClassInfo { train_id: 6, name: "traffic light", color: [250, 170, 30] },
    ClassInfo { train_id: 7, name: "traffic sign", color: [220, 220, 0] },
    ClassInfo { train_id: 8, name: "vegetation", color: [107, 142, 35] },
    ClassInfo { train_id: 9, name: "terrain", color: [152, 251, 152] },
    ClassInfo { train_id: 10, name: "sky", color: [70, 130, 180] },
    ClassInfo { train_id: 11, name: "person", color: [220, 20, 60] },
    ClassInfo { train_id: 12, name: "rider", color: [255, 0, 0] },
    ClassInfo { train_id: 13, name: "car", color: [0, 0, 142] },
    ClassInfo { train_id: 14, name: "truck", color: [0, 0, 70] },
    ClassInfo { train_id: 15, name: "bus", color: [0, 60, 100] },
    ClassInfo { train_id: 16, name: "train", color: [0, 80, 100] },
    ClassInfo { train_id: 17, name: "motorcycle", color: [0, 0, 230] },
    ClassInfo { train_id: 18, name: "bicycle", color: [119, 11, 32] },
];

/// Map a raw Cityscapes `labelIds` value to its train id; unevaluated ids map to [`IGNORE_LABEL`].
pub fn label_id_to_train_id(id: u8) -> u8 {
    match id {
        7 => 0,
        8 => 1,
        11 => 2,
        12 => 3,
        13 => 4,
        17 => 5,
        19 => 6,
        20 => 7,
        21 => 8,
        22 => 9,
        23 => 10,
        24 => 11,
        25 => 12,
        26 => 13,
        27 => 14,
        28 => 15,
        31 => 16,
        32 => 17,
        33 => 18,
        _ => IGNORE_LABEL,
    }
}

/// RGB color for a train id. Ids outside the palette (including ignore) are black.
pub fn class_color(train_id: u8) -> [u8; 3] {
    match CITYSCAPES_CLASSES.get(train_id as usize) {
        Some(info) => info.color,
        None if train_id as usize == NUM_CLASSES => VOID_COLOR,
        None => [0, 0, 0],
    }
}

pub fn class_name(train_id: u8) -> Option<&'static str> {
    CITYSCAPES_CLASSES
        .get(train_id as usize)
        .map(|info| info.name)
}
