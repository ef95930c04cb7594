//! Shared data contracts for segmentation evaluation: class tables, list files, reports.

pub mod classes;
pub mod list;
pub mod report;

pub use classes::{
    class_color, class_name, label_id_to_train_id, ClassInfo, CITYSCAPES_CLASSES, IGNORE_LABEL,
    NUM_CLASSES, VOID_COLOR,
};
pub use list::{parse_list, ListEntry, ListParseError};
pub use report::{ClassIou, EvalReport};
