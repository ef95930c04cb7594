use data_contracts::IGNORE_LABEL;
use evaluation::ConfusionMatrix;
use proptest::prelude::*;

const CLASSES: usize = 5;

fn label_pairs() -> impl Strategy<Value = (Vec<u8>, Vec<u8>)> {
    (1usize..200).prop_flat_map(|n| {
        (
            prop::collection::vec(
                prop_oneof![4 => 0u8..CLASSES as u8, 1 => Just(IGNORE_LABEL), 1 => 5u8..20],
                n,
            ),
            prop::collection::vec(0u8..CLASSES as u8, n),
        )
    })
}

proptest! {
    #[test]
    fn counts_every_in_range_pixel_once((gt, pred) in label_pairs()) {
        let mut cm = ConfusionMatrix::new(CLASSES);
        cm.update(&gt, &pred).unwrap();
        let counted = gt.iter().filter(|g| (**g as usize) < CLASSES).count() as u64;
        let skipped = gt
            .iter()
            .filter(|g| **g != IGNORE_LABEL && (**g as usize) >= CLASSES)
            .count() as u64;
        prop_assert_eq!(cm.total(), counted);
        prop_assert_eq!(cm.skipped(), skipped);
    }

    #[test]
    fn iou_values_are_bounded((gt, pred) in label_pairs()) {
        let mut cm = ConfusionMatrix::new(CLASSES);
        cm.update(&gt, &pred).unwrap();
        for iou in cm.iou_per_class() {
            prop_assert!((0.0..=1.0).contains(&iou));
        }
        let miou = cm.mean_iou();
        prop_assert!((0.0..=1.0).contains(&miou));
        prop_assert!((0.0..=1.0).contains(&cm.pixel_accuracy()));
    }

    #[test]
    fn perfect_prediction_scores_one_for_present_classes(gt in prop::collection::vec(0u8..CLASSES as u8, 1..100)) {
        let mut cm = ConfusionMatrix::new(CLASSES);
        cm.update(&gt, &gt).unwrap();
        for (c, iou) in cm.iou_per_class().into_iter().enumerate() {
            let present = gt.contains(&(c as u8));
            prop_assert_eq!(iou, if present { 1.0 } else { 0.0 });
        }
        prop_assert_eq!(cm.pixel_accuracy(), 1.0);
    }

    #[test]
    fn merging_equals_updating_with_both((a_gt, a_pred) in label_pairs(), (b_gt, b_pred) in label_pairs()) {
        let mut a = ConfusionMatrix::new(CLASSES);
        a.update(&a_gt, &a_pred).unwrap();
        let mut b = ConfusionMatrix::new(CLASSES);
        b.update(&b_gt, &b_pred).unwrap();

        let mut both = ConfusionMatrix::new(CLASSES);
        both.update(&a_gt, &a_pred).unwrap();
        both.update(&b_gt, &b_pred).unwrap();

        a.merge(&b).unwrap();
        prop_assert_eq!(a, both);
    }
}
