use phylocount::model::{LabelError, LeafLabelMap};
use phylocount::newick::parse_str;

#[test]
fn test_from_tree_in_leaf_order() {
    let tree = parse_str("((Strigops_habroptilus,Nestor_notabilis),Nestor_meridionalis);").unwrap();
    let map = LeafLabelMap::from_tree(&tree).unwrap();

    assert_eq!(map.num_labels(), 3);
    assert_eq!(map.get_index("Strigops habroptilus"), Some(0));
    assert_eq!(map.get_index("Nestor_meridionalis"), Some(2));
    assert_eq!(&map[1], "Nestor notabilis");
    assert!(!map.contains_label("Nestor"));
}

#[test]
fn test_duplicate_after_normalization() {
    let tree = parse_str("('Xenicus gilviventris',Xenicus_gilviventris);").unwrap();
    assert_eq!(
        LeafLabelMap::from_tree(&tree).unwrap_err(),
        LabelError::DuplicateLabel("Xenicus gilviventris".to_string())
    );
}

#[test]
fn test_arrange_rows() {
    let tree = parse_str("(Himantopus_novaezelandiae,Himantopus_leucocephalus,Anarhynchus_frontalis);").unwrap();
    let map = LeafLabelMap::from_tree(&tree).unwrap();

    let rows = vec![
        ("Anarhynchus frontalis".to_string(), 4u32),
        ("Himantopus_novaezelandiae".to_string(), 2),
    ];
    assert_eq!(map.arrange(rows).unwrap(), vec![Some(2), None, Some(4)]);

    assert_eq!(
        map.arrange([("Himantopus himantopus", 1)]).unwrap_err(),
        LabelError::UnknownLabel("Himantopus himantopus".to_string())
    );
}

#[test]
fn test_display() {
    let tree = parse_str("(Kea,Kaka);").unwrap();
    let map = LeafLabelMap::from_tree(&tree).unwrap();
    assert_eq!(map.to_string(), "LeafLabelMap (2 labels):\n  [0] Kea\n  [1] Kaka\n");
}
