use phylocount::model::traversal::post_order;
use phylocount::model::{IndexedTree, Phylogeny};
use phylocount::newick::parse_file;
use phylocount::rates::{
    BirthDeathModel, Distribution, RateDimension, RateFileError, RateVariation, read_rates, read_rates_file,
    write_rates, write_rates_file,
};
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    Path::new("tests").join("fixtures").join(name)
}

fn primates() -> Phylogeny {
    parse_file(fixture("primates.nwk")).unwrap().remove(0)
}

fn edges(tree: &Phylogeny) -> Vec<usize> {
    post_order(tree).filter(|&index| !tree.is_root(index)).collect()
}

fn assert_same_model(a: &RateVariation, b: &RateVariation) {
    let (ma, mb) = (a.main_model(), b.main_model());
    for edge in edges(ma.tree()) {
        assert_eq!(ma.edge_length(edge), mb.edge_length(edge));
        assert_eq!(ma.duplication_rate(edge), mb.duplication_rate(edge));
        assert_eq!(ma.loss_rate(edge), mb.loss_rate(edge));
        assert_eq!(ma.gain_rate(edge), mb.gain_rate(edge));
    }
    for dimension in RateDimension::FILE_ORDER {
        assert_eq!(a.num_gamma_categories(dimension), b.num_gamma_categories(dimension));
        assert_eq!(a.alpha(dimension), b.alpha(dimension));
        assert_eq!(a.forbidden(dimension), b.forbidden(dimension));
        assert_eq!(a.multipliers(dimension), b.multipliers(dimension));
    }
    assert_eq!(ma.root_distribution(), mb.root_distribution());
}

// --- READING ---
#[test]
fn test_read_primates() {
    let variation = read_rates_file(fixture("primates.rates"), primates()).unwrap();
    let model = variation.main_model();
    let tree = model.tree();

    assert_eq!(edges(tree).len(), 8);
    let hominini = tree.index_of_name("Hominini").unwrap();
    assert_eq!(model.edge_length(hominini), 0.22);
    assert_eq!(model.loss_rate(hominini), 0.25);
    let gorilla = tree.index_of_name("Gorilla gorilla").unwrap();
    assert_eq!(model.edge_length(gorilla), 0.86);
    assert_eq!(model.duplication_rate(gorilla), 0.05);
    let papio = tree.index_of_name("Papio anubis").unwrap();
    let old_world_monkeys = tree.parent_index(papio).unwrap();
    assert_eq!(model.gain_rate(old_world_monkeys), 0.01);
    assert!(model.has_lineage_specific_loss());

    assert_eq!(variation.num_gamma_categories(RateDimension::Loss), 2);
    assert_eq!(variation.forbidden(RateDimension::Loss), 0.1);
    assert_eq!(variation.num_gamma_categories(RateDimension::Duplication), 3);
    assert_eq!(variation.alpha(RateDimension::Duplication), 1.2);
    assert_eq!(variation.num_gamma_categories(RateDimension::Gain), 1);
    assert_eq!(variation.num_gamma_categories(RateDimension::Length), 2);
    assert_eq!(variation.alpha(RateDimension::Length), 2.5);
    // (3 + 1) duplication x (2 + 1) loss x (1 + 1) gain x 2 length
    assert_eq!(variation.num_classes(), 48);

    assert_eq!(
        model.root_distribution(),
        Some(&Distribution::NegativeBinomial { size: 1.5, q: 0.4 })
    );
}

#[test]
fn test_missing_rate_file() {
    let err = read_rates_file(fixture("no_such.rates"), primates()).unwrap_err();
    assert!(matches!(err, RateFileError::Io(_)));
    assert_eq!(err.line(), None);
}

#[test]
fn test_error_lines() {
    let complete = "1 0 1 0\n".repeat(8);
    let cases = [
        ("# header\n1 0 1 0\n1 0 1\n".to_string(), 3),
        ("1 0 1 0\n1 0 1 zero\n".to_string(), 2),
        ("1 0 1 0\n\n1 0 1 0\n".to_string(), 3),
        (format!("{complete}|variation loss 2 1 0.1\n|root Binomial 3 0.5\n"), 10),
        (format!("{complete}|variation loss 2\n"), 9),
        (format!("{complete}|variation length 0 1\n"), 9),
    ];
    for (rates, line) in cases {
        let err = read_rates(rates.as_bytes(), primates()).unwrap_err();
        assert_eq!(err.line(), Some(line), "{}", err);
    }
}

#[test]
fn test_too_few_edges() {
    let rates = "1 0 1 0\n1 0 1 0\n# only two\n";
    let err = read_rates(rates.as_bytes(), primates()).unwrap_err();
    assert!(matches!(
        err,
        RateFileError::MissingEdges {
            line: 3,
            expected: 8,
            found: 2
        }
    ));

    // the end marker is not a shortcut
    let rates = "1 0 1 0\n1 0 1 0\n|End\n";
    let err = read_rates(rates.as_bytes(), primates()).unwrap_err();
    assert!(matches!(err, RateFileError::ShortEdgeLine { line: 3, found: 1 }));
}

// --- WRITING ---
#[test]
fn test_write_and_read_back() {
    let variation = read_rates_file(fixture("primates.rates"), primates()).unwrap();

    let mut buffer = Vec::new();
    write_rates(&mut buffer, &variation).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    assert!(text.starts_with("# length duplication loss gain\n"));
    assert!(text.contains("\t# Homo sapiens\n"));
    assert!(text.contains("|variation loss 2 0.75 0.1\n"));
    assert!(text.contains("|variation length 2 2.5\n"));
    assert!(text.ends_with("|root NegativeBinomial 1.5 0.4\n|End\n"));

    let reread = read_rates(text.as_bytes(), primates()).unwrap();
    assert_same_model(&variation, &reread);
}

#[test]
fn test_write_rates_file() {
    let variation = read_rates_file(fixture("primates.rates"), primates()).unwrap();
    let path = std::env::temp_dir().join(format!("phylocount_write_{}.rates", std::process::id()));
    write_rates_file(&path, &variation).unwrap();

    let reread = read_rates_file(&path, primates());
    std::fs::remove_file(&path).unwrap();
    assert_same_model(&variation, &reread.unwrap());
}
