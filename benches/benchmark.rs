use criterion::{Criterion, criterion_group, criterion_main};
use phylocount::model::traversal::post_order;
use phylocount::model::{IndexedTree, Phylogeny};
use phylocount::newick::{NewickFormat, newick_tree, parse_str};
use phylocount::rates::transient::{transient0, transient1};
use phylocount::rates::{RateVariation, TreeWithRates};
use std::hint::black_box;

const TREE_SIZES: &[usize] = &[100, 1_000, 10_000];

/// Balanced binary tree with leaves `T0..T{n-1}` and lengths varying by depth.
fn balanced_newick(num_leaves: usize) -> String {
    fn subtree(out: &mut String, first: usize, count: usize, depth: usize) {
        if count == 1 {
            out.push_str(&format!("T{}", first));
        } else {
            let half = count / 2;
            out.push('(');
            subtree(out, first, half, depth + 1);
            out.push(',');
            subtree(out, first + half, count - half, depth + 1);
            out.push(')');
        }
        out.push_str(&format!(":{}", 0.1 + 0.05 * depth as f64));
    }

    let mut out = String::new();
    subtree(&mut out, 0, num_leaves, 0);
    out.push(';');
    out
}

fn newick_parsing(c: &mut Criterion) {
    for &n in TREE_SIZES {
        let newick = balanced_newick(n);
        c.bench_function(&format!("parse n={}", n), |b| {
            b.iter(|| parse_str(black_box(&newick)).unwrap());
        });
    }
}

fn newick_writing(c: &mut Criterion) {
    let format = NewickFormat::default();
    for &n in TREE_SIZES {
        let tree = parse_str(balanced_newick(n)).unwrap();
        c.bench_function(&format!("write n={}", n), |b| {
            b.iter(|| newick_tree(black_box(&tree), &format));
        });
    }
}

fn all_transients(variation: &RateVariation, tree: &Phylogeny) {
    for class in (0..variation.num_classes()).filter(|&c| variation.is_pertinent_class(c)) {
        let model = variation.class_model(class).unwrap();
        for edge in post_order(tree).filter(|&index| !tree.is_root(index)) {
            black_box(transient0(&model, edge, 0.1).unwrap());
            black_box(transient1(&model, edge, 0.1).unwrap());
        }
    }
}

fn rate_classes(c: &mut Criterion) {
    let tree = parse_str(balanced_newick(1_000)).unwrap();
    let mut variation = RateVariation::new(TreeWithRates::new(tree.clone()));
    variation.set_discretization_loss(4, 0.8).unwrap();
    variation.set_discretization_duplication(2, 1.5).unwrap();
    variation.set_forbidden_gain(0.1).unwrap();

    c.bench_function("transients n=1000", |b| {
        b.iter(|| all_transients(&variation, &tree));
    });
    c.bench_function("refresh shape", |b| {
        let mut alpha = 0.5;
        b.iter(|| {
            alpha = if alpha > 2.0 { 0.5 } else { alpha + 0.1 };
            variation.set_discretization_loss(4, alpha).unwrap();
        });
    });
}

criterion_group!(newick, newick_parsing, newick_writing);
criterion_group! {
    name = rates;
    config = Criterion::default().sample_size(20);
    targets = rate_classes
}
criterion_main!(newick, rates);
