use divan::AllocProfiler;
use divan::{Bencher, black_box};
use treeq::{Pattern, Tree, penn, search};

#[global_allocator]
static ALLOC: AllocProfiler = AllocProfiler::system();

fn main() {
    divan::main();
}

/// Balanced binary tree of NP nodes over NN leaves, `depth` levels.
fn synthetic_tree(depth: usize) -> Tree {
    fn grow(tree: &mut Tree, depth: usize) -> usize {
        if depth == 0 {
            let nn = tree.add_node("NN");
            let word = tree.add_node("word");
            tree.add_child(nn, word);
            return nn;
        }
        let np = tree.add_node("NP");
        let left = grow(tree, depth - 1);
        let right = grow(tree, depth - 1);
        tree.add_child(np, left);
        tree.add_child(np, right);
        np
    }
    let mut tree = Tree::new();
    grow(&mut tree, depth);
    tree
}

#[divan::bench]
fn compile_pattern(bencher: Bencher) {
    bencher.bench(|| Pattern::compile(black_box("NP < (NP << NN=head) !< DT")).unwrap());
}

#[divan::bench(args = [6, 8, 10])]
fn parenthood(bencher: Bencher, depth: usize) {
    let tree = synthetic_tree(depth);
    let pattern = Pattern::compile("NP < NN").unwrap();
    bencher.bench_local(|| black_box(search(black_box(&tree), &pattern).count()));
}

#[divan::bench(args = [6, 8, 10])]
fn domination(bencher: Bencher, depth: usize) {
    let tree = synthetic_tree(depth);
    let pattern = Pattern::compile("NP << NN=head").unwrap();
    bencher.bench_local(|| black_box(search(black_box(&tree), &pattern).count()));
}

#[divan::bench(args = [6, 8])]
fn precedence_with_backtracking(bencher: Bencher, depth: usize) {
    let tree = synthetic_tree(depth);
    let pattern = Pattern::compile("NN=a .. NN=b").unwrap();
    bencher.bench_local(|| black_box(search(black_box(&tree), &pattern).count()));
}

#[divan::bench]
fn parse_trees(bencher: Bencher) {
    let text = penn::format(&synthetic_tree(8), 0);
    bencher.bench_local(|| black_box(penn::parse(black_box(&text)).unwrap()));
}
