pub mod rewriter;
