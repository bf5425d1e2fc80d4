pub mod accessor;
pub mod classifier;
pub mod identity;
pub mod shortcuts;
pub mod tagger;
pub mod tracker;
