pub mod lexicon;
pub mod similarity;
pub mod text;
