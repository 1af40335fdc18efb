pub mod idx;
pub mod image;
pub mod sample;

pub use idx::{decode_pair, load_split, IdxDecoder, TEST_SPLIT, TRAIN_SPLIT};
pub use sample::Sample;
