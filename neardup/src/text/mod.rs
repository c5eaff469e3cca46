mod normalize;
mod pii;
mod shingles;
mod tokenizers;

pub use self::normalize::normalize;

pub use self::shingles::shingles;
pub use self::shingles::CharShingles;

pub use self::tokenizers::Tokenizer;
pub use self::tokenizers::WordTokenizer;

pub use self::pii::PiiMasker;
pub use self::pii::{EMAIL_TOKEN, IP_TOKEN, PHONE_TOKEN};
