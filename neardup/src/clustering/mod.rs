mod representative;
mod union_find;

pub use self::representative::{
    FirstById, LongestDocument, Member, QualityScore, RandomRepresentative, RepresentativePolicy,
    RepresentativeSelection,
};
pub use self::union_find::UnionFind;
