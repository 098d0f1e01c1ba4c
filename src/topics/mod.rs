// Topic expansion — coherence filtering, topic selection, term ranking and
// boost compiling.

pub mod coherence;
pub mod expansion;
pub mod ranker;
pub mod selector;
