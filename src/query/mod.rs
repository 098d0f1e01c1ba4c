// Query building — serializes expansion output into search-engine requests.

pub mod dismax;
