//! Metadata-only providers. These resolve ids and titles for the
//! aggregation layer but host no chapters themselves.

pub mod anilist;
